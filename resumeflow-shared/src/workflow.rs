/// Résumé status workflow
///
/// A status change is one atomic unit: read the current status under a row
/// lock, write the new status, append a [`ResumeLog`] row with the old and new
/// values, commit. Either both writes are visible or neither is, and a
/// résumé's status never differs from the `new_status` of its latest log row
/// (for résumés that have been through at least one change).
///
/// # Transitions
///
/// The status set is closed (`APPLY`, `DROP`, `PASS`, `INTERVIEW1`,
/// `INTERVIEW2`, `FINAL_PASS`) but unordered: any status may follow any other,
/// including itself. Only membership in the set is validated.
///
/// # Concurrency
///
/// `SELECT ... FOR UPDATE` serializes concurrent changes to the same résumé.
/// The second caller blocks until the first commits and then reads the first
/// caller's new status as its old status. If the lock cannot be obtained
/// within the transaction limit the call fails with no effect.
///
/// # Example
///
/// ```no_run
/// use resumeflow_shared::workflow::{change_status, StatusChangeRequest};
/// use sqlx::PgPool;
/// use std::time::Duration;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, resume_id: Uuid, recruiter_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let change = change_status(
///     &pool,
///     StatusChangeRequest {
///         resume_id,
///         recruiter_id,
///         status: "PASS".to_string(),
///         reason: "strong profile".to_string(),
///     },
///     Duration::from_secs(5),
/// )
/// .await?;
///
/// assert_eq!(change.new_status.as_str(), "PASS");
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::transaction::{begin_bounded, within, TransactionTimeout};
use crate::models::resume::{Resume, ResumeStatus};
use crate::models::resume_log::{CreateResumeLog, ResumeLog, ResumeLogEntry};

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("A reason is required")]
    MissingReason,

    #[error("Resume not found")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Timeout(#[from] TransactionTimeout),
}

/// Input of [`change_status`], unvalidated
#[derive(Debug, Clone)]
pub struct StatusChangeRequest {
    pub resume_id: Uuid,

    /// Acting recruiter, recorded on the log row
    pub recruiter_id: Uuid,

    /// Raw status value as received
    pub status: String,

    pub reason: String,
}

/// A committed status change
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub resume_id: Uuid,
    pub recruiter_id: Uuid,
    pub old_status: ResumeStatus,
    pub new_status: ResumeStatus,
    pub reason: String,
    pub log_id: Uuid,
    pub changed_at: DateTime<Utc>,
}

/// Parses the requested status and trims the reason
///
/// Runs before any storage access, so a rejected request touches nothing.
fn validate(request: &StatusChangeRequest) -> Result<(ResumeStatus, String), WorkflowError> {
    let status = request
        .status
        .parse::<ResumeStatus>()
        .map_err(|e| WorkflowError::InvalidStatus(e.0))?;

    let reason = request.reason.trim();
    if reason.is_empty() {
        return Err(WorkflowError::MissingReason);
    }

    Ok((status, reason.to_string()))
}

/// Moves a résumé to a new status and records the change
pub async fn change_status(
    pool: &PgPool,
    request: StatusChangeRequest,
    limit: Duration,
) -> Result<StatusChange, WorkflowError> {
    let (new_status, reason) = validate(&request)?;
    let StatusChangeRequest {
        resume_id,
        recruiter_id,
        ..
    } = request;

    within(limit, async {
        let mut tx = begin_bounded(pool, limit).await?;

        let resume = Resume::find_by_id_for_update(&mut *tx, resume_id)
            .await?
            .ok_or(WorkflowError::NotFound(resume_id))?;

        let old_status = resume.status;
        debug!(
            resume_id = %resume_id,
            from = %old_status,
            to = %new_status,
            allowed = old_status.can_transition_to(new_status),
            "Applying status change"
        );

        Resume::set_status(&mut *tx, resume_id, new_status).await?;

        let log = ResumeLog::create(
            &mut *tx,
            CreateResumeLog {
                resume_id,
                recruiter_id,
                old_status,
                new_status,
                reason: reason.clone(),
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            resume_id = %resume_id,
            recruiter_id = %recruiter_id,
            old_status = %old_status,
            new_status = %new_status,
            "Resume status changed"
        );

        Ok::<_, WorkflowError>(StatusChange {
            resume_id,
            recruiter_id,
            old_status,
            new_status,
            reason,
            log_id: log.id,
            changed_at: log.created_at,
        })
    })
    .await
}

/// Status history of a résumé, newest first
///
/// Unknown résumés are [`WorkflowError::NotFound`] rather than an empty list.
pub async fn status_history(
    pool: &PgPool,
    resume_id: Uuid,
) -> Result<Vec<ResumeLogEntry>, WorkflowError> {
    if Resume::find_by_id(pool, resume_id).await?.is_none() {
        return Err(WorkflowError::NotFound(resume_id));
    }

    Ok(ResumeLog::list_by_resume(pool, resume_id).await?)
}
