/// Audit trail of résumé status changes
///
/// Append-only. Rows are written by the workflow in the same transaction as
/// the status update and are never edited afterwards. Deleting a résumé
/// removes its logs; deleting a recruiter keeps the logs with a null
/// `recruiter_id`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE resume_logs (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     resume_id UUID NOT NULL REFERENCES resumes(id) ON DELETE CASCADE,
///     recruiter_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     old_status resume_status NOT NULL,
///     new_status resume_status NOT NULL,
///     reason TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
/// );
/// ```
///
/// `created_at` is the write time, taken after the résumé row lock is held.
/// Writers on one résumé are serialized by that lock, so newest-first by
/// `created_at` is the commit order.

use crate::models::resume::ResumeStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ResumeLog {
    pub id: Uuid,
    pub resume_id: Uuid,

    /// `None` once the recruiter's account is gone
    pub recruiter_id: Option<Uuid>,

    pub old_status: ResumeStatus,
    pub new_status: ResumeStatus,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// Log entry with the recruiter's display name, as shown in history listings
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ResumeLogEntry {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub recruiter_id: Option<Uuid>,
    pub recruiter_name: Option<String>,
    pub old_status: ResumeStatus,
    pub new_status: ResumeStatus,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateResumeLog {
    pub resume_id: Uuid,
    pub recruiter_id: Uuid,
    pub old_status: ResumeStatus,
    pub new_status: ResumeStatus,
    pub reason: String,
}

impl ResumeLog {
    pub(crate) async fn create<'e, E>(executor: E, data: CreateResumeLog) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let log = sqlx::query_as::<_, ResumeLog>(
            r#"
            INSERT INTO resume_logs
                (resume_id, recruiter_id, old_status, new_status, reason, created_at)
            VALUES ($1, $2, $3, $4, $5, clock_timestamp())
            RETURNING id, resume_id, recruiter_id, old_status, new_status, reason, created_at
            "#,
        )
        .bind(data.resume_id)
        .bind(data.recruiter_id)
        .bind(data.old_status)
        .bind(data.new_status)
        .bind(data.reason)
        .fetch_one(executor)
        .await?;

        Ok(log)
    }

    /// Lists the history of a résumé, newest first
    pub async fn list_by_resume<'e, E>(
        executor: E,
        resume_id: Uuid,
    ) -> Result<Vec<ResumeLogEntry>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let logs = sqlx::query_as::<_, ResumeLogEntry>(
            r#"
            SELECT l.id, l.resume_id, l.recruiter_id, u.name AS recruiter_name,
                   l.old_status, l.new_status, l.reason, l.created_at
            FROM resume_logs l
            LEFT JOIN users u ON u.id = l.recruiter_id
            WHERE l.resume_id = $1
            ORDER BY l.created_at DESC, l.id DESC
            "#,
        )
        .bind(resume_id)
        .fetch_all(executor)
        .await?;

        Ok(logs)
    }

    /// Counts the log rows of a résumé
    pub async fn count_by_resume<'e, E>(executor: E, resume_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM resume_logs WHERE resume_id = $1")
            .bind(resume_id)
            .fetch_one(executor)
            .await?;

        Ok(count.0)
    }

    /// Deletes the logs of every résumé owned by `user_id`
    pub async fn delete_for_owner<'e, E>(executor: E, user_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "DELETE FROM resume_logs WHERE resume_id IN (SELECT id FROM resumes WHERE user_id = $1)",
        )
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }
}
