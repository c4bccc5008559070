/// Résumé model and database operations
///
/// Applicants own résumés and edit their title/introduction. The status is
/// only written by [`crate::workflow::change_status`], which pairs every write
/// with a [`crate::models::resume_log::ResumeLog`] row.
///
/// # Status values
///
/// `APPLY` (initial), `DROP`, `PASS`, `INTERVIEW1`, `INTERVIEW2`, `FINAL_PASS`.
/// The set is validated; the order is not. Any status may follow any other.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE resume_status AS ENUM (
///     'APPLY', 'DROP', 'PASS', 'INTERVIEW1', 'INTERVIEW2', 'FINAL_PASS'
/// );
///
/// CREATE TABLE resumes (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id),
///     title VARCHAR(255) NOT NULL,
///     introduction TEXT NOT NULL,
///     status resume_status NOT NULL DEFAULT 'APPLY',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Application status of a résumé
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "resume_status")]
pub enum ResumeStatus {
    #[default]
    #[sqlx(rename = "APPLY")]
    #[serde(rename = "APPLY")]
    Apply,

    #[sqlx(rename = "DROP")]
    #[serde(rename = "DROP")]
    Drop,

    #[sqlx(rename = "PASS")]
    #[serde(rename = "PASS")]
    Pass,

    #[sqlx(rename = "INTERVIEW1")]
    #[serde(rename = "INTERVIEW1")]
    Interview1,

    #[sqlx(rename = "INTERVIEW2")]
    #[serde(rename = "INTERVIEW2")]
    Interview2,

    #[sqlx(rename = "FINAL_PASS")]
    #[serde(rename = "FINAL_PASS")]
    FinalPass,
}

impl ResumeStatus {
    /// Every valid status, in pipeline order
    pub const ALL: [ResumeStatus; 6] = [
        ResumeStatus::Apply,
        ResumeStatus::Drop,
        ResumeStatus::Pass,
        ResumeStatus::Interview1,
        ResumeStatus::Interview2,
        ResumeStatus::FinalPass,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResumeStatus::Apply => "APPLY",
            ResumeStatus::Drop => "DROP",
            ResumeStatus::Pass => "PASS",
            ResumeStatus::Interview1 => "INTERVIEW1",
            ResumeStatus::Interview2 => "INTERVIEW2",
            ResumeStatus::FinalPass => "FINAL_PASS",
        }
    }

    /// Checks if a transition to `target` is allowed
    ///
    /// The workflow has no adjacency rules: every member of the status set
    /// is reachable from every other, including itself.
    pub fn can_transition_to(&self, _target: ResumeStatus) -> bool {
        true
    }
}

impl fmt::Display for ResumeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the six status values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resume status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for ResumeStatus {
    type Err = UnknownStatus;

    /// Exact, case-sensitive match against the stored spelling
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResumeStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Creation-time ordering for listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// `asc` (any case) is ascending; everything else is descending
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Résumé row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Resume {
    pub id: Uuid,

    /// Owning applicant
    pub user_id: Uuid,

    pub title: String,

    pub introduction: String,

    pub status: ResumeStatus,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Résumé joined with its owner's display name
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ResumeWithOwner {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub title: String,
    pub introduction: String,
    pub status: ResumeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a résumé
#[derive(Debug, Clone)]
pub struct CreateResume {
    pub user_id: Uuid,
    pub title: String,
    pub introduction: String,
}

/// Input for editing a résumé; `None` keeps the current value
#[derive(Debug, Clone, Default)]
pub struct UpdateResume {
    pub title: Option<String>,
    pub introduction: Option<String>,
}

impl UpdateResume {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.introduction.is_none()
    }
}

const RESUME_COLUMNS: &str = "id, user_id, title, introduction, status, created_at, updated_at";

impl Resume {
    /// Creates a résumé in `APPLY` status
    pub async fn create<'e, E>(executor: E, data: CreateResume) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO resumes (user_id, title, introduction, status) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            RESUME_COLUMNS
        );

        sqlx::query_as::<_, Resume>(&query)
            .bind(data.user_id)
            .bind(data.title)
            .bind(data.introduction)
            .bind(ResumeStatus::Apply)
            .fetch_one(executor)
            .await
    }

    /// Finds a résumé by ID regardless of owner
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {} FROM resumes WHERE id = $1", RESUME_COLUMNS);

        sqlx::query_as::<_, Resume>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Finds a résumé by ID and row-locks it until the transaction ends
    pub async fn find_by_id_for_update<'e, E>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {} FROM resumes WHERE id = $1 FOR UPDATE",
            RESUME_COLUMNS
        );

        sqlx::query_as::<_, Resume>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Finds a résumé owned by `user_id`, with the owner's name
    ///
    /// A résumé owned by someone else is reported as absent.
    pub async fn find_by_id_and_owner<'e, E>(
        executor: E,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ResumeWithOwner>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, ResumeWithOwner>(
            r#"
            SELECT r.id, r.user_id, u.name, r.title, r.introduction, r.status,
                   r.created_at, r.updated_at
            FROM resumes r
            JOIN users u ON u.id = r.user_id
            WHERE r.id = $1 AND r.user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(executor)
        .await
    }

    /// Lists a user's résumés ordered by creation time
    pub async fn list_by_user<'e, E>(
        executor: E,
        user_id: Uuid,
        order: SortOrder,
    ) -> Result<Vec<ResumeWithOwner>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            r#"
            SELECT r.id, r.user_id, u.name, r.title, r.introduction, r.status,
                   r.created_at, r.updated_at
            FROM resumes r
            JOIN users u ON u.id = r.user_id
            WHERE r.user_id = $1
            ORDER BY r.created_at {order}, r.id {order}
            "#,
            order = order.as_sql()
        );

        sqlx::query_as::<_, ResumeWithOwner>(&query)
            .bind(user_id)
            .fetch_all(executor)
            .await
    }

    /// Updates title and/or introduction of an owned résumé
    ///
    /// Returns `None` if the résumé does not exist or belongs to someone else.
    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        user_id: Uuid,
        data: UpdateResume,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE resumes \
             SET title = COALESCE($3, title), \
                 introduction = COALESCE($4, introduction), \
                 updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {}",
            RESUME_COLUMNS
        );

        sqlx::query_as::<_, Resume>(&query)
            .bind(id)
            .bind(user_id)
            .bind(data.title)
            .bind(data.introduction)
            .fetch_optional(executor)
            .await
    }

    /// Writes a new status
    ///
    /// Only called by the workflow, inside the transaction that also appends
    /// the matching log row.
    pub(crate) async fn set_status<'e, E>(
        executor: E,
        id: Uuid,
        status: ResumeStatus,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE resumes SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            RESUME_COLUMNS
        );

        sqlx::query_as::<_, Resume>(&query)
            .bind(id)
            .bind(status)
            .fetch_one(executor)
            .await
    }

    /// Deletes an owned résumé; its logs are removed by the FK cascade
    pub async fn delete<'e, E>(executor: E, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM resumes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every résumé of a user
    pub async fn delete_by_user<'e, E>(executor: E, user_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM resumes WHERE user_id = $1")
            .bind(user_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
