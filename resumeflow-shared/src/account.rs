/// Account deletion
///
/// Removes a user and everything that only exists because of them, children
/// first, in one bounded transaction: the logs of the user's résumés, the
/// résumés, the refresh token, then the user row. Logs the user wrote as a
/// recruiter on other people's résumés stay, with `recruiter_id` nulled by the
/// foreign key.

use serde::Serialize;
use sqlx::PgPool;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::db::transaction::{begin_bounded, within, TransactionTimeout};
use crate::models::refresh_token::RefreshToken;
use crate::models::resume::Resume;
use crate::models::resume_log::ResumeLog;
use crate::models::user::User;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("User not found")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Timeout(#[from] TransactionTimeout),
}

/// Row counts removed by [`delete_account`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedAccount {
    pub resume_logs: u64,
    pub resumes: u64,
    pub refresh_tokens: u64,
}

pub async fn delete_account(
    pool: &PgPool,
    user_id: Uuid,
    limit: Duration,
) -> Result<DeletedAccount, AccountError> {
    within(limit, async {
        let mut tx = begin_bounded(pool, limit).await?;

        let deleted = DeletedAccount {
            resume_logs: ResumeLog::delete_for_owner(&mut *tx, user_id).await?,
            resumes: Resume::delete_by_user(&mut *tx, user_id).await?,
            refresh_tokens: RefreshToken::delete_by_user(&mut *tx, user_id).await?,
        };

        if !User::delete(&mut *tx, user_id).await? {
            return Err(AccountError::NotFound(user_id));
        }

        tx.commit().await?;

        info!(
            user_id = %user_id,
            resumes = deleted.resumes,
            resume_logs = deleted.resume_logs,
            "Account deleted"
        );

        Ok::<_, AccountError>(deleted)
    })
    .await
}
