/// Refresh token sessions: issue at login, rotate, revoke
///
/// A refresh token is only as good as its stored record. The signature and
/// `exp` claim are checked first, but the `refresh_tokens` row decides
/// whether the token is still live:
///
/// - no row holds the token (superseded by a later login or rotation, or
///   signed out) → [`RefreshError::Revoked`]
/// - the row's `expires_at` has passed → [`RefreshError::Expired`], even when
///   the signature is still valid
///
/// Rotation locks the row, so of two concurrent rotations with the same token
/// exactly one succeeds and the other sees `Revoked`.
///
/// # Example
///
/// ```no_run
/// use resumeflow_shared::auth::jwt::TokenService;
/// use resumeflow_shared::auth::refresh::{issue_session, rotate_refresh_token, RefreshError};
/// use sqlx::PgPool;
/// use std::time::Duration;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, tokens: TokenService, user_id: Uuid) -> Result<(), RefreshError> {
/// let limit = Duration::from_secs(5);
/// let first = issue_session(&pool, &tokens, user_id).await?;
/// let _second = rotate_refresh_token(&pool, &tokens, &first.refresh_token, limit).await?;
///
/// // the first refresh token is dead now
/// assert!(matches!(
///     rotate_refresh_token(&pool, &tokens, &first.refresh_token, limit).await,
///     Err(RefreshError::Revoked)
/// ));
/// # Ok(())
/// # }
/// ```

use serde::Serialize;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::jwt::{JwtError, TokenService};
use crate::db::transaction::{begin_bounded, within, TransactionTimeout};
use crate::models::refresh_token::RefreshToken;

/// Access and refresh token returned by login and rotation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("expired")]
    Expired,

    #[error("invalid")]
    Invalid(#[source] JwtError),

    /// Not the user's current stored token
    #[error("revoked")]
    Revoked,

    #[error("Failed to sign token: {0}")]
    Signing(#[source] JwtError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Timeout(#[from] TransactionTimeout),
}

impl From<JwtError> for RefreshError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => RefreshError::Expired,
            JwtError::CreateError(_) => RefreshError::Signing(err),
            other => RefreshError::Invalid(other),
        }
    }
}

/// Issues a new token pair and stores the refresh token for `user_id`
///
/// Supersedes any refresh token the user held before.
pub async fn issue_session(
    pool: &PgPool,
    tokens: &TokenService,
    user_id: Uuid,
) -> Result<TokenPair, RefreshError> {
    let access_token = tokens.issue_access_token(user_id)?;
    let refresh = tokens.issue_refresh_token(user_id)?;

    RefreshToken::upsert_for_user(pool, user_id, &refresh.token, refresh.expires_at).await?;

    info!(user_id = %user_id, "Session issued");

    Ok(TokenPair {
        access_token,
        refresh_token: refresh.token,
    })
}

/// Exchanges a live refresh token for a new pair, invalidating the old one
pub async fn rotate_refresh_token(
    pool: &PgPool,
    tokens: &TokenService,
    presented: &str,
    limit: Duration,
) -> Result<TokenPair, RefreshError> {
    let claims = tokens.verify_refresh(presented).map_err(|e| {
        debug!(error = %e, "Refresh token rejected");
        RefreshError::from(e)
    })?;
    let user_id = claims.sub;

    within(limit, async {
        let mut tx = begin_bounded(pool, limit).await?;

        let record = match RefreshToken::find_by_token_for_update(&mut *tx, presented).await? {
            Some(record) if record.user_id == user_id => record,
            Some(_) | None => {
                warn!(user_id = %user_id, "Refresh token is not the stored one, possible reuse");
                return Err(RefreshError::Revoked);
            }
        };

        if record.is_expired() {
            debug!(user_id = %user_id, "Stored refresh token has expired");
            return Err(RefreshError::Expired);
        }

        let access_token = tokens.issue_access_token(user_id)?;
        let refresh = tokens.issue_refresh_token(user_id)?;

        RefreshToken::replace_token(
            &mut *tx,
            record.id,
            presented,
            &refresh.token,
            refresh.expires_at,
        )
        .await?
        .ok_or(RefreshError::Revoked)?;

        tx.commit().await?;

        info!(user_id = %user_id, "Refresh token rotated");

        Ok::<_, RefreshError>(TokenPair {
            access_token,
            refresh_token: refresh.token,
        })
    })
    .await
}

/// Deletes the stored refresh token if `presented` is it (sign-out)
///
/// Checked like a rotation: the record must exist, belong to the token's
/// user and not have passed its stored expiry. Returns the ID of the user
/// signed out.
pub async fn revoke_session(
    pool: &PgPool,
    tokens: &TokenService,
    presented: &str,
    limit: Duration,
) -> Result<Uuid, RefreshError> {
    let claims = tokens.verify_refresh(presented)?;
    let user_id = claims.sub;

    within(limit, async {
        let mut tx = begin_bounded(pool, limit).await?;

        match RefreshToken::find_by_token_for_update(&mut *tx, presented).await? {
            Some(record) if record.user_id == user_id => {
                if record.is_expired() {
                    debug!(user_id = %user_id, "Sign-out with an expired refresh token");
                    return Err(RefreshError::Expired);
                }
            }
            Some(_) | None => {
                warn!(user_id = %user_id, "Sign-out with a refresh token that is not stored");
                return Err(RefreshError::Revoked);
            }
        }

        if !RefreshToken::delete_matching(&mut *tx, user_id, presented).await? {
            return Err(RefreshError::Revoked);
        }

        tx.commit().await?;

        info!(user_id = %user_id, "Signed out");

        Ok::<_, RefreshError>(user_id)
    })
    .await
}
