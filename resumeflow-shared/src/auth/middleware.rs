/// Access guard: bearer token to authenticated identity
///
/// Transport-agnostic. The HTTP layer hands over the raw `Authorization`
/// header value and gets back either an [`AuthContext`] to attach to the
/// request or an [`AuthError`] naming exactly why the request was turned
/// away. The guard fails closed: anything that is not a valid access token for
/// a user that still exists is rejected.
///
/// # Checks, in order
///
/// 1. header missing → [`AuthError::MissingCredentials`]
/// 2. not exactly `Bearer <token>` → [`AuthError::UnsupportedScheme`]
/// 3. token expired → [`AuthError::Expired`]
/// 4. token otherwise unverifiable → [`AuthError::InvalidToken`]
/// 5. no user with the token's ID → [`AuthError::UnknownUser`]
///
/// The user row is read on every request; claims are never trusted beyond
/// the user ID, so a deleted account loses access immediately.
///
/// # Example
///
/// ```no_run
/// use resumeflow_shared::auth::jwt::TokenService;
/// use resumeflow_shared::auth::middleware::authenticate;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, tokens: TokenService) -> Result<(), Box<dyn std::error::Error>> {
/// let header = Some("Bearer eyJhbGciOiJIUzI1NiJ9...");
/// let auth = authenticate(&pool, &tokens, header).await?;
/// println!("{} ({:?})", auth.email, auth.role);
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use super::jwt::{JwtError, TokenService};
use crate::models::user::{User, UserRole};

/// Identity attached to a request once the access guard has passed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,

    /// Read by the role guard. Always present for identities resolved from
    /// the users table.
    pub role: Option<UserRole>,
}

impl AuthContext {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: Some(user.role),
        }
    }
}

/// Reasons the access guard rejects a request
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no credentials")]
    MissingCredentials,

    #[error("unsupported scheme")]
    UnsupportedScheme,

    #[error("expired")]
    Expired,

    #[error("invalid")]
    InvalidToken(#[source] JwtError),

    #[error("no matching user")]
    UnknownUser,

    /// Store failure while resolving the user; not an authentication verdict
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::Expired,
            other => AuthError::InvalidToken(other),
        }
    }
}

/// Extracts the token from an `Authorization` header value
///
/// The value must be exactly two space-separated parts, the first being the
/// literal `Bearer`. `bearer x`, `Bearer` and `Bearer a b` are all rejected.
pub fn parse_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MissingCredentials)?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::UnsupportedScheme),
    }
}

/// Runs the access guard against a raw `Authorization` header value
pub async fn authenticate(
    pool: &PgPool,
    tokens: &TokenService,
    header: Option<&str>,
) -> Result<AuthContext, AuthError> {
    let token = parse_bearer(header)?;

    let claims = tokens.verify_access(token).map_err(|e| {
        debug!(error = %e, "Access token rejected");
        AuthError::from(e)
    })?;

    let user = User::find_by_id(pool, claims.sub).await?.ok_or_else(|| {
        warn!(user_id = %claims.sub, "Valid access token for a user that no longer exists");
        AuthError::UnknownUser
    })?;

    Ok(AuthContext::from_user(&user))
}
