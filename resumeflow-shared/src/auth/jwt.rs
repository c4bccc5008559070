/// JWT issuance and verification
///
/// Tokens are HS256-signed and carry the user ID as `sub`. Access and refresh
/// tokens are signed with different secrets and also differ in their
/// `token_type` claim; the verifier checks both, so one kind can never be
/// accepted in place of the other.
///
/// # Lifetimes
///
/// - **Access Token**: 12 hours by default, presented on every request
/// - **Refresh Token**: 7 days by default, stored server-side and exchanged
///   for a new pair (see [`crate::auth::refresh`])
///
/// # Example
///
/// ```
/// use resumeflow_shared::auth::jwt::TokenService;
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tokens = TokenService::new(
///     "access-secret-at-least-32-bytes-long!!",
///     "refresh-secret-at-least-32-bytes-long!",
///     Duration::hours(12),
///     Duration::days(7),
/// );
///
/// let user_id = Uuid::new_v4();
/// let token = tokens.issue_access_token(user_id)?;
/// assert_eq!(tokens.verify_access(&token)?.sub, user_id);
///
/// // A refresh token is not an access token
/// let refresh = tokens.issue_refresh_token(user_id)?;
/// assert!(tokens.verify_access(&refresh.token).is_err());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Value of the `iss` claim
pub const ISSUER: &str = "resumeflow";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature verified but `exp` has passed
    #[error("Token has expired")]
    Expired,

    #[error("Token signature is invalid")]
    InvalidSignature,

    /// Malformed token, wrong issuer, not yet valid, ...
    #[error("Invalid token: {0}")]
    Invalid(String),

    /// Well-formed and signed, but the other kind of token
    #[error("Expected {expected} token, got {actual} token")]
    WrongTokenType {
        expected: TokenType,
        actual: TokenType,
    },
}

impl JwtError {
    pub fn is_expired(&self) -> bool {
        matches!(self, JwtError::Expired)
    }
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims
///
/// `jti` is random per token, so two tokens for the same user issued within
/// the same second are still distinct strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Issuer - always [`ISSUER`]
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Token ID
    pub jti: Uuid,

    pub token_type: TokenType,
}

impl Claims {
    /// Creates claims valid from now until `now + expires_in`
    pub fn new(user_id: Uuid, token_type: TokenType, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            jti: Uuid::new_v4(),
            token_type,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// `exp` as a timestamp
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Signs claims with HS256
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies signature, issuer, `nbf` and `exp`, and extracts claims
///
/// The signature is checked before the time claims, so [`JwtError::Expired`]
/// is only returned for tokens this secret actually signed. No leeway is
/// applied to `exp`.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => JwtError::Expired,
        ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        _ => JwtError::Invalid(e.to_string()),
    })?;

    Ok(data.claims)
}

/// A freshly signed refresh token and its expiry
#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies access and refresh tokens
///
/// Built once from configuration at start-up and shared read-only.
#[derive(Clone)]
pub struct TokenService {
    access_secret: String,
    refresh_secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(
        access_secret: impl Into<String>,
        refresh_secret: impl Into<String>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn issue_access_token(&self, user_id: Uuid) -> Result<String, JwtError> {
        let claims = Claims::new(user_id, TokenType::Access, self.access_ttl);
        create_token(&claims, &self.access_secret)
    }

    pub fn issue_refresh_token(&self, user_id: Uuid) -> Result<IssuedRefreshToken, JwtError> {
        let claims = Claims::new(user_id, TokenType::Refresh, self.refresh_ttl);
        let token = create_token(&claims, &self.refresh_secret)?;

        Ok(IssuedRefreshToken {
            token,
            expires_at: claims.expires_at(),
        })
    }

    /// Verifies an access token
    pub fn verify_access(&self, token: &str) -> Result<Claims, JwtError> {
        let claims = validate_token(token, &self.access_secret)?;
        expect_type(claims, TokenType::Access)
    }

    /// Verifies the signature and expiry of a refresh token
    ///
    /// This does not consult the store; see [`crate::auth::refresh`].
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, JwtError> {
        let claims = validate_token(token, &self.refresh_secret)?;
        expect_type(claims, TokenType::Refresh)
    }
}

fn expect_type(claims: Claims, expected: TokenType) -> Result<Claims, JwtError> {
    if claims.token_type != expected {
        return Err(JwtError::WrongTokenType {
            expected,
            actual: claims.token_type,
        });
    }

    Ok(claims)
}
