/// Error handling for the API server
///
/// [`ApiError`] is the only place where failures become HTTP responses.
/// Shared-crate errors convert into it through `From`, so handlers and guard
/// layers just use `?`. Internal failures are logged with full detail and
/// answered with a generic message.
///
/// # Response body
///
/// ```json
/// { "status": 401, "error": "unauthorized", "message": "expired" }
/// ```
///
/// Validation failures add a `details` array of `{ field, message }`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use resumeflow_shared::{
    account::AccountError,
    auth::{
        authorization::AuthzError, jwt::JwtError, middleware::AuthError,
        password::PasswordError, refresh::RefreshError,
    },
    workflow::WorkflowError,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Field-level validation errors (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500); the message is logged, never returned
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status code, repeated in the body
    pub status: u16,

    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail::new(field, message)])
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (error_code, message, details) = match self {
            ApiError::BadRequest(msg) => ("bad_request", msg, None),
            ApiError::Unauthorized(msg) => {
                tracing::debug!(reason = %msg, "Request unauthorized");
                ("unauthorized", msg, None)
            }
            ApiError::Forbidden(msg) => {
                tracing::debug!(reason = %msg, "Request forbidden");
                ("forbidden", msg, None)
            }
            ApiError::NotFound(msg) => ("not_found", msg, None),
            ApiError::ValidationError(errors) => {
                let message = errors
                    .first()
                    .map(|e| e.message.clone())
                    .unwrap_or_else(|| "Request validation failed".to_string());
                ("validation_error", message, Some(errors))
            }
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            status: status.as_u16(),
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Body that is not JSON, or JSON that does not fit the request type
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::InternalError(format!("Database error: {}", err))
    }
}

/// Access guard rejections
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Database(e) => ApiError::from(e),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

/// Role guard rejections
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NoCredentials | AuthzError::MissingRole => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthzError::InsufficientRole { .. } => ApiError::Forbidden(err.to_string()),
        }
    }
}

impl From<RefreshError> for ApiError {
    fn from(err: RefreshError) -> Self {
        match err {
            RefreshError::Expired | RefreshError::Invalid(_) | RefreshError::Revoked => {
                ApiError::Unauthorized(err.to_string())
            }
            RefreshError::Signing(e) => ApiError::from(e),
            RefreshError::Database(e) => ApiError::from(e),
            RefreshError::Timeout(e) => ApiError::InternalError(e.to_string()),
        }
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::InvalidStatus(value) => ApiError::validation(
                "status",
                format!("Invalid status value: {}", value),
            ),
            WorkflowError::MissingReason => ApiError::validation("reason", "A reason is required"),
            WorkflowError::NotFound(_) => ApiError::NotFound("Resume not found".to_string()),
            WorkflowError::Database(e) => ApiError::from(e),
            WorkflowError::Timeout(e) => ApiError::InternalError(e.to_string()),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::NotFound(_) => ApiError::NotFound("User not found".to_string()),
            AccountError::Database(e) => ApiError::from(e),
            AccountError::Timeout(e) => ApiError::InternalError(e.to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Token creation failures are internal; verification failures never reach
/// here because the guards map them first
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ApiError::InternalError(msg),
            JwtError::Expired => ApiError::Unauthorized("expired".to_string()),
            _ => ApiError::Unauthorized("invalid".to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    ValidationErrorDetail::new(
                        field.to_string(),
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("{} is invalid", field)),
                    )
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resumeflow_shared::db::transaction::TransactionTimeout;
    use resumeflow_shared::models::user::UserRole;
    use std::time::Duration;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Resume not found".to_string());
        assert_eq!(err.to_string(), "Not found: Resume not found");
    }

    #[test]
    fn test_access_guard_errors_are_401() {
        for err in [
            AuthError::MissingCredentials,
            AuthError::UnsupportedScheme,
            AuthError::Expired,
            AuthError::InvalidToken(JwtError::InvalidSignature),
            AuthError::UnknownUser,
        ] {
            let message = err.to_string();
            let api = ApiError::from(err);
            assert_eq!(api.status_code(), StatusCode::UNAUTHORIZED);
            assert_eq!(api.to_string(), format!("Unauthorized: {}", message));
        }
    }

    #[test]
    fn test_role_guard_errors() {
        assert_eq!(
            ApiError::from(AuthzError::NoCredentials).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthzError::MissingRole).status_code(),
            StatusCode::UNAUTHORIZED
        );

        let err = ApiError::from(AuthzError::InsufficientRole {
            required: vec![UserRole::Recruiter],
            actual: UserRole::Applicant,
        });
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "Forbidden: insufficient role");
    }

    #[test]
    fn test_refresh_errors() {
        assert_eq!(
            ApiError::from(RefreshError::Revoked).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(RefreshError::Timeout(TransactionTimeout(Duration::from_secs(5))))
                .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_workflow_errors() {
        assert_eq!(
            ApiError::from(WorkflowError::InvalidStatus("MAYBE".to_string())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(WorkflowError::MissingReason).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(WorkflowError::NotFound(uuid::Uuid::new_v4())).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(WorkflowError::Database(sqlx::Error::PoolTimedOut)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_internal_error_body_is_generic() {
        let response =
            ApiError::InternalError("connection refused at 10.0.0.5".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["status"], 500);
        assert_eq!(body["error"], "internal_error");
        assert_eq!(body["message"], "An internal error occurred");
        assert!(!bytes.windows(8).any(|w| w == b"10.0.0.5"));
    }

    #[tokio::test]
    async fn test_validation_body_has_details() {
        let response = ApiError::validation("email", "Invalid email format").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["message"], "Invalid email format");
        assert_eq!(body["details"][0]["field"], "email");
    }
}
