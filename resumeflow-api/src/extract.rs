/// Request extractors that reject with [`ApiError`]
///
/// axum's own `Json` and `Path` answer malformed input with plain-text
/// bodies. These wrappers keep every failure in the JSON error format.

use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path},
    http::request::Parts,
};
use uuid::Uuid;

/// JSON request body
///
/// A missing `Content-Type`, unparsable JSON or a field of the wrong type is
/// a 400 with the usual error body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// `:resume_id` path segment
///
/// A segment that is not a UUID cannot name a résumé, so it is answered like
/// any other unknown résumé.
#[derive(Debug, Clone, Copy)]
pub struct ResumeId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for ResumeId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<Uuid>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(ResumeId(id)),
            Err(rejection) => {
                tracing::debug!(reason = %rejection.body_text(), "Unparsable resume id");
                Err(ApiError::NotFound("Resume not found".to_string()))
            }
        }
    }
}
