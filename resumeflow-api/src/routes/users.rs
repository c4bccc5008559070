/// User endpoints
///
/// - `GET /v1/users/me` - Profile of the authenticated caller

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::auth::UserResponse,
};
use axum::{extract::State, Extension, Json};
use resumeflow_shared::{auth::middleware::AuthContext, models::user::User};

/// Returns the caller's profile
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}
