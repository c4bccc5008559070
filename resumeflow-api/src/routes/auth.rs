/// Account endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/signup` - Create an applicant account
/// - `POST /v1/auth/login` - Exchange email/password for a token pair
/// - `POST /v1/auth/refresh-token` - Rotate a refresh token (bearer refresh token)
/// - `POST /v1/auth/sign-out` - Drop the stored refresh token (bearer refresh token)
/// - `DELETE /v1/auth/delete-account` - Delete the caller and all their data (access token)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::JsonBody,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use resumeflow_shared::{
    account,
    auth::{
        middleware::{parse_bearer, AuthContext},
        password,
        refresh::{self, TokenPair},
    },
    models::user::{is_duplicate_email, CreateUser, User, UserRole},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

/// Signup request
///
/// Missing fields deserialize as empty strings and are reported by validation.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Invalid email format")
    )]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    #[validate(length(min = 1, message = "Password confirmation is required"))]
    pub confirm_password: String,

    #[validate(length(
        min = 1,
        max = 100,
        message = "Name is required and must be at most 100 characters"
    ))]
    pub name: String,
}

/// Public view of a user
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Login request
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Response carrying only an ID
#[derive(Debug, Serialize, Deserialize)]
pub struct IdResponse {
    pub id: Uuid,
}

/// Create an applicant account
///
/// # Errors
///
/// - `400 Bad Request`: Missing field, bad email, short password,
///   confirmation mismatch, or email already registered
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SignupRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    req.validate()?;

    password::validate_password(&req.password).map_err(|e| ApiError::validation("password", e))?;

    if req.password != req.confirm_password {
        return Err(ApiError::validation(
            "confirmPassword",
            "Password confirmation does not match",
        ));
    }

    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::validation("email", "Email is already registered"));
    }

    let password_hash = password::hash_password_async(req.password).await?;

    // A concurrent signup can still win the race; the unique constraint decides.
    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            password_hash,
            name: req.name,
            role: UserRole::Applicant,
        },
    )
    .await
    .map_err(|e| {
        if is_duplicate_email(&e) {
            ApiError::validation("email", "Email is already registered")
        } else {
            ApiError::from(e)
        }
    })?;

    info!(user_id = %user.id, "User signed up");

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Log in with email and password
///
/// Unknown email and wrong password get the same answer.
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<Json<TokenPair>> {
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = match User::find_by_email(&state.db, &req.email).await? {
        Some(user) => user,
        None => {
            warn!("Login attempt for unknown email");
            return Err(invalid());
        }
    };

    if !password::verify_password_async(req.password, user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "Login attempt with wrong password");
        return Err(invalid());
    }

    let pair = refresh::issue_session(&state.db, &state.tokens, user.id).await?;

    Ok(Json(pair))
}

fn bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .map(|v| v.to_str().unwrap_or_default());

    Ok(parse_bearer(value)?.to_string())
}

/// Rotate a refresh token
///
/// The presented token is invalid afterwards; the response carries its
/// replacement and a fresh access token.
pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<TokenPair>> {
    let token = bearer_token(&headers)?;

    let pair = refresh::rotate_refresh_token(
        &state.db,
        &state.tokens,
        &token,
        state.transaction_timeout(),
    )
    .await?;

    Ok(Json(pair))
}

/// Sign out by deleting the stored refresh token
///
/// Access tokens already issued stay valid until they expire.
pub async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<IdResponse>> {
    let token = bearer_token(&headers)?;

    let user_id = refresh::revoke_session(
        &state.db,
        &state.tokens,
        &token,
        state.transaction_timeout(),
    )
    .await?;

    Ok(Json(IdResponse { id: user_id }))
}

/// Delete the caller's account together with their résumés, logs and token
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<IdResponse>> {
    account::delete_account(&state.db, auth.user_id, state.transaction_timeout()).await?;

    Ok(Json(IdResponse { id: auth.user_id }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(email: &str, password: &str, confirm: &str, name: &str) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_signup_validation() {
        assert!(signup("a@example.com", "secret1", "secret1", "A").validate().is_ok());
        assert!(signup("not-an-email", "secret1", "secret1", "A").validate().is_err());
        assert!(signup("a@example.com", "secret1", "secret1", "").validate().is_err());
        assert!(signup("", "secret1", "secret1", "A").validate().is_err());
    }

    #[test]
    fn test_signup_missing_fields_default_to_empty() {
        let req: SignupRequest = serde_json::from_str(r#"{"email":"a@example.com"}"#).unwrap();
        assert_eq!(req.password, "");

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn test_signup_camel_case_confirm_password() {
        let req: SignupRequest = serde_json::from_str(
            r#"{"email":"a@example.com","password":"p","confirmPassword":"q","name":"A"}"#,
        )
        .unwrap();
        assert_eq!(req.confirm_password, "q");
    }

    #[test]
    fn test_user_response_hides_password() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            name: "A".to_string(),
            role: UserRole::Applicant,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "APPLICANT");
        assert!(json.get("createdAt").is_some());
    }
}
