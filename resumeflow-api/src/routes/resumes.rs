/// Résumé endpoints
///
/// Applicant operations are scoped to the caller: a résumé that belongs to
/// someone else is indistinguishable from one that does not exist (404), and
/// so is an ID that is not a UUID.
/// Status changes and history are for recruiters and are not owner-scoped.
///
/// # Endpoints
///
/// - `POST /v1/resumes` - Create a résumé (status `APPLY`)
/// - `GET /v1/resumes?sort=asc|desc` - List own résumés by creation time
/// - `GET /v1/resumes/:resume_id` - Get an own résumé
/// - `PUT /v1/resumes/:resume_id` - Edit title and/or introduction
/// - `DELETE /v1/resumes/:resume_id` - Delete an own résumé
/// - `PATCH /v1/resumes/:resume_id/status` - Change status (recruiter)
/// - `GET /v1/resumes/:resume_id/logs` - Status history (recruiter)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{JsonBody, ResumeId},
    routes::auth::IdResponse,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use resumeflow_shared::{
    auth::middleware::AuthContext,
    models::{
        resume::{CreateResume, Resume, ResumeWithOwner, SortOrder, UpdateResume},
        resume_log::ResumeLogEntry,
    },
    workflow::{self, StatusChange, StatusChangeRequest},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CreateResumeRequest {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,

    #[validate(length(min = 1, message = "Introduction is required"))]
    pub introduction: String,
}

/// Edit request; empty or missing fields keep their current value
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateResumeRequest {
    pub title: Option<String>,
    pub introduction: Option<String>,
}

impl UpdateResumeRequest {
    fn into_update(self) -> Result<UpdateResume, ApiError> {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let update = UpdateResume {
            title: non_empty(self.title),
            introduction: non_empty(self.introduction),
        };

        if update.is_empty() {
            return Err(ApiError::validation(
                "title",
                "Provide a title or an introduction to update",
            ));
        }

        if update.title.as_ref().is_some_and(|t| t.chars().count() > 255) {
            return Err(ApiError::validation("title", "Title must be at most 255 characters"));
        }

        Ok(update)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub sort: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChangeStatusRequest {
    pub status: String,
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeResponse {
    pub id: Uuid,
    pub user_id: Uuid,

    /// Owner's display name; absent right after creation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub title: String,
    pub introduction: String,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Resume> for ResumeResponse {
    fn from(r: Resume) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            name: None,
            title: r.title,
            introduction: r.introduction,
            status: r.status.to_string(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl From<ResumeWithOwner> for ResumeResponse {
    fn from(r: ResumeWithOwner) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            name: Some(r.name),
            title: r.title,
            introduction: r.introduction,
            status: r.status.to_string(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

fn not_found() -> ApiError {
    ApiError::NotFound("Resume not found".to_string())
}

pub async fn create_resume(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(req): JsonBody<CreateResumeRequest>,
) -> ApiResult<(StatusCode, Json<ResumeResponse>)> {
    req.validate()?;

    let resume = Resume::create(
        &state.db,
        CreateResume {
            user_id: auth.user_id,
            title: req.title,
            introduction: req.introduction,
        },
    )
    .await?;

    tracing::info!(resume_id = %resume.id, user_id = %auth.user_id, "Resume created");

    Ok((StatusCode::CREATED, Json(ResumeResponse::from(resume))))
}

pub async fn list_resumes(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<ResumeResponse>>> {
    let order = SortOrder::parse_lenient(query.sort.as_deref());

    let resumes = Resume::list_by_user(&state.db, auth.user_id, order).await?;

    Ok(Json(resumes.into_iter().map(ResumeResponse::from).collect()))
}

pub async fn get_resume(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ResumeId(resume_id): ResumeId,
) -> ApiResult<Json<ResumeResponse>> {
    let resume = Resume::find_by_id_and_owner(&state.db, resume_id, auth.user_id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(ResumeResponse::from(resume)))
}

pub async fn update_resume(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ResumeId(resume_id): ResumeId,
    JsonBody(req): JsonBody<UpdateResumeRequest>,
) -> ApiResult<Json<ResumeResponse>> {
    let update = req.into_update()?;

    let resume = Resume::update(&state.db, resume_id, auth.user_id, update)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(ResumeResponse::from(resume)))
}

pub async fn delete_resume(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ResumeId(resume_id): ResumeId,
) -> ApiResult<Json<IdResponse>> {
    if !Resume::delete(&state.db, resume_id, auth.user_id).await? {
        return Err(not_found());
    }

    tracing::info!(resume_id = %resume_id, user_id = %auth.user_id, "Resume deleted");

    Ok(Json(IdResponse { id: resume_id }))
}

/// Change the status of any résumé (recruiters only)
pub async fn change_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ResumeId(resume_id): ResumeId,
    JsonBody(req): JsonBody<ChangeStatusRequest>,
) -> ApiResult<Json<StatusChange>> {
    let change = workflow::change_status(
        &state.db,
        StatusChangeRequest {
            resume_id,
            recruiter_id: auth.user_id,
            status: req.status,
            reason: req.reason,
        },
        state.transaction_timeout(),
    )
    .await?;

    Ok(Json(change))
}

/// Status history of any résumé, newest first (recruiters only)
pub async fn list_logs(
    State(state): State<AppState>,
    ResumeId(resume_id): ResumeId,
) -> ApiResult<Json<Vec<ResumeLogEntry>>> {
    let logs = workflow::status_history(&state.db, resume_id).await?;

    Ok(Json(logs))
}
