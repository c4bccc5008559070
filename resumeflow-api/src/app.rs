/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use resumeflow_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = resumeflow_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, patch, post},
    Router,
};
use resumeflow_shared::{
    auth::{
        authorization::{require_role, RECRUITERS},
        jwt::TokenService,
        middleware::{authenticate, AuthContext},
    },
    models::user::UserRole,
};
use sqlx::PgPool;
use std::{future::Future, pin::Pin, sync::Arc, time::Duration};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Token service built from `config.jwt`
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        let tokens = Arc::new(config.jwt.token_service());

        Self {
            db,
            config: Arc::new(config),
            tokens,
        }
    }

    /// Limit for atomic store sequences
    pub fn transaction_timeout(&self) -> Duration {
        self.config.database.transaction_timeout()
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET /health
/// └── /v1/
///     ├── /auth/
///     │   ├── POST   /signup
///     │   ├── POST   /login
///     │   ├── POST   /refresh-token          (refresh token)
///     │   ├── POST   /sign-out               (refresh token)
///     │   └── DELETE /delete-account         (access)
///     ├── /users/
///     │   └── GET    /me                     (access)
///     └── /resumes/                          (access)
///         ├── POST   /
///         ├── GET    /?sort=asc|desc
///         ├── GET    /:resume_id
///         ├── PUT    /:resume_id
///         ├── DELETE /:resume_id
///         ├── PATCH  /:resume_id/status      (access + RECRUITER)
///         └── GET    /:resume_id/logs        (access + RECRUITER)
/// ```
///
/// Guards are attached with `route_layer`, so they only run for routes that
/// matched and the access guard always runs before the role guard.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let access_guard = middleware::from_fn_with_state(state.clone(), require_access_token);

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/delete-account", delete(routes::auth::delete_account))
        .route_layer(access_guard.clone())
        .route("/signup", post(routes::auth::signup))
        .route("/login", post(routes::auth::login))
        .route("/refresh-token", post(routes::auth::refresh_token))
        .route("/sign-out", post(routes::auth::sign_out));

    let user_routes = Router::new()
        .route("/me", get(routes::users::me))
        .route_layer(access_guard.clone());

    let resume_routes = Router::new()
        .route("/:resume_id/status", patch(routes::resumes::change_status))
        .route("/:resume_id/logs", get(routes::resumes::list_logs))
        .route_layer(middleware::from_fn(role_guard(RECRUITERS)))
        .route(
            "/",
            post(routes::resumes::create_resume).get(routes::resumes::list_resumes),
        )
        .route(
            "/:resume_id",
            get(routes::resumes::get_resume)
                .put(routes::resumes::update_resume)
                .delete(routes::resumes::delete_resume),
        )
        .route_layer(access_guard);

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/resumes", resume_routes);

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .fallback(route_not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JSON 404 for paths no route matches
async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

/// Access guard layer
///
/// Resolves the caller from the `Authorization` header and inserts an
/// [`AuthContext`] into the request extensions.
pub async fn require_access_token(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .map(|v| v.to_str().unwrap_or_default().to_owned());

    let auth_context = authenticate(&state.db, &state.tokens, authorization.as_deref()).await?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

async fn role_guard_layer(
    allowed: &'static [UserRole],
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    require_role(req.extensions().get::<AuthContext>(), allowed)?;

    Ok(next.run(req).await)
}

/// Creates a role guard closure for `axum::middleware::from_fn`
///
/// Must sit inside the access guard; on its own every request fails with
/// "no credentials".
pub fn role_guard(
    allowed: &'static [UserRole],
) -> impl Fn(Request, Next) -> Pin<Box<dyn Future<Output = Result<Response, ApiError>> + Send>> + Clone
{
    move |req, next| Box::pin(role_guard_layer(allowed, req, next))
}
