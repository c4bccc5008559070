/// Database models for ResumeFlow
///
/// Every operation takes a `PgExecutor`, so the same call works against the
/// pool or inside a transaction.
///
/// # Models
///
/// - `user`: accounts, credentials and role
/// - `refresh_token`: the single stored refresh token of a user
/// - `resume`: résumés and their status
/// - `resume_log`: append-only status change history
///
/// # Example
///
/// ```no_run
/// use resumeflow_shared::models::resume::{CreateResume, Resume, SortOrder};
/// use resumeflow_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// Resume::create(&pool, CreateResume {
///     user_id,
///     title: "Backend engineer".to_string(),
///     introduction: "Five years of Rust".to_string(),
/// }).await?;
///
/// let mine = Resume::list_by_user(&pool, user_id, SortOrder::Desc).await?;
/// # Ok(())
/// # }
/// ```

pub mod refresh_token;
pub mod resume;
pub mod resume_log;
pub mod user;
