/// Database layer for ResumeFlow
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool lifecycle (create once, close at shutdown)
/// - `migrations`: Schema migrations applied at start-up
/// - `transaction`: Transactions with bounded lock and statement time
///
/// Models live in the `models` module at crate root level.
///
/// # Example
///
/// ```no_run
/// use resumeflow_shared::db::pool::{create_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
pub mod transaction;
