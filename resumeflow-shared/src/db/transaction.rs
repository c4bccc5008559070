/// Transactions with a bounded lifetime
///
/// Read-modify-write sequences (refresh rotation, status changes, account
/// deletion) run inside a transaction opened by [`begin_bounded`] and are
/// driven through [`within`]. The database side gets `lock_timeout` and
/// `statement_timeout` so no statement waits on a row lock forever, and the
/// whole sequence gets a wall-clock limit. When the limit fires the future is
/// dropped, which drops the transaction and rolls it back.
///
/// # Example
///
/// ```no_run
/// use resumeflow_shared::db::transaction::{begin_bounded, within, TransactionTimeout};
/// use sqlx::PgPool;
/// use std::time::Duration;
///
/// #[derive(Debug)]
/// enum MyError {
///     Db(sqlx::Error),
///     Timeout,
/// }
///
/// impl From<sqlx::Error> for MyError {
///     fn from(e: sqlx::Error) -> Self { MyError::Db(e) }
/// }
///
/// impl From<TransactionTimeout> for MyError {
///     fn from(_: TransactionTimeout) -> Self { MyError::Timeout }
/// }
///
/// # async fn example(pool: PgPool) -> Result<(), MyError> {
/// let limit = Duration::from_secs(5);
/// within(limit, async {
///     let mut tx = begin_bounded(&pool, limit).await?;
///     sqlx::query("SELECT 1").execute(&mut *tx).await?;
///     tx.commit().await?;
///     Ok::<_, MyError>(())
/// })
/// .await
/// # }
/// ```

use sqlx::{PgPool, Postgres, Transaction};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// The atomic sequence did not finish within its limit
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("transaction did not complete within {0:?}")]
pub struct TransactionTimeout(pub Duration);

/// Opens a transaction whose statements and lock waits are bounded by `limit`
pub async fn begin_bounded(
    pool: &PgPool,
    limit: Duration,
) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let millis = limit.as_millis().max(1);

    // SET does not take bind parameters; the value is an integer we formatted.
    sqlx::query(&format!("SET LOCAL lock_timeout = {}", millis))
        .execute(&mut *tx)
        .await?;
    sqlx::query(&format!("SET LOCAL statement_timeout = {}", millis))
        .execute(&mut *tx)
        .await?;

    Ok(tx)
}

/// Runs `fut` with a wall-clock limit
///
/// On expiry the future is dropped (rolling back any transaction it owns) and
/// a [`TransactionTimeout`] is returned through `E`.
pub async fn within<T, E, F>(limit: Duration, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<TransactionTimeout>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(limit_ms = limit.as_millis() as u64, "Atomic sequence timed out");
            Err(TransactionTimeout(limit).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Timeout,
        Inner,
    }

    impl From<TransactionTimeout> for TestError {
        fn from(_: TransactionTimeout) -> Self {
            TestError::Timeout
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_within_times_out() {
        let result: Result<(), TestError> = within(Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;

        assert_eq!(result, Err(TestError::Timeout));
    }

    #[tokio::test]
    async fn test_within_passes_through_result() {
        let ok: Result<u32, TestError> = within(Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(ok, Ok(7));

        let err: Result<u32, TestError> =
            within(Duration::from_secs(1), async { Err(TestError::Inner) }).await;
        assert_eq!(err, Err(TestError::Inner));
    }

    #[test]
    fn test_timeout_display() {
        let err = TransactionTimeout(Duration::from_secs(5));
        assert!(err.to_string().contains("5s"));
    }
}
