//! Database retry logic
//!
//! A deferred SQLite transaction that starts with reads and then writes can
//! fail with "database is locked" without waiting on the busy timeout when
//! another writer got there first. Such operations are retried as a whole
//! with exponential backoff.

use recipehub_common::{Error, Result};
use std::time::{Duration, Instant};

const INITIAL_BACKOFF_MS: u64 = 10;
const MAX_BACKOFF_MS: u64 = 1000;

/// True for SQLite lock/busy errors
pub fn is_lock_error(err: &Error) -> bool {
    match err {
        Error::Database(db_err) => {
            let msg = db_err.to_string();
            msg.contains("database is locked") || msg.contains("database is busy")
        }
        _ => false,
    }
}

/// Retry a database operation on lock errors until `max_wait_ms` elapses
///
/// Backoff starts at 10ms and doubles up to 1s. Any other error is returned
/// immediately.
pub async fn retry_on_lock<F, Fut, T>(operation_name: &str, max_wait_ms: u64, operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    retry_when(operation_name, max_wait_ms, is_lock_error, operation).await
}

async fn retry_when<F, Fut, T, P>(
    operation_name: &str,
    max_wait_ms: u64,
    is_retryable: P,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
    P: Fn(&Error) -> bool,
{
    let start = Instant::now();
    let max_duration = Duration::from_millis(max_wait_ms);
    let mut attempt = 0u32;
    let mut backoff_ms = INITIAL_BACKOFF_MS;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Database operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) if !is_retryable(&err) => return Err(err),
            Err(err) => {
                let elapsed = start.elapsed();
                if elapsed >= max_duration {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = elapsed.as_millis() as u64,
                        max_wait_ms,
                        "Database operation failed: max retry time exceeded"
                    );
                    return Err(Error::Internal(format!(
                        "{} failed after {} attempts ({} ms): {}",
                        operation_name,
                        attempt,
                        elapsed.as_millis(),
                        err
                    )));
                }

                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    backoff_ms,
                    "Database locked, will retry after backoff"
                );

                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_internal(err: &Error) -> bool {
        matches!(err, Error::Internal(_))
    }

    #[tokio::test]
    async fn test_succeeds_first_attempt() {
        let result = retry_on_lock("test_op", 5000, || async { Ok::<i32, Error>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let mut attempts = 0;

        let result = retry_when("test_op", 5000, is_internal, || {
            attempts += 1;
            let current = attempts;
            async move {
                if current < 3 {
                    Err(Error::Internal("locked".to_string()))
                } else {
                    Ok(current)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_wait() {
        let result = retry_when("test_op", 30, is_internal, || async {
            Err::<i32, Error>(Error::Internal("locked".to_string()))
        })
        .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("test_op failed after"));
    }

    #[tokio::test]
    async fn test_non_lock_error_fails_immediately() {
        let mut attempts = 0;

        let result = retry_on_lock("test_op", 5000, || {
            attempts += 1;
            async { Err::<i32, Error>(Error::InvalidInput("bad".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(attempts, 1);
    }

    #[test]
    fn test_is_lock_error_ignores_other_kinds() {
        assert!(!is_lock_error(&Error::Internal("database is locked".into())));
        assert!(!is_lock_error(&Error::Database(sqlx::Error::RowNotFound)));
    }
}
