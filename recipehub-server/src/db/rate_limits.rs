//! Fixed-window rate-limit counters
//!
//! One row per key. A counter whose window has ended restarts at 1 with a
//! fresh window; otherwise it is incremented in place.

use recipehub_common::Result;
use sqlx::{Row, SqlitePool};

/// Increment the counter for `key` and return (count, window_ends_at)
///
/// `now` and `window_secs` are unix seconds. The upsert is a single statement,
/// so concurrent callers sharing the database never lose an increment.
pub async fn increment_counter(
    pool: &SqlitePool,
    key: &str,
    now: i64,
    window_secs: i64,
) -> Result<(i64, i64)> {
    let row = sqlx::query(
        "INSERT INTO rate_limit_counters (key, count, window_ends_at) VALUES (?, 1, ?)
         ON CONFLICT(key) DO UPDATE SET
             count = CASE WHEN window_ends_at <= ? THEN 1 ELSE count + 1 END,
             window_ends_at = CASE WHEN window_ends_at <= ? THEN excluded.window_ends_at
                                   ELSE window_ends_at END
         RETURNING count, window_ends_at",
    )
    .bind(key)
    .bind(now + window_secs)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok((row.get("count"), row.get("window_ends_at")))
}

/// Delete counters whose window has ended; returns rows removed
pub async fn purge_expired(pool: &SqlitePool, now: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM rate_limit_counters WHERE window_ends_at <= ?")
        .bind(now)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
