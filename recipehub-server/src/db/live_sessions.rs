//! Live session database operations
//!
//! All updates are keyed by room name. Each returns whether a row matched so
//! the webhook handler can log events for rooms it does not know about.

use chrono::Utc;
use recipehub_common::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::LiveSession;

fn now() -> String {
    Utc::now().to_rfc3339()
}

/// Register a room if it is not yet known; returns true when a row was created
pub async fn ensure_session(pool: &SqlitePool, room_name: &str, title: &str) -> Result<bool> {
    let result = sqlx::query(
        "INSERT INTO live_sessions (id, room_name, title, started_at)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(room_name) DO NOTHING",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(room_name)
    .bind(title)
    .bind(now())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn mark_recording_started(
    pool: &SqlitePool,
    room_name: &str,
    recording_id: &str,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE live_sessions SET recording_id = ?, recording_started_at = ? WHERE room_name = ?",
    )
    .bind(recording_id)
    .bind(now())
    .bind(room_name)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn mark_recording_ended(
    pool: &SqlitePool,
    room_name: &str,
    recording_id: &str,
    recording_url: &str,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE live_sessions
         SET recording_id = ?, recording_url = ?, recording_ended_at = ?
         WHERE room_name = ?",
    )
    .bind(recording_id)
    .bind(recording_url)
    .bind(now())
    .bind(room_name)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn mark_room_finished(pool: &SqlitePool, room_name: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE live_sessions SET ended_at = ? WHERE room_name = ?")
        .bind(now())
        .bind(room_name)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Increment the viewer count and raise the high-water mark in one statement
///
/// Returns the new viewer count, or None for an unknown room.
pub async fn increment_viewers(pool: &SqlitePool, room_name: &str) -> Result<Option<i64>> {
    // SET expressions all see the pre-update row, hence the +1 inside MAX
    let count: Option<i64> = sqlx::query_scalar(
        "UPDATE live_sessions
         SET viewer_count = viewer_count + 1,
             max_viewers = MAX(max_viewers, viewer_count + 1)
         WHERE room_name = ?
         RETURNING viewer_count",
    )
    .bind(room_name)
    .fetch_optional(pool)
    .await?;

    Ok(count)
}

/// Decrement the viewer count, never below zero
///
/// Returns true when the count changed.
pub async fn decrement_viewers(pool: &SqlitePool, room_name: &str) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE live_sessions SET viewer_count = viewer_count - 1
         WHERE room_name = ? AND viewer_count > 0",
    )
    .bind(room_name)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn find_by_room(pool: &SqlitePool, room_name: &str) -> Result<Option<LiveSession>> {
    let row = sqlx::query(
        "SELECT id, room_name, title, viewer_count, max_viewers, recording_id, recording_url,
                recording_started_at, recording_ended_at, started_at, ended_at
         FROM live_sessions WHERE room_name = ?",
    )
    .bind(room_name)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| LiveSession {
        id: r.get("id"),
        room_name: r.get("room_name"),
        title: r.get("title"),
        viewer_count: r.get("viewer_count"),
        max_viewers: r.get("max_viewers"),
        recording_id: r.get("recording_id"),
        recording_url: r.get("recording_url"),
        recording_started_at: r.get("recording_started_at"),
        recording_ended_at: r.get("recording_ended_at"),
        started_at: r.get("started_at"),
        ended_at: r.get("ended_at"),
    }))
}
