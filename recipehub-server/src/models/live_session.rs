//! Live-streamed cooking sessions

use serde::Serialize;

/// Live session row, keyed by the streaming platform's room name
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSession {
    pub id: String,
    pub room_name: String,
    pub title: String,
    pub viewer_count: i64,
    pub max_viewers: i64,
    pub recording_id: Option<String>,
    pub recording_url: Option<String>,
    pub recording_started_at: Option<String>,
    pub recording_ended_at: Option<String>,
    pub started_at: String,
    pub ended_at: Option<String>,
}
