//! YouTube Data API client
//!
//! Used to attach a cooking video to imported recipes. Lookups are best
//! effort: the importer treats any error as "no video".

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use super::recipe_source::SourceError;

const YOUTUBE_SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";

static BARE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid regex"));

static URL_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:https?://)?(?:(?:www\.|m\.)?youtube\.com/(?:watch\?(?:.*&)?v=|embed/|live/|shorts/)|youtu\.be/)([A-Za-z0-9_-]{11})(?:[?&#/]|$)",
    )
    .expect("valid regex")
});

/// Extract an 11-character video id from a bare id or a YouTube URL
///
/// Accepts watch (`?v=`), embed, live, shorts and youtu.be forms.
pub fn extract_video_id(url_or_id: &str) -> Option<String> {
    let input = url_or_id.trim();
    if input.is_empty() {
        return None;
    }

    if BARE_ID.is_match(input) {
        return Some(input.to_string());
    }

    URL_ID
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Finds a video for a recipe title
#[async_trait]
pub trait VideoSearch: Send + Sync + fmt::Debug {
    /// Best-matching video id, or None when nothing matched
    async fn best_match(&self, query: &str) -> Result<Option<String>, SourceError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    #[serde(default)]
    video_id: Option<String>,
}

pub struct YouTubeClient {
    client: Client,
    api_key: String,
}

impl fmt::Debug for YouTubeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YouTubeClient").finish_non_exhaustive()
    }
}

impl YouTubeClient {
    pub fn new(api_key: String) -> Result<Self, SourceError> {
        if api_key.trim().is_empty() {
            return Err(SourceError::NotConfigured("YouTube API key is empty".to_string()));
        }

        let client = Client::builder()
            .user_agent(recipehub_common::config::get_user_agent())
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| SourceError::NetworkError(e.to_string()))?;

        Ok(Self { client, api_key })
    }

    fn search_request(&self, query: &str) -> RequestBuilder {
        self.client.get(YOUTUBE_SEARCH_URL).query(&[
            ("part", "snippet".to_string()),
            ("maxResults", "1".to_string()),
            ("q", format!("{} recipe", query.trim())),
            ("type", "video".to_string()),
            ("key", self.api_key.clone()),
        ])
    }
}

#[async_trait]
impl VideoSearch for YouTubeClient {
    async fn best_match(&self, query: &str) -> Result<Option<String>, SourceError> {
        // reqwest errors carry the request URL, which holds the key
        let response = self
            .search_request(query)
            .send()
            .await
            .map_err(|e| SourceError::NetworkError(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::ApiError(status.as_u16(), body));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| SourceError::ParseError(e.without_url().to_string()))?;

        let video_id = parsed
            .items
            .into_iter()
            .find_map(|item| item.id.video_id)
            .and_then(|id| extract_video_id(&id));

        tracing::debug!(query = %query, video_id = ?video_id, "YouTube search complete");

        Ok(video_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bare_id() {
        assert_eq!(extract_video_id("dQw4w9WgXcQ").as_deref(), Some("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_extract_from_url_forms() {
        let cases = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/live/dQw4w9WgXcQ?si=abc",
            "https://youtube.com/shorts/dQw4w9WgXcQ",
        ];
        for url in cases {
            assert_eq!(extract_video_id(url).as_deref(), Some("dQw4w9WgXcQ"), "{}", url);
        }
    }

    #[test]
    fn test_extract_rejects_garbage() {
        assert_eq!(extract_video_id(""), None);
        assert_eq!(extract_video_id("short"), None);
        assert_eq!(extract_video_id("https://example.com/"), None);
        assert_eq!(extract_video_id("https://example.com/abcdefghijk"), None);
        assert_eq!(extract_video_id("https://vimeo.com/embed/abcdefghijk"), None);
        assert_eq!(extract_video_id("https://www.youtube.com/watch?v=tooShort"), None);
    }

    #[test]
    fn test_search_request_appends_recipe() {
        let client = YouTubeClient::new("yt".to_string()).unwrap();
        let url = client.search_request("Pad Thai").build().unwrap().url().to_string();
        assert!(url.starts_with(YOUTUBE_SEARCH_URL));
        assert!(url.contains("q=Pad+Thai+recipe"));
        assert!(url.contains("maxResults=1"));
        assert!(url.contains("type=video"));
        assert!(url.ends_with("key=yt"));
    }

    #[test]
    fn test_search_response_parses() {
        let json = r#"{"items": [{"id": {"kind": "youtube#video", "videoId": "abcdefghijk"}}]}"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.items[0].id.video_id.as_deref(), Some("abcdefghijk"));
    }
}
