//! YouTube backend
//!
//! Video search via the YouTube Data API v3 `search` endpoint. Requires an API key.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{decode_entities, fetch_json, SearchBackend};
use crate::config::{non_empty_key, YouTubeConfig};
use crate::error::{BackendError, BackendResult};
use crate::types::{ImageLinks, SearchResult};

/// Provider tag for YouTube results
pub const SOURCE: &str = "youtube";

/// YouTube backend
pub struct YouTubeBackend {
    client: Client,
    config: YouTubeConfig,
    max_results: usize,
}

impl YouTubeBackend {
    pub fn new(client: Client, config: YouTubeConfig, max_results: usize) -> Self {
        Self {
            client,
            config,
            max_results,
        }
    }

    fn api_key(&self) -> BackendResult<&str> {
        non_empty_key(self.config.api_key.as_deref()).ok_or(BackendError::MissingCredential)
    }
}

// YouTube API response types
#[derive(Debug, Deserialize)]
struct YouTubeSearchResponse {
    #[serde(default)]
    items: Vec<YouTubeItem>,
}

#[derive(Debug, Deserialize)]
struct YouTubeItem {
    id: YouTubeId,
    #[serde(default)]
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YouTubeId {
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    published_at: Option<String>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    default: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl Thumbnails {
    fn best(self) -> Option<String> {
        self.medium
            .or(self.high)
            .or(self.default)
            .map(|t| t.url)
    }
}

fn map_items(response: YouTubeSearchResponse) -> Vec<SearchResult> {
    response
        .items
        .into_iter()
        .filter_map(|item| {
            let video_id = item.id.video_id?;
            let snippet = item.snippet;
            let title = decode_entities(&snippet.title);
            if title.trim().is_empty() {
                return None;
            }

            Some(SearchResult {
                url: format!("https://www.youtube.com/watch?v={}", video_id),
                id: video_id,
                title,
                subtitle: None,
                description: decode_entities(&snippet.description),
                source: SOURCE.to_string(),
                kind: "video".to_string(),
                authors: None,
                published_date: snippet.published_at,
                image_links: snippet
                    .thumbnails
                    .best()
                    .map(|t| ImageLinks { thumbnail: Some(t) }),
                identifiers: None,
            })
        })
        .collect()
}

#[async_trait]
impl SearchBackend for YouTubeBackend {
    fn name(&self) -> &str {
        SOURCE
    }

    fn is_available(&self) -> bool {
        self.api_key().is_ok()
    }

    async fn search(&self, query: &str) -> BackendResult<Vec<SearchResult>> {
        let key = self.api_key()?;
        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));
        // Data API caps maxResults at 50
        let max_results = self.max_results.clamp(1, 50).to_string();

        let request = self.client.get(&url).query(&[
            ("part", "snippet"),
            ("type", "video"),
            ("q", query),
            ("key", key),
            ("maxResults", max_results.as_str()),
        ]);

        let response: YouTubeSearchResponse = fetch_json(request).await?;
        Ok(map_items(response))
    }
}
