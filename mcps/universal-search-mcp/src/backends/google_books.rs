//! Google Books backend
//!
//! Volume search via the Books API v1. Requires an API key.
//! See: https://developers.google.com/books/docs/v1/using

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{fetch_json, SearchBackend};
use crate::book_details::IsbnSource;
use crate::config::{non_empty_key, GoogleBooksConfig};
use crate::error::{BackendError, BackendResult};
use crate::types::{BookInfo, Identifiers, ImageLinks, SearchResult};

/// Provider tag for Google Books results
pub const SOURCE: &str = "google_books";

/// Google Books backend
pub struct GoogleBooksBackend {
    client: Client,
    config: GoogleBooksConfig,
    max_results: usize,
}

impl GoogleBooksBackend {
    pub fn new(client: Client, config: GoogleBooksConfig, max_results: usize) -> Self {
        Self {
            client,
            config,
            max_results,
        }
    }

    fn api_key(&self) -> BackendResult<&str> {
        non_empty_key(self.config.api_key.as_deref()).ok_or(BackendError::MissingCredential)
    }

    async fn volumes(&self, q: &str, max_results: usize) -> BackendResult<VolumesResponse> {
        let key = self.api_key()?;
        let url = format!("{}/volumes", self.config.base_url.trim_end_matches('/'));
        // Books API caps maxResults at 40
        let max_results = max_results.clamp(1, 40).to_string();

        let request = self.client.get(&url).query(&[
            ("q", q),
            ("key", key),
            ("maxResults", max_results.as_str()),
        ]);
        fetch_json(request).await
    }
}

// Books API response types
#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    id: String,
    #[serde(default)]
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    subtitle: Option<String>,
    description: Option<String>,
    info_link: Option<String>,
    authors: Option<Vec<String>>,
    publisher: Option<String>,
    published_date: Option<String>,
    page_count: Option<u32>,
    categories: Option<Vec<String>>,
    language: Option<String>,
    image_links: Option<VolumeImageLinks>,
    #[serde(default)]
    industry_identifiers: Vec<IndustryIdentifier>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeImageLinks {
    thumbnail: Option<String>,
    small_thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IndustryIdentifier {
    #[serde(rename = "type")]
    kind: String,
    identifier: String,
}

impl VolumeInfo {
    fn isbn_of(&self, kind: &str) -> Option<&str> {
        self.industry_identifiers
            .iter()
            .find(|id| id.kind == kind)
            .map(|id| id.identifier.as_str())
    }

    /// ISBN-13 values first so the same edition keys the same way everywhere
    fn isbns(&self) -> Vec<String> {
        ["ISBN_13", "ISBN_10"]
            .iter()
            .flat_map(|kind| {
                self.industry_identifiers
                    .iter()
                    .filter(move |id| id.kind == *kind && !id.identifier.trim().is_empty())
                    .map(|id| id.identifier.trim().to_string())
            })
            .collect()
    }

    fn thumbnail(&self) -> Option<String> {
        self.image_links
            .as_ref()
            .and_then(|links| links.thumbnail.clone().or_else(|| links.small_thumbnail.clone()))
    }
}

fn volume_url(id: &str) -> String {
    format!("https://books.google.com/books?id={}", id)
}

fn map_volumes(response: VolumesResponse) -> Vec<SearchResult> {
    response
        .items
        .into_iter()
        .filter_map(|volume| {
            let info = volume.volume_info;
            let title = info.title.clone().filter(|t| !t.trim().is_empty())?;
            let isbn = info.isbns();
            let thumbnail = info.thumbnail();

            Some(SearchResult {
                url: info.info_link.unwrap_or_else(|| volume_url(&volume.id)),
                id: volume.id,
                title,
                subtitle: info.subtitle,
                description: info.description.unwrap_or_default(),
                source: SOURCE.to_string(),
                kind: "book".to_string(),
                authors: info.authors,
                published_date: info.published_date,
                image_links: thumbnail.map(|t| ImageLinks { thumbnail: Some(t) }),
                identifiers: (!isbn.is_empty()).then(|| Identifiers {
                    isbn,
                    ..Identifiers::default()
                }),
            })
        })
        .collect()
}

fn map_book_info(response: VolumesResponse) -> BookInfo {
    let Some(volume) = response.items.into_iter().next() else {
        return BookInfo::default();
    };
    let info = volume.volume_info;

    let mut book = BookInfo {
        title: info.title.clone().unwrap_or_default(),
        subtitle: info.subtitle.clone(),
        authors: info.authors.clone().unwrap_or_default(),
        publisher: info.publisher.clone(),
        published_date: info.published_date.clone(),
        description: info.description.clone(),
        page_count: info.page_count,
        categories: info.categories.clone(),
        image_links: info.thumbnail().map(|t| ImageLinks { thumbnail: Some(t) }),
        language: info.language.clone(),
        ..BookInfo::default()
    };

    if let Some(isbn) = info.isbn_of("ISBN_10") {
        book.identifiers.insert("isbn_10".to_string(), isbn.to_string());
    }
    if let Some(isbn) = info.isbn_of("ISBN_13") {
        book.identifiers.insert("isbn_13".to_string(), isbn.to_string());
    }
    book.identifiers
        .insert("google_books_id".to_string(), volume.id.clone());
    book.source_urls
        .insert(SOURCE.to_string(), volume_url(&volume.id));

    book
}

#[async_trait]
impl SearchBackend for GoogleBooksBackend {
    fn name(&self) -> &str {
        SOURCE
    }

    fn is_available(&self) -> bool {
        self.api_key().is_ok()
    }

    async fn search(&self, query: &str) -> BackendResult<Vec<SearchResult>> {
        let response = self.volumes(query, self.max_results).await?;
        Ok(map_volumes(response))
    }
}

#[async_trait]
impl IsbnSource for GoogleBooksBackend {
    fn name(&self) -> &'static str {
        SOURCE
    }

    fn is_available(&self) -> bool {
        self.api_key().is_ok()
    }

    async fn lookup_isbn(&self, isbn: &str) -> BackendResult<BookInfo> {
        let response = self.volumes(&format!("isbn:{}", isbn), 1).await?;
        Ok(map_book_info(response))
    }
}
