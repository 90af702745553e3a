//! Common types for universal search results
//!
//! Every backend normalizes its provider-specific response into
//! [`SearchResult`]. The merger turns those into [`MergedResult`]s, one per
//! real-world entity. Field names serialize in camelCase.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single normalized search result from one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Provider-local identifier (unique only within `source`)
    pub id: String,
    /// Display title, never empty
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Free-text summary, may be empty
    #[serde(default)]
    pub description: String,
    /// Canonical URL at the provider
    pub url: String,
    /// Provider tag, e.g. `google_books`
    pub source: String,
    /// Coarse content type (`book`, `video`, `article`)
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    /// Free-form date text as the provider returned it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_links: Option<ImageLinks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifiers: Option<Identifiers>,
}

impl SearchResult {
    /// Create a result with the required fields; optional metadata starts empty
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        source: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            subtitle: None,
            description: String::new(),
            url: url.into(),
            source: source.into(),
            kind: kind.into(),
            authors: None,
            published_date: None,
            image_links: None,
            identifiers: None,
        }
    }

    /// Thumbnail URL, if the provider supplied one
    pub fn thumbnail(&self) -> Option<&str> {
        self.image_links
            .as_ref()
            .and_then(|links| links.thumbnail.as_deref())
    }
}

/// Image links attached to a result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// Natural-key hints used to recognise the same entity across providers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identifiers {
    /// ISBNs for the work; order matters, the first one is the match key
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub isbn: Vec<String>,
    /// Wikidata item ID, e.g. `Q170583`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wikidata: Option<String>,
    /// VIAF name-authority ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viaf: Option<String>,
    /// OCLC catalog number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oclc: Option<String>,
}

impl Identifiers {
    /// True when no identifier of any kind is present
    pub fn is_empty(&self) -> bool {
        self.isbn.is_empty() && self.wikidata.is_none() && self.viaf.is_none() && self.oclc.is_none()
    }

    /// Fold `other` into `self`.
    ///
    /// ISBNs are unioned (existing order kept, new values appended).
    /// Single-valued IDs from `other` overwrite ours when present.
    pub fn merge_from(&mut self, other: &Identifiers) {
        for isbn in &other.isbn {
            if !self.isbn.contains(isbn) {
                self.isbn.push(isbn.clone());
            }
        }
        if other.wikidata.is_some() {
            self.wikidata = other.wikidata.clone();
        }
        if other.viaf.is_some() {
            self.viaf = other.viaf.clone();
        }
        if other.oclc.is_some() {
            self.oclc = other.oclc.clone();
        }
    }
}

/// One entity after cross-provider merging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedResult {
    /// Fields of the first-seen record, enriched by later matches
    #[serde(flatten)]
    pub result: SearchResult,
    /// Provider tag -> URL for every provider that contributed
    pub alternate_source_urls: BTreeMap<String, String>,
}

impl MergedResult {
    /// Start a merge group from its first record
    pub fn from_first(result: SearchResult) -> Self {
        let mut alternate_source_urls = BTreeMap::new();
        alternate_source_urls.insert(result.source.clone(), result.url.clone());
        Self {
            result,
            alternate_source_urls,
        }
    }

    /// Fold a later record for the same entity into this one.
    ///
    /// Only provenance, identifiers, description and a missing thumbnail are
    /// taken from `incoming`; everything else keeps the first-seen value.
    pub fn absorb(&mut self, incoming: SearchResult) {
        self.alternate_source_urls
            .insert(incoming.source.clone(), incoming.url.clone());

        if let Some(ids) = &incoming.identifiers {
            self.result
                .identifiers
                .get_or_insert_with(Identifiers::default)
                .merge_from(ids);
        }

        if self.result.thumbnail().is_none() {
            if let Some(thumb) = incoming.thumbnail() {
                self.result
                    .image_links
                    .get_or_insert_with(ImageLinks::default)
                    .thumbnail = Some(thumb.to_string());
            }
        }

        if incoming.description.chars().count() > self.result.description.chars().count() {
            self.result.description = incoming.description;
        }
    }
}

/// Response envelope for the `search` tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The query that was executed
    pub query: String,
    /// Number of merged results
    pub total: usize,
    pub results: Vec<MergedResult>,
}

/// Book metadata assembled from an ISBN lookup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookInfo {
    /// Preferred ISBN (13 digit when known)
    pub isbn: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_links: Option<ImageLinks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Keys: `isbn_10`, `isbn_13`, `google_books_id`, `wikidata_id`
    #[serde(default)]
    pub identifiers: BTreeMap<String, String>,
    /// Provider tag -> page URL
    #[serde(default)]
    pub source_urls: BTreeMap<String, String>,
}
