//! ISBN book-details lookup
//!
//! Looks an ISBN up in a primary catalog (Google Books) and a secondary
//! knowledge base (Wikidata) at the same time, then merges both partial
//! records with [`merge_book_data`].

use async_trait::async_trait;
use std::sync::Arc;

use crate::backends::google_books::GoogleBooksBackend;
use crate::backends::wikidata::WikidataClient;
use crate::error::{BackendResult, LookupError};
use crate::types::BookInfo;

/// A source that can describe a book given its ISBN
#[async_trait]
pub trait IsbnSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Unavailable sources are skipped and contribute nothing
    fn is_available(&self) -> bool;

    /// Partial book data; `BookInfo::default()` when nothing matched
    async fn lookup_isbn(&self, isbn: &str) -> BackendResult<BookInfo>;
}

/// Concurrent ISBN lookup across a catalog and a knowledge base
#[derive(Clone)]
pub struct BookDetailsService {
    catalog: Arc<dyn IsbnSource>,
    knowledge_base: Arc<dyn IsbnSource>,
}

impl BookDetailsService {
    pub fn new(catalog: Arc<dyn IsbnSource>, knowledge_base: Arc<dyn IsbnSource>) -> Self {
        Self {
            catalog,
            knowledge_base,
        }
    }

    pub fn from_backends(google: GoogleBooksBackend, wikidata: WikidataClient) -> Self {
        Self::new(Arc::new(google), Arc::new(wikidata))
    }

    pub async fn fetch(&self, isbn: &str) -> Result<BookInfo, LookupError> {
        let isbn = isbn.trim();
        if isbn.is_empty() {
            return Err(LookupError::EmptyIsbn);
        }

        tracing::info!("Fetching book information for ISBN: {}", isbn);

        let (catalog, knowledge_base) = tokio::join!(
            lookup(self.catalog.as_ref(), isbn),
            lookup(self.knowledge_base.as_ref(), isbn)
        );

        Ok(merge_book_data(catalog?, knowledge_base?))
    }
}

async fn lookup(source: &dyn IsbnSource, isbn: &str) -> Result<BookInfo, LookupError> {
    if !source.is_available() {
        tracing::debug!(provider = source.name(), "Skipping unavailable ISBN source");
        return Ok(BookInfo::default());
    }

    source
        .lookup_isbn(isbn)
        .await
        .map_err(|source_err| LookupError::Provider {
            provider: source.name(),
            source: source_err,
        })
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

/// Merge catalog data with knowledge-base data.
///
/// The catalog wins for scalar fields, the knowledge base fills gaps.
/// Subtitle, description, categories, images and language are catalog-only.
/// Authors are de-duplicated in catalog-first order; identifiers and source
/// URLs are unioned with the knowledge base winning on key conflicts.
pub fn merge_book_data(catalog: BookInfo, knowledge_base: BookInfo) -> BookInfo {
    let mut authors = catalog.authors;
    for author in knowledge_base.authors {
        if !authors.contains(&author) {
            authors.push(author);
        }
    }

    let mut identifiers = catalog.identifiers;
    identifiers.extend(knowledge_base.identifiers);

    let mut source_urls = catalog.source_urls;
    source_urls.extend(knowledge_base.source_urls);

    let isbn = identifiers
        .get("isbn_13")
        .or_else(|| identifiers.get("isbn_10"))
        .cloned()
        .unwrap_or_default();

    BookInfo {
        isbn,
        title: non_empty(catalog.title)
            .or_else(|| non_empty(knowledge_base.title))
            .unwrap_or_default(),
        subtitle: catalog.subtitle,
        authors,
        publisher: catalog.publisher.or(knowledge_base.publisher),
        published_date: catalog.published_date.or(knowledge_base.published_date),
        description: catalog.description,
        page_count: catalog.page_count.or(knowledge_base.page_count),
        categories: catalog.categories,
        image_links: catalog.image_links,
        language: catalog.language,
        identifiers,
        source_urls,
    }
}
