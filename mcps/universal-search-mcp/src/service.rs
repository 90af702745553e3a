//! Universal search service
//!
//! Fans a query out to every registered provider at once, concatenates the
//! results in registration order and merges them into entities.

use futures_util::future::join_all;
use std::sync::Arc;

use crate::backends::google_books::GoogleBooksBackend;
use crate::backends::wikipedia::WikipediaBackend;
use crate::backends::youtube::YouTubeBackend;
use crate::backends::{http_client, FailOpen, SearchProvider};
use crate::config::Config;
use crate::error::{BackendResult, SearchError};
use crate::merge;
use crate::types::{MergedResult, SearchResult};

/// Aggregates search providers
#[derive(Clone, Default)]
pub struct SearchService {
    providers: Vec<Arc<dyn SearchProvider>>,
}

impl SearchService {
    pub fn new(providers: Vec<Arc<dyn SearchProvider>>) -> Self {
        Self { providers }
    }

    /// Build the standard provider set: Google Books, YouTube, Wikipedia
    pub fn from_config(config: &Config) -> BackendResult<Self> {
        let client = http_client(&config.search)?;
        let timeout = config.search.timeout();
        let max_results = config.search.max_results;

        let mut service = Self::default();
        service.register(Arc::new(FailOpen::new(
            GoogleBooksBackend::new(client.clone(), config.google_books.clone(), max_results),
            timeout,
        )));
        service.register(Arc::new(FailOpen::new(
            YouTubeBackend::new(client.clone(), config.youtube.clone(), max_results),
            timeout,
        )));
        service.register(Arc::new(FailOpen::new(
            WikipediaBackend::new(client, config.wikipedia.clone(), max_results)?
                .with_budget(timeout),
            timeout,
        )));

        for provider in &service.providers {
            if !provider.is_available() {
                tracing::warn!(
                    "Provider '{}' is not available (check its API key)",
                    provider.name()
                );
            }
        }

        Ok(service)
    }

    /// Append a provider; registration order decides merge precedence
    pub fn register(&mut self, provider: Arc<dyn SearchProvider>) {
        self.providers.push(provider);
    }

    pub fn providers(&self) -> &[Arc<dyn SearchProvider>] {
        &self.providers
    }

    /// Query every provider concurrently and merge what comes back.
    ///
    /// Provider failures are invisible here: a failed provider simply
    /// contributes no results. Only an empty query is an error.
    pub async fn search(&self, query: &str) -> Result<Vec<MergedResult>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        tracing::info!("Searching {} providers for: {}", self.providers.len(), query);

        let batches = join_all(self.providers.iter().map(|p| p.search(query))).await;

        let mut records: Vec<SearchResult> = Vec::new();
        for (provider, batch) in self.providers.iter().zip(batches) {
            tracing::debug!(provider = provider.name(), count = batch.len(), "Collected results");
            records.extend(batch);
        }

        let total = records.len();
        let merged = merge::resolve(records);
        tracing::info!("Merged {} results into {} entities", total, merged.len());

        Ok(merged)
    }
}
