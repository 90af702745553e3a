//! Wikipedia backend
//!
//! Two requests against the MediaWiki action API, no key needed:
//! 1. `list=search` for matching articles
//! 2. `prop=pageprops` for the Wikidata item behind each article
//!
//! The second step is best effort. If it fails the articles are still
//! returned, just without `identifiers.wikidata`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use url::Url;

use super::{fetch_json, strip_html, SearchBackend};
use crate::config::WikipediaConfig;
use crate::error::{BackendError, BackendResult};
use crate::types::{Identifiers, SearchResult};

/// Provider tag for Wikipedia results
pub const SOURCE: &str = "wikipedia";

/// Wikipedia backend
pub struct WikipediaBackend {
    client: Client,
    api_url: String,
    article_base: Url,
    resolve_wikidata: bool,
    max_results: usize,
    budget: Option<Duration>,
}

impl WikipediaBackend {
    pub fn new(client: Client, config: WikipediaConfig, max_results: usize) -> BackendResult<Self> {
        let article_base = Url::parse(&config.article_base_url)?;
        if article_base.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase.into());
        }

        Ok(Self {
            client,
            api_url: config.api_url,
            article_base,
            resolve_wikidata: config.resolve_wikidata,
            max_results,
            budget: None,
        })
    }

    /// Total time the provider is given per search.
    ///
    /// The pageprops step then only gets part of what the first request
    /// left over, so a slow second step cannot take the hits down with it.
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Time allowed for the pageprops step, given when the search started
    fn pageprops_budget(&self, started: Instant) -> Option<Duration> {
        self.budget
            .map(|budget| budget.saturating_sub(started.elapsed()) * 3 / 4)
    }

    async fn wikidata_ids_within(
        &self,
        page_ids: &[u64],
        limit: Option<Duration>,
    ) -> BackendResult<HashMap<u64, String>> {
        match limit {
            Some(limit) => tokio::time::timeout(limit, self.wikidata_ids(page_ids))
                .await
                .unwrap_or_else(|_| Err(BackendError::Timeout(limit))),
            None => self.wikidata_ids(page_ids).await,
        }
    }

    /// Article URL for a page title (spaces become underscores, rest percent-encoded)
    fn article_url(&self, title: &str) -> String {
        let mut url = self.article_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&title.replace(' ', "_"));
        }
        url.into()
    }

    async fn search_pages(&self, query: &str) -> BackendResult<Vec<SearchHit>> {
        let limit = self.max_results.clamp(1, 500).to_string();
        let request = self.client.get(&self.api_url).query(&[
            ("action", "query"),
            ("list", "search"),
            ("srsearch", query),
            ("srlimit", limit.as_str()),
            ("format", "json"),
        ]);

        let response: WikiSearchResponse = fetch_json(request).await?;
        Ok(response.query.map(|q| q.search).unwrap_or_default())
    }

    /// Map page ID -> Wikidata item ID
    async fn wikidata_ids(&self, page_ids: &[u64]) -> BackendResult<HashMap<u64, String>> {
        let mut items = HashMap::new();

        // pageids accepts at most 50 values per request
        for chunk in page_ids.chunks(50) {
            let ids = chunk
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join("|");

            let request = self.client.get(&self.api_url).query(&[
                ("action", "query"),
                ("prop", "pageprops"),
                ("ppprop", "wikibase_item"),
                ("pageids", ids.as_str()),
                ("format", "json"),
            ]);

            let response: PagePropsResponse = fetch_json(request).await?;
            items.extend(collect_wikidata_ids(response));
        }

        Ok(items)
    }

    fn map_hits(&self, hits: Vec<SearchHit>) -> Vec<SearchResult> {
        hits.into_iter()
            .filter(|hit| !hit.title.trim().is_empty())
            .map(|hit| {
                let mut result = SearchResult::new(
                    hit.pageid.to_string(),
                    hit.title.clone(),
                    self.article_url(&hit.title),
                    SOURCE,
                    "article",
                );
                result.description = strip_html(&hit.snippet);
                result
            })
            .collect()
    }
}

// MediaWiki API response types
#[derive(Debug, Deserialize)]
struct WikiSearchResponse {
    query: Option<WikiSearchQuery>,
}

#[derive(Debug, Deserialize)]
struct WikiSearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    pageid: u64,
    title: String,
    #[serde(default)]
    snippet: String,
}

#[derive(Debug, Deserialize)]
struct PagePropsResponse {
    query: Option<PagePropsQuery>,
}

#[derive(Debug, Deserialize)]
struct PagePropsQuery {
    #[serde(default)]
    pages: HashMap<String, Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    pageid: Option<u64>,
    pageprops: Option<PageProps>,
}

#[derive(Debug, Deserialize)]
struct PageProps {
    wikibase_item: Option<String>,
}

fn collect_wikidata_ids(response: PagePropsResponse) -> HashMap<u64, String> {
    response
        .query
        .map(|q| q.pages)
        .unwrap_or_default()
        .into_values()
        .filter_map(|page| {
            let item = page.pageprops?.wikibase_item?;
            Some((page.pageid?, item))
        })
        .collect()
}

fn attach_wikidata(results: &mut [SearchResult], ids: &HashMap<u64, String>) {
    for result in results {
        let Some(item) = result.id.parse::<u64>().ok().and_then(|id| ids.get(&id)) else {
            continue;
        };
        result
            .identifiers
            .get_or_insert_with(Identifiers::default)
            .wikidata = Some(item.clone());
    }
}

#[async_trait]
impl SearchBackend for WikipediaBackend {
    fn name(&self) -> &str {
        SOURCE
    }

    fn is_available(&self) -> bool {
        !self.api_url.is_empty()
    }

    async fn search(&self, query: &str) -> BackendResult<Vec<SearchResult>> {
        let started = Instant::now();
        let hits = self.search_pages(query).await?;
        let page_ids: Vec<u64> = hits.iter().map(|hit| hit.pageid).collect();
        let mut results = self.map_hits(hits);

        if self.resolve_wikidata && !page_ids.is_empty() {
            let limit = self.pageprops_budget(started);
            match self.wikidata_ids_within(&page_ids, limit).await {
                Ok(ids) => attach_wikidata(&mut results, &ids),
                Err(e) => {
                    tracing::warn!(provider = SOURCE, error = %e, "Wikidata ID lookup failed");
                }
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::test_server::{self, Reply};
    use crate::backends::{FailOpen, SearchProvider};
    use serde_json::json;

    const SEARCH_BODY: &str = r#"{"query":{"search":[
        {"ns":0,"title":"Dune (novel)","pageid":8134,"snippet":"<span class=\"searchmatch\">Dune</span> is a 1965 novel"}
    ]}}"#;

    const PAGEPROPS_BODY: &str = r#"{"query":{"pages":{
        "8134":{"pageid":8134,"ns":0,"title":"Dune (novel)","pageprops":{"wikibase_item":"Q190192"}}
    }}}"#;

    /// Serves `list=search` with one hit and answers pageprops with `pageprops`
    async fn local_backend(pageprops: fn() -> Reply) -> WikipediaBackend {
        let base = test_server::serve(move |target| {
            if target.contains("list=search") {
                Reply::json(200, SEARCH_BODY)
            } else {
                pageprops()
            }
        })
        .await;

        let config = WikipediaConfig {
            api_url: format!("{}/w/api.php", base),
            ..WikipediaConfig::default()
        };
        WikipediaBackend::new(Client::new(), config, 10).unwrap()
    }

    fn backend() -> WikipediaBackend {
        WikipediaBackend::new(Client::new(), WikipediaConfig::default(), 10).unwrap()
    }

    #[test]
    fn test_article_url_encodes_title() {
        let backend = backend();
        assert_eq!(
            backend.article_url("Pride and Prejudice"),
            "https://en.wikipedia.org/wiki/Pride_and_Prejudice"
        );
        assert_eq!(
            backend.article_url("Pride & Prejudice (novel)"),
            "https://en.wikipedia.org/wiki/Pride_&_Prejudice_(novel)"
        );
        assert!(backend.article_url("AC/DC").ends_with("/wiki/AC%2FDC"));
    }

    #[test]
    fn test_map_hits_strips_snippet_markup() {
        let response: WikiSearchResponse = serde_json::from_value(json!({
            "batchcomplete": "",
            "query": {
                "searchinfo": {"totalhits": 2},
                "search": [
                    {
                        "ns": 0,
                        "title": "Pride and Prejudice",
                        "pageid": 23114,
                        "snippet": "<span class=\"searchmatch\">Pride</span> and Prejudice is an 1813 novel"
                    },
                    {"ns": 0, "title": "", "pageid": 1, "snippet": ""}
                ]
            }
        }))
        .unwrap();

        let results = backend().map_hits(response.query.unwrap().search);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "23114");
        assert_eq!(results[0].description, "Pride and Prejudice is an 1813 novel");
        assert_eq!(results[0].source, SOURCE);
        assert_eq!(results[0].kind, "article");
    }

    #[test]
    fn test_attach_wikidata_ids() {
        let response: PagePropsResponse = serde_json::from_value(json!({
            "query": {
                "pages": {
                    "23114": {"pageid": 23114, "ns": 0, "title": "Pride and Prejudice",
                              "pageprops": {"wikibase_item": "Q170583"}},
                    "42": {"pageid": 42, "ns": 0, "title": "No item"}
                }
            }
        }))
        .unwrap();
        let ids = collect_wikidata_ids(response);
        assert_eq!(ids.len(), 1);

        let mut results = vec![
            SearchResult::new("23114", "Pride and Prejudice", "u1", SOURCE, "article"),
            SearchResult::new("42", "No item", "u2", SOURCE, "article"),
        ];
        attach_wikidata(&mut results, &ids);

        assert_eq!(
            results[0].identifiers.as_ref().unwrap().wikidata.as_deref(),
            Some("Q170583")
        );
        assert!(results[1].identifiers.is_none());
    }

    #[test]
    fn test_missing_query_block() {
        let response: WikiSearchResponse = serde_json::from_value(json!({"batchcomplete": ""})).unwrap();
        assert!(response.query.is_none());
    }

    #[test]
    fn test_rejects_non_base_article_url() {
        let config = WikipediaConfig {
            article_base_url: "mailto:someone@example.com".to_string(),
            ..WikipediaConfig::default()
        };
        assert!(WikipediaBackend::new(Client::new(), config, 10).is_err());
    }

    #[tokio::test]
    async fn test_search_attaches_wikidata_over_http() {
        let backend = local_backend(|| Reply::json(200, PAGEPROPS_BODY)).await;

        let results = backend.search("dune").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Dune (novel)");
        assert_eq!(results[0].description, "Dune is a 1965 novel");
        assert_eq!(
            results[0].identifiers.as_ref().unwrap().wikidata.as_deref(),
            Some("Q190192")
        );
    }

    #[tokio::test]
    async fn test_failed_pageprops_keeps_hits() {
        let backend = local_backend(|| Reply::json(500, "oops")).await;

        let results = backend.search("dune").await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].identifiers.is_none());
    }

    #[tokio::test]
    async fn test_slow_pageprops_keeps_hits_within_provider_timeout() {
        let budget = Duration::from_secs(1);
        let backend = local_backend(|| Reply::Hang).await.with_budget(budget);
        let provider = FailOpen::new(backend, budget);

        let results = provider.search("dune").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Dune (novel)");
        assert!(results[0].identifiers.is_none());
    }

    #[tokio::test]
    async fn test_search_status_error_fails_open() {
        let base = test_server::serve(|_| Reply::json(500, "internal")).await;
        let config = WikipediaConfig {
            api_url: format!("{}/w/api.php", base),
            ..WikipediaConfig::default()
        };
        let backend = WikipediaBackend::new(Client::new(), config, 10).unwrap();

        let err = backend.search("dune").await.unwrap_err();
        assert!(matches!(err, BackendError::Status { status: 500, .. }));

        let provider = FailOpen::new(backend, Duration::from_secs(1));
        assert!(provider.search("dune").await.is_empty());
    }

    #[test]
    fn test_pageprops_budget_is_part_of_what_is_left() {
        let budgeted = backend().with_budget(Duration::from_secs(4));
        let limit = budgeted.pageprops_budget(Instant::now()).unwrap();
        assert!(limit <= Duration::from_secs(3));
        assert!(limit > Duration::from_millis(2900));
        assert!(backend().pageprops_budget(Instant::now()).is_none());
    }
}
