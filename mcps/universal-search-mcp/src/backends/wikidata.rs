//! Wikidata ISBN lookup
//!
//! Queries the public SPARQL endpoint for the item whose ISBN-13 (P212)
//! equals the requested ISBN, with labels for author and publisher.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use super::fetch_json;
use crate::book_details::IsbnSource;
use crate::config::WikidataConfig;
use crate::error::BackendResult;
use crate::types::BookInfo;

/// Provider tag for Wikidata data
pub const SOURCE: &str = "wikidata";

/// Wikidata SPARQL client
pub struct WikidataClient {
    client: Client,
    config: WikidataConfig,
}

impl WikidataClient {
    pub fn new(client: Client, config: WikidataConfig) -> Self {
        Self { client, config }
    }
}

// SPARQL JSON result types
#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    #[serde(default)]
    bindings: Vec<HashMap<String, SparqlValue>>,
}

#[derive(Debug, Deserialize)]
struct SparqlValue {
    value: String,
}

/// Keep only characters that can appear in an ISBN so the literal stays closed
fn sanitize_isbn(isbn: &str) -> String {
    isbn.chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, 'X' | 'x' | '-'))
        .collect()
}

fn isbn_query(isbn: &str) -> String {
    format!(
        r#"SELECT ?book ?bookLabel ?author ?authorLabel ?publisher ?publisherLabel ?publicationDate ?pages WHERE {{
  ?book wdt:P212 "{}".
  OPTIONAL {{ ?book wdt:P50 ?author. }}
  OPTIONAL {{ ?book wdt:P123 ?publisher. }}
  OPTIONAL {{ ?book wdt:P577 ?publicationDate. }}
  OPTIONAL {{ ?book wdt:P1104 ?pages. }}
  SERVICE wikibase:label {{ bd:serviceParam wikibase:language "[AUTO_LANGUAGE],en". }}
}}"#,
        sanitize_isbn(isbn)
    )
}

fn map_bindings(response: SparqlResponse) -> BookInfo {
    let Some(row) = response.results.bindings.into_iter().next() else {
        return BookInfo::default();
    };
    let field = |name: &str| row.get(name).map(|v| v.value.clone());

    let Some(item_id) = field("book")
        .and_then(|uri| uri.rsplit('/').next().map(str::to_string))
        .filter(|id| !id.is_empty())
    else {
        return BookInfo::default();
    };

    let mut book = BookInfo {
        title: field("bookLabel").unwrap_or_default(),
        authors: field("authorLabel").into_iter().collect(),
        publisher: field("publisherLabel"),
        published_date: field("publicationDate"),
        page_count: field("pages").and_then(|p| p.parse::<f64>().ok()).map(|p| p as u32),
        ..BookInfo::default()
    };
    book.source_urls.insert(
        SOURCE.to_string(),
        format!("https://www.wikidata.org/wiki/{}", item_id),
    );
    book.identifiers.insert("wikidata_id".to_string(), item_id);

    book
}

#[async_trait]
impl IsbnSource for WikidataClient {
    fn name(&self) -> &'static str {
        SOURCE
    }

    fn is_available(&self) -> bool {
        !self.config.sparql_url.is_empty()
    }

    async fn lookup_isbn(&self, isbn: &str) -> BackendResult<BookInfo> {
        let query = isbn_query(isbn);
        let request = self
            .client
            .get(&self.config.sparql_url)
            .header(reqwest::header::ACCEPT, "application/sparql-results+json")
            .query(&[("query", query.as_str()), ("format", "json")]);

        let response: SparqlResponse = fetch_json(request).await?;
        Ok(map_bindings(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_contains_sanitized_isbn() {
        let query = isbn_query(r#"978-0-14-143951-8" } DROP"#);
        assert!(query.contains(r#"wdt:P212 "978-0-14-143951-8"."#));
        assert!(!query.contains("DROP"));
    }

    #[test]
    fn test_map_bindings() {
        let response: SparqlResponse = serde_json::from_value(json!({
            "head": {"vars": ["book", "bookLabel"]},
            "results": {"bindings": [{
                "book": {"type": "uri", "value": "http://www.wikidata.org/entity/Q170583"},
                "bookLabel": {"type": "literal", "value": "Pride and Prejudice"},
                "authorLabel": {"type": "literal", "value": "Jane Austen"},
                "publicationDate": {"type": "literal", "value": "1813-01-28T00:00:00Z"},
                "pages": {"type": "literal", "value": "432"}
            }]}
        }))
        .unwrap();

        let book = map_bindings(response);
        assert_eq!(book.title, "Pride and Prejudice");
        assert_eq!(book.authors, vec!["Jane Austen"]);
        assert_eq!(book.page_count, Some(432));
        assert_eq!(book.identifiers["wikidata_id"], "Q170583");
        assert_eq!(book.source_urls[SOURCE], "https://www.wikidata.org/wiki/Q170583");
        assert!(book.publisher.is_none());
    }

    #[test]
    fn test_map_empty_bindings() {
        let response: SparqlResponse =
            serde_json::from_value(json!({"results": {"bindings": []}})).unwrap();
        assert_eq!(map_bindings(response), BookInfo::default());
    }
}
