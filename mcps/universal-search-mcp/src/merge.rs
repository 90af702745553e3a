//! Cross-provider entity resolution
//!
//! Records are grouped by a [`MatchKey`] taken from the first rule that
//! applies:
//!
//! 1. first non-empty ISBN
//! 2. Wikidata ID
//! 3. VIAF ID
//! 4. normalized title plus sorted, normalized authors
//!
//! Groups come out in first-seen order. Matching is exact on the key;
//! there is no fuzzy comparison.

use std::collections::HashMap;
use std::fmt;

use crate::types::{MergedResult, SearchResult};

/// The derived key two records must share to be merged
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MatchKey {
    Isbn(String),
    Wikidata(String),
    Viaf(String),
    TitleAuthors { title: String, authors: String },
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchKey::Isbn(isbn) => write!(f, "isbn:{}", isbn),
            MatchKey::Wikidata(id) => write!(f, "wikidata:{}", id),
            MatchKey::Viaf(id) => write!(f, "viaf:{}", id),
            MatchKey::TitleAuthors { title, authors } => {
                write!(f, "title:{}|authors:{}", title, authors)
            }
        }
    }
}

/// Lower-case and trim a title
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Lower-case and trim each author, sort, join with `,`
pub fn normalize_authors(authors: Option<&[String]>) -> String {
    let mut names: Vec<String> = authors
        .unwrap_or_default()
        .iter()
        .map(|a| a.trim().to_lowercase())
        .collect();
    names.sort();
    names.join(",")
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Compute the match key for a record
pub fn match_key(result: &SearchResult) -> MatchKey {
    if let Some(ids) = &result.identifiers {
        if let Some(isbn) = ids.isbn.iter().map(|i| i.trim()).find(|i| !i.is_empty()) {
            return MatchKey::Isbn(isbn.to_string());
        }
        if let Some(id) = present(&ids.wikidata) {
            return MatchKey::Wikidata(id.to_string());
        }
        if let Some(id) = present(&ids.viaf) {
            return MatchKey::Viaf(id.to_string());
        }
    }

    MatchKey::TitleAuthors {
        title: normalize_title(&result.title),
        authors: normalize_authors(result.authors.as_deref()),
    }
}

/// Incremental merger over a stream of records
///
/// An insertion-ordered map: `index` points into `groups`.
#[derive(Debug, Default)]
pub struct Merger {
    index: HashMap<MatchKey, usize>,
    groups: Vec<MergedResult>,
}

impl Merger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one record, either starting a group or folding into an existing one
    pub fn push(&mut self, result: SearchResult) {
        let key = match_key(&result);
        match self.index.get(&key) {
            Some(&slot) => {
                tracing::trace!(key = %key, source = %result.source, "Merging into existing group");
                self.groups[slot].absorb(result);
            }
            None => {
                self.index.insert(key, self.groups.len());
                self.groups.push(MergedResult::from_first(result));
            }
        }
    }

    /// Number of groups so far
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Groups in first-seen order
    pub fn finish(self) -> Vec<MergedResult> {
        self.groups
    }
}

/// Resolve a batch of records into merged entities
pub fn resolve<I>(records: I) -> Vec<MergedResult>
where
    I: IntoIterator<Item = SearchResult>,
{
    let mut merger = Merger::new();
    for record in records {
        merger.push(record);
    }
    merger.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Identifiers;

    fn record(source: &str, title: &str) -> SearchResult {
        SearchResult::new(format!("{}-id", source), title, format!("https://{}/x", source), source, "book")
    }

    fn with_ids(mut r: SearchResult, ids: Identifiers) -> SearchResult {
        r.identifiers = Some(ids);
        r
    }

    #[test]
    fn test_key_priority_chain() {
        let all = with_ids(
            record("a", "T"),
            Identifiers {
                isbn: vec!["111".to_string(), "222".to_string()],
                wikidata: Some("Q1".to_string()),
                viaf: Some("V1".to_string()),
                oclc: Some("O1".to_string()),
            },
        );
        assert_eq!(match_key(&all).to_string(), "isbn:111");

        let wikidata = with_ids(
            record("a", "T"),
            Identifiers {
                wikidata: Some("Q1".to_string()),
                viaf: Some("V1".to_string()),
                ..Identifiers::default()
            },
        );
        assert_eq!(match_key(&wikidata).to_string(), "wikidata:Q1");

        let viaf = with_ids(
            record("a", "T"),
            Identifiers {
                viaf: Some("V1".to_string()),
                oclc: Some("O1".to_string()),
                ..Identifiers::default()
            },
        );
        assert_eq!(match_key(&viaf).to_string(), "viaf:V1");
    }

    #[test]
    fn test_oclc_alone_falls_back_to_title() {
        let r = with_ids(
            record("a", "  Dune "),
            Identifiers {
                oclc: Some("O1".to_string()),
                ..Identifiers::default()
            },
        );
        assert_eq!(match_key(&r).to_string(), "title:dune|authors:");
    }

    #[test]
    fn test_title_key_normalizes_authors() {
        let mut r = record("a", "The Hobbit");
        r.authors = Some(vec![" Tolkien, J.R.R.".to_string(), "Anderson".to_string()]);
        assert_eq!(
            match_key(&r).to_string(),
            "title:the hobbit|authors:anderson,tolkien, j.r.r."
        );
    }

    #[test]
    fn test_empty_wikidata_is_ignored() {
        let r = with_ids(
            record("a", "X"),
            Identifiers {
                wikidata: Some(String::new()),
                viaf: Some("V9".to_string()),
                ..Identifiers::default()
            },
        );
        assert_eq!(match_key(&r), MatchKey::Viaf("V9".to_string()));
    }

    #[test]
    fn test_blank_isbn_is_ignored() {
        let blank = with_ids(
            record("a", "Dune"),
            Identifiers {
                isbn: vec![String::new(), " ".to_string()],
                ..Identifiers::default()
            },
        );
        assert_eq!(match_key(&blank).to_string(), "title:dune|authors:");

        let later = with_ids(
            record("a", "Dune"),
            Identifiers {
                isbn: vec![String::new(), "9780441013593".to_string()],
                ..Identifiers::default()
            },
        );
        assert_eq!(match_key(&later), MatchKey::Isbn("9780441013593".to_string()));
    }

    #[test]
    fn test_blank_isbns_do_not_collapse_unrelated_records() {
        let blank = || Identifiers {
            isbn: vec![String::new()],
            ..Identifiers::default()
        };
        let merged = resolve(vec![
            with_ids(record("a", "Dune"), blank()),
            with_ids(record("b", "Emma"), blank()),
        ]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_resolve_keeps_first_seen_order() {
        let merged = resolve(vec![
            record("a", "First"),
            record("b", "Second"),
            record("c", "first"),
        ]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].result.title, "First");
        assert_eq!(merged[0].alternate_source_urls.len(), 2);
        assert_eq!(merged[1].result.title, "Second");
    }

    #[test]
    fn test_resolve_empty() {
        assert!(resolve(Vec::new()).is_empty());
    }

    #[test]
    fn test_merger_counts_groups() {
        let mut merger = Merger::new();
        assert!(merger.is_empty());
        merger.push(record("a", "One"));
        merger.push(record("b", "one"));
        merger.push(record("c", "Two"));
        assert_eq!(merger.len(), 2);
    }
}
