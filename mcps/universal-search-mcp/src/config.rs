//! Configuration loading for universal-search-mcp
//!
//! Configuration is loaded from:
//! 1. Environment variable UNIVERSAL_SEARCH_CONFIG_PATH
//! 2. ~/.binks/universal-search.toml
//! 3. Default values
//!
//! `GOOGLE_API_KEY` and `YOUTUBE_API_KEY` override the file (highest priority).

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Settings shared by every provider
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub google_books: GoogleBooksConfig,
    #[serde(default)]
    pub youtube: YouTubeConfig,
    #[serde(default)]
    pub wikipedia: WikipediaConfig,
    #[serde(default)]
    pub wikidata: WikidataConfig,
}

/// General search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Per-provider timeout; a provider slower than this contributes nothing
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Result cap requested from each provider
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// User-Agent header sent to every provider
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Google Books configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleBooksConfig {
    /// API key; without one the provider is skipped
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_google_books_url")]
    pub base_url: String,
}

/// YouTube Data API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YouTubeConfig {
    /// API key; without one the provider is skipped
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_youtube_url")]
    pub base_url: String,
}

/// Wikipedia configuration (no key needed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikipediaConfig {
    /// MediaWiki action API endpoint
    #[serde(default = "default_wikipedia_api")]
    pub api_url: String,
    /// Prefix for article links
    #[serde(default = "default_wikipedia_article_base")]
    pub article_base_url: String,
    /// Resolve Wikidata IDs with a follow-up pageprops request
    #[serde(default = "default_true")]
    pub resolve_wikidata: bool,
}

/// Wikidata SPARQL configuration (used by the ISBN lookup)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikidataConfig {
    #[serde(default = "default_wikidata_sparql")]
    pub sparql_url: String,
}

// Default value functions
fn default_timeout() -> u64 {
    10
}

fn default_max_results() -> usize {
    10
}

fn default_user_agent() -> String {
    "universal-search-mcp/0.1".to_string()
}

fn default_google_books_url() -> String {
    "https://www.googleapis.com/books/v1".to_string()
}

fn default_youtube_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_wikipedia_api() -> String {
    "https://en.wikipedia.org/w/api.php".to_string()
}

fn default_wikipedia_article_base() -> String {
    "https://en.wikipedia.org/wiki/".to_string()
}

fn default_wikidata_sparql() -> String {
    "https://query.wikidata.org/sparql".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            max_results: default_max_results(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for GoogleBooksConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_google_books_url(),
        }
    }
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_youtube_url(),
        }
    }
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            api_url: default_wikipedia_api(),
            article_base_url: default_wikipedia_article_base(),
            resolve_wikidata: default_true(),
        }
    }
}

impl Default for WikidataConfig {
    fn default() -> Self {
        Self {
            sparql_url: default_wikidata_sparql(),
        }
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Treat missing, empty and whitespace-only keys the same way
pub fn non_empty_key(key: Option<&str>) -> Option<&str> {
    key.map(str::trim).filter(|k| !k.is_empty())
}

impl Config {
    /// Load configuration from file or use defaults, then apply env overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_path() {
            Some(path) => Self::load_from(&path)?,
            None => {
                tracing::info!("No config path specified, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load configuration from a specific TOML file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        tracing::info!("Loading config from: {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply API keys from the environment (or any lookup with the same shape)
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GOOGLE_API_KEY") {
            self.google_books.api_key = Some(key);
        }
        if let Some(key) = lookup("YOUTUBE_API_KEY") {
            self.youtube.api_key = Some(key);
        }
    }

    /// Find the configuration file path
    fn find_config_path() -> Option<PathBuf> {
        // 1. Check environment variable
        if let Ok(path) = std::env::var("UNIVERSAL_SEARCH_CONFIG_PATH") {
            return Some(PathBuf::from(path));
        }

        // 2. Check ~/.binks/universal-search.toml
        if let Ok(home) = std::env::var("HOME") {
            let path = PathBuf::from(home)
                .join(".binks")
                .join("universal-search.toml");
            return Some(path);
        }

        None
    }
}
