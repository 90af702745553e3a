//! Universal Search MCP Library
//!
//! Searches several providers (Google Books, YouTube, Wikipedia) concurrently
//! and merges records that describe the same work, keeping every provider's
//! URL in `alternateSourceUrls`.
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use universal_search_mcp::{Config, SearchService};
//!
//! let service = SearchService::from_config(&Config::load()?)?;
//! let merged = service.search("pride and prejudice").await?;
//! ```
//!
//! # Configuration
//! Set `GOOGLE_API_KEY` / `YOUTUBE_API_KEY`, or configure in `~/.binks/universal-search.toml`

pub mod backends;
pub mod book_details;
pub mod config;
pub mod error;
pub mod merge;
pub mod server;
pub mod service;
pub mod types;

// Re-export main server type
pub use server::UniversalSearchMcpServer;

// Re-export the core API for direct use
pub use backends::{FailOpen, SearchBackend, SearchProvider};
pub use book_details::{merge_book_data, BookDetailsService, IsbnSource};
pub use config::Config;
pub use error::{BackendError, LookupError, SearchError};
pub use merge::{match_key, resolve, MatchKey, Merger};
pub use server::{LookupIsbnParams, SearchParams};
pub use service::SearchService;
pub use types::{BookInfo, Identifiers, ImageLinks, MergedResult, SearchResult};
