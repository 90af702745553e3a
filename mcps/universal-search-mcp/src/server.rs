//! MCP Server implementation for universal search
//!
//! Exposes the cross-provider search and the ISBN lookup as MCP tools.

use anyhow::Result;
use mcp_common::{internal_error, invalid_params, json_success, IntoMcpError, ResultExt};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::backends::google_books::GoogleBooksBackend;
use crate::backends::http_client;
use crate::backends::wikidata::WikidataClient;
use crate::book_details::BookDetailsService;
use crate::config::Config;
use crate::error::{LookupError, SearchError};
use crate::service::SearchService;
use crate::types::SearchResponse;

/// The main Universal Search MCP Server
#[derive(Clone)]
pub struct UniversalSearchMcpServer {
    search: SearchService,
    books: BookDetailsService,
    config: Config,
    tool_router: ToolRouter<Self>,
}

// ============================================================================
// Parameter Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchParams {
    #[schemars(description = "Free-text query sent to every provider")]
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LookupIsbnParams {
    #[schemars(description = "ISBN-10 or ISBN-13 of the book")]
    pub isbn: String,
}

// ============================================================================
// Error Mapping
// ============================================================================

impl IntoMcpError for SearchError {
    fn into_mcp_error(self) -> McpError {
        invalid_params(self.to_string())
    }
}

impl IntoMcpError for LookupError {
    fn into_mcp_error(self) -> McpError {
        match &self {
            LookupError::EmptyIsbn => invalid_params(self.to_string()),
            LookupError::Provider { .. } => internal_error(self.to_string()),
        }
    }
}

// ============================================================================
// Tool Router Implementation
// ============================================================================

#[tool_router]
impl UniversalSearchMcpServer {
    pub fn new(config: Config) -> Result<Self> {
        let search = SearchService::from_config(&config)?;

        let client = http_client(&config.search)?;
        let books = BookDetailsService::from_backends(
            GoogleBooksBackend::new(
                client.clone(),
                config.google_books.clone(),
                config.search.max_results,
            ),
            WikidataClient::new(client, config.wikidata.clone()),
        );

        Ok(Self {
            search,
            books,
            config,
            tool_router: Self::tool_router(),
        })
    }

    #[tool(
        description = "Search books (Google Books), videos (YouTube) and encyclopedia articles \
                       (Wikipedia) at once. Results describing the same work are merged; \
                       alternateSourceUrls lists every provider's link."
    )]
    async fn search(
        &self,
        Parameters(params): Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        let results = self.search.search(&params.query).await.to_mcp_err()?;

        json_success(&SearchResponse {
            query: params.query,
            total: results.len(),
            results,
        })
    }

    #[tool(description = "Look up book details by ISBN, combining Google Books and Wikidata.")]
    async fn lookup_isbn(
        &self,
        Parameters(params): Parameters<LookupIsbnParams>,
    ) -> Result<CallToolResult, McpError> {
        let book = self.books.fetch(&params.isbn).await.to_mcp_err()?;
        json_success(&book)
    }

    #[tool(description = "List search providers and whether each is configured.")]
    async fn get_config(&self) -> Result<CallToolResult, McpError> {
        #[derive(Serialize)]
        struct ProviderStatus {
            name: String,
            available: bool,
        }

        #[derive(Serialize)]
        struct ConfigStatus {
            providers: Vec<ProviderStatus>,
            timeout_seconds: u64,
            max_results: usize,
        }

        let status = ConfigStatus {
            providers: self
                .search
                .providers()
                .iter()
                .map(|p| ProviderStatus {
                    name: p.name().to_string(),
                    available: p.is_available(),
                })
                .collect(),
            timeout_seconds: self.config.search.timeout_seconds,
            max_results: self.config.search.max_results,
        };

        json_success(&status)
    }
}

// ============================================================================
// Server Handler Implementation
// ============================================================================

#[tool_handler]
impl rmcp::ServerHandler for UniversalSearchMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Universal Search MCP Server - searches Google Books, YouTube and Wikipedia \
                 concurrently and merges results that describe the same entity (by ISBN, \
                 Wikidata ID, VIAF ID, or exact title and authors). Providers without an \
                 API key are skipped."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
