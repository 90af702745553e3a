//! Search backend implementations
//!
//! Two traits split the provider contract:
//!
//! - [`SearchBackend`] is the fallible, provider-specific side. It builds the
//!   request, talks HTTP and maps the native response into [`SearchResult`]s.
//! - [`SearchProvider`] is what the search service fans out to. It never
//!   fails; [`FailOpen`] adapts any backend into one by applying a timeout
//!   and turning every error into an empty list.

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::LazyLock;
use std::time::Duration;

use crate::config::SearchConfig;
use crate::error::{BackendError, BackendResult};
use crate::types::SearchResult;

pub mod google_books;
pub mod wikidata;
pub mod wikipedia;
pub mod youtube;

/// Trait for provider backends
///
/// Implementations report failures as errors; they are not expected to be
/// called directly by the search service.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Provider tag, used as `SearchResult::source`
    fn name(&self) -> &str;

    /// Check if this backend is configured (e.g. has its API key)
    fn is_available(&self) -> bool;

    /// Search the provider and normalize the results
    async fn search(&self, query: &str) -> BackendResult<Vec<SearchResult>>;
}

/// A provider as seen by the search service: infallible, possibly empty
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the provider can produce results at all
    fn is_available(&self) -> bool {
        true
    }

    /// Search the provider. Never fails; problems yield an empty list.
    async fn search(&self, query: &str) -> Vec<SearchResult>;
}

/// Fail-open boundary around a [`SearchBackend`]
///
/// Unavailable backends are skipped without any request. Errors and
/// timeouts are logged and converted into an empty result list.
pub struct FailOpen<B> {
    backend: B,
    timeout: Duration,
}

impl<B: SearchBackend> FailOpen<B> {
    pub fn new(backend: B, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[async_trait]
impl<B: SearchBackend> SearchProvider for FailOpen<B> {
    fn name(&self) -> &str {
        self.backend.name()
    }

    fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    async fn search(&self, query: &str) -> Vec<SearchResult> {
        if !self.backend.is_available() {
            tracing::debug!(
                provider = self.backend.name(),
                "Skipping provider: {}",
                BackendError::MissingCredential
            );
            return Vec::new();
        }

        let outcome = match tokio::time::timeout(self.timeout, self.backend.search(query)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(BackendError::Timeout(self.timeout)),
        };

        match outcome {
            Ok(results) => {
                tracing::debug!(
                    provider = self.backend.name(),
                    count = results.len(),
                    "Provider returned results"
                );
                results
            }
            Err(e) => {
                tracing::warn!(provider = self.backend.name(), error = %e, "Provider search failed");
                Vec::new()
            }
        }
    }
}

/// Build the HTTP client shared by all backends
pub fn http_client(config: &SearchConfig) -> BackendResult<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.timeout())
        .build()?;
    Ok(client)
}

/// Send a request and decode a JSON body, mapping non-success statuses
pub(crate) async fn fetch_json<T: DeserializeOwned>(request: RequestBuilder) -> BackendResult<T> {
    let response = request.send().await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        return Err(BackendError::Status {
            status,
            body: text.chars().take(200).collect(),
        });
    }

    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?[^>]+(>|$)").unwrap());

/// Remove HTML tags, e.g. the `<span class="searchmatch">` markup in snippets
pub(crate) fn strip_html(text: &str) -> String {
    TAG_RE.replace_all(text, "").into_owned()
}

static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]+);").unwrap());

fn decode_entity(entity: &str) -> Option<char> {
    let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok()?
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse().ok()?
    } else {
        return match entity {
            "quot" => Some('"'),
            "apos" => Some('\''),
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "nbsp" => Some(' '),
            _ => None,
        };
    };
    char::from_u32(code)
}

/// Decode HTML entities in plain-text fields: numeric references
/// (`&#39;`, `&#x27;`) and the common named ones. Unknown entities are
/// left as they are. Single pass, so `&amp;lt;` becomes `&lt;`.
pub(crate) fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    ENTITY_RE
        .replace_all(text, |caps: &regex::Captures| match decode_entity(&caps[1]) {
            Some(c) => c.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}


/// Minimal HTTP/1.1 server answering with canned responses
#[cfg(test)]
pub(crate) mod test_server {
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// How to answer one request
    pub(crate) enum Reply {
        Json { status: u16, body: String },
        /// Keep the connection open and never answer
        Hang,
    }

    impl Reply {
        pub(crate) fn json(status: u16, body: impl Into<String>) -> Self {
            Reply::Json {
                status,
                body: body.into(),
            }
        }
    }

    /// Serve on an ephemeral local port; returns `http://127.0.0.1:<port>`.
    /// The handler sees the request target (path and query string).
    pub(crate) async fn serve<F>(handler: F) -> String
    where
        F: Fn(&str) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handler = Arc::new(handler);

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let handler = handler.clone();
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match stream.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }

                    let head = String::from_utf8_lossy(&request);
                    let target = head.split_whitespace().nth(1).unwrap_or("/").to_string();

                    match handler(&target) {
                        Reply::Json { status, body } => {
                            let response = format!(
                                "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\n\
                                 Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                                status,
                                body.len(),
                                body
                            );
                            let _ = stream.write_all(response.as_bytes()).await;
                            let _ = stream.shutdown().await;
                        }
                        Reply::Hang => {
                            std::future::pending::<()>().await;
                        }
                    }
                });
            }
        });

        format!("http://{}", addr)
    }
}
