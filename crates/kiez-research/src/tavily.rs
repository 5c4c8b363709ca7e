//! Tavily search API client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{Result, SearchError};

/// Tavily search endpoint.
pub const TAVILY_URL: &str = "https://api.tavily.com/search";

/// How thorough a search pass should be.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    /// Fast, shallow pass.
    Basic,
    /// Slower pass with better snippet extraction.
    #[default]
    Advanced,
}

/// One search query.
#[derive(Clone, Debug)]
pub struct SearchRequest {
    /// Query string.
    pub query: String,
    /// Maximum result rows.
    pub max_results: usize,
    /// Search depth.
    pub depth: SearchDepth,
    /// Restrict results to these domains (empty = no restriction).
    pub include_domains: Vec<String>,
}

impl SearchRequest {
    /// An advanced-depth request with no domain restriction.
    #[must_use]
    pub fn new(query: impl Into<String>, max_results: usize) -> Self {
        Self {
            query: query.into(),
            max_results,
            depth: SearchDepth::Advanced,
            include_domains: Vec::new(),
        }
    }
}

/// One search result row.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SearchResult {
    /// Page title.
    #[serde(default)]
    pub title: String,
    /// Page URL.
    #[serde(default)]
    pub url: String,
    /// Extracted snippet.
    #[serde(default)]
    pub content: String,
}

/// Anything that can run a web search.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Run one search query.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>>;
}

#[derive(Serialize)]
struct TavilyBody<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
    search_depth: SearchDepth,
    include_raw_content: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    include_domains: &'a Vec<String>,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

/// Tavily-backed [`SearchClient`].
#[derive(Clone, Debug)]
pub struct TavilyClient {
    http: reqwest::Client,
    api_key: String,
    url: String,
}

impl TavilyClient {
    /// Create a client with an explicit key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_url(api_key, TAVILY_URL)
    }

    /// Create a client against a custom endpoint (tests).
    #[must_use]
    pub fn with_url(api_key: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            url: url.into(),
        }
    }

    /// Create a client from `TAVILY_API_KEY`, `None` if unset.
    ///
    /// A missing key disables search entirely; callers degrade rather
    /// than fail.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        std::env::var("TAVILY_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .map(Self::new)
    }
}

#[async_trait]
impl SearchClient for TavilyClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        let body = TavilyBody {
            api_key: &self.api_key,
            query: &request.query,
            max_results: request.max_results,
            search_depth: request.depth,
            include_raw_content: false,
            include_domains: &request.include_domains,
        };
        let response = self.http.post(&self.url).json(&body).send().await?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        if !(200..300).contains(&status) {
            return Err(SearchError::Api {
                status,
                message: text,
            });
        }
        let parsed: TavilyResponse = serde_json::from_str(&text)?;
        debug!(query = %request.query, results = parsed.results.len(), "search done");
        Ok(parsed.results)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
