//! External search surfaces and the rate-limited, deduplicating executor that drives them.

pub mod executor;
mod grounded;
pub mod normalize;
pub mod serpapi;
mod throttle;

use crate::gemini::{GeminiClient, GeminiError};
use serpapi::SerpApiClient;

/// One (title, URL, snippet) tuple as returned by a search surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// A search result tagged with the query that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub query: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search failed: status {0}")]
    Status(u16),

    #[error("search API error: {0}")]
    Api(String),

    #[error("garbled search response: {0}")]
    Garbled(String),

    #[error("search returned no results")]
    Empty,

    #[error("search timed out after {0}s")]
    Timeout(u64),

    #[error("grounded search failed: {0}")]
    Gemini(#[from] GeminiError),
}

/// Abstraction over a web search backend.
/// Implemented by `SerpApiClient` and `GeminiClient` in production; scripted mocks in tests.
pub trait SearchSurface {
    async fn search(&self, query: &str, max_results: usize)
    -> Result<Vec<SearchResult>, SearchError>;
}

/// The search backend selected at startup.
pub enum Engine {
    SerpApi(SerpApiClient),
    Grounded(GeminiClient),
}

impl Engine {
    pub fn name(&self) -> &'static str {
        match self {
            Engine::SerpApi(_) => "serpapi",
            Engine::Grounded(_) => "gemini-grounding",
        }
    }
}

impl SearchSurface for Engine {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        match self {
            Engine::SerpApi(client) => client.search(query, max_results).await,
            Engine::Grounded(client) => client.search(query, max_results).await,
        }
    }
}
