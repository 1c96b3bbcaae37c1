use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{SearchError, SearchResult, SearchSurface};
use crate::config::Config;

const API_BASE: &str = "https://serpapi.com";
const NO_RESULTS_MARKER: &str = "hasn't returned any results";

#[derive(Debug, Deserialize)]
struct SerpResponse {
    organic_results: Option<Vec<OrganicResult>>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
}

#[derive(Clone)]
struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Google organic results through SerpAPI's `search.json` endpoint.
#[derive(Debug, Clone)]
pub struct SerpApiClient {
    http: Client,
    api_key: ApiKey,
    location: String,
    base_url: String,
    timeout: Duration,
}

impl SerpApiClient {
    /// Returns `None` when `SERPAPI_KEY` is not configured.
    pub fn from_config(http: Client, config: &Config) -> Option<Self> {
        let key = config.serpapi_key.as_ref()?;
        Some(Self {
            http,
            api_key: ApiKey(key.expose().to_string()),
            location: config.country.clone(),
            base_url: API_BASE.to_string(),
            timeout: config.request_timeout,
        })
    }

    #[cfg(test)]
    fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey("test-key".to_string()),
            location: "India".to_string(),
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    fn endpoint(&self, query: &str, max_results: usize) -> Result<url::Url, SearchError> {
        let num = max_results.to_string();
        url::Url::parse_with_params(
            &format!("{}/search.json", self.base_url),
            &[
                ("engine", "google"),
                ("q", query),
                ("location", self.location.as_str()),
                ("num", num.as_str()),
                ("api_key", self.api_key.0.as_str()),
            ],
        )
        .map_err(|e| SearchError::Api(format!("invalid SerpAPI endpoint: {e}")))
    }
}

impl SearchSurface for SerpApiClient {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let url = self.endpoint(query, max_results)?;
        let response = self
            .http
            .get(url)
            .header("User-Agent", crate::USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let body: SerpResponse = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(_) if !status.is_success() => return Err(SearchError::Status(status.as_u16())),
            Err(e) => return Err(SearchError::Garbled(e.to_string())),
        };

        if let Some(error) = body.error {
            if error.contains(NO_RESULTS_MARKER) {
                debug!(query, "serpapi reported no results");
                return Ok(Vec::new());
            }
            warn!(status = %status, error = %error, "SerpAPI error");
            return Err(SearchError::Api(error));
        }
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let results: Vec<SearchResult> = body
            .organic_results
            .ok_or_else(|| SearchError::Garbled("missing organic_results".into()))?
            .into_iter()
            .filter_map(|r| {
                let url = r.link.filter(|l| !l.trim().is_empty())?;
                Some(SearchResult {
                    title: r.title.unwrap_or_default(),
                    url,
                    snippet: r.snippet.unwrap_or_default(),
                })
            })
            .take(max_results)
            .collect();

        debug!(query, count = results.len(), "serpapi search complete");
        Ok(results)
    }
}
