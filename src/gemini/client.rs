use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use super::grounding::{extract_grounded_result, extract_text};
use super::types::{ApiError, GenerateContentRequest, GenerateContentResponse, GroundedResult};
use crate::config::Config;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("API rate limit exceeded. Please retry later.")]
    RateLimited,

    #[error("API quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

#[derive(Clone)]
struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Thin client for the Gemini `generateContent` endpoint.
///
/// Makes exactly one HTTP request per call. Retry policy belongs to the caller:
/// the search executor retries grounded searches, language-model enrichment
/// never retries and falls back instead.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiClient {
    /// Returns `None` when no API key is configured.
    pub fn from_config(http: Client, config: &Config) -> Option<Self> {
        let key = config.gemini_key.as_ref()?;
        let model = config
            .gemini_model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Some(Self {
            http,
            api_key: ApiKey(key.expose().to_string()),
            model,
            base_url: API_BASE.to_string(),
            timeout: config.request_timeout,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey("test-key".to_string()),
            model: DEFAULT_MODEL.to_string(),
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Single-shot text generation. `Ok(None)` means the model answered with no text.
    pub async fn generate_text(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<Option<String>, GeminiError> {
        let response = self.generate(request).await?;
        Ok(extract_text(&response))
    }

    /// Google Search grounded generation; sources come from grounding metadata.
    pub async fn search_grounded(&self, query: &str) -> Result<GroundedResult, GeminiError> {
        let request = GenerateContentRequest::prompt(query).with_google_search();
        let response = self.generate(&request).await?;
        Ok(extract_grounded_result(&response))
    }

    /// Follows a grounding redirect to the page it stands for. No API key is sent.
    pub async fn resolve_redirect(&self, uri: &str) -> Result<String, GeminiError> {
        let response = self
            .http
            .head(uri)
            .header("User-Agent", crate::USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await?;
        Ok(response.url().to_string())
    }

    async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);

        debug_assert!(
            url.starts_with("https://") || cfg!(test),
            "API key must only be sent over HTTPS"
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key.0)
            .header("User-Agent", crate::USER_AGENT)
            .json(request)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("Gemini API rate limited");
            return Err(GeminiError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if let Ok(body) = serde_json::from_str::<GenerateContentResponse>(&text)
                && let Some(err) = &body.error
            {
                let classified = classify_api_error(err);
                warn!(error = %classified, "Gemini API error");
                return Err(classified);
            }
            let end = text.floor_char_boundary(200);
            warn!(status = %status, "Gemini API error (no structured body)");
            return Err(GeminiError::Api {
                code: status.as_u16(),
                message: format!("HTTP {status}: {}", &text[..end]),
            });
        }

        let body: GenerateContentResponse = response.json().await?;
        debug!(model = %self.model, "gemini request complete");

        if let Some(err) = &body.error {
            let classified = classify_api_error(err);
            warn!(error = %classified, "Gemini API error in 200 response");
            return Err(classified);
        }

        Ok(body)
    }
}

fn classify_api_error(err: &ApiError) -> GeminiError {
    let message = err
        .message
        .clone()
        .unwrap_or_else(|| "Unknown error".to_string());

    match err.code {
        Some(429) => GeminiError::RateLimited,
        Some(403) => GeminiError::QuotaExhausted(message),
        Some(code) => GeminiError::Api { code, message },
        None => GeminiError::Api {
            code: 0,
            message: format!("Unknown error (no status code): {message}"),
        },
    }
}
