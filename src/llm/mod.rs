//! Language-model capability used for query enrichment and hit classification.
//!
//! All free-text parsing happens here: callers only ever see validated query
//! strings or a typed [`Judgment`].

pub mod parse;
pub mod prompt;

use crate::catalog::Domain;
use crate::classify::{Action, Coverage, DocumentType};
use crate::gemini::types::GenerateContentRequest;
use crate::gemini::{GeminiClient, GeminiError};
use crate::search::RawHit;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error(transparent)]
    Gemini(#[from] GeminiError),

    #[error("language model call timed out after {0}s")]
    Timeout(u64),

    #[error("language model returned no content")]
    Empty,

    #[error("malformed language model output: {0}")]
    Malformed(String),
}

impl LlmError {
    /// True when the model responded but its content was unusable.
    pub fn is_malformed(&self) -> bool {
        matches!(self, LlmError::Empty | LlmError::Malformed(_))
    }
}

/// A model's structured verdict on one search hit, already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct Judgment {
    pub document_type: DocumentType,
    pub coverage: Coverage,
    pub action: Action,
    /// Always within `0.0..=1.0`.
    pub relevance: f64,
    pub year: Option<u16>,
    pub comment: String,
}

/// One method per use; implemented by `GeminiClient`, scripted mocks in tests.
pub trait LanguageModel {
    /// Up to `count` non-empty candidate queries, in model order.
    async fn generate_queries(
        &self,
        domain: &Domain,
        country: &str,
        count: usize,
    ) -> Result<Vec<String>, LlmError>;

    async fn classify_hit(
        &self,
        hit: &RawHit,
        domain: &Domain,
        country: &str,
    ) -> Result<Judgment, LlmError>;
}

impl LanguageModel for GeminiClient {
    async fn generate_queries(
        &self,
        domain: &Domain,
        country: &str,
        count: usize,
    ) -> Result<Vec<String>, LlmError> {
        let request = GenerateContentRequest::prompt(&prompt::query_prompt(domain, country, count));
        let text = self.generate_text(&request).await?.ok_or(LlmError::Empty)?;
        let queries = parse::parse_query_lines(&text, count);
        if queries.is_empty() {
            return Err(LlmError::Malformed("no query lines found in response".into()));
        }
        Ok(queries)
    }

    async fn classify_hit(
        &self,
        hit: &RawHit,
        domain: &Domain,
        country: &str,
    ) -> Result<Judgment, LlmError> {
        let request =
            GenerateContentRequest::prompt(&prompt::classify_prompt(hit, domain, country))
                .expecting_json();
        let text = self.generate_text(&request).await?.ok_or(LlmError::Empty)?;
        parse::parse_judgment(&text)
    }
}
