use tracing::debug;

use super::{SearchError, SearchResult, SearchSurface};
use crate::gemini::GeminiClient;
use crate::gemini::types::Source;

const SNIPPET_CHARS: usize = 300;
const REDIRECT_PATH: &str = "/grounding-api-redirect/";

/// Grounding chunks become hits; the grounded answer stands in for the snippet,
/// since Gemini returns no per-source excerpt.
impl SearchSurface for GeminiClient {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let grounded = self.search_grounded(query).await?;
        let snippet = grounded
            .answer
            .as_deref()
            .map(truncate_snippet)
            .unwrap_or_default();

        let mut results = Vec::new();
        for source in grounded.sources.into_iter().take(max_results) {
            let url = self.source_url(&source).await;
            results.push(SearchResult {
                title: source.title,
                url,
                snippet: snippet.clone(),
            });
        }

        debug!(query, count = results.len(), "grounded search complete");
        Ok(results)
    }
}

impl GeminiClient {
    /// Grounding chunks carry opaque redirect tokens; dedup and URL heuristics
    /// need the real page. Falls back to the chunk title, which holds the host.
    async fn source_url(&self, source: &Source) -> String {
        if !is_grounding_redirect(&source.url) {
            return source.url.clone();
        }
        match self.resolve_redirect(&source.url).await {
            Ok(resolved) if !is_grounding_redirect(&resolved) => resolved,
            Ok(_) => title_as_url(&source.title).unwrap_or_else(|| source.url.clone()),
            Err(e) => {
                debug!(url = %source.url, error = %e, "grounding redirect not resolved");
                title_as_url(&source.title).unwrap_or_else(|| source.url.clone())
            }
        }
    }
}

fn is_grounding_redirect(url: &str) -> bool {
    url::Url::parse(url).is_ok_and(|u| u.path().starts_with(REDIRECT_PATH))
}

/// `"nasscom.in"` becomes `https://nasscom.in/`; prose titles yield `None`.
fn title_as_url(title: &str) -> Option<String> {
    let host = title.trim();
    if host.is_empty() || host.contains(char::is_whitespace) || !host.contains('.') {
        return None;
    }
    let url = url::Url::parse(&format!("https://{host}")).ok()?;
    (url.host_str()? == host.to_ascii_lowercase()).then(|| url.to_string())
}

fn truncate_snippet(answer: &str) -> String {
    let flat = answer.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(SNIPPET_CHARS) {
        Some((end, _)) => format!("{}...", &flat[..end]),
        None => flat,
    }
}
