use tracing::warn;

use super::types::{GenerateContentResponse, GroundedResult, Source};

/// Concatenated text parts of the first candidate, or `None` when empty.
pub fn extract_text(response: &GenerateContentResponse) -> Option<String> {
    let content = response
        .candidates
        .as_ref()
        .and_then(|c| c.first())
        .and_then(|c| c.content.as_ref())?;

    let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

pub fn extract_grounded_result(response: &GenerateContentResponse) -> GroundedResult {
    let answer = extract_text(response);
    if answer.is_none() {
        warn!("Gemini returned empty answer (safety filter or empty response)");
    }

    let sources = response
        .candidates
        .as_ref()
        .and_then(|c| c.first())
        .and_then(|c| c.grounding_metadata.as_ref())
        .and_then(|m| m.grounding_chunks.as_ref())
        .map(|chunks| {
            chunks
                .iter()
                .filter_map(|chunk| {
                    let web = chunk.web.as_ref()?;
                    let url = web.uri.as_ref().filter(|u| !u.is_empty())?.clone();
                    Some(Source {
                        url,
                        title: web.title.clone().unwrap_or_default(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    GroundedResult { answer, sources }
}
