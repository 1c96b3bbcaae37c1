use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::{Judgment, LlmError};

const MIN_QUERY_CHARS: usize = 10;

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)""#).expect("valid quoted-query regex"));
static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\d+[.)]|[-*•])\s+(.+)$").expect("valid list-item regex")
});
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```[a-zA-Z]*\s*(.*?)\s*```\s*$").expect("valid code-fence regex")
});

/// Pulls candidate queries out of a free-text reply: a quoted string on a line
/// wins, otherwise a numbered or bulleted list item. Short fragments are ignored.
pub fn parse_query_lines(text: &str, max: usize) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let candidate = if let Some(caps) = QUOTED.captures(line) {
                caps[1].to_string()
            } else {
                LIST_ITEM.captures(line)?[1].to_string()
            };
            let cleaned = candidate
                .trim_matches(|c: char| c == '*' || c == '`' || c == '\'' || c.is_whitespace())
                .to_string();
            (cleaned.chars().count() >= MIN_QUERY_CHARS).then_some(cleaned)
        })
        .take(max)
        .collect()
}

#[derive(Debug, Deserialize)]
struct RawJudgment {
    document_type: String,
    coverage: String,
    action: String,
    relevance: f64,
    #[serde(default)]
    year: Option<serde_json::Value>,
    #[serde(default)]
    comment: Option<String>,
}

/// Parses and validates the JSON classification reply.
pub fn parse_judgment(text: &str) -> Result<Judgment, LlmError> {
    let body = CODE_FENCE
        .captures(text)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| text.trim().to_string());

    let raw: RawJudgment =
        serde_json::from_str(&body).map_err(|e| LlmError::Malformed(e.to_string()))?;

    if !raw.relevance.is_finite() || !(0.0..=1.0).contains(&raw.relevance) {
        return Err(LlmError::Malformed(format!(
            "relevance {} outside 0..=1",
            raw.relevance
        )));
    }

    Ok(Judgment {
        document_type: raw.document_type.parse().map_err(LlmError::Malformed)?,
        coverage: raw.coverage.parse().map_err(LlmError::Malformed)?,
        action: raw.action.parse().map_err(LlmError::Malformed)?,
        relevance: raw.relevance,
        year: raw.year.as_ref().and_then(parse_year),
        comment: raw.comment.unwrap_or_default().trim().to_string(),
    })
}

fn parse_year(value: &serde_json::Value) -> Option<u16> {
    let year = match value {
        serde_json::Value::Number(n) => n.as_u64()?,
        serde_json::Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (1900..=2100).contains(&year).then_some(year as u16)
}
