//! Canonical URL form used for run-scoped deduplication.

/// Query parameters that identify a distinct document rather than tracking noise.
const LOAD_BEARING_PARAMS: &[&str] = &["id", "q", "query", "search", "page", "p", "doc", "file"];

/// Lowercased scheme and host (no `www.`, no default port), path without trailing
/// slash, load-bearing query pairs sorted, fragment dropped. Unparseable input
/// falls back to a trimmed, lowercased copy so it still dedupes against itself.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(parsed) = url::Url::parse(trimmed) else {
        return trimmed.trim_end_matches('/').to_ascii_lowercase();
    };

    let host = parsed
        .host_str()
        .map(|h| h.trim_start_matches("www.").to_ascii_lowercase())
        .unwrap_or_default();

    let mut out = format!("{}://{host}", parsed.scheme());
    if let Some(port) = parsed.port() {
        out.push_str(&format!(":{port}"));
    }
    out.push_str(parsed.path().trim_end_matches('/'));

    let mut kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| LOAD_BEARING_PARAMS.contains(&k.to_ascii_lowercase().as_str()))
        .map(|(k, v)| (k.to_ascii_lowercase(), v.into_owned()))
        .collect();
    if !kept.is_empty() {
        kept.sort();
        let query: Vec<String> = kept.iter().map(|(k, v)| format!("{k}={v}")).collect();
        out.push('?');
        out.push_str(&query.join("&"));
    }

    out
}
