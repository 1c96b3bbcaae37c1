//! Deterministic, network-free classification. A pure function of (hit, domain).

use std::sync::LazyLock;

use regex::Regex;

use super::{Action, Coverage, DocumentType};
use crate::catalog::Domain;
use crate::llm::Judgment;
use crate::search::RawHit;

const DATASET_URL_MARKERS: &[&str] = &[".xls", ".xlsx", ".csv", "data.gov"];
const DIRECTORY_MARKERS: &[&str] = &["directory", "listing"];
const ASSOCIATION_MARKERS: &[&str] = &[
    "association",
    "federation",
    "council",
    "chamber",
    "society",
    "confederation",
];
const RESTRICTED_MARKERS: &[&str] = &["login", "register", "subscription", "premium", "paid"];

const DESCRIPTION_TAGS: &[(&str, &str)] = &[
    ("directory", "Company Directory"),
    ("list", "Company List"),
    ("database", "Database"),
    ("association", "Industry Association"),
    ("export", "Export Companies"),
];

static YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(20[12][0-9])\b").expect("valid year regex"));

pub fn heuristic_judgment(hit: &RawHit, domain: &Domain) -> Judgment {
    let url = hit.url.to_lowercase();
    let text = format!("{url} {} {}", hit.title, hit.snippet).to_lowercase();

    let matched = matched_fragments(&hit.snippet, domain);
    let total = domain.fragments.len();
    let relevance = if total == 0 {
        0.0
    } else {
        (matched as f64 / total as f64).min(1.0)
    };

    let document_type = document_type(&url, &text, domain);

    Judgment {
        document_type,
        coverage: coverage(matched),
        action: action(document_type, &text),
        relevance,
        year: year(&hit.title, &hit.snippet),
        comment: describe(&text, matched, total),
    }
}

fn matched_fragments(snippet: &str, domain: &Domain) -> usize {
    let snippet = snippet.to_lowercase();
    domain
        .fragments
        .iter()
        .filter(|f| snippet.contains(&f.to_lowercase()))
        .count()
}

fn coverage(matched: usize) -> Coverage {
    match matched {
        0 => Coverage::Low,
        1 | 2 => Coverage::Medium,
        _ => Coverage::High,
    }
}

fn document_type(url: &str, text: &str, domain: &Domain) -> DocumentType {
    if url.contains("pdf") {
        DocumentType::Report
    } else if DATASET_URL_MARKERS.iter().any(|m| url.contains(m)) || text.contains("dataset") {
        DocumentType::Dataset
    } else if DIRECTORY_MARKERS.iter().any(|m| text.contains(m)) {
        DocumentType::Directory
    } else if ASSOCIATION_MARKERS.iter().any(|m| text.contains(m))
        || is_known_source(url, domain)
    {
        DocumentType::AssociationPage
    } else {
        DocumentType::Unknown
    }
}

fn is_known_source(url: &str, domain: &Domain) -> bool {
    let Some(host) = url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
    else {
        return false;
    };
    domain.sources.iter().any(|source| {
        let source = source.to_lowercase();
        host == source || host.ends_with(&format!(".{source}"))
    })
}

fn action(document_type: DocumentType, text: &str) -> Action {
    if RESTRICTED_MARKERS.iter().any(|m| text.contains(m)) {
        return Action::ManualReview;
    }
    match document_type {
        DocumentType::Report | DocumentType::Dataset => Action::Download,
        DocumentType::Directory => Action::Scrape,
        DocumentType::AssociationPage => Action::Contact,
        DocumentType::Unknown => Action::ManualReview,
    }
}

fn year(title: &str, snippet: &str) -> Option<u16> {
    YEAR.captures(&format!("{title} {snippet}"))
        .and_then(|c| c[1].parse().ok())
}

fn describe(text: &str, matched: usize, total: usize) -> String {
    let tags: Vec<&str> = DESCRIPTION_TAGS
        .iter()
        .filter(|(needle, _)| text.contains(needle))
        .map(|(_, tag)| *tag)
        .collect();
    let tags = if tags.is_empty() {
        "Company Data".to_string()
    } else {
        tags.join(" | ")
    };
    format!("{tags}; matched {matched}/{total} topic fragments")
}
