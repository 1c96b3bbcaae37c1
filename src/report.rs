//! Writes one domain run to a CSV sheet and renders the console summary.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use tracing::{error, info};

use crate::classify::ClassifiedRecord;
use crate::pipeline::{RunReport, RunStatus};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("cannot write report to {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode report row: {0}")]
    Csv(#[from] csv::Error),
}

const HEADERS: [&str; 11] = [
    "Domain",
    "Source Name",
    "URL",
    "Document Type",
    "Coverage",
    "Recommended Action",
    "Relevance",
    "Year",
    "Comment",
    "Method",
    "Query",
];

#[derive(Serialize)]
struct Row<'a> {
    #[serde(rename = "Domain")]
    domain: &'a str,
    #[serde(rename = "Source Name")]
    title: &'a str,
    #[serde(rename = "URL")]
    url: &'a str,
    #[serde(rename = "Document Type")]
    document_type: &'static str,
    #[serde(rename = "Coverage")]
    coverage: &'static str,
    #[serde(rename = "Recommended Action")]
    action: &'static str,
    #[serde(rename = "Relevance")]
    relevance: String,
    #[serde(rename = "Year")]
    year: Option<u16>,
    #[serde(rename = "Comment")]
    comment: &'a str,
    #[serde(rename = "Method")]
    method: &'static str,
    #[serde(rename = "Query")]
    query: &'a str,
}

impl<'a> From<&'a ClassifiedRecord> for Row<'a> {
    fn from(r: &'a ClassifiedRecord) -> Self {
        Self {
            domain: &r.domain,
            title: &r.hit.title,
            url: &r.hit.url,
            document_type: r.document_type.as_str(),
            coverage: r.coverage.as_str(),
            action: r.action.as_str(),
            relevance: format!("{:.2}", r.relevance),
            year: r.year,
            comment: &r.comment,
            method: r.method.as_str(),
            query: &r.hit.query,
        }
    }
}

pub fn report_file_name(domain_id: &str) -> String {
    format!(
        "{domain_id}_directory_{}.csv",
        Local::now().format("%Y%m%d_%H%M%S")
    )
}

/// Writes `records` in order, creating `dir` if needed. An empty run still
/// produces a header-only file so the outcome is visible on disk.
pub fn write_report(
    dir: &Path,
    domain_id: &str,
    records: &[ClassifiedRecord],
) -> Result<PathBuf, ReportError> {
    write_rows(dir, &report_file_name(domain_id), records.iter())
}

/// Same as [`write_report`], but a failure is logged and the run carries on.
pub fn publish(dir: &Path, report: &RunReport) -> Option<PathBuf> {
    write_report(dir, &report.domain.id, &report.records)
        .inspect_err(|e| error!(domain = %report.domain.id, error = %e, "report not written"))
        .ok()
}

/// One sheet holding every record of every domain, in run order.
pub fn write_master(dir: &Path, reports: &[RunReport]) -> Result<PathBuf, ReportError> {
    let name = format!(
        "master_directory_{}.csv",
        Local::now().format("%Y%m%d_%H%M%S")
    );
    write_rows(dir, &name, reports.iter().flat_map(|r| r.records.iter()))
}

fn write_rows<'a>(
    dir: &Path,
    file_name: &str,
    records: impl Iterator<Item = &'a ClassifiedRecord>,
) -> Result<PathBuf, ReportError> {
    std::fs::create_dir_all(dir).map_err(|source| ReportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(file_name);

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&path)?;
    writer.write_record(HEADERS)?;
    let mut rows = 0;
    for record in records {
        writer.serialize(Row::from(record))?;
        rows += 1;
    }
    writer.flush().map_err(|source| ReportError::Io {
        path: path.clone(),
        source,
    })?;

    info!(path = %path.display(), rows, "report written");
    Ok(path)
}

/// Cross-domain totals printed after a multi-domain run.
pub fn totals(reports: &[RunReport]) -> String {
    let mut out = String::new();
    let queries: usize = reports.iter().map(|r| r.queries.len()).sum();
    let hits: usize = reports.iter().map(|r| r.search_hits).sum();
    let records: usize = reports.iter().map(|r| r.records.len()).sum();
    let short: Vec<&str> = reports
        .iter()
        .filter(|r| r.status != RunStatus::Complete)
        .map(|r| r.domain.id.as_str())
        .collect();

    let _ = writeln!(out, "== totals ==");
    let _ = writeln!(out, "domains processed: {}", reports.len());
    let _ = writeln!(out, "queries: {queries}");
    let _ = writeln!(out, "unique hits: {hits}");
    let _ = writeln!(out, "records: {records}");
    if !short.is_empty() {
        let _ = writeln!(out, "below minimum: {}", short.join(", "));
    }
    out
}

pub fn summary(report: &RunReport) -> String {
    let mut out = String::new();
    let s = &report.search;
    let c = &report.classify;

    let _ = writeln!(out, "== {} ({}) ==", report.domain.name, report.domain.category);
    let _ = writeln!(
        out,
        "queries: {} ({:?})",
        report.queries.len(),
        report.queries_via
    );
    let _ = writeln!(
        out,
        "searches: {}/{} ok, {} empty, {} failed, {} requests",
        s.succeeded, s.queries, s.empty, s.failed, s.requests
    );
    let _ = writeln!(
        out,
        "hits: {} unique, {} duplicate URLs skipped",
        report.search_hits, s.duplicates
    );
    let _ = writeln!(
        out,
        "classified: {} by model, {} heuristic ({} unavailable, {} malformed), {} below threshold",
        c.model,
        c.not_configured + c.unavailable + c.malformed,
        c.unavailable,
        c.malformed,
        c.dropped
    );

    match &report.status {
        RunStatus::Complete => {
            let _ = writeln!(out, "records: {}", report.records.len());
        }
        RunStatus::BelowMinimum { found, minimum } => {
            let _ = writeln!(
                out,
                "records: {found} (below the minimum of {minimum}; consider more queries or a lower threshold)"
            );
        }
        RunStatus::NoResults => {
            let _ = writeln!(out, "records: none found");
        }
    }

    for (i, r) in report.records.iter().take(10).enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. [{:.2}] {} | {} | {}",
            i + 1,
            r.relevance,
            r.document_type,
            r.hit.title,
            r.hit.url
        );
    }
    if report.records.len() > 10 {
        let _ = writeln!(out, "     ... and {} more", report.records.len() - 10);
    }
    out
}
