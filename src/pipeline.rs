//! One domain run: generate queries, search, classify, filter.

use tracing::{info, warn};

use crate::catalog::Domain;
use crate::classify::{ClassifiedRecord, Classifier};
use crate::config::Config;
use crate::fallback::{FallbackReason, Via};
use crate::llm::LanguageModel;
use crate::query::{Query, QueryGenerator};
use crate::search::SearchSurface;
use crate::search::executor::{self, ExecutorSettings, SearchStats};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Complete,
    BelowMinimum { found: usize, minimum: usize },
    NoResults,
}

impl RunStatus {
    fn from_count(found: usize, minimum: usize) -> Self {
        if found == 0 {
            RunStatus::NoResults
        } else if found < minimum {
            RunStatus::BelowMinimum { found, minimum }
        } else {
            RunStatus::Complete
        }
    }
}

/// How each hit got its score.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ClassifyStats {
    pub model: usize,
    pub not_configured: usize,
    pub unavailable: usize,
    pub malformed: usize,
    /// Hits scored below the relevance threshold.
    pub dropped: usize,
}

impl ClassifyStats {
    fn record(&mut self, via: Via) {
        match via {
            Via::Model => self.model += 1,
            Via::Fallback(FallbackReason::NotConfigured) => self.not_configured += 1,
            Via::Fallback(FallbackReason::Unavailable) => self.unavailable += 1,
            Via::Fallback(FallbackReason::Malformed) => self.malformed += 1,
        }
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub domain: Domain,
    pub queries: Vec<Query>,
    pub queries_via: Via,
    pub search: SearchStats,
    /// Unique hits handed to the classifier.
    pub search_hits: usize,
    pub classify: ClassifyStats,
    pub records: Vec<ClassifiedRecord>,
    pub status: RunStatus,
}

pub async fn run_domain<L, S>(
    config: &Config,
    llm: Option<&L>,
    surface: &S,
    domain: &Domain,
    count: usize,
) -> RunReport
where
    L: LanguageModel,
    S: SearchSurface,
{
    info!(domain = %domain.id, category = %domain.category, "starting domain run");

    let generator = QueryGenerator::new(
        llm,
        &config.country,
        (config.min_queries, config.max_queries),
        config.request_timeout,
    );
    let generated = generator.generate(domain, count).await;

    let settings = ExecutorSettings::from(config);
    let outcome = executor::execute(surface, &settings, &generated.value).await;

    let classifier = Classifier::new(
        llm,
        &config.country,
        config.relevance_threshold,
        config.request_timeout,
    );
    let mut stats = ClassifyStats::default();
    let mut records = Vec::new();
    for hit in &outcome.hits {
        let resolved = classifier.classify(hit, domain).await;
        stats.record(resolved.via);
        match resolved.value {
            Some(record) => records.push(record),
            None => stats.dropped += 1,
        }
    }

    let status = RunStatus::from_count(records.len(), config.min_records);
    match &status {
        RunStatus::NoResults => warn!(domain = %domain.id, "no relevant sources found"),
        RunStatus::BelowMinimum { found, minimum } => warn!(
            domain = %domain.id,
            found,
            minimum,
            "fewer relevant sources than the configured minimum"
        ),
        RunStatus::Complete => {}
    }
    info!(
        domain = %domain.id,
        hits = outcome.hits.len(),
        records = records.len(),
        dropped = stats.dropped,
        "domain run complete"
    );

    RunReport {
        domain: domain.clone(),
        queries: generated.value,
        queries_via: generated.via,
        search_hits: outcome.hits.len(),
        search: outcome.stats,
        classify: stats,
        records,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::classify::Method;
    use crate::llm::{Judgment, LlmError};
    use crate::search::{RawHit, SearchError, SearchResult};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Answers every query with the same canned list; counts calls.
    struct FixedSurface {
        results: Vec<SearchResult>,
        calls: Mutex<usize>,
    }

    impl FixedSurface {
        fn new(results: Vec<SearchResult>) -> Self {
            Self {
                results,
                calls: Mutex::new(0),
            }
        }
    }

    impl SearchSurface for FixedSurface {
        async fn search(&self, _: &str, _: usize) -> Result<Vec<SearchResult>, SearchError> {
            *self.calls.lock().unwrap() += 1;
            Ok(self.results.clone())
        }
    }

    struct OfflineModel;

    impl LanguageModel for OfflineModel {
        async fn generate_queries(
            &self,
            _: &Domain,
            _: &str,
            _: usize,
        ) -> Result<Vec<String>, LlmError> {
            Err(LlmError::Malformed("not json".into()))
        }

        async fn classify_hit(&self, _: &RawHit, _: &Domain, _: &str) -> Result<Judgment, LlmError> {
            Err(LlmError::Malformed("not json".into()))
        }
    }

    fn config() -> Config {
        Config {
            search_delay: Duration::ZERO,
            retry_delay: Duration::ZERO,
            max_retries: 2,
            request_timeout: Duration::from_secs(1),
            ..Config::default()
        }
    }

    fn result(url: &str, snippet: &str) -> SearchResult {
        SearchResult {
            title: "EdTech Company Directory".into(),
            url: url.into(),
            snippet: snippet.into(),
        }
    }

    #[test]
    fn status_reflects_record_count() {
        assert_eq!(RunStatus::from_count(0, 5), RunStatus::NoResults);
        assert_eq!(
            RunStatus::from_count(3, 5),
            RunStatus::BelowMinimum {
                found: 3,
                minimum: 5
            }
        );
        assert_eq!(RunStatus::from_count(5, 5), RunStatus::Complete);
    }

    #[tokio::test]
    async fn all_empty_searches_yield_no_results() {
        let catalog = Catalog::builtin();
        let surface = FixedSurface::new(Vec::new());

        let report = run_domain(
            &config(),
            None::<&OfflineModel>,
            &surface,
            catalog.get("Shipping").unwrap(),
            5,
        )
        .await;

        assert_eq!(report.status, RunStatus::NoResults);
        assert!(report.records.is_empty());
        assert_eq!(report.search.empty, 5);
        assert_eq!(*surface.calls.lock().unwrap(), 10);
    }

    #[tokio::test]
    async fn offline_run_classifies_heuristically_and_filters() {
        let catalog = Catalog::builtin();
        let surface = FixedSurface::new(vec![
            result(
                "https://nasscom.in/edtech-directory",
                "edtech, e-learning and online learning providers",
            ),
            result("https://blog.example/post", "unrelated travel notes"),
        ]);

        let report = run_domain(
            &config(),
            None::<&OfflineModel>,
            &surface,
            catalog.get("EdTech").unwrap(),
            5,
        )
        .await;

        assert_eq!(report.search_hits, 2, "repeated URLs across queries are deduped");
        assert_eq!(report.search.duplicates, 8);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].method, Method::Heuristic);
        assert_eq!(report.classify.not_configured, 2);
        assert_eq!(report.classify.dropped, 1);
        assert_eq!(
            report.status,
            RunStatus::BelowMinimum {
                found: 1,
                minimum: 5
            }
        );
    }

    #[tokio::test]
    async fn malformed_model_output_is_counted_separately() {
        let catalog = Catalog::builtin();
        let surface = FixedSurface::new(vec![result(
            "https://nasscom.in/edtech-directory",
            "edtech, e-learning and online learning providers",
        )]);

        let report = run_domain(
            &config(),
            Some(&OfflineModel),
            &surface,
            catalog.get("EdTech").unwrap(),
            5,
        )
        .await;

        assert_eq!(report.queries_via, Via::Fallback(FallbackReason::Malformed));
        assert_eq!(report.queries.len(), 5);
        assert_eq!(report.classify.malformed, 1);
        assert_eq!(report.classify.unavailable, 0);
        assert_eq!(report.records.len(), 1);
    }
}
