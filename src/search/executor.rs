use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::normalize::normalize_url;
use super::throttle::Throttle;
use super::{RawHit, SearchError, SearchResult, SearchSurface};
use crate::config::Config;
use crate::query::Query;

#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    pub results_per_query: usize,
    /// Total attempts per query, first try included.
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub min_interval: Duration,
    pub jitter: Duration,
    pub request_timeout: Duration,
}

impl From<&Config> for ExecutorSettings {
    fn from(config: &Config) -> Self {
        Self {
            results_per_query: config.results_per_query,
            max_attempts: config.max_retries.max(1),
            retry_delay: config.retry_delay,
            min_interval: config.search_delay,
            jitter: config.search_jitter,
            request_timeout: config.request_timeout,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SearchStats {
    pub queries: usize,
    pub succeeded: usize,
    /// Queries that still errored after every attempt.
    pub failed: usize,
    /// Queries whose every attempt came back without results.
    pub empty: usize,
    pub requests: usize,
    pub duplicates: usize,
}

#[derive(Debug)]
pub struct SearchOutcome {
    pub hits: Vec<RawHit>,
    pub stats: SearchStats,
}

/// Runs `queries` sequentially against `surface`, in input order.
///
/// A query that keeps failing is skipped; it never aborts the run. Hits whose
/// normalized URL was already emitted earlier in the run are dropped.
pub async fn execute(
    surface: &impl SearchSurface,
    settings: &ExecutorSettings,
    queries: &[Query],
) -> SearchOutcome {
    let mut throttle = Throttle::new(settings.min_interval, settings.jitter);
    let mut seen: HashSet<String> = HashSet::new();
    let mut hits = Vec::new();
    let mut stats = SearchStats {
        queries: queries.len(),
        ..SearchStats::default()
    };

    for (i, query) in queries.iter().enumerate() {
        info!(
            query = %query.text,
            n = i + 1,
            total = queries.len(),
            "searching"
        );

        let outcome =
            search_with_retry(surface, settings, &mut throttle, &mut stats, &query.text).await;
        let results = match outcome {
            Ok(results) => results,
            Err(SearchError::Empty) => {
                stats.empty += 1;
                warn!(query = %query.text, "no results after all attempts");
                continue;
            }
            Err(e) => {
                stats.failed += 1;
                warn!(query = %query.text, error = %e, "query failed after all attempts, skipping");
                continue;
            }
        };
        stats.succeeded += 1;

        let before = hits.len();
        for result in results {
            if !seen.insert(normalize_url(&result.url)) {
                stats.duplicates += 1;
                continue;
            }
            hits.push(RawHit {
                title: result.title,
                url: result.url,
                snippet: result.snippet,
                query: query.text.clone(),
            });
        }
        debug!(query = %query.text, new_hits = hits.len() - before, "query complete");
    }

    info!(
        hits = hits.len(),
        succeeded = stats.succeeded,
        failed = stats.failed,
        empty = stats.empty,
        duplicates = stats.duplicates,
        "search phase complete"
    );
    SearchOutcome { hits, stats }
}

async fn search_with_retry(
    surface: &impl SearchSurface,
    settings: &ExecutorSettings,
    throttle: &mut Throttle,
    stats: &mut SearchStats,
    query: &str,
) -> Result<Vec<SearchResult>, SearchError> {
    let mut last_err = SearchError::Empty;
    for attempt in 1..=settings.max_attempts {
        throttle.wait().await;
        stats.requests += 1;

        let outcome = tokio::time::timeout(
            settings.request_timeout,
            surface.search(query, settings.results_per_query),
        )
        .await
        .unwrap_or_else(|_| Err(SearchError::Timeout(settings.request_timeout.as_secs())));

        match outcome {
            Ok(results) if !results.is_empty() => return Ok(results),
            Ok(_) => last_err = SearchError::Empty,
            Err(e) => last_err = e,
        }

        if attempt < settings.max_attempts {
            let delay = backoff(settings.retry_delay, attempt);
            debug!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %last_err,
                "retrying search after transient failure"
            );
            tokio::time::sleep(delay).await;
        }
    }
    Err(last_err)
}

/// Linear backoff, saturating instead of overflowing.
fn backoff(retry_delay: Duration, attempt: u32) -> Duration {
    retry_delay.saturating_mul(attempt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryMethod;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// Scripted surface: each query string pops its own response queue;
    /// an exhausted queue answers with a network-style API error.
    struct MockSurface {
        responses: Mutex<HashMap<String, VecDeque<Result<Vec<SearchResult>, SearchError>>>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockSurface {
        fn new() -> Self {
            Self {
                responses: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn respond(self, query: &str, response: Result<Vec<SearchResult>, SearchError>) -> Self {
            self.responses
                .lock()
                .unwrap()
                .entry(query.to_string())
                .or_default()
                .push_back(response);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl SearchSurface for MockSurface {
        async fn search(
            &self,
            query: &str,
            _max_results: usize,
        ) -> Result<Vec<SearchResult>, SearchError> {
            self.calls.lock().unwrap().push(query.to_string());
            self.responses
                .lock()
                .unwrap()
                .get_mut(query)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| Err(SearchError::Api("unreachable".into())))
        }
    }

    struct SlowSurface;

    impl SearchSurface for SlowSurface {
        async fn search(&self, _: &str, _: usize) -> Result<Vec<SearchResult>, SearchError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(vec![result("https://late.example")])
        }
    }

    fn settings() -> ExecutorSettings {
        ExecutorSettings {
            results_per_query: 10,
            max_attempts: 3,
            retry_delay: Duration::ZERO,
            min_interval: Duration::ZERO,
            jitter: Duration::ZERO,
            request_timeout: Duration::from_secs(5),
        }
    }

    fn query(text: &str) -> Query {
        Query {
            text: text.to_string(),
            domain: "EdTech".to_string(),
            method: QueryMethod::Template,
        }
    }

    fn result(url: &str) -> SearchResult {
        SearchResult {
            title: format!("title of {url}"),
            url: url.to_string(),
            snippet: String::new(),
        }
    }

    fn urls(outcome: &SearchOutcome) -> Vec<&str> {
        outcome.hits.iter().map(|h| h.url.as_str()).collect()
    }

    #[test]
    fn backoff_grows_linearly_and_saturates() {
        assert_eq!(backoff(Duration::from_millis(100), 3), Duration::from_millis(300));
        assert_eq!(backoff(Duration::MAX, 2), Duration::MAX);
    }

    #[tokio::test]
    async fn permanently_failing_query_is_skipped_in_order() {
        let surface = MockSurface::new()
            .respond("q1", Ok(vec![result("https://a.example/1"), result("https://a.example/2")]))
            .respond("q3", Ok(vec![result("https://c.example/1")]));

        let queries = [query("q1"), query("q2"), query("q3")];
        let outcome = execute(&surface, &settings(), &queries).await;

        assert_eq!(
            urls(&outcome),
            vec!["https://a.example/1", "https://a.example/2", "https://c.example/1"]
        );
        assert_eq!(outcome.hits[0].query, "q1");
        assert_eq!(outcome.hits[2].query, "q3");
        assert_eq!(outcome.stats.failed, 1);
        assert_eq!(outcome.stats.succeeded, 2);
        assert_eq!(
            surface.calls(),
            vec!["q1", "q2", "q2", "q2", "q3"],
            "q2 must be attempted max_attempts times"
        );
    }

    #[tokio::test]
    async fn transient_failure_then_success_is_retried() {
        let surface = MockSurface::new()
            .respond("q1", Err(SearchError::Status(503)))
            .respond("q1", Err(SearchError::Garbled("bad".into())))
            .respond("q1", Ok(vec![result("https://a.example")]));

        let outcome = execute(&surface, &settings(), &[query("q1")]).await;

        assert_eq!(urls(&outcome), vec!["https://a.example"]);
        assert_eq!(outcome.stats.requests, 3);
        assert_eq!(outcome.stats.failed, 0);
    }

    #[tokio::test]
    async fn empty_response_is_retried() {
        let surface = MockSurface::new()
            .respond("q1", Ok(vec![]))
            .respond("q1", Ok(vec![result("https://a.example")]));

        let outcome = execute(&surface, &settings(), &[query("q1")]).await;

        assert_eq!(urls(&outcome), vec!["https://a.example"]);
        assert_eq!(surface.calls().len(), 2);
    }

    #[tokio::test]
    async fn duplicate_urls_keep_first_occurrence_across_queries() {
        let surface = MockSurface::new()
            .respond(
                "q1",
                Ok(vec![
                    result("https://www.a.example/list/"),
                    result("https://b.example/x"),
                    result("https://a.example/list?utm_source=dup"),
                ]),
            )
            .respond(
                "q2",
                Ok(vec![result("https://B.example/x#frag"), result("https://c.example")]),
            );

        let outcome = execute(&surface, &settings(), &[query("q1"), query("q2")]).await;

        assert_eq!(
            urls(&outcome),
            vec!["https://www.a.example/list/", "https://b.example/x", "https://c.example"]
        );
        assert_eq!(outcome.hits[1].query, "q1");
        assert_eq!(outcome.stats.duplicates, 2);
        let normalized: HashSet<String> =
            outcome.hits.iter().map(|h| normalize_url(&h.url)).collect();
        assert_eq!(normalized.len(), outcome.hits.len());
    }

    #[tokio::test]
    async fn all_queries_empty_returns_empty_outcome() {
        let surface = MockSurface::new()
            .respond("q1", Ok(vec![]))
            .respond("q1", Ok(vec![]))
            .respond("q1", Ok(vec![]))
            .respond("q2", Ok(vec![]))
            .respond("q2", Ok(vec![]))
            .respond("q2", Ok(vec![]));

        let outcome = execute(&surface, &settings(), &[query("q1"), query("q2")]).await;

        assert!(outcome.hits.is_empty());
        assert_eq!(outcome.stats.empty, 2);
        assert_eq!(outcome.stats.failed, 0);
    }

    #[tokio::test]
    async fn every_query_failing_returns_empty_not_error() {
        let surface = MockSurface::new();
        let outcome = execute(&surface, &settings(), &[query("q1"), query("q2")]).await;

        assert!(outcome.hits.is_empty());
        assert_eq!(outcome.stats.failed, 2);
        assert_eq!(outcome.stats.requests, 6);
    }

    #[tokio::test]
    async fn slow_surface_times_out_and_is_skipped() {
        let mut settings = settings();
        settings.request_timeout = Duration::from_millis(20);
        settings.max_attempts = 2;

        let outcome = execute(&SlowSurface, &settings, &[query("q1")]).await;

        assert!(outcome.hits.is_empty());
        assert_eq!(outcome.stats.failed, 1);
        assert_eq!(outcome.stats.requests, 2);
    }

    #[tokio::test]
    async fn throttle_spaces_requests_including_retries() {
        let mut settings = settings();
        settings.min_interval = Duration::from_millis(25);
        let surface = MockSurface::new()
            .respond("q1", Err(SearchError::Status(500)))
            .respond("q1", Ok(vec![result("https://a.example")]))
            .respond("q2", Ok(vec![result("https://b.example")]));

        let start = std::time::Instant::now();
        let outcome = execute(&surface, &settings, &[query("q1"), query("q2")]).await;

        assert_eq!(outcome.hits.len(), 2);
        assert!(start.elapsed() >= Duration::from_millis(45));
    }

    #[test]
    fn settings_from_config_keep_at_least_one_attempt() {
        let mut config = Config::default();
        config.max_retries = 0;
        assert_eq!(ExecutorSettings::from(&config).max_attempts, 1);
    }
}
