//! Turns a domain into a bounded, deduplicated set of search queries.

mod template;

pub use template::combination_space;

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, info};

use crate::catalog::Domain;
use crate::fallback::{Resolved, Via, with_fallback};
use crate::llm::{LanguageModel, LlmError};
use template::template_candidates;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMethod {
    Llm,
    Template,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub text: String,
    pub domain: String,
    pub method: QueryMethod,
}

/// Comparison key: lowercase, inner whitespace collapsed to single spaces.
pub fn normalize_query(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Ordered query list that silently rejects blanks and normalized duplicates.
#[derive(Debug, Default)]
struct QuerySet {
    seen: HashSet<String>,
    queries: Vec<Query>,
}

impl QuerySet {
    fn push(&mut self, text: &str, domain: &Domain, method: QueryMethod) -> bool {
        let key = normalize_query(text);
        if key.is_empty() || !self.seen.insert(key) {
            return false;
        }
        self.queries.push(Query {
            text: text.split_whitespace().collect::<Vec<_>>().join(" "),
            domain: domain.id.clone(),
            method,
        });
        true
    }

    fn len(&self) -> usize {
        self.queries.len()
    }

    fn fill_from_templates(&mut self, domain: &Domain, country: &str, count: usize) {
        for candidate in template_candidates(domain, country) {
            if self.len() >= count {
                break;
            }
            self.push(&candidate, domain, QueryMethod::Template);
        }
    }
}

pub struct QueryGenerator<'a, L> {
    llm: Option<&'a L>,
    country: &'a str,
    min: usize,
    max: usize,
    timeout: Duration,
}

impl<'a, L: LanguageModel> QueryGenerator<'a, L> {
    pub fn new(
        llm: Option<&'a L>,
        country: &'a str,
        range: (usize, usize),
        timeout: Duration,
    ) -> Self {
        Self {
            llm,
            country,
            min: range.0,
            max: range.1,
            timeout,
        }
    }

    /// At most `count` (clamped) unique queries. Model output first, topped up
    /// from templates; the template path alone makes no network calls.
    pub async fn generate(&self, domain: &Domain, count: usize) -> Resolved<Vec<Query>> {
        let count = count.clamp(self.min, self.max);

        let primary = self.llm.map(|llm| async move {
            let lines = llm.generate_queries(domain, self.country, count).await?;
            let mut set = QuerySet::default();
            for line in lines.iter().take(count) {
                set.push(line, domain, QueryMethod::Llm);
            }
            if set.queries.is_empty() {
                return Err(LlmError::Malformed("model produced no usable queries".into()));
            }
            Ok::<_, LlmError>(set)
        });

        let resolved =
            with_fallback("generate_queries", self.timeout, primary, QuerySet::default).await;

        let mut set = resolved.value;
        let from_model = set.len();
        set.fill_from_templates(domain, self.country, count);

        if matches!(resolved.via, Via::Model) && set.len() > from_model {
            debug!(
                from_model,
                topped_up = set.len() - from_model,
                "model returned fewer queries than requested"
            );
        }
        info!(
            domain = %domain.id,
            requested = count,
            generated = set.len(),
            via = ?resolved.via,
            "queries generated"
        );

        Resolved {
            value: set.queries,
            via: resolved.via,
        }
    }
}
