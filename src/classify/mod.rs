//! Turns raw search hits into scored, typed records.

mod heuristic;

pub use heuristic::heuristic_judgment;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::catalog::Domain;
use crate::fallback::{Resolved, with_fallback};
use crate::llm::{Judgment, LanguageModel, LlmError};
use crate::search::RawHit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentType {
    Directory,
    Report,
    AssociationPage,
    Dataset,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Coverage {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Download,
    Scrape,
    Contact,
    ManualReview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Llm,
    Heuristic,
}

macro_rules! keyword_enum {
    ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        /// Accepts `kebab-case`, `snake_case` or spaced spellings, case-insensitively.
        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let key = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
                match key.as_str() {
                    $($name => Ok($ty::$variant),)+
                    _ => Err(format!("unknown {} '{}'", stringify!($ty), s.trim())),
                }
            }
        }
    };
}

keyword_enum!(DocumentType {
    Directory => "directory",
    Report => "report",
    AssociationPage => "association-page",
    Dataset => "dataset",
    Unknown => "unknown",
});

keyword_enum!(Coverage {
    Low => "low",
    Medium => "medium",
    High => "high",
});

keyword_enum!(Action {
    Download => "download",
    Scrape => "scrape",
    Contact => "contact",
    ManualReview => "manual-review",
});

keyword_enum!(Method {
    Llm => "llm",
    Heuristic => "heuristic",
});

/// A scored output row. Always backed by exactly one hit and one domain.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRecord {
    pub domain: String,
    pub hit: RawHit,
    pub document_type: DocumentType,
    pub coverage: Coverage,
    pub action: Action,
    pub relevance: f64,
    pub year: Option<u16>,
    pub comment: String,
    pub method: Method,
}

impl ClassifiedRecord {
    pub fn from_judgment(hit: &RawHit, domain: &Domain, judgment: Judgment, method: Method) -> Self {
        Self {
            domain: domain.id.clone(),
            hit: hit.clone(),
            document_type: judgment.document_type,
            coverage: judgment.coverage,
            action: judgment.action,
            relevance: judgment.relevance,
            year: judgment.year,
            comment: judgment.comment,
            method,
        }
    }
}

/// Model-first classifier with a pure heuristic fallback.
pub struct Classifier<'a, L> {
    llm: Option<&'a L>,
    country: &'a str,
    threshold: f64,
    timeout: Duration,
}

impl<'a, L: LanguageModel> Classifier<'a, L> {
    pub fn new(llm: Option<&'a L>, country: &'a str, threshold: f64, timeout: Duration) -> Self {
        Self {
            llm,
            country,
            threshold,
            timeout,
        }
    }

    /// Scores a hit without applying the relevance threshold.
    async fn assess(&self, hit: &RawHit, domain: &Domain) -> Resolved<ClassifiedRecord> {
        let primary = self.llm.map(|llm| async move {
            let judgment = llm.classify_hit(hit, domain, self.country).await?;
            Ok::<_, LlmError>(ClassifiedRecord::from_judgment(
                hit,
                domain,
                judgment,
                Method::Llm,
            ))
        });

        with_fallback("classify", self.timeout, primary, || {
            ClassifiedRecord::from_judgment(
                hit,
                domain,
                heuristic_judgment(hit, domain),
                Method::Heuristic,
            )
        })
        .await
    }

    pub fn passes(&self, record: &ClassifiedRecord) -> bool {
        record.relevance >= self.threshold
    }

    /// `value` is `None` when the hit scores below the relevance threshold;
    /// `via` tells which path produced the score either way.
    pub async fn classify(
        &self,
        hit: &RawHit,
        domain: &Domain,
    ) -> Resolved<Option<ClassifiedRecord>> {
        let resolved = self.assess(hit, domain).await;
        let keep = self.passes(&resolved.value);
        tracing::debug!(
            url = %hit.url,
            relevance = resolved.value.relevance,
            via = ?resolved.via,
            keep,
            "hit classified"
        );
        Resolved {
            value: keep.then_some(resolved.value),
            via: resolved.via,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Category};
    use crate::fallback::{FallbackReason, Via};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct MockModel {
        judgments: Mutex<VecDeque<Result<Judgment, LlmError>>>,
        calls: Mutex<usize>,
    }

    impl MockModel {
        fn new(judgments: Vec<Result<Judgment, LlmError>>) -> Self {
            Self {
                judgments: Mutex::new(judgments.into()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl LanguageModel for MockModel {
        async fn generate_queries(
            &self,
            _: &Domain,
            _: &str,
            _: usize,
        ) -> Result<Vec<String>, LlmError> {
            Err(LlmError::Empty)
        }

        async fn classify_hit(
            &self,
            _: &RawHit,
            _: &Domain,
            _: &str,
        ) -> Result<Judgment, LlmError> {
            *self.calls.lock().unwrap() += 1;
            self.judgments
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::Empty))
        }
    }

    fn four_fragment_domain() -> Domain {
        let fragments: Vec<String> = ["e-learning", "online courses", "edtech", "tutoring"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        Domain::custom("Learning", Category::Service, &fragments).unwrap()
    }

    fn hit(snippet: &str) -> RawHit {
        RawHit {
            title: "Companies".into(),
            url: "https://example.org/companies".into(),
            snippet: snippet.into(),
            query: "q".into(),
        }
    }

    fn judgment(relevance: f64) -> Judgment {
        Judgment {
            document_type: DocumentType::Dataset,
            coverage: Coverage::High,
            action: Action::Download,
            relevance,
            year: Some(2025),
            comment: "open data".into(),
        }
    }

    fn classifier<'a>(llm: Option<&'a MockModel>, threshold: f64) -> Classifier<'a, MockModel> {
        Classifier::new(llm, "India", threshold, Duration::from_secs(1))
    }

    #[test]
    fn keyword_enums_parse_loosely_and_display_kebab() {
        assert_eq!(
            "Association_Page".parse::<DocumentType>().unwrap(),
            DocumentType::AssociationPage
        );
        assert_eq!("manual review".parse::<Action>().unwrap(), Action::ManualReview);
        assert_eq!(DocumentType::AssociationPage.to_string(), "association-page");
        assert!("huge".parse::<Coverage>().is_err());
        assert!(Coverage::High > Coverage::Medium && Coverage::Medium > Coverage::Low);
    }

    #[tokio::test]
    async fn model_judgment_is_used_when_available() {
        let model = MockModel::new(vec![Ok(judgment(0.9))]);
        let domain = four_fragment_domain();

        let record = classifier(Some(&model), 0.6)
            .classify(&hit("nothing relevant"), &domain)
            .await
            .value
            .unwrap();

        assert_eq!(record.method, Method::Llm);
        assert_eq!(record.document_type, DocumentType::Dataset);
        assert_eq!(record.domain, "Learning");
        assert_eq!(record.hit.url, "https://example.org/companies");
    }

    #[tokio::test]
    async fn malformed_model_output_falls_back_to_heuristic() {
        let model = MockModel::new(vec![Err(LlmError::Malformed("bad".into()))]);
        let domain = four_fragment_domain();
        let hit = hit("e-learning, online courses and tutoring providers");

        let resolved = classifier(Some(&model), 0.6).assess(&hit, &domain).await;

        assert_eq!(resolved.via, Via::Fallback(FallbackReason::Malformed));
        assert_eq!(resolved.value.method, Method::Heuristic);
        assert_eq!(resolved.value.relevance, 0.75);
        assert_eq!(model.calls(), 1, "model call must not be retried");
    }

    #[tokio::test]
    async fn three_of_four_fragments_is_high_coverage_075() {
        let domain = four_fragment_domain();
        let record = classifier(None, 0.6)
            .classify(&hit("Top e-learning, online courses and edtech firms"), &domain)
            .await
            .value
            .unwrap();

        assert_eq!(record.coverage, Coverage::High);
        assert_eq!(record.relevance, 0.75);
        assert_eq!(record.method, Method::Heuristic);
    }

    #[tokio::test]
    async fn below_threshold_is_dropped() {
        let model = MockModel::new(vec![Ok(judgment(0.4))]);
        let domain = four_fragment_domain();
        assert!(
            classifier(Some(&model), 0.6)
                .classify(&hit("x"), &domain)
                .await
                .value
                .is_none()
        );
        assert!(
            classifier(None, 0.6)
                .classify(&hit("only tutoring here"), &domain)
                .await
                .value
                .is_none()
        );
    }

    #[test]
    fn threshold_filtering_is_monotonic() {
        let catalog = Catalog::builtin();
        let domain = catalog.get("EdTech").unwrap();
        let snippets = [
            "edtech",
            "edtech e-learning",
            "edtech e-learning online learning",
            "edtech e-learning online learning digital education",
            "edtech e-learning online learning digital education educational software",
            "unrelated",
        ];
        let records: Vec<ClassifiedRecord> = snippets
            .iter()
            .map(|s| {
                let hit = hit(s);
                ClassifiedRecord::from_judgment(
                    &hit,
                    domain,
                    heuristic_judgment(&hit, domain),
                    Method::Heuristic,
                )
            })
            .collect();

        let kept = |threshold: f64| -> Vec<ClassifiedRecord> {
            let classifier = classifier(None, threshold);
            records.iter().filter(|r| classifier.passes(r)).cloned().collect()
        };
        let thresholds = [0.0, 0.2, 0.4, 0.5, 0.6, 0.8, 1.0];
        for pair in thresholds.windows(2) {
            let (low, high) = (pair[0], pair[1]);
            let kept_low = kept(low);
            let kept_high = kept(high);
            for record in &kept_high {
                assert!(kept_low.contains(record), "raising {low}->{high} added a record");
            }
            assert!(kept_high.len() <= kept_low.len());
        }
    }
}
