//! Attempt a language-model call once, and substitute a deterministic result on any failure.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::llm::LlmError;

/// Why the deterministic path was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// No model configured for this run.
    NotConfigured,
    /// Network, HTTP, quota or timeout failure.
    Unavailable,
    /// The model answered, but the content could not be used.
    Malformed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Via {
    Model,
    Fallback(FallbackReason),
}

#[derive(Debug)]
pub struct Resolved<T> {
    pub value: T,
    pub via: Via,
}

/// Runs `primary` (if any) bounded by `limit`; on error or timeout returns `fallback()`.
///
/// The primary future is polled at most once to completion: there is no retry.
/// Unavailability and malformed content are logged under distinct messages.
pub async fn with_fallback<T, Fut>(
    what: &'static str,
    limit: Duration,
    primary: Option<Fut>,
    fallback: impl FnOnce() -> T,
) -> Resolved<T>
where
    Fut: Future<Output = Result<T, LlmError>>,
{
    let Some(primary) = primary else {
        debug!(what, "no language model configured, using deterministic path");
        return Resolved {
            value: fallback(),
            via: Via::Fallback(FallbackReason::NotConfigured),
        };
    };

    let outcome = tokio::time::timeout(limit, primary)
        .await
        .unwrap_or_else(|_| Err(LlmError::Timeout(limit.as_secs())));

    match outcome {
        Ok(value) => Resolved {
            value,
            via: Via::Model,
        },
        Err(e) if e.is_malformed() => {
            warn!(what, error = %e, "language model returned unusable content, falling back");
            Resolved {
                value: fallback(),
                via: Via::Fallback(FallbackReason::Malformed),
            }
        }
        Err(e) => {
            warn!(what, error = %e, "language model unavailable, falling back");
            Resolved {
                value: fallback(),
                via: Via::Fallback(FallbackReason::Unavailable),
            }
        }
    }
}
