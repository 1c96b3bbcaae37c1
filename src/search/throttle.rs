use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Enforces a minimum spacing between successive external requests.
#[derive(Debug)]
pub(super) struct Throttle {
    min_interval: Duration,
    jitter: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub(super) fn new(min_interval: Duration, jitter: Duration) -> Self {
        Self {
            min_interval,
            jitter,
            last: None,
        }
    }

    /// Sleeps until the interval since the previous request has elapsed, then
    /// stamps the current request. The first request never waits.
    pub(super) async fn wait(&mut self) {
        if let Some(last) = self.last {
            let target = self.min_interval.saturating_add(self.random_jitter());
            let elapsed = last.elapsed();
            if elapsed < target {
                let pause = target - elapsed;
                debug!(pause_ms = pause.as_millis() as u64, "throttling search request");
                tokio::time::sleep(pause).await;
            }
        }
        self.last = Some(Instant::now());
    }

    fn random_jitter(&self) -> Duration {
        let max = self.jitter.as_millis() as u64;
        if max == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(fastrand::u64(..=max))
        }
    }
}
