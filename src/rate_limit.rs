use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Paces outbound API calls to a minimum inter-call interval.
///
/// One limiter is shared by reference among every call site (registry and
/// turnover clients alike), so the pacing is global to the run rather than
/// per-client. Tests inject [`RateLimiter::unthrottled`].
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// A limiter that never delays. For tests and stub deployments.
    pub fn unthrottled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Waits until at least `min_interval` has passed since the previous
    /// call, then records the current instant as the new reference point.
    pub async fn wait(&self) {
        if self.min_interval.is_zero() {
            return;
        }

        let mut last_call = self.last_call.lock().await;
        if let Some(previous) = *last_call {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}
