use std::future::Future;
use std::time::Duration;

use crate::errors::AppError;

const BASE_DELAY_MS: u64 = 500;
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Runs `op` up to `max_attempts` times, sleeping an exponentially growing
/// delay between attempts.
///
/// Only errors where [`AppError::is_retryable`] holds are retried; terminal
/// errors (malformed payloads, auth failures) return immediately. After the
/// attempt budget is exhausted the last error is returned and the caller
/// decides whether to skip the candidate or abort.
pub async fn retry_with_backoff<T, F, Fut>(
    max_attempts: u32,
    label: &str,
    mut op: F,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt + 1 < max_attempts => {
                let delay = backoff_delay(attempt);
                tracing::warn!(
                    "{} failed (attempt {}/{}): {}; retrying in {:?}",
                    label,
                    attempt + 1,
                    max_attempts,
                    err,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                if err.is_retryable() {
                    tracing::error!(
                        "{} failed after {} attempts: {}",
                        label,
                        attempt + 1,
                        err
                    );
                }
                return Err(err);
            }
        }
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    let multiplier = 2u64.saturating_pow(attempt);
    Duration::from_millis(BASE_DELAY_MS.saturating_mul(multiplier)).min(MAX_DELAY)
}
