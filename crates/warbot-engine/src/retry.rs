//! Retry loop for writes that may fail transiently.

use std::future::Future;

use warbot_ports::PortError;

use crate::RetryPolicy;

/// Runs `op` until it succeeds, fails with a non-retryable error, or the
/// policy's attempts are used up. `what` names the write in logs.
pub(crate) async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    what: &str,
    mut op: F,
) -> Result<T, PortError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PortError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.attempts => {
                tracing::warn!(%what, attempt, error = %e, "write failed, retrying");
                tokio::time::sleep(policy.backoff(attempt)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
