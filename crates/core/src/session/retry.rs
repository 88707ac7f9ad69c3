//! Bounded retry for network calls whose failures may resolve on their own.

use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use crate::config::RetryPolicy;
use crate::errors::{NetworkError, SessionError};
use crate::net::{HttpRequest, HttpResponse, HttpTransport};

/// Execute `request`, retrying transient transport failures.
///
/// Any HTTP response, whatever its status, ends the loop and is returned to the
/// caller for classification. Timeouts, lost connections and unreachable hosts
/// are retried up to `policy.max_attempts` with `policy.delay` between
/// attempts. Cancellation is honoured both mid-request and mid-backoff.
pub async fn execute_with_retry(
    transport: &dyn HttpTransport,
    request: &HttpRequest,
    policy: RetryPolicy,
    cancel: &CancellationToken,
) -> Result<HttpResponse, SessionError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SessionError::Cancelled),
            result = transport.execute(request.clone()) => result,
        };

        let error = match result {
            Ok(response) => {
                debug!(
                    "[Session] {} {} -> {} (attempt {}/{})",
                    request.method.as_str(),
                    request.url,
                    response.status,
                    attempt,
                    max_attempts
                );
                return Ok(response);
            }
            Err(err) => NetworkError::from(err),
        };

        if !error.is_transient() {
            warn!("[Session] Non-retryable failure: {}", error);
            return Err(SessionError::Network(error));
        }
        if attempt >= max_attempts {
            warn!(
                "[Session] Giving up after {} attempt(s): {}",
                attempt, error
            );
            return Err(SessionError::Network(error));
        }

        warn!(
            "[Session] Attempt {}/{} failed: {}. Retrying in {:?}",
            attempt, max_attempts, error, policy.delay
        );
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SessionError::Cancelled),
            _ = tokio::time::sleep(policy.delay) => {}
        }
        attempt += 1;
    }
}
