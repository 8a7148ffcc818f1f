//! HTTP plumbing shared by the hosted providers.

use reqwest::{Client, StatusCode};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{AIError, TurnReply};

/// Longest pause between attempts, whatever the service asks for.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

pub(super) fn build_client(timeout: Duration) -> Result<Client, AIError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AIError::invalid_request(format!("could not build HTTP client: {}", e)))
}

pub(super) fn transport_error(err: reqwest::Error, timeout: Duration) -> AIError {
    if err.is_timeout() {
        AIError::Timeout {
            timeout_secs: timeout.as_secs() as u32,
        }
    } else if err.is_connect() {
        AIError::network(format!("could not connect: {}", err))
    } else {
        AIError::network(err.to_string())
    }
}

/// Maps a non-success status onto an error. `retry_after_secs` is used for 429.
pub(super) fn status_error(status: StatusCode, body: String, retry_after_secs: u32) -> AIError {
    match status.as_u16() {
        401 | 403 => AIError::AuthenticationFailed,
        429 => AIError::rate_limited(retry_after_secs),
        400 | 404 | 413 | 422 => AIError::invalid_request(body),
        500..=599 => AIError::unavailable(format!("{}: {}", status, body)),
        _ => AIError::network(format!("unexpected status {}: {}", status, body)),
    }
}

/// Pause before retry number `attempt` (zero-based).
pub(super) fn backoff_delay(attempt: u32, err: &AIError) -> Duration {
    let delay = match err {
        AIError::RateLimited { retry_after_secs } => Duration::from_secs(u64::from(*retry_after_secs)),
        _ => Duration::from_secs(1u64 << attempt.min(5)),
    };
    delay.min(MAX_BACKOFF)
}

/// Runs `send` until it succeeds, fails for good, or retries run out.
pub(super) async fn with_backoff<F, Fut>(
    provider: &'static str,
    max_retries: u32,
    trace_id: &str,
    send: F,
) -> Result<TurnReply, AIError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<TurnReply, AIError>>,
{
    let mut attempt = 0;
    loop {
        match send().await {
            Ok(reply) => return Ok(reply),
            Err(err) if err.is_retryable() && attempt < max_retries => {
                let delay = backoff_delay(attempt, &err);
                tracing::warn!(
                    provider,
                    trace_id,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Request failed, retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
