//! Connector-side retry loop
//!
//! Providers drive their own [`RetryPolicy`] so the backoff they log is the
//! only one in effect. Each attempt asks the host client for a single try
//! and the final failure is handed back unmapped, leaving the translation
//! into provider errors to the caller.

use tracing::{debug, instrument, warn};

use crate::error::BridgeError;
use crate::http::{HttpClient, HttpRequest, HttpResponse, RetryPolicy};

/// Why a request driven by [`execute_with_policy`] did not succeed
#[derive(Debug)]
pub enum RetryFailure {
    /// Non-retryable status; returned on the attempt that produced it
    Rejected(HttpResponse),
    /// Retryable status (429 or 5xx) on the final attempt
    Exhausted {
        response: HttpResponse,
        attempts: u32,
    },
    /// Transport failure on the final attempt
    Transport { error: BridgeError, attempts: u32 },
}

/// Execute `request` until it succeeds, is rejected, or `policy` runs out.
///
/// A policy with `max_attempts` of zero still makes one attempt.
#[instrument(skip(client, request, policy), fields(url = %request.url))]
pub async fn execute_with_policy(
    client: &dyn HttpClient,
    request: HttpRequest,
    policy: &RetryPolicy,
) -> std::result::Result<HttpResponse, RetryFailure> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        let reason = match client
            .execute_with_retry(request.clone(), RetryPolicy::no_retry())
            .await
        {
            Ok(response) if response.is_success() => {
                debug!(status = response.status, "API request succeeded");
                return Ok(response);
            }
            Ok(response) if response.is_retryable() => {
                if attempt >= max_attempts {
                    warn!(
                        status = response.status,
                        attempts = attempt,
                        "API request failed after retries"
                    );
                    return Err(RetryFailure::Exhausted {
                        response,
                        attempts: attempt,
                    });
                }
                format!("status {}", response.status)
            }
            Ok(response) => {
                warn!(status = response.status, "API request rejected");
                return Err(RetryFailure::Rejected(response));
            }
            Err(error) => {
                if attempt >= max_attempts {
                    warn!(error = %error, attempts = attempt, "API request failed after retries");
                    return Err(RetryFailure::Transport {
                        error,
                        attempts: attempt,
                    });
                }
                error.to_string()
            }
        };

        let backoff = policy.delay_for(attempt);
        warn!(
            reason = %reason,
            attempt,
            max_attempts,
            backoff_ms = backoff.as_millis() as u64,
            "API request failed, retrying"
        );
        tokio::time::sleep(backoff).await;
    }
}
