//! HTTP retry helper for the census API.
//!
//! Every request goes through [`fetch_json`], which retries transport
//! failures, error statuses, and undecodable bodies with exponential
//! backoff.
//!
//! ```ignore
//! let page: ObservationsPage =
//!     retry::fetch_json(&policy, || client.get(&url).query(&params)).await?;
//! ```

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::census::FetchError;
use crate::config::CensusApiConfig;

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 400;

/// How many times to try a request and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 act as 1.
    pub max_attempts: u32,
    /// Wait before the first retry; doubles on each further retry.
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff,
        }
    }

    /// Delay before retry number `retry` (1-based).
    #[must_use]
    pub fn delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.initial_backoff.saturating_mul(1u32 << exponent)
    }
}

impl From<&CensusApiConfig> for RetryPolicy {
    fn from(config: &CensusApiConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.initial_backoff_ms),
        )
    }
}

/// Sends a request and decodes the body as `T`, retrying on any failure.
///
/// `build_request` is called once per attempt, since a
/// [`reqwest::RequestBuilder`] is consumed by `send()`.
///
/// # Errors
///
/// Returns [`FetchError::RetriesExhausted`] carrying the last failure once
/// every attempt has failed.
#[allow(clippy::future_not_send)]
pub async fn fetch_json<T, F>(policy: &RetryPolicy, build_request: F) -> Result<T, FetchError>
where
    T: DeserializeOwned,
    F: Fn() -> reqwest::RequestBuilder,
{
    let attempts = policy.max_attempts.max(1);
    let mut last_error: Option<FetchError> = None;

    for attempt in 1..=attempts {
        if attempt > 1 {
            let delay = policy.delay(attempt - 1);
            log::warn!("  retry {}/{} in {delay:?}...", attempt - 1, attempts - 1);
            tokio::time::sleep(delay).await;
        }

        match attempt_json(&build_request).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                log::warn!("  attempt {attempt}/{attempts} failed: {e}");
                last_error = Some(e);
            }
        }
    }

    let message = last_error.map_or_else(|| "no attempt made".to_string(), |e| e.to_string());
    log::error!("Request failed after {attempts} attempts, giving up: {message}");
    Err(FetchError::RetriesExhausted { attempts, message })
}

#[allow(clippy::future_not_send)]
async fn attempt_json<T, F>(build_request: &F) -> Result<T, FetchError>
where
    T: DeserializeOwned,
    F: Fn() -> reqwest::RequestBuilder,
{
    let response = build_request().send().await?;
    let url = response.url().to_string();
    let status = response.status();

    if !status.is_success() {
        return Err(FetchError::Status {
            url,
            status: status.as_u16(),
        });
    }

    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        log::debug!("Body preview from {url}: {}", preview(&text));
        FetchError::Json { url, source: e }
    })
}

/// First [`BODY_PREVIEW_LEN`] bytes of `text`, cut on a char boundary.
fn preview(text: &str) -> &str {
    if text.len() <= BODY_PREVIEW_LEN {
        return text;
    }
    let mut end = BODY_PREVIEW_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
