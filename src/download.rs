use std::time::Duration;

use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::warn;

/// Wikimedia rejects the default reqwest user-agent.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) FlagScraper/1.0";

pub const PAGE_TIMEOUT: Duration = Duration::from_secs(30);
pub const IMAGE_TIMEOUT: Duration = Duration::from_secs(15);
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("still rate limited after {0} attempts")]
    RateLimited(u32),
    #[error("HTTP {0}")]
    Http(StatusCode),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Retry budget for one source's downloads. Only HTTP 429 is retried: the
/// server asking us to slow down is recoverable, a broken request is not.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff_base: Duration::from_secs(2),
        }
    }

    /// Delay after the zero-based `attempt`-th 429: base, 2×base, 4×base, …
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base * 2u32.pow(attempt)
    }
}

pub fn client() -> reqwest::Result<Client> {
    Client::builder().user_agent(USER_AGENT).build()
}

/// Fetch a URL's body as text, without retry. Used for the source pages
/// themselves, where failure aborts the whole run.
pub async fn fetch_text(client: &Client, url: &str) -> Result<String, FetchError> {
    let resp = client
        .get(url)
        .timeout(PAGE_TIMEOUT)
        .send()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Http(status));
    }
    resp.text()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))
}

/// Download a URL's bytes under `policy`. 429 sleeps an exponentially growing
/// delay and retries; any other HTTP error or transport failure aborts at
/// once.
pub async fn fetch_bytes(
    client: &Client,
    url: &str,
    policy: RetryPolicy,
) -> Result<Vec<u8>, FetchError> {
    for attempt in 0..policy.max_attempts {
        let resp = client
            .get(url)
            .timeout(IMAGE_TIMEOUT)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = resp.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            if attempt + 1 == policy.max_attempts {
                break;
            }
            let wait = policy.backoff(attempt);
            warn!(
                "Rate limited (attempt {}/{}), backing off {:.0}s",
                attempt + 1,
                policy.max_attempts,
                wait.as_secs_f64()
            );
            tokio::time::sleep(wait).await;
            continue;
        }
        if !status.is_success() {
            return Err(FetchError::Http(status));
        }
        let body = resp
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        return Ok(body.to_vec());
    }
    Err(FetchError::RateLimited(policy.max_attempts))
}
