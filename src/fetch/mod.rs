//! The feed-source boundary: an [`HttpClient`] seam, a plain reqwest
//! implementation, an API-key decorator, and byte fetching with bounded
//! retry.

mod basic;
pub mod auth;

pub use basic::BasicClient;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::warn;

use crate::error::FeedError;

/// Upper bound on one HTTP request; a fetch in flight at shutdown is
/// abandoned and dies within this.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Total attempts per [`fetch_bytes`] call.
const FETCH_ATTEMPTS: u32 = 3;

#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response>;
}

/// Fetches the raw feed bytes at `url`, retrying transport failures up to
/// [`FETCH_ATTEMPTS`] times with a short jittered delay. Non-success HTTP
/// statuses count as transport failures.
pub async fn fetch_bytes<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
) -> Result<Bytes, FeedError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match fetch_once(client, url).await {
            Ok(bytes) => return Ok(bytes),
            Err(err) if err.is_fetch() && attempt < FETCH_ATTEMPTS => {
                warn!(attempt, error = %err, "Feed fetch failed, retrying");
                tokio::time::sleep(retry_delay(attempt)).await;
            }
            Err(err) => return Err(err),
        }
    }
}

async fn fetch_once<C: HttpClient + ?Sized>(client: &C, url: &str) -> Result<Bytes, FeedError> {
    let parsed = url
        .parse()
        .map_err(|e| FeedError::FetchMessage(format!("invalid url {url}: {e}")))?;

    let mut req = reqwest::Request::new(reqwest::Method::GET, parsed);
    *req.timeout_mut() = Some(REQUEST_TIMEOUT);

    let resp = client.execute(req).await?;
    if !resp.status().is_success() {
        return Err(FeedError::FetchMessage(format!("HTTP {}", resp.status())));
    }

    Ok(resp.bytes().await?)
}

/// Backoff grows with the attempt number; the jitter comes from the
/// subsecond clock value, which spreads simultaneous retries well enough.
fn retry_delay(attempt: u32) -> Duration {
    let jitter_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::from(d.subsec_millis()) % 250)
        .unwrap_or(0);
    Duration::from_millis(500 * u64::from(attempt) + jitter_ms)
}
