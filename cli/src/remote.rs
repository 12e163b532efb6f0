//! Client for a running crawler server.

use anyhow::{bail, Context, Result};
use crawler_core::{CrawlData, CrawlRequest, CrawlResponse};
use std::time::Duration;

/// Upper bound on a full round trip through the server, which itself waits on
/// the origin.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Ask the server at `server` to fetch `url`.
///
/// A nonzero envelope code is reported as an error carrying the server's
/// message.
pub async fn crawl(server: &str, url: &str, force_browser: bool) -> Result<CrawlData> {
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")?;

    let request = CrawlRequest {
        force_browser,
        ..CrawlRequest::new(url)
    };
    let endpoint = format!("{}/crawl", server.trim_end_matches('/'));
    tracing::debug!(endpoint = %endpoint, url, "sending crawl request");

    let response = client
        .post(&endpoint)
        .json(&request)
        .send()
        .await
        .with_context(|| format!("Failed to reach {}", endpoint))?;

    let status = response.status();
    if !status.is_success() {
        bail!("Server returned HTTP {}", status);
    }

    let envelope: CrawlResponse = response
        .json()
        .await
        .context("Server returned a malformed envelope")?;

    match envelope.into_result() {
        Ok(data) => Ok(data),
        Err((code, msg)) => bail!("Crawl failed (code {}): {}", code, msg),
    }
}
