//! Convenience function for one-off fetches.
//!
//! Builds a [`BrowserClient`] with the default configuration per call. Long
//! running callers should build one client and reuse it.

use crate::error::FetchError;
use crate::http::{BrowserClient, FetchConfig, HttpClient};

/// Fetch a page with the default browser headers and cookies.
pub async fn fetch_html(url: &str) -> Result<String, FetchError> {
    let client = BrowserClient::new(FetchConfig::default())?;
    client.fetch_html(url).await
}
