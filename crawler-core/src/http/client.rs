//! HTTP client trait and implementations.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, COOKIE};
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::error::FetchError;

use super::charset::decode_body;
use super::config::FetchConfig;

/// Trait for HTTP clients, enabling mockability in tests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetch a page and return its body as UTF-8 text.
    ///
    /// Only a final `200 OK` counts as success.
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError>;
}

/// Builder for [`BrowserClient`].
#[derive(Debug, Clone, Default)]
pub struct BrowserClientBuilder {
    config: FetchConfig,
}

impl BrowserClientBuilder {
    /// Start from the default browser profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: FetchConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the total request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Set how many redirects to follow. 0 disables following.
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.config = self.config.max_redirects(max);
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Build the client. Fails if a configured header or cookie is not a
    /// valid HTTP header, or if either timeout is zero.
    pub fn build(self) -> Result<BrowserClient, FetchError> {
        if self.config.timeout_ms == 0 {
            return Err(FetchError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if self.config.connect_timeout_ms == 0 {
            return Err(FetchError::InvalidConfig(
                "connect timeout must be greater than zero".to_string(),
            ));
        }

        let headers = default_headers(&self.config)?;

        let redirect = if self.config.max_redirects == 0 {
            Policy::none()
        } else {
            Policy::limited(self.config.max_redirects)
        };

        let inner = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(self.config.timeout_duration())
            .connect_timeout(self.config.connect_timeout_duration())
            .redirect(redirect)
            .build()
            .map_err(|e| FetchError::InvalidConfig(e.to_string()))?;

        Ok(BrowserClient {
            inner,
            config: self.config,
        })
    }
}

fn default_headers(config: &FetchConfig) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| FetchError::InvalidConfig(format!("header name {:?}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| FetchError::InvalidConfig(format!("header {}: {}", name, e)))?;
        headers.insert(name, value);
    }
    if let Some(cookie) = config.cookie_header() {
        let value = HeaderValue::from_str(&cookie)
            .map_err(|e| FetchError::InvalidConfig(format!("cookie: {}", e)))?;
        headers.insert(COOKIE, value);
    }
    Ok(headers)
}

/// Parse a target URL, accepting only http and https.
fn parse_target_url(url: &str) -> Result<reqwest::Url, FetchError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(FetchError::InvalidUrl(format!(
            "unsupported scheme: {}",
            parsed.scheme()
        )));
    }
    Ok(parsed)
}

/// Production client: one GET per call, sent with the configured browser
/// headers and cookies.
#[derive(Debug, Clone)]
pub struct BrowserClient {
    /// Cloning shares the connection pool.
    inner: reqwest::Client,
    config: FetchConfig,
}

impl BrowserClient {
    /// Build a client from the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        Self::builder().config(config).build()
    }

    /// Start building a client from the default browser profile.
    pub fn builder() -> BrowserClientBuilder {
        BrowserClientBuilder::new()
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let parsed = parse_target_url(url)?;
        let response = self.inner.get(parsed).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes = response.bytes().await?;
        Ok(decode_body(&bytes, content_type.as_deref()))
    }
}

#[async_trait]
impl HttpClient for BrowserClient {
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let start = Instant::now();
        let result = self.fetch(url).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(html) => {
                tracing::info!(url, elapsed_ms, bytes = html.len(), "fetch succeeded");
            }
            Err(e) => {
                tracing::warn!(url, elapsed_ms, error = %e, "fetch failed");
            }
        }
        result
    }
}

/// Mock response for testing.
#[derive(Clone, Debug)]
pub enum MockResponse {
    Html(String),
    Status(u16),
    Timeout,
}

/// Mock HTTP client for testing. Validates URLs the same way
/// [`BrowserClient`] does before looking up a canned response.
#[derive(Default)]
pub struct MockClient {
    responses: HashMap<String, MockResponse>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a response for a URL.
    pub fn with_response(mut self, url: &str, response: MockResponse) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    pub fn with_html(self, url: &str, html: &str) -> Self {
        self.with_response(url, MockResponse::Html(html.to_string()))
    }

    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.with_response(url, MockResponse::Status(status))
    }
}

#[async_trait]
impl HttpClient for MockClient {
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        parse_target_url(url)?;
        match self.responses.get(url) {
            Some(MockResponse::Html(html)) => Ok(html.clone()),
            Some(MockResponse::Status(code)) => Err(FetchError::Status(*code)),
            Some(MockResponse::Timeout) => Err(FetchError::Timeout),
            None => Err(FetchError::Connect(format!("no mock response for {}", url))),
        }
    }
}
