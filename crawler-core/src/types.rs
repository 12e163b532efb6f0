use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::envelope::Envelope;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CrawlRequest {
    /// Page to fetch
    pub url: String,
    /// Accepted for compatibility with older callers; has no effect.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub force_browser: bool,
}

impl CrawlRequest {
    /// Request for `url` with no extra options.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            force_browser: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CrawlData {
    pub url: String,
    pub html: String,
}

pub type CrawlResponse = Envelope<CrawlData>;
