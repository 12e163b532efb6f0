pub mod envelope;
pub mod error;
pub mod fetch;
pub mod http;
pub mod types;

pub use envelope::{codes, Envelope};
pub use error::{ConfigError, FetchError};
pub use fetch::fetch_html;
pub use http::{
    BrowserClient, BrowserClientBuilder, FetchConfig, HttpClient, MockClient, MockResponse,
};
pub use types::{CrawlData, CrawlRequest, CrawlResponse};
