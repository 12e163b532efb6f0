use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid fetch configuration: {0}")]
    InvalidConfig(String),

    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Too many redirects: {0}")]
    Redirect(String),

    #[error("HTTP request failed: {0}")]
    Request(reqwest::Error),
}

impl FetchError {
    /// True when the caller handed us something unusable, as opposed to the
    /// remote end failing.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, FetchError::InvalidUrl(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connect(err.to_string())
        } else if err.is_redirect() {
            FetchError::Redirect(err.to_string())
        } else if err.is_builder() {
            FetchError::InvalidUrl(err.to_string())
        } else {
            FetchError::Request(err)
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
