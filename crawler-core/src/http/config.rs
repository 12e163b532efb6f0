//! Outbound request configuration: header set, cookie jar, timeouts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Default total request timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

/// Same limit reqwest applies with its default redirect policy.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

const DEFAULT_HEADERS: &[(&str, &str)] = &[
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7",
    ),
    (
        "Accept-Language",
        "zh,en-US;q=0.9,en;q=0.8,zh-CN;q=0.7,zh-TW;q=0.6",
    ),
    ("If-None-Match", "W/\"e46d30f5935a4ed8b7f346d093b32fd8\""),
    ("Sec-Fetch-Dest", "document"),
    ("Sec-Fetch-Mode", "navigate"),
    ("Sec-Fetch-Site", "none"),
    ("Sec-Fetch-User", "?1"),
    ("Upgrade-Insecure-Requests", "1"),
    (
        "User-Agent",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36",
    ),
    ("channel", "local"),
    (
        "sec-ch-ua",
        "\"Chromium\";v=\"142\", \"Google Chrome\";v=\"142\", \"Not_A Brand\";v=\"99\"",
    ),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", "\"macOS\""),
];

const DEFAULT_COOKIES: &[(&str, &str)] = &[
    ("_ga", "GA1.1.371080025.1728356883"),
    ("_c_WBKFRo", "l9lxL8bgxh8LBycHjH44gRiG24B97xs330NCIcu2"),
    (
        "sensorsdata2015jssdkcross",
        "%7B%22distinct_id%22%3A%22cbba116dd08a48238a674e7ce3350637%22%2C%22first_id%22%3A%221926a1911d01d5e-0592b796ee5f188-16525637-1484784-1926a1911d12467%22%2C%22props%22%3A%7B%22%24latest_traffic_source_type%22%3A%22%E7%9B%B4%E6%8E%A5%E6%B5%81%E9%87%8F%22%2C%22%24latest_search_keyword%22%3A%22%E6%9C%AA%E5%8F%96%E5%88%B0%E5%80%BC_%E7%9B%B4%E6%8E%A5%E6%89%93%E5%BC%80%22%2C%22%24latest_referrer%22%3A%22%22%7D%2C%22identities%22%3A%22eyIkaWRlbnRpdHlfY29va2llX2lkIjoiMTkyNmExOTExZDAxZDVlLTA1OTJiNzk2ZWU1ZjE4OC0xNjUyNTYzNy0xNDg0Nzg0LTE5MjZhMTkxMWQxMjQ2NyIsIiRpZGVudGl0eV9sb2dpbl9pZCI6ImNiYmExMTZkZDA4YTQ4MjM4YTY3NGU3Y2UzMzUwNjM3In0%3D%22%2C%22history_login_id%22%3A%7B%22name%22%3A%22%24identity_login_id%22%2C%22value%22%3A%22cbba116dd08a48238a674e7ce3350637%22%7D%2C%22%24device_id%22%3A%221926a1911d01d5e-0592b796ee5f188-16525637-1484784-1926a1911d12467%22%7D",
    ),
    ("_ga_QZXRQK8759", "GS2.1.s1753779436$o3$g0$t1753779439$j57$l0$h0"),
    ("_ga_5DW4TZD93L", "GS2.1.s1753779442$o1$g1$t1753779453$j49$l0$h0"),
    ("ahoy_visitor", "ac6ccb70-932d-4b50-bac2-aa30d3d3e262"),
    ("_ga_R78HWX068N", "GS2.1.s1763027025$o21$g0$t1763027025$j60$l0$h0"),
];

/// Headers, cookies and limits applied to every outbound fetch.
///
/// Loadable from JSON; any field left out falls back to [`FetchConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub headers: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
    /// Total time allowed for one fetch, in milliseconds. Must be nonzero.
    pub timeout_ms: u64,
    /// Time allowed to establish the connection, in milliseconds. Must be nonzero.
    pub connect_timeout_ms: u64,
    /// 0 disables redirect following.
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            headers: to_map(DEFAULT_HEADERS),
            cookies: to_map(DEFAULT_COOKIES),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl FetchConfig {
    /// A config with no headers or cookies, keeping the default limits.
    pub fn empty() -> Self {
        Self {
            headers: BTreeMap::new(),
            cookies: BTreeMap::new(),
            ..Self::default()
        }
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    /// Add or replace a request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add or replace a cookie sent in the `Cookie` header.
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Set the total request timeout. Kept at millisecond precision;
    /// anything finer is rounded up so a nonzero duration stays nonzero.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = duration_to_ms(timeout);
        self
    }

    /// Set the connect timeout, with the same rounding as [`FetchConfig::timeout`].
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = duration_to_ms(timeout);
        self
    }

    /// Set how many redirects to follow. 0 disables following.
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    /// The total request timeout as a [`Duration`].
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The connect timeout as a [`Duration`].
    pub fn connect_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Render the cookie map as a single `Cookie` header value.
    /// None when there are no cookies to send.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let joined = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ");
        Some(joined)
    }
}

fn duration_to_ms(duration: Duration) -> u64 {
    let micros = duration.as_micros();
    u64::try_from(micros.div_ceil(1000)).unwrap_or(u64::MAX)
}

fn to_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_carries_browser_identity() {
        let config = FetchConfig::default();
        assert!(config.headers["User-Agent"].starts_with("Mozilla/5.0"));
        assert_eq!(config.headers["channel"], "local");
        assert_eq!(config.cookies.len(), 7);
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn cookie_header_is_sorted_and_joined() {
        let config = FetchConfig::empty().cookie("b", "2").cookie("a", "1");
        assert_eq!(config.cookie_header().as_deref(), Some("a=1; b=2"));
    }

    #[test]
    fn cookie_header_none_when_empty() {
        assert_eq!(FetchConfig::empty().cookie_header(), None);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"timeout_ms": 5000, "cookies": {{}}}}"#).unwrap();

        let config = FetchConfig::from_file(file.path()).unwrap();
        assert_eq!(config.timeout_duration(), Duration::from_secs(5));
        assert!(config.cookies.is_empty());
        assert_eq!(config.headers, FetchConfig::default().headers);
        assert_eq!(config.max_redirects, DEFAULT_MAX_REDIRECTS);
    }

    #[test]
    fn sub_second_timeout_keeps_its_precision() {
        let config = FetchConfig::empty().timeout(Duration::from_millis(500));
        assert_eq!(config.timeout_ms, 500);
        assert_eq!(config.timeout_duration(), Duration::from_millis(500));
    }

    #[test]
    fn tiny_timeout_rounds_up_instead_of_to_zero() {
        let config = FetchConfig::empty()
            .timeout(Duration::from_micros(1))
            .connect_timeout(Duration::from_nanos(1));
        assert_eq!(config.timeout_ms, 1);
        assert_eq!(config.connect_timeout_ms, 1);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = FetchConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = FetchConfig::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
