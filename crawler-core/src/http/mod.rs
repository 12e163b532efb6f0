//! Outbound HTTP: the fetcher trait, its reqwest-backed implementation and
//! the configuration that drives it.
//!
//! All page fetches should go through [`HttpClient`] so the server and tests
//! can swap in [`MockClient`].

mod charset;
mod client;
mod config;

pub use charset::decode_body;
pub use client::{BrowserClient, BrowserClientBuilder, HttpClient, MockClient, MockResponse};
pub use config::{
    FetchConfig, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_MAX_REDIRECTS, DEFAULT_TIMEOUT_MS,
};
