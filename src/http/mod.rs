//! HTTP client module
//!
//! Provides the HTTP client used by the source fetcher.
//!
//! # Features
//!
//! - **Timeouts**: Per-client request timeout
//! - **Default headers**: Applied to every request
//! - **Error classification**: Every failure surfaces as `UpstreamUnavailable`

mod client;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder};

#[cfg(test)]
mod tests;
