//! Source fetcher module
//!
//! Pulls one raw user record from the upstream HTTP API per call.

mod fetcher;

pub use fetcher::{first_result, RandomUserSource, UserSource, DEFAULT_SOURCE_URL};

#[cfg(test)]
mod tests;
