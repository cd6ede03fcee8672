//! Random-user API fetcher

use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::record::RawUserRecord;
use crate::types::JsonValue;
use async_trait::async_trait;
use tracing::debug;

/// Default upstream endpoint
pub const DEFAULT_SOURCE_URL: &str = "https://randomuser.me/api/";

/// A source of raw user records
#[async_trait]
pub trait UserSource: Send + Sync {
    /// Fetch exactly one raw record
    async fn fetch(&self) -> Result<RawUserRecord>;
}

/// Fetches one user per call from a randomuser-style endpoint
///
/// The endpoint must answer a plain GET with `{"results": [ {...}, ... ]}`;
/// the first element is returned.
#[derive(Debug, Clone)]
pub struct RandomUserSource {
    client: HttpClient,
    url: String,
}

impl RandomUserSource {
    /// Create a fetcher for the given endpoint
    pub fn new(client: HttpClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// The endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl UserSource for RandomUserSource {
    async fn fetch(&self) -> Result<RawUserRecord> {
        let body: JsonValue = self.client.get_json(&self.url).await?;
        let record = first_result(body)?;
        debug!(url = %self.url, "Fetched upstream record");
        Ok(record)
    }
}

/// Extract `results[0]` from an upstream response body
pub fn first_result(body: JsonValue) -> Result<RawUserRecord> {
    let JsonValue::Object(mut obj) = body else {
        return Err(Error::malformed("response body is not a JSON object"));
    };

    let results = match obj.remove("results") {
        Some(JsonValue::Array(results)) => results,
        Some(_) => return Err(Error::malformed("'results' is not an array")),
        None => return Err(Error::malformed("response has no 'results' field")),
    };

    match results.into_iter().next() {
        Some(first @ JsonValue::Object(_)) => Ok(RawUserRecord::new(first)),
        Some(_) => Err(Error::malformed("first result is not an object")),
        None => Err(Error::malformed("'results' is empty")),
    }
}
