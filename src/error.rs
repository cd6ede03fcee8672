//! Error types for userflow
//!
//! This module defines the error hierarchy for the whole pipeline.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for userflow
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Source Errors
    // ============================================================================
    #[error("Upstream unavailable: {message}")]
    UpstreamUnavailable { message: String },

    #[error("Malformed upstream data: {message}")]
    MalformedUpstreamData { message: String },

    #[error("Missing required field: {key}")]
    MissingField { key: String },

    // ============================================================================
    // Broker Errors
    // ============================================================================
    #[error("Broker unavailable: {message}")]
    BrokerUnavailable { message: String },

    #[error("Schema mismatch: {message}")]
    SchemaMismatch { message: String },

    // ============================================================================
    // Storage Errors
    // ============================================================================
    #[error("Storage unavailable: {message}")]
    StorageUnavailable { message: String },

    #[error("Checkpoint failed: {message}")]
    Checkpoint { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an upstream unavailable error
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            message: message.into(),
        }
    }

    /// Create a malformed upstream data error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedUpstreamData {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(key: impl Into<String>) -> Self {
        Self::MissingField { key: key.into() }
    }

    /// Create a broker error
    pub fn broker(message: impl Into<String>) -> Self {
        Self::BrokerUnavailable {
            message: message.into(),
        }
    }

    /// Create a schema mismatch error
    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
        }
    }

    /// Create a checkpoint error
    pub fn checkpoint(message: impl Into<String>) -> Self {
        Self::Checkpoint {
            message: message.into(),
        }
    }

    /// Short, stable name of the error variant, used for dead letters and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config { .. } | Error::InvalidConfigValue { .. } => "config",
            Error::YamlParse(_) | Error::JsonParse(_) => "parse",
            Error::InvalidUrl(_) => "invalid_url",
            Error::UpstreamUnavailable { .. } => "upstream_unavailable",
            Error::MalformedUpstreamData { .. } => "malformed_upstream_data",
            Error::MissingField { .. } => "missing_field",
            Error::BrokerUnavailable { .. } => "broker_unavailable",
            Error::SchemaMismatch { .. } => "schema_mismatch",
            Error::StorageUnavailable { .. } => "storage_unavailable",
            Error::Checkpoint { .. } => "checkpoint",
            Error::Io(_) => "io",
            Error::Other(_) => "other",
        }
    }

    /// Check if this error is transient
    ///
    /// Nothing in the pipeline retries internally; callers (an external
    /// scheduler, a restart policy) use this to decide whether to re-run.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::UpstreamUnavailable { .. }
                | Error::BrokerUnavailable { .. }
                | Error::StorageUnavailable { .. }
                | Error::Io(_)
        )
    }

    /// Check if this error is a per-record data problem
    pub fn is_invalid_data(&self) -> bool {
        matches!(
            self,
            Error::SchemaMismatch { .. }
                | Error::MissingField { .. }
                | Error::MalformedUpstreamData { .. }
        )
    }
}

/// Result type alias for userflow
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("location.city");
        assert_eq!(err.to_string(), "Missing required field: location.city");

        let err = Error::schema_mismatch("missing field `email`");
        assert_eq!(err.to_string(), "Schema mismatch: missing field `email`");
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::upstream("connection refused").is_retryable());
        assert!(Error::broker("all brokers down").is_retryable());
        assert!(Error::storage("database locked").is_retryable());

        assert!(!Error::missing_field("email").is_retryable());
        assert!(!Error::schema_mismatch("bad").is_retryable());
        assert!(!Error::config("test").is_retryable());
    }

    #[test]
    fn test_is_invalid_data() {
        assert!(Error::schema_mismatch("bad").is_invalid_data());
        assert!(Error::missing_field("phone").is_invalid_data());
        assert!(!Error::storage("down").is_invalid_data());
    }

    #[test]
    fn test_kind() {
        assert_eq!(Error::schema_mismatch("x").kind(), "schema_mismatch");
        assert_eq!(Error::storage("x").kind(), "storage_unavailable");
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
