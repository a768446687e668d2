//! Error types shared across the crate.
//!
//! ERROR HANDLING
//! ==============
//! None of these errors are allowed to reach the page. Store failures are
//! logged where they happen and the affected checkbox falls back to
//! unchecked; config failures fall back to [`crate::config::PageConfig`]
//! defaults.

/// Failures from the item or scalar stores.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be opened (disabled, blocked, quota, version).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A single request against an open store failed.
    #[error("store request failed: {0}")]
    Request(String),

    /// A persisted value did not decode into the expected record shape.
    #[error("malformed record: {0}")]
    Malformed(String),
}

/// Failures while loading [`crate::config::PageConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The raw config text was not valid JSON for the config shape.
    #[error("config parse failed: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field parsed but holds an unusable value.
    #[error("invalid config field {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
