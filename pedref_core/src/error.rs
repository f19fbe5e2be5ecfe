//! Error types for the pedref_core library.

use crate::types::{Dimension, FormulaId};
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for pedref_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A catalog range string that failed to parse into a Bound
    #[error("Malformed range spec: {0}")]
    MalformedRangeSpec(String),

    /// A formula was invoked without the input dimension it requires
    #[error("Formula {formula:?} requires a {dimension:?} input")]
    MissingDimension {
        formula: FormulaId,
        dimension: Dimension,
    },

    /// A resolution call named a record id the catalog does not contain
    #[error("Unknown {collection} record: {id}")]
    UnknownRecord { collection: String, id: String },

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Store-layer error (caught at the store boundary and converted
    /// into soft-failure return values; never reaches resolution callers)
    #[error("Store error: {0}")]
    Store(String),
}
