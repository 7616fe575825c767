//! Configuration errors raised while widgets are initialized.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("query facet '{field}' has no queries configured")]
    MissingFacetQueries { field: String },

    #[error("widget '{id}' has an invalid {option} pattern: {message}")]
    InvalidPattern {
        id: String,
        option: &'static str,
        message: String,
    },
}
