//! Error types for the vectorization engine.

use thiserror::Error;

/// Errors raised while configuring, fitting or querying a chemical language model.
///
/// None of these are corrected or retried internally.
#[derive(Debug, Error)]
pub enum VectorizerError {
    /// Unsupported algorithm tag or out-of-range hyperparameter.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Empty corpus, misaligned labels or empty vocabulary after selection.
    #[error("fitting error: {0}")]
    Fitting(String),

    /// Operation called in the wrong lifecycle state (e.g. transform before fit).
    #[error("state error: {0}")]
    State(String),
}

impl From<serde_json::Error> for VectorizerError {
    fn from(err: serde_json::Error) -> Self {
        VectorizerError::Configuration(err.to_string())
    }
}

/// Result type for vectorizer operations.
pub type Result<T> = std::result::Result<T, VectorizerError>;
