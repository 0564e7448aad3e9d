//! Error types for cellscope

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while indexing or searching
#[derive(Debug, Error)]
pub enum Error {
    /// Rejected caller input (empty query, zero top-k, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Two embeddings of different lengths were compared
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A provider returned a NaN or infinite component
    #[error("Embedding component {index} is not finite")]
    NonFiniteEmbedding { index: usize },

    /// An embedding or label backend failed
    #[error("Provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    /// Addressing or grid error
    #[error("Core error: {0}")]
    Core(#[from] cellscope_core::Error),

    /// Formula error surfaced outside the analyzer
    #[error("Formula error: {0}")]
    Formula(#[from] cellscope_formula::FormulaError),
}

impl Error {
    /// Create a validation error with a message
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Error::Validation(msg.into())
    }

    /// Create a provider error
    pub fn provider<P: Into<String>, S: Into<String>>(provider: P, message: S) -> Self {
        Error::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}
