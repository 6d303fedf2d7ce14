//! Error types for Mathilda.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MathildaError {
    #[error("Search provider error: {0}")]
    SearchProvider(String),

    #[error("Generation provider error: {0}")]
    GenerationProvider(String),

    #[error("Knowledge index error: {0}")]
    Index(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Feedback store error: {0}")]
    FeedbackStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
