//! Error types for the filtering pipeline

use thiserror::Error;

/// Pipeline errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Format(#[from] lensprep_formats::Error),

    #[error(transparent)]
    Filter(#[from] lensprep_filters::Error),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;
