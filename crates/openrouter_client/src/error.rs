//! Provider error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status} {status_text}")]
    Status { status: u16, status_text: String },

    #[error("provider error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;
