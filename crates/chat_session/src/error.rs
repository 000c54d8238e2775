//! Chat error types

use chat_core::{MessageId, ValidationError};
use openrouter_client::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// A persisted record failed validated reconstruction.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The slice target id is absent from the message sequence.
    #[error("message `{0}` is not in this chat")]
    NotFound(MessageId),

    /// The summarization endpoint failed during title autogeneration.
    #[error("title generation failed: {0}")]
    Provider(#[from] ProviderError),
}

pub type Result<T> = std::result::Result<T, ChatError>;
