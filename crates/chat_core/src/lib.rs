//! chat_core - Core types for the chat system
//!
//! This crate provides the foundational types used across all chat-related crates:
//! - `message` - Message entity with validated reconstruction from untyped records
//! - `macros` - Text-macro expansion applied to outgoing message content
//! - `error` - Structured validation errors

pub mod error;
pub mod macros;
pub mod message;

// Re-export commonly used types
pub use error::ValidationError;
pub use message::{Message, MessageId, Role};
