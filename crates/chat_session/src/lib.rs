//! chat_session - The chat aggregate
//!
//! This crate owns the in-memory representation of one conversation:
//! - `chat` - the Chat entity: identity, message log, slicing, reconstruction
//! - `settings` - per-chat provider configuration
//! - `head` - the read-only listing projection
//! - `error` - the three error kinds a chat operation can produce
//!
//! All operations except title autogeneration are synchronous. The design
//! assumes single-writer access to a given chat; slicing hands out a deep
//! independent copy so a truncated view can outlive later mutation of the
//! live chat.

pub mod chat;
pub mod error;
pub mod head;
pub mod settings;

// Re-export commonly used types
pub use chat::{Chat, ChatId, CHAT_ID_PREFIX};
pub use error::{ChatError, Result};
pub use head::ChatHead;
pub use settings::{ChatColor, ChatProvider, ChatSettings};
