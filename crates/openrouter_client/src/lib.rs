//! openrouter_client - Provider wire types and the title-summarization client
//!
//! This crate defines the request shapes a completion provider consumes
//! (`OpenRouterMessage`, `OpenRouterConfig`), the `ChatCompleter` capability
//! used by the chat entity to reach a completion endpoint, and a
//! reqwest-backed implementation against the fixed summarization endpoint
//! used for chat title autogeneration.

pub mod error;
pub mod title;
pub mod types;

pub use error::{ProviderError, Result};
pub use title::{ChatCompleter, CompletionRequest, TitleClient, TOKEN_ENV_VAR};
pub use types::{ContentPart, OpenRouterConfig, OpenRouterContent, OpenRouterMessage};
