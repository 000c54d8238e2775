//! Title-summarization client
//!
//! A chat can ask a fixed external endpoint to summarize itself into a
//! short title. The endpoint speaks the OpenAI-compatible chat-completions
//! protocol; this module holds the capability trait the chat entity is
//! handed, plus the reqwest-backed implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProviderError, Result};
use crate::types::OpenRouterMessage;

/// Environment variable holding the summarization endpoint credential.
pub const TOKEN_ENV_VAR: &str = "AKASH_TOKEN";

const DEFAULT_BASE_URL: &str = "https://chatapi.akash.network/api/v1";

/// A non-streaming completion request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompletionRequest {
    pub stream: bool,
    pub model: String,
    pub temperature: f64,
    pub top_p: f64,
    pub messages: Vec<OpenRouterMessage>,
}

/// Capability to run one chat completion.
///
/// The chat entity takes this as an injected dependency so its title
/// logic (prompt construction, response handling) is testable without a
/// network boundary.
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    /// Run the request to completion and return the first completion's
    /// message content, or `None` when the provider produced no content.
    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>>;
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<Value>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for the fixed title-summarization endpoint.
pub struct TitleClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl TitleClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Build a client from the `AKASH_TOKEN` environment variable.
    ///
    /// Returns `None` when the credential is absent: title generation is
    /// an optional enhancement, so a missing credential disables the
    /// feature rather than failing.
    pub fn from_env() -> Option<Self> {
        std::env::var(TOKEN_ENV_VAR).ok().map(Self::new)
    }
}

#[async_trait]
impl ChatCompleter for TitleClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.token))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("completion request failed with {status}: {body}");
            return Err(ProviderError::Status {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        let body: CompletionResponse = response.json().await?;
        if let Some(error) = body.error {
            let message = error
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(ProviderError::Api(message));
        }

        Ok(body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content))
    }
}
