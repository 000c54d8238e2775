//! The Chat entity

use chat_core::{macros, Message, MessageId, ValidationError};
use chrono::Utc;
use openrouter_client::{
    ChatCompleter, CompletionRequest, OpenRouterConfig, OpenRouterMessage,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ChatError, Result};
use crate::head::ChatHead;
use crate::settings::{is_valid_model_id, ChatSettings};

/// Identifier of a chat. Carries the `chat_` prefix.
pub type ChatId = String;

/// Prefix carried by every chat identifier. Doubles as a provenance tag
/// when reconstructing a chat from a persisted record.
pub const CHAT_ID_PREFIX: &str = "chat_";

// Approximate token count based on average token length of 3.51 characters.
const AVG_TOKEN_CHARS: f64 = 3.51;

const SNIPPET_CHARS: usize = 150;

const TITLE_PROMPT: &str = "Summarise the following conversation in a short title \
(between two and four words). Respond only with the title. Do not use formatting.";
const TITLE_MODEL: &str = "Meta-Llama-4-Maverick-17B-128E-Instruct-FP8";
const TITLE_TEMPERATURE: f64 = 0.25;
const TITLE_TOP_P: f64 = 0.9;

/// The aggregate representing one conversation.
///
/// `history` is the append-only sequence of message ids that have ever
/// belonged to this chat. It is deliberately not truncated when `messages`
/// is truncated by [`Chat::slice`]: it records provenance, not the active
/// message window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: ChatId,
    pub name: String,
    pub history: Vec<MessageId>,
    pub messages: Vec<Message>,
    pub temporary: bool,
    pub can_autogenerate_title: bool,
    pub settings: ChatSettings,
}

/// The fully-validated field set a chat is assembled from.
///
/// Reconstruction paths build one of these instead of going through a
/// default-initialized entity; every field must be supplied.
struct ChatParts {
    id: ChatId,
    name: String,
    history: Vec<MessageId>,
    messages: Vec<Message>,
    temporary: bool,
    can_autogenerate_title: bool,
    settings: ChatSettings,
}

impl Chat {
    /// Create a new conversation with a fresh time-based identifier.
    ///
    /// Uniqueness is millisecond-granular; two chats created in the same
    /// instant collide. The owning store is expected to create chats far
    /// less often than that.
    pub fn new(name: impl Into<String>, messages: Vec<Message>) -> Self {
        let history = messages.iter().map(|m| m.id.clone()).collect();
        Self {
            id: format!("{}{}", CHAT_ID_PREFIX, Utc::now().timestamp_millis()),
            name: name.into(),
            history,
            messages,
            temporary: false,
            can_autogenerate_title: true,
            settings: ChatSettings::default(),
        }
    }

    fn from_parts(parts: ChatParts) -> Self {
        Self {
            id: parts.id,
            name: parts.name,
            history: parts.history,
            messages: parts.messages,
            temporary: parts.temporary,
            can_autogenerate_title: parts.can_autogenerate_title,
            settings: parts.settings,
        }
    }

    /// Append a message to the conversation.
    ///
    /// The message id is also recorded in `history`, which only ever grows.
    pub fn push_message(&mut self, message: Message) {
        self.history.push(message.id.clone());
        self.messages.push(message);
    }

    /// Replace the settings wholesale.
    pub fn set_settings(&mut self, settings: ChatSettings) {
        self.settings = settings;
    }

    /// Compute the listing projection for this chat.
    pub fn head(&self) -> ChatHead {
        let total_chars: usize = self.messages.iter().map(|m| m.text.chars().count()).sum();
        ChatHead {
            id: self.id.clone(),
            name: self.name.clone(),
            message_count: self.messages.len(),
            last_message_snippet: self
                .messages
                .last()
                .map(|m| m.text.chars().take(SNIPPET_CHARS).collect()),
            color: self.settings.color,
            temporary: self.temporary,
            token_count: (total_chars as f64 / AVG_TOKEN_CHARS).floor() as u64,
        }
    }

    /// Produce an independent copy of this chat truncated strictly before
    /// the message with id `until`.
    ///
    /// The receiver is never mutated, and the returned chat shares no
    /// mutable state with it. `history` is copied in full: only the active
    /// message window shrinks. Fails with [`ChatError::NotFound`] when
    /// `until` does not appear among `messages`, even if it appears in
    /// `history`.
    pub fn slice(&self, until: &str) -> Result<Chat> {
        let index = self
            .messages
            .iter()
            .position(|m| m.id == until)
            .ok_or_else(|| ChatError::NotFound(until.to_string()))?;
        Ok(Chat::from_parts(ChatParts {
            id: self.id.clone(),
            name: self.name.clone(),
            history: self.history.clone(),
            messages: self.messages[..index].to_vec(),
            temporary: self.temporary,
            can_autogenerate_title: self.can_autogenerate_title,
            settings: self.settings.clone(),
        }))
    }

    /// Reconstruct a chat from an untyped persisted record.
    ///
    /// Field-level violations are collected into a single validation
    /// error. Message elements are reconstructed through
    /// [`Message::from_value`] and the first failure is propagated
    /// unchanged; there is no partial reconstruction.
    pub fn from_value(value: &Value) -> Result<Chat> {
        let record = value
            .as_object()
            .ok_or_else(|| ValidationError::single("chat record is not an object"))?;

        let mut violations = Vec::new();

        let id = match record.get("id") {
            None => {
                violations.push("missing field `id`".to_string());
                None
            }
            Some(v) => match v.as_str() {
                None => {
                    violations.push("field `id` is not a string".to_string());
                    None
                }
                Some(id) if !id.starts_with(CHAT_ID_PREFIX) => {
                    violations.push(format!("field `id` does not start with `{CHAT_ID_PREFIX}`"));
                    None
                }
                Some(id) => Some(id.to_string()),
            },
        };

        let name = match record.get("name") {
            None => {
                violations.push("missing field `name`".to_string());
                None
            }
            Some(v) => match v.as_str() {
                None => {
                    violations.push("field `name` is not a string".to_string());
                    None
                }
                Some(name) => Some(name.to_string()),
            },
        };

        let history = match record.get("history") {
            None => {
                violations.push("missing field `history`".to_string());
                None
            }
            Some(v) => match v.as_array() {
                None => {
                    violations.push("field `history` is not a sequence".to_string());
                    None
                }
                Some(entries) => {
                    let mut ids = Vec::with_capacity(entries.len());
                    for (index, entry) in entries.iter().enumerate() {
                        match entry.as_str() {
                            Some(id) => ids.push(id.to_string()),
                            None => violations
                                .push(format!("`history[{index}]` is not a string")),
                        }
                    }
                    Some(ids)
                }
            },
        };

        let message_values = match record.get("messages") {
            None => {
                violations.push("missing field `messages`".to_string());
                None
            }
            Some(v) => match v.as_array() {
                None => {
                    violations.push("field `messages` is not a sequence".to_string());
                    None
                }
                Some(entries) => Some(entries.clone()),
            },
        };

        let settings = match record.get("settings") {
            None => {
                violations.push("missing field `settings`".to_string());
                None
            }
            Some(v) if !v.is_object() => {
                violations.push("field `settings` is not a record".to_string());
                None
            }
            Some(v) => match serde_json::from_value::<ChatSettings>(v.clone()) {
                Err(e) => {
                    violations.push(format!("invalid `settings`: {e}"));
                    None
                }
                Ok(settings) if !is_valid_model_id(&settings.model) => {
                    violations.push(format!(
                        "`settings.model` `{}` does not match `<vendor>/<name>`",
                        settings.model
                    ));
                    None
                }
                Ok(settings) => Some(settings),
            },
        };

        let temporary = match record.get("temporary") {
            None => {
                violations.push("missing field `temporary`".to_string());
                None
            }
            Some(v) => match v.as_bool() {
                None => {
                    violations.push("field `temporary` is not a boolean".to_string());
                    None
                }
                Some(flag) => Some(flag),
            },
        };

        let can_autogenerate_title = match record.get("canAutogenerateTitle") {
            None => {
                violations.push("missing field `canAutogenerateTitle`".to_string());
                None
            }
            Some(v) => match v.as_bool() {
                None => {
                    violations.push("field `canAutogenerateTitle` is not a boolean".to_string());
                    None
                }
                Some(flag) => Some(flag),
            },
        };

        let (id, name, history, message_values, settings, temporary, can_autogenerate_title) =
            match (
                id,
                name,
                history,
                message_values,
                settings,
                temporary,
                can_autogenerate_title,
            ) {
                (Some(a), Some(b), Some(c), Some(d), Some(e), Some(f), Some(g))
                    if violations.is_empty() =>
                {
                    (a, b, c, d, e, f, g)
                }
                _ => return Err(ValidationError::new(violations).into()),
            };

        let messages = message_values
            .iter()
            .map(Message::from_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Chat::from_parts(ChatParts {
            id,
            name,
            history,
            messages,
            temporary,
            can_autogenerate_title,
            settings,
        }))
    }

    /// Project the conversation into the message sequence a completion
    /// provider expects, with macro expansion applied to every
    /// text-bearing leaf.
    ///
    /// When `system` is given, a synthetic system entry is prepended to
    /// the output; the chat itself is never touched.
    pub fn to_provider_messages(&self, system: Option<&str>) -> Vec<OpenRouterMessage> {
        let mut out = Vec::with_capacity(self.messages.len() + 1);
        if let Some(system) = system {
            out.push(OpenRouterMessage::new("system", system));
        }
        for message in &self.messages {
            out.push(OpenRouterMessage::new(message.role.as_str(), message.text.clone()));
        }
        for message in &mut out {
            message.content.map_text(macros::expand);
        }
        out
    }

    /// Build the full request payload for the chat's configured provider.
    pub fn to_openrouter_config(&self) -> OpenRouterConfig {
        OpenRouterConfig {
            model: self.settings.model.clone(),
            temperature: self.settings.temperature,
            top_p: self.settings.top_p,
            messages: self.to_provider_messages(Some(&self.settings.system_prompt)),
        }
    }

    /// Ask the summarization endpoint for a short title for this chat.
    ///
    /// Passing `None` means no credential is configured; the operation
    /// completes with `Ok(None)` without any outbound call. A single
    /// best-effort request is made otherwise: no retry, no explicit
    /// timeout, no cancellation hook.
    pub async fn autogenerate_title<C>(&self, completer: Option<&C>) -> Result<Option<String>>
    where
        C: ChatCompleter + ?Sized,
    {
        let Some(completer) = completer else {
            return Ok(None);
        };

        let transcript = self
            .messages
            .iter()
            .map(|m| format!("# {}\n{}", m.role, m.text))
            .collect::<Vec<_>>()
            .join("\n\n");
        let request = CompletionRequest {
            stream: false,
            model: TITLE_MODEL.to_string(),
            temperature: TITLE_TEMPERATURE,
            top_p: TITLE_TOP_P,
            messages: vec![
                OpenRouterMessage::new("system", TITLE_PROMPT),
                OpenRouterMessage::new("user", transcript),
            ],
        };

        tracing::debug!(chat_id = %self.id, "requesting chat title");
        Ok(completer.complete(&request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_core::Role;
    use openrouter_client::{OpenRouterContent, ProviderError, TitleClient};
    use serde_json::json;
    use std::sync::Mutex;

    fn message(id: &str, role: Role, text: &str) -> Message {
        Message {
            id: id.to_string(),
            role,
            text: text.to_string(),
        }
    }

    fn sample_chat() -> Chat {
        Chat::new(
            "Test chat",
            vec![
                message("msg_1", Role::User, "Hello there, how are you today?"),
                message("msg_2", Role::Assistant, "Very well, thanks."),
                message("msg_3", Role::User, "Glad to hear it."),
            ],
        )
    }

    fn sample_record() -> Value {
        json!({
            "id": "chat_1700000000000",
            "name": "Restored chat",
            "history": ["msg_1", "msg_2"],
            "messages": [
                {"id": "msg_1", "role": "user", "text": "hi"},
                {"id": "msg_2", "role": "assistant", "text": "hello"},
            ],
            "settings": serde_json::to_value(ChatSettings::default()).unwrap(),
            "temporary": false,
            "canAutogenerateTitle": true,
        })
    }

    // ===== Construction =====

    #[test]
    fn test_new_derives_history_from_messages() {
        let chat = sample_chat();
        assert!(chat.id.starts_with(CHAT_ID_PREFIX));
        assert_eq!(chat.history, vec!["msg_1", "msg_2", "msg_3"]);
        assert_eq!(chat.messages.len(), 3);
        assert!(!chat.temporary);
        assert!(chat.can_autogenerate_title);
        assert_eq!(chat.settings, ChatSettings::default());
    }

    #[test]
    fn test_new_with_no_messages() {
        let chat = Chat::new("Empty", vec![]);
        assert!(chat.history.is_empty());
        assert!(chat.messages.is_empty());
    }

    #[test]
    fn test_push_message_grows_history() {
        let mut chat = Chat::new("Empty", vec![]);
        chat.push_message(message("msg_9", Role::User, "hi"));
        assert_eq!(chat.history, vec!["msg_9"]);
        assert_eq!(chat.messages.len(), 1);
    }

    // ===== Head projection =====

    #[test]
    fn test_head_empty_chat() {
        let head = Chat::new("Empty", vec![]).head();
        assert_eq!(head.message_count, 0);
        assert_eq!(head.last_message_snippet, None);
        assert_eq!(head.token_count, 0);
    }

    #[test]
    fn test_head_single_message_scenario() {
        let chat = Chat::new(
            "Greeting",
            vec![message("msg_1", Role::User, "Hello there, how are you today?")],
        );
        let head = chat.head();
        assert_eq!(head.message_count, 1);
        assert_eq!(
            head.last_message_snippet.as_deref(),
            Some("Hello there, how are you today?")
        );
        // 31 characters / 3.51, floored.
        assert_eq!(head.token_count, 8);
    }

    #[test]
    fn test_head_snippet_truncates_at_150_chars() {
        let text = "x".repeat(400);
        let chat = Chat::new("Long", vec![message("msg_1", Role::User, &text)]);
        let snippet = chat.head().last_message_snippet.unwrap();
        assert_eq!(snippet.chars().count(), 150);
        assert_eq!(snippet, "x".repeat(150));
    }

    #[test]
    fn test_head_snippet_counts_chars_not_bytes() {
        let text = "é".repeat(200);
        let chat = Chat::new("Accents", vec![message("msg_1", Role::User, &text)]);
        let snippet = chat.head().last_message_snippet.unwrap();
        assert_eq!(snippet.chars().count(), 150);
    }

    #[test]
    fn test_head_token_count_sums_all_messages() {
        let chat = sample_chat();
        let total: usize = chat.messages.iter().map(|m| m.text.chars().count()).sum();
        assert_eq!(chat.head().token_count, (total as f64 / 3.51).floor() as u64);
    }

    // ===== Slicing =====

    #[test]
    fn test_slice_truncates_before_target() {
        let chat = sample_chat();
        let sliced = chat.slice("msg_2").unwrap();
        assert_eq!(sliced.messages.len(), 1);
        assert_eq!(sliced.messages[0].id, "msg_1");
        assert_eq!(sliced.id, chat.id);
        assert_eq!(sliced.name, chat.name);
        assert_eq!(sliced.settings, chat.settings);
    }

    #[test]
    fn test_slice_keeps_history_untruncated() {
        let chat = sample_chat();
        let sliced = chat.slice("msg_2").unwrap();
        assert_eq!(sliced.history, chat.history);
    }

    #[test]
    fn test_slice_never_mutates_receiver() {
        let chat = sample_chat();
        let before = chat.clone();
        let _ = chat.slice("msg_2").unwrap();
        assert_eq!(chat, before);
    }

    #[test]
    fn test_slice_is_independent_of_source() {
        let mut chat = sample_chat();
        let sliced = chat.slice("msg_3").unwrap();
        chat.push_message(message("msg_4", Role::Assistant, "More."));
        chat.messages[0].text.clear();
        assert_eq!(sliced.messages.len(), 2);
        assert_eq!(sliced.messages[0].text, "Hello there, how are you today?");
    }

    #[test]
    fn test_slice_idempotent_in_content() {
        let chat = sample_chat();
        let first = chat.slice("msg_3").unwrap();
        let second = chat.slice("msg_3").unwrap();
        assert_eq!(first.messages, second.messages);
    }

    #[test]
    fn test_slice_unknown_id_fails() {
        let chat = sample_chat();
        match chat.slice("msg_99") {
            Err(ChatError::NotFound(id)) => assert_eq!(id, "msg_99"),
            other => panic!("expected not-found, got {other:?}"),
        }
    }

    #[test]
    fn test_slice_fails_for_id_only_in_history() {
        let mut chat = sample_chat();
        // A sliced-away id survives in history but is gone from messages.
        chat.history.push("msg_gone".to_string());
        assert!(matches!(chat.slice("msg_gone"), Err(ChatError::NotFound(_))));
    }

    // ===== Reconstruction =====

    #[test]
    fn test_from_value_roundtrip() {
        let chat = Chat::from_value(&sample_record()).unwrap();
        assert_eq!(chat.id, "chat_1700000000000");
        assert_eq!(chat.name, "Restored chat");
        assert_eq!(chat.history, vec!["msg_1", "msg_2"]);
        assert_eq!(chat.messages.len(), 2);
        assert_eq!(chat.messages[1].role, Role::Assistant);
        assert!(!chat.temporary);
        assert!(chat.can_autogenerate_title);
    }

    #[test]
    fn test_from_value_serialized_chat_reconstructs() {
        let chat = sample_chat();
        let value = serde_json::to_value(&chat).unwrap();
        let restored = Chat::from_value(&value).unwrap();
        assert_eq!(restored, chat);
    }

    #[test]
    fn test_from_value_missing_field() {
        let mut record = sample_record();
        record.as_object_mut().unwrap().remove("name");
        match Chat::from_value(&record) {
            Err(ChatError::Validation(err)) => {
                assert_eq!(err.violations, vec!["missing field `name`"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_from_value_accumulates_violations() {
        let record = json!({
            "id": "session_1",
            "name": 42,
            "history": "not-a-sequence",
            "messages": [],
            "settings": serde_json::to_value(ChatSettings::default()).unwrap(),
            "temporary": false,
        });
        match Chat::from_value(&record) {
            Err(ChatError::Validation(err)) => {
                assert_eq!(err.violations.len(), 4);
                assert!(err.violations.iter().any(|v| v.contains("`chat_`")));
                assert!(err.violations.iter().any(|v| v.contains("`history`")));
                assert!(err
                    .violations
                    .iter()
                    .any(|v| v.contains("`canAutogenerateTitle`")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_from_value_bad_model_pattern() {
        let mut record = sample_record();
        record["settings"]["model"] = json!("claude-3.7-sonnet");
        assert!(matches!(
            Chat::from_value(&record),
            Err(ChatError::Validation(_))
        ));
    }

    #[test]
    fn test_from_value_propagates_message_failure() {
        let mut record = sample_record();
        record["messages"][1] = json!({"id": "msg_2", "role": "assistant"});
        match Chat::from_value(&record) {
            Err(ChatError::Validation(err)) => {
                assert_eq!(err.violations, vec!["missing field `text`"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_from_value_not_an_object() {
        assert!(matches!(
            Chat::from_value(&json!([])),
            Err(ChatError::Validation(_))
        ));
    }

    // ===== Provider projection =====

    #[test]
    fn test_to_provider_messages_order() {
        let chat = sample_chat();
        let out = chat.to_provider_messages(None);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].role, "user");
        assert_eq!(out[1].role, "assistant");
        assert_eq!(
            out[0].content,
            OpenRouterContent::Text("Hello there, how are you today?".to_string())
        );
    }

    #[test]
    fn test_to_provider_messages_prepends_system() {
        let chat = sample_chat();
        let out = chat.to_provider_messages(Some("S"));
        assert_eq!(out.len(), 4);
        assert_eq!(out[0].role, "system");
        assert_eq!(out[0].content, OpenRouterContent::Text("S".to_string()));
        assert_eq!(out[1].role, "user");
        // The receiver is untouched.
        assert_eq!(chat.messages.len(), 3);
    }

    #[test]
    fn test_to_provider_messages_expands_macros() {
        let chat = Chat::new(
            "Macros",
            vec![message("msg_1", Role::User, "today is {{weekday}}")],
        );
        let out = chat.to_provider_messages(Some("date: {{date}}"));
        for msg in &out {
            match &msg.content {
                OpenRouterContent::Text(text) => {
                    assert!(!text.contains("{{weekday}}"));
                    assert!(!text.contains("{{date}}"));
                }
                other => panic!("expected flat text, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_to_openrouter_config() {
        let chat = sample_chat();
        let config = chat.to_openrouter_config();
        assert_eq!(config.model, chat.settings.model);
        assert_eq!(config.temperature, 0.8);
        assert_eq!(config.top_p, 1.0);
        // System prompt prepended, then one entry per message.
        assert_eq!(config.messages.len(), 4);
        assert_eq!(config.messages[0].role, "system");
    }

    // ===== Title autogeneration =====

    struct RecordingCompleter {
        reply: Option<String>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl RecordingCompleter {
        fn new(reply: Option<&str>) -> Self {
            Self {
                reply: reply.map(str::to_string),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl ChatCompleter for RecordingCompleter {
        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> openrouter_client::Result<Option<String>> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(self.reply.clone())
        }
    }

    struct FailingCompleter;

    #[async_trait::async_trait]
    impl ChatCompleter for FailingCompleter {
        async fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> openrouter_client::Result<Option<String>> {
            Err(ProviderError::Status {
                status: 503,
                status_text: "Service Unavailable".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_autogenerate_title_without_credential() {
        let chat = sample_chat();
        let title = chat
            .autogenerate_title(None::<&TitleClient>)
            .await
            .unwrap();
        assert_eq!(title, None);
    }

    #[tokio::test]
    async fn test_autogenerate_title_request_shape() {
        let chat = sample_chat();
        let completer = RecordingCompleter::new(Some("Friendly Greetings"));
        let title = chat.autogenerate_title(Some(&completer)).await.unwrap();
        assert_eq!(title.as_deref(), Some("Friendly Greetings"));

        let requests = completer.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert!(!request.stream);
        assert_eq!(request.model, TITLE_MODEL);
        assert_eq!(request.temperature, 0.25);
        assert_eq!(request.top_p, 0.9);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(
            request.messages[1].content,
            OpenRouterContent::Text(
                "# user\nHello there, how are you today?\n\n\
                 # assistant\nVery well, thanks.\n\n\
                 # user\nGlad to hear it."
                    .to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_autogenerate_title_provider_failure() {
        let chat = sample_chat();
        let err = chat
            .autogenerate_title(Some(&FailingCompleter))
            .await
            .unwrap_err();
        match err {
            ChatError::Provider(ProviderError::Status { status_text, .. }) => {
                assert_eq!(status_text, "Service Unavailable");
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }
}
