//! Message entity - one turn in a conversation

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;

/// Identifier of a message. Carries the `msg_` prefix.
pub type MessageId = String;

/// Prefix carried by every message identifier.
pub const MESSAGE_ID_PREFIX: &str = "msg_";

/// Who produced a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    fn parse(value: &str) -> Option<Role> {
        match value {
            "system" => Some(Role::System),
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One turn in a conversation. Owned by exactly one chat at a time.
///
/// Messages are never mutated after creation; truncating a conversation
/// replaces the whole message sequence instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub text: String,
}

impl Message {
    /// Create a new message with a fresh time-based identifier.
    ///
    /// Uniqueness is millisecond-granular; two messages created in the
    /// same instant share an id. Callers that append faster than once
    /// per millisecond must generate ids themselves.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: format!("{}{}", MESSAGE_ID_PREFIX, Utc::now().timestamp_millis()),
            role,
            text: text.into(),
        }
    }

    /// Reconstruct a message from an untyped record.
    ///
    /// Collects every violated constraint into a single [`ValidationError`]
    /// rather than failing on the first check.
    pub fn from_value(value: &Value) -> Result<Message, ValidationError> {
        let record = value
            .as_object()
            .ok_or_else(|| ValidationError::single("message record is not an object"))?;

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
                Some(id) if !id.starts_with(MESSAGE_ID_PREFIX) => {
                    violations.push(format!(
                        "field `id` does not start with `{MESSAGE_ID_PREFIX}`"
                    ));
                    None
                }
                Some(id) => Some(id.to_string()),
            },
        };

        let role = match record.get("role") {
            None => {
                violations.push("missing field `role`".to_string());
                None
            }
            Some(v) => match v.as_str().and_then(Role::parse) {
                None => {
                    violations.push(
                        "field `role` is not one of `system`, `user`, `assistant`".to_string(),
                    );
                    None
                }
                Some(role) => Some(role),
            },
        };

        let text = match record.get("text") {
            None => {
                violations.push("missing field `text`".to_string());
                None
            }
            Some(v) => match v.as_str() {
                None => {
                    violations.push("field `text` is not a string".to_string());
                    None
                }
                Some(text) => Some(text.to_string()),
            },
        };

        match (id, role, text) {
            (Some(id), Some(role), Some(text)) => Ok(Message { id, role, text }),
            _ => Err(ValidationError::new(violations)),
        }
    }
}
