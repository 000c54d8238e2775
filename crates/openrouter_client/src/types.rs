//! Wire shapes consumed by completion providers

use serde::{Deserialize, Serialize};

/// A text-bearing part of a multi-part message content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentPart {
    pub text: String,
}

/// Message content: either a flat string or a sequence of text parts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum OpenRouterContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl OpenRouterContent {
    /// Apply `f` to every text-bearing leaf of this content.
    pub fn map_text(&mut self, f: impl Fn(&str) -> String) {
        match self {
            OpenRouterContent::Text(text) => *text = f(text),
            OpenRouterContent::Parts(parts) => {
                for part in parts {
                    part.text = f(&part.text);
                }
            }
        }
    }
}

/// One message as a completion provider expects it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenRouterMessage {
    pub role: String,
    pub content: OpenRouterContent,
}

impl OpenRouterMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: OpenRouterContent::Text(content.into()),
        }
    }
}

/// The full request payload for a completion provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenRouterConfig {
    pub model: String,
    pub temperature: f64,
    pub top_p: f64,
    pub messages: Vec<OpenRouterMessage>,
}
