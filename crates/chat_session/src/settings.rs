//! Per-chat provider configuration

use serde::{Deserialize, Serialize};

/// Display color of a chat in list UIs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatColor {
    None,
    Red,
    Green,
    Yellow,
    Blue,
    Orange,
    Purple,
}

impl Default for ChatColor {
    fn default() -> Self {
        ChatColor::None
    }
}

/// The completion provider a chat is rendered for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatProvider {
    OpenRouter,
}

impl Default for ChatProvider {
    fn default() -> Self {
        ChatProvider::OpenRouter
    }
}

const DEFAULT_MODEL: &str = "anthropic/claude-3.7-sonnet";

const DEFAULT_SYSTEM_PROMPT: &str = "\
- The current date is {{weekday}}, {{date}}.
- Use British English.
- Use Oxford English spelling.";

/// Configuration governing how a chat is rendered to a provider.
///
/// Owned exclusively by one chat and replaced wholesale when edited; the
/// entity itself never mutates individual fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatSettings {
    pub temperature: f64,
    pub top_p: f64,
    pub system_prompt: String,
    pub color: ChatColor,
    pub provider: ChatProvider,
    /// Model id in the `<vendor>/<name>` form.
    pub model: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            temperature: 0.8,
            top_p: 1.0,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            color: ChatColor::None,
            provider: ChatProvider::OpenRouter,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Check that a model id matches the `<vendor>/<name>` pattern.
pub fn is_valid_model_id(model: &str) -> bool {
    match model.split_once('/') {
        Some((vendor, name)) => !vendor.is_empty() && !name.is_empty(),
        None => false,
    }
}
