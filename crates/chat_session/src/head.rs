//! Chat head projection

use serde::{Deserialize, Serialize};

use crate::settings::ChatColor;

/// A read-only summary of a chat for list UIs.
///
/// Has no independent lifecycle; recomputed on demand from a chat and
/// never cached on the entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatHead {
    pub id: String,
    pub name: String,
    pub message_count: usize,
    /// First 150 characters of the most recent message, if any.
    pub last_message_snippet: Option<String>,
    pub color: ChatColor,
    pub temporary: bool,
    /// Approximate token count, not a true tokenizer count.
    pub token_count: u64,
}
