//! Text-macro expansion
//!
//! Outgoing message content may carry placeholders such as `{{date}}` that
//! are substituted just before the content is handed to a completion
//! provider. Expansion is pure and total: unknown placeholders pass through
//! untouched.

use chrono::{Local, NaiveDateTime};

/// Expand all supported macros in `text` against the local clock.
///
/// Supported macros:
/// - `{{date}}` - e.g. "25 August 2026"
/// - `{{weekday}}` - e.g. "Tuesday"
/// - `{{time}}` - e.g. "14:05"
pub fn expand(text: &str) -> String {
    expand_at(text, Local::now().naive_local())
}

fn expand_at(text: &str, now: NaiveDateTime) -> String {
    text.replace("{{date}}", &now.format("%-d %B %Y").to_string())
        .replace("{{weekday}}", &now.format("%A").to_string())
        .replace("{{time}}", &now.format("%H:%M").to_string())
}
