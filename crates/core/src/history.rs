//! Conversation history entry types.
//!
//! The bounded per-conversation history lives in `runelore-memory`; the
//! entry value objects live here so the scheduler and the memory store
//! share one vocabulary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The `source` value marking an entry as the running summary.
pub const SUMMARY_SOURCE: &str = "summary";

/// Word budget for the running conversation summary.
pub const SUMMARY_WORD_BUDGET: usize = 150;

/// Who produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Bot,
    System,
}

/// One entry in a conversation history.
///
/// An entry with `source == SUMMARY_SOURCE` is the running summary: at
/// most one exists per conversation, and its content is capped at
/// [`SUMMARY_WORD_BUDGET`] words.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub role: HistoryRole,
    pub content: String,
    pub source: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationEntry {
    pub fn new(
        role: HistoryRole,
        content: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            role,
            content: content.into(),
            source: source.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create the running-summary entry from already-capped text.
    pub fn summary(content: impl Into<String>) -> Self {
        Self::new(HistoryRole::System, content, SUMMARY_SOURCE)
    }

    pub fn is_summary(&self) -> bool {
        self.source == SUMMARY_SOURCE
    }
}

/// Truncate text to at most `budget` words, appending an ellipsis marker
/// when anything was cut.
pub fn cap_words(text: &str, budget: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= budget {
        return text.trim().to_string();
    }
    let mut capped = words[..budget].join(" ");
    capped.push_str("...");
    capped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_entry_is_recognized() {
        let entry = ConversationEntry::summary("Earlier the user asked about whips.");
        assert!(entry.is_summary());
        assert_eq!(entry.role, HistoryRole::System);

        let raw = ConversationEntry::new(HistoryRole::User, "hi", "alice");
        assert!(!raw.is_summary());
    }

    #[test]
    fn cap_words_respects_budget() {
        let text = (0..200).map(|i| i.to_string()).collect::<Vec<_>>().join(" ");
        let capped = cap_words(&text, 150);
        assert_eq!(capped.split_whitespace().count(), 150);
        assert!(capped.ends_with("..."));
    }

    #[test]
    fn cap_words_leaves_short_text_alone() {
        assert_eq!(cap_words("short text", 150), "short text");
    }
}
