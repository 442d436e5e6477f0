//! Conversation history with eviction-time compaction.

use runelore_core::completion::{ChatMessage, CompletionClient, CompletionOptions};
use runelore_core::history::{
    ConversationEntry, HistoryRole, SUMMARY_WORD_BUDGET, cap_words,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

fn role_label(role: HistoryRole) -> &'static str {
    match role {
        HistoryRole::User => "User",
        HistoryRole::Bot => "Bot",
        HistoryRole::System => "System",
    }
}

/// Bounded history keyed by conversation. Appending past the bound folds
/// the oldest raw entries into one running summary entry, so the store
/// never holds more than `max_length` entries per conversation while the
/// gist of evicted turns survives.
pub struct HistoryStore {
    completion: Arc<dyn CompletionClient>,
    conversations: Mutex<HashMap<String, Vec<ConversationEntry>>>,
    max_length: usize,
}

impl HistoryStore {
    pub fn new(completion: Arc<dyn CompletionClient>, max_length: usize) -> Self {
        Self {
            completion,
            conversations: Mutex::new(HashMap::new()),
            max_length,
        }
    }

    /// Record one turn. May invoke the summary model when the bound is
    /// exceeded; a failed merge still evicts, keeping any prior summary.
    pub async fn append(
        &self,
        key: &str,
        role: HistoryRole,
        content: impl Into<String>,
        source: impl Into<String>,
    ) {
        let entry = ConversationEntry::new(role, content, source);
        let mut conversations = self.conversations.lock().await;
        let entries = conversations.entry(key.to_string()).or_default();
        entries.push(entry);
        if entries.len() <= self.max_length {
            return;
        }

        // Pull the existing summary aside so only raw entries are
        // evicted, then leave one slot for the refreshed summary.
        let old_summary = entries
            .iter()
            .position(ConversationEntry::is_summary)
            .map(|i| entries.remove(i));
        let keep = self.max_length.saturating_sub(1);
        let overflow = entries.len().saturating_sub(keep);
        let evicted: Vec<ConversationEntry> = entries.drain(..overflow).collect();

        debug!(
            key,
            evicted = evicted.len(),
            had_summary = old_summary.is_some(),
            "compacting conversation history"
        );

        match self.merge(old_summary.as_ref(), &evicted).await {
            Some(summary) => entries.push(ConversationEntry::summary(summary)),
            None => {
                warn!(key, "history compaction failed, evicted turns are lost");
                if let Some(summary) = old_summary {
                    entries.push(summary);
                }
            }
        }
    }

    /// All entries for a conversation, oldest first.
    pub async fn history(&self, key: &str) -> Vec<ConversationEntry> {
        let conversations = self.conversations.lock().await;
        conversations.get(key).cloned().unwrap_or_default()
    }

    /// Forget a conversation entirely.
    pub async fn clear(&self, key: &str) {
        self.conversations.lock().await.remove(key);
    }

    /// Render a conversation as prompt-ready text, one line per entry.
    pub async fn transcript(&self, key: &str) -> String {
        let entries = self.history(key).await;
        entries
            .iter()
            .map(|entry| {
                if entry.is_summary() {
                    format!("[Summary of earlier conversation: {}]", entry.content)
                } else {
                    format!("{}: {}", role_label(entry.role), entry.content)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    async fn merge(
        &self,
        old_summary: Option<&ConversationEntry>,
        evicted: &[ConversationEntry],
    ) -> Option<String> {
        let mut excerpt = String::new();
        if let Some(summary) = old_summary {
            excerpt.push_str(&format!("Earlier summary: {}\n", summary.content));
        }
        for entry in evicted {
            excerpt.push_str(&format!("{}: {}\n", role_label(entry.role), entry.content));
        }

        let prompt = format!(
            "Summarize this conversation excerpt in at most {SUMMARY_WORD_BUDGET} words. \
             Preserve what was asked and what was answered.\n\n{excerpt}"
        );
        let messages = [ChatMessage::user(prompt)];
        let model = self.completion.summary_model().to_string();
        match self
            .completion
            .complete(&model, &messages, CompletionOptions::long())
            .await
        {
            Ok(summary) if !summary.trim().is_empty() => {
                Some(cap_words(&summary, SUMMARY_WORD_BUDGET))
            }
            Ok(_) => None,
            Err(err) => {
                warn!(error = %err, "summary model failed during compaction");
                None
            }
        }
    }
}
