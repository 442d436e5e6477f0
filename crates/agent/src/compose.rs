//! Answer composition.
//!
//! Builds the grounded prompt (history transcript plus retrieved tool
//! content), streams the chat model's answer, and appends a References
//! block for every page that contributed. A stream that dies mid-answer
//! keeps whatever arrived; a stream that never starts is the caller's
//! failure to report.

use runelore_core::completion::{ChatMessage, CompletionClient, CompletionOptions};
use runelore_core::error::CompletionError;
use runelore_core::query::Query;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Retrieved content is clipped to this many characters per tool before
/// entering the prompt.
const CONTEXT_CHAR_LIMIT: usize = 500;

const SYSTEM_PROMPT: &str = "You are Runelore, a helpful Old School RuneScape assistant. \
    Answer concisely using the provided wiki content and conversation history. \
    If the provided content does not answer the question, say so instead of guessing.";

/// What one tool contributed to a query.
pub struct ToolContribution {
    pub tool: String,
    pub term: String,
    pub body: String,
    pub reference: Option<String>,
}

/// Turns a query, its history, and tool contributions into a final answer.
pub struct AnswerComposer {
    completion: Arc<dyn CompletionClient>,
}

impl AnswerComposer {
    pub fn new(completion: Arc<dyn CompletionClient>) -> Self {
        Self { completion }
    }

    /// Stream and accumulate the answer. Returns `Err` only when no
    /// answer text could be produced at all.
    pub async fn compose(
        &self,
        query: &Query,
        transcript: &str,
        contributions: &[ToolContribution],
    ) -> Result<String, CompletionError> {
        let messages = build_messages(query, transcript, contributions);
        let model = self.completion.chat_model().to_string();
        let mut rx = self
            .completion
            .complete_stream(&model, &messages, CompletionOptions::long())
            .await?;

        let mut answer = String::new();
        while let Some(fragment) = rx.recv().await {
            match fragment {
                Ok(text) => answer.push_str(&text),
                Err(err) => {
                    warn!(error = %err, "answer stream interrupted");
                    break;
                }
            }
        }
        let answer = answer.trim().to_string();
        if answer.is_empty() {
            return Err(CompletionError::StreamInterrupted(
                "no answer text arrived".into(),
            ));
        }

        debug!(chars = answer.len(), "answer composed");
        Ok(append_references(answer, contributions))
    }
}

fn build_messages(
    query: &Query,
    transcript: &str,
    contributions: &[ToolContribution],
) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT)];

    if !transcript.is_empty() {
        messages.push(ChatMessage::system(format!(
            "Conversation so far:\n{transcript}"
        )));
    }
    if !contributions.is_empty() {
        let context: Vec<String> = contributions
            .iter()
            .map(|c| {
                let clipped: String = c.body.chars().take(CONTEXT_CHAR_LIMIT).collect();
                format!("Information about '{}' from {}:\n{}", c.term, c.tool, clipped)
            })
            .collect();
        messages.push(ChatMessage::system(context.join("\n\n")));
    }

    messages.push(ChatMessage::user(format!(
        "Taking the conversation and retrieved information above into account, \
         answer {} in under 2000 characters: {}",
        query.submitted_by, query.text
    )));
    messages
}

/// Append a sorted, deduplicated References block when any contribution
/// carries a source URL.
fn append_references(mut answer: String, contributions: &[ToolContribution]) -> String {
    let references: BTreeSet<&str> = contributions
        .iter()
        .filter_map(|c| c.reference.as_deref())
        .collect();
    if references.is_empty() {
        return answer;
    }
    answer.push_str("\n\n**References:**");
    for reference in references {
        answer.push_str(&format!("\n• <{reference}>"));
    }
    answer
}
