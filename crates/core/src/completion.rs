//! CompletionClient trait: the abstraction over the LLM service.
//!
//! The pipeline consumes the LLM as a capability: `complete` for one-shot
//! prompts (classification, ranking, summarization), `complete_stream` for
//! the final answer, and `is_available` as a liveness probe. Every call
//! carries its own timeout; a timeout is treated identically to any other
//! call failure by the caller's fallback.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::CompletionError;

/// The role of a message sender in a completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Per-call options for a completion request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CompletionOptions {
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl CompletionOptions {
    /// Short timeout: classification, ranking, term extraction.
    pub fn short() -> Self {
        Self { timeout_secs: 10 }
    }

    /// Long timeout: summarization and answer generation.
    pub fn long() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self::short()
    }
}

/// The core completion capability.
///
/// Implementations wrap a concrete LLM endpoint (Ollama in production,
/// call-counting fakes in tests). The client carries the configured chat
/// and summary model identifiers so call sites pick the right one.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// The configured model for conversational answers.
    fn chat_model(&self) -> &str;

    /// The configured model for summarization work.
    fn summary_model(&self) -> &str;

    /// Send messages and get the complete response text.
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        opts: CompletionOptions,
    ) -> std::result::Result<String, CompletionError>;

    /// Send messages and get a lazy, finite sequence of text fragments.
    ///
    /// The sequence is non-restartable; the consumer accumulates fragments
    /// until the channel closes. Default implementation calls `complete()`
    /// and yields the result as a single fragment.
    async fn complete_stream(
        &self,
        model: &str,
        messages: &[ChatMessage],
        opts: CompletionOptions,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<String, CompletionError>>,
        CompletionError,
    > {
        let text = self.complete(model, messages, opts).await?;
        let (tx, rx) = tokio::sync::mpsc::channel(1);
        let _ = tx.send(Ok(text)).await;
        Ok(rx)
    }

    /// Liveness probe: can we reach the completion service?
    async fn is_available(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors() {
        let msg = ChatMessage::user("hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "hello");
        assert_eq!(ChatMessage::system("x").role, Role::System);
    }

    #[test]
    fn options_presets() {
        assert_eq!(CompletionOptions::short().timeout_secs, 10);
        assert_eq!(CompletionOptions::long().timeout_secs, 30);
        assert_eq!(CompletionOptions::default().timeout_secs, 10);
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::assistant("hi")).unwrap();
        assert!(json.contains("\"assistant\""));
    }
}
