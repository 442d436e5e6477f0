//! The chat-gateway boundary.
//!
//! The messaging platform itself (Discord, terminal, tests) is an
//! external collaborator. It delivers `InboundMessage`s to the scheduler
//! and receives answers and status markers through a `ResponseSink`.
//! How markers are rendered (reactions, annotations, plain text) is the
//! sink's business.

use async_trait::async_trait;
use crate::query::Query;

/// An inbound event from the messaging collaborator.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub text: String,
    pub author: String,
    pub conversation_key: String,
}

impl InboundMessage {
    pub fn new(
        text: impl Into<String>,
        author: impl Into<String>,
        conversation_key: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            author: author.into(),
            conversation_key: conversation_key.into(),
        }
    }
}

/// Outbound effects toward the messaging collaborator.
///
/// Every terminal failure yields a short explanatory message plus a
/// marker visually distinct from success; internal errors only ever
/// appear as supplementary diagnostic text.
#[async_trait]
pub trait ResponseSink: Send + Sync {
    /// Processing started for a query.
    async fn thinking(&self, query: &Query);

    /// A human-readable progress line (e.g., the search trail).
    async fn progress(&self, query: &Query, text: &str);

    /// A tool was selected; `glyph` is its reaction marker.
    async fn tool_started(&self, query: &Query, glyph: &str);

    /// The composed answer, including any References block.
    async fn answer(&self, query: &Query, text: &str);

    /// The query finished successfully. `used_tools` reports whether any
    /// retrieval tool contributed.
    async fn succeeded(&self, query: &Query, used_tools: bool);

    /// The query failed; `message` is user-facing.
    async fn failure(&self, query: &Query, message: &str);

    /// An inbound message was rejected before enqueueing (wrong length).
    async fn rejected(&self, message: &InboundMessage, notice: &str);
}
