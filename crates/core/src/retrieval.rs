//! Retrieval outcome types.
//!
//! A retrieval attempt produces exactly one `RetrievalResult` variant.
//! The cache stores the serialized result so a hit skips both the network
//! fetch and the LLM summarization cost.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The typed outcome of one retrieval attempt.
///
/// `Error` never partially fills `Content` fields: a failed attempt
/// carries only the term and a user-facing message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RetrievalResult {
    /// A resolved page, distilled to a bounded summary.
    Content {
        term: String,
        body: String,
        related_links: BTreeSet<String>,
    },

    /// The resolved page listed multiple distinct referents. Terminal:
    /// the user must ask a more specific question.
    Disambiguation {
        term: String,
        body: String,
        related_links: BTreeSet<String>,
    },

    /// A terminal failure with a user-facing explanation.
    Error { term: String, message: String },
}

impl RetrievalResult {
    /// The search term this result was produced for.
    pub fn term(&self) -> &str {
        match self {
            Self::Content { term, .. }
            | Self::Disambiguation { term, .. }
            | Self::Error { term, .. } => term,
        }
    }

    /// The user-facing body text (the error message for `Error`).
    pub fn body(&self) -> &str {
        match self {
            Self::Content { body, .. } | Self::Disambiguation { body, .. } => body,
            Self::Error { message, .. } => message,
        }
    }

    /// Whether this result may be written to the page cache.
    /// Errors are never cached.
    pub fn is_cacheable(&self) -> bool {
        !matches!(self, Self::Error { .. })
    }
}

/// A retrieval result plus its provenance: the canonical URL it resolved
/// to (for the References block) and the human-readable search trail
/// accumulated by the resolver's retry loop.
#[derive(Debug, Clone)]
pub struct Retrieval {
    pub result: RetrievalResult,
    pub resolved_url: Option<String>,
    pub trail: Vec<String>,
}

impl Retrieval {
    pub fn new(result: RetrievalResult) -> Self {
        Self { result, resolved_url: None, trail: Vec::new() }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.resolved_url = Some(url.into());
        self
    }

    pub fn with_trail(mut self, trail: Vec<String>) -> Self {
        self.trail = trail;
        self
    }
}
