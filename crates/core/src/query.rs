//! The Query value object: one user-submitted question awaiting an answer.
//!
//! Queries are created at the gateway boundary, enqueued FIFO, and
//! discarded once processed. They are never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single user-submitted natural-language request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// The question text (command prefix already stripped)
    pub text: String,

    /// Display name of whoever asked
    pub submitted_by: String,

    /// The conversation this query belongs to (one history per key)
    pub conversation_key: String,

    /// When the query was enqueued
    pub submitted_at: DateTime<Utc>,
}

impl Query {
    pub fn new(
        text: impl Into<String>,
        submitted_by: impl Into<String>,
        conversation_key: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            submitted_by: submitted_by.into(),
            conversation_key: conversation_key.into(),
            submitted_at: Utc::now(),
        }
    }
}
