//! Error types for the Runelore domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Runelore operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Completion service errors ---
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    // --- Knowledge base errors ---
    #[error("Knowledge error: {0}")]
    Knowledge(#[from] KnowledgeError),

    // --- Page cache errors ---
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the completion (LLM) capability.
///
/// `Unavailable` and `Timeout` are transient: every call site that can
/// degrade (classification, ranking, summarization, history merge) treats
/// them the same as a generic call failure and takes its deterministic
/// fallback.
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    #[error("Completion service is not available")]
    Unavailable,

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),
}

/// Failures of the knowledge-base capability (search + fetch).
#[derive(Debug, Clone, Error)]
pub enum KnowledgeError {
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Failures of the page-cache capability.
///
/// Callers treat every cache failure as "absent" on read and a no-op on
/// write: the cache is best-effort and never fatal.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("Cache backend is not available")]
    Unavailable,

    #[error("Storage error: {0}")]
    Storage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_error_displays_correctly() {
        let err = Error::Completion(CompletionError::Api {
            status_code: 503,
            message: "model is loading".into(),
        });
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("model is loading"));
    }

    #[test]
    fn knowledge_error_displays_correctly() {
        let err = Error::Knowledge(KnowledgeError::HttpStatus(404));
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn cache_error_is_cloneable() {
        let err = CacheError::Storage("connection reset".into());
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }
}
