//! KnowledgeClient trait: thin wrapper over the wiki's search and fetch.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::KnowledgeError;

/// One fuzzy-search hit: a page label and its canonical URL.
///
/// Ephemeral: produced by `search`, consumed within one resolution
/// attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCandidate {
    pub label: String,
    pub url: String,
}

impl SearchCandidate {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self { label: label.into(), url: url.into() }
    }
}

/// The knowledge-base capability: fuzzy search and raw document fetch.
#[async_trait]
pub trait KnowledgeClient: Send + Sync {
    /// Fuzzy-search the knowledge base. Results keep the backend's ranking
    /// order; an empty list means no candidates (a normal outcome, not an
    /// error).
    async fn search(
        &self,
        term: &str,
    ) -> std::result::Result<Vec<SearchCandidate>, KnowledgeError>;

    /// Fetch the raw document at a canonical URL.
    async fn fetch(&self, url: &str) -> std::result::Result<String, KnowledgeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_roundtrips() {
        let c = SearchCandidate::new("Abyssal whip", "https://w.example/w/Abyssal_whip");
        let json = serde_json::to_string(&c).unwrap();
        let back: SearchCandidate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
