//! MediaWiki knowledge client.
//!
//! Implements `KnowledgeClient` against a MediaWiki `api.php` endpoint:
//! `action=opensearch` for fuzzy search, plain GET for page fetches.

use async_trait::async_trait;
use runelore_core::error::KnowledgeError;
use runelore_core::knowledge::{KnowledgeClient, SearchCandidate};
use std::time::Duration;
use tracing::{debug, warn};

const SEARCH_LIMIT: u32 = 20;
const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// A client for a MediaWiki-backed knowledge base.
pub struct MediaWikiClient {
    api_url: String,
    client: reqwest::Client,
}

impl MediaWikiClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_url: api_url.into(),
            client,
        }
    }

    pub fn from_config(config: &runelore_config::WikiConfig) -> Self {
        Self::new(&config.api_url)
    }

    fn map_send_error(e: reqwest::Error) -> KnowledgeError {
        if e.is_timeout() {
            KnowledgeError::Timeout(e.to_string())
        } else {
            KnowledgeError::Network(e.to_string())
        }
    }
}

/// The opensearch payload: `[term, [labels], [descriptions], [urls]]`.
type OpenSearchPayload = (String, Vec<String>, Vec<String>, Vec<String>);

#[async_trait]
impl KnowledgeClient for MediaWikiClient {
    async fn search(&self, term: &str) -> Result<Vec<SearchCandidate>, KnowledgeError> {
        debug!(term, "Searching the wiki");

        let response = self
            .client
            .get(&self.api_url)
            .timeout(SEARCH_TIMEOUT)
            .query(&[
                ("action", "opensearch"),
                ("search", term),
                ("format", "json"),
                ("limit", &SEARCH_LIMIT.to_string()),
            ])
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status().as_u16();
        if status != 200 {
            warn!(status, "Opensearch returned non-200 status");
            return Err(KnowledgeError::HttpStatus(status));
        }

        let (_, labels, _, urls): OpenSearchPayload = response
            .json()
            .await
            .map_err(|e| KnowledgeError::Malformed(format!("opensearch payload: {e}")))?;

        let candidates: Vec<SearchCandidate> = labels
            .into_iter()
            .zip(urls)
            .map(|(label, url)| SearchCandidate { label, url })
            .collect();

        debug!(count = candidates.len(), "Opensearch candidates");
        Ok(candidates)
    }

    async fn fetch(&self, url: &str) -> Result<String, KnowledgeError> {
        debug!(url, "Fetching wiki page");

        let response = self
            .client
            .get(url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status().as_u16();
        if status != 200 {
            warn!(status, url, "Page fetch returned non-200 status");
            return Err(KnowledgeError::HttpStatus(status));
        }

        response
            .text()
            .await
            .map_err(|e| KnowledgeError::Network(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opensearch_payload_shape() {
        let raw = r#"["whip",["Abyssal whip","Whip vine"],["",""],["https://w.example/w/Abyssal_whip","https://w.example/w/Whip_vine"]]"#;
        let (term, labels, _, urls): OpenSearchPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(term, "whip");
        assert_eq!(labels.len(), 2);
        assert_eq!(urls[0], "https://w.example/w/Abyssal_whip");
    }

    #[test]
    fn opensearch_empty_payload() {
        let raw = r#"["nothing",[],[],[]]"#;
        let (_, labels, _, urls): OpenSearchPayload = serde_json::from_str(raw).unwrap();
        assert!(labels.is_empty());
        assert!(urls.is_empty());
    }
}
