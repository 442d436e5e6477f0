//! The full lookup pipeline: resolve a term to a URL, consult the page
//! cache, fetch and classify the page, distill it, and cache the final
//! result keyed by URL so repeated questions skip the whole pipeline.

use crate::distill::Distiller;
use crate::extract::{disambiguation_candidates, extract_document, is_disambiguation};
use crate::resolver::{Resolution, SearchResolver};
use runelore_core::{
    CompletionClient, KnowledgeClient, PageCache, Retrieval, RetrievalResult,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How many disambiguation referents to name in the user-facing notice.
const DISAMBIG_PAGES_SHOWN: usize = 5;

/// End-to-end wiki lookup with caching.
pub struct Retriever {
    knowledge: Arc<dyn KnowledgeClient>,
    cache: Arc<dyn PageCache>,
    resolver: SearchResolver,
    distiller: Distiller,
    ttl_secs: u64,
}

impl Retriever {
    pub fn new(
        knowledge: Arc<dyn KnowledgeClient>,
        completion: Arc<dyn CompletionClient>,
        cache: Arc<dyn PageCache>,
        max_retries: u32,
        ttl_secs: u64,
    ) -> Self {
        let resolver = SearchResolver::new(knowledge.clone(), completion.clone(), max_retries);
        let distiller = Distiller::new(completion);
        Self {
            knowledge,
            cache,
            resolver,
            distiller,
            ttl_secs,
        }
    }

    /// Look up a term and produce a presentable result. Infrastructure
    /// failures surface as [`RetrievalResult::Error`] with a message fit
    /// to show the user, never as a panic or a silent drop.
    pub async fn retrieve(&self, term: &str) -> Retrieval {
        let (term, url, trail) = match self.resolver.resolve_with_retry(term).await {
            Resolution::Resolved { term, url, trail } => (term, url, trail),
            Resolution::Unresolved {
                term,
                attempts,
                trail,
            } => {
                info!(term, attempts, "term never resolved to a page");
                let message = format!(
                    "Sorry, I couldn't find any information about '{term}' in the wiki \
                     after {attempts} attempts."
                );
                return Retrieval::new(RetrievalResult::Error { term, message }).with_trail(trail);
            }
        };

        if let Some(result) = self.cached(&url).await {
            debug!(term, url, "cache hit");
            return Retrieval::new(result).with_url(url).with_trail(trail);
        }

        let html = match self.knowledge.fetch(&url).await {
            Ok(html) => html,
            Err(err) => {
                warn!(term, url, error = %err, "page fetch failed");
                let message = format!(
                    "Sorry, I found a page for '{term}' but could not fetch it ({err})."
                );
                return Retrieval::new(RetrievalResult::Error { term, message })
                    .with_url(url)
                    .with_trail(trail);
            }
        };

        let result = if is_disambiguation(&html) {
            self.disambiguation_result(&term, &html)
        } else {
            self.content_result(&term, &html).await
        };

        self.store(&url, &result).await;
        Retrieval::new(result).with_url(url).with_trail(trail)
    }

    fn disambiguation_result(&self, term: &str, html: &str) -> RetrievalResult {
        let candidates = disambiguation_candidates(html, term);
        info!(term, candidates = candidates.len(), "hit a disambiguation page");
        let shown: Vec<String> = candidates
            .iter()
            .take(DISAMBIG_PAGES_SHOWN)
            .map(|page| page.replace('_', " "))
            .collect();
        let body = format!(
            "Multiple pages found for '{term}'. Please be more specific. \
             Possible pages: {}",
            shown.join(", ")
        );
        RetrievalResult::Disambiguation {
            term: term.to_string(),
            body,
            related_links: candidates.into_iter().collect(),
        }
    }

    async fn content_result(&self, term: &str, html: &str) -> RetrievalResult {
        let doc = extract_document(html);
        let mut body = self.distiller.distill(term, &doc).await;

        if !doc.related_links.is_empty() {
            body.push_str("\n\nRelated Links:");
            for link in doc.related_links.iter() {
                body.push_str(&format!("\n• {}", link.replace('_', " ")));
            }
        }

        RetrievalResult::Content {
            term: term.to_string(),
            body,
            related_links: doc.related_links,
        }
    }

    /// A cache entry that fails to parse counts as a miss; the pipeline
    /// will overwrite it with a fresh result.
    async fn cached(&self, url: &str) -> Option<RetrievalResult> {
        match self.cache.get(url).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(result) => Some(result),
                Err(err) => {
                    warn!(url, error = %err, "discarding unparseable cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(url, error = %err, "cache read failed");
                None
            }
        }
    }

    /// Best effort: a cache write failure only costs the next lookup.
    async fn store(&self, url: &str, result: &RetrievalResult) {
        if !result.is_cacheable() {
            return;
        }
        match serde_json::to_vec(result) {
            Ok(bytes) => {
                if let Err(err) = self.cache.set(url, bytes, self.ttl_secs).await {
                    warn!(url, error = %err, "cache write failed");
                }
            }
            Err(err) => warn!(url, error = %err, "result serialization failed"),
        }
    }
}
