//! Map-reduce summarization of extracted page content.
//!
//! Short documents pass through verbatim. Long documents are chunked on
//! block boundaries, each chunk is condensed by the summary model, and
//! the merged result is condensed once more. Every model failure lands
//! on the same deterministic floor: a hard word truncation of the raw
//! content, so the pipeline always produces *something* readable.

use crate::extract::ExtractedDocument;
use runelore_core::{ChatMessage, CompletionClient, CompletionOptions};
use std::sync::Arc;
use tracing::{debug, warn};

/// Documents at or under this many words skip summarization entirely.
const VERBATIM_WORD_LIMIT: usize = 200;

/// Upper bound on words per chunk handed to the summary model.
const CHUNK_WORD_LIMIT: usize = 4000;

/// Word budget requested for each intermediate chunk summary.
const PASS_WORD_BUDGET: usize = 800;

/// Word budget requested for the final combined summary.
const FINAL_WORD_BUDGET: usize = 200;

/// Group content blocks into chunks of at most [`CHUNK_WORD_LIMIT`]
/// words, breaking only on block boundaries. A single block larger than
/// the limit is split on raw word boundaries as a last resort.
pub fn chunk_blocks(blocks: &[String]) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_words = 0usize;

    for block in blocks {
        let words = block.split_whitespace().count();
        if words > CHUNK_WORD_LIMIT {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_words = 0;
            }
            let all: Vec<&str> = block.split_whitespace().collect();
            for piece in all.chunks(CHUNK_WORD_LIMIT) {
                chunks.push(piece.join(" "));
            }
            continue;
        }
        if current_words + words > CHUNK_WORD_LIMIT && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_words = 0;
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(block);
        current_words += words;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Hard truncation floor: the first `budget` words of the content.
fn truncate_words(text: &str, budget: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= budget {
        return text.to_string();
    }
    format!("{}...", words[..budget].join(" "))
}

/// Condenses extracted documents into answer-sized summaries.
pub struct Distiller {
    completion: Arc<dyn CompletionClient>,
}

impl Distiller {
    pub fn new(completion: Arc<dyn CompletionClient>) -> Self {
        Self { completion }
    }

    /// Produce a summary of at most roughly [`FINAL_WORD_BUDGET`] words.
    /// Never fails: model errors degrade to a word-truncated slice of
    /// the raw content.
    pub async fn distill(&self, term: &str, doc: &ExtractedDocument) -> String {
        let content = doc.blocks.join("\n");
        let total_words = doc.word_count();
        if total_words <= VERBATIM_WORD_LIMIT {
            debug!(term, total_words, "content under budget, returning verbatim");
            return content;
        }

        let chunks = chunk_blocks(&doc.blocks);
        debug!(term, total_words, chunks = chunks.len(), "summarizing content");

        let mut partials = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            match self.summarize(term, chunk, PASS_WORD_BUDGET).await {
                Some(summary) => partials.push(summary),
                None => {
                    warn!(term, "chunk summarization failed, falling back to truncation");
                    return truncate_words(&content, FINAL_WORD_BUDGET);
                }
            }
        }

        // The reduce pass only runs when the joined map output is still
        // over budget; a short combined summary is already the answer.
        let combined = partials.join("\n");
        if combined.split_whitespace().count() <= FINAL_WORD_BUDGET {
            return combined;
        }
        match self.summarize(term, &combined, FINAL_WORD_BUDGET).await {
            Some(summary) => summary,
            None => truncate_words(&content, FINAL_WORD_BUDGET),
        }
    }

    async fn summarize(&self, term: &str, content: &str, budget: usize) -> Option<String> {
        let prompt = format!(
            "Summarize the following OSRS wiki content about '{term}' in at most \
             {budget} words. Keep concrete numbers, requirements, and names. \
             Do not add information that is not in the content.\n\n{content}"
        );
        let messages = [ChatMessage::user(prompt)];
        let model = self.completion.summary_model().to_string();
        match self
            .completion
            .complete(&model, &messages, CompletionOptions::long())
            .await
        {
            Ok(summary) if !summary.trim().is_empty() => Some(summary.trim().to_string()),
            Ok(_) => {
                warn!(term, "summary model returned empty output");
                None
            }
            Err(err) => {
                warn!(term, error = %err, "summary request failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use runelore_core::CompletionError;
    use std::collections::{BTreeSet, VecDeque};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replies with the scripted responses in order; any call past the
    /// end of the script errors.
    struct FakeCompletion {
        script: Mutex<VecDeque<String>>,
        calls: AtomicUsize,
    }

    impl FakeCompletion {
        fn scripted(replies: &[&str]) -> Self {
            Self {
                script: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
                calls: AtomicUsize::new(0),
            }
        }

        fn replying(reply: &str) -> Self {
            // enough repetitions for any pass count in these tests
            Self::scripted(&[reply; 8])
        }

        fn unavailable() -> Self {
            Self::scripted(&[])
        }
    }

    #[async_trait]
    impl CompletionClient for FakeCompletion {
        fn chat_model(&self) -> &str {
            "chat"
        }

        fn summary_model(&self) -> &str {
            "summary"
        }

        async fn complete(
            &self,
            _model: &str,
            _messages: &[ChatMessage],
            _opts: CompletionOptions,
        ) -> Result<String, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script.lock().unwrap().pop_front() {
                Some(reply) => Ok(reply),
                None => Err(CompletionError::Unavailable),
            }
        }

        async fn is_available(&self) -> bool {
            !self.script.lock().unwrap().is_empty()
        }
    }

    fn doc_of_words(count: usize) -> ExtractedDocument {
        ExtractedDocument {
            blocks: vec![vec!["word"; count].join(" ")],
            related_links: BTreeSet::new(),
        }
    }

    #[tokio::test]
    async fn short_content_passes_through_without_model_calls() {
        let completion = Arc::new(FakeCompletion::replying("unused"));
        let distiller = Distiller::new(completion.clone());

        let doc = ExtractedDocument {
            blocks: vec!["The whip requires 70 Attack.".into()],
            related_links: BTreeSet::new(),
        };
        let summary = distiller.distill("Abyssal whip", &doc).await;
        assert_eq!(summary, "The whip requires 70 Attack.");
        assert_eq!(completion.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn long_single_chunk_is_summarized_once() {
        let completion = Arc::new(FakeCompletion::replying("condensed"));
        let distiller = Distiller::new(completion.clone());

        let summary = distiller.distill("Abyssal whip", &doc_of_words(500)).await;
        assert_eq!(summary, "condensed");
        assert_eq!(completion.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn short_combined_map_output_skips_the_reduce_pass() {
        // Only two map replies are scripted; a reduce attempt would error
        // and land on the truncation floor instead.
        let completion = Arc::new(FakeCompletion::scripted(&["short summary", "short summary"]));
        let distiller = Distiller::new(completion.clone());

        let doc = ExtractedDocument {
            blocks: vec![
                vec!["alpha"; 3000].join(" "),
                vec!["beta"; 3000].join(" "),
            ],
            related_links: BTreeSet::new(),
        };
        let summary = distiller.distill("Dragon", &doc).await;
        assert_eq!(summary, "short summary\nshort summary");
        assert_eq!(completion.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn oversized_combined_map_output_gets_a_reduce_pass() {
        let partial = vec!["word"; 300].join(" ");
        let completion =
            Arc::new(FakeCompletion::scripted(&[partial.as_str(), partial.as_str(), "final"]));
        let distiller = Distiller::new(completion.clone());

        let doc = ExtractedDocument {
            blocks: vec![
                vec!["alpha"; 3000].join(" "),
                vec!["beta"; 3000].join(" "),
            ],
            related_links: BTreeSet::new(),
        };
        let summary = distiller.distill("Dragon", &doc).await;
        assert_eq!(summary, "final");
        // two map calls plus one reduce call
        assert_eq!(completion.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn model_failure_lands_on_the_truncation_floor() {
        let distiller = Distiller::new(Arc::new(FakeCompletion::unavailable()));

        let summary = distiller.distill("Dragon", &doc_of_words(500)).await;
        assert!(summary.ends_with("..."));
        let trimmed = summary.trim_end_matches("...");
        assert_eq!(trimmed.split_whitespace().count(), 200);
    }

    #[test]
    fn chunking_breaks_on_block_boundaries() {
        let blocks = vec![
            vec!["a"; 2500].join(" "),
            vec!["b"; 2500].join(" "),
            vec!["c"; 100].join(" "),
        ];
        let chunks = chunk_blocks(&blocks);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].split_whitespace().count(), 2500);
        assert_eq!(chunks[1].split_whitespace().count(), 2600);
    }

    #[test]
    fn oversized_block_is_split_on_word_boundaries() {
        let blocks = vec![vec!["x"; 9000].join(" ")];
        let chunks = chunk_blocks(&blocks);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.split_whitespace().count() <= 4000));
    }
}
