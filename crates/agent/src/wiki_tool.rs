//! The OSRS wiki retrieval tool.
//!
//! Wraps the wiki retriever in the `RetrievalTool` interface: trigger
//! patterns for the router fallback, LLM-based search-term extraction
//! with a heuristic ladder behind it, and retrieval delegation.

use async_trait::async_trait;
use regex::Regex;
use runelore_core::completion::{ChatMessage, CompletionClient, CompletionOptions};
use runelore_core::error::CompletionError;
use runelore_core::query::Query;
use runelore_core::retrieval::Retrieval;
use runelore_core::tool::RetrievalTool;
use runelore_wiki::Retriever;
use std::sync::Arc;
use tracing::debug;

/// Case-folded patterns that mark a question as wiki-worthy.
const TRIGGER_PATTERNS: &[&str] = &[
    r"osrs|runescape|rs3|rs\s+wiki",
    r"item|quest|skill|monster|boss",
    r"stats|requirements|location|guide",
    r"price|value|cost|gp",
    r"drop|loot|reward",
];

/// Words carrying no search signal, skipped when building fallback terms.
const STOPWORDS: &[&str] = &[
    "what", "is", "the", "a", "an", "are", "how", "do", "does", "i", "in",
    "of", "to", "for", "on", "at", "and", "or", "can", "you", "me", "my",
    "tell", "about", "get", "where", "with", "it", "that",
];

pub struct WikiTool {
    completion: Arc<dyn CompletionClient>,
    retriever: Retriever,
    patterns: Vec<Regex>,
}

impl WikiTool {
    pub fn new(completion: Arc<dyn CompletionClient>, retriever: Retriever) -> Self {
        let patterns = TRIGGER_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("trigger patterns are static and valid"))
            .collect();
        Self {
            completion,
            retriever,
            patterns,
        }
    }
}

/// Meaningful words of a query: lowercased, stripped of punctuation,
/// stopwords and short tokens removed.
fn content_words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|w| w.len() > 3 && !STOPWORDS.contains(&w.as_str()))
        .collect()
}

/// Heuristic search terms for when LLM extraction fails: adjacent
/// content-word pairs first (more specific), then single content words,
/// in query order.
fn heuristic_terms(text: &str) -> Vec<String> {
    let words = content_words(text);
    let mut terms: Vec<String> = words.windows(2).map(|pair| pair.join(" ")).collect();
    terms.extend(words);
    terms
}

#[async_trait]
impl RetrievalTool for WikiTool {
    fn name(&self) -> &str {
        "osrs_wiki"
    }

    fn description(&self) -> &str {
        "Looks up Old School RuneScape facts on the official wiki: items, \
         quests, monsters, skills, locations, stats, and prices."
    }

    fn trigger_patterns(&self) -> &[Regex] {
        &self.patterns
    }

    fn glyph(&self) -> &str {
        "🔍"
    }

    async fn extract_term(&self, query: &Query) -> Result<Option<String>, CompletionError> {
        let prompt = format!(
            "Extract the single best wiki search term from this OSRS question. \
             Reply with the term only, no explanation.\n\
             Examples:\n\
             'what are the stats of an abyssal whip?' -> 'Abyssal whip'\n\
             'how do I start dragon slayer' -> 'Dragon Slayer'\n\
             'where can I find the slayer master at level 40' -> 'Slayer master'\n\n\
             Question: {}",
            query.text
        );
        let messages = [ChatMessage::user(prompt)];
        let model = self.completion.chat_model().to_string();
        let reply = self
            .completion
            .complete(&model, &messages, CompletionOptions::short())
            .await?;

        let term = reply
            .lines()
            .next()
            .unwrap_or("")
            .trim()
            .trim_matches(|c| c == '\'' || c == '"')
            .to_string();
        if term.is_empty() || term.split_whitespace().count() > 6 {
            debug!(reply, "term extraction produced nothing usable");
            return Ok(None);
        }
        Ok(Some(term))
    }

    fn fallback_terms(&self, query: &Query) -> Vec<String> {
        heuristic_terms(&query.text)
    }

    async fn retrieve(&self, term: &str) -> Retrieval {
        self.retriever.retrieve(term).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_patterns_cover_common_phrasings() {
        let patterns: Vec<Regex> = TRIGGER_PATTERNS
            .iter()
            .map(|p| Regex::new(p).unwrap())
            .collect();
        for text in [
            "what are the stats of an abyssal whip?",
            "osrs dragon slayer walkthrough",
            "how much gp does a bond cost",
            "best boss for loot",
        ] {
            assert!(
                patterns.iter().any(|p| p.is_match(text)),
                "no pattern matched {text:?}"
            );
        }
        assert!(!patterns.iter().any(|p| p.is_match("hello how are you")));
    }

    #[test]
    fn fallback_terms_prefer_bigrams_and_skip_stopwords() {
        assert_eq!(
            heuristic_terms("what are the stats of an abyssal whip?"),
            vec!["stats abyssal", "abyssal whip", "stats", "abyssal", "whip"]
        );
    }

    #[test]
    fn content_words_strip_punctuation_and_short_tokens() {
        assert_eq!(
            content_words("Where is the Grand Exchange, and can I go?"),
            vec!["grand", "exchange"]
        );
    }
}
