//! Search term resolution.
//!
//! Maps a free-text phrase to one canonical wiki URL through fuzzy
//! search, LLM disambiguation with a deterministic string-matching
//! ladder behind it, and a bounded retry-with-reformulation loop.

use runelore_core::completion::{ChatMessage, CompletionClient, CompletionOptions};
use runelore_core::knowledge::{KnowledgeClient, SearchCandidate};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The terminal state of a retry-with-reformulation run.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// A canonical URL was found for (a possibly reformulated) term.
    Resolved {
        term: String,
        url: String,
        trail: Vec<String>,
    },
    /// Every attempt came back empty.
    Unresolved {
        term: String,
        attempts: u32,
        trail: Vec<String>,
    },
}

/// Resolves fuzzy search phrases against the knowledge base.
pub struct SearchResolver {
    knowledge: Arc<dyn KnowledgeClient>,
    completion: Arc<dyn CompletionClient>,
    max_retries: u32,
}

impl SearchResolver {
    pub fn new(
        knowledge: Arc<dyn KnowledgeClient>,
        completion: Arc<dyn CompletionClient>,
        max_retries: u32,
    ) -> Self {
        Self {
            knowledge,
            completion,
            max_retries,
        }
    }

    /// One resolution attempt: `(validated_term, Some(url))` on success,
    /// `(term, None)` when the search yields nothing. Search transport
    /// failures are logged and treated as "no candidates" so the retry
    /// loop keeps its budget semantics.
    pub async fn resolve(&self, term: &str) -> (String, Option<String>) {
        let candidates = match self.knowledge.search(term).await {
            Ok(c) => c,
            Err(e) => {
                warn!(term, error = %e, "Search failed, treating as unresolved");
                return (term.to_string(), None);
            }
        };

        match candidates.len() {
            0 => (term.to_string(), None),
            1 => {
                let only = &candidates[0];
                info!(term, label = %only.label, "Single match found");
                (only.label.clone(), Some(only.url.clone()))
            }
            _ => {
                let chosen = self.disambiguate(term, &candidates).await;
                (chosen.label.clone(), Some(chosen.url.clone()))
            }
        }
    }

    /// Pick one candidate from many: LLM ranking first, the deterministic
    /// ladder whenever the classifier is unavailable, fails, or answers
    /// with anything that is neither a verbatim label nor an in-range
    /// 1-based index.
    async fn disambiguate<'a>(
        &self,
        term: &str,
        candidates: &'a [SearchCandidate],
    ) -> &'a SearchCandidate {
        if !self.completion.is_available().await {
            warn!(term, "Classifier unavailable, falling back to string matching");
            return fallback_ladder(term, candidates);
        }

        let listing = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{}. {}", i + 1, c.label))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "You are helping to find the most relevant wiki page for a search term.\n\n\
             Original search term: \"{term}\"\n\n\
             Possible matches from the wiki:\n{listing}\n\n\
             Instructions:\n\
             1. Choose the most relevant match for the original search term\n\
             2. Consider the context of Old School RuneScape\n\
             3. Return ONLY the exact match from the list (or its number), nothing else\n\n\
             Your choice:"
        );

        let response = self
            .completion
            .complete(
                self.completion.chat_model(),
                &[ChatMessage::user(prompt)],
                CompletionOptions::short(),
            )
            .await;

        match response {
            Ok(raw) => {
                let chosen = raw.trim().trim_matches('"').trim_matches('\'').trim();
                if let Some(c) = candidates.iter().find(|c| c.label == chosen) {
                    info!(term, label = %c.label, "Classifier chose best match");
                    return c;
                }
                if let Ok(index) = chosen.parse::<usize>() {
                    if (1..=candidates.len()).contains(&index) {
                        let c = &candidates[index - 1];
                        info!(term, label = %c.label, "Classifier chose match by index");
                        return c;
                    }
                }
                warn!(term, response = %chosen, "Unusable classifier response, falling back");
                fallback_ladder(term, candidates)
            }
            Err(e) => {
                warn!(term, error = %e, "Classifier call failed, falling back");
                fallback_ladder(term, candidates)
            }
        }
    }

    /// Resolve with the retry-with-reformulation loop.
    ///
    /// Makes at most `max_retries + 1` resolution attempts. Whenever an
    /// attempt is unresolved and budget remains, asks the completion
    /// client for a more specific term; if reformulation itself fails the
    /// loop terminates early.
    pub async fn resolve_with_retry(&self, term: &str) -> Resolution {
        let mut current = term.to_string();
        let mut trail = Vec::new();
        let mut attempts = 0u32;

        while attempts <= self.max_retries {
            trail.push(format!("Searching the wiki for '{current}'..."));
            let (validated, url) = self.resolve(&current).await;
            attempts += 1;

            if let Some(url) = url {
                return Resolution::Resolved {
                    term: validated,
                    url,
                    trail,
                };
            }

            debug!(
                term = %current,
                attempt = attempts,
                budget = self.max_retries + 1,
                "No valid URL found for search term"
            );

            if attempts > self.max_retries {
                break;
            }

            match self.reformulate(&current).await {
                Some(new_term) => {
                    info!(from = %current, to = %new_term, "Retrying with new search term");
                    trail.push(format!("No results found. Trying '{new_term}' instead..."));
                    current = new_term;
                }
                None => break,
            }
        }

        Resolution::Unresolved {
            term: current,
            attempts,
            trail,
        }
    }

    /// Ask for a more specific alternative term. `None` on any failure.
    async fn reformulate(&self, term: &str) -> Option<String> {
        if !self.completion.is_available().await {
            return None;
        }

        let prompt = format!(
            "The search term \"{term}\" didn't yield any results on the wiki.\n\
             Please suggest a different, more specific search term that might work better.\n\
             Consider:\n\
             1. Using the exact name of an item, quest, monster, or location\n\
             2. Removing any level requirements or specific details\n\
             3. Using more general terms\n\n\
             Return ONLY the new search term, nothing else.\n\n\
             Examples:\n\
             Original: \"slayer master at level 40\"\n\
             Better: \"Slayer master\"\n\n\
             Original: \"how to get rune platebody\"\n\
             Better: \"Rune platebody\"\n\n\
             Original: \"best way to train agility at level 30\"\n\
             Better: \"Agility training\""
        );

        match self
            .completion
            .complete(
                self.completion.chat_model(),
                &[ChatMessage::user(prompt)],
                CompletionOptions::short(),
            )
            .await
        {
            Ok(raw) => {
                let new_term = raw.trim().trim_matches('"').trim_matches('\'').to_string();
                if new_term.is_empty() {
                    None
                } else {
                    Some(new_term)
                }
            }
            Err(e) => {
                warn!(term, error = %e, "Error generating new search term");
                None
            }
        }
    }
}

/// The deterministic fallback ladder, evaluated in fixed order. Never
/// fails to produce a result as long as at least one candidate exists.
fn fallback_ladder<'a>(term: &str, candidates: &'a [SearchCandidate]) -> &'a SearchCandidate {
    // 1. exact case-sensitive match
    if let Some(c) = candidates.iter().find(|c| c.label == term) {
        return c;
    }

    // 2. case-insensitive exact match
    let lower = term.to_lowercase();
    if let Some(c) = candidates.iter().find(|c| c.label.to_lowercase() == lower) {
        return c;
    }

    // 3. label containing the lower-cased term as a substring
    if let Some(c) = candidates
        .iter()
        .find(|c| c.label.to_lowercase().contains(&lower))
    {
        return c;
    }

    // 4. first candidate in search-ranked order
    &candidates[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use runelore_core::error::{CompletionError, KnowledgeError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A knowledge fake returning a fixed candidate list and counting
    /// search calls.
    struct FakeKnowledge {
        candidates: Vec<SearchCandidate>,
        searches: AtomicUsize,
    }

    impl FakeKnowledge {
        fn new(candidates: Vec<SearchCandidate>) -> Self {
            Self {
                candidates,
                searches: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl KnowledgeClient for FakeKnowledge {
        async fn search(&self, _term: &str) -> Result<Vec<SearchCandidate>, KnowledgeError> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            Ok(self.candidates.clone())
        }

        async fn fetch(&self, _url: &str) -> Result<String, KnowledgeError> {
            Ok(String::new())
        }
    }

    /// A completion fake with a scripted reply, optional unavailability,
    /// and a call counter.
    struct FakeCompletion {
        reply: Option<String>,
        available: bool,
        calls: AtomicUsize,
    }

    impl FakeCompletion {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.into()),
                available: true,
                calls: AtomicUsize::new(0),
            }
        }

        fn unavailable() -> Self {
            Self {
                reply: None,
                available: false,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for FakeCompletion {
        fn chat_model(&self) -> &str {
            "fake-chat"
        }
        fn summary_model(&self) -> &str {
            "fake-summary"
        }

        async fn complete(
            &self,
            _model: &str,
            _messages: &[ChatMessage],
            _opts: CompletionOptions,
        ) -> Result<String, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().ok_or(CompletionError::Unavailable)
        }

        async fn is_available(&self) -> bool {
            self.available
        }
    }

    fn candidate(label: &str) -> SearchCandidate {
        SearchCandidate::new(label, format!("https://w.example/w/{}", label.replace(' ', "_")))
    }

    fn resolver(
        candidates: Vec<SearchCandidate>,
        completion: FakeCompletion,
    ) -> (SearchResolver, Arc<FakeCompletion>) {
        let completion = Arc::new(completion);
        (
            SearchResolver::new(
                Arc::new(FakeKnowledge::new(candidates)),
                completion.clone(),
                3,
            ),
            completion,
        )
    }

    #[tokio::test]
    async fn single_candidate_skips_classifier() {
        let (resolver, completion) =
            resolver(vec![candidate("Abyssal whip")], FakeCompletion::replying("unused"));

        let (term, url) = resolver.resolve("abyssal whip").await;
        assert_eq!(term, "Abyssal whip");
        assert_eq!(url.as_deref(), Some("https://w.example/w/Abyssal_whip"));
        assert_eq!(completion.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn zero_candidates_is_unresolved() {
        let (resolver, _) = resolver(vec![], FakeCompletion::unavailable());
        let (term, url) = resolver.resolve("nothing here").await;
        assert_eq!(term, "nothing here");
        assert!(url.is_none());
    }

    #[tokio::test]
    async fn classifier_index_selects_second_candidate() {
        let (resolver, _) = resolver(
            vec![candidate("Dragon dagger"), candidate("Dragon scimitar"), candidate("Dragon")],
            FakeCompletion::replying("2"),
        );

        let (term, url) = resolver.resolve("dragon weapon").await;
        assert_eq!(term, "Dragon scimitar");
        assert_eq!(url.as_deref(), Some("https://w.example/w/Dragon_scimitar"));
    }

    #[tokio::test]
    async fn classifier_verbatim_label_wins() {
        let (resolver, _) = resolver(
            vec![candidate("Rune platebody"), candidate("Rune platelegs")],
            FakeCompletion::replying("\"Rune platelegs\""),
        );

        let (term, _) = resolver.resolve("rune armour").await;
        assert_eq!(term, "Rune platelegs");
    }

    // The ladder tests each construct a candidate set satisfying exactly
    // one rung.

    #[tokio::test]
    async fn ladder_exact_match() {
        let candidates = vec![candidate("whip"), candidate("Whip")];
        assert_eq!(fallback_ladder("Whip", &candidates).label, "Whip");
    }

    #[tokio::test]
    async fn ladder_case_insensitive_match() {
        let candidates = vec![candidate("Dragon slayer guide"), candidate("Dragon Slayer")];
        assert_eq!(fallback_ladder("dragon slayer", &candidates).label, "Dragon Slayer");
    }

    #[tokio::test]
    async fn ladder_substring_match() {
        let candidates = vec![candidate("Granite maul"), candidate("Abyssal whip (broken)")];
        assert_eq!(
            fallback_ladder("abyssal whip", &candidates).label,
            "Abyssal whip (broken)"
        );
    }

    #[tokio::test]
    async fn ladder_first_ranked_fallback() {
        let candidates = vec![candidate("Granite maul"), candidate("Dharok's greataxe")];
        assert_eq!(fallback_ladder("bandos godsword", &candidates).label, "Granite maul");
    }

    #[tokio::test]
    async fn unavailable_classifier_uses_ladder() {
        let (resolver, completion) = resolver(
            vec![candidate("Granite maul"), candidate("Abyssal whip")],
            FakeCompletion::unavailable(),
        );

        let (term, _) = resolver.resolve("abyssal whip").await;
        assert_eq!(term, "Abyssal whip");
        assert_eq!(completion.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn retry_budget_caps_total_attempts() {
        // Zero candidates forever; reformulation keeps producing terms.
        let knowledge = Arc::new(FakeKnowledge::new(vec![]));
        let completion = Arc::new(FakeCompletion::replying("Slayer master"));
        let resolver = SearchResolver::new(knowledge.clone(), completion, 3);

        let resolution = resolver.resolve_with_retry("slayer master at level 40").await;
        match resolution {
            Resolution::Unresolved { attempts, trail, .. } => {
                assert_eq!(attempts, 4); // initial + 3 retries
                assert_eq!(knowledge.searches.load(Ordering::SeqCst), 4);
                assert!(trail.iter().any(|l| l.contains("Trying 'Slayer master'")));
            }
            other => panic!("expected Unresolved, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reformulation_failure_terminates_early() {
        let knowledge = Arc::new(FakeKnowledge::new(vec![]));
        let resolver =
            SearchResolver::new(knowledge.clone(), Arc::new(FakeCompletion::unavailable()), 3);

        let resolution = resolver.resolve_with_retry("nothing").await;
        match resolution {
            Resolution::Unresolved { attempts, .. } => {
                assert_eq!(attempts, 1);
                assert_eq!(knowledge.searches.load(Ordering::SeqCst), 1);
            }
            other => panic!("expected Unresolved, got {other:?}"),
        }
    }
}
