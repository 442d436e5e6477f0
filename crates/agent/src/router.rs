//! Tool routing.
//!
//! The router asks the chat model which registered tools a question
//! needs. When the model is unreachable, errors, or answers with nothing
//! recognizable, selection falls back to each tool's trigger patterns,
//! so routing always completes without the LLM.

use runelore_core::completion::{ChatMessage, CompletionClient, CompletionOptions};
use runelore_core::query::Query;
use runelore_core::tool::{RetrievalTool, ToolRegistry};
use std::sync::Arc;
use tracing::{debug, warn};

/// Decides which tools participate in answering a query.
pub struct ToolRouter {
    completion: Arc<dyn CompletionClient>,
}

impl ToolRouter {
    pub fn new(completion: Arc<dyn CompletionClient>) -> Self {
        Self { completion }
    }

    /// Select tools for a query, in registration order. Never fails;
    /// the worst case is an empty selection.
    pub async fn select<'a>(
        &self,
        registry: &'a ToolRegistry,
        query: &Query,
    ) -> Vec<&'a dyn RetrievalTool> {
        if registry.is_empty() {
            return Vec::new();
        }

        match self.classify(registry, query).await {
            Some(names) => {
                debug!(?names, "classifier selected tools");
                registry
                    .iter()
                    .filter(|tool| names.iter().any(|n| n == tool.name()))
                    .collect()
            }
            None => {
                debug!("classifier unusable, falling back to trigger patterns");
                Self::pattern_select(registry, query)
            }
        }
    }

    /// Ask the chat model to pick tools by name. `Some(vec![])` means the
    /// model answered "none"; `None` means the answer was unusable and
    /// the pattern fallback should decide.
    async fn classify(&self, registry: &ToolRegistry, query: &Query) -> Option<Vec<String>> {
        if !self.completion.is_available().await {
            return None;
        }

        let catalog: Vec<String> = registry
            .iter()
            .map(|tool| format!("- {}: {}", tool.name(), tool.description()))
            .collect();
        let prompt = format!(
            "You decide which lookup tools are needed to answer a question.\n\
             Available tools:\n{}\n\n\
             Question: {}\n\n\
             Respond with a comma-separated list of tool names, or 'none' if \
             the question needs no lookups. Respond with the names only.",
            catalog.join("\n"),
            query.text
        );

        let messages = [ChatMessage::user(prompt)];
        let model = self.completion.chat_model().to_string();
        let reply = match self
            .completion
            .complete(&model, &messages, CompletionOptions::short())
            .await
        {
            Ok(reply) => reply.to_lowercase(),
            Err(err) => {
                warn!(error = %err, "tool classification failed");
                return None;
            }
        };

        if reply.trim() == "none" {
            return Some(Vec::new());
        }
        // Expect "name, name"; each token must match a registered name
        // exactly, so a chatty sentence cannot select tools by accident.
        let tokens: Vec<&str> = reply
            .split(',')
            .map(|t| t.trim().trim_matches(|c| c == '\'' || c == '"' || c == '.'))
            .filter(|t| !t.is_empty())
            .collect();
        let names: Vec<String> = registry
            .names()
            .into_iter()
            .filter(|name| {
                let lowered = name.to_lowercase();
                tokens.iter().any(|t| *t == lowered)
            })
            .map(str::to_string)
            .collect();
        if names.is_empty() {
            // model said something, but nothing we can act on
            return None;
        }
        Some(names)
    }

    fn pattern_select<'a>(
        registry: &'a ToolRegistry,
        query: &Query,
    ) -> Vec<&'a dyn RetrievalTool> {
        let text = query.text.to_lowercase();
        registry
            .iter()
            .filter(|tool| tool.trigger_patterns().iter().any(|p| p.is_match(&text)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use regex::Regex;
    use runelore_core::Retrieval;
    use runelore_core::error::CompletionError;
    use runelore_core::retrieval::RetrievalResult;

    struct PatternTool {
        name: &'static str,
        patterns: Vec<Regex>,
    }

    impl PatternTool {
        fn new(name: &'static str, pattern: &str) -> Self {
            Self {
                name,
                patterns: vec![Regex::new(pattern).unwrap()],
            }
        }
    }

    #[async_trait]
    impl RetrievalTool for PatternTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "a test tool"
        }
        fn trigger_patterns(&self) -> &[Regex] {
            &self.patterns
        }
        fn glyph(&self) -> &str {
            "🔍"
        }
        async fn extract_term(
            &self,
            _query: &Query,
        ) -> Result<Option<String>, CompletionError> {
            Ok(None)
        }
        fn fallback_terms(&self, _query: &Query) -> Vec<String> {
            Vec::new()
        }
        async fn retrieve(&self, term: &str) -> Retrieval {
            Retrieval::new(RetrievalResult::Error {
                term: term.into(),
                message: "unused".into(),
            })
        }
    }

    struct FakeCompletion {
        reply: Option<&'static str>,
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
            self.reply
                .map(str::to_string)
                .ok_or(CompletionError::Unavailable)
        }
        async fn is_available(&self) -> bool {
            self.reply.is_some()
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(PatternTool::new("osrs_wiki", "whip|quest")));
        registry.register(Box::new(PatternTool::new("price_check", "price|cost")));
        registry
    }

    #[tokio::test]
    async fn classifier_reply_selects_named_tools() {
        let router = ToolRouter::new(Arc::new(FakeCompletion {
            reply: Some("osrs_wiki"),
        }));
        let registry = registry();
        let query = Query::new("tell me about whips", "alice", "c1");

        let selected = router.select(&registry, &query).await;
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name(), "osrs_wiki");
    }

    #[tokio::test]
    async fn classifier_none_means_no_tools() {
        let router = ToolRouter::new(Arc::new(FakeCompletion {
            reply: Some("none"),
        }));
        let registry = registry();
        let query = Query::new("hello there", "alice", "c1");

        assert!(router.select(&registry, &query).await.is_empty());
    }

    #[tokio::test]
    async fn unavailable_classifier_uses_trigger_patterns() {
        let router = ToolRouter::new(Arc::new(FakeCompletion { reply: None }));
        let registry = registry();
        let query = Query::new("What is the PRICE of a whip?", "alice", "c1");

        let selected = router.select(&registry, &query).await;
        let names: Vec<&str> = selected.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["osrs_wiki", "price_check"]);
    }

    #[tokio::test]
    async fn chatty_none_reply_is_not_taken_literally() {
        // "none" buried in a sentence must not clear the selection; the
        // unusable reply hands off to the trigger patterns instead.
        let router = ToolRouter::new(Arc::new(FakeCompletion {
            reply: Some("none of the others, use osrs_wiki"),
        }));
        let registry = registry();
        let query = Query::new("tell me about whips", "alice", "c1");

        let selected = router.select(&registry, &query).await;
        let names: Vec<&str> = selected.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["osrs_wiki"]);
    }

    #[tokio::test]
    async fn comma_separated_reply_selects_each_named_tool() {
        let router = ToolRouter::new(Arc::new(FakeCompletion {
            reply: Some("osrs_wiki, price_check"),
        }));
        let registry = registry();
        let query = Query::new("hello", "alice", "c1");

        let selected = router.select(&registry, &query).await;
        let names: Vec<&str> = selected.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["osrs_wiki", "price_check"]);
    }

    #[tokio::test]
    async fn unrecognizable_reply_uses_trigger_patterns() {
        let router = ToolRouter::new(Arc::new(FakeCompletion {
            reply: Some("I think you should consult a library"),
        }));
        let registry = registry();
        let query = Query::new("cost of a whip", "alice", "c1");

        let selected = router.select(&registry, &query).await;
        assert!(selected.iter().any(|t| t.name() == "price_check"));
    }
}
