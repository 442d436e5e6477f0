//! RetrievalTool trait: a named knowledge-retrieval capability.
//!
//! A tool bundles the heuristics the router needs (description for LLM
//! classification, ordered trigger patterns for the regex fallback, a
//! reaction glyph for status markers) with the two operations the
//! scheduler invokes: search-term extraction and retrieval.

use async_trait::async_trait;
use regex::Regex;
use crate::error::CompletionError;
use crate::query::Query;
use crate::retrieval::Retrieval;

/// The core retrieval-tool trait.
#[async_trait]
pub trait RetrievalTool: Send + Sync {
    /// The unique tool name (e.g., "osrs_wiki").
    fn name(&self) -> &str;

    /// Human-readable description, sent to the LLM for classification.
    fn description(&self) -> &str;

    /// Ordered trigger patterns for the deterministic router fallback.
    /// A tool is selected if any pattern matches the case-folded query.
    fn trigger_patterns(&self) -> &[Regex];

    /// Reaction glyph shown while this tool is in use.
    fn glyph(&self) -> &str;

    /// Extract the most relevant search term from a query via the LLM.
    /// `Ok(None)` means extraction produced nothing usable.
    async fn extract_term(
        &self,
        query: &Query,
    ) -> std::result::Result<Option<String>, CompletionError>;

    /// Heuristic candidate terms, tried in order when LLM extraction
    /// fails. Pure and always available.
    fn fallback_terms(&self, query: &Query) -> Vec<String>;

    /// Resolve a term and retrieve its distilled content.
    async fn retrieve(&self, term: &str) -> Retrieval;
}

/// An insertion-ordered registry of retrieval tools.
///
/// The router iterates tools in registration order; lookup by name is
/// used when the LLM classifier returns tool names.
pub struct ToolRegistry {
    tools: Vec<Box<dyn RetrievalTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. Replaces any existing tool with the same name,
    /// keeping its position.
    pub fn register(&mut self, tool: Box<dyn RetrievalTool>) {
        if let Some(existing) = self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            *existing = tool;
        } else {
            self.tools.push(tool);
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn RetrievalTool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// Iterate tools in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn RetrievalTool> {
        self.tools.iter().map(|t| t.as_ref())
    }

    /// All registered tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
