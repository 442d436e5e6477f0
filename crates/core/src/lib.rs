//! # Runelore Core
//!
//! Domain types, traits, and error definitions for the Runelore
//! query-to-answer retrieval pipeline. This crate has **zero framework
//! dependencies**: it defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every external capability (completion service, knowledge base, page
//! cache, chat gateway) is defined as a trait here. Implementations live
//! in their respective crates. This enables:
//! - Substituting fakes in tests
//! - Swapping backends via configuration
//! - Clean dependency graph (all crates depend inward on core)

pub mod cache;
pub mod channel;
pub mod completion;
pub mod error;
pub mod history;
pub mod knowledge;
pub mod query;
pub mod retrieval;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use cache::PageCache;
pub use channel::{InboundMessage, ResponseSink};
pub use completion::{ChatMessage, CompletionClient, CompletionOptions, Role};
pub use error::{CacheError, CompletionError, Error, KnowledgeError, Result};
pub use history::{
    ConversationEntry, HistoryRole, SUMMARY_SOURCE, SUMMARY_WORD_BUDGET, cap_words,
};
pub use knowledge::{KnowledgeClient, SearchCandidate};
pub use query::Query;
pub use retrieval::{Retrieval, RetrievalResult};
pub use tool::{RetrievalTool, ToolRegistry};
