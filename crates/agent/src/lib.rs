//! # Runelore Agent
//!
//! The query-to-answer pipeline: a router that decides which retrieval
//! tools a question needs, the wiki tool itself, an answer composer that
//! grounds the chat model in retrieved content, and the single-consumer
//! scheduler that drains the query queue.

pub mod compose;
pub mod router;
pub mod scheduler;
pub mod wiki_tool;

pub use compose::{AnswerComposer, ToolContribution};
pub use router::ToolRouter;
pub use scheduler::QueryScheduler;
pub use wiki_tool::WikiTool;
