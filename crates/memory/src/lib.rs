//! # Runelore Memory
//!
//! Bounded per-conversation history. Each conversation keeps at most a
//! configured number of entries; when an append would exceed the bound,
//! the oldest raw entries are folded into a single running summary entry
//! instead of being dropped outright.

mod store;

pub use store::HistoryStore;
