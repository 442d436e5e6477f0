//! Completion service implementations for Runelore.
//!
//! All clients implement the `runelore_core::CompletionClient` trait.

pub mod ollama;

pub use ollama::OllamaClient;
