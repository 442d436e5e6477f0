//! Wiki retrieval pipeline for Runelore.
//!
//! Turns a fuzzy search phrase into a distilled, cacheable answer body:
//!
//! - [`client`]: the MediaWiki opensearch/fetch capability
//! - [`resolver`]: validate/disambiguate/retry term resolution
//! - [`extract`]: structural extraction of sections and the link graph
//! - [`distill`]: chunk-and-reduce summarization with a truncation floor
//! - [`retriever`]: cache-aware orchestration of the above

pub mod client;
pub mod distill;
pub mod extract;
pub mod resolver;
pub mod retriever;

pub use client::MediaWikiClient;
pub use distill::Distiller;
pub use resolver::{Resolution, SearchResolver};
pub use retriever::Retriever;
