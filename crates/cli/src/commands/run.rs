//! The interactive `run` command: a terminal REPL in front of the
//! scheduler. Lines from stdin go through the same gateway screening as
//! any other channel; a background worker drains the queue.

use anyhow::Result;
use async_trait::async_trait;
use runelore_agent::{QueryScheduler, WikiTool};
use runelore_config::AppConfig;
use runelore_core::channel::{InboundMessage, ResponseSink};
use runelore_core::completion::CompletionClient;
use runelore_core::knowledge::KnowledgeClient;
use runelore_core::query::Query;
use runelore_core::tool::ToolRegistry;
use runelore_memory::HistoryStore;
use runelore_providers::OllamaClient;
use runelore_wiki::{MediaWikiClient, Retriever};
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;

/// Renders pipeline events as plain terminal lines.
struct TerminalSink;

#[async_trait]
impl ResponseSink for TerminalSink {
    async fn thinking(&self, _query: &Query) {
        println!("… thinking");
    }

    async fn progress(&self, _query: &Query, text: &str) {
        println!("  {text}");
    }

    async fn tool_started(&self, _query: &Query, glyph: &str) {
        println!("  {glyph} consulting the wiki");
    }

    async fn answer(&self, _query: &Query, text: &str) {
        println!("\n{text}\n");
    }

    async fn succeeded(&self, _query: &Query, used_tools: bool) {
        if used_tools {
            println!("✅ answered with wiki help");
        } else {
            println!("✅ answered");
        }
    }

    async fn failure(&self, _query: &Query, message: &str) {
        println!("❌ {message}");
    }

    async fn rejected(&self, _message: &InboundMessage, notice: &str) {
        println!("❌ {notice}");
    }
}

pub async fn execute(config: AppConfig) -> Result<()> {
    let completion: Arc<dyn CompletionClient> =
        Arc::new(OllamaClient::from_config(&config.completion));
    let knowledge: Arc<dyn KnowledgeClient> = Arc::new(MediaWikiClient::from_config(&config.wiki));
    let cache = runelore_cache::from_config(&config.cache)?;

    let retriever = Retriever::new(
        knowledge,
        completion.clone(),
        cache,
        config.wiki.max_retries,
        config.cache.ttl_secs,
    );
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(WikiTool::new(completion.clone(), retriever)));

    let history = Arc::new(HistoryStore::new(
        completion.clone(),
        config.memory.max_length,
    ));
    let scheduler = Arc::new(QueryScheduler::new(
        completion,
        registry,
        history,
        Arc::new(TerminalSink),
        &config.scheduler,
    ));

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let worker = scheduler.clone();
    let worker_handle = tokio::spawn(async move { worker.run_until(shutdown_rx).await });

    let prefix = &config.scheduler.command_prefix;
    println!("Runelore ready. Ask with '{prefix} <question>'. Ctrl-D exits.");

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if !line.trim().to_lowercase().starts_with(&prefix.to_lowercase()) {
            println!("(prefix your question with '{prefix}')");
            continue;
        }
        let message = InboundMessage::new(line, "you", "terminal");
        scheduler.submit(&message).await;
    }

    let _ = shutdown_tx.send(true);
    let _ = worker_handle.await;
    println!("bye");
    Ok(())
}
