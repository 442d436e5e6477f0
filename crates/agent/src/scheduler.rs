//! The single-consumer query scheduler.
//!
//! Inbound messages are screened at the gateway (command prefix, length
//! bound) and enqueued FIFO. One worker drains the queue on a fixed
//! tick, runs the full pipeline per query, and reports every outcome
//! through the response sink. A failing query never takes the worker
//! down with it.

use crate::compose::{AnswerComposer, ToolContribution};
use crate::router::ToolRouter;
use runelore_config::SchedulerConfig;
use runelore_core::channel::{InboundMessage, ResponseSink};
use runelore_core::completion::CompletionClient;
use runelore_core::history::HistoryRole;
use runelore_core::query::Query;
use runelore_core::retrieval::{Retrieval, RetrievalResult};
use runelore_core::tool::{RetrievalTool, ToolRegistry};
use runelore_memory::HistoryStore;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Queries longer than this are rejected at the gateway.
const MAX_QUERY_CHARS: usize = 2000;

const REJECT_TOO_LONG: &str = "That question is too long (2000 characters max).";
const MODEL_DOWN_NOTICE: &str =
    "Sorry, I couldn't reach my language model. Please try again later.";

/// FIFO queue plus the pipeline that drains it.
pub struct QueryScheduler {
    queue: Mutex<VecDeque<Query>>,
    registry: ToolRegistry,
    router: ToolRouter,
    composer: AnswerComposer,
    history: Arc<HistoryStore>,
    sink: Arc<dyn ResponseSink>,
    command_prefix: String,
    tick: Duration,
}

impl QueryScheduler {
    pub fn new(
        completion: Arc<dyn CompletionClient>,
        registry: ToolRegistry,
        history: Arc<HistoryStore>,
        sink: Arc<dyn ResponseSink>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            registry,
            router: ToolRouter::new(completion.clone()),
            composer: AnswerComposer::new(completion),
            history,
            sink,
            command_prefix: config.command_prefix.clone(),
            tick: Duration::from_secs(config.tick_secs),
        }
    }

    /// Screen an inbound message and enqueue it as a query. Returns
    /// whether anything was enqueued.
    pub async fn submit(&self, message: &InboundMessage) -> bool {
        let trimmed = message.text.trim();
        let Some(rest) = strip_prefix_word(trimmed, &self.command_prefix) else {
            return false;
        };
        let text = rest.trim();
        if text.is_empty() {
            return false;
        }
        if text.chars().count() > MAX_QUERY_CHARS {
            info!(author = %message.author, "rejecting over-length query");
            self.sink.rejected(message, REJECT_TOO_LONG).await;
            return false;
        }

        let query = Query::new(text, &message.author, &message.conversation_key);
        self.queue.lock().await.push_back(query);
        true
    }

    /// Drain queries forever, one per tick.
    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            self.step().await;
        }
    }

    /// Drain queries until the shutdown flag flips to `true`. A query in
    /// flight finishes before the worker returns.
    pub async fn run_until(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.step().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("scheduler shutting down");
                        return;
                    }
                }
            }
        }
    }

    /// Process at most one queued query. Returns whether one was taken.
    pub async fn step(&self) -> bool {
        let next = self.queue.lock().await.pop_front();
        match next {
            Some(query) => {
                self.process(&query).await;
                true
            }
            None => false,
        }
    }

    async fn process(&self, query: &Query) {
        info!(author = %query.submitted_by, text = %query.text, "processing query");
        self.sink.thinking(query).await;

        let transcript = self.history.transcript(&query.conversation_key).await;
        let tools = self.router.select(&self.registry, query).await;
        let used_tools = !tools.is_empty();

        let mut contributions = Vec::new();
        for tool in tools {
            self.sink.tool_started(query, tool.glyph()).await;
            let retrieval = self.run_tool(tool, query).await;
            for line in &retrieval.trail {
                self.sink.progress(query, line).await;
            }
            contributions.push(ToolContribution {
                tool: tool.name().to_string(),
                term: retrieval.result.term().to_string(),
                body: retrieval.result.body().to_string(),
                reference: retrieval.resolved_url,
            });
        }

        match self.composer.compose(query, &transcript, &contributions).await {
            Ok(answer) => {
                self.sink.answer(query, &answer).await;
                self.sink.succeeded(query, used_tools).await;
                let key = &query.conversation_key;
                self.history
                    .append(key, HistoryRole::User, &query.text, &query.submitted_by)
                    .await;
                self.history
                    .append(key, HistoryRole::Bot, &answer, "bot")
                    .await;
            }
            Err(err) => {
                warn!(error = %err, "query failed at answer composition");
                self.sink.failure(query, MODEL_DOWN_NOTICE).await;
            }
        }
    }

    /// One tool's retrieval: LLM term extraction first, then the tool's
    /// heuristic terms until one resolves.
    async fn run_tool(&self, tool: &dyn RetrievalTool, query: &Query) -> Retrieval {
        match tool.extract_term(query).await {
            Ok(Some(term)) => {
                debug!(tool = tool.name(), term, "extracted search term");
                return tool.retrieve(&term).await;
            }
            Ok(None) => debug!(tool = tool.name(), "term extraction found nothing"),
            Err(err) => warn!(tool = tool.name(), error = %err, "term extraction failed"),
        }

        let mut last = None;
        for term in tool.fallback_terms(query) {
            let retrieval = tool.retrieve(&term).await;
            if !matches!(retrieval.result, RetrievalResult::Error { .. }) {
                return retrieval;
            }
            last = Some(retrieval);
        }
        last.unwrap_or_else(|| {
            Retrieval::new(RetrievalResult::Error {
                term: query.text.clone(),
                message: "I couldn't work out what to search for.".into(),
            })
        })
    }
}

/// Strip a leading command word case-insensitively. The prefix must be
/// followed by whitespace or the end of the text, so `!aid` is not a
/// command.
fn strip_prefix_word<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    if text.len() < prefix.len() || !text.is_char_boundary(prefix.len()) {
        return None;
    }
    let (head, rest) = text.split_at(prefix.len());
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest)
    } else {
        None
    }
}
