//! Ollama completion client.
//!
//! Speaks the native Ollama HTTP API:
//! - `POST /api/chat` for completions (non-streaming and NDJSON streaming)
//! - `GET /api/tags` as the liveness probe
//!
//! Each request carries its own timeout from `CompletionOptions`; a
//! timeout maps to `CompletionError::Timeout` and is handled by callers
//! exactly like any other call failure.

use async_trait::async_trait;
use futures::StreamExt;
use runelore_core::completion::{ChatMessage, CompletionClient, CompletionOptions, Role};
use runelore_core::error::CompletionError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// A client for an Ollama-style completion endpoint.
///
/// Carries the configured chat and summary model identifiers so call
/// sites pick the right model per task.
pub struct OllamaClient {
    base_url: String,
    chat_model: String,
    summary_model: String,
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(
        base_url: impl Into<String>,
        chat_model: impl Into<String>,
        summary_model: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            chat_model: chat_model.into(),
            summary_model: summary_model.into(),
            client,
        }
    }

    /// Build a client from the configuration section.
    pub fn from_config(config: &runelore_config::CompletionConfig) -> Self {
        Self::new(
            &config.base_url,
            &config.chat_model,
            &config.summary_model,
        )
    }

    fn to_api_messages(messages: &[ChatMessage]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: match m.role {
                    Role::System => "system".into(),
                    Role::User => "user".into(),
                    Role::Assistant => "assistant".into(),
                },
                content: m.content.clone(),
            })
            .collect()
    }

    fn map_send_error(e: reqwest::Error) -> CompletionError {
        if e.is_timeout() {
            CompletionError::Timeout(e.to_string())
        } else {
            CompletionError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl CompletionClient for OllamaClient {
    fn chat_model(&self) -> &str {
        &self.chat_model
    }

    fn summary_model(&self) -> &str {
        &self.summary_model
    }

    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        opts: CompletionOptions,
    ) -> Result<String, CompletionError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = serde_json::json!({
            "model": model,
            "messages": Self::to_api_messages(messages),
            "stream": false,
        });

        debug!(model, timeout_secs = opts.timeout_secs, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(opts.timeout_secs))
            .json(&body)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Completion endpoint returned error");
            return Err(CompletionError::Api {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Malformed(format!("failed to parse response: {e}")))?;

        Ok(api_response.message.content)
    }

    async fn complete_stream(
        &self,
        model: &str,
        messages: &[ChatMessage],
        opts: CompletionOptions,
    ) -> Result<
        tokio::sync::mpsc::Receiver<Result<String, CompletionError>>,
        CompletionError,
    > {
        let url = format!("{}/api/chat", self.base_url);
        let body = serde_json::json!({
            "model": model,
            "messages": Self::to_api_messages(messages),
            "stream": true,
        });

        debug!(model, "Sending streaming completion request");

        let response = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(opts.timeout_secs))
            .json(&body)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Api {
                status_code: status,
                message: error_body,
            });
        }

        let (tx, rx) = tokio::sync::mpsc::channel(64);

        // Read the NDJSON byte stream line by line until `done: true`.
        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(CompletionError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&bytes));

                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim().to_string();
                    buffer = buffer[line_end + 1..].to_string();

                    if line.is_empty() {
                        continue;
                    }

                    match serde_json::from_str::<StreamLine>(&line) {
                        Ok(parsed) => {
                            if let Some(msg) = parsed.message {
                                if !msg.content.is_empty()
                                    && tx.send(Ok(msg.content)).await.is_err()
                                {
                                    return; // receiver dropped
                                }
                            }
                            if parsed.done {
                                return;
                            }
                        }
                        Err(e) => {
                            trace!(line = %line, error = %e, "Ignoring unparseable NDJSON line");
                        }
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Completion liveness probe failed");
                false
            }
        }
    }
}

// --- Ollama API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ApiMessage,
}

/// One NDJSON line of a streaming response.
#[derive(Debug, Deserialize)]
struct StreamLine {
    #[serde(default)]
    message: Option<ApiMessage>,
    #[serde(default)]
    done: bool,
}
