//! Configuration loading, validation, and management for Runelore.
//!
//! Loads configuration from a TOML file (default `runelore.toml`) with
//! environment variable overrides. The env names match the original
//! deployment surface (`OLLAMA_URL`, `MEMORY_MAX_LENGTH`, …) so an
//! existing environment keeps working. Validates all settings at load.

use runelore_core::error::Error;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// The root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completion service settings
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Page cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Wiki / knowledge base settings
    #[serde(default)]
    pub wiki: WikiConfig,

    /// Conversation memory settings
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Query scheduler settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Base URL of the Ollama-style completion endpoint.
    #[serde(default = "default_completion_url")]
    pub base_url: String,

    /// Model used for conversational answers.
    #[serde(default = "default_model")]
    pub chat_model: String,

    /// Model used for summarization, independently overridable.
    #[serde(default = "default_model")]
    pub summary_model: String,
}

fn default_completion_url() -> String {
    "http://localhost:11434".into()
}
fn default_model() -> String {
    "llama2".into()
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: default_completion_url(),
            chat_model: default_model(),
            summary_model: default_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Backend: "memory" or "none".
    #[serde(default = "default_cache_backend")]
    pub backend: String,

    /// How long a processed page stays cached, in seconds.
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

fn default_cache_backend() -> String {
    "memory".into()
}
fn default_cache_ttl() -> u64 {
    1800
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiConfig {
    /// MediaWiki API endpoint for opensearch.
    #[serde(default = "default_wiki_api")]
    pub api_url: String,

    /// Retry budget for search-term reformulation.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_wiki_api() -> String {
    "https://oldschool.runescape.wiki/api.php".into()
}
fn default_max_retries() -> u32 {
    3
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            api_url: default_wiki_api(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Maximum entries per conversation history. 0 = summary-only mode.
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

fn default_max_length() -> usize {
    20
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between queue-draining ticks.
    #[serde(default = "default_tick")]
    pub tick_secs: u64,

    /// Command prefix an inbound message must carry to be enqueued.
    #[serde(default = "default_prefix")]
    pub command_prefix: String,
}

fn default_tick() -> u64 {
    2
}
fn default_prefix() -> String {
    "!ai".into()
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_secs: default_tick(),
            command_prefix: default_prefix(),
        }
    }
}

impl AppConfig {
    /// Load configuration: file (if present) → env overrides → validate.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let mut config = match path {
            Some(p) if p.exists() => {
                let raw = std::fs::read_to_string(p).map_err(|e| Error::Config {
                    message: format!("failed to read {}: {e}", p.display()),
                })?;
                toml::from_str(&raw).map_err(|e| Error::Config {
                    message: format!("failed to parse {}: {e}", p.display()),
                })?
            }
            _ => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    /// Apply environment variable overrides over whatever was loaded.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("OLLAMA_URL") {
            self.completion.base_url = v;
        }
        if let Ok(v) = std::env::var("OLLAMA_CHAT_MODEL") {
            self.completion.chat_model = v;
        }
        if let Ok(v) = std::env::var("OLLAMA_SUMMARY_MODEL") {
            self.completion.summary_model = v;
        }
        if let Ok(v) = std::env::var("WIKI_CACHE_DURATION") {
            if let Ok(secs) = v.parse() {
                self.cache.ttl_secs = secs;
            }
        }
        if let Ok(v) = std::env::var("WIKI_SEARCH_RETRIES") {
            if let Ok(n) = v.parse() {
                self.wiki.max_retries = n;
            }
        }
        if let Ok(v) = std::env::var("MEMORY_MAX_LENGTH") {
            if let Ok(n) = v.parse() {
                self.memory.max_length = n;
            }
        }
    }

    /// Validate settings that have no sensible degraded behavior.
    fn validate(&self) -> Result<(), Error> {
        match self.cache.backend.as_str() {
            "memory" | "none" => {}
            other => {
                return Err(Error::Config {
                    message: format!(
                        "unknown cache backend '{other}' (expected \"memory\" or \"none\")"
                    ),
                });
            }
        }
        if self.completion.base_url.is_empty() {
            return Err(Error::Config {
                message: "completion.base_url must not be empty".into(),
            });
        }
        if self.scheduler.command_prefix.is_empty() {
            return Err(Error::Config {
                message: "scheduler.command_prefix must not be empty".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.ttl_secs, 1800);
        assert_eq!(config.memory.max_length, 20);
        assert_eq!(config.wiki.max_retries, 3);
        assert_eq!(config.scheduler.tick_secs, 2);
        assert_eq!(config.scheduler.command_prefix, "!ai");
    }

    #[test]
    fn loads_partial_toml_with_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            "[completion]\nchat_model = \"mistral\"\n\n[memory]\nmax_length = 0\n"
        )
        .unwrap();

        let config = AppConfig::load(Some(f.path())).unwrap();
        assert_eq!(config.completion.chat_model, "mistral");
        // untouched sections keep defaults
        assert_eq!(config.completion.summary_model, "llama2");
        assert_eq!(config.memory.max_length, 0);
        assert_eq!(config.cache.backend, "memory");
    }

    #[test]
    fn rejects_unknown_cache_backend() {
        let mut config = AppConfig::default();
        config.cache.backend = "redis-cluster".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = AppConfig::load(Some(Path::new("/nonexistent/runelore.toml"))).unwrap();
        assert_eq!(config.completion.base_url, "http://localhost:11434");
    }
}
