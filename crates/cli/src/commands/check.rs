//! The `check` command: liveness probes for every external collaborator.

use anyhow::{Result, bail};
use runelore_config::AppConfig;
use runelore_core::cache::PageCache;
use runelore_core::completion::CompletionClient;
use runelore_core::knowledge::KnowledgeClient;
use runelore_providers::OllamaClient;
use runelore_wiki::MediaWikiClient;

fn report(name: &str, ok: bool, detail: &str) {
    let marker = if ok { "✅" } else { "❌" };
    println!("{marker} {name}: {detail}");
}

pub async fn execute(config: AppConfig) -> Result<()> {
    let completion = OllamaClient::from_config(&config.completion);
    let completion_ok = completion.is_available().await;
    report(
        "ollama",
        completion_ok,
        &format!(
            "{} (chat={}, summary={})",
            config.completion.base_url, config.completion.chat_model, config.completion.summary_model
        ),
    );

    let cache = runelore_cache::from_config(&config.cache)?;
    let cache_ok = cache.is_available().await;
    report("cache", cache_ok, cache.name());

    let wiki = MediaWikiClient::from_config(&config.wiki);
    let wiki_ok = match wiki.search("Abyssal whip").await {
        Ok(candidates) => {
            report(
                "wiki",
                true,
                &format!("{} ({} probe results)", config.wiki.api_url, candidates.len()),
            );
            true
        }
        Err(err) => {
            report("wiki", false, &format!("{} ({err})", config.wiki.api_url));
            false
        }
    };

    if !completion_ok || !wiki_ok {
        bail!("one or more required services are unreachable");
    }
    Ok(())
}
