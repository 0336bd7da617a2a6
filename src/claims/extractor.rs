//! Bounded-worker claim extraction over a model card's chunks (C4).

use std::sync::Arc;

use futures::future::join_all;
use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::cache::ClaimCache;
use crate::config::RuntimeConfig;
use crate::error::Result;
use crate::llm::{extract_json, ChatMessage, CompletionRequest, LLMClient, ModelSpec};

use super::prompts::{extraction_system_prompt, extraction_user_prompt};
use super::types::{Claim, ClaimCategory};
use super::Chunk;

#[derive(Debug, Deserialize)]
struct RawClaim {
    text: String,
    category: String,
}

#[derive(Debug, Deserialize)]
struct RawClaims {
    claims: Vec<RawClaim>,
}

/// Extract claims from every chunk, running up to `config.max_workers`
/// extractions concurrently and caching each chunk's result by content
/// hash so a re-run over an unchanged card costs nothing.
pub async fn extract_claims(
    chunks: Vec<Chunk>,
    client: Arc<dyn LLMClient>,
    cache: &ClaimCache,
    config: &RuntimeConfig,
    model_spec: &ModelSpec,
) -> Result<Vec<Claim>> {
    let semaphore = Arc::new(Semaphore::new(config.max_workers));
    let model = config.model.clone().unwrap_or_else(|| model_spec.id.clone());

    // Resolve cache hits synchronously up front; only chunks that miss go
    // through the bounded worker pool below.
    let mut claims = Vec::new();
    let mut misses = Vec::new();
    for chunk in chunks {
        let key = ClaimCache::compute_key(&format!("{model}\n{}", chunk.text));
        match cache.get::<Vec<Claim>>(&key)? {
            Some(cached) => claims.extend(cached),
            None => misses.push((key, chunk)),
        }
    }

    let tasks: Vec<_> = misses
        .into_iter()
        .map(|(key, chunk)| {
            let client = Arc::clone(&client);
            let semaphore = Arc::clone(&semaphore);
            let model = model.clone();
            let max_tokens = model_spec.tier.default_max_tokens();
            let json_mode = model_spec.supports_json_mode;

            async move {
                let _permit = semaphore.acquire().await.expect("semaphore closed unexpectedly");
                let result = extract_claims_for_chunk(&chunk, client, &model, max_tokens, json_mode).await;
                (key, chunk.index, result)
            }
        })
        .collect();

    for (key, chunk_index, result) in join_all(tasks).await {
        match result {
            Ok(extracted) => {
                cache.put(&key, &extracted, &model)?;
                claims.extend(extracted);
            }
            Err(e) => {
                warn!(chunk_index, error = %e, "claim extraction failed for chunk, skipping");
            }
        }
    }

    let deduped = dedupe_claims(claims);
    info!(claim_count = deduped.len(), "claim extraction complete");
    Ok(deduped)
}

async fn extract_claims_for_chunk(
    chunk: &Chunk,
    client: Arc<dyn LLMClient>,
    model: &str,
    max_tokens: u32,
    json_mode: bool,
) -> Result<Vec<Claim>> {
    let request = CompletionRequest::new()
        .with_model(model)
        .with_system(extraction_system_prompt())
        .with_message(ChatMessage::user(extraction_user_prompt(&chunk.heading_path, &chunk.text)))
        .with_max_tokens(max_tokens)
        .with_json_mode(json_mode);

    let response = client.complete(request).await?;
    let value = extract_json(&response.content)?;
    let raw: RawClaims = serde_json::from_value(value)?;

    debug!(chunk_index = chunk.index, claim_count = raw.claims.len(), "chunk extracted");

    Ok(raw
        .claims
        .into_iter()
        .map(|c| Claim::new(c.text, ClaimCategory::from_label(&c.category), chunk.index))
        .collect())
}

/// Remove claims whose normalized text is identical, keeping the first
/// occurrence (earliest chunk).
fn dedupe_claims(claims: Vec<Claim>) -> Vec<Claim> {
    let mut seen = std::collections::HashSet::new();
    claims
        .into_iter()
        .filter(|c| seen.insert(normalize(&c.text)))
        .collect()
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupe_keeps_first_occurrence_across_whitespace_variation() {
        let claims = vec![
            Claim::new("Accuracy is  95%", ClaimCategory::Performance, 0),
            Claim::new("accuracy is 95%", ClaimCategory::Performance, 1),
            Claim::new("Uses a transformer encoder", ClaimCategory::Architecture, 1),
        ];
        let deduped = dedupe_claims(claims);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].source_chunk_index, 0);
    }
}
