//! The 3-phase batched CodeAct verification pipeline (§4.5.1): generate a
//! verification program per claim in batches of `B` (the model tier's
//! `codeact_batch_size`), execute each program in the sandbox, then
//! evaluate every claim's gathered evidence in a second batched LLM call.
//! Codegen failure pads a batch with a no-evidence fallback program;
//! evaluation failure falls back to the §4.5.5 confidence heuristic.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::error::Result;
use crate::llm::{extract_json, ChatMessage, CompletionRequest, LLMClient, ModelSpec};

use super::codegen::{batch_codegen_system_prompt, batch_codegen_user_prompt, fallback_program};
use super::eval::{batch_eval_system_prompt, batch_eval_user_prompt, EvalItem};
use super::sandbox::{evaluate, Value};
use super::types::{EvidenceDetail, VerificationEvidence, VerificationVerdict};

#[derive(Debug, Deserialize)]
struct RawPrograms {
    programs: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    verified: bool,
    confidence: f64,
    reasoning: String,
    #[serde(default)]
    discrepancies: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawVerdicts {
    verdicts: Vec<RawVerdict>,
}

/// Verify every claim against `repo_root`, batching claims `B` at a time
/// (`B = model_spec.tier.codeact_batch_size()`), issuing one codegen call
/// and one evaluation call per batch (≈`2·ceil(N/B)` calls total, §8).
pub async fn verify_claims_batched(
    claims: &[(Uuid, String)],
    client: &Arc<dyn LLMClient>,
    model_spec: &ModelSpec,
    repo_root: &Path,
) -> Vec<VerificationVerdict> {
    let batch_size = model_spec.tier.codeact_batch_size().max(1);
    let mut verdicts = Vec::with_capacity(claims.len());

    for batch in claims.chunks(batch_size) {
        let programs = codegen_batch(batch, client, model_spec).await;

        let evidences: Vec<VerificationEvidence> = programs
            .iter()
            .map(|program| match evaluate(program, repo_root) {
                Ok(namespace) => result_to_evidence(&namespace),
                Err(e) => VerificationEvidence::empty(format!("sandbox execution failed: {e}")),
            })
            .collect();

        let eval_items: Vec<EvalItem> = batch
            .iter()
            .zip(programs.iter())
            .zip(evidences.iter())
            .map(|(((claim_id, text), program), evidence)| EvalItem {
                claim_id: *claim_id,
                claim_text: text,
                evidence,
                program,
            })
            .collect();

        let mut raw_verdicts = eval_batch(&eval_items, client, model_spec).await;

        for i in 0..batch.len() {
            let (claim_id, _) = &batch[i];
            let program = programs[i].clone();
            let evidence = evidences[i].clone();
            let verdict = match raw_verdicts[i].take() {
                Some(raw) => VerificationVerdict {
                    claim_id: *claim_id,
                    verified: raw.verified,
                    confidence: raw.confidence.clamp(0.0, 1.0),
                    reasoning: raw.reasoning,
                    discrepancies: raw.discrepancies,
                    program,
                    evidence,
                    used_fallback: false,
                },
                None => VerificationVerdict::fallback(evidence, program).with_claim(*claim_id),
            };
            verdicts.push(verdict);
        }
    }

    verdicts
}

/// Verify a single claim, via the same batched machinery with a batch of
/// one (§4.5.4 "legacy per-claim path").
pub async fn verify_claim(
    claim_id: Uuid,
    claim_text: &str,
    client: &Arc<dyn LLMClient>,
    model_spec: &ModelSpec,
    repo_root: &Path,
) -> VerificationVerdict {
    let claims = [(claim_id, claim_text.to_string())];
    verify_claims_batched(&claims, client, model_spec, repo_root)
        .await
        .into_iter()
        .next()
        .expect("verify_claims_batched returns one verdict per input claim")
}

async fn codegen_batch(
    batch: &[(Uuid, String)],
    client: &Arc<dyn LLMClient>,
    model_spec: &ModelSpec,
) -> Vec<String> {
    let request = CompletionRequest::new()
        .with_system(batch_codegen_system_prompt(batch.len()))
        .with_message(ChatMessage::user(batch_codegen_user_prompt(batch)))
        .with_max_tokens(model_spec.tier.default_max_tokens());

    match client.complete(request).await {
        Ok(response) => match parse_programs(&response.content) {
            Ok(programs) => pad_or_truncate(programs, batch.len(), fallback_program),
            Err(e) => {
                warn!(error = %e, batch_size = batch.len(), "codegen batch response unparseable, using fallback programs");
                vec![fallback_program(); batch.len()]
            }
        },
        Err(e) => {
            warn!(error = %e, batch_size = batch.len(), "codegen batch call failed, using fallback programs");
            vec![fallback_program(); batch.len()]
        }
    }
}

fn parse_programs(raw: &str) -> Result<Vec<String>> {
    let value = extract_json(raw)?;
    let parsed: RawPrograms = serde_json::from_value(value)?;
    Ok(parsed.programs)
}

fn pad_or_truncate(mut items: Vec<String>, len: usize, filler: impl Fn() -> String) -> Vec<String> {
    items.truncate(len);
    while items.len() < len {
        items.push(filler());
    }
    items
}

/// Evaluate a batch, returning one slot per item: `Some` on a clean parse,
/// `None` when the whole batch falls back to the confidence heuristic
/// (§4.5.5) because the evaluator's response couldn't be parsed or didn't
/// come back the right length.
async fn eval_batch(
    items: &[EvalItem<'_>],
    client: &Arc<dyn LLMClient>,
    model_spec: &ModelSpec,
) -> Vec<Option<RawVerdict>> {
    if items.is_empty() {
        return Vec::new();
    }

    let request = CompletionRequest::new()
        .with_system(batch_eval_system_prompt(items.len()))
        .with_message(ChatMessage::user(batch_eval_user_prompt(items)))
        .with_max_tokens(model_spec.tier.default_max_tokens());

    match client.complete(request).await {
        Ok(response) => match parse_verdicts(&response.content) {
            Ok(verdicts) if verdicts.len() == items.len() => verdicts.into_iter().map(Some).collect(),
            Ok(verdicts) => {
                warn!(
                    expected = items.len(),
                    got = verdicts.len(),
                    "evaluation batch returned the wrong number of verdicts, using fallback heuristic"
                );
                vec![None; items.len()]
            }
            Err(e) => {
                warn!(error = %e, batch_size = items.len(), "evaluation batch response unparseable, using fallback heuristic");
                vec![None; items.len()]
            }
        },
        Err(e) => {
            warn!(error = %e, batch_size = items.len(), "evaluation batch call failed, using fallback heuristic");
            vec![None; items.len()]
        }
    }
}

fn parse_verdicts(raw: &str) -> Result<Vec<RawVerdict>> {
    let value = extract_json(raw)?;
    let parsed: RawVerdicts = serde_json::from_value(value)?;
    Ok(parsed.verdicts)
}

/// Read a generated program's `result` namespace variable back into a
/// [`VerificationEvidence`] (§4.5.3): a well-formed dict is used as-is
/// (with `evidence_count` re-derived to enforce the §8 invariant
/// regardless of what the program itself set), any other value is
/// coerced to `bool(result)` with no evidence, and a missing `result` is
/// treated the same as an empty, unfound result.
fn result_to_evidence(namespace: &std::collections::HashMap<String, Value>) -> VerificationEvidence {
    match namespace.get("result") {
        Some(Value::Dict(map)) => {
            let found = map.get("found").map(Value::truthy).unwrap_or(false);
            let details = match map.get("evidence_details") {
                Some(Value::List(items)) => items.iter().filter_map(value_to_evidence_detail).collect(),
                _ => Vec::new(),
            };
            let summary = match map.get("summary") {
                Some(Value::Str(s)) => s.clone(),
                _ => String::new(),
            };
            VerificationEvidence::new(found, details, summary)
        }
        Some(other) => VerificationEvidence::new(other.truthy(), Vec::new(), "non-dict result"),
        None => VerificationEvidence::empty("generated program did not set `result`"),
    }
}

fn value_to_evidence_detail(value: &Value) -> Option<EvidenceDetail> {
    let Value::Dict(map) = value else { return None };
    let file = match map.get("file") {
        Some(Value::Str(s)) => s.clone(),
        _ => return None,
    };
    let line = match map.get("line") {
        Some(Value::Number(n)) => Some(*n as usize),
        _ => None,
    };
    let cell = match map.get("cell") {
        Some(Value::Number(n)) => Some(*n as usize),
        _ => None,
    };
    let snippet = match map.get("snippet") {
        Some(Value::Str(s)) => s.clone(),
        _ => String::new(),
    };
    Some(EvidenceDetail { file, line, cell, snippet })
}
