//! C7: top-level orchestration. Wires C4 (chunk + extract), C5 (CodeAct
//! verify, which itself calls into C1's search toolbox from inside
//! generated programs), and C6 (risk aggregation) into the single
//! `verify(card_text, repo_root)` entry point (§4.7).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use crate::cache::ClaimCache;
use crate::claims::{chunk_text, extract_claims};
use crate::config::RuntimeConfig;
use crate::error::Result;
use crate::llm::{LLMClient, ModelSpec};
use crate::progress::ProgressEvent;
use crate::risk::{build_report, Report, ReportMetadata};
use crate::search::Match;
use crate::verify::verify_claims_batched;

/// Run the full verification pipeline against already-extracted card text
/// and a local repository checkout (§4.7). `model_spec` selects the
/// gateway model and, via its tier, the CodeAct batch size (§4.5.1).
/// `on_event` receives every progress event as it's produced, terminated
/// by exactly one `complete` or `error` event (§6).
pub async fn verify(
    card_text: &str,
    repo_root: &std::path::Path,
    client: Arc<dyn LLMClient>,
    cache: &ClaimCache,
    config: &RuntimeConfig,
    model_spec: &ModelSpec,
    mut on_event: impl FnMut(ProgressEvent),
) -> Result<Report> {
    let chunks = chunk_text(card_text);
    let chunk_count = chunks.len();
    on_event(ProgressEvent::progress(
        "extracting claims",
        serde_json::json!({"phase": "extracting", "chunks": chunk_count}),
    ));

    let claims = match extract_claims(chunks, Arc::clone(&client), cache, config, model_spec).await {
        Ok(claims) => claims,
        Err(e) => {
            on_event(ProgressEvent::error(format!("claim extraction failed: {e}")));
            return Err(e);
        }
    };
    on_event(ProgressEvent::progress(
        "claims extracted",
        serde_json::json!({"phase": "extracting", "claim_count": claims.len()}),
    ));

    let claim_inputs: Vec<(uuid::Uuid, String)> =
        claims.iter().map(|c| (c.id, c.text.clone())).collect();

    on_event(ProgressEvent::progress(
        "generating and executing verification programs",
        serde_json::json!({"phase": "executing", "claims": claim_inputs.len()}),
    ));
    let verdicts = verify_claims_batched(&claim_inputs, &client, model_spec, repo_root).await;

    on_event(ProgressEvent::progress(
        "scoring",
        serde_json::json!({"phase": "scoring"}),
    ));

    let evidence_report: HashMap<String, Vec<Match>> = verdicts
        .iter()
        .map(|v| {
            let matches = v
                .evidence
                .evidence_details
                .iter()
                .map(|d| Match {
                    file: std::path::PathBuf::from(&d.file),
                    line: d.line.or(d.cell).unwrap_or(0),
                    content: d.snippet.clone(),
                    context: Vec::new(),
                })
                .collect();
            (v.claim_id.to_string(), matches)
        })
        .collect();

    let metadata = ReportMetadata {
        provider: model_spec.provider.to_string(),
        model: model_spec.id.clone(),
        chunk_count,
        generated_at: Utc::now(),
        cache_key: None,
    };

    let report = build_report(
        None,
        claims,
        verdicts,
        Vec::new(),
        evidence_report,
        HashMap::new(),
        metadata,
        config,
    );

    on_event(ProgressEvent::progress(
        "scored",
        serde_json::json!({"phase": "scoring", "risk_band": format!("{:?}", report.overall_risk)}),
    ));
    on_event(ProgressEvent::complete(
        serde_json::to_value(&report).unwrap_or(serde_json::Value::Null),
    ));

    Ok(report)
}
