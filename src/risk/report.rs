//! Report assembly (§6): the single serializable object JSON/Markdown
//! renderers outside this crate consume.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::claims::Claim;
use crate::config::RuntimeConfig;
use crate::search::Match;
use crate::verify::VerificationVerdict;

use super::band::band;
use super::score::{consistency_score, verified_fraction};
use super::types::{Finding, MetricDiff, RiskAssessment, RiskLevel};

/// Run-level metadata attached to the report (§6 `metadata`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub provider: String,
    pub model: String,
    pub chunk_count: usize,
    pub generated_at: DateTime<Utc>,
    pub cache_key: Option<String>,
}

/// The final report object (§6 Report shape). Claim order and verdict
/// order are the same (§4 "Invariants across the model").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub model_id: Option<String>,
    pub consistency_score: f64,
    pub overall_risk: RiskLevel,
    pub risk_assessment: RiskAssessment,
    pub claims: Vec<Claim>,
    pub verification_results: Vec<VerificationVerdict>,
    pub findings: Vec<Finding>,
    pub evidence: HashMap<String, Vec<Match>>,
    pub metrics_diffs: HashMap<String, MetricDiff>,
    pub metadata: ReportMetadata,
}

/// Assemble the final report from claims, their verdicts (same order),
/// collected evidence, metric discrepancies, and run metadata.
#[allow(clippy::too_many_arguments)]
pub fn build_report(
    model_id: Option<String>,
    claims: Vec<Claim>,
    verdicts: Vec<VerificationVerdict>,
    findings: Vec<Finding>,
    evidence: HashMap<String, Vec<Match>>,
    metrics_diffs: HashMap<String, MetricDiff>,
    metadata: ReportMetadata,
    config: &RuntimeConfig,
) -> Report {
    debug_assert_eq!(claims.len(), verdicts.len(), "claims and verdicts must be in lockstep");

    let (consistency, sub_scores) = consistency_score(&claims, &verdicts);
    let fraction = verified_fraction(&verdicts);
    let overall_risk = band(fraction, &sub_scores, config);

    let summary = format!(
        "{overall_risk:?} risk: {:.0}% of {} claims verified, consistency score {consistency:.2}",
        fraction * 100.0,
        claims.len(),
    );

    Report {
        model_id,
        consistency_score: consistency,
        overall_risk,
        risk_assessment: RiskAssessment { overall_risk, summary },
        claims,
        verification_results: verdicts,
        findings,
        evidence,
        metrics_diffs,
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::ClaimCategory;
    use crate::llm::Provider;
    use crate::verify::VerificationEvidence;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn sample_verdict(claim_id: Uuid, verified: bool, confidence: f64) -> VerificationVerdict {
        VerificationVerdict {
            claim_id,
            verified,
            confidence,
            reasoning: String::new(),
            discrepancies: Vec::new(),
            program: String::new(),
            evidence: VerificationEvidence::empty(""),
            used_fallback: false,
        }
    }

    fn sample_metadata(chunk_count: usize) -> ReportMetadata {
        ReportMetadata {
            provider: "anthropic".to_string(),
            model: "claude-3-5-sonnet-20241022".to_string(),
            chunk_count,
            generated_at: DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
            cache_key: None,
        }
    }

    #[test]
    fn report_preserves_claim_and_verdict_order() {
        let claims = vec![
            Claim::new("claim a", ClaimCategory::Performance, 0),
            Claim::new("claim b", ClaimCategory::Dataset, 1),
        ];
        let verdicts = vec![
            sample_verdict(claims[0].id, true, 0.9),
            sample_verdict(claims[1].id, false, 0.2),
        ];
        let config = RuntimeConfig::new(Provider::Anthropic, "key", "/repo");
        let metadata = sample_metadata(2);

        let report = build_report(
            Some("example-model".to_string()),
            claims.clone(),
            verdicts.clone(),
            Vec::new(),
            HashMap::new(),
            HashMap::new(),
            metadata,
            &config,
        );

        assert_eq!(report.claims.len(), report.verification_results.len());
        for (claim, verdict) in report.claims.iter().zip(report.verification_results.iter()) {
            assert_eq!(claim.id, verdict.claim_id);
        }
        assert!(report.consistency_score >= 0.0 && report.consistency_score <= 1.0);
        let _ = Uuid::nil();
    }

    proptest! {
        /// For any number of claims, the resulting claim/verdict vectors stay
        /// index-aligned: `verification_results[i].claim_id == claims[i].id`.
        #[test]
        fn claims_and_verdicts_stay_index_aligned(count in 0usize..20, found_seed in 0u8..255) {
            let claims: Vec<Claim> = (0..count)
                .map(|i| Claim::new(format!("claim {i}"), ClaimCategory::Other, i))
                .collect();
            let verdicts: Vec<VerificationVerdict> = claims
                .iter()
                .enumerate()
                .map(|(i, claim)| sample_verdict(claim.id, (found_seed as usize + i) % 2 == 0, 0.5))
                .collect();

            let config = RuntimeConfig::new(Provider::Anthropic, "key", "/repo");
            let metadata = sample_metadata(count);

            let report = build_report(
                None,
                claims,
                verdicts,
                Vec::new(),
                HashMap::new(),
                HashMap::new(),
                metadata,
                &config,
            );

            prop_assert_eq!(report.claims.len(), report.verification_results.len());
            for (claim, verdict) in report.claims.iter().zip(report.verification_results.iter()) {
                prop_assert_eq!(claim.id, verdict.claim_id);
            }
        }
    }
}
