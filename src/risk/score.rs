//! Weighted consistency scoring (§4.6).

use std::collections::HashMap;

use crate::claims::{Claim, ClaimCategory};
use crate::verify::VerificationVerdict;

use super::types::SubScoreCategory;

/// The card's `ClaimCategory` (C4's coarse extraction taxonomy) doesn't
/// line up one-to-one with the six fixed scoring dimensions, so each
/// claim category maps to the scoring dimension it most directly
/// evidences. `Other` contributes to none — it never claims anything in
/// a scored dimension, so it is simply excluded from the sums below.
fn scoring_dimension(category: ClaimCategory) -> Option<SubScoreCategory> {
    match category {
        ClaimCategory::Architecture => Some(SubScoreCategory::AlgorithmFamily),
        ClaimCategory::Dataset => Some(SubScoreCategory::DataSplit),
        ClaimCategory::Training => Some(SubScoreCategory::ArtifactsSeeds),
        ClaimCategory::Performance => Some(SubScoreCategory::MetricsAgreement),
        ClaimCategory::Other => None,
    }
}

/// Sub-score for one dimension in `[0, 1]`: `0` on contradiction, `0.5`
/// when no claim addresses the dimension, `1.0` on confirmation, with
/// partial credit in between when a dimension has a mix of outcomes.
fn sub_score(verdicts_for_dimension: &[&VerificationVerdict]) -> f64 {
    if verdicts_for_dimension.is_empty() {
        return 0.5;
    }
    let total: f64 = verdicts_for_dimension
        .iter()
        .map(|v| if v.verified { v.confidence.max(0.5) } else { 1.0 - v.confidence.max(0.5) })
        .sum();
    (total / verdicts_for_dimension.len() as f64).clamp(0.0, 1.0)
}

/// Compute the weighted consistency score and each dimension's raw
/// sub-score, given claims and their corresponding verdicts (same order,
/// §4 "Invariants across the model").
pub fn consistency_score(
    claims: &[Claim],
    verdicts: &[VerificationVerdict],
) -> (f64, HashMap<SubScoreCategory, f64>) {
    let mut by_dimension: HashMap<SubScoreCategory, Vec<&VerificationVerdict>> = HashMap::new();

    for (claim, verdict) in claims.iter().zip(verdicts.iter()) {
        if let Some(dimension) = scoring_dimension(claim.category) {
            by_dimension.entry(dimension).or_default().push(verdict);
        }
    }

    let mut sub_scores = HashMap::new();
    let mut weighted_sum = 0.0;

    for category in SubScoreCategory::ALL {
        let verdicts_for_dimension = by_dimension.get(&category).map(Vec::as_slice).unwrap_or(&[]);
        let score = sub_score(verdicts_for_dimension);
        weighted_sum += score * category.weight();
        sub_scores.insert(category, score);
    }

    (weighted_sum.clamp(0.0, 1.0), sub_scores)
}

/// Fraction of claims the verifier considered supported — the input to
/// risk banding (§4.6).
pub fn verified_fraction(verdicts: &[VerificationVerdict]) -> f64 {
    if verdicts.is_empty() {
        return 1.0;
    }
    let verified = verdicts.iter().filter(|v| v.verified).count();
    verified as f64 / verdicts.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::VerificationEvidence;
    use uuid::Uuid;

    fn verdict(verified: bool, confidence: f64) -> VerificationVerdict {
        VerificationVerdict {
            claim_id: Uuid::nil(),
            verified,
            confidence,
            reasoning: String::new(),
            discrepancies: Vec::new(),
            program: String::new(),
            evidence: VerificationEvidence::empty(""),
            used_fallback: false,
        }
    }

    fn claim(category: ClaimCategory) -> Claim {
        Claim::new("claim text".to_string(), category, 0)
    }

    #[test]
    fn unaddressed_dimension_defaults_to_half() {
        let (_, sub_scores) = consistency_score(&[], &[]);
        for category in SubScoreCategory::ALL {
            assert_eq!(sub_scores[&category], 0.5);
        }
    }

    #[test]
    fn confirmed_claims_push_score_toward_one() {
        let claims = vec![claim(ClaimCategory::Architecture)];
        let verdicts = vec![verdict(true, 0.9)];
        let (_, sub_scores) = consistency_score(&claims, &verdicts);
        assert!(sub_scores[&SubScoreCategory::AlgorithmFamily] > 0.5);
    }

    #[test]
    fn contradicted_claims_push_score_toward_zero() {
        let claims = vec![claim(ClaimCategory::Dataset)];
        let verdicts = vec![verdict(false, 0.9)];
        let (_, sub_scores) = consistency_score(&claims, &verdicts);
        assert!(sub_scores[&SubScoreCategory::DataSplit] < 0.5);
    }

    #[test]
    fn verified_fraction_handles_empty_claim_set() {
        assert_eq!(verified_fraction(&[]), 1.0);
    }

    #[test]
    fn weights_sum_to_one() {
        let total: f64 = SubScoreCategory::ALL.iter().map(|c| c.weight()).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }
}
