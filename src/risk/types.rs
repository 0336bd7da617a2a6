//! Shared risk/report vocabulary (C6, §4.6 and §6).

use serde::{Deserialize, Serialize};

/// The six fixed dimensions the weighted consistency score is computed
/// over (§4.6). Weights sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubScoreCategory {
    AlgorithmFamily,
    DataSplit,
    LeakageExclusion,
    BoundsClipping,
    ArtifactsSeeds,
    MetricsAgreement,
}

impl SubScoreCategory {
    pub const ALL: [SubScoreCategory; 6] = [
        SubScoreCategory::AlgorithmFamily,
        SubScoreCategory::DataSplit,
        SubScoreCategory::LeakageExclusion,
        SubScoreCategory::BoundsClipping,
        SubScoreCategory::ArtifactsSeeds,
        SubScoreCategory::MetricsAgreement,
    ];

    /// Fixed weight in the consistency score (§4.6 table).
    pub fn weight(self) -> f64 {
        match self {
            SubScoreCategory::AlgorithmFamily => 0.30,
            SubScoreCategory::DataSplit => 0.15,
            SubScoreCategory::LeakageExclusion => 0.25,
            SubScoreCategory::BoundsClipping => 0.10,
            SubScoreCategory::ArtifactsSeeds => 0.05,
            SubScoreCategory::MetricsAgreement => 0.15,
        }
    }

    /// Whether a contradiction in this dimension is high-impact enough
    /// to force an overall `CRITICAL` band regardless of verified
    /// fraction (§4.6: "reserved for evaluator-flagged contradictions
    /// in high-impact dimensions (leakage, algorithm family)").
    pub fn is_high_impact(self) -> bool {
        matches!(
            self,
            SubScoreCategory::LeakageExclusion | SubScoreCategory::AlgorithmFamily
        )
    }
}

/// Per-claim verification outcome as surfaced in the report (§4 glossary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Verified,
    Partial,
    NotVerified,
    Failed,
}

impl MatchStatus {
    /// Classify from a verdict's `verified`/`confidence` pair. A verdict
    /// that used the heuristic fallback with low confidence is `Failed`
    /// rather than `NotVerified` — the sandbox never actually ran.
    pub fn from_verdict(verified: bool, confidence: f64, used_fallback: bool) -> Self {
        if used_fallback && confidence <= 0.1 {
            return MatchStatus::Failed;
        }
        match (verified, confidence) {
            (true, c) if c >= 0.7 => MatchStatus::Verified,
            (true, _) => MatchStatus::Partial,
            (false, _) => MatchStatus::NotVerified,
        }
    }
}

/// Overall risk band (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// A single discrepancy between a claimed and observed metric value
/// (§4.6 "Metric tolerance").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricDiff {
    pub metric: String,
    pub claimed: f64,
    pub actual: f64,
    pub diff: f64,
    pub threshold: f64,
    pub file: Option<String>,
    pub cell: Option<usize>,
}

impl MetricDiff {
    /// `0.05` absolute for ratio metrics bounded in `[0, 1]`, else `5%`
    /// of the claimed value (§4.6).
    pub fn threshold_for(claimed: f64) -> f64 {
        if (0.0..=1.0).contains(&claimed) {
            0.05
        } else {
            (claimed.abs() * 0.05).max(f64::EPSILON)
        }
    }

    pub fn new(metric: impl Into<String>, claimed: f64, actual: f64) -> Self {
        let threshold = Self::threshold_for(claimed);
        Self {
            metric: metric.into(),
            claimed,
            actual,
            diff: (claimed - actual).abs(),
            threshold,
            file: None,
            cell: None,
        }
    }

    pub fn is_mismatch(&self) -> bool {
        self.diff > self.threshold
    }
}

/// Status of a single narrated finding (§6 Report shape).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingStatus {
    Confirmed,
    Contradicted,
    NotFound,
    NonVerifiable,
}

/// A per-dimension narrated claim/evidence pair in the final report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub category: SubScoreCategory,
    pub claim_id: uuid::Uuid,
    pub status: FindingStatus,
    pub detail: String,
    pub remediation: Option<String>,
}

/// Aggregate risk assessment attached to the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub overall_risk: RiskLevel,
    pub summary: String,
}
