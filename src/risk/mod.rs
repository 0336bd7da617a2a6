//! C6: risk aggregator & reporter. Weighted multi-dimensional consistency
//! scoring, categorical risk banding, and final report assembly (§4.6).

mod band;
mod report;
mod score;
mod types;

pub use band::band as risk_band;
pub use report::{build_report, Report, ReportMetadata};
pub use score::{consistency_score, verified_fraction};
pub use types::{
    Finding, FindingStatus, MatchStatus, MetricDiff, RiskAssessment, RiskLevel, SubScoreCategory,
};
