//! Risk banding (§4.6): overall risk from verified fraction, with
//! evaluator-flagged high-impact contradictions forcing `Critical`.

use crate::config::RuntimeConfig;

use super::types::{RiskLevel, SubScoreCategory};

/// Band the verified fraction `f` per `RuntimeConfig`'s thresholds:
/// `High` if `f < risk_band_high_max`, `Medium` if `f < risk_band_medium_max`,
/// `Low` otherwise. A contradiction in a high-impact dimension (leakage,
/// algorithm family) escalates to `Critical` regardless of `f`.
pub fn band(
    verified_fraction: f64,
    sub_scores: &std::collections::HashMap<SubScoreCategory, f64>,
    config: &RuntimeConfig,
) -> RiskLevel {
    let high_impact_contradiction = SubScoreCategory::ALL
        .iter()
        .filter(|c| c.is_high_impact())
        .any(|c| sub_scores.get(c).copied().unwrap_or(0.5) < 0.25);

    if high_impact_contradiction {
        return RiskLevel::Critical;
    }

    if verified_fraction < config.risk_band_high_max {
        RiskLevel::High
    } else if verified_fraction < config.risk_band_medium_max {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn low_fraction_is_high_risk() {
        let config = RuntimeConfig::new(crate::llm::Provider::Anthropic, "key", "/repo");
        assert_eq!(band(0.3, &HashMap::new(), &config), RiskLevel::High);
    }

    #[test]
    fn mid_fraction_is_medium_risk() {
        let config = RuntimeConfig::new(crate::llm::Provider::Anthropic, "key", "/repo");
        assert_eq!(band(0.7, &HashMap::new(), &config), RiskLevel::Medium);
    }

    #[test]
    fn high_fraction_is_low_risk() {
        let config = RuntimeConfig::new(crate::llm::Provider::Anthropic, "key", "/repo");
        assert_eq!(band(0.95, &HashMap::new(), &config), RiskLevel::Low);
    }

    #[test]
    fn leakage_contradiction_forces_critical_even_with_high_fraction() {
        let config = RuntimeConfig::new(crate::llm::Provider::Anthropic, "key", "/repo");
        let mut sub_scores = HashMap::new();
        sub_scores.insert(SubScoreCategory::LeakageExclusion, 0.0);
        assert_eq!(band(0.95, &sub_scores, &config), RiskLevel::Critical);
    }

    #[test]
    fn custom_thresholds_are_respected() {
        let config = RuntimeConfig::new(crate::llm::Provider::Anthropic, "key", "/repo")
            .with_risk_bands(0.2, 0.6);
        assert_eq!(band(0.3, &HashMap::new(), &config), RiskLevel::Medium);
    }
}
