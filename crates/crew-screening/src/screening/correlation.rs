//! Cross-engine contradiction detection.
//!
//! Each pattern is an independent threshold check over the latest engine outputs; several
//! may fire at once. The analyzer can ask for a note or a review but never for a rejection.

use serde::{Deserialize, Serialize};

use super::calibration::CorrelationThresholds;
use super::guardrails::{clamp_unit, round_to};

pub const CLEAN_SUMMARY: &str = "No cross-engine anomalies detected";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationPattern {
    ExpertUnstable,
    StableButWeak,
    HighSkillHighRisk,
    CompliantLowExperience,
}

impl CorrelationPattern {
    pub const fn code(self) -> &'static str {
        match self {
            Self::ExpertUnstable => "expert_unstable",
            Self::StableButWeak => "stable_but_weak",
            Self::HighSkillHighRisk => "high_skill_high_risk",
            Self::CompliantLowExperience => "compliant_low_experience",
        }
    }

    pub const fn risk_weight(self) -> f64 {
        match self {
            Self::ExpertUnstable | Self::HighSkillHighRisk => 0.30,
            Self::StableButWeak | Self::CompliantLowExperience => 0.20,
        }
    }

    pub const fn impact(self) -> CorrelationImpact {
        match self {
            Self::ExpertUnstable | Self::HighSkillHighRisk => CorrelationImpact::Review,
            Self::StableButWeak | Self::CompliantLowExperience => CorrelationImpact::Note,
        }
    }
}

/// Outcome the analyzer may request from the decision layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationImpact {
    Note,
    Review,
}

/// Latest scalar outputs of the other engines. Absent values disable the patterns that need them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationInput {
    pub technical_score: Option<f64>,
    pub technical_depth_index: Option<f64>,
    pub stability_index: Option<f64>,
    pub risk_score: Option<f64>,
    pub compliance_score: Option<f64>,
    pub competency_score: Option<f64>,
    pub total_sea_months: Option<f64>,
}

impl CorrelationInput {
    /// Depth index when the role is in scope, otherwise the technical dimension score.
    pub fn depth_signal(&self) -> Option<f64> {
        self.technical_depth_index.or(self.technical_score)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationFlag {
    pub pattern: CorrelationPattern,
    pub code: String,
    pub impact: CorrelationImpact,
    pub risk_weight: f64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub flags: Vec<CorrelationFlag>,
    pub total_risk_weight: f64,
    pub decision_impact: Option<CorrelationImpact>,
    pub summary: String,
}

impl CorrelationResult {
    pub fn is_clean(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn has(&self, pattern: CorrelationPattern) -> bool {
        self.flags.iter().any(|flag| flag.pattern == pattern)
    }
}

pub struct CorrelationAnalyzer {
    thresholds: CorrelationThresholds,
}

impl Default for CorrelationAnalyzer {
    fn default() -> Self {
        Self::new(CorrelationThresholds::default())
    }
}

impl CorrelationAnalyzer {
    pub fn new(thresholds: CorrelationThresholds) -> Self {
        Self { thresholds }
    }

    pub fn analyze(&self, input: &CorrelationInput) -> CorrelationResult {
        let t = &self.thresholds;
        let depth = input.depth_signal();
        let mut flags = Vec::new();

        if let (Some(depth), Some(stability)) = (depth, input.stability_index) {
            if depth >= t.expert_depth_min && stability <= t.unstable_stability_max {
                flags.push(flag(
                    CorrelationPattern::ExpertUnstable,
                    format!(
                        "Technical depth {depth:.0} is expert level but stability index is {stability:.2}"
                    ),
                ));
            }
            if stability >= t.stable_stability_min && depth <= t.weak_depth_max {
                flags.push(flag(
                    CorrelationPattern::StableButWeak,
                    format!(
                        "Stable tenure (index {stability:.2}) with weak technical depth {depth:.0}"
                    ),
                ));
            }
        }

        if let (Some(depth), Some(risk)) = (depth, input.risk_score) {
            if depth >= t.expert_depth_min && risk >= t.high_risk_min {
                flags.push(flag(
                    CorrelationPattern::HighSkillHighRisk,
                    format!("Technical depth {depth:.0} alongside career risk {risk:.2}"),
                ));
            }
        }

        if let (Some(compliance), Some(sea_months)) = (input.compliance_score, input.total_sea_months) {
            if compliance >= t.high_compliance_min && sea_months < t.low_sea_months_max {
                flags.push(flag(
                    CorrelationPattern::CompliantLowExperience,
                    format!(
                        "Certificates complete ({compliance:.0}) with only {sea_months:.1} months at sea"
                    ),
                ));
            }
        }

        let total_risk_weight = round_to(
            clamp_unit(flags.iter().map(|flag| flag.risk_weight).sum()),
            4,
        );

        let decision_impact = if flags.is_empty() {
            None
        } else if total_risk_weight >= t.review_weight
            || flags.iter().any(|flag| flag.impact == CorrelationImpact::Review)
        {
            Some(CorrelationImpact::Review)
        } else {
            Some(CorrelationImpact::Note)
        };

        let summary = if flags.is_empty() {
            CLEAN_SUMMARY.to_string()
        } else {
            let codes: Vec<&str> = flags.iter().map(|flag| flag.code.as_str()).collect();
            format!("{} anomaly pattern(s): {}", flags.len(), codes.join(", "))
        };

        CorrelationResult {
            flags,
            total_risk_weight,
            decision_impact,
            summary,
        }
    }
}

fn flag(pattern: CorrelationPattern, message: String) -> CorrelationFlag {
    CorrelationFlag {
        pattern,
        code: pattern.code().to_string(),
        impact: pattern.impact(),
        risk_weight: pattern.risk_weight(),
        message,
    }
}
