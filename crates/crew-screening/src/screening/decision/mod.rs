//! Decision fusion: one recommendation from the cached engine outputs.
//!
//! Each present engine yields an outcome and the most severe one wins. Only critical flags
//! from the competency or compliance engines can reject; stability, verification,
//! correlation and predictive outputs stop at review. A low-confidence competency result is
//! excluded from the verdict and reported as a note instead. An active override replaces
//! the final decision but leaves the computed one, the rationale and the correlation
//! visible.

mod rationale;
mod what_if;

pub use rationale::RationaleEntry;
pub use what_if::{ImpactTier, WhatIfAction, MAX_WHAT_IF_ACTIONS};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::calibration::CalibrationConfig;
use super::competency::CompetencyResult;
use super::compliance::ComplianceResult;
use super::correlation::{CorrelationImpact, CorrelationResult};
use super::domain::{CandidateId, Decision, RiskTier, Severity};
use super::repository::{active_override, DecisionOverride, TrustProfile};
use super::trend::{PolicyImpact, PredictiveResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    Computed,
    Override,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub candidate_id: CandidateId,
    pub decision: Decision,
    pub computed_decision: Decision,
    pub decided_by: DecisionSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_applied: Option<DecisionOverride>,
    pub confidence_level: ConfidenceLevel,
    pub rationale: Vec<RationaleEntry>,
    pub what_if: Vec<WhatIfAction>,
    pub correlation: Option<CorrelationResult>,
    pub predictive_risk: Option<PredictiveResult>,
    pub notes: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

pub struct DecisionFusion {
    calibration: CalibrationConfig,
}

impl DecisionFusion {
    pub fn new(calibration: CalibrationConfig) -> Self {
        Self { calibration }
    }

    pub fn summarize(
        &self,
        profile: &TrustProfile,
        overrides: &[DecisionOverride],
        now: DateTime<Utc>,
    ) -> ExecutiveSummary {
        let mut rationale = Vec::new();
        let mut notes = Vec::new();
        let mut outcomes = Vec::new();
        let mut excluded = false;

        if let Some(assessment) = &profile.stability {
            let outcome = match assessment.risk_tier {
                RiskTier::High | RiskTier::Critical => Decision::Review,
                RiskTier::Low | RiskTier::Medium => Decision::Approve,
            };
            outcomes.push(outcome);
            rationale.push(rationale::stability(assessment, outcome));
        }

        if let Some(result) = &profile.competency {
            if result.low_confidence {
                excluded = true;
                notes.push(format!(
                    "Competency result excluded from the decision: language confidence {:.2}, coverage {:.0}%",
                    result.language.confidence,
                    result.language.coverage * 100.0
                ));
                rationale.push(rationale::competency(result, None, &self.calibration));
            } else {
                let outcome = self.competency_outcome(result);
                outcomes.push(outcome);
                rationale.push(rationale::competency(result, Some(outcome), &self.calibration));
            }
        }

        if let Some(result) = &profile.compliance {
            let outcome = compliance_outcome(result);
            outcomes.push(outcome);
            rationale.push(rationale::compliance(result, outcome));
        }

        if let Some(result) = &profile.verification {
            let outcome = if result.needs_review {
                Decision::Review
            } else {
                Decision::Approve
            };
            outcomes.push(outcome);
            rationale.push(rationale::verification(result, outcome));
        }

        if let Some(result) = &profile.correlation {
            let outcome = match result.decision_impact {
                Some(CorrelationImpact::Review) => Decision::Review,
                Some(CorrelationImpact::Note) => {
                    notes.push(result.summary.clone());
                    Decision::Approve
                }
                None => Decision::Approve,
            };
            outcomes.push(outcome);
            rationale.push(rationale::correlation(result, outcome));
        }

        if let Some(result) = &profile.predictive {
            let outcome = match result.policy_impact {
                PolicyImpact::None => Decision::Approve,
                PolicyImpact::Review | PolicyImpact::ConfirmRejectEligible => Decision::Review,
            };
            if result.policy_impact == PolicyImpact::ConfirmRejectEligible {
                notes.push(
                    "Predictive risk is critical; a reviewer may confirm a rejection".to_string(),
                );
            }
            outcomes.push(outcome);
            rationale.push(rationale::predictive(result, outcome));
        }

        let computed_decision = outcomes.iter().copied().max().unwrap_or(Decision::Review);
        if outcomes.is_empty() {
            notes.push("No engine output available; manual review required".to_string());
        }

        let scored_engines = [
            profile.stability.is_some(),
            profile.competency.as_ref().is_some_and(|result| !result.low_confidence),
            profile.compliance.is_some(),
            profile.verification.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count();
        let confidence_level = match scored_engines {
            n if n >= 3 && !excluded => ConfidenceLevel::High,
            n if n >= 2 => ConfidenceLevel::Medium,
            _ => ConfidenceLevel::Low,
        };

        let override_applied = active_override(overrides, now).cloned();
        let (decision, decided_by) = match &override_applied {
            Some(entry) => {
                notes.push(format!(
                    "Manual override to {}: {}",
                    entry.decision.label(),
                    entry.reason
                ));
                (entry.decision, DecisionSource::Override)
            }
            None => (computed_decision, DecisionSource::Computed),
        };

        ExecutiveSummary {
            candidate_id: profile.candidate_id.clone(),
            decision,
            computed_decision,
            decided_by,
            override_applied,
            confidence_level,
            rationale,
            what_if: what_if::build(profile, &self.calibration),
            correlation: profile.correlation.clone(),
            predictive_risk: profile.predictive.clone(),
            notes,
            generated_at: now,
        }
    }

    fn competency_outcome(&self, result: &CompetencyResult) -> Decision {
        if result
            .flags
            .iter()
            .any(|flag| flag.severity == Severity::Critical)
        {
            Decision::Reject
        } else if result.overall_score < self.calibration.review_threshold()
            || result.below_threshold_fraction > self.calibration.below_threshold_fraction()
        {
            Decision::Review
        } else {
            Decision::Approve
        }
    }
}

fn compliance_outcome(result: &ComplianceResult) -> Decision {
    if result
        .flags
        .iter()
        .any(|flag| flag.severity == Severity::Critical)
    {
        Decision::Reject
    } else if result.flags.is_empty() {
        Decision::Approve
    } else {
        Decision::Review
    }
}
