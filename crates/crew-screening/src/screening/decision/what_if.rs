use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::screening::calibration::CalibrationConfig;
use crate::screening::competency::CompetencyResult;
use crate::screening::compliance::{ComplianceResult, CRITICAL_COMPLIANCE_FLOOR};
use crate::screening::correlation::{CorrelationImpact, CorrelationResult};
use crate::screening::domain::{EngineKind, RiskTier};
use crate::screening::repository::TrustProfile;
use crate::screening::stability::StabilityAssessment;
use crate::screening::verification::VerificationResult;

pub const MAX_WHAT_IF_ACTIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactTier {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhatIfAction {
    pub engine: EngineKind,
    pub action: String,
    pub current_state: String,
    pub projected_state: String,
    pub impact: ImpactTier,
}

/// Highest-impact remediation actions, at most [`MAX_WHAT_IF_ACTIONS`].
pub(crate) fn build(profile: &TrustProfile, calibration: &CalibrationConfig) -> Vec<WhatIfAction> {
    let mut actions = Vec::new();

    if let Some(result) = &profile.compliance {
        compliance_actions(result, &mut actions);
    }
    if let Some(assessment) = &profile.stability {
        stability_actions(assessment, &mut actions);
    }
    if let Some(result) = &profile.competency {
        competency_actions(result, calibration, &mut actions);
    }
    if let Some(result) = &profile.verification {
        verification_actions(result, &mut actions);
    }
    if let Some(result) = &profile.correlation {
        correlation_actions(result, &mut actions);
    }

    // stable sort keeps engine order within a tier
    actions.sort_by_key(|action| Reverse(action.impact));
    actions.truncate(MAX_WHAT_IF_ACTIONS);
    actions
}

fn compliance_actions(result: &ComplianceResult, actions: &mut Vec<WhatIfAction>) {
    if result.required_count == 0 {
        return;
    }
    let projected = ((result.valid_count + 1).min(result.required_count) as f64
        / result.required_count as f64
        * 100.0)
        .min(100.0);
    let impact = if result.score < CRITICAL_COMPLIANCE_FLOOR {
        ImpactTier::High
    } else {
        ImpactTier::Medium
    };

    let renewals = result
        .expired
        .iter()
        .map(|certificate| format!("Renew expired certificate {certificate}"));
    let acquisitions = result
        .missing
        .iter()
        .map(|certificate| format!("Obtain missing certificate {certificate}"));

    for action in renewals.chain(acquisitions) {
        actions.push(WhatIfAction {
            engine: EngineKind::Compliance,
            action,
            current_state: format!("Compliance {:.0}%", result.score),
            projected_state: format!("Compliance {projected:.0}%"),
            impact,
        });
    }
}

fn stability_actions(assessment: &StabilityAssessment, actions: &mut Vec<WhatIfAction>) {
    let impact = match assessment.risk_tier {
        RiskTier::Critical => ImpactTier::High,
        RiskTier::High => ImpactTier::Medium,
        RiskTier::Low | RiskTier::Medium => return,
    };
    let driver = assessment
        .dominant_factor()
        .map(|factor| factor.label.to_lowercase())
        .unwrap_or_else(|| "contract history".to_string());

    actions.push(WhatIfAction {
        engine: EngineKind::Stability,
        action: format!("Obtain employer references addressing {driver}"),
        current_state: format!(
            "Career risk {:.2} ({})",
            assessment.risk_score,
            assessment.risk_tier.label()
        ),
        projected_state: "Documented explanation allows a reviewer to clear the risk".to_string(),
        impact,
    });
}

fn competency_actions(
    result: &CompetencyResult,
    calibration: &CalibrationConfig,
    actions: &mut Vec<WhatIfAction>,
) {
    if result.low_confidence {
        actions.push(WhatIfAction {
            engine: EngineKind::Competency,
            action: "Repeat the interview with complete answers in the working language".to_string(),
            current_state: format!(
                "Language confidence {:.2}, coverage {:.0}%",
                result.language.confidence,
                result.language.coverage * 100.0
            ),
            projected_state: "Competency result becomes usable for the decision".to_string(),
            impact: ImpactTier::Medium,
        });
        return;
    }

    let threshold = calibration.review_threshold();
    if let Some(weakest) = result
        .dimensions
        .iter()
        .filter(|dimension| dimension.score < threshold)
        .min_by(|a, b| a.score.total_cmp(&b.score))
    {
        actions.push(WhatIfAction {
            engine: EngineKind::Competency,
            action: format!(
                "Re-assess {} in a follow-up interview",
                weakest.dimension.label().to_lowercase()
            ),
            current_state: format!("{} {:.0}", weakest.dimension.label(), weakest.score),
            projected_state: format!("{} at or above {threshold:.0}", weakest.dimension.label()),
            impact: ImpactTier::Medium,
        });
    }
}

fn verification_actions(result: &VerificationResult, actions: &mut Vec<WhatIfAction>) {
    if !result.needs_review {
        return;
    }
    actions.push(WhatIfAction {
        engine: EngineKind::Verification,
        action: "Provide sea-service testimonials for contracts not matched by vessel tracking"
            .to_string(),
        current_state: format!("Tracking confidence {:.2}", result.confidence),
        projected_state: "Sea service confirmed by documents".to_string(),
        impact: ImpactTier::Medium,
    });
}

fn correlation_actions(result: &CorrelationResult, actions: &mut Vec<WhatIfAction>) {
    let Some(impact) = result.decision_impact else {
        return;
    };
    actions.push(WhatIfAction {
        engine: EngineKind::Correlation,
        action: "Run a practical assessment to resolve conflicting engine signals".to_string(),
        current_state: result.summary.clone(),
        projected_state: "Contradiction resolved by direct evidence".to_string(),
        impact: match impact {
            CorrelationImpact::Review => ImpactTier::Medium,
            CorrelationImpact::Note => ImpactTier::Low,
        },
    });
}
