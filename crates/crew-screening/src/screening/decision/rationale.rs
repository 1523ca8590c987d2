use serde::{Deserialize, Serialize};

use crate::screening::calibration::{CalibrationConfig, RiskFactor};
use crate::screening::competency::{CompetencyResult, EvidenceKind};
use crate::screening::compliance::ComplianceResult;
use crate::screening::correlation::CorrelationResult;
use crate::screening::domain::{Decision, EngineKind};
use crate::screening::stability::StabilityAssessment;
use crate::screening::trend::PredictiveResult;
use crate::screening::verification::{VerificationResult, VerificationStatus};

/// Career gaps above this many months ask for an explanation.
const GAP_EXPLANATION_MONTHS: f64 = 6.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RationaleEntry {
    pub engine: EngineKind,
    pub label: String,
    /// `None` when the engine was kept out of the decision.
    pub outcome: Option<Decision>,
    pub top_reason: String,
    pub evidence: Vec<String>,
    pub actions: Vec<String>,
}

fn entry(engine: EngineKind, outcome: Option<Decision>, top_reason: String) -> RationaleEntry {
    RationaleEntry {
        engine,
        label: engine.label().to_string(),
        outcome,
        top_reason,
        evidence: Vec::new(),
        actions: Vec::new(),
    }
}

pub(crate) fn stability(assessment: &StabilityAssessment, outcome: Decision) -> RationaleEntry {
    let top_reason = match assessment.dominant_factor() {
        Some(factor) => format!(
            "{} risk, driven by {}: {}",
            assessment.risk_tier.label(),
            factor.label.to_lowercase(),
            factor.notes
        ),
        None => format!("{} risk with no dominant factor", assessment.risk_tier.label()),
    };

    let mut rationale = entry(EngineKind::Stability, Some(outcome), top_reason);
    rationale.evidence.push(format!(
        "Risk score {:.2} across {} contract(s)",
        assessment.risk_score, assessment.contract_count
    ));
    if let Some(index) = assessment.stability_index {
        rationale.evidence.push(format!("Stability index {index:.2}"));
    }
    rationale.evidence.push(format!(
        "{:.1} months of sea time after overlap correction",
        assessment.total_sea_months
    ));
    if assessment.promotion_window_applied {
        rationale
            .evidence
            .push("Recent promotion softened short-contract and switching penalties".to_string());
    }

    if assessment.short_contract_count > 0 {
        rationale.actions.push(format!(
            "Verify reasons for {} short contract(s) with previous employers",
            assessment.short_contract_count
        ));
    }
    if assessment
        .factor(RiskFactor::CareerGap)
        .is_some_and(|factor| factor.raw > GAP_EXPLANATION_MONTHS)
    {
        rationale
            .actions
            .push("Ask for an explanation of gaps between contracts".to_string());
    }
    if !assessment.rank_anomalies.is_empty() {
        rationale
            .actions
            .push("Confirm rank progression against discharge book entries".to_string());
    }
    rationale
}

pub(crate) fn competency(
    result: &CompetencyResult,
    outcome: Option<Decision>,
    calibration: &CalibrationConfig,
) -> RationaleEntry {
    let top_reason = if result.low_confidence {
        format!(
            "Overall {:.0} not used for the decision (language confidence {:.2}, coverage {:.0}%)",
            result.overall_score,
            result.language.confidence,
            result.language.coverage * 100.0
        )
    } else {
        format!(
            "Overall competency {:.0} ({:?})",
            result.overall_score, result.status
        )
        .to_lowercase()
    };

    let mut rationale = entry(EngineKind::Competency, outcome, top_reason);
    rationale.evidence.extend(result.evidence.iter().map(|bullet| {
        let prefix = match bullet.kind {
            EvidenceKind::Strength => "Strength",
            EvidenceKind::Concern => "Concern",
        };
        format!("{prefix}: {} ({})", bullet.text, bullet.reason)
    }));
    if result.depth_delta > 0.0 {
        rationale.evidence.push(format!(
            "Technical depth lifted the overall score by {:.1} points",
            result.depth_delta
        ));
    }

    rationale.actions.extend(
        result
            .dimensions
            .iter()
            .filter(|dimension| dimension.score < calibration.review_threshold())
            .map(|dimension| format!("Follow-up interview on {}", dimension.dimension.label())),
    );
    rationale
}

pub(crate) fn compliance(result: &ComplianceResult, outcome: Decision) -> RationaleEntry {
    let top_reason = format!(
        "{} of {} required certificates valid ({:.0}%)",
        result.valid_count, result.required_count, result.score
    );
    let mut rationale = entry(EngineKind::Compliance, Some(outcome), top_reason);
    rationale
        .evidence
        .extend(result.flags.iter().map(|flag| flag.message.clone()));
    rationale.actions.extend(result.remediation.iter().cloned());
    rationale
}

pub(crate) fn verification(result: &VerificationResult, outcome: Decision) -> RationaleEntry {
    let status = match result.status {
        VerificationStatus::Verified => "verified",
        VerificationStatus::Partial => "partially verified",
        VerificationStatus::Mismatch => "contradicted",
        VerificationStatus::Unverified => "not verified",
    };
    let top_reason = format!(
        "Sea service {status} by vessel tracking (confidence {:.2})",
        result.confidence
    );
    let mut rationale = entry(EngineKind::Verification, Some(outcome), top_reason);
    rationale
        .evidence
        .extend(result.flags.iter().map(|flag| flag.message.clone()));
    if result.needs_review {
        rationale
            .actions
            .push("Request sea-service testimonials for the unmatched contracts".to_string());
    }
    rationale
}

pub(crate) fn correlation(result: &CorrelationResult, outcome: Decision) -> RationaleEntry {
    let mut rationale = entry(EngineKind::Correlation, Some(outcome), result.summary.clone());
    rationale
        .evidence
        .extend(result.flags.iter().map(|flag| flag.message.clone()));
    if !result.is_clean() {
        rationale
            .actions
            .push("Have a senior officer review the conflicting signals".to_string());
    }
    rationale
}

pub(crate) fn predictive(result: &PredictiveResult, outcome: Decision) -> RationaleEntry {
    let top_reason = format!(
        "Predictive index {:.0} ({} tier, trend {:?})",
        result.predictive_index,
        result.tier.label(),
        result.trend.direction
    )
    .to_lowercase();
    let mut rationale = entry(EngineKind::Predictive, Some(outcome), top_reason);
    rationale.evidence.extend(result.reasons.iter().cloned());
    rationale
}
