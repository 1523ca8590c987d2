use chrono::{DateTime, Utc};
use serde::Serialize;

use super::competency::CompetencyStatus;
use super::domain::{CandidateId, RiskTier};
use super::repository::TrustProfile;
use super::trend::{PolicyImpact, TrendDirection};
use super::verification::VerificationStatus;

/// Read-only projection of the cached scores, safe to serialize into reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrustView {
    pub candidate_id: CandidateId,
    pub updated_at: DateTime<Utc>,
    pub stability: Option<StabilityView>,
    pub competency: Option<CompetencyView>,
    pub compliance: Option<ComplianceView>,
    pub verification: Option<VerificationView>,
    pub correlation: Option<CorrelationView>,
    pub predictive: Option<PredictiveView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StabilityView {
    pub stability_index: Option<f64>,
    pub risk_score: f64,
    pub risk_tier: RiskTier,
    pub total_sea_months: f64,
    pub contract_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetencyView {
    pub overall_score: f64,
    pub status: CompetencyStatus,
    pub low_confidence: bool,
    pub technical_depth_index: Option<f64>,
    pub depth_delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceView {
    pub score: f64,
    pub missing: Vec<String>,
    pub expired: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationView {
    pub status: VerificationStatus,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationView {
    pub total_risk_weight: f64,
    pub patterns: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictiveView {
    pub predictive_index: f64,
    pub tier: RiskTier,
    pub policy_impact: PolicyImpact,
    pub direction: TrendDirection,
}

impl From<&TrustProfile> for TrustView {
    fn from(profile: &TrustProfile) -> Self {
        Self {
            candidate_id: profile.candidate_id.clone(),
            updated_at: profile.updated_at,
            stability: profile.stability.as_ref().map(|assessment| StabilityView {
                stability_index: assessment.stability_index,
                risk_score: assessment.risk_score,
                risk_tier: assessment.risk_tier,
                total_sea_months: assessment.total_sea_months,
                contract_count: assessment.contract_count,
            }),
            competency: profile.competency.as_ref().map(|result| CompetencyView {
                overall_score: result.overall_score,
                status: result.status,
                low_confidence: result.low_confidence,
                technical_depth_index: result.technical_depth_index,
                depth_delta: result.depth_delta,
            }),
            compliance: profile.compliance.as_ref().map(|result| ComplianceView {
                score: result.score,
                missing: result.missing.clone(),
                expired: result.expired.clone(),
            }),
            verification: profile.verification.as_ref().map(|result| VerificationView {
                status: result.status,
                confidence: result.confidence,
            }),
            correlation: profile.correlation.as_ref().map(|result| CorrelationView {
                total_risk_weight: result.total_risk_weight,
                patterns: result.flags.iter().map(|flag| flag.code.clone()).collect(),
                summary: result.summary.clone(),
            }),
            predictive: profile.predictive.as_ref().map(|result| PredictiveView {
                predictive_index: result.predictive_index,
                tier: result.tier,
                policy_impact: result.policy_impact,
                direction: result.trend.direction,
            }),
        }
    }
}
