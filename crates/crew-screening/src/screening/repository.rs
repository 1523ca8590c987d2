use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::competency::CompetencyResult;
use super::compliance::ComplianceResult;
use super::correlation::CorrelationResult;
use super::domain::{CandidateDossier, CandidateId, Decision, EngineKind, RiskTier};
use super::stability::StabilityAssessment;
use super::trend::PredictiveResult;
use super::verification::VerificationResult;

/// Latest-value cache of every engine's output for one candidate.
///
/// Overwritten on every recompute and never the source of truth for trend analysis; the
/// snapshot log is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustProfile {
    pub candidate_id: CandidateId,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability: Option<StabilityAssessment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competency: Option<CompetencyResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance: Option<ComplianceResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation: Option<CorrelationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predictive: Option<PredictiveResult>,
}

impl TrustProfile {
    pub fn empty(candidate_id: CandidateId, now: DateTime<Utc>) -> Self {
        Self {
            candidate_id,
            updated_at: now,
            stability: None,
            competency: None,
            compliance: None,
            verification: None,
            correlation: None,
            predictive: None,
        }
    }

    pub fn has(&self, engine: EngineKind) -> bool {
        match engine {
            EngineKind::Stability => self.stability.is_some(),
            EngineKind::Competency => self.competency.is_some(),
            EngineKind::Compliance => self.compliance.is_some(),
            EngineKind::Verification => self.verification.is_some(),
            EngineKind::Correlation => self.correlation.is_some(),
            EngineKind::Predictive => self.predictive.is_some(),
        }
    }
}

/// Inputs and outputs of one predictive computation. Insert-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSnapshot {
    pub candidate_id: CandidateId,
    pub computed_at: DateTime<Utc>,
    pub risk_score: Option<f64>,
    pub stability_index: Option<f64>,
    pub compliance_score: Option<f64>,
    pub competency_score: Option<f64>,
    pub technical_depth_index: Option<f64>,
    pub total_sea_months: Option<f64>,
    pub employer_changes: Option<usize>,
    pub predictive_index: f64,
    pub predictive_tier: RiskTier,
}

/// One competency computation, linked to the interview it scored. Insert-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetencyAssessmentRecord {
    pub candidate_id: CandidateId,
    pub interview_id: String,
    pub computed_at: DateTime<Utc>,
    pub result: CompetencyResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustEventKind {
    EngineComputed,
    ComputationFailed,
    OverrideRecorded,
    OverrideRevoked,
}

/// Write-once audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustEvent {
    pub candidate_id: CandidateId,
    pub kind: TrustEventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<EngineKind>,
    pub recorded_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

/// Human decision that supersedes the computed one until it expires or is revoked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionOverride {
    /// Assigned by the repository on insert.
    #[serde(default)]
    pub id: u64,
    pub candidate_id: CandidateId,
    pub decision: Decision,
    pub reason: String,
    pub entered_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub revoked_at: Option<DateTime<Utc>>,
}

impl DecisionOverride {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at.map_or(true, |expires| expires > now)
    }
}

/// Most recently created active override.
pub fn active_override(overrides: &[DecisionOverride], now: DateTime<Utc>) -> Option<&DecisionOverride> {
    overrides
        .iter()
        .filter(|entry| entry.is_active(now))
        .max_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)))
}

/// Everything one computation persists. Applied atomically by [`TrustRepository::commit`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrustWrite {
    pub candidate_id: CandidateId,
    /// Replaces the cached profile when present.
    pub profile: Option<TrustProfile>,
    pub snapshot: Option<RiskSnapshot>,
    pub assessment: Option<CompetencyAssessmentRecord>,
    pub events: Vec<TrustEvent>,
}

/// Storage contract for the scoring core: append-only logs plus the profile cache.
pub trait TrustRepository: Send + Sync {
    /// Insert the append-only rows and overwrite the profile cache in one transaction.
    fn commit(&self, write: TrustWrite) -> Result<(), RepositoryError>;
    fn profile(&self, candidate: &CandidateId) -> Result<Option<TrustProfile>, RepositoryError>;
    /// Oldest first, ordered by `computed_at`.
    fn snapshots(&self, candidate: &CandidateId) -> Result<Vec<RiskSnapshot>, RepositoryError>;
    fn assessments(
        &self,
        candidate: &CandidateId,
    ) -> Result<Vec<CompetencyAssessmentRecord>, RepositoryError>;
    fn events(
        &self,
        candidate: &CandidateId,
        kind: Option<TrustEventKind>,
    ) -> Result<Vec<TrustEvent>, RepositoryError>;
    fn insert_override(&self, entry: DecisionOverride) -> Result<DecisionOverride, RepositoryError>;
    fn overrides(&self, candidate: &CandidateId) -> Result<Vec<DecisionOverride>, RepositoryError>;
    /// Stamp `revoked_at`; the override row itself is kept.
    fn revoke_override(
        &self,
        candidate: &CandidateId,
        override_id: u64,
        at: DateTime<Utc>,
    ) -> Result<DecisionOverride, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("conflicting write: {0}")]
    Conflict(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Read port for the evidence handed over by the excluded collaborators.
pub trait CandidateSource: Send + Sync {
    fn dossier(&self, candidate: &CandidateId) -> Result<Option<CandidateDossier>, SourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("candidate source unavailable: {0}")]
    Unavailable(String),
    #[error("candidate record malformed: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).single().expect("valid time")
    }

    fn entry(id: u64, created: DateTime<Utc>, decision: Decision) -> DecisionOverride {
        DecisionOverride {
            id,
            candidate_id: CandidateId("cand-1".to_string()),
            decision,
            reason: "manual review".to_string(),
            entered_by: "crewing-manager".to_string(),
            created_at: created,
            expires_at: None,
            revoked_at: None,
        }
    }

    #[test]
    fn most_recent_active_override_wins() {
        let older = entry(1, at(8), Decision::Reject);
        let newer = entry(2, at(9), Decision::Approve);
        let overrides = vec![newer.clone(), older];

        let active = active_override(&overrides, at(10)).expect("active override");
        assert_eq!(active.id, newer.id);
    }

    #[test]
    fn expired_and_revoked_overrides_are_ignored() {
        let mut expired = entry(1, at(8), Decision::Approve);
        expired.expires_at = Some(at(9));
        let mut revoked = entry(2, at(9), Decision::Approve);
        revoked.revoked_at = Some(at(9) + Duration::minutes(5));

        assert!(active_override(&[expired.clone(), revoked], at(10)).is_none());
        assert!(expired.is_active(at(8) + Duration::minutes(30)));
    }
}
