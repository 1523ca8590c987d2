use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use super::calibration::CalibrationConfig;
use super::competency::{CompetencyEngine, CompetencyResult};
use super::compliance::{score_compliance, ComplianceResult};
use super::correlation::{CorrelationAnalyzer, CorrelationInput, CorrelationResult};
use super::decision::{DecisionFusion, ExecutiveSummary};
use super::domain::{
    CandidateDossier, CandidateId, ContractRecord, Decision, EngineKind, VerificationFacts,
};
use super::presenter::TrustView;
use super::repository::{
    CandidateSource, CompetencyAssessmentRecord, DecisionOverride, RepositoryError, RiskSnapshot,
    SourceError, TrustEvent, TrustEventKind, TrustProfile, TrustRepository, TrustWrite,
};
use super::stability::{StabilityAssessment, StabilityRiskEngine};
use super::trend::{CurrentSignals, PredictiveEngine, PredictiveResult};
use super::verification::{score_verification, VerificationResult};
use crate::config::ScreeningSettings;

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Result of one engine run, tagged by engine for API responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "engine", content = "result", rename_all = "snake_case")]
pub enum EngineOutput {
    Stability(StabilityAssessment),
    Competency(CompetencyResult),
    Compliance(ComplianceResult),
    Verification(VerificationResult),
    Correlation(CorrelationResult),
    Predictive(PredictiveResult),
}

/// Manual decision entered by a reviewer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OverrideRequest {
    pub decision: Decision,
    pub reason: String,
    pub entered_by: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Service composing the candidate source, trust repository and scoring engines.
///
/// Every `compute_*` call reads the dossier, runs one engine, and persists the result in a
/// single [`TrustWrite`]. `Ok(None)` means the engine is disabled, the candidate is unknown,
/// or the required evidence is missing.
pub struct ScreeningService<C, R> {
    source: Arc<C>,
    repository: Arc<R>,
    settings: ScreeningSettings,
    clock: Clock,
}

impl<C, R> ScreeningService<C, R>
where
    C: CandidateSource + 'static,
    R: TrustRepository + 'static,
{
    pub fn new(source: Arc<C>, repository: Arc<R>, settings: ScreeningSettings) -> Self {
        Self {
            source,
            repository,
            settings,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock, e.g. to pin `as_of` dates in tests.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn settings(&self) -> &ScreeningSettings {
        &self.settings
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Dispatch by engine.
    pub fn compute(
        &self,
        candidate: &CandidateId,
        engine: EngineKind,
    ) -> Result<Option<EngineOutput>, ScreeningServiceError> {
        let output = match engine {
            EngineKind::Stability => self.compute_stability(candidate)?.map(EngineOutput::Stability),
            EngineKind::Competency => {
                self.compute_competency(candidate)?.map(EngineOutput::Competency)
            }
            EngineKind::Compliance => {
                self.compute_compliance(candidate)?.map(EngineOutput::Compliance)
            }
            EngineKind::Verification => {
                self.compute_verification(candidate)?.map(EngineOutput::Verification)
            }
            EngineKind::Correlation => {
                self.compute_correlation(candidate)?.map(EngineOutput::Correlation)
            }
            EngineKind::Predictive => {
                self.compute_predictive(candidate)?.map(EngineOutput::Predictive)
            }
        };
        Ok(output)
    }

    pub fn compute_stability(
        &self,
        candidate: &CandidateId,
    ) -> Result<Option<StabilityAssessment>, ScreeningServiceError> {
        let Some(dossier) = self.dossier(candidate)? else {
            return Ok(None);
        };

        let now = self.now();
        let engine = StabilityRiskEngine::new(calibration_for(&dossier));
        let Some(assessment) = engine.assess(&dossier.contracts, now.date_naive()) else {
            debug!(candidate_id = %candidate, "no contracts on record; stability skipped");
            return Ok(None);
        };

        info!(
            candidate_id = %candidate,
            engine = "stability",
            risk_score = assessment.risk_score,
            tier = assessment.risk_tier.label(),
            stability_index = ?assessment.stability_index,
            "stability risk computed"
        );

        let mut profile = self.profile_or_empty(candidate, now)?;
        profile.stability = Some(assessment.clone());
        let payload = json!({
            "risk_score": assessment.risk_score,
            "risk_tier": assessment.risk_tier,
            "stability_index": assessment.stability_index,
        });
        self.persist(profile, None, None, EngineKind::Stability, payload, now)?;
        Ok(Some(assessment))
    }

    pub fn compute_competency(
        &self,
        candidate: &CandidateId,
    ) -> Result<Option<CompetencyResult>, ScreeningServiceError> {
        if !self.settings.competency_enabled {
            debug!(candidate_id = %candidate, "competency engine disabled");
            return Ok(None);
        }
        let Some(dossier) = self.dossier(candidate)? else {
            return Ok(None);
        };
        let Some(session) = dossier.interview.as_ref() else {
            return Ok(None);
        };

        let engine = CompetencyEngine::new(calibration_for(&dossier), self.settings.min_answer_length);
        let Some(result) = engine.score(session) else {
            debug!(candidate_id = %candidate, interview_id = %session.interview_id, "no scorable answers");
            return Ok(None);
        };

        info!(
            candidate_id = %candidate,
            engine = "competency",
            overall_score = result.overall_score,
            low_confidence = result.low_confidence,
            depth_delta = result.depth_delta,
            "competency computed"
        );

        let now = self.now();
        let mut profile = self.profile_or_empty(candidate, now)?;
        profile.competency = Some(result.clone());
        let assessment = CompetencyAssessmentRecord {
            candidate_id: candidate.clone(),
            interview_id: session.interview_id.clone(),
            computed_at: now,
            result: result.clone(),
        };
        let payload = json!({
            "interview_id": session.interview_id,
            "overall_score": result.overall_score,
            "low_confidence": result.low_confidence,
        });
        self.persist(profile, None, Some(assessment), EngineKind::Competency, payload, now)?;
        Ok(Some(result))
    }

    pub fn compute_compliance(
        &self,
        candidate: &CandidateId,
    ) -> Result<Option<ComplianceResult>, ScreeningServiceError> {
        let Some(dossier) = self.dossier(candidate)? else {
            return Ok(None);
        };
        let Some(facts) = dossier.compliance.as_ref() else {
            return Ok(None);
        };

        let result = score_compliance(facts);
        info!(
            candidate_id = %candidate,
            engine = "compliance",
            score = result.score,
            missing = result.missing.len(),
            expired = result.expired.len(),
            "compliance computed"
        );

        let now = self.now();
        let mut profile = self.profile_or_empty(candidate, now)?;
        profile.compliance = Some(result.clone());
        let payload = json!({ "score": result.score });
        self.persist(profile, None, None, EngineKind::Compliance, payload, now)?;
        Ok(Some(result))
    }

    pub fn compute_verification(
        &self,
        candidate: &CandidateId,
    ) -> Result<Option<VerificationResult>, ScreeningServiceError> {
        if !self.settings.verification_enabled {
            return Ok(None);
        }
        let Some(dossier) = self.dossier(candidate)? else {
            return Ok(None);
        };
        match dossier.verification {
            Some(facts) => self.apply_verification(candidate, &facts).map(Some),
            None => Ok(None),
        }
    }

    /// Score freshly fetched tracking facts, e.g. from a vessel track provider.
    pub fn apply_verification(
        &self,
        candidate: &CandidateId,
        facts: &VerificationFacts,
    ) -> Result<VerificationResult, ScreeningServiceError> {
        let result = score_verification(facts);
        info!(
            candidate_id = %candidate,
            engine = "verification",
            confidence = result.confidence,
            needs_review = result.needs_review,
            "verification computed"
        );

        let now = self.now();
        let mut profile = self.profile_or_empty(candidate, now)?;
        profile.verification = Some(result.clone());
        let payload = json!({ "status": result.status, "confidence": result.confidence });
        self.persist(profile, None, None, EngineKind::Verification, payload, now)?;
        Ok(result)
    }

    pub fn compute_correlation(
        &self,
        candidate: &CandidateId,
    ) -> Result<Option<CorrelationResult>, ScreeningServiceError> {
        let Some(dossier) = self.dossier(candidate)? else {
            return Ok(None);
        };
        let now = self.now();
        let Some(mut profile) = self.repository.profile(candidate)? else {
            return Ok(None);
        };

        let result = analyze_correlation(&dossier, &profile);
        info!(
            candidate_id = %candidate,
            engine = "correlation",
            total_risk_weight = result.total_risk_weight,
            flags = result.flags.len(),
            "correlation computed"
        );

        profile.correlation = Some(result.clone());
        let payload = json!({
            "total_risk_weight": result.total_risk_weight,
            "patterns": result.flags.iter().map(|flag| flag.code.clone()).collect::<Vec<_>>(),
        });
        self.persist(profile, None, None, EngineKind::Correlation, payload, now)?;
        Ok(Some(result))
    }

    /// Refresh correlation, read prior snapshots, blend, then append a new snapshot.
    pub fn compute_predictive(
        &self,
        candidate: &CandidateId,
    ) -> Result<Option<PredictiveResult>, ScreeningServiceError> {
        if !self.settings.predictive_enabled {
            return Ok(None);
        }
        let Some(dossier) = self.dossier(candidate)? else {
            return Ok(None);
        };
        let now = self.now();
        let mut profile = self.profile_or_empty(candidate, now)?;

        let correlation = analyze_correlation(&dossier, &profile);
        let history = self.repository.snapshots(candidate)?;
        let current = CurrentSignals {
            risk_score: profile.stability.as_ref().map(|assessment| assessment.risk_score),
            correlation_weight: correlation.total_risk_weight,
        };
        let result = PredictiveEngine::new(calibration_for(&dossier)).evaluate(&history, &current);

        info!(
            candidate_id = %candidate,
            engine = "predictive",
            predictive_index = result.predictive_index,
            tier = result.tier.label(),
            trend_score = result.trend.trend_score,
            prior_snapshots = history.len(),
            "predictive risk computed"
        );

        let snapshot = RiskSnapshot {
            candidate_id: candidate.clone(),
            computed_at: now,
            risk_score: current.risk_score,
            stability_index: profile
                .stability
                .as_ref()
                .and_then(|assessment| assessment.stability_index),
            compliance_score: profile.compliance.as_ref().map(|result| result.score),
            competency_score: usable_competency(&profile).map(|result| result.overall_score),
            technical_depth_index: usable_competency(&profile)
                .and_then(|result| result.technical_depth_index),
            total_sea_months: profile
                .stability
                .as_ref()
                .map(|assessment| assessment.total_sea_months),
            employer_changes: profile
                .stability
                .as_ref()
                .map(|assessment| assessment.employer_changes),
            predictive_index: result.predictive_index,
            predictive_tier: result.tier,
        };

        profile.correlation = Some(correlation);
        profile.predictive = Some(result.clone());
        let payload = json!({
            "predictive_index": result.predictive_index,
            "tier": result.tier,
            "policy_impact": result.policy_impact,
        });
        self.persist(profile, Some(snapshot), None, EngineKind::Predictive, payload, now)?;
        Ok(Some(result))
    }

    /// Fuse the cached engine outputs. `None` for an unknown candidate.
    pub fn executive_summary(
        &self,
        candidate: &CandidateId,
    ) -> Result<Option<ExecutiveSummary>, ScreeningServiceError> {
        let Some(dossier) = self.dossier(candidate)? else {
            return Ok(None);
        };
        let now = self.now();
        let profile = self.profile_or_empty(candidate, now)?;
        let overrides = self.repository.overrides(candidate)?;

        let summary =
            DecisionFusion::new(calibration_for(&dossier)).summarize(&profile, &overrides, now);
        debug!(
            candidate_id = %candidate,
            decision = summary.decision.label(),
            computed = summary.computed_decision.label(),
            "executive summary built"
        );
        Ok(Some(summary))
    }

    pub fn presenter(&self, candidate: &CandidateId) -> Result<Option<TrustView>, ScreeningServiceError> {
        let profile = self.repository.profile(candidate)?;
        Ok(profile.as_ref().map(TrustView::from))
    }

    pub fn record_override(
        &self,
        candidate: &CandidateId,
        request: OverrideRequest,
    ) -> Result<DecisionOverride, ScreeningServiceError> {
        if self.dossier(candidate)?.is_none() {
            return Err(ScreeningServiceError::UnknownCandidate(candidate.clone()));
        }
        if request.reason.trim().is_empty() {
            return Err(ScreeningServiceError::InvalidOverride(
                "an override needs a reason".to_string(),
            ));
        }

        let now = self.now();
        if request.expires_at.is_some_and(|expires| expires <= now) {
            return Err(ScreeningServiceError::InvalidOverride(
                "expiry must be in the future".to_string(),
            ));
        }

        let stored = self.repository.insert_override(DecisionOverride {
            id: 0,
            candidate_id: candidate.clone(),
            decision: request.decision,
            reason: request.reason,
            entered_by: request.entered_by,
            created_at: now,
            expires_at: request.expires_at,
            revoked_at: None,
        })?;

        warn!(
            candidate_id = %candidate,
            override_id = stored.id,
            decision = stored.decision.label(),
            "manual decision override recorded"
        );
        self.audit(
            candidate,
            TrustEventKind::OverrideRecorded,
            None,
            json!({ "override_id": stored.id, "decision": stored.decision }),
            now,
        )?;
        Ok(stored)
    }

    pub fn revoke_override(
        &self,
        candidate: &CandidateId,
        override_id: u64,
    ) -> Result<DecisionOverride, ScreeningServiceError> {
        let now = self.now();
        let revoked = self.repository.revoke_override(candidate, override_id, now)?;
        info!(candidate_id = %candidate, override_id, "decision override revoked");
        self.audit(
            candidate,
            TrustEventKind::OverrideRevoked,
            None,
            json!({ "override_id": override_id }),
            now,
        )?;
        Ok(revoked)
    }

    /// Audit a run that failed permanently. Nothing else is written.
    pub fn record_failure(
        &self,
        candidate: &CandidateId,
        engine: EngineKind,
        attempts: u32,
        error: &str,
    ) -> Result<(), ScreeningServiceError> {
        self.audit(
            candidate,
            TrustEventKind::ComputationFailed,
            Some(engine),
            json!({ "attempts": attempts, "error": error }),
            self.now(),
        )
    }

    /// Contract history for tracking lookups.
    pub fn dossier_contracts(
        &self,
        candidate: &CandidateId,
    ) -> Result<Option<Vec<ContractRecord>>, ScreeningServiceError> {
        Ok(self.dossier(candidate)?.map(|dossier| dossier.contracts))
    }

    fn dossier(&self, candidate: &CandidateId) -> Result<Option<CandidateDossier>, ScreeningServiceError> {
        let dossier = self.source.dossier(candidate)?;
        if dossier.is_none() {
            debug!(candidate_id = %candidate, "candidate not found");
        }
        Ok(dossier)
    }

    fn profile_or_empty(
        &self,
        candidate: &CandidateId,
        now: DateTime<Utc>,
    ) -> Result<TrustProfile, ScreeningServiceError> {
        Ok(self
            .repository
            .profile(candidate)?
            .unwrap_or_else(|| TrustProfile::empty(candidate.clone(), now)))
    }

    fn persist(
        &self,
        mut profile: TrustProfile,
        snapshot: Option<RiskSnapshot>,
        assessment: Option<CompetencyAssessmentRecord>,
        engine: EngineKind,
        payload: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<(), ScreeningServiceError> {
        profile.updated_at = now;
        let candidate_id = profile.candidate_id.clone();
        let event = TrustEvent {
            candidate_id: candidate_id.clone(),
            kind: TrustEventKind::EngineComputed,
            engine: Some(engine),
            recorded_at: now,
            payload,
        };
        self.repository.commit(TrustWrite {
            candidate_id,
            profile: Some(profile),
            snapshot,
            assessment,
            events: vec![event],
        })?;
        Ok(())
    }

    fn audit(
        &self,
        candidate: &CandidateId,
        kind: TrustEventKind,
        engine: Option<EngineKind>,
        payload: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<(), ScreeningServiceError> {
        self.repository.commit(TrustWrite {
            candidate_id: candidate.clone(),
            profile: None,
            snapshot: None,
            assessment: None,
            events: vec![TrustEvent {
                candidate_id: candidate.clone(),
                kind,
                engine,
                recorded_at: now,
                payload,
            }],
        })?;
        Ok(())
    }
}

fn calibration_for(dossier: &CandidateDossier) -> CalibrationConfig {
    CalibrationConfig::resolve(dossier.fleet_type.as_deref())
}

/// Competency result fit for downstream signals. Low-confidence results feed neither the
/// correlation input nor the risk snapshots that trend analysis reads.
fn usable_competency(profile: &TrustProfile) -> Option<&CompetencyResult> {
    profile
        .competency
        .as_ref()
        .filter(|result| !result.low_confidence)
}

fn analyze_correlation(dossier: &CandidateDossier, profile: &TrustProfile) -> CorrelationResult {
    let competency = usable_competency(profile);

    let input = CorrelationInput {
        technical_score: competency.and_then(CompetencyResult::technical_score),
        technical_depth_index: competency.and_then(|result| result.technical_depth_index),
        stability_index: profile
            .stability
            .as_ref()
            .and_then(|assessment| assessment.stability_index),
        risk_score: profile.stability.as_ref().map(|assessment| assessment.risk_score),
        compliance_score: profile.compliance.as_ref().map(|result| result.score),
        competency_score: competency.map(|result| result.overall_score),
        total_sea_months: profile
            .stability
            .as_ref()
            .map(|assessment| assessment.total_sea_months),
    };

    let thresholds = calibration_for(dossier).correlation_thresholds();
    CorrelationAnalyzer::new(thresholds).analyze(&input)
}

/// Error raised by the screening service.
#[derive(Debug, thiserror::Error)]
pub enum ScreeningServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("candidate {0} not found")]
    UnknownCandidate(CandidateId),
    #[error("invalid override: {0}")]
    InvalidOverride(String),
}
