use chrono::{DateTime, NaiveDate, Utc};
use crew_screening::screening::repository::{
    CandidateSource, CompetencyAssessmentRecord, DecisionOverride, RepositoryError, RiskSnapshot,
    SourceError, TrustEvent, TrustEventKind, TrustProfile, TrustRepository, TrustWrite,
};
use crew_screening::screening::{CandidateDossier, CandidateId};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryCandidateSource {
    dossiers: Arc<Mutex<HashMap<CandidateId, CandidateDossier>>>,
}

impl InMemoryCandidateSource {
    pub(crate) fn seeded(dossiers: impl IntoIterator<Item = CandidateDossier>) -> Self {
        let source = Self::default();
        if let Ok(mut guard) = source.dossiers.lock() {
            for dossier in dossiers {
                guard.insert(dossier.candidate_id.clone(), dossier);
            }
        }
        source
    }
}

impl CandidateSource for InMemoryCandidateSource {
    fn dossier(&self, candidate: &CandidateId) -> Result<Option<CandidateDossier>, SourceError> {
        let guard = self
            .dossiers
            .lock()
            .map_err(|_| SourceError::Unavailable("candidate store poisoned".to_string()))?;
        Ok(guard.get(candidate).cloned())
    }
}

#[derive(Default)]
struct TrustState {
    profiles: HashMap<CandidateId, TrustProfile>,
    snapshots: Vec<RiskSnapshot>,
    assessments: Vec<CompetencyAssessmentRecord>,
    events: Vec<TrustEvent>,
    overrides: Vec<DecisionOverride>,
    next_override_id: u64,
}

/// Process-local trust store. One mutex keeps every commit atomic.
#[derive(Default, Clone)]
pub(crate) struct InMemoryTrustRepository {
    state: Arc<Mutex<TrustState>>,
}

impl InMemoryTrustRepository {
    fn state(&self) -> Result<MutexGuard<'_, TrustState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("trust store poisoned".to_string()))
    }
}

impl TrustRepository for InMemoryTrustRepository {
    fn commit(&self, write: TrustWrite) -> Result<(), RepositoryError> {
        let mut guard = self.state()?;
        if let Some(snapshot) = write.snapshot {
            guard.snapshots.push(snapshot);
        }
        if let Some(assessment) = write.assessment {
            guard.assessments.push(assessment);
        }
        guard.events.extend(write.events);
        if let Some(profile) = write.profile {
            guard.profiles.insert(write.candidate_id, profile);
        }
        Ok(())
    }

    fn profile(&self, candidate: &CandidateId) -> Result<Option<TrustProfile>, RepositoryError> {
        Ok(self.state()?.profiles.get(candidate).cloned())
    }

    fn snapshots(&self, candidate: &CandidateId) -> Result<Vec<RiskSnapshot>, RepositoryError> {
        let mut snapshots: Vec<RiskSnapshot> = self
            .state()?
            .snapshots
            .iter()
            .filter(|snapshot| &snapshot.candidate_id == candidate)
            .cloned()
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.computed_at);
        Ok(snapshots)
    }

    fn assessments(
        &self,
        candidate: &CandidateId,
    ) -> Result<Vec<CompetencyAssessmentRecord>, RepositoryError> {
        Ok(self
            .state()?
            .assessments
            .iter()
            .filter(|record| &record.candidate_id == candidate)
            .cloned()
            .collect())
    }

    fn events(
        &self,
        candidate: &CandidateId,
        kind: Option<TrustEventKind>,
    ) -> Result<Vec<TrustEvent>, RepositoryError> {
        Ok(self
            .state()?
            .events
            .iter()
            .filter(|event| &event.candidate_id == candidate)
            .filter(|event| kind.map_or(true, |kind| event.kind == kind))
            .cloned()
            .collect())
    }

    fn insert_override(&self, mut entry: DecisionOverride) -> Result<DecisionOverride, RepositoryError> {
        let mut guard = self.state()?;
        guard.next_override_id += 1;
        entry.id = guard.next_override_id;
        guard.overrides.push(entry.clone());
        Ok(entry)
    }

    fn overrides(&self, candidate: &CandidateId) -> Result<Vec<DecisionOverride>, RepositoryError> {
        Ok(self
            .state()?
            .overrides
            .iter()
            .filter(|entry| &entry.candidate_id == candidate)
            .cloned()
            .collect())
    }

    fn revoke_override(
        &self,
        candidate: &CandidateId,
        override_id: u64,
        at: DateTime<Utc>,
    ) -> Result<DecisionOverride, RepositoryError> {
        let mut guard = self.state()?;
        let entry = guard
            .overrides
            .iter_mut()
            .find(|entry| &entry.candidate_id == candidate && entry.id == override_id)
            .ok_or(RepositoryError::NotFound)?;
        if entry.revoked_at.is_some() {
            return Err(RepositoryError::Conflict(format!(
                "override {override_id} already revoked"
            )));
        }
        entry.revoked_at = Some(at);
        Ok(entry.clone())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Noon UTC on `day`, so `as_of` comparisons land on the intended date.
pub(crate) fn noon_utc(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_opt(12, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or_else(Utc::now)
}
