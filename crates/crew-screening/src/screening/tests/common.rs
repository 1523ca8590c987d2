use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::config::ScreeningSettings;
use crate::screening::domain::{
    CandidateDossier, CandidateId, ComplianceFacts, ContractRecord, InterviewAnswer,
    InterviewSession, VerificationFacts,
};
use crate::screening::repository::{
    CandidateSource, CompetencyAssessmentRecord, DecisionOverride, RepositoryError, RiskSnapshot,
    SourceError, TrustEvent, TrustEventKind, TrustProfile, TrustRepository, TrustWrite,
};
use crate::screening::ScreeningService;

pub(super) const STEADY_ID: &str = "cand-steady";
pub(super) const STEADY_NAME: &str = "Deniz Aksoy";
pub(super) const DRIFTING_ID: &str = "cand-drift";
pub(super) const DRIFTING_NAME: &str = "Kerem Arslan";

pub(super) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
        .single()
        .expect("valid time")
}

pub(super) fn as_of() -> NaiveDate {
    now().date_naive()
}

pub(super) fn contract(
    vessel_type: &str,
    rank_code: &str,
    company: &str,
    start: NaiveDate,
    end: Option<NaiveDate>,
) -> ContractRecord {
    ContractRecord {
        vessel_type: vessel_type.to_string(),
        rank_code: rank_code.to_string(),
        company_name: company.to_string(),
        start_date: start,
        end_date: end,
    }
}

/// Four nine-month chief officer contracts with the same operator.
pub(super) fn steady_contracts() -> Vec<ContractRecord> {
    vec![
        contract("tanker", "C/O", "Aegean Tankers", date(2019, 1, 1), Some(date(2019, 10, 1))),
        contract("tanker", "C/O", "Aegean Tankers", date(2019, 12, 1), Some(date(2020, 9, 1))),
        contract("tanker", "C/O", "Aegean Tankers", date(2020, 11, 1), Some(date(2021, 8, 1))),
        contract("tanker", "C/O", "Aegean Tankers", date(2021, 10, 1), Some(date(2022, 7, 1))),
    ]
}

/// Short able seaman contracts with a different employer each time.
pub(super) fn drifting_contracts() -> Vec<ContractRecord> {
    vec![
        contract("bulk_carrier", "AB", "Blue Line", date(2023, 1, 10), Some(date(2023, 3, 1))),
        contract("container", "AB", "Harbor Feeder", date(2023, 6, 1), Some(date(2023, 8, 15))),
        contract("bulk_carrier", "AB", "Northwind Bulk", date(2024, 2, 1), Some(date(2024, 4, 20))),
        contract("general_cargo", "AB", "Kaptan Shipping", date(2024, 9, 1), Some(date(2024, 11, 1))),
    ]
}

pub(super) fn answer(dimension: &str, text: &str) -> InterviewAnswer {
    InterviewAnswer {
        dimension_code: dimension.to_string(),
        answer_text: text.to_string(),
    }
}

pub(super) fn session(role_code: &str, locale: Option<&str>, answers: Vec<InterviewAnswer>) -> InterviewSession {
    InterviewSession {
        interview_id: format!("int-{}", role_code.to_ascii_lowercase().replace('/', "")),
        role_code: role_code.to_string(),
        locale: locale.map(str::to_string),
        completed_at: now(),
        answers,
    }
}

pub(super) fn strong_answers() -> Vec<InterviewAnswer> {
    vec![
        answer(
            "technical_practical",
            "First I checked the inert gas system and the loading computer, then we ran the \
             stability calculation before the cargo operation. Because the ballast plan was \
             wrong we corrected the trim, and as a result the cargo tank cleaning was completed \
             on time under ISGOTT.",
        ),
        answer(
            "safety_awareness",
            "Before any enclosed space entry we hold a toolbox talk and issue a permit to work, \
             then the atmosphere is tested with a gas detector. Because of SOLAS and the ISM \
             procedures I always stop the job if the risk assessment is not completed.",
        ),
        answer(
            "problem_solving",
            "When the main engine lost power I first isolated the fuel injection fault, then we \
             ran a root cause analysis with the chief engineer. As a result the engine was \
             restored and the crew learned a new checklist.",
        ),
        answer(
            "teamwork",
            "On my last vessel the bridge team and the engine room worked together during \
             mooring, and we shared the watch handover notes so that nobody was surprised. The \
             outcome was a safer crew and fewer near miss reports.",
        ),
        answer(
            "communication",
            "I give clear orders on the bridge and I confirm them with closed loop replies, \
             because the pilot and the crew must understand the passage plan and the mooring \
             lines plan before we start.",
        ),
        answer(
            "leadership",
            "As chief officer I lead the safety meeting every morning, then I check that each \
             officer follows the planned maintenance and the permit to work system. I learned \
             to delegate the cargo watch to the junior officers.",
        ),
    ]
}

pub(super) fn brief_answers() -> Vec<InterviewAnswer> {
    [
        "technical_practical",
        "safety_awareness",
        "problem_solving",
        "teamwork",
        "communication",
        "leadership",
    ]
    .into_iter()
    .map(|dimension| answer(dimension, "Yes, I did."))
    .collect()
}

pub(super) fn clean_compliance() -> ComplianceFacts {
    ComplianceFacts {
        required_count: 6,
        held_count: 6,
        missing: Vec::new(),
        expired: Vec::new(),
    }
}

pub(super) fn failing_compliance() -> ComplianceFacts {
    ComplianceFacts {
        required_count: 6,
        held_count: 3,
        missing: vec![
            "Medical Certificate".to_string(),
            "Security Awareness".to_string(),
            "Advanced Fire Fighting".to_string(),
        ],
        expired: vec!["GMDSS".to_string(), "Basic Safety Training".to_string()],
    }
}

pub(super) fn steady_dossier() -> CandidateDossier {
    CandidateDossier {
        candidate_id: CandidateId(STEADY_ID.to_string()),
        full_name: STEADY_NAME.to_string(),
        fleet_type: Some("tanker".to_string()),
        rank_code: "C/O".to_string(),
        contracts: steady_contracts(),
        interview: Some(session("C/O", Some("en"), strong_answers())),
        compliance: Some(clean_compliance()),
        verification: Some(VerificationFacts {
            status: "verified".to_string(),
            confidence_score: 0.91,
        }),
    }
}

pub(super) fn drifting_dossier() -> CandidateDossier {
    CandidateDossier {
        candidate_id: CandidateId(DRIFTING_ID.to_string()),
        full_name: DRIFTING_NAME.to_string(),
        fleet_type: None,
        rank_code: "AB".to_string(),
        contracts: drifting_contracts(),
        interview: Some(session("AB", Some("en"), brief_answers())),
        compliance: Some(failing_compliance()),
        verification: Some(VerificationFacts {
            status: "mismatch".to_string(),
            confidence_score: 0.3,
        }),
    }
}

pub(super) fn test_settings() -> ScreeningSettings {
    ScreeningSettings {
        job_max_attempts: 2,
        job_backoff: Duration::from_millis(1),
        provider_timeout: Duration::from_millis(500),
        ..ScreeningSettings::default()
    }
}

pub(super) fn build_service_with(
    settings: ScreeningSettings,
) -> (
    ScreeningService<MemoryCandidateSource, MemoryTrustRepository>,
    Arc<MemoryTrustRepository>,
) {
    let source = Arc::new(MemoryCandidateSource::with([steady_dossier(), drifting_dossier()]));
    let repository = Arc::new(MemoryTrustRepository::default());
    let service = ScreeningService::new(source, repository.clone(), settings)
        .with_clock(stepping_clock());
    (service, repository)
}

pub(super) fn build_service() -> (
    ScreeningService<MemoryCandidateSource, MemoryTrustRepository>,
    Arc<MemoryTrustRepository>,
) {
    build_service_with(test_settings())
}

/// Starts at [`now`] and advances one minute per reading.
pub(super) fn stepping_clock() -> impl Fn() -> DateTime<Utc> + Send + Sync + 'static {
    let ticks = Arc::new(AtomicI64::new(0));
    move || now() + chrono::Duration::minutes(ticks.fetch_add(1, Ordering::SeqCst))
}

pub(super) fn steady_id() -> CandidateId {
    CandidateId(STEADY_ID.to_string())
}

pub(super) fn drifting_id() -> CandidateId {
    CandidateId(DRIFTING_ID.to_string())
}

#[derive(Default, Clone)]
pub(super) struct MemoryCandidateSource {
    pub(super) dossiers: Arc<Mutex<HashMap<CandidateId, CandidateDossier>>>,
}

impl MemoryCandidateSource {
    pub(super) fn with(dossiers: impl IntoIterator<Item = CandidateDossier>) -> Self {
        let source = Self::default();
        {
            let mut guard = source.dossiers.lock().expect("source mutex poisoned");
            for dossier in dossiers {
                guard.insert(dossier.candidate_id.clone(), dossier);
            }
        }
        source
    }
}

impl CandidateSource for MemoryCandidateSource {
    fn dossier(&self, candidate: &CandidateId) -> Result<Option<CandidateDossier>, SourceError> {
        let guard = self.dossiers.lock().expect("source mutex poisoned");
        Ok(guard.get(candidate).cloned())
    }
}

pub(super) struct OfflineSource;

impl CandidateSource for OfflineSource {
    fn dossier(&self, _candidate: &CandidateId) -> Result<Option<CandidateDossier>, SourceError> {
        Err(SourceError::Unavailable("crewing system offline".to_string()))
    }
}

#[derive(Default)]
struct MemoryState {
    profiles: HashMap<CandidateId, TrustProfile>,
    snapshots: Vec<RiskSnapshot>,
    assessments: Vec<CompetencyAssessmentRecord>,
    events: Vec<TrustEvent>,
    overrides: Vec<DecisionOverride>,
    next_override_id: u64,
}

#[derive(Default, Clone)]
pub(super) struct MemoryTrustRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl TrustRepository for MemoryTrustRepository {
    fn commit(&self, write: TrustWrite) -> Result<(), RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
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
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard.profiles.get(candidate).cloned())
    }

    fn snapshots(&self, candidate: &CandidateId) -> Result<Vec<RiskSnapshot>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        let mut snapshots: Vec<RiskSnapshot> = guard
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
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard
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
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard
            .events
            .iter()
            .filter(|event| &event.candidate_id == candidate)
            .filter(|event| kind.map_or(true, |kind| event.kind == kind))
            .cloned()
            .collect())
    }

    fn insert_override(&self, mut entry: DecisionOverride) -> Result<DecisionOverride, RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        guard.next_override_id += 1;
        entry.id = guard.next_override_id;
        guard.overrides.push(entry.clone());
        Ok(entry)
    }

    fn overrides(&self, candidate: &CandidateId) -> Result<Vec<DecisionOverride>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard
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
        let mut guard = self.state.lock().expect("repository mutex poisoned");
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

pub(super) struct UnavailableRepository;

impl TrustRepository for UnavailableRepository {
    fn commit(&self, _write: TrustWrite) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn profile(&self, _candidate: &CandidateId) -> Result<Option<TrustProfile>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn snapshots(&self, _candidate: &CandidateId) -> Result<Vec<RiskSnapshot>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn assessments(
        &self,
        _candidate: &CandidateId,
    ) -> Result<Vec<CompetencyAssessmentRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn events(
        &self,
        _candidate: &CandidateId,
        _kind: Option<TrustEventKind>,
    ) -> Result<Vec<TrustEvent>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert_override(&self, _entry: DecisionOverride) -> Result<DecisionOverride, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn overrides(&self, _candidate: &CandidateId) -> Result<Vec<DecisionOverride>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn revoke_override(
        &self,
        _candidate: &CandidateId,
        _override_id: u64,
        _at: DateTime<Utc>,
    ) -> Result<DecisionOverride, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
