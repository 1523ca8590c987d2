use chrono::{DateTime, Duration, TimeZone, Utc};
use crew_screening::config::ScreeningSettings;
use crew_screening::screening::repository::CompetencyAssessmentRecord;
use crew_screening::screening::{
    CandidateDossier, CandidateId, CandidateSource, ComplianceFacts, ContractHistoryImporter,
    Decision, DecisionOverride, DecisionSource, EngineKind, InterviewAnswer, InterviewSession,
    OverrideRequest, RepositoryError, RiskSnapshot, ScreeningService, SourceError, TrustEvent,
    TrustEventKind, TrustProfile, TrustRepository, TrustWrite, VerificationFacts,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

const CONTRACT_EXPORT: &str = "\
Vessel Type,Rank,Company,Sign On,Sign Off
tanker,C/O,Aegean Tankers,2019-01-01,2019-10-01
tanker,C/O,Aegean Tankers,01.12.2019,01.09.2020
tanker,C/O,Aegean Tankers,2020-11-01,2021-08-01
tanker,C/O,Aegean Tankers,2021-10-01,2022-07-01
tanker,C/O,Aegean Tankers,,2023-01-01
";

const CANDIDATE: &str = "cand-import";
const CANDIDATE_NAME: &str = "Ayse Korkmaz";

struct Fixture;

impl CandidateSource for Fixture {
    fn dossier(&self, candidate: &CandidateId) -> Result<Option<CandidateDossier>, SourceError> {
        if candidate.0 != CANDIDATE {
            return Ok(None);
        }
        let contracts = ContractHistoryImporter::from_reader(CONTRACT_EXPORT.as_bytes())
            .map_err(|err| SourceError::Unavailable(err.to_string()))?;
        Ok(Some(CandidateDossier {
            candidate_id: candidate.clone(),
            full_name: CANDIDATE_NAME.to_string(),
            fleet_type: Some("tanker".to_string()),
            rank_code: "C/O".to_string(),
            contracts,
            interview: Some(interview()),
            compliance: Some(ComplianceFacts {
                required_count: 6,
                held_count: 6,
                missing: Vec::new(),
                expired: Vec::new(),
            }),
            verification: Some(VerificationFacts {
                status: "verified".to_string(),
                confidence_score: 0.9,
            }),
        }))
    }
}

#[derive(Default)]
struct Ledger {
    profiles: HashMap<CandidateId, TrustProfile>,
    snapshots: Vec<RiskSnapshot>,
    assessments: Vec<CompetencyAssessmentRecord>,
    events: Vec<TrustEvent>,
    overrides: Vec<DecisionOverride>,
}

#[derive(Default)]
struct LedgerRepository {
    ledger: Mutex<Ledger>,
}

impl TrustRepository for LedgerRepository {
    fn commit(&self, write: TrustWrite) -> Result<(), RepositoryError> {
        let mut ledger = self.ledger.lock().expect("ledger lock");
        ledger.snapshots.extend(write.snapshot);
        ledger.assessments.extend(write.assessment);
        ledger.events.extend(write.events);
        if let Some(profile) = write.profile {
            ledger.profiles.insert(write.candidate_id, profile);
        }
        Ok(())
    }

    fn profile(&self, candidate: &CandidateId) -> Result<Option<TrustProfile>, RepositoryError> {
        Ok(self.ledger.lock().expect("ledger lock").profiles.get(candidate).cloned())
    }

    fn snapshots(&self, candidate: &CandidateId) -> Result<Vec<RiskSnapshot>, RepositoryError> {
        let ledger = self.ledger.lock().expect("ledger lock");
        Ok(ledger
            .snapshots
            .iter()
            .filter(|snapshot| &snapshot.candidate_id == candidate)
            .cloned()
            .collect())
    }

    fn assessments(
        &self,
        candidate: &CandidateId,
    ) -> Result<Vec<CompetencyAssessmentRecord>, RepositoryError> {
        let ledger = self.ledger.lock().expect("ledger lock");
        Ok(ledger
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
        let ledger = self.ledger.lock().expect("ledger lock");
        Ok(ledger
            .events
            .iter()
            .filter(|event| &event.candidate_id == candidate)
            .filter(|event| kind.map_or(true, |kind| event.kind == kind))
            .cloned()
            .collect())
    }

    fn insert_override(&self, mut entry: DecisionOverride) -> Result<DecisionOverride, RepositoryError> {
        let mut ledger = self.ledger.lock().expect("ledger lock");
        entry.id = ledger.overrides.len() as u64 + 1;
        ledger.overrides.push(entry.clone());
        Ok(entry)
    }

    fn overrides(&self, candidate: &CandidateId) -> Result<Vec<DecisionOverride>, RepositoryError> {
        let ledger = self.ledger.lock().expect("ledger lock");
        Ok(ledger
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
        let mut ledger = self.ledger.lock().expect("ledger lock");
        let entry = ledger
            .overrides
            .iter_mut()
            .find(|entry| &entry.candidate_id == candidate && entry.id == override_id)
            .ok_or(RepositoryError::NotFound)?;
        if entry.revoked_at.is_some() {
            return Err(RepositoryError::Conflict("already revoked".to_string()));
        }
        entry.revoked_at = Some(at);
        Ok(entry.clone())
    }
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
        .single()
        .expect("valid time")
}

fn interview() -> InterviewSession {
    let answer = |dimension: &str, text: &str| InterviewAnswer {
        dimension_code: dimension.to_string(),
        answer_text: text.to_string(),
    };
    InterviewSession {
        interview_id: "int-import".to_string(),
        role_code: "C/O".to_string(),
        locale: Some("en".to_string()),
        completed_at: start(),
        answers: vec![
            answer(
                "technical_practical",
                "First I checked the inert gas system and the loading computer, then we ran the \
                 stability calculation before the cargo operation. Because the ballast plan was \
                 wrong we corrected the trim, and as a result the cargo tank cleaning was \
                 completed on time under ISGOTT.",
            ),
            answer(
                "safety_awareness",
                "Before any enclosed space entry we hold a toolbox talk and issue a permit to \
                 work, then the atmosphere is tested with a gas detector. Because of SOLAS and \
                 the ISM procedures I always stop the job if the risk assessment is not completed.",
            ),
            answer(
                "problem_solving",
                "When the main engine lost power I first isolated the fuel injection fault, then \
                 we ran a root cause analysis with the chief engineer. As a result the engine was \
                 restored and the crew learned a new checklist.",
            ),
            answer(
                "teamwork",
                "On my last vessel the bridge team and the engine room worked together during \
                 mooring, and we shared the watch handover notes so that nobody was surprised. \
                 The outcome was a safer crew and fewer near miss reports.",
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
                 officer follows the planned maintenance and the permit to work system. I \
                 learned to delegate the cargo watch to the junior officers.",
            ),
        ],
    }
}

fn service() -> (ScreeningService<Fixture, LedgerRepository>, Arc<LedgerRepository>) {
    let repository = Arc::new(LedgerRepository::default());
    let ticks = Arc::new(AtomicI64::new(0));
    let service = ScreeningService::new(Arc::new(Fixture), repository.clone(), ScreeningSettings::default())
        .with_clock(move || start() + Duration::minutes(ticks.fetch_add(1, Ordering::SeqCst)));
    (service, repository)
}

fn full_run(service: &ScreeningService<Fixture, LedgerRepository>, candidate: &CandidateId) {
    for engine in EngineKind::ordered() {
        service
            .compute(candidate, engine)
            .expect("engine run")
            .expect("engine output");
    }
}

#[test]
fn imported_contract_history_flows_into_an_approval() {
    let (service, repository) = service();
    let candidate = CandidateId(CANDIDATE.to_string());
    full_run(&service, &candidate);

    let profile = repository
        .profile(&candidate)
        .expect("profile")
        .expect("cached profile");
    let stability = profile.stability.expect("stability");
    assert_eq!(stability.contract_count, 4, "row without a start date is dropped");

    let summary = service
        .executive_summary(&candidate)
        .expect("summary")
        .expect("known candidate");
    assert_eq!(summary.decision, Decision::Approve);
    assert_eq!(summary.decided_by, DecisionSource::Computed);
    assert!(summary.what_if.is_empty());
    assert_eq!(repository.assessments(&candidate).expect("assessments").len(), 1);
}

#[test]
fn repeated_runs_build_history_and_overrides_are_audited() {
    let (service, repository) = service();
    let candidate = CandidateId(CANDIDATE.to_string());
    for _ in 0..3 {
        full_run(&service, &candidate);
    }

    let snapshots = repository.snapshots(&candidate).expect("snapshots");
    assert_eq!(snapshots.len(), 3);
    assert!(snapshots
        .windows(2)
        .all(|pair| pair[0].computed_at < pair[1].computed_at));

    let request: OverrideRequest = serde_json::from_value(serde_json::json!({
        "decision": "review",
        "reason": "flag-state endorsement being re-issued",
        "entered_by": "crewing-manager",
    }))
    .expect("override request");
    let stored = service.record_override(&candidate, request).expect("override");

    let overridden = service
        .executive_summary(&candidate)
        .expect("summary")
        .expect("known candidate");
    assert_eq!(overridden.decision, Decision::Review);
    assert_eq!(overridden.computed_decision, Decision::Approve);
    assert_eq!(overridden.decided_by, DecisionSource::Override);

    service
        .revoke_override(&candidate, stored.id)
        .expect("revoke");
    let restored = service
        .executive_summary(&candidate)
        .expect("summary")
        .expect("known candidate");
    assert_eq!(restored.decision, Decision::Approve);

    let override_events = repository
        .events(&candidate, Some(TrustEventKind::OverrideRecorded))
        .expect("events");
    assert_eq!(override_events.len(), 1);
}

#[test]
fn trust_view_never_carries_the_candidate_name() {
    let (service, _repository) = service();
    let candidate = CandidateId(CANDIDATE.to_string());
    full_run(&service, &candidate);

    let view = service
        .presenter(&candidate)
        .expect("presenter")
        .expect("cached profile");
    let rendered = serde_json::to_string(&view).expect("serialize view");
    assert!(!rendered.contains(CANDIDATE_NAME));
    assert!(rendered.contains(CANDIDATE));
}
