use crate::infra::{noon_utc, InMemoryCandidateSource, InMemoryTrustRepository};
use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::Args;
use crew_screening::config::ScreeningSettings;
use crew_screening::error::AppError;
use crew_screening::screening::decision::ConfidenceLevel;
use crew_screening::screening::{
    CandidateDossier, CandidateId, ComplianceFacts, ContractHistoryImporter, ContractRecord,
    EngineKind, ExecutiveSummary, InterviewAnswer, InterviewSession, ScreeningJob,
    ScreeningJobQueue, ScreeningService, VerificationFacts,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

const CLI_CANDIDATE: &str = "cli-candidate";

#[derive(Args, Debug)]
pub(crate) struct ScreenArgs {
    /// Contract history CSV (vessel_type,rank_code,company_name,start_date,end_date)
    #[arg(long)]
    pub(crate) contracts: PathBuf,
    /// Interview answers as a JSON array of {dimension_code, answer_text}
    #[arg(long)]
    pub(crate) answers: Option<PathBuf>,
    /// Rank applied for, e.g. AB, C/O, C/E
    #[arg(long, default_value = "AB")]
    pub(crate) rank: String,
    /// Fleet profile key, e.g. tanker, river, offshore
    #[arg(long)]
    pub(crate) fleet: Option<String>,
    /// Declared interview locale, e.g. en or tr
    #[arg(long)]
    pub(crate) locale: Option<String>,
    /// Number of certificates the rank requires
    #[arg(long)]
    pub(crate) required_certificates: Option<u32>,
    /// Number of certificates the candidate holds
    #[arg(long, default_value_t = 0)]
    pub(crate) held_certificates: u32,
    /// Expired certificate name (repeatable)
    #[arg(long = "expired")]
    pub(crate) expired: Vec<String>,
    /// Missing certificate name (repeatable)
    #[arg(long = "missing")]
    pub(crate) missing: Vec<String>,
    /// Evaluation date (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Print the executive summary as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Evaluation date (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// How many full recomputes to queue per candidate
    #[arg(long, default_value_t = 3)]
    pub(crate) runs: u32,
    /// Print executive summaries as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_screen(args: ScreenArgs) -> Result<(), AppError> {
    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());
    let evaluated_at = noon_utc(as_of);

    let contracts = ContractHistoryImporter::from_path(&args.contracts)?;
    let interview = match &args.answers {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            let answers: Vec<InterviewAnswer> = serde_json::from_str(&raw).map_err(|err| {
                AppError::Input(format!("answers file {}: {err}", path.display()))
            })?;
            Some(InterviewSession {
                interview_id: format!("{CLI_CANDIDATE}-interview"),
                role_code: args.rank.clone(),
                locale: args.locale.clone(),
                completed_at: evaluated_at,
                answers,
            })
        }
        None => None,
    };
    let compliance = args.required_certificates.map(|required| ComplianceFacts {
        required_count: required,
        held_count: args.held_certificates,
        missing: args.missing.clone(),
        expired: args.expired.clone(),
    });

    let dossier = CandidateDossier {
        candidate_id: CandidateId(CLI_CANDIDATE.to_string()),
        full_name: String::new(),
        fleet_type: args.fleet.clone(),
        rank_code: args.rank.clone(),
        contracts,
        interview,
        compliance,
        verification: None,
    };
    let candidate = dossier.candidate_id.clone();

    let service = ScreeningService::new(
        Arc::new(InMemoryCandidateSource::seeded([dossier])),
        Arc::new(InMemoryTrustRepository::default()),
        ScreeningSettings::default(),
    )
    .with_clock(move || evaluated_at);

    for engine in EngineKind::ordered() {
        service.compute(&candidate, engine)?;
    }
    let summary = service
        .executive_summary(&candidate)?
        .ok_or_else(|| AppError::Input(format!("candidate {candidate} not found")))?;

    if args.json {
        print_json(&summary)?;
    } else {
        render_summary(&summary);
    }
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());
    let dossiers = sample_dossiers();
    let candidates: Vec<CandidateId> = dossiers
        .iter()
        .map(|dossier| dossier.candidate_id.clone())
        .collect();

    let service = Arc::new(
        ScreeningService::new(
            Arc::new(InMemoryCandidateSource::seeded(dossiers)),
            Arc::new(InMemoryTrustRepository::default()),
            ScreeningSettings::default(),
        )
        .with_clock(minute_clock(noon_utc(as_of))),
    );

    println!("Crew screening demo (evaluated {as_of})");
    let (queue, worker) = ScreeningJobQueue::spawn(service.clone(), None, 32);
    for _ in 0..args.runs.max(1) {
        for candidate in &candidates {
            for job in ScreeningJob::full_run(candidate) {
                queue
                    .enqueue(job)
                    .await
                    .map_err(|err| AppError::Internal(err.to_string()))?;
            }
        }
    }
    drop(queue);
    let report = worker
        .await
        .map_err(|err| AppError::Internal(format!("job worker stopped: {err}")))?;
    println!(
        "Jobs: {} processed | {} computed | {} skipped | {} failed",
        report.processed, report.computed, report.skipped, report.failed
    );

    for candidate in &candidates {
        let Some(summary) = service.executive_summary(candidate)? else {
            continue;
        };
        if args.json {
            print_json(&summary)?;
        } else {
            println!();
            render_summary(&summary);
        }
    }
    Ok(())
}

fn minute_clock(start: DateTime<Utc>) -> impl Fn() -> DateTime<Utc> + Send + Sync + 'static {
    let ticks = Arc::new(AtomicI64::new(0));
    move || start + chrono::Duration::minutes(ticks.fetch_add(1, Ordering::Relaxed))
}

fn print_json(summary: &ExecutiveSummary) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(summary)
        .map_err(|err| AppError::Internal(format!("unable to render summary: {err}")))?;
    println!("{rendered}");
    Ok(())
}

pub(crate) fn render_summary(summary: &ExecutiveSummary) {
    let confidence = match summary.confidence_level {
        ConfidenceLevel::High => "high",
        ConfidenceLevel::Medium => "medium",
        ConfidenceLevel::Low => "low",
    };
    println!("Candidate {}", summary.candidate_id);
    println!(
        "Decision: {} (computed {}, confidence {})",
        summary.decision.label(),
        summary.computed_decision.label(),
        confidence
    );

    println!("\nRationale");
    for entry in &summary.rationale {
        let outcome = entry
            .outcome
            .map(|decision| decision.label())
            .unwrap_or("excluded");
        println!("- {} [{}]: {}", entry.label, outcome, entry.top_reason);
        for evidence in &entry.evidence {
            println!("    * {evidence}");
        }
    }

    if let Some(predictive) = &summary.predictive_risk {
        println!(
            "\nPredictive risk index {:.1} ({}), trend over {} snapshot(s)",
            predictive.predictive_index,
            predictive.tier.label(),
            predictive.trend.snapshot_count
        );
    }

    if summary.what_if.is_empty() {
        println!("\nWhat-if: nothing to remediate");
    } else {
        println!("\nWhat-if");
        for action in &summary.what_if {
            println!(
                "- {}: {} -> {}",
                action.action, action.current_state, action.projected_state
            );
        }
    }

    if !summary.notes.is_empty() {
        println!("\nNotes");
        for note in &summary.notes {
            println!("- {note}");
        }
    }
}

fn contract(
    vessel: &str,
    rank: &str,
    company: &str,
    start: (i32, u32, u32),
    end: Option<(i32, u32, u32)>,
) -> Option<ContractRecord> {
    let day = |(y, m, d): (i32, u32, u32)| NaiveDate::from_ymd_opt(y, m, d);
    let end_date = match end {
        Some(end) => Some(day(end)?),
        None => None,
    };
    Some(ContractRecord {
        vessel_type: vessel.to_string(),
        rank_code: rank.to_string(),
        company_name: company.to_string(),
        start_date: day(start)?,
        end_date,
    })
}

fn answers(pairs: &[(&str, &str)]) -> Vec<InterviewAnswer> {
    pairs
        .iter()
        .map(|(dimension, text)| InterviewAnswer {
            dimension_code: dimension.to_string(),
            answer_text: text.to_string(),
        })
        .collect()
}

fn interview(id: &str, role: &str, locale: &str, pairs: &[(&str, &str)]) -> InterviewSession {
    let completed = NaiveDate::from_ymd_opt(2025, 5, 20)
        .map(noon_utc)
        .unwrap_or_else(Utc::now);
    InterviewSession {
        interview_id: id.to_string(),
        role_code: role.to_string(),
        locale: Some(locale.to_string()),
        completed_at: completed,
        answers: answers(pairs),
    }
}

/// Seeded candidates covering an approve, a review and a reject path.
pub(crate) fn sample_dossiers() -> Vec<CandidateDossier> {
    let officer_contracts = [
        contract("tanker", "2/E", "Aegean Tankers", (2018, 2, 1), Some((2018, 10, 15))),
        contract("tanker", "2/E", "Aegean Tankers", (2018, 12, 20), Some((2019, 8, 30))),
        contract("tanker", "C/E", "Aegean Tankers", (2019, 11, 1), Some((2020, 7, 15))),
        contract("tanker", "C/E", "Aegean Tankers", (2020, 9, 20), Some((2021, 6, 1))),
        contract("tanker", "C/E", "Marmara Shipping", (2021, 8, 1), Some((2022, 4, 20))),
    ];
    let rating_contracts = [
        contract("bulk_carrier", "AB", "Blue Line", (2022, 3, 1), Some((2022, 4, 20))),
        contract("container", "AB", "Harbor Feeder", (2022, 8, 1), Some((2022, 10, 1))),
        contract("general_cargo", "AB", "Northwind", (2023, 5, 10), Some((2023, 6, 30))),
        contract("tanker", "AB", "Delta Marine", (2024, 1, 5), Some((2024, 2, 28))),
    ];
    let engineer_contracts = [
        contract("offshore", "3/E", "Karadeniz Offshore", (2020, 4, 1), Some((2020, 12, 1))),
        contract("offshore", "3/E", "Karadeniz Offshore", (2021, 2, 1), Some((2021, 10, 1))),
        contract("offshore", "2/E", "Karadeniz Offshore", (2021, 12, 1), None),
    ];

    vec![
        CandidateDossier {
            candidate_id: CandidateId("demo-officer".to_string()),
            full_name: "Selin Demir".to_string(),
            fleet_type: Some("tanker".to_string()),
            rank_code: "C/E".to_string(),
            contracts: officer_contracts.into_iter().flatten().collect(),
            interview: Some(interview(
                "demo-officer-int",
                "C/E",
                "en",
                &[
                    ("technical_practical", "First I checked the main engine fuel injection and the turbocharger, then we opened the purifier because the lube oil analysis was off. As a result the plant was restored before arrival under the planned maintenance system."),
                    ("safety_awareness", "Before any enclosed space entry we hold a toolbox talk and issue a permit to work, then the atmosphere is tested. Because of SOLAS and the ISM procedures I stop the job if the risk assessment is not completed."),
                    ("problem_solving", "During a blackout recovery I first isolated the faulty generator, then we ran a root cause analysis with the electrician. Therefore the black start procedure was updated and the crew learned it in a drill."),
                    ("teamwork", "In the engine room we share the watch handover notes with the bridge team so that nobody is surprised during mooring, and the outcome was fewer near miss reports on board."),
                    ("communication", "I brief the engine crew every morning and I confirm orders with closed loop replies because the chief officer and the bridge must know which pump or valve is isolated."),
                    ("leadership", "As chief engineer I lead the safety meeting, then I delegate the maintenance checklist to the junior officers and I check the results so that they learned to plan the work themselves."),
                ],
            )),
            compliance: Some(ComplianceFacts {
                required_count: 7,
                held_count: 7,
                missing: Vec::new(),
                expired: Vec::new(),
            }),
            verification: Some(VerificationFacts {
                status: "verified".to_string(),
                confidence_score: 0.93,
            }),
        },
        CandidateDossier {
            candidate_id: CandidateId("demo-rating".to_string()),
            full_name: "Murat Kaya".to_string(),
            fleet_type: None,
            rank_code: "AB".to_string(),
            contracts: rating_contracts.into_iter().flatten().collect(),
            interview: Some(interview(
                "demo-rating-int",
                "AB",
                "en",
                &[
                    ("technical_practical", "I did mooring and painting."),
                    ("safety_awareness", "Yes, always PPE."),
                    ("teamwork", "Good with everybody."),
                ],
            )),
            compliance: Some(ComplianceFacts {
                required_count: 5,
                held_count: 3,
                missing: vec!["Medical Certificate".to_string(), "Security Awareness".to_string()],
                expired: vec!["Basic Safety Training".to_string()],
            }),
            verification: Some(VerificationFacts {
                status: "partial".to_string(),
                confidence_score: 0.42,
            }),
        },
        CandidateDossier {
            candidate_id: CandidateId("demo-engineer".to_string()),
            full_name: "Emre Yildiz".to_string(),
            fleet_type: Some("offshore".to_string()),
            rank_code: "2/E".to_string(),
            contracts: engineer_contracts.into_iter().flatten().collect(),
            interview: Some(interview(
                "demo-engineer-int",
                "2/E",
                "tr",
                &[
                    ("technical_practical", "Önce ana makine yakıt enjeksiyonu kontrol ettik, sonra separatör bakımı yaptık. Bu nedenle arıza başarıyla giderildi ve bakım planı güncellendi."),
                    ("safety_awareness", "Önce risk değerlendirmesi yaptık ve çalışma izni aldık, sonra makine dairesi için bir tatbikat planladık. Bu nedenle ekip hazırdı."),
                    ("problem_solving", "Pompa arızasında önce vanayı kapattık, ardından jeneratör yükünü dengeledik. Çünkü balast operasyonu devam ediyordu ve sorun çözüldü."),
                    ("teamwork", "Vardiya devri sırasında köprüüstü ile birlikte çalıştık ve mürettebat her adımı biliyordu, sonuç olarak yük operasyonu tamamlandı."),
                ],
            )),
            compliance: Some(ComplianceFacts {
                required_count: 6,
                held_count: 6,
                missing: Vec::new(),
                expired: Vec::new(),
            }),
            verification: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crew_screening::screening::Decision;

    fn service_for(
        dossiers: Vec<CandidateDossier>,
    ) -> ScreeningService<InMemoryCandidateSource, InMemoryTrustRepository> {
        let as_of = NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date");
        ScreeningService::new(
            Arc::new(InMemoryCandidateSource::seeded(dossiers)),
            Arc::new(InMemoryTrustRepository::default()),
            ScreeningSettings::default(),
        )
        .with_clock(minute_clock(noon_utc(as_of)))
    }

    #[test]
    fn sample_dossiers_parse_every_contract() {
        let dossiers = sample_dossiers();
        assert_eq!(dossiers.len(), 3);
        assert_eq!(dossiers[0].contracts.len(), 5);
        assert_eq!(dossiers[1].contracts.len(), 4);
        assert_eq!(dossiers[2].contracts.len(), 3);
    }

    #[test]
    fn rating_with_missing_certificates_is_rejected() {
        let service = service_for(sample_dossiers());
        let candidate = CandidateId("demo-rating".to_string());
        for engine in EngineKind::ordered() {
            service.compute(&candidate, engine).expect("engine run");
        }

        let summary = service
            .executive_summary(&candidate)
            .expect("summary")
            .expect("known candidate");
        assert_eq!(summary.decision, Decision::Reject);
        assert!(!summary.what_if.is_empty());
        let rendered = serde_json::to_string(&summary).expect("serialize");
        assert!(!rendered.contains("Murat Kaya"));
    }

    #[test]
    fn minute_clock_advances_per_reading() {
        let start = noon_utc(NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date"));
        let clock = minute_clock(start);
        assert_eq!(clock(), start);
        assert_eq!(clock(), start + chrono::Duration::minutes(1));
    }
}
