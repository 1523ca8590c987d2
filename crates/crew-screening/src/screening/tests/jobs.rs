use super::common::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::screening::domain::{EngineKind, VerificationFacts};
use crate::screening::jobs::{ScreeningJob, ScreeningJobQueue};
use crate::screening::repository::{TrustEventKind, TrustRepository};
use crate::screening::tracking::{ProviderError, VesselTrackProvider, VesselTrackQuery};
use crate::screening::verification::VerificationStatus;
use crate::screening::ScreeningService;

struct CountingProvider {
    calls: AtomicU32,
}

impl VesselTrackProvider for CountingProvider {
    fn lookup(&self, query: &VesselTrackQuery) -> Result<VerificationFacts, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if query.contracts.is_empty() {
            return Err(ProviderError::Rejected("no contracts to match".to_string()));
        }
        Ok(VerificationFacts {
            status: "partial".to_string(),
            confidence_score: 0.74,
        })
    }
}

struct DarkProvider {
    calls: AtomicU32,
}

impl VesselTrackProvider for DarkProvider {
    fn lookup(&self, _query: &VesselTrackQuery) -> Result<VerificationFacts, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ProviderError::Unavailable("no AIS coverage".to_string()))
    }
}

#[tokio::test]
async fn full_run_computes_every_engine() {
    let (service, repository) = build_service();
    let (queue, worker) = ScreeningJobQueue::spawn(Arc::new(service), None, 8);

    for job in ScreeningJob::full_run(&steady_id()) {
        queue.enqueue(job).await.expect("enqueue");
    }
    drop(queue);
    let report = worker.await.expect("worker joins");

    assert_eq!(report.processed, 6);
    assert_eq!(report.computed, 6);
    assert_eq!(report.failed, 0);
    assert_eq!(repository.snapshots(&steady_id()).expect("snapshots").len(), 1);
}

#[tokio::test]
async fn source_outage_is_retried_then_audited() {
    let repository = Arc::new(MemoryTrustRepository::default());
    let service = ScreeningService::new(Arc::new(OfflineSource), repository.clone(), test_settings())
        .with_clock(stepping_clock());
    let (queue, worker) = ScreeningJobQueue::spawn(Arc::new(service), None, 4);

    queue
        .enqueue(ScreeningJob::new(drifting_id(), EngineKind::Stability))
        .await
        .expect("enqueue");
    drop(queue);
    let report = worker.await.expect("worker joins");

    assert_eq!(report.failed, 1);
    assert_eq!(report.retries, 1);
    let failures = repository
        .events(&drifting_id(), Some(TrustEventKind::ComputationFailed))
        .expect("events");
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].engine, Some(EngineKind::Stability));
    assert_eq!(failures[0].payload["attempts"], 2);
    assert!(repository.profile(&drifting_id()).expect("profile").is_none());
}

#[tokio::test]
async fn verification_jobs_use_the_tracking_provider() {
    let (service, repository) = build_service();
    let provider = Arc::new(CountingProvider {
        calls: AtomicU32::new(0),
    });
    let tracking: Arc<dyn VesselTrackProvider> = provider.clone();
    let (queue, worker) = ScreeningJobQueue::spawn(Arc::new(service), Some(tracking), 4);

    queue
        .enqueue(ScreeningJob::new(steady_id(), EngineKind::Verification))
        .await
        .expect("enqueue");
    drop(queue);
    let report = worker.await.expect("worker joins");

    assert_eq!(report.computed, 1);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    let profile = repository
        .profile(&steady_id())
        .expect("profile")
        .expect("cached profile");
    let verification = profile.verification.expect("verification");
    assert_eq!(verification.status, VerificationStatus::Partial);
    assert_eq!(verification.confidence, 0.74);
}

#[tokio::test]
async fn unknown_candidates_are_skipped() {
    let (service, _) = build_service();
    let (queue, worker) = ScreeningJobQueue::spawn(Arc::new(service), None, 2);

    queue
        .enqueue(ScreeningJob::new(
            crate::screening::domain::CandidateId("cand-ghost".to_string()),
            EngineKind::Compliance,
        ))
        .await
        .expect("enqueue");
    drop(queue);
    let report = worker.await.expect("worker joins");

    assert_eq!(report.skipped, 1);
    assert_eq!(report.computed, 0);
}

#[tokio::test]
async fn exhausted_tracking_lookup_is_not_retried_again() {
    let (service, repository) = build_service();
    let provider = Arc::new(DarkProvider {
        calls: AtomicU32::new(0),
    });
    let tracking: Arc<dyn VesselTrackProvider> = provider.clone();
    let (queue, worker) = ScreeningJobQueue::spawn(Arc::new(service), Some(tracking), 4);

    queue
        .enqueue(ScreeningJob::new(steady_id(), EngineKind::Verification))
        .await
        .expect("enqueue");
    drop(queue);
    let report = worker.await.expect("worker joins");

    assert_eq!(report.failed, 1);
    assert_eq!(report.retries, 0);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    let failures = repository
        .events(&steady_id(), Some(TrustEventKind::ComputationFailed))
        .expect("events");
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].engine, Some(EngineKind::Verification));
    assert_eq!(failures[0].payload["attempts"], 2);
}
