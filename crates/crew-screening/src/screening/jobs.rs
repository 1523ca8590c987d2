//! Background queue running engine computations one job at a time.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::domain::{CandidateId, EngineKind};
use super::repository::{CandidateSource, TrustRepository};
use super::retry::{RetryError, RetryPolicy};
use super::service::{ScreeningService, ScreeningServiceError};
use super::tracking::{fetch_verification, VesselTrackProvider, VesselTrackQuery};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreeningJob {
    pub candidate_id: CandidateId,
    pub engine: EngineKind,
}

impl ScreeningJob {
    pub fn new(candidate_id: CandidateId, engine: EngineKind) -> Self {
        Self {
            candidate_id,
            engine,
        }
    }

    pub fn full_run(candidate_id: &CandidateId) -> Vec<Self> {
        EngineKind::ordered()
            .into_iter()
            .map(|engine| Self::new(candidate_id.clone(), engine))
            .collect()
    }
}

/// Counters reported when the worker drains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobReport {
    pub processed: usize,
    pub computed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub retries: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum JobQueueError {
    #[error("job queue is closed")]
    Closed,
}

/// Handle for submitting jobs. Dropping every handle lets the worker finish.
#[derive(Clone)]
pub struct ScreeningJobQueue {
    sender: mpsc::Sender<ScreeningJob>,
}

impl ScreeningJobQueue {
    pub fn spawn<C, R>(
        service: Arc<ScreeningService<C, R>>,
        tracking: Option<Arc<dyn VesselTrackProvider>>,
        capacity: usize,
    ) -> (Self, JoinHandle<JobReport>)
    where
        C: CandidateSource + 'static,
        R: TrustRepository + 'static,
    {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let policy = RetryPolicy::from_settings(service.settings());
        let worker = JobWorker {
            service,
            tracking,
            policy,
        };
        let handle = tokio::spawn(worker.run(receiver));
        (Self { sender }, handle)
    }

    pub async fn enqueue(&self, job: ScreeningJob) -> Result<(), JobQueueError> {
        self.sender.send(job).await.map_err(|_| JobQueueError::Closed)
    }
}

struct JobWorker<C, R> {
    service: Arc<ScreeningService<C, R>>,
    tracking: Option<Arc<dyn VesselTrackProvider>>,
    policy: RetryPolicy,
}

enum JobOutcome {
    Computed,
    Skipped,
}

/// `Exhausted` failures already spent their attempts inside the provider retry loop.
enum JobFailure {
    Retryable(String),
    Exhausted { attempts: u32, message: String },
}

impl From<ScreeningServiceError> for JobFailure {
    fn from(error: ScreeningServiceError) -> Self {
        Self::Retryable(error.to_string())
    }
}

impl<C, R> JobWorker<C, R>
where
    C: CandidateSource + 'static,
    R: TrustRepository + 'static,
{
    async fn run(self, mut receiver: mpsc::Receiver<ScreeningJob>) -> JobReport {
        let mut report = JobReport::default();

        while let Some(job) = receiver.recv().await {
            report.processed += 1;
            let mut attempt = 1;

            loop {
                match self.execute(&job).await {
                    Ok(JobOutcome::Computed) => {
                        report.computed += 1;
                        break;
                    }
                    Ok(JobOutcome::Skipped) => {
                        report.skipped += 1;
                        break;
                    }
                    Err(JobFailure::Retryable(message)) if attempt < self.policy.max_attempts => {
                        let delay = self.policy.delay_after(attempt);
                        warn!(
                            candidate_id = %job.candidate_id,
                            engine = job.engine.key(),
                            attempt,
                            error = %message,
                            "screening job failed; retrying"
                        );
                        report.retries += 1;
                        attempt += 1;
                        tokio::time::sleep(delay).await;
                    }
                    Err(failure) => {
                        let (attempts, message) = match failure {
                            JobFailure::Retryable(message) => (attempt, message),
                            JobFailure::Exhausted { attempts, message } => (attempts, message),
                        };
                        error!(
                            candidate_id = %job.candidate_id,
                            engine = job.engine.key(),
                            attempts,
                            error = %message,
                            "screening job failed permanently"
                        );
                        if let Err(audit_error) =
                            self.service
                                .record_failure(&job.candidate_id, job.engine, attempts, &message)
                        {
                            error!(error = %audit_error, "failed to audit job failure");
                        }
                        report.failed += 1;
                        break;
                    }
                }
            }
        }

        info!(
            processed = report.processed,
            computed = report.computed,
            skipped = report.skipped,
            failed = report.failed,
            "screening job worker drained"
        );
        report
    }

    async fn execute(&self, job: &ScreeningJob) -> Result<JobOutcome, JobFailure> {
        if job.engine == EngineKind::Verification && self.service.settings().verification_enabled {
            if let Some(provider) = &self.tracking {
                return self.verify_with_provider(provider, job).await;
            }
        }

        match self.service.compute(&job.candidate_id, job.engine) {
            Ok(Some(_)) => Ok(JobOutcome::Computed),
            Ok(None) => Ok(JobOutcome::Skipped),
            Err(error) => Err(error.into()),
        }
    }

    async fn verify_with_provider(
        &self,
        provider: &Arc<dyn VesselTrackProvider>,
        job: &ScreeningJob,
    ) -> Result<JobOutcome, JobFailure> {
        let Some(contracts) = self.service.dossier_contracts(&job.candidate_id)? else {
            return Ok(JobOutcome::Skipped);
        };
        let query = VesselTrackQuery {
            candidate_id: job.candidate_id.clone(),
            contracts,
        };

        let facts = fetch_verification(Arc::clone(provider), query, &self.policy)
            .await
            .map_err(|error| match &error {
                RetryError::Exhausted { attempts, .. } => JobFailure::Exhausted {
                    attempts: *attempts,
                    message: error.to_string(),
                },
            })?;
        self.service.apply_verification(&job.candidate_id, &facts)?;
        Ok(JobOutcome::Computed)
    }
}
