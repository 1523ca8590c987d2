//! Blocking vessel-tracking lookups behind a retrying async boundary.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::domain::{CandidateId, ContractRecord, VerificationFacts};
use super::retry::{retry_with_backoff, RetryError, RetryPolicy};

/// What the tracking provider is asked to confirm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselTrackQuery {
    pub candidate_id: CandidateId,
    pub contracts: Vec<ContractRecord>,
}

/// Blocking AIS lookup. Implementations may perform network I/O.
pub trait VesselTrackProvider: Send + Sync {
    fn lookup(&self, query: &VesselTrackQuery) -> Result<VerificationFacts, ProviderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("tracking provider unavailable: {0}")]
    Unavailable(String),
    #[error("tracking provider rejected the query: {0}")]
    Rejected(String),
}

/// Run the blocking lookup on the blocking pool, retried under `policy`.
pub async fn fetch_verification(
    provider: Arc<dyn VesselTrackProvider>,
    query: VesselTrackQuery,
    policy: &RetryPolicy,
) -> Result<VerificationFacts, RetryError> {
    let query = Arc::new(query);
    retry_with_backoff(policy, "vessel track lookup", |_| {
        let provider = Arc::clone(&provider);
        let query = Arc::clone(&query);
        async move {
            match tokio::task::spawn_blocking(move || provider.lookup(&query)).await {
                Ok(result) => result.map_err(|error| error.to_string()),
                Err(join_error) => Err(format!("lookup task failed: {join_error}")),
            }
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct FlakyProvider {
        failures_left: AtomicU32,
    }

    impl VesselTrackProvider for FlakyProvider {
        fn lookup(&self, _query: &VesselTrackQuery) -> Result<VerificationFacts, ProviderError> {
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(ProviderError::Unavailable("satellite feed lagging".to_string()));
            }
            Ok(VerificationFacts {
                status: "verified".to_string(),
                confidence_score: 0.88,
            })
        }
    }

    fn query() -> VesselTrackQuery {
        VesselTrackQuery {
            candidate_id: CandidateId("cand-ais".to_string()),
            contracts: Vec::new(),
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            attempt_timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn transient_provider_failures_are_retried() {
        let provider = Arc::new(FlakyProvider {
            failures_left: AtomicU32::new(2),
        });
        let facts = fetch_verification(provider, query(), &policy())
            .await
            .expect("third attempt succeeds");
        assert_eq!(facts.status, "verified");
    }

    #[tokio::test]
    async fn persistent_failures_surface_as_retry_error() {
        let provider = Arc::new(FlakyProvider {
            failures_left: AtomicU32::new(10),
        });
        let error = fetch_verification(provider, query(), &policy())
            .await
            .expect_err("exhausted");
        assert!(error.to_string().contains("satellite feed lagging"));
    }
}
