//! Candidate screening engines, decision fusion and their persistence seams.
//!
//! Engines are pure functions over the candidate dossier. [`ScreeningService`] wires them to
//! a [`CandidateSource`] and a [`TrustRepository`]; [`screening_router`] exposes the service
//! over HTTP and [`ScreeningJobQueue`] runs it in the background.

pub mod calibration;
pub mod competency;
pub mod compliance;
pub mod correlation;
pub mod decision;
pub mod domain;
pub mod guardrails;
pub mod import;
pub mod jobs;
pub mod presenter;
pub mod repository;
pub mod retry;
pub mod router;
pub mod service;
pub mod stability;
pub mod tracking;
pub mod trend;
pub mod verification;

#[cfg(test)]
mod tests;

pub use calibration::{CalibrationConfig, CalibrationProfile, FleetType, RiskFactor};
pub use competency::{CompetencyEngine, CompetencyResult, CompetencyStatus};
pub use compliance::{score_compliance, ComplianceResult};
pub use correlation::{CorrelationAnalyzer, CorrelationInput, CorrelationPattern, CorrelationResult};
pub use decision::{ConfidenceLevel, DecisionFusion, DecisionSource, ExecutiveSummary};
pub use domain::{
    CandidateDossier, CandidateId, CompetencyDimension, ComplianceFacts, ContractRecord, Decision,
    EngineKind, Flag, InterviewAnswer, InterviewSession, Rank, RiskTier, Severity,
    VerificationFacts,
};
pub use import::{ContractHistoryImporter, ContractImportError};
pub use jobs::{JobReport, ScreeningJob, ScreeningJobQueue};
pub use presenter::TrustView;
pub use repository::{
    CandidateSource, DecisionOverride, RepositoryError, RiskSnapshot, SourceError, TrustEvent,
    TrustEventKind, TrustProfile, TrustRepository, TrustWrite,
};
pub use router::screening_router;
pub use service::{EngineOutput, OverrideRequest, ScreeningService, ScreeningServiceError};
pub use stability::{StabilityAssessment, StabilityRiskEngine};
pub use tracking::{VesselTrackProvider, VesselTrackQuery};
pub use trend::{PredictiveEngine, PredictiveResult};
pub use verification::{score_verification, VerificationResult};

