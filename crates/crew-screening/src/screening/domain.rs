use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Average month length used when converting day spans into months.
pub const AVG_DAYS_PER_MONTH: f64 = 30.44;

pub(crate) fn days_to_months(days: i64) -> f64 {
    days.max(0) as f64 / AVG_DAYS_PER_MONTH
}

/// Identifier wrapper for screened candidates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateId(pub String);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Closed set of shipboard ranks. Free-text rank codes are normalized at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rank {
    Cadet,
    OrdinarySeaman,
    Oiler,
    Cook,
    AbleSeaman,
    Bosun,
    ThirdOfficer,
    SecondOfficer,
    ChiefOfficer,
    Master,
    ThirdEngineer,
    SecondEngineer,
    ChiefEngineer,
    ElectroTechnicalOfficer,
    Unknown,
}

impl Rank {
    pub fn from_code(raw: &str) -> Self {
        let code: String = raw
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|ch| if ch == ' ' || ch == '-' { '_' } else { ch })
            .collect();

        match code.as_str() {
            "cadet" | "deck_cadet" | "engine_cadet" | "trainee" => Self::Cadet,
            "os" | "ordinary_seaman" | "deckhand" => Self::OrdinarySeaman,
            "oiler" | "wiper" | "motorman" => Self::Oiler,
            "cook" | "chief_cook" | "messman" | "steward" => Self::Cook,
            "ab" | "able_seaman" | "able_bodied_seaman" => Self::AbleSeaman,
            "bosun" | "boatswain" => Self::Bosun,
            "3/o" | "3o" | "third_officer" | "3rd_officer" => Self::ThirdOfficer,
            "2/o" | "2o" | "second_officer" | "2nd_officer" => Self::SecondOfficer,
            "c/o" | "co" | "chief_officer" | "chief_mate" => Self::ChiefOfficer,
            "master" | "captain" => Self::Master,
            "3/e" | "3e" | "third_engineer" | "3rd_engineer" => Self::ThirdEngineer,
            "2/e" | "2e" | "second_engineer" | "2nd_engineer" => Self::SecondEngineer,
            "c/e" | "ce" | "chief_engineer" => Self::ChiefEngineer,
            "eto" | "electrician" | "electro_technical_officer" => Self::ElectroTechnicalOfficer,
            _ => Self::Unknown,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Cadet => "Cadet",
            Self::OrdinarySeaman => "Ordinary Seaman",
            Self::Oiler => "Oiler",
            Self::Cook => "Cook",
            Self::AbleSeaman => "Able Seaman",
            Self::Bosun => "Bosun",
            Self::ThirdOfficer => "Third Officer",
            Self::SecondOfficer => "Second Officer",
            Self::ChiefOfficer => "Chief Officer",
            Self::Master => "Master",
            Self::ThirdEngineer => "Third Engineer",
            Self::SecondEngineer => "Second Engineer",
            Self::ChiefEngineer => "Chief Engineer",
            Self::ElectroTechnicalOfficer => "Electro-Technical Officer",
            Self::Unknown => "Unclassified rank",
        }
    }

    /// Relative seniority on the deck/engine ladders; `None` when the rank is unclassified.
    pub const fn seniority(self) -> Option<u8> {
        match self {
            Self::Cadet => Some(0),
            Self::OrdinarySeaman | Self::Oiler | Self::Cook => Some(1),
            Self::AbleSeaman => Some(2),
            Self::Bosun => Some(3),
            Self::ThirdOfficer | Self::ThirdEngineer | Self::ElectroTechnicalOfficer => Some(4),
            Self::SecondOfficer | Self::SecondEngineer => Some(5),
            Self::ChiefOfficer => Some(6),
            Self::Master | Self::ChiefEngineer => Some(7),
            Self::Unknown => None,
        }
    }

    /// Contracts shorter than this many months count as "short" for the rank.
    pub const fn short_contract_months(self) -> f64 {
        match self {
            Self::Cadet => 3.0,
            Self::OrdinarySeaman | Self::Oiler | Self::Cook | Self::AbleSeaman => 4.0,
            Self::Bosun => 5.0,
            Self::ThirdOfficer
            | Self::SecondOfficer
            | Self::ThirdEngineer
            | Self::SecondEngineer
            | Self::ElectroTechnicalOfficer
            | Self::Unknown => 6.0,
            Self::ChiefOfficer => 8.0,
            Self::Master | Self::ChiefEngineer => 9.0,
        }
    }

    /// Senior officers whose interviews may earn a technical-depth uplift.
    pub const fn technical_depth_eligible(self) -> bool {
        matches!(
            self,
            Self::SecondOfficer
                | Self::ChiefOfficer
                | Self::Master
                | Self::SecondEngineer
                | Self::ChiefEngineer
        )
    }
}

/// One employment contract as reported by the crewing system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRecord {
    pub vessel_type: String,
    pub rank_code: String,
    pub company_name: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl ContractRecord {
    pub fn rank(&self) -> Rank {
        Rank::from_code(&self.rank_code)
    }

    /// End date with open-ended contracts running until `as_of`.
    pub fn effective_end(&self, as_of: NaiveDate) -> NaiveDate {
        self.end_date.unwrap_or(as_of)
    }

    pub fn duration_days(&self, as_of: NaiveDate) -> i64 {
        (self.effective_end(as_of) - self.start_date).num_days().max(0)
    }
}

/// Interview dimensions scored by the competency engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetencyDimension {
    TechnicalPractical,
    SafetyAwareness,
    ProblemSolving,
    Teamwork,
    Communication,
    Leadership,
}

impl CompetencyDimension {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::TechnicalPractical,
            Self::SafetyAwareness,
            Self::ProblemSolving,
            Self::Teamwork,
            Self::Communication,
            Self::Leadership,
        ]
    }

    pub fn from_code(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "technical_practical" | "technical" => Some(Self::TechnicalPractical),
            "safety_awareness" | "safety" => Some(Self::SafetyAwareness),
            "problem_solving" => Some(Self::ProblemSolving),
            "teamwork" | "team_work" => Some(Self::Teamwork),
            "communication" => Some(Self::Communication),
            "leadership" => Some(Self::Leadership),
            _ => None,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::TechnicalPractical => "technical_practical",
            Self::SafetyAwareness => "safety_awareness",
            Self::ProblemSolving => "problem_solving",
            Self::Teamwork => "teamwork",
            Self::Communication => "communication",
            Self::Leadership => "leadership",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::TechnicalPractical => "Technical & practical",
            Self::SafetyAwareness => "Safety awareness",
            Self::ProblemSolving => "Problem solving",
            Self::Teamwork => "Teamwork",
            Self::Communication => "Communication",
            Self::Leadership => "Leadership",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewAnswer {
    pub dimension_code: String,
    pub answer_text: String,
}

/// A completed interview handed over by the interview collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewSession {
    pub interview_id: String,
    pub role_code: String,
    #[serde(default)]
    pub locale: Option<String>,
    pub completed_at: DateTime<Utc>,
    pub answers: Vec<InterviewAnswer>,
}

/// Certification facts from the compliance collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceFacts {
    pub required_count: u32,
    pub held_count: u32,
    #[serde(default)]
    pub missing: Vec<String>,
    #[serde(default)]
    pub expired: Vec<String>,
}

/// Vessel-tracking verification outcome. Opaque apart from the confidence number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationFacts {
    pub status: String,
    pub confidence_score: f64,
}

/// Everything the scoring core reads about one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateDossier {
    pub candidate_id: CandidateId,
    /// Kept for collaborators only; never rendered into scoring output.
    pub full_name: String,
    #[serde(default)]
    pub fleet_type: Option<String>,
    pub rank_code: String,
    #[serde(default)]
    pub contracts: Vec<ContractRecord>,
    #[serde(default)]
    pub interview: Option<InterviewSession>,
    #[serde(default)]
    pub compliance: Option<ComplianceFacts>,
    #[serde(default)]
    pub verification: Option<VerificationFacts>,
}

impl CandidateDossier {
    pub fn rank(&self) -> Rank {
        Rank::from_code(&self.rank_code)
    }
}

/// Scoring engines whose results are cached on the trust profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    Stability,
    Competency,
    Compliance,
    Verification,
    Correlation,
    Predictive,
}

impl EngineKind {
    /// Run order for a full recompute: scorers first, then correlation and trend.
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Stability,
            Self::Competency,
            Self::Compliance,
            Self::Verification,
            Self::Correlation,
            Self::Predictive,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Stability => "stability",
            Self::Competency => "competency",
            Self::Compliance => "compliance",
            Self::Verification => "verification",
            Self::Correlation => "correlation",
            Self::Predictive => "predictive",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Stability => "Contract stability",
            Self::Competency => "Interview competency",
            Self::Compliance => "Certification compliance",
            Self::Verification => "Vessel verification",
            Self::Correlation => "Cross-engine correlation",
            Self::Predictive => "Predictive risk",
        }
    }

    pub fn from_key(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "stability" | "risk" => Some(Self::Stability),
            "competency" => Some(Self::Competency),
            "compliance" => Some(Self::Compliance),
            "verification" | "ais" => Some(Self::Verification),
            "correlation" => Some(Self::Correlation),
            "predictive" | "trend" => Some(Self::Predictive),
            _ => None,
        }
    }
}

/// Ordered risk bucket. Ordering follows severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskTier {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Critical,
}

/// Severity-tagged finding emitted by a scorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    pub code: String,
    pub severity: Severity,
    pub message: String,
}

impl Flag {
    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn critical(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            severity: Severity::Critical,
            message: message.into(),
        }
    }
}

/// Final recommendation. Ordering follows severity so the fusion step can take the max.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Review,
    Reject,
}

impl Decision {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Review => "review",
            Self::Reject => "reject",
        }
    }
}
