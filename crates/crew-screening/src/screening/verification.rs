use serde::{Deserialize, Serialize};

use super::domain::{Flag, VerificationFacts};
use super::guardrails::{clamp_unit, round_to};

/// Confidence below this asks for a human look at the sea-service record.
pub const MIN_VERIFICATION_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Verified,
    Partial,
    Mismatch,
    Unverified,
}

impl VerificationStatus {
    /// Unrecognized provider statuses are treated as unverified.
    pub fn from_code(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "verified" | "match" | "matched" => Self::Verified,
            "partial" | "partially_verified" => Self::Partial,
            "mismatch" | "conflict" => Self::Mismatch,
            _ => Self::Unverified,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub status: VerificationStatus,
    pub confidence: f64,
    pub needs_review: bool,
    pub flags: Vec<Flag>,
}

pub fn score_verification(facts: &VerificationFacts) -> VerificationResult {
    let status = VerificationStatus::from_code(&facts.status);
    let confidence = if facts.confidence_score.is_finite() {
        round_to(clamp_unit(facts.confidence_score), 4)
    } else {
        0.0
    };

    let mut flags = Vec::new();
    match status {
        VerificationStatus::Mismatch => flags.push(Flag::warning(
            "verification_mismatch",
            "Vessel tracking contradicts the declared sea service",
        )),
        VerificationStatus::Unverified => flags.push(Flag::warning(
            "verification_unverified",
            "Sea service could not be matched to vessel tracking",
        )),
        VerificationStatus::Verified | VerificationStatus::Partial => {}
    }
    if confidence < MIN_VERIFICATION_CONFIDENCE {
        flags.push(Flag::warning(
            "verification_low_confidence",
            format!("Tracking confidence {confidence:.2}"),
        ));
    }

    VerificationResult {
        status,
        confidence,
        needs_review: !flags.is_empty(),
        flags,
    }
}
