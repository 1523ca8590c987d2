use serde::{Deserialize, Serialize};

use super::domain::{ComplianceFacts, Flag};
use super::guardrails::{clamp_percent, round_to};

/// Scores under this are a critical compliance failure.
pub const CRITICAL_COMPLIANCE_FLOOR: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub score: f64,
    pub required_count: u32,
    pub valid_count: u32,
    pub missing: Vec<String>,
    pub expired: Vec<String>,
    pub flags: Vec<Flag>,
    /// One remediation hint per missing or expired certificate.
    pub remediation: Vec<String>,
}

impl ComplianceResult {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.expired.is_empty()
    }
}

/// Valid certificates are those held and not expired.
pub fn score_compliance(facts: &ComplianceFacts) -> ComplianceResult {
    let valid_count = facts
        .held_count
        .saturating_sub(facts.expired.len() as u32)
        .min(facts.required_count);

    let score = if facts.required_count == 0 {
        100.0
    } else {
        round_to(
            clamp_percent(valid_count as f64 / facts.required_count as f64 * 100.0),
            2,
        )
    };

    let mut flags = Vec::new();
    if score < CRITICAL_COMPLIANCE_FLOOR {
        flags.push(Flag::critical(
            "compliance_critical",
            format!(
                "{valid_count} of {} required certificates are valid",
                facts.required_count
            ),
        ));
    }
    if !facts.missing.is_empty() {
        flags.push(Flag::warning(
            "missing_certificates",
            format!("Missing: {}", facts.missing.join(", ")),
        ));
    }
    if !facts.expired.is_empty() {
        flags.push(Flag::warning(
            "expired_certificates",
            format!("Expired: {}", facts.expired.join(", ")),
        ));
    }

    let remediation = facts
        .expired
        .iter()
        .map(|certificate| format!("Renew expired certificate {certificate}"))
        .chain(
            facts
                .missing
                .iter()
                .map(|certificate| format!("Obtain missing certificate {certificate}")),
        )
        .collect();

    ComplianceResult {
        score,
        required_count: facts.required_count,
        valid_count,
        missing: facts.missing.clone(),
        expired: facts.expired.clone(),
        flags,
        remediation,
    }
}
