use serde::{Deserialize, Serialize};

use crate::screening::repository::RiskSnapshot;

pub const ESCALATION_MIN_DELTA: f64 = 0.10;
pub const COMPLIANCE_DRIFT_MIN_DROP: f64 = 10.0;
pub const MISMATCH_MIN_GAP: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendPattern {
    EscalatingInstability,
    ComplianceDrift,
    BehavioralTechnicalMismatch,
}

impl TrendPattern {
    pub const fn code(self) -> &'static str {
        match self {
            Self::EscalatingInstability => "escalating_instability",
            Self::ComplianceDrift => "compliance_drift",
            Self::BehavioralTechnicalMismatch => "behavioral_technical_mismatch",
        }
    }

    pub const fn points(self) -> f64 {
        match self {
            Self::EscalatingInstability => 35.0,
            Self::ComplianceDrift => 30.0,
            Self::BehavioralTechnicalMismatch => 25.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPatternHit {
    pub pattern: TrendPattern,
    pub points: f64,
    pub reason: String,
}

fn hit(pattern: TrendPattern, reason: String) -> TrendPatternHit {
    TrendPatternHit {
        pattern,
        points: pattern.points(),
        reason,
    }
}

/// Majority of steps rising and a total rise of at least [`ESCALATION_MIN_DELTA`].
pub(crate) fn escalating_instability(history: &[RiskSnapshot]) -> Option<TrendPatternHit> {
    let risks: Vec<f64> = history.iter().filter_map(|snapshot| snapshot.risk_score).collect();
    if risks.len() < 2 {
        return None;
    }
    let (first, last) = (risks[0], risks[risks.len() - 1]);

    let steps = risks.len() - 1;
    let rising = risks.windows(2).filter(|pair| pair[1] > pair[0]).count();
    let delta = last - first;

    (rising * 2 > steps && delta >= ESCALATION_MIN_DELTA).then(|| {
        hit(
            TrendPattern::EscalatingInstability,
            format!(
                "Career risk rose in {rising} of {steps} step(s), from {first:.2} to {last:.2}"
            ),
        )
    })
}

pub(crate) fn compliance_drift(history: &[RiskSnapshot]) -> Option<TrendPatternHit> {
    let scores: Vec<f64> = history
        .iter()
        .filter_map(|snapshot| snapshot.compliance_score)
        .collect();
    if scores.len() < 2 {
        return None;
    }
    let (first, last) = (scores[0], scores[scores.len() - 1]);

    (first - last >= COMPLIANCE_DRIFT_MIN_DROP).then(|| {
        hit(
            TrendPattern::ComplianceDrift,
            format!("Compliance fell from {first:.0} to {last:.0}"),
        )
    })
}

/// Checked on the newest snapshot carrying both an interview score and a depth index.
pub(crate) fn behavioral_technical_mismatch(history: &[RiskSnapshot]) -> Option<TrendPatternHit> {
    let (competency, depth) = history.iter().rev().find_map(|snapshot| {
        snapshot
            .competency_score
            .zip(snapshot.technical_depth_index)
    })?;

    let gap = (competency - depth).abs();
    if gap < MISMATCH_MIN_GAP {
        return None;
    }

    let reason = if competency > depth {
        format!(
            "Interview competency {competency:.0} is well above technical depth {depth:.0}"
        )
    } else {
        format!(
            "Technical depth {depth:.0} is well above interview competency {competency:.0}"
        )
    };
    Some(hit(TrendPattern::BehavioralTechnicalMismatch, reason))
}
