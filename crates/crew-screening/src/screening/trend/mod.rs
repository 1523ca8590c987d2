//! Risk trend detection and the blended predictive risk index.

mod patterns;

pub use patterns::{
    TrendPattern, TrendPatternHit, COMPLIANCE_DRIFT_MIN_DROP, ESCALATION_MIN_DELTA,
    MISMATCH_MIN_GAP,
};

use serde::{Deserialize, Serialize};

use super::calibration::CalibrationConfig;
use super::domain::RiskTier;
use super::guardrails::{clamp_percent, clamp_unit, round_to};
use super::repository::RiskSnapshot;

pub const RISK_MIX: f64 = 0.5;
pub const TREND_MIX: f64 = 0.3;
pub const CORRELATION_MIX: f64 = 0.2;
pub const MAX_TREND_SCORE: f64 = 100.0;
/// Net risk movement treated as a direction change when no pattern fires.
const DIRECTION_EPSILON: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Stable,
    Deteriorating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyImpact {
    None,
    Review,
    /// A human may confirm a rejection; the engine never rejects on its own.
    ConfirmRejectEligible,
}

impl PolicyImpact {
    pub const fn for_tier(tier: RiskTier) -> Self {
        match tier {
            RiskTier::Low | RiskTier::Medium => Self::None,
            RiskTier::High => Self::Review,
            RiskTier::Critical => Self::ConfirmRejectEligible,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub snapshot_count: usize,
    pub trend_score: f64,
    pub direction: TrendDirection,
    pub patterns: Vec<TrendPatternHit>,
}

impl TrendAnalysis {
    fn insufficient(snapshot_count: usize) -> Self {
        Self {
            snapshot_count,
            trend_score: 0.0,
            direction: TrendDirection::Stable,
            patterns: Vec::new(),
        }
    }
}

/// Current engine outputs feeding the blend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentSignals {
    pub risk_score: Option<f64>,
    pub correlation_weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictiveComponents {
    pub risk_points: f64,
    pub trend_points: f64,
    pub correlation_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictiveResult {
    pub predictive_index: f64,
    pub tier: RiskTier,
    pub policy_impact: PolicyImpact,
    pub trend: TrendAnalysis,
    pub components: PredictiveComponents,
    pub reasons: Vec<String>,
}

/// Pattern scan over stored snapshots, oldest first.
pub fn analyze_trend(history: &[RiskSnapshot]) -> TrendAnalysis {
    if history.len() < 2 {
        return TrendAnalysis::insufficient(history.len());
    }

    let patterns: Vec<TrendPatternHit> = [
        patterns::escalating_instability(history),
        patterns::compliance_drift(history),
        patterns::behavioral_technical_mismatch(history),
    ]
    .into_iter()
    .flatten()
    .collect();

    let trend_score = patterns
        .iter()
        .map(|hit| hit.points)
        .sum::<f64>()
        .min(MAX_TREND_SCORE);

    let risks: Vec<f64> = history.iter().filter_map(|snapshot| snapshot.risk_score).collect();
    let net_risk = match (risks.first(), risks.last()) {
        (Some(first), Some(last)) => last - first,
        _ => 0.0,
    };

    let direction = if !patterns.is_empty() || net_risk > DIRECTION_EPSILON {
        TrendDirection::Deteriorating
    } else if net_risk < -DIRECTION_EPSILON {
        TrendDirection::Improving
    } else {
        TrendDirection::Stable
    };

    TrendAnalysis {
        snapshot_count: history.len(),
        trend_score,
        direction,
        patterns,
    }
}

pub struct PredictiveEngine {
    calibration: CalibrationConfig,
}

impl PredictiveEngine {
    pub fn new(calibration: CalibrationConfig) -> Self {
        Self { calibration }
    }

    /// Blend current risk, the trend over `history` and correlation weight into one index.
    pub fn evaluate(&self, history: &[RiskSnapshot], current: &CurrentSignals) -> PredictiveResult {
        let trend = analyze_trend(history);

        let risk = current.risk_score.map(clamp_unit);
        let components = PredictiveComponents {
            risk_points: round_to(RISK_MIX * risk.unwrap_or(0.0) * 100.0, 2),
            trend_points: round_to(TREND_MIX * trend.trend_score, 2),
            correlation_points: round_to(
                CORRELATION_MIX * clamp_unit(current.correlation_weight) * 100.0,
                2,
            ),
        };

        let predictive_index = round_to(
            clamp_percent(
                components.risk_points + components.trend_points + components.correlation_points,
            ),
            2,
        );
        let tier = self.calibration.predictive_tiers().tier_for(predictive_index);
        let policy_impact = PolicyImpact::for_tier(tier);

        let mut reasons = Vec::with_capacity(4 + trend.patterns.len());
        reasons.push(match risk {
            Some(score) => format!(
                "Career risk {score:.2} contributes {:.1} points",
                components.risk_points
            ),
            None => "No contract history risk available; 0 points".to_string(),
        });
        if trend.snapshot_count < 2 {
            reasons.push(format!(
                "Trend stable: {} prior snapshot(s) is not enough history",
                trend.snapshot_count
            ));
        } else {
            reasons.push(format!(
                "Trend score {:.0} over {} snapshots contributes {:.1} points",
                trend.trend_score, trend.snapshot_count, components.trend_points
            ));
            reasons.extend(trend.patterns.iter().map(|hit| hit.reason.clone()));
        }
        reasons.push(format!(
            "Correlation weight {:.2} contributes {:.1} points",
            current.correlation_weight, components.correlation_points
        ));
        reasons.push(format!(
            "Predictive index {predictive_index:.1} is {} risk",
            tier.label()
        ));

        PredictiveResult {
            predictive_index,
            tier,
            policy_impact,
            trend,
            components,
            reasons,
        }
    }
}
