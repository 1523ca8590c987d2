//! Contract stability index and eight-factor career risk score.

mod factors;
mod overlap;

pub use overlap::ContractOverlapDetail;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::calibration::{CalibrationConfig, RiskFactor};
use super::domain::{days_to_months, ContractRecord, RiskTier};
use super::guardrails::{clamp_unit, mean_and_stddev, normalize_against_cap, round_to};
use factors::{collect_signals, HistorySignals};
use overlap::correct_overlaps;

/// Standard deviations below this are treated as uniform tenure.
const UNIFORM_STDDEV_EPSILON: f64 = 1e-6;
/// Inverse-stability input used when fewer than two contracts exist.
const NEUTRAL_INVERSE_STABILITY: f64 = 0.5;

/// One weighted factor, kept for explainability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactorBreakdown {
    pub factor: RiskFactor,
    pub label: String,
    pub raw: f64,
    pub cap: f64,
    pub normalized: f64,
    pub weight: f64,
    pub contribution: f64,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityAssessment {
    pub as_of: NaiveDate,
    pub contract_count: usize,
    /// `None` with fewer than two contracts.
    pub stability_index: Option<f64>,
    pub mean_duration_months: f64,
    pub risk_score: f64,
    pub risk_tier: RiskTier,
    pub factors: Vec<RiskFactorBreakdown>,
    pub overlap_detail: Vec<ContractOverlapDetail>,
    pub raw_days_total: i64,
    pub merged_days_total: i64,
    pub total_sea_months: f64,
    pub short_contract_count: usize,
    pub employer_changes: usize,
    pub frequent_switches: usize,
    pub rank_anomalies: Vec<String>,
    pub last_promotion: Option<NaiveDate>,
    pub promotion_window_applied: bool,
}

impl StabilityAssessment {
    /// Factor with the largest positive contribution.
    pub fn dominant_factor(&self) -> Option<&RiskFactorBreakdown> {
        self.factors
            .iter()
            .filter(|factor| factor.contribution > 0.0)
            .max_by(|a, b| a.contribution.total_cmp(&b.contribution))
    }

    pub fn factor(&self, factor: RiskFactor) -> Option<&RiskFactorBreakdown> {
        self.factors.iter().find(|entry| entry.factor == factor)
    }
}

/// Stateless scorer for contract histories.
pub struct StabilityRiskEngine {
    calibration: CalibrationConfig,
}

impl StabilityRiskEngine {
    pub fn new(calibration: CalibrationConfig) -> Self {
        Self { calibration }
    }

    pub fn calibration(&self) -> &CalibrationConfig {
        &self.calibration
    }

    /// Score a contract history. `None` only when there are no contracts at all.
    pub fn assess(&self, contracts: &[ContractRecord], as_of: NaiveDate) -> Option<StabilityAssessment> {
        if contracts.is_empty() {
            return None;
        }

        let params = self.calibration.risk_parameters();
        let correction = correct_overlaps(contracts, as_of);
        let durations: Vec<f64> = correction
            .details
            .iter()
            .map(|detail| days_to_months(detail.raw_days))
            .collect();

        let (mean_duration_months, stddev) = mean_and_stddev(&durations).unwrap_or((0.0, 0.0));
        let stability_index = if durations.len() < 2 {
            None
        } else if stddev < UNIFORM_STDDEV_EPSILON {
            Some(params.stability_index_cap)
        } else {
            Some(round_to(
                (mean_duration_months / stddev).min(params.stability_index_cap),
                4,
            ))
        };

        let signals = collect_signals(&correction.details, params, as_of);
        let promotion_window_applied = signals.last_promotion.is_some_and(|promoted| {
            promoted <= as_of
                && days_to_months((as_of - promoted).num_days()) <= params.promotion_window_months
        });

        let factors = self.weigh_factors(
            contracts.len(),
            stability_index,
            correction.gap_days_total,
            correction.overlap_count,
            &signals,
            promotion_window_applied,
        );

        let risk_score = round_to(
            clamp_unit(factors.iter().map(|factor| factor.contribution).sum()),
            4,
        );
        let risk_tier = self.calibration.risk_tiers().tier_for(risk_score);

        Some(StabilityAssessment {
            as_of,
            contract_count: contracts.len(),
            stability_index,
            mean_duration_months: round_to(mean_duration_months, 2),
            risk_score,
            risk_tier,
            factors,
            raw_days_total: correction.raw_days_total,
            merged_days_total: correction.merged_days_total,
            total_sea_months: round_to(days_to_months(correction.merged_days_total), 2),
            overlap_detail: correction.details,
            short_contract_count: signals.short_contracts,
            employer_changes: signals.employer_changes,
            frequent_switches: signals.frequent_switches,
            rank_anomalies: signals.rank_anomalies,
            last_promotion: signals.last_promotion,
            promotion_window_applied,
        })
    }

    fn weigh_factors(
        &self,
        contract_count: usize,
        stability_index: Option<f64>,
        gap_days: i64,
        overlap_count: usize,
        signals: &HistorySignals,
        promotion_window_applied: bool,
    ) -> Vec<RiskFactorBreakdown> {
        let params = self.calibration.risk_parameters();
        let count = contract_count.max(1) as f64;
        let promotion_credit = if promotion_window_applied {
            params.promotion_credit_multiplier
        } else {
            1.0
        };

        RiskFactor::ordered()
            .into_iter()
            .map(|factor| {
                let (raw, cap, notes) = match factor {
                    RiskFactor::ShortContractRatio => (
                        signals.short_contracts as f64 / count,
                        1.0,
                        format!(
                            "{} of {} contracts below the rank threshold",
                            signals.short_contracts, contract_count
                        ),
                    ),
                    RiskFactor::CareerGap => {
                        let months = days_to_months(gap_days);
                        (
                            months,
                            params.career_gap_cap_months,
                            format!("{months:.1} months between contracts"),
                        )
                    }
                    RiskFactor::ContractOverlap => (
                        overlap_count as f64,
                        params.overlap_cap,
                        format!("{overlap_count} overlapping contract(s)"),
                    ),
                    RiskFactor::RankProgressionAnomaly => (
                        if signals.rank_anomalies.is_empty() { 0.0 } else { 1.0 },
                        1.0,
                        if signals.rank_anomalies.is_empty() {
                            "rank progression plausible".to_string()
                        } else {
                            signals.rank_anomalies.join("; ")
                        },
                    ),
                    RiskFactor::FrequentSwitching => (
                        signals.frequent_switches as f64,
                        params.switch_cap,
                        format!(
                            "{} employer change(s) after short tenure",
                            signals.frequent_switches
                        ),
                    ),
                    RiskFactor::InverseStability => match stability_index {
                        Some(index) => (
                            clamp_unit(1.0 - index / params.stability_index_cap),
                            1.0,
                            format!("stability index {index:.2}"),
                        ),
                        None => (
                            NEUTRAL_INVERSE_STABILITY,
                            1.0,
                            "stability index unavailable with a single contract".to_string(),
                        ),
                    },
                    RiskFactor::VesselDiversity => {
                        let extra = signals.distinct_vessel_types.saturating_sub(1) as f64;
                        (
                            extra,
                            params.diversity_cap,
                            format!("{} vessel type(s)", signals.distinct_vessel_types),
                        )
                    }
                    RiskFactor::TemporalRecency => (
                        signals.recency_weighted_short / count,
                        params.recency_cap,
                        "short contracts weighted by recency".to_string(),
                    ),
                };

                let weight = self.calibration.risk_weight(factor);
                let normalized = normalize_against_cap(raw, cap);
                let mut contribution = normalized * weight;
                let mut notes = notes;

                match factor {
                    RiskFactor::VesselDiversity => contribution = -contribution,
                    RiskFactor::ShortContractRatio | RiskFactor::FrequentSwitching
                        if promotion_window_applied =>
                    {
                        contribution *= promotion_credit;
                        notes.push_str(" (recent promotion credit applied)");
                    }
                    _ => {}
                }

                RiskFactorBreakdown {
                    factor,
                    label: factor.label().to_string(),
                    raw: round_to(raw, 4),
                    cap,
                    normalized: round_to(normalized, 4),
                    weight,
                    contribution: round_to(contribution, 6),
                    notes,
                }
            })
            .collect()
    }
}
