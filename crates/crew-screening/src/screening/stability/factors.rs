use chrono::NaiveDate;

use super::overlap::ContractOverlapDetail;
use crate::screening::calibration::RiskParameters;
use crate::screening::domain::{days_to_months, Rank};

/// Raw factor inputs pulled from the chronologically ordered contracts.
#[derive(Debug, Clone, Default)]
pub(crate) struct HistorySignals {
    pub short_contracts: usize,
    pub employer_changes: usize,
    pub frequent_switches: usize,
    pub distinct_vessel_types: usize,
    pub recency_weighted_short: f64,
    pub rank_anomalies: Vec<String>,
    pub last_promotion: Option<NaiveDate>,
}

fn normalized_key(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

/// An ongoing contract is never classified as short; it has not ended yet.
fn is_short(detail: &ContractOverlapDetail) -> bool {
    !detail.open_ended && days_to_months(detail.raw_days) < detail.rank.short_contract_months()
}

pub(crate) fn collect_signals(
    details: &[ContractOverlapDetail],
    params: &RiskParameters,
    as_of: NaiveDate,
) -> HistorySignals {
    let mut signals = HistorySignals::default();

    let mut vessel_types: Vec<String> = details
        .iter()
        .map(|detail| normalized_key(&detail.vessel_type))
        .filter(|vessel| !vessel.is_empty())
        .collect();
    vessel_types.sort();
    vessel_types.dedup();
    signals.distinct_vessel_types = vessel_types.len();

    for detail in details.iter().filter(|detail| is_short(detail)) {
        signals.short_contracts += 1;
        let age_months = days_to_months((as_of - detail.effective_end).num_days());
        let multiplier = if age_months <= params.recency_window_months {
            params.recent_multiplier
        } else if age_months <= params.decay_window_months {
            params.middle_multiplier
        } else {
            params.old_multiplier
        };
        signals.recency_weighted_short += multiplier;
    }

    for pair in details.windows(2) {
        let (previous, next) = (&pair[0], &pair[1]);
        if normalized_key(&previous.company_name) != normalized_key(&next.company_name) {
            signals.employer_changes += 1;
            if days_to_months(previous.raw_days) < params.switch_tenure_months {
                signals.frequent_switches += 1;
            }
        }
    }

    scan_rank_progression(details, params, &mut signals);
    signals
}

/// Promotions are plausible when the previous rank was held long enough and the jump skips
/// at most two rungs (cadets may step straight into a junior officer berth).
fn scan_rank_progression(
    details: &[ContractOverlapDetail],
    params: &RiskParameters,
    signals: &mut HistorySignals,
) {
    let mut current: Option<(u8, Rank, NaiveDate)> = None;

    for detail in details {
        let Some(level) = detail.rank.seniority() else {
            continue;
        };

        let state = current;
        match state {
            None => current = Some((level, detail.rank, detail.start_date)),
            Some((previous_level, previous_rank, held_since)) if level > previous_level => {
                let months_held = days_to_months((detail.start_date - held_since).num_days());
                let max_jump = if previous_rank == Rank::Cadet { 4 } else { 2 };

                if months_held < params.min_months_before_promotion {
                    signals.rank_anomalies.push(format!(
                        "{} to {} after {:.1} months",
                        previous_rank.label(),
                        detail.rank.label(),
                        months_held
                    ));
                } else if level - previous_level > max_jump {
                    signals.rank_anomalies.push(format!(
                        "{} to {} skips {} ranks",
                        previous_rank.label(),
                        detail.rank.label(),
                        level - previous_level - 1
                    ));
                }

                signals.last_promotion = Some(detail.start_date);
                current = Some((level, detail.rank, detail.start_date));
            }
            Some((previous_level, _, _)) if level < previous_level => {
                current = Some((level, detail.rank, detail.start_date));
            }
            Some(_) => {}
        }
    }
}
