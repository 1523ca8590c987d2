use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::screening::domain::{ContractRecord, Rank};

/// Per-contract audit row for the overlap correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractOverlapDetail {
    /// Position of the contract in the caller's input.
    pub input_index: usize,
    pub vessel_type: String,
    pub rank: Rank,
    pub company_name: String,
    pub start_date: NaiveDate,
    pub effective_end: NaiveDate,
    pub open_ended: bool,
    pub raw_days: i64,
    pub overlap_days: i64,
    pub calculated_days: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct OverlapCorrection {
    /// Chronological order (start date, then end date, then input position).
    pub details: Vec<ContractOverlapDetail>,
    pub raw_days_total: i64,
    pub merged_days_total: i64,
    pub gap_days_total: i64,
    pub overlap_count: usize,
}

/// Sort by start date and subtract the part of each span already covered by earlier ones.
///
/// Earlier contracts all start on or before the current one, so their union intersected
/// with `[start, ∞)` is the contiguous range `[start, covered_until]`.
pub(crate) fn correct_overlaps(contracts: &[ContractRecord], as_of: NaiveDate) -> OverlapCorrection {
    let mut order: Vec<usize> = (0..contracts.len()).collect();
    order.sort_by(|left, right| {
        let a = &contracts[*left];
        let b = &contracts[*right];
        a.start_date
            .cmp(&b.start_date)
            .then_with(|| a.effective_end(as_of).cmp(&b.effective_end(as_of)))
            .then_with(|| left.cmp(right))
    });

    let mut details = Vec::with_capacity(contracts.len());
    let mut covered_until: Option<NaiveDate> = None;
    let mut raw_days_total = 0;
    let mut merged_days_total = 0;
    let mut gap_days_total = 0;
    let mut overlap_count = 0;

    for index in order {
        let contract = &contracts[index];
        let start = contract.start_date;
        let end = contract.effective_end(as_of).max(start);
        let raw_days = (end - start).num_days();

        let overlap_days = match covered_until {
            Some(covered) if covered > start => (end.min(covered) - start).num_days(),
            Some(covered) => {
                gap_days_total += (start - covered).num_days();
                0
            }
            None => 0,
        };

        if overlap_days > 0 {
            overlap_count += 1;
        }

        let calculated_days = raw_days - overlap_days;
        raw_days_total += raw_days;
        merged_days_total += calculated_days;
        covered_until = Some(covered_until.map_or(end, |covered| covered.max(end)));

        details.push(ContractOverlapDetail {
            input_index: index,
            vessel_type: contract.vessel_type.clone(),
            rank: contract.rank(),
            company_name: contract.company_name.clone(),
            start_date: start,
            effective_end: end,
            open_ended: contract.end_date.is_none(),
            raw_days,
            overlap_days,
            calculated_days,
        });
    }

    OverlapCorrection {
        details,
        raw_days_total,
        merged_days_total,
        gap_days_total,
        overlap_count,
    }
}
