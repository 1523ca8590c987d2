use serde::{Deserialize, Serialize};

use super::lexicon::{count_hits, DEPTH_CATEGORIES};
use crate::screening::guardrails::round_to;

/// Minimum evidence before any depth bonus is considered.
pub const MIN_PRIMARY_HITS: usize = 3;
pub const MIN_CATEGORIES: usize = 2;
/// Maximum lift of the overall score attributable to depth evidence.
pub const MAX_TOTAL_DELTA: f64 = 15.0;

const PRIMARY_POINTS: f64 = 10.0;
const SECONDARY_POINTS: f64 = 4.0;
const CATEGORY_POINTS: f64 = 8.0;
const BONUS_RATE: f64 = 0.25;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalDepthDetail {
    pub depth_index: f64,
    pub primary_hits: usize,
    pub secondary_hits: usize,
    pub categories: Vec<String>,
    pub floor_met: bool,
    /// Ceiling the technical dimension may be lifted to; `None` below the first tier.
    pub cap: Option<f64>,
    pub bonus_points: f64,
}

/// Tiered ceiling for the technical dimension.
pub fn tier_cap(depth_index: f64) -> Option<f64> {
    if depth_index >= 75.0 {
        Some(85.0)
    } else if depth_index >= 60.0 {
        Some(75.0)
    } else if depth_index >= 40.0 {
        Some(60.0)
    } else {
        None
    }
}

pub(crate) fn measure(folded: &str) -> TechnicalDepthDetail {
    let mut primary_hits = 0;
    let mut secondary_hits = 0;
    let mut categories = Vec::new();

    for category in DEPTH_CATEGORIES {
        let (primary_single, primary_phrase) = count_hits(folded, category.primary.iter().copied());
        let (secondary_single, secondary_phrase) =
            count_hits(folded, category.secondary.iter().copied());
        let primary = primary_single + primary_phrase;
        let secondary = secondary_single + secondary_phrase;

        primary_hits += primary;
        secondary_hits += secondary;
        if primary + secondary > 0 {
            categories.push(category.name.to_string());
        }
    }

    let depth_index = (primary_hits as f64 * PRIMARY_POINTS
        + secondary_hits as f64 * SECONDARY_POINTS
        + categories.len() as f64 * CATEGORY_POINTS)
        .min(100.0);
    let floor_met = primary_hits >= MIN_PRIMARY_HITS && categories.len() >= MIN_CATEGORIES;
    let cap = if floor_met { tier_cap(depth_index) } else { None };
    let bonus_points = if cap.is_some() {
        round_to(depth_index * BONUS_RATE, 2)
    } else {
        0.0
    };

    TechnicalDepthDetail {
        depth_index: round_to(depth_index, 2),
        primary_hits,
        secondary_hits,
        categories,
        floor_met,
        cap,
        bonus_points,
    }
}

/// Lift the technical score towards the tier cap. Scores already above it are left alone.
pub(crate) fn lifted_score(technical: f64, detail: &TechnicalDepthDetail) -> f64 {
    match detail.cap {
        Some(cap) if technical < cap => (technical + detail.bonus_points).min(cap),
        _ => technical,
    }
}
