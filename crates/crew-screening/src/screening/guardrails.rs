//! Clamp and normalization helpers shared by every engine.
//!
//! All bounded arithmetic in the scoring core goes through these functions so the bounds
//! are declared in one place and can be tested without running an engine.

use std::collections::BTreeMap;

/// Inclusive numeric band used to guard calibrated parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Clamp into the band. Non-finite input falls back to `fallback` (itself clamped).
    pub fn clamp(self, value: f64, fallback: f64) -> f64 {
        let candidate = if value.is_finite() { value } else { fallback };
        candidate.clamp(self.min, self.max)
    }

    pub fn contains(self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Review threshold on the 0–100 competency axis.
pub const REVIEW_THRESHOLD_BAND: Band = Band::new(20.0, 80.0);
/// Share of dimensions allowed under the review threshold before review is triggered.
pub const BELOW_THRESHOLD_FRACTION_BAND: Band = Band::new(0.1, 0.8);
/// Single weight before re-normalization.
pub const WEIGHT_BAND: Band = Band::new(0.0, 1.0);
/// Stability index cap.
pub const STABILITY_CAP_BAND: Band = Band::new(2.0, 50.0);

/// [0, 1]; NaN maps to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// [0, 100]; NaN maps to 0.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// `raw / cap` clamped into [0, 1]. A non-positive cap yields 0.
pub fn normalize_against_cap(raw: f64, cap: f64) -> f64 {
    if cap <= 0.0 || !cap.is_finite() {
        return 0.0;
    }
    clamp_unit(raw / cap)
}

/// Round half away from zero to `places` decimals so persisted scores stay stable.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Clamp each weight into [`WEIGHT_BAND`] and rescale so the vector sums to 1.0.
///
/// Returns `None` when nothing positive survives clamping; callers fall back to defaults.
pub fn normalize_weights<K: Ord + Clone>(weights: &BTreeMap<K, f64>) -> Option<BTreeMap<K, f64>> {
    let clamped: BTreeMap<K, f64> = weights
        .iter()
        .map(|(key, weight)| (key.clone(), WEIGHT_BAND.clamp(*weight, 0.0)))
        .collect();

    let total: f64 = clamped.values().sum();
    if total <= f64::EPSILON {
        return None;
    }

    Some(
        clamped
            .into_iter()
            .map(|(key, weight)| (key, weight / total))
            .collect(),
    )
}

/// True when the weights sum to 1.0 within the published tolerance.
pub fn weights_balanced<'a>(weights: impl IntoIterator<Item = &'a f64>) -> bool {
    let total: f64 = weights.into_iter().sum();
    (total - 1.0).abs() <= 0.01
}

/// Population mean and standard deviation. `None` for an empty slice.
pub fn mean_and_stddev(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let count = values.len() as f64;
    let mean = values.iter().sum::<f64>() / count;
    let variance = values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / count;
    Some((mean, variance.sqrt()))
}
