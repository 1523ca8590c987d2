//! Fleet-aware calibration of weights and thresholds.
//!
//! A [`CalibrationConfig`] is a pure function of the fleet identifier and the compiled-in
//! defaults. Fleet profiles are partial overlays: any parameter they leave unset inherits
//! the global default, and every parameter they do set passes through a guardrail first.

mod profiles;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{CompetencyDimension, RiskTier};
use super::guardrails::{
    normalize_weights, Band, BELOW_THRESHOLD_FRACTION_BAND, REVIEW_THRESHOLD_BAND,
    STABILITY_CAP_BAND,
};

pub use profiles::builtin_profile;

/// Vessel-type categories with their own calibration overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FleetType {
    Tanker,
    Bulk,
    Container,
    River,
    Offshore,
    Passenger,
}

impl FleetType {
    pub fn from_key(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "tanker" | "chemical_tanker" | "lng" | "lpg" => Some(Self::Tanker),
            "bulk" | "bulk_carrier" => Some(Self::Bulk),
            "container" | "container_ship" => Some(Self::Container),
            "river" | "inland" => Some(Self::River),
            "offshore" | "psv" | "ahts" => Some(Self::Offshore),
            "passenger" | "cruise" | "ferry" => Some(Self::Passenger),
            _ => None,
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Tanker => "tanker",
            Self::Bulk => "bulk",
            Self::Container => "container",
            Self::River => "river",
            Self::Offshore => "offshore",
            Self::Passenger => "passenger",
        }
    }
}

/// Lower bounds of the medium/high/critical tiers on a score axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierBoundaries {
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl TierBoundaries {
    pub const fn new(medium: f64, high: f64, critical: f64) -> Self {
        Self {
            medium,
            high,
            critical,
        }
    }

    /// Monotonic mapping of a score to its tier. Boundaries are inclusive lower bounds.
    pub fn tier_for(&self, score: f64) -> RiskTier {
        if score >= self.critical {
            RiskTier::Critical
        } else if score >= self.high {
            RiskTier::High
        } else if score >= self.medium {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    /// Strictly ascending and strictly inside `(0, scale)`.
    pub fn is_partition_of(&self, scale: f64) -> bool {
        let inside = |value: f64| value.is_finite() && value > 0.0 && value < scale;
        inside(self.medium)
            && inside(self.high)
            && inside(self.critical)
            && self.medium < self.high
            && self.high < self.critical
    }
}

/// The eight contract-history risk factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    ShortContractRatio,
    CareerGap,
    ContractOverlap,
    RankProgressionAnomaly,
    FrequentSwitching,
    InverseStability,
    VesselDiversity,
    TemporalRecency,
}

impl RiskFactor {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::ShortContractRatio,
            Self::CareerGap,
            Self::ContractOverlap,
            Self::RankProgressionAnomaly,
            Self::FrequentSwitching,
            Self::InverseStability,
            Self::VesselDiversity,
            Self::TemporalRecency,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ShortContractRatio => "Short contract ratio",
            Self::CareerGap => "Career gaps",
            Self::ContractOverlap => "Overlapping contracts",
            Self::RankProgressionAnomaly => "Rank progression anomaly",
            Self::FrequentSwitching => "Frequent employer switching",
            Self::InverseStability => "Low stability index",
            Self::VesselDiversity => "Vessel type diversity",
            Self::TemporalRecency => "Recent short contracts",
        }
    }
}

/// Caps, windows and multipliers for the contract risk scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskParameters {
    pub stability_index_cap: f64,
    pub career_gap_cap_months: f64,
    pub overlap_cap: f64,
    pub switch_cap: f64,
    pub diversity_cap: f64,
    pub recency_cap: f64,
    pub recency_window_months: f64,
    pub decay_window_months: f64,
    pub recent_multiplier: f64,
    pub middle_multiplier: f64,
    pub old_multiplier: f64,
    /// A change of employer after a contract shorter than this counts as a switch.
    pub switch_tenure_months: f64,
    /// Promotions sooner than this after first holding the previous rank are implausible.
    pub min_months_before_promotion: f64,
    pub promotion_window_months: f64,
    pub promotion_credit_multiplier: f64,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            stability_index_cap: 10.0,
            career_gap_cap_months: 24.0,
            overlap_cap: 3.0,
            switch_cap: 4.0,
            diversity_cap: 3.0,
            recency_cap: 1.5,
            recency_window_months: 24.0,
            decay_window_months: 60.0,
            recent_multiplier: 1.5,
            middle_multiplier: 1.0,
            old_multiplier: 0.5,
            switch_tenure_months: 12.0,
            min_months_before_promotion: 6.0,
            promotion_window_months: 12.0,
            promotion_credit_multiplier: 0.5,
        }
    }
}

/// Weak/strong buckets and confidence floors for competency results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompetencyThresholds {
    pub weak_below: f64,
    pub strong_from: f64,
    pub critical_floor: f64,
    pub min_language_confidence: f64,
    pub min_coverage: f64,
}

impl Default for CompetencyThresholds {
    fn default() -> Self {
        Self {
            weak_below: 45.0,
            strong_from: 70.0,
            critical_floor: 25.0,
            min_language_confidence: 0.5,
            min_coverage: 0.6,
        }
    }
}

/// Threshold bundle for the cross-engine contradiction detectors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationThresholds {
    pub expert_depth_min: f64,
    pub unstable_stability_max: f64,
    pub stable_stability_min: f64,
    pub weak_depth_max: f64,
    pub high_risk_min: f64,
    pub high_compliance_min: f64,
    pub low_sea_months_max: f64,
    /// Total risk weight at which the analyzer asks for review instead of a note.
    pub review_weight: f64,
}

impl Default for CorrelationThresholds {
    fn default() -> Self {
        Self {
            expert_depth_min: 70.0,
            unstable_stability_max: 2.0,
            stable_stability_min: 6.0,
            weak_depth_max: 30.0,
            high_risk_min: 0.5,
            high_compliance_min: 90.0,
            low_sea_months_max: 12.0,
            review_weight: 0.5,
        }
    }
}

/// Partial overrides of [`CorrelationThresholds`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationOverrides {
    pub expert_depth_min: Option<f64>,
    pub unstable_stability_max: Option<f64>,
    pub stable_stability_min: Option<f64>,
    pub weak_depth_max: Option<f64>,
    pub high_risk_min: Option<f64>,
    pub high_compliance_min: Option<f64>,
    pub low_sea_months_max: Option<f64>,
}

/// A fleet profile: every `None` inherits the global default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationProfile {
    pub review_threshold: Option<f64>,
    pub below_threshold_fraction: Option<f64>,
    pub dimension_weights: Option<BTreeMap<CompetencyDimension, f64>>,
    pub risk_tiers: Option<TierBoundaries>,
    pub predictive_tiers: Option<TierBoundaries>,
    pub stability_index_cap: Option<f64>,
    #[serde(default)]
    pub correlation: CorrelationOverrides,
}

pub const DEFAULT_REVIEW_THRESHOLD: f64 = 45.0;
pub const DEFAULT_BELOW_THRESHOLD_FRACTION: f64 = 0.34;
pub const DEFAULT_RISK_TIERS: TierBoundaries = TierBoundaries::new(0.25, 0.50, 0.75);
pub const DEFAULT_PREDICTIVE_TIERS: TierBoundaries = TierBoundaries::new(25.0, 50.0, 75.0);

const CORRELATION_DEPTH_BAND: Band = Band::new(0.0, 100.0);
const CORRELATION_STABILITY_BAND: Band = Band::new(0.0, 50.0);
const CORRELATION_RISK_BAND: Band = Band::new(0.05, 0.95);
const CORRELATION_SEA_MONTHS_BAND: Band = Band::new(0.0, 120.0);

pub fn default_dimension_weights() -> BTreeMap<CompetencyDimension, f64> {
    BTreeMap::from([
        (CompetencyDimension::TechnicalPractical, 0.25),
        (CompetencyDimension::SafetyAwareness, 0.25),
        (CompetencyDimension::ProblemSolving, 0.15),
        (CompetencyDimension::Teamwork, 0.15),
        (CompetencyDimension::Communication, 0.10),
        (CompetencyDimension::Leadership, 0.10),
    ])
}

pub fn default_risk_weights() -> BTreeMap<RiskFactor, f64> {
    BTreeMap::from([
        (RiskFactor::ShortContractRatio, 0.20),
        (RiskFactor::CareerGap, 0.15),
        (RiskFactor::ContractOverlap, 0.10),
        (RiskFactor::RankProgressionAnomaly, 0.10),
        (RiskFactor::FrequentSwitching, 0.15),
        (RiskFactor::InverseStability, 0.15),
        (RiskFactor::VesselDiversity, 0.05),
        (RiskFactor::TemporalRecency, 0.10),
    ])
}

/// Concrete, guard-railed parameters for one fleet (or the global default).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationConfig {
    fleet_type: Option<FleetType>,
    review_threshold: f64,
    below_threshold_fraction: f64,
    dimension_weights: BTreeMap<CompetencyDimension, f64>,
    risk_weights: BTreeMap<RiskFactor, f64>,
    risk_tiers: TierBoundaries,
    predictive_tiers: TierBoundaries,
    risk: RiskParameters,
    competency: CompetencyThresholds,
    correlation: CorrelationThresholds,
    adjustments: Vec<String>,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self::resolve_with(None, None)
    }
}

impl CalibrationConfig {
    /// Resolve a nullable fleet key. Unknown keys resolve to the global defaults.
    pub fn resolve(fleet_key: Option<&str>) -> Self {
        let fleet = fleet_key.and_then(FleetType::from_key);
        Self::for_fleet(fleet)
    }

    pub fn for_fleet(fleet: Option<FleetType>) -> Self {
        let profile = fleet.map(builtin_profile);
        Self::resolve_with(fleet, profile.as_ref())
    }

    /// Merge a profile overlay onto the global defaults, clamping every override.
    pub fn resolve_with(fleet: Option<FleetType>, profile: Option<&CalibrationProfile>) -> Self {
        let mut adjustments = Vec::new();
        let empty = CalibrationProfile::default();
        let profile = profile.unwrap_or(&empty);

        let review_threshold = guarded(
            "review_threshold",
            profile.review_threshold,
            DEFAULT_REVIEW_THRESHOLD,
            REVIEW_THRESHOLD_BAND,
            &mut adjustments,
        );
        let below_threshold_fraction = guarded(
            "below_threshold_fraction",
            profile.below_threshold_fraction,
            DEFAULT_BELOW_THRESHOLD_FRACTION,
            BELOW_THRESHOLD_FRACTION_BAND,
            &mut adjustments,
        );

        let mut risk = RiskParameters::default();
        risk.stability_index_cap = guarded(
            "stability_index_cap",
            profile.stability_index_cap,
            risk.stability_index_cap,
            STABILITY_CAP_BAND,
            &mut adjustments,
        );

        let dimension_weights = match &profile.dimension_weights {
            None => default_dimension_weights(),
            Some(overrides) => {
                let mut merged = default_dimension_weights();
                for (dimension, weight) in overrides {
                    merged.insert(*dimension, *weight);
                }
                match normalize_weights(&merged) {
                    Some(normalized) => {
                        if (merged.values().sum::<f64>() - 1.0).abs() > 0.01 {
                            adjustments.push("dimension_weights re-normalized to 1.0".to_string());
                        }
                        normalized
                    }
                    None => {
                        adjustments.push(
                            "dimension_weights had no positive entries; defaults applied"
                                .to_string(),
                        );
                        default_dimension_weights()
                    }
                }
            }
        };

        let risk_tiers = guarded_tiers(
            "risk_tiers",
            profile.risk_tiers,
            DEFAULT_RISK_TIERS,
            1.0,
            &mut adjustments,
        );
        let predictive_tiers = guarded_tiers(
            "predictive_tiers",
            profile.predictive_tiers,
            DEFAULT_PREDICTIVE_TIERS,
            100.0,
            &mut adjustments,
        );

        let correlation = merge_correlation(&profile.correlation, &mut adjustments);

        Self {
            fleet_type: fleet,
            review_threshold,
            below_threshold_fraction,
            dimension_weights,
            risk_weights: default_risk_weights(),
            risk_tiers,
            predictive_tiers,
            risk,
            competency: CompetencyThresholds::default(),
            correlation,
            adjustments,
        }
    }

    /// Replace the risk parameters wholesale, keeping the stability cap inside its band.
    pub fn with_risk_parameters(mut self, mut risk: RiskParameters) -> Self {
        risk.stability_index_cap = STABILITY_CAP_BAND.clamp(risk.stability_index_cap, 10.0);
        self.risk = risk;
        self
    }

    pub fn fleet_type(&self) -> Option<FleetType> {
        self.fleet_type
    }

    pub fn review_threshold(&self) -> f64 {
        self.review_threshold
    }

    pub fn below_threshold_fraction(&self) -> f64 {
        self.below_threshold_fraction
    }

    pub fn dimension_weights(&self) -> &BTreeMap<CompetencyDimension, f64> {
        &self.dimension_weights
    }

    pub fn risk_weights(&self) -> &BTreeMap<RiskFactor, f64> {
        &self.risk_weights
    }

    pub fn risk_weight(&self, factor: RiskFactor) -> f64 {
        self.risk_weights.get(&factor).copied().unwrap_or(0.0)
    }

    pub fn risk_tiers(&self) -> TierBoundaries {
        self.risk_tiers
    }

    pub fn predictive_tiers(&self) -> TierBoundaries {
        self.predictive_tiers
    }

    pub fn risk_parameters(&self) -> &RiskParameters {
        &self.risk
    }

    pub fn competency_thresholds(&self) -> CompetencyThresholds {
        self.competency
    }

    pub fn correlation_thresholds(&self) -> CorrelationThresholds {
        self.correlation
    }

    /// Human-readable record of every override the guardrails changed.
    pub fn adjustments(&self) -> &[String] {
        &self.adjustments
    }
}

fn guarded(
    name: &str,
    value: Option<f64>,
    default: f64,
    band: Band,
    adjustments: &mut Vec<String>,
) -> f64 {
    match value {
        None => default,
        Some(raw) => {
            let clamped = band.clamp(raw, default);
            if clamped != raw {
                adjustments.push(format!(
                    "{name} {raw} clamped to {clamped} (allowed {}..={})",
                    band.min, band.max
                ));
            }
            clamped
        }
    }
}

fn guarded_tiers(
    name: &str,
    value: Option<TierBoundaries>,
    default: TierBoundaries,
    scale: f64,
    adjustments: &mut Vec<String>,
) -> TierBoundaries {
    match value {
        None => default,
        Some(tiers) if tiers.is_partition_of(scale) => tiers,
        Some(_) => {
            adjustments.push(format!(
                "{name} are not an ascending partition of 0..{scale}; defaults applied"
            ));
            default
        }
    }
}

fn merge_correlation(
    overrides: &CorrelationOverrides,
    adjustments: &mut Vec<String>,
) -> CorrelationThresholds {
    let defaults = CorrelationThresholds::default();
    CorrelationThresholds {
        expert_depth_min: guarded(
            "expert_depth_min",
            overrides.expert_depth_min,
            defaults.expert_depth_min,
            CORRELATION_DEPTH_BAND,
            adjustments,
        ),
        unstable_stability_max: guarded(
            "unstable_stability_max",
            overrides.unstable_stability_max,
            defaults.unstable_stability_max,
            CORRELATION_STABILITY_BAND,
            adjustments,
        ),
        stable_stability_min: guarded(
            "stable_stability_min",
            overrides.stable_stability_min,
            defaults.stable_stability_min,
            CORRELATION_STABILITY_BAND,
            adjustments,
        ),
        weak_depth_max: guarded(
            "weak_depth_max",
            overrides.weak_depth_max,
            defaults.weak_depth_max,
            CORRELATION_DEPTH_BAND,
            adjustments,
        ),
        high_risk_min: guarded(
            "high_risk_min",
            overrides.high_risk_min,
            defaults.high_risk_min,
            CORRELATION_RISK_BAND,
            adjustments,
        ),
        high_compliance_min: guarded(
            "high_compliance_min",
            overrides.high_compliance_min,
            defaults.high_compliance_min,
            CORRELATION_DEPTH_BAND,
            adjustments,
        ),
        low_sea_months_max: guarded(
            "low_sea_months_max",
            overrides.low_sea_months_max,
            defaults.low_sea_months_max,
            CORRELATION_SEA_MONTHS_BAND,
            adjustments,
        ),
        review_weight: defaults.review_weight,
    }
}
