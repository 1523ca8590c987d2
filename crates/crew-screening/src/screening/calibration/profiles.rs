use std::collections::BTreeMap;

use super::{CalibrationProfile, CorrelationOverrides, FleetType, TierBoundaries};
use crate::screening::domain::CompetencyDimension;

/// Compiled-in overlay for each fleet category.
pub fn builtin_profile(fleet: FleetType) -> CalibrationProfile {
    match fleet {
        FleetType::Tanker => CalibrationProfile {
            review_threshold: Some(50.0),
            dimension_weights: Some(BTreeMap::from([
                (CompetencyDimension::TechnicalPractical, 0.25),
                (CompetencyDimension::SafetyAwareness, 0.35),
                (CompetencyDimension::ProblemSolving, 0.15),
                (CompetencyDimension::Teamwork, 0.10),
                (CompetencyDimension::Communication, 0.10),
                (CompetencyDimension::Leadership, 0.05),
            ])),
            risk_tiers: Some(TierBoundaries::new(0.20, 0.45, 0.70)),
            correlation: CorrelationOverrides {
                high_compliance_min: Some(95.0),
                ..CorrelationOverrides::default()
            },
            ..CalibrationProfile::default()
        },
        FleetType::Bulk => CalibrationProfile {
            below_threshold_fraction: Some(0.4),
            ..CalibrationProfile::default()
        },
        FleetType::Container => CalibrationProfile {
            predictive_tiers: Some(TierBoundaries::new(30.0, 55.0, 80.0)),
            ..CalibrationProfile::default()
        },
        FleetType::River => CalibrationProfile {
            review_threshold: Some(40.0),
            below_threshold_fraction: Some(0.5),
            dimension_weights: Some(BTreeMap::from([
                (CompetencyDimension::TechnicalPractical, 0.20),
                (CompetencyDimension::SafetyAwareness, 0.25),
                (CompetencyDimension::ProblemSolving, 0.10),
                (CompetencyDimension::Teamwork, 0.20),
                (CompetencyDimension::Communication, 0.15),
                (CompetencyDimension::Leadership, 0.10),
            ])),
            correlation: CorrelationOverrides {
                low_sea_months_max: Some(6.0),
                ..CorrelationOverrides::default()
            },
            ..CalibrationProfile::default()
        },
        FleetType::Offshore => CalibrationProfile {
            review_threshold: Some(55.0),
            stability_index_cap: Some(12.0),
            correlation: CorrelationOverrides {
                expert_depth_min: Some(65.0),
                low_sea_months_max: Some(24.0),
                ..CorrelationOverrides::default()
            },
            ..CalibrationProfile::default()
        },
        FleetType::Passenger => CalibrationProfile {
            review_threshold: Some(50.0),
            dimension_weights: Some(BTreeMap::from([
                (CompetencyDimension::TechnicalPractical, 0.15),
                (CompetencyDimension::SafetyAwareness, 0.30),
                (CompetencyDimension::ProblemSolving, 0.10),
                (CompetencyDimension::Teamwork, 0.15),
                (CompetencyDimension::Communication, 0.20),
                (CompetencyDimension::Leadership, 0.10),
            ])),
            ..CalibrationProfile::default()
        },
    }
}
