use chrono::Duration;

use super::common::*;
use crate::screening::calibration::CalibrationConfig;
use crate::screening::domain::{CandidateId, RiskTier};
use crate::screening::repository::RiskSnapshot;
use crate::screening::trend::{
    analyze_trend, CurrentSignals, PolicyImpact, PredictiveEngine, TrendDirection, TrendPattern,
};

fn snapshot(day: i64) -> RiskSnapshot {
    RiskSnapshot {
        candidate_id: CandidateId(DRIFTING_ID.to_string()),
        computed_at: now() + Duration::days(day),
        risk_score: None,
        stability_index: None,
        compliance_score: None,
        competency_score: None,
        technical_depth_index: None,
        total_sea_months: None,
        employer_changes: None,
        predictive_index: 0.0,
        predictive_tier: RiskTier::Low,
    }
}

fn risks(values: &[f64]) -> Vec<RiskSnapshot> {
    values
        .iter()
        .enumerate()
        .map(|(day, value)| RiskSnapshot {
            risk_score: Some(*value),
            ..snapshot(day as i64)
        })
        .collect()
}

fn engine() -> PredictiveEngine {
    PredictiveEngine::new(CalibrationConfig::default())
}

#[test]
fn too_little_history_reads_as_stable() {
    for history in [Vec::new(), risks(&[0.8])] {
        let analysis = analyze_trend(&history);
        assert_eq!(analysis.direction, TrendDirection::Stable);
        assert_eq!(analysis.trend_score, 0.0);
        assert!(analysis.patterns.is_empty());
    }
}

#[test]
fn rising_career_risk_is_escalation() {
    let analysis = analyze_trend(&risks(&[0.2, 0.3, 0.45]));

    assert_eq!(analysis.patterns.len(), 1);
    assert_eq!(
        analysis.patterns[0].pattern,
        TrendPattern::EscalatingInstability
    );
    assert_eq!(analysis.trend_score, 35.0);
    assert_eq!(analysis.direction, TrendDirection::Deteriorating);
    assert!(analysis.patterns[0].reason.contains("2 of 2 step(s)"));
}

#[test]
fn small_risk_movement_is_not_escalation() {
    let analysis = analyze_trend(&risks(&[0.30, 0.32, 0.33]));
    assert!(analysis.patterns.is_empty());
    assert_eq!(analysis.direction, TrendDirection::Stable);
}

#[test]
fn falling_compliance_is_drift() {
    let history = vec![
        RiskSnapshot {
            compliance_score: Some(100.0),
            ..snapshot(0)
        },
        RiskSnapshot {
            compliance_score: Some(80.0),
            ..snapshot(30)
        },
    ];

    let analysis = analyze_trend(&history);
    assert_eq!(analysis.patterns[0].pattern, TrendPattern::ComplianceDrift);
    assert_eq!(analysis.patterns[0].reason, "Compliance fell from 100 to 80");
}

#[test]
fn mismatch_names_the_higher_side() {
    let interview_high = vec![
        snapshot(0),
        RiskSnapshot {
            competency_score: Some(85.0),
            technical_depth_index: Some(40.0),
            ..snapshot(1)
        },
    ];
    let depth_high = vec![
        snapshot(0),
        RiskSnapshot {
            competency_score: Some(35.0),
            technical_depth_index: Some(80.0),
            ..snapshot(1)
        },
    ];

    let first = analyze_trend(&interview_high);
    assert_eq!(
        first.patterns[0].reason,
        "Interview competency 85 is well above technical depth 40"
    );
    let second = analyze_trend(&depth_high);
    assert_eq!(
        second.patterns[0].reason,
        "Technical depth 80 is well above interview competency 35"
    );
}

#[test]
fn falling_risk_reads_as_improving() {
    let analysis = analyze_trend(&risks(&[0.6, 0.5, 0.3]));
    assert!(analysis.patterns.is_empty());
    assert_eq!(analysis.direction, TrendDirection::Improving);
}

#[test]
fn empty_history_still_explains_the_index() {
    let result = engine().evaluate(
        &[],
        &CurrentSignals {
            risk_score: Some(0.2),
            correlation_weight: 0.0,
        },
    );

    assert_eq!(result.trend.direction, TrendDirection::Stable);
    assert_eq!(result.predictive_index, 10.0);
    assert_eq!(result.tier, RiskTier::Low);
    assert_eq!(result.policy_impact, PolicyImpact::None);
    assert!(result.reasons.len() >= 3);
}

#[test]
fn every_signal_at_its_worst_is_critical_but_never_a_rejection() {
    let history = vec![
        RiskSnapshot {
            risk_score: Some(0.2),
            compliance_score: Some(100.0),
            ..snapshot(0)
        },
        RiskSnapshot {
            risk_score: Some(0.5),
            compliance_score: Some(90.0),
            ..snapshot(1)
        },
        RiskSnapshot {
            risk_score: Some(0.9),
            compliance_score: Some(60.0),
            competency_score: Some(90.0),
            technical_depth_index: Some(20.0),
            ..snapshot(2)
        },
    ];

    let result = engine().evaluate(
        &history,
        &CurrentSignals {
            risk_score: Some(1.0),
            correlation_weight: 1.0,
        },
    );

    assert_eq!(result.trend.patterns.len(), 3);
    assert_eq!(result.trend.trend_score, 90.0);
    assert!(result.predictive_index <= 100.0);
    assert_eq!(result.tier, RiskTier::Critical);
    assert_eq!(result.policy_impact, PolicyImpact::ConfirmRejectEligible);
    assert!(result
        .reasons
        .iter()
        .any(|reason| reason.starts_with("Compliance fell")));
}

#[test]
fn tiers_map_to_policy_impact() {
    assert_eq!(PolicyImpact::for_tier(RiskTier::Low), PolicyImpact::None);
    assert_eq!(PolicyImpact::for_tier(RiskTier::Medium), PolicyImpact::None);
    assert_eq!(PolicyImpact::for_tier(RiskTier::High), PolicyImpact::Review);
    assert_eq!(
        PolicyImpact::for_tier(RiskTier::Critical),
        PolicyImpact::ConfirmRejectEligible
    );
}
