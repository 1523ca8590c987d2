use super::common::*;
use crate::screening::calibration::{CalibrationConfig, FleetType};
use crate::screening::competency::{
    CompetencyEngine, CompetencyStatus, EvidenceKind, Language, DEFAULT_MIN_ANSWER_LENGTH,
    MAX_TOTAL_DELTA, SHORT_ANSWER_CEILING,
};
use crate::screening::domain::{CompetencyDimension, Rank, Severity};

fn engine() -> CompetencyEngine {
    CompetencyEngine::new(CalibrationConfig::default(), DEFAULT_MIN_ANSWER_LENGTH)
}

fn has_flag(result: &crate::screening::CompetencyResult, code: &str) -> bool {
    result.flags.iter().any(|flag| flag.code == code)
}

#[test]
fn brief_answers_stay_under_the_low_ceiling() {
    let result = engine()
        .score(&session("AB", Some("en"), brief_answers()))
        .expect("scored");

    assert!(result
        .dimensions
        .iter()
        .all(|dimension| dimension.score <= SHORT_ANSWER_CEILING && !dimension.substantive));
    assert!(result.overall_score <= 25.0);
    assert!(result.low_confidence);
    assert_eq!(result.language.coverage, 0.0);
    assert!(has_flag(&result, "low_coverage"));
    assert!(has_flag(&result, "competency_critical_overall"));
    assert!(has_flag(&result, "safety_awareness_failure"));
}

#[test]
fn expert_vocabulary_scores_high() {
    let result = engine()
        .score(&session("C/O", Some("en"), strong_answers()))
        .expect("scored");

    let technical = result
        .dimension(CompetencyDimension::TechnicalPractical)
        .expect("technical dimension");
    assert!(technical.score >= 60.0);
    assert!(technical.expert_hits >= 3);
    assert!(result.overall_score >= 70.0);
    assert_eq!(result.status, CompetencyStatus::Strong);
    assert!(!result.low_confidence);
    assert_eq!(result.language.language, Language::English);
    assert!(result
        .flags
        .iter()
        .all(|flag| flag.severity != Severity::Critical));
    assert!(result
        .evidence
        .iter()
        .any(|bullet| bullet.kind == EvidenceKind::Strength));
}

#[test]
fn junior_ratings_never_get_a_depth_index() {
    let result = engine()
        .score(&session("AB", Some("en"), strong_answers()))
        .expect("scored");

    assert_eq!(result.role_rank, Rank::AbleSeaman);
    assert!(result.technical_depth_index.is_none());
    assert!(result.technical_depth.is_none());
    assert_eq!(result.depth_delta, 0.0);
    assert_eq!(result.overall_score, result.pre_depth_score);
}

#[test]
fn depth_bonus_is_zero_below_the_floor() {
    let answers = vec![answer(
        "technical_practical",
        "I look after the purifier, the turbocharger and the crankcase of the engines on my \
         ship and I keep them clean.",
    )];
    let result = engine()
        .score(&session("C/E", Some("en"), answers))
        .expect("scored");

    let detail = result.technical_depth.as_ref().expect("eligible rank");
    assert_eq!(detail.primary_hits, 3);
    assert_eq!(detail.categories.len(), 1);
    assert!(!detail.floor_met);
    assert_eq!(detail.bonus_points, 0.0);
    assert_eq!(result.depth_delta, 0.0);
}

#[test]
fn depth_uplift_is_capped_and_added_to_the_pre_depth_score() {
    let answers = vec![
        answer(
            "technical_practical",
            "I look after the purifier, the turbocharger and the crankcase of our engines, and \
             I also check the ECDIS passage plan with the deck officers.",
        ),
        answer(
            "safety_awareness",
            "We wear ppe and we do the drill every week on the vessel, it is important for all of us.",
        ),
    ];
    let result = engine()
        .score(&session("C/E", Some("en"), answers))
        .expect("scored");

    let detail = result.technical_depth.as_ref().expect("eligible rank");
    assert!(detail.floor_met);
    assert!(result.depth_delta > 0.0);
    assert!(result.depth_delta <= MAX_TOTAL_DELTA);
    assert!((result.overall_score - (result.pre_depth_score + result.depth_delta)).abs() < 0.01);
    let technical = result
        .dimension(CompetencyDimension::TechnicalPractical)
        .expect("technical dimension");
    assert!(technical.score <= detail.cap.expect("tier cap"));
}

#[test]
fn turkish_answers_use_the_turkish_rubric() {
    let answers = vec![answer(
        "safety_awareness",
        "Önce risk değerlendirmesi yaptık ve çalışma izni aldık, sonra makine dairesi için bir \
         tatbikat planladık. Bu nedenle arıza başarıyla giderildi.",
    )];
    let result = engine()
        .score(&session("AB", Some("tr-TR"), answers))
        .expect("scored");

    assert_eq!(result.language.language, Language::Turkish);
    let safety = result
        .dimension(CompetencyDimension::SafetyAwareness)
        .expect("safety dimension");
    assert!(safety.structure_hits >= 3);
    assert!(safety.domain_hits >= 3);
    assert!(!has_flag(&result, "locale_mismatch"));
}

#[test]
fn declared_locale_mismatch_is_flagged() {
    let result = engine()
        .score(&session("C/O", Some("tr"), strong_answers()))
        .expect("scored");
    assert!(has_flag(&result, "locale_mismatch"));
}

#[test]
fn mixed_languages_are_flagged() {
    let mut answers = strong_answers();
    answers[1] = answer(
        "safety_awareness",
        "Önce risk değerlendirmesi yaptık ve çalışma izni aldık, sonra makine dairesi için bir \
         tatbikat planladık. Bu nedenle arıza başarıyla giderildi.",
    );
    let result = engine()
        .score(&session("C/O", Some("en"), answers))
        .expect("scored");

    assert!(result.language.mixed);
    assert!(has_flag(&result, "mixed_language"));
}

#[test]
fn repeated_dimension_answers_are_merged() {
    let mut answers = strong_answers();
    answers.push(answer("teamwork", "We also ran a fire drill together with the engine crew."));
    let result = engine()
        .score(&session("C/O", Some("en"), answers))
        .expect("scored");

    assert_eq!(result.dimensions.len(), 6);
}

#[test]
fn unknown_dimensions_only_yield_nothing() {
    let answers = vec![answer("favourite_port", "Rotterdam, because the pilots are quick.")];
    assert!(engine().score(&session("AB", None, answers)).is_none());
}

#[test]
fn fleet_weights_change_the_overall_score() {
    let session = session("C/O", Some("en"), strong_answers());
    let default = engine().score(&session).expect("default");
    let passenger = CompetencyEngine::new(
        CalibrationConfig::for_fleet(Some(FleetType::Passenger)),
        DEFAULT_MIN_ANSWER_LENGTH,
    )
    .score(&session)
    .expect("passenger");

    assert_ne!(default.pre_depth_score, passenger.pre_depth_score);
}

#[test]
fn scoring_is_deterministic() {
    let session = session("C/O", Some("en"), strong_answers());
    assert_eq!(engine().score(&session), engine().score(&session));
}
