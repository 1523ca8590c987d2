//! Interview competency scoring.
//!
//! Answers are scored per dimension with a keyword rubric (structure markers, domain
//! vocabulary, expert vocabulary), blended into a weighted overall score and optionally
//! refined by a role-gated technical-depth bonus. Results that rest on weak language
//! evidence or poor coverage are marked `low_confidence` so the decision layer can keep
//! them out of the verdict.

mod depth;
mod language;
mod lexicon;

pub use depth::{tier_cap, TechnicalDepthDetail, MAX_TOTAL_DELTA, MIN_CATEGORIES, MIN_PRIMARY_HITS};
pub use language::Language;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::calibration::CalibrationConfig;
use super::domain::{CompetencyDimension, Flag, InterviewSession, Rank};
use super::guardrails::{clamp_percent, round_to};
use language::detect;
use lexicon::{count_hits, fold, lexicon_for, Lexicon};

pub const DEFAULT_MIN_ANSWER_LENGTH: usize = 40;

/// Highest score an answer under the minimum length can reach.
pub const SHORT_ANSWER_CEILING: f64 = 10.0;
const SUBSTANTIVE_BASE: f64 = 20.0;
const STRUCTURE_POINTS: f64 = 7.0;
const STRUCTURE_CAP: f64 = 30.0;
const DOMAIN_SINGLE_POINTS: f64 = 5.0;
const DOMAIN_PHRASE_POINTS: f64 = 9.0;
const DOMAIN_CAP: f64 = 30.0;
const EXPERT_SINGLE_POINTS: f64 = 8.0;
const EXPERT_PHRASE_POINTS: f64 = 12.0;
const EXPERT_CAP: f64 = 25.0;
const STRENGTH_FROM: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetencyStatus {
    Weak,
    Moderate,
    Strong,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: CompetencyDimension,
    pub score: f64,
    pub weight: f64,
    pub substantive: bool,
    pub language: Language,
    pub structure_hits: usize,
    pub domain_hits: usize,
    pub expert_hits: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    Strength,
    Concern,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceBullet {
    pub kind: EvidenceKind,
    pub dimension: Option<CompetencyDimension>,
    pub text: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageSummary {
    pub language: Language,
    pub confidence: f64,
    /// Share of expected dimensions answered substantively.
    pub coverage: f64,
    pub mixed: bool,
    pub declared_locale: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetencyResult {
    pub interview_id: String,
    pub role_rank: Rank,
    pub overall_score: f64,
    pub pre_depth_score: f64,
    pub depth_delta: f64,
    pub status: CompetencyStatus,
    pub dimensions: Vec<DimensionScore>,
    pub below_threshold_fraction: f64,
    pub flags: Vec<Flag>,
    pub evidence: Vec<EvidenceBullet>,
    pub language: LanguageSummary,
    pub low_confidence: bool,
    pub technical_depth_index: Option<f64>,
    pub technical_depth: Option<TechnicalDepthDetail>,
}

impl CompetencyResult {
    pub fn dimension(&self, dimension: CompetencyDimension) -> Option<&DimensionScore> {
        self.dimensions.iter().find(|entry| entry.dimension == dimension)
    }

    /// Technical-practical score after any depth lift.
    pub fn technical_score(&self) -> Option<f64> {
        self.dimension(CompetencyDimension::TechnicalPractical)
            .map(|entry| entry.score)
    }
}

struct AnswerScore {
    score: f64,
    substantive: bool,
    language: Language,
    confidence: f64,
    structure_hits: usize,
    domain_hits: usize,
    expert_hits: usize,
    length: usize,
}

pub struct CompetencyEngine {
    calibration: CalibrationConfig,
    min_answer_length: usize,
}

impl CompetencyEngine {
    pub fn new(calibration: CalibrationConfig, min_answer_length: usize) -> Self {
        Self {
            calibration,
            min_answer_length: min_answer_length.max(1),
        }
    }

    /// Score one completed interview. `None` when no answer maps to a known dimension.
    pub fn score(&self, session: &InterviewSession) -> Option<CompetencyResult> {
        let mut texts: BTreeMap<CompetencyDimension, String> = BTreeMap::new();
        for answer in &session.answers {
            let Some(dimension) = CompetencyDimension::from_code(&answer.dimension_code) else {
                continue;
            };
            let text = answer.answer_text.trim();
            if text.is_empty() {
                continue;
            }
            let entry = texts.entry(dimension).or_default();
            if !entry.is_empty() {
                entry.push(' ');
            }
            entry.push_str(text);
        }

        if texts.is_empty() {
            return None;
        }

        let thresholds = self.calibration.competency_thresholds();
        let weights = self.calibration.dimension_weights();
        let declared = session.locale.as_deref().map(Language::from_locale);

        let scored: BTreeMap<CompetencyDimension, AnswerScore> = texts
            .iter()
            .map(|(dimension, text)| (*dimension, self.score_answer(text, declared)))
            .collect();

        let language = summarize_language(&scored, session.locale.clone());
        let mut dimensions: Vec<DimensionScore> = scored
            .iter()
            .map(|(dimension, answer)| DimensionScore {
                dimension: *dimension,
                score: round_to(answer.score, 2),
                weight: weights.get(dimension).copied().unwrap_or(0.0),
                substantive: answer.substantive,
                language: answer.language,
                structure_hits: answer.structure_hits,
                domain_hits: answer.domain_hits,
                expert_hits: answer.expert_hits,
            })
            .collect();

        let pre_depth_score = round_to(weighted_overall(&dimensions), 2);

        let role_rank = Rank::from_code(&session.role_code);
        let technical_depth = role_rank.technical_depth_eligible().then(|| {
            let combined = texts.values().cloned().collect::<Vec<_>>().join(" ");
            depth::measure(&fold(&combined))
        });

        let mut depth_delta = 0.0;
        if let Some(detail) = &technical_depth {
            if let Some(technical) = dimensions
                .iter_mut()
                .find(|entry| entry.dimension == CompetencyDimension::TechnicalPractical)
            {
                technical.score = round_to(depth::lifted_score(technical.score, detail), 2);
            }
            let lifted = weighted_overall(&dimensions);
            depth_delta = round_to((lifted - pre_depth_score).clamp(0.0, MAX_TOTAL_DELTA), 2);
        }

        let overall_score = round_to(clamp_percent(pre_depth_score + depth_delta), 2);
        let status = if overall_score < thresholds.weak_below {
            CompetencyStatus::Weak
        } else if overall_score < thresholds.strong_from {
            CompetencyStatus::Moderate
        } else {
            CompetencyStatus::Strong
        };

        let below = dimensions
            .iter()
            .filter(|entry| entry.score < self.calibration.review_threshold())
            .count();
        let below_threshold_fraction =
            round_to(below as f64 / CompetencyDimension::ordered().len() as f64, 4);

        let low_confidence = language.confidence < thresholds.min_language_confidence
            || language.coverage < thresholds.min_coverage;

        let flags = self.flags(&dimensions, overall_score, &language, declared, below_threshold_fraction);
        let evidence = evidence_bullets(&dimensions, technical_depth.as_ref());

        Some(CompetencyResult {
            interview_id: session.interview_id.clone(),
            role_rank,
            overall_score,
            pre_depth_score,
            depth_delta,
            status,
            dimensions,
            below_threshold_fraction,
            flags,
            evidence,
            language,
            low_confidence,
            technical_depth_index: technical_depth.as_ref().map(|detail| detail.depth_index),
            technical_depth,
        })
    }

    fn score_answer(&self, text: &str, declared: Option<Language>) -> AnswerScore {
        let detection = detect(text);
        let length = text.chars().count();
        let rubric_language = match (detection.language, declared) {
            (Language::Unknown, Some(hint)) => hint,
            (detected, _) => detected,
        };

        if length < self.min_answer_length {
            return AnswerScore {
                score: SHORT_ANSWER_CEILING * length as f64 / self.min_answer_length as f64,
                substantive: false,
                language: detection.language,
                confidence: detection.confidence,
                structure_hits: 0,
                domain_hits: 0,
                expert_hits: 0,
                length,
            };
        }

        let lexicon: &Lexicon = lexicon_for(rubric_language);
        let folded = fold(text);
        let (structure_single, structure_phrase) = count_hits(&folded, lexicon.structure_markers());
        let (domain_single, domain_phrase) = count_hits(&folded, lexicon.domain.iter().copied());
        let (expert_single, expert_phrase) = count_hits(&folded, lexicon.expert.iter().copied());
        let structure_hits = structure_single + structure_phrase;

        let structure = (structure_hits as f64 * STRUCTURE_POINTS).min(STRUCTURE_CAP);
        let domain = (domain_single as f64 * DOMAIN_SINGLE_POINTS
            + domain_phrase as f64 * DOMAIN_PHRASE_POINTS)
            .min(DOMAIN_CAP);
        let expert = (expert_single as f64 * EXPERT_SINGLE_POINTS
            + expert_phrase as f64 * EXPERT_PHRASE_POINTS)
            .min(EXPERT_CAP);

        AnswerScore {
            score: clamp_percent(SUBSTANTIVE_BASE + structure + domain + expert),
            substantive: true,
            language: detection.language,
            confidence: detection.confidence,
            structure_hits,
            domain_hits: domain_single + domain_phrase,
            expert_hits: expert_single + expert_phrase,
            length,
        }
    }

    fn flags(
        &self,
        dimensions: &[DimensionScore],
        overall_score: f64,
        language: &LanguageSummary,
        declared: Option<Language>,
        below_threshold_fraction: f64,
    ) -> Vec<Flag> {
        let thresholds = self.calibration.competency_thresholds();
        let mut flags = Vec::new();

        if overall_score < thresholds.critical_floor {
            flags.push(Flag::critical(
                "competency_critical_overall",
                format!(
                    "Overall competency {overall_score:.1} is below the critical floor of {:.0}",
                    thresholds.critical_floor
                ),
            ));
        }

        if let Some(safety) = dimensions
            .iter()
            .find(|entry| entry.dimension == CompetencyDimension::SafetyAwareness)
        {
            if safety.score < thresholds.critical_floor {
                flags.push(Flag::critical(
                    "safety_awareness_failure",
                    format!(
                        "Safety awareness answer scored {:.1}, below the critical floor",
                        safety.score
                    ),
                ));
            }
        }

        if below_threshold_fraction > self.calibration.below_threshold_fraction() {
            flags.push(Flag::warning(
                "weak_dimensions",
                format!(
                    "{:.0}% of dimensions scored below the review threshold of {:.0}",
                    below_threshold_fraction * 100.0,
                    self.calibration.review_threshold()
                ),
            ));
        }

        for entry in dimensions
            .iter()
            .filter(|entry| entry.substantive && entry.score < thresholds.weak_below)
        {
            flags.push(Flag::warning(
                format!("weak_{}", entry.dimension.code()),
                format!("{} answer scored {:.1}", entry.dimension.label(), entry.score),
            ));
        }

        if language.coverage < thresholds.min_coverage {
            flags.push(Flag::warning(
                "low_coverage",
                format!(
                    "Only {:.0}% of expected dimensions were answered substantively",
                    language.coverage * 100.0
                ),
            ));
        }

        if language.confidence < thresholds.min_language_confidence {
            flags.push(Flag::warning(
                "low_language_confidence",
                format!("Language detection confidence {:.2}", language.confidence),
            ));
        }

        if language.mixed {
            flags.push(Flag::warning(
                "mixed_language",
                "Answers were given in more than one language",
            ));
        }

        if let Some(hint) = declared {
            if hint != Language::Unknown
                && language.language != Language::Unknown
                && hint != language.language
                && language.confidence >= thresholds.min_language_confidence
            {
                flags.push(Flag::warning(
                    "locale_mismatch",
                    format!(
                        "Declared locale does not match detected language {}",
                        language.language.code()
                    ),
                ));
            }
        }

        flags
    }
}

/// Weighted average over the answered dimensions, renormalized by their weight mass.
fn weighted_overall(dimensions: &[DimensionScore]) -> f64 {
    let mass: f64 = dimensions.iter().map(|entry| entry.weight).sum();
    if mass <= 0.0 {
        let count = dimensions.len().max(1) as f64;
        return dimensions.iter().map(|entry| entry.score).sum::<f64>() / count;
    }
    dimensions
        .iter()
        .map(|entry| entry.score * entry.weight)
        .sum::<f64>()
        / mass
}

fn summarize_language(
    scored: &BTreeMap<CompetencyDimension, AnswerScore>,
    declared_locale: Option<String>,
) -> LanguageSummary {
    let total_length: usize = scored.values().map(|answer| answer.length).sum();
    let mut mass: BTreeMap<&'static str, (Language, usize, f64)> = BTreeMap::new();

    for answer in scored.values() {
        if answer.language == Language::Unknown {
            continue;
        }
        let slot = mass
            .entry(answer.language.code())
            .or_insert((answer.language, 0, 0.0));
        slot.1 += answer.length;
        slot.2 += answer.confidence * answer.length as f64;
    }

    let dominant = mass
        .values()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| a.2.total_cmp(&b.2)))
        .copied();

    let (language, confidence) = match dominant {
        Some((language, _, weighted)) if total_length > 0 => {
            (language, (weighted / total_length as f64).clamp(0.0, 1.0))
        }
        _ => (Language::Unknown, 0.0),
    };

    let substantive = scored.values().filter(|answer| answer.substantive).count();
    let coverage = substantive as f64 / CompetencyDimension::ordered().len() as f64;

    LanguageSummary {
        language,
        confidence: round_to(confidence, 4),
        coverage: round_to(coverage, 4),
        mixed: mass.len() > 1,
        declared_locale,
    }
}

fn evidence_bullets(
    dimensions: &[DimensionScore],
    depth: Option<&TechnicalDepthDetail>,
) -> Vec<EvidenceBullet> {
    let mut bullets = Vec::new();

    for entry in dimensions {
        if !entry.substantive {
            bullets.push(EvidenceBullet {
                kind: EvidenceKind::Concern,
                dimension: Some(entry.dimension),
                text: format!("{} answer too brief to assess", entry.dimension.label()),
                reason: "answer shorter than the minimum length".to_string(),
            });
        } else if entry.score >= STRENGTH_FROM {
            bullets.push(EvidenceBullet {
                kind: EvidenceKind::Strength,
                dimension: Some(entry.dimension),
                text: format!("{} scored {:.0}", entry.dimension.label(), entry.score),
                reason: format!(
                    "{} structure marker(s), {} domain term(s), {} expert term(s)",
                    entry.structure_hits, entry.domain_hits, entry.expert_hits
                ),
            });
        } else if entry.domain_hits == 0 && entry.expert_hits == 0 {
            bullets.push(EvidenceBullet {
                kind: EvidenceKind::Concern,
                dimension: Some(entry.dimension),
                text: format!("{} answer lacks maritime specifics", entry.dimension.label()),
                reason: "no domain or expert vocabulary found".to_string(),
            });
        }
    }

    if let Some(detail) = depth.filter(|detail| detail.floor_met) {
        bullets.push(EvidenceBullet {
            kind: EvidenceKind::Strength,
            dimension: Some(CompetencyDimension::TechnicalPractical),
            text: format!("Technical depth index {:.0}", detail.depth_index),
            reason: format!(
                "{} primary term(s) across {}",
                detail.primary_hits,
                detail.categories.join(", ")
            ),
        });
    }

    bullets
}
