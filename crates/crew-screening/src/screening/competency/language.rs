use serde::{Deserialize, Serialize};

use super::lexicon::{fold, tokens, ENGLISH, TURKISH};

/// Evidence below this many hits is scaled down proportionally.
const FULL_CONFIDENCE_EVIDENCE: f64 = 5.0;
const TURKISH_LETTERS: [char; 6] = ['ç', 'ğ', 'ı', 'ö', 'ş', 'ü'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    English,
    Turkish,
    Unknown,
}

impl Language {
    pub const fn code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Turkish => "tr",
            Self::Unknown => "und",
        }
    }

    /// `en`, `en-GB`, `tr_TR` and friends.
    pub fn from_locale(locale: &str) -> Self {
        let primary = locale
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => Self::English,
            "tr" => Self::Turkish,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Detection {
    pub language: Language,
    pub confidence: f64,
}

/// Stopword voting with a bonus for Turkish-only letters.
pub(crate) fn detect(text: &str) -> Detection {
    let folded = fold(text);
    let mut english = 0.0;
    let mut turkish = 0.0;

    for token in tokens(&folded) {
        if ENGLISH.stopwords.contains(&token) {
            english += 1.0;
        }
        if TURKISH.stopwords.iter().any(|word| fold(word).trim() == token) {
            turkish += 1.0;
        }
    }
    turkish += text
        .to_lowercase()
        .split_whitespace()
        .filter(|word| word.chars().any(|ch| TURKISH_LETTERS.contains(&ch)))
        .count() as f64;

    let total: f64 = english + turkish;
    if total == 0.0 || english == turkish {
        return Detection {
            language: Language::Unknown,
            confidence: 0.0,
        };
    }

    let (language, top) = if english > turkish {
        (Language::English, english)
    } else {
        (Language::Turkish, turkish)
    };

    Detection {
        language,
        confidence: (top / total) * (total / FULL_CONFIDENCE_EVIDENCE).min(1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_answer_is_detected() {
        let detection = detect("First we isolated the pump and then we checked the valve with the crew.");
        assert_eq!(detection.language, Language::English);
        assert!(detection.confidence > 0.8);
    }

    #[test]
    fn turkish_answer_is_detected() {
        let detection = detect("Önce pompayı izole ettik, sonra vanayı kontrol ettik ve ekip ile konuştuk.");
        assert_eq!(detection.language, Language::Turkish);
        assert!(detection.confidence > 0.5);
    }

    #[test]
    fn no_evidence_is_unknown() {
        let detection = detect("ECDIS ARPA 12345");
        assert_eq!(detection.language, Language::Unknown);
        assert_eq!(detection.confidence, 0.0);
    }

    #[test]
    fn locale_prefix_is_parsed() {
        assert_eq!(Language::from_locale("tr_TR"), Language::Turkish);
        assert_eq!(Language::from_locale("en-GB"), Language::English);
        assert_eq!(Language::from_locale("de"), Language::Unknown);
    }
}
