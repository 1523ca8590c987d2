//! Keyword and phrase sets used by the competency rubric.
//!
//! Terms are stored lowercase and matched on whole-token boundaries after [`fold`] has been
//! applied to both the answer and the term.

use super::language::Language;

pub(crate) struct Lexicon {
    pub stopwords: &'static [&'static str],
    pub sequencing: &'static [&'static str],
    pub causal: &'static [&'static str],
    pub outcome: &'static [&'static str],
    pub domain: &'static [&'static str],
    pub expert: &'static [&'static str],
}

impl Lexicon {
    pub fn structure_markers(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.sequencing
            .iter()
            .chain(self.causal.iter())
            .chain(self.outcome.iter())
            .copied()
    }
}

pub(crate) static ENGLISH: Lexicon = Lexicon {
    stopwords: &[
        "the", "and", "is", "to", "of", "a", "in", "that", "it", "we", "i", "was", "for",
        "with", "on", "my", "this", "be", "as", "have", "are", "they", "our", "were",
    ],
    sequencing: &[
        "first", "then", "next", "after that", "finally", "afterwards", "before", "once",
    ],
    causal: &[
        "because", "therefore", "so that", "due to", "as a result", "in order to",
        "which meant",
    ],
    outcome: &[
        "resolved", "prevented", "result", "successfully", "outcome", "restored", "learned",
        "completed",
    ],
    domain: &[
        "vessel", "deck", "engine", "cargo", "watch", "bridge", "crew", "ballast", "mooring",
        "anchor", "hull", "pump", "valve", "generator", "lifeboat", "drill", "port", "helm",
        "radar", "ppe", "inspection", "maintenance", "checklist", "officer",
        "engine room", "permit to work", "risk assessment", "safety meeting", "toolbox talk",
        "fire drill", "abandon ship", "mooring lines", "bridge team", "chief engineer",
        "chief officer", "watch handover", "cargo operation", "planned maintenance",
        "life jacket", "muster station", "emergency stop", "oil spill", "port state",
        "near miss",
    ],
    expert: &[
        "ecdis", "arpa", "colregs", "solas", "marpol", "stcw", "isgott", "ism", "isps",
        "sopep", "gmdss", "purifier", "turbocharger", "crankcase", "scavenge", "inerting",
        "stripping", "bunkering",
        "enclosed space entry", "lockout tagout", "root cause analysis",
        "bridge resource management", "passage plan", "stability calculation",
        "inert gas system", "main engine", "fuel injection", "loading computer",
        "dynamic positioning", "port state control", "cargo tank cleaning", "black start",
        "blackout recovery",
    ],
};

pub(crate) static TURKISH: Lexicon = Lexicon {
    stopwords: &[
        "ve", "bir", "bu", "da", "de", "için", "ile", "ben", "biz", "çok", "olarak", "gibi",
        "ama", "daha", "her", "ne", "kadar", "var", "olan", "şu", "bizim", "benim",
    ],
    sequencing: &[
        "önce", "sonra", "ardından", "daha sonra", "son olarak", "ilk olarak", "ilk önce",
    ],
    causal: &[
        "çünkü", "bu nedenle", "bu yüzden", "dolayısıyla", "sebebiyle", "bu sayede",
    ],
    outcome: &[
        "çözüldü", "önledik", "sonuç", "sonucunda", "başarıyla", "tamamlandı", "giderildi",
    ],
    domain: &[
        "gemi", "güverte", "makine", "yük", "vardiya", "köprüüstü", "mürettebat", "balast",
        "halat", "çapa", "pompa", "vana", "jeneratör", "filika", "tatbikat", "liman",
        "denetim", "bakım", "kaptan", "zabit",
        "makine dairesi", "risk değerlendirmesi", "çalışma izni", "yangın tatbikatı",
        "gemiyi terk", "bakım planı", "can yeleği", "toplanma istasyonu", "acil durdurma",
        "petrol sızıntısı", "vardiya devri", "yük operasyonu",
    ],
    expert: &[
        "ecdis", "arpa", "colregs", "solas", "marpol", "stcw", "ism", "isps", "sopep",
        "gmdss", "separatör", "turboşarj", "karter", "inertleme",
        "kapalı alana giriş", "kök neden analizi", "köprüüstü kaynak yönetimi", "sefer planı",
        "stabilite hesabı", "inert gaz sistemi", "ana makine", "yakıt enjeksiyonu",
        "dinamik konumlandırma", "liman devleti kontrolü",
    ],
};

/// Technical-depth vocabulary grouped by category. Largely language-neutral acronyms.
pub(crate) struct DepthCategory {
    pub name: &'static str,
    pub primary: &'static [&'static str],
    pub secondary: &'static [&'static str],
}

pub(crate) static DEPTH_CATEGORIES: &[DepthCategory] = &[
    DepthCategory {
        name: "navigation",
        primary: &[
            "ecdis", "arpa", "colregs", "passage plan", "parallel indexing", "gyro error",
            "sefer planı",
        ],
        secondary: &["radar", "gps", "chart", "bridge watch", "helm", "köprüüstü"],
    },
    DepthCategory {
        name: "cargo",
        primary: &[
            "inert gas system", "stability calculation", "loading computer",
            "cargo tank cleaning", "stripping", "inerting", "stabilite hesabı",
            "inert gaz sistemi",
        ],
        secondary: &["ballast", "cargo plan", "trim", "draft", "manifold", "balast"],
    },
    DepthCategory {
        name: "engineering",
        primary: &[
            "purifier", "turbocharger", "crankcase", "scavenge", "fuel injection",
            "black start", "separatör", "turboşarj", "karter", "yakıt enjeksiyonu",
        ],
        secondary: &["main engine", "generator", "boiler", "lube oil", "ana makine", "jeneratör"],
    },
    DepthCategory {
        name: "safety",
        primary: &[
            "enclosed space entry", "lockout tagout", "permit to work", "root cause analysis",
            "sopep", "kapalı alana giriş", "kök neden analizi", "çalışma izni",
        ],
        secondary: &["risk assessment", "drill", "ppe", "gas detector", "muster", "tatbikat"],
    },
    DepthCategory {
        name: "regulatory",
        primary: &[
            "solas", "marpol", "stcw", "isgott", "port state control", "ism",
            "liman devleti kontrolü",
        ],
        secondary: &["isps", "mlc", "audit", "class survey", "certificate"],
    },
];

pub(crate) fn lexicon_for(language: Language) -> &'static Lexicon {
    match language {
        Language::Turkish => &TURKISH,
        Language::English | Language::Unknown => &ENGLISH,
    }
}

/// Lowercase, fold Turkish dotted/dotless i, and join alphanumeric tokens with single
/// spaces, padded so whole-token matches can use `contains(" term ")`.
pub(crate) fn fold(text: &str) -> String {
    let lowered: String = text
        .chars()
        .map(|ch| match ch {
            'İ' | 'I' | 'ı' => 'i',
            other => other,
        })
        .flat_map(char::to_lowercase)
        .collect();

    let mut folded = String::with_capacity(lowered.len() + 2);
    folded.push(' ');
    for token in lowered
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| !token.is_empty())
    {
        folded.push_str(token);
        folded.push(' ');
    }
    folded
}

/// Tokens of a folded string.
pub(crate) fn tokens(folded: &str) -> impl Iterator<Item = &str> {
    folded.split(' ').filter(|token| !token.is_empty())
}

/// Distinct terms present, split into (single-word hits, multi-word phrase hits).
pub(crate) fn count_hits<'a>(
    folded: &str,
    terms: impl IntoIterator<Item = &'a str>,
) -> (usize, usize) {
    let mut seen: Vec<String> = Vec::new();
    let mut singles = 0;
    let mut phrases = 0;

    for term in terms {
        let needle = fold(term);
        if seen.contains(&needle) || !folded.contains(needle.as_str()) {
            continue;
        }
        if needle.trim().contains(' ') {
            phrases += 1;
        } else {
            singles += 1;
        }
        seen.push(needle);
    }

    (singles, phrases)
}
