use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Supported languages for analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    English,
    French,
    Spanish,
    Korean,
    German,
}

/// A negation expressed by a particle and a complement that may sit several
/// tokens apart ("ne ... jamais").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitNegation {
    pub particle: &'static str,
    /// Each complement is a lemma sequence; most are a single lemma.
    pub complements: &'static [&'static [&'static str]],
}

impl SplitNegation {
    pub fn is_complement(&self, lemmas: &[&str]) -> bool {
        self.complements.iter().any(|complement| *complement == lemmas)
    }
}

/// A fixed two-token copular idiom such as French "c'est".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopularIdiom {
    pub surface: &'static str,
    pub pronoun_lemma: &'static str,
    pub copula_lemma: &'static str,
}

/// Language-specific overrides applied while compiling structural patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageProfile {
    pub split_negation: Option<SplitNegation>,
    pub copular_idioms: &'static [CopularIdiom],
}

const FRENCH_NEGATION: SplitNegation = SplitNegation {
    particle: "ne",
    complements: &[
        &["pas"],
        &["plus"],
        &["que"],
        &["jamais"],
        &["guère"],
        &["point"],
        &["rien"],
        &["personne"],
        &["aucun"],
        &["nulle", "part"],
    ],
};

const FRENCH_COPULAR_IDIOMS: &[CopularIdiom] = &[CopularIdiom {
    surface: "c'est",
    pronoun_lemma: "ce",
    copula_lemma: "être",
}];

const NO_OVERRIDES: LanguageProfile = LanguageProfile {
    split_negation: None,
    copular_idioms: &[],
};

impl Language {
    pub const ALL: [Language; 5] = [
        Language::English,
        Language::French,
        Language::Spanish,
        Language::Korean,
        Language::German,
    ];

    pub fn iso_639_3(&self) -> &'static str {
        match self {
            Language::English => "eng",
            Language::French => "fra",
            Language::Spanish => "spa",
            Language::Korean => "kor",
            Language::German => "deu",
        }
    }

    /// Pattern-compilation overrides for this language.
    pub fn profile(&self) -> LanguageProfile {
        match self {
            Language::French => LanguageProfile {
                split_negation: Some(FRENCH_NEGATION),
                copular_idioms: FRENCH_COPULAR_IDIOMS,
            },
            Language::English | Language::Spanish | Language::Korean | Language::German => {
                NO_OVERRIDES
            }
        }
    }
}

impl FromStr for Language {
    type Err = ConfigError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|language| language.iso_639_3() == code)
            .ok_or_else(|| ConfigError::UnsupportedLanguage(code.to_string()))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::English => write!(f, "English"),
            Language::French => write!(f, "French"),
            Language::Spanish => write!(f, "Spanish"),
            Language::Korean => write!(f, "Korean"),
            Language::German => write!(f, "German"),
        }
    }
}
