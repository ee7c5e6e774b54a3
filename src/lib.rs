//! Multiword expression detection over dependency-parsed sentences.
//!
//! Every vocabulary term is parsed once and compiled into an exact lemma
//! sequence plus a structural pattern anchored on its clause head. Sentences
//! are then scanned with both: exact lemma-sequence hits are reported as high
//! confidence, structural hits that add something new as low confidence.

pub mod annotator;
pub mod compiler;
pub mod dep;
pub mod detector;
pub mod driver;
mod error;
pub mod graph;
mod language;
pub mod matching;
pub mod output;
pub mod pattern;
pub mod pos;
mod progress;
pub mod vocabulary;

pub use crate::annotator::{Annotator, PreannotatedCorpus};
#[cfg(feature = "remote")]
pub use crate::annotator::{Lexide, RemoteConfig};
pub use crate::compiler::{AttributeSelection, CompiledPatternSet, CompilerConfig, PatternCompiler};
pub use crate::detector::{DetectedTerms, MultiwordTermDetector, Term};
pub use crate::error::ConfigError;
pub use crate::language::{CopularIdiom, Language, LanguageProfile, SplitNegation};
use crate::{dep::DependencyRelation, pos::PartOfSpeech};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Text {
    pub text: String,
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Lemma {
    pub lemma: String,
}

impl Lemma {
    pub fn new(lemma: impl Into<String>) -> Self {
        Self {
            lemma: lemma.into(),
        }
    }
}

impl fmt::Display for Lemma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lemma)
    }
}

/// Represents a single token with its linguistic annotations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Token {
    pub text: Text,
    pub whitespace: String,
    pub pos: PartOfSpeech,
    pub lemma: Lemma,
    pub dep: DependencyRelation,
    /// 1-indexed head; `0` marks the sentence root.
    pub head: i32,
    /// Morphological features (`Number` -> `Plur`, ...)
    #[serde(default)]
    pub morph: BTreeMap<String, String>,
}

/// A named-entity span over token indices (`end` is exclusive).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EntitySpan {
    pub start: usize,
    pub end: usize,
    pub label: String,
}

/// Analysis result for a sentence
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tokenization {
    pub tokens: Vec<Token>,
    #[serde(default)]
    pub entities: Vec<EntitySpan>,
}

impl Tokenization {
    /// Reconstruct the text from tokens using whitespace information
    pub fn reconstruct_text(&self) -> String {
        self.tokens
            .iter()
            .map(|token| format!("{}{}", token.text, token.whitespace))
            .collect()
    }

    /// Extract the text sequence from tokens
    pub fn texts(&self) -> Vec<Text> {
        self.tokens.iter().map(|token| token.text.clone()).collect()
    }

    /// Extract the lemma sequence from tokens
    pub fn lemmas(&self) -> Vec<Lemma> {
        self.tokens
            .iter()
            .map(|token| token.lemma.clone())
            .collect()
    }

    /// Character offsets `(start, end)` of every token in the reconstructed
    /// text. Offsets count `char`s, not bytes.
    pub fn char_spans(&self) -> Vec<(usize, usize)> {
        let mut offset = 0;
        self.tokens
            .iter()
            .map(|token| {
                let start = offset;
                let end = start + token.text.text.chars().count();
                offset = end + token.whitespace.chars().count();
                (start, end)
            })
            .collect()
    }

    /// Surface text and label of every entity. Spans that fall outside the
    /// token list are ignored.
    pub fn entity_texts(&self) -> Vec<(String, String)> {
        self.entities
            .iter()
            .filter_map(|entity| {
                let tokens = self.tokens.get(entity.start..entity.end)?;
                let (last, rest) = tokens.split_last()?;
                let mut text: String = rest
                    .iter()
                    .map(|token| format!("{}{}", token.text, token.whitespace))
                    .collect();
                text.push_str(&last.text.text);
                Some((text, entity.label.clone()))
            })
            .collect()
    }
}
