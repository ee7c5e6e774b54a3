//! JSONL records written for every processed sentence.

use crate::dep::DependencyRelation;
use crate::detector::{DetectedTerms, Term};
use crate::pos::PartOfSpeech;
use crate::{Token, Tokenization};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceRecord {
    pub sentence: String,
    pub multiword_terms: MultiwordTerms,
    pub doc: Vec<DocToken>,
    /// `(surface text, label)` pairs.
    pub entities: Vec<(String, String)>,
}

/// Term names by confidence, sorted and without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiwordTerms {
    pub high_confidence: Vec<String>,
    pub low_confidence: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocToken {
    pub text: String,
    pub whitespace: String,
    pub lemma: String,
    pub pos: PartOfSpeech,
    pub morph: BTreeMap<String, String>,
    pub dep: DependencyRelation,
}

impl From<&Token> for DocToken {
    fn from(token: &Token) -> Self {
        Self {
            text: token.text.text.clone(),
            whitespace: token.whitespace.clone(),
            lemma: token.lemma.lemma.clone(),
            pos: token.pos,
            morph: token.morph.clone(),
            dep: token.dep,
        }
    }
}

impl SentenceRecord {
    pub fn new(sentence: String, parse: &Tokenization, detected: &DetectedTerms) -> Self {
        Self {
            sentence,
            multiword_terms: MultiwordTerms {
                high_confidence: term_names(detected.high_confidence.iter()),
                low_confidence: term_names(detected.low_confidence.iter()),
            },
            doc: parse.tokens.iter().map(DocToken::from).collect(),
            entities: parse.entity_texts(),
        }
    }
}

fn term_names<'a>(terms: impl Iterator<Item = &'a Term>) -> Vec<String> {
    terms
        .map(|term| term.text.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
