//! The list of multiword terms to look for.

use anyhow::{Context, Result};
use std::path::Path;

/// Vocabulary terms in file order. Duplicates are kept; they collapse later
/// when terms are indexed by lemma sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermVocabulary {
    terms: Vec<String>,
}

impl TermVocabulary {
    /// Read one term per line, trimming surrounding whitespace and skipping
    /// blank lines.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read terms file {}", path.display()))?;
        Ok(Self::parse(&contents))
    }

    pub fn parse(contents: &str) -> Self {
        Self {
            terms: contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for TermVocabulary {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            terms: iter
                .into_iter()
                .map(Into::into)
                .map(|term: String| term.trim().to_string())
                .filter(|term| !term.is_empty())
                .collect(),
        }
    }
}
