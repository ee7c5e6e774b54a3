//! Pattern matching on tokenizations.
//!
//! Two matchers run over every sentence: a lemma-sequence matcher for exact
//! contiguous occurrences, and a structural matcher that walks the dependency
//! tree for discontinuous ones.

mod aho_corasick;
mod lemma_index;
mod structural;

pub use aho_corasick::{AhoCorasick, Match};
pub use lemma_index::{LemmaMatch, LemmaMatcher, LemmaSequenceIndex};
pub use structural::{StructuralMatch, StructuralMatcher};
