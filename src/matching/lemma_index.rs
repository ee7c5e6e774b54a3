use crate::matching::aho_corasick::AhoCorasick;
use crate::{Lemma, Tokenization};
use indexmap::{IndexMap, IndexSet};

/// Lemma sequences mapped to every vocabulary term that lemmatizes to them.
///
/// Inflectional variants ("ran fast", "run fast") share one key, and a match
/// on that key reports all of them.
#[derive(Debug, Clone, Default)]
pub struct LemmaSequenceIndex {
    entries: IndexMap<Vec<Lemma>, IndexSet<String>>,
}

impl LemmaSequenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `term` under `lemmas`. Empty sequences are rejected.
    pub fn insert(&mut self, lemmas: Vec<Lemma>, term: &str) -> bool {
        if lemmas.is_empty() {
            return false;
        }
        self.entries
            .entry(lemmas)
            .or_default()
            .insert(term.to_string());
        true
    }

    pub fn terms_for(&self, lemmas: &[Lemma]) -> Option<&IndexSet<String>> {
        self.entries.get(lemmas)
    }

    /// Number of distinct lemma sequences.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze the index into a matcher.
    pub fn into_matcher(self) -> LemmaMatcher {
        let keys: Vec<&[Lemma]> = self.entries.keys().map(Vec::as_slice).collect();
        LemmaMatcher {
            automaton: AhoCorasick::<Lemma>::new(&keys),
            index: self,
        }
    }
}

/// A contiguous run of tokens `start..end` whose lemmas equal an index key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LemmaMatch<'a> {
    pub start: usize,
    pub end: usize,
    pub terms: &'a IndexSet<String>,
}

/// Finds every index key inside a sentence's lemma sequence in one pass.
#[derive(Debug, Clone)]
pub struct LemmaMatcher {
    automaton: AhoCorasick<Lemma>,
    index: LemmaSequenceIndex,
}

impl LemmaMatcher {
    /// All occurrences, overlapping ones included.
    pub fn find_all(&self, tokenization: &Tokenization) -> Vec<LemmaMatch<'_>> {
        let lemmas = tokenization.lemmas();

        self.automaton
            .find_all(&lemmas)
            .into_iter()
            .filter_map(|m| {
                let (_, terms) = self.index.entries.get_index(m.pattern_index)?;
                Some(LemmaMatch {
                    start: m.start,
                    end: m.end,
                    terms,
                })
            })
            .collect()
    }

    pub fn index(&self) -> &LemmaSequenceIndex {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dep::DependencyRelation;
    use crate::pos::PartOfSpeech;
    use crate::test_support::{create_test_token, tokenization};

    fn lemmas(words: &[&str]) -> Vec<Lemma> {
        words.iter().map(|w| Lemma::new(*w)).collect()
    }

    /// "She ran fast and ran fast"
    fn ran_fast_twice() -> Tokenization {
        tokenization(vec![
            create_test_token("She", " ", PartOfSpeech::Pron, "she", DependencyRelation::Nsubj, 2),
            create_test_token("ran", " ", PartOfSpeech::Verb, "run", DependencyRelation::Root, 0),
            create_test_token("fast", " ", PartOfSpeech::Adv, "fast", DependencyRelation::Advmod, 2),
            create_test_token("and", " ", PartOfSpeech::Cconj, "and", DependencyRelation::Cc, 5),
            create_test_token("ran", " ", PartOfSpeech::Verb, "run", DependencyRelation::Conj, 2),
            create_test_token("fast", "", PartOfSpeech::Adv, "fast", DependencyRelation::Advmod, 5),
        ])
    }

    #[test]
    fn test_inflections_share_a_key() {
        let mut index = LemmaSequenceIndex::new();
        assert!(index.insert(lemmas(&["run", "fast"]), "ran fast"));
        assert!(index.insert(lemmas(&["run", "fast"]), "run fast"));
        assert!(index.insert(lemmas(&["run", "fast"]), "ran fast"));
        assert!(!index.insert(Vec::new(), ""));

        assert_eq!(index.len(), 1);
        let terms: Vec<&str> = index
            .terms_for(&lemmas(&["run", "fast"]))
            .unwrap()
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(terms, ["ran fast", "run fast"]);
    }

    #[test]
    fn test_matcher_reports_every_occurrence() {
        let mut index = LemmaSequenceIndex::new();
        index.insert(lemmas(&["run", "fast"]), "ran fast");
        index.insert(lemmas(&["run", "fast"]), "run fast");
        index.insert(lemmas(&["fast", "and"]), "fast and");
        let matcher = index.into_matcher();

        let matches = matcher.find_all(&ran_fast_twice());

        let spans: Vec<(usize, usize, usize)> =
            matches.iter().map(|m| (m.start, m.end, m.terms.len())).collect();
        assert_eq!(spans, vec![(1, 3, 2), (2, 4, 1), (4, 6, 2)]);
    }

    #[test]
    fn test_matcher_without_keys_finds_nothing() {
        let matcher = LemmaSequenceIndex::new().into_matcher();
        assert!(matcher.find_all(&ran_fast_twice()).is_empty());
        assert!(matcher.index().is_empty());
    }
}
