use crate::annotator::Annotator;
use crate::compiler::{CompiledPatternSet, CompilerConfig, PatternCompiler};
use crate::graph::DependencyGraph;
use crate::vocabulary::TermVocabulary;
use crate::{Language, Tokenization};
use anyhow::Result;
use futures::StreamExt as _;
use std::collections::HashSet;
use std::fmt::Write as _;

/// A vocabulary term found in a sentence. Offsets count characters of the
/// reconstructed sentence text, `end` exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Term {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Terms found in one sentence, split by how they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectedTerms {
    /// Contiguous runs whose lemmas equal a term's lemmas.
    pub high_confidence: HashSet<Term>,
    /// Structural matches not already reported above, in discovery order.
    pub low_confidence: Vec<Term>,
}

/// Finds vocabulary terms in sentences using patterns compiled once up
/// front and an annotator for the sentences themselves.
pub struct MultiwordTermDetector<A> {
    annotator: A,
    patterns: CompiledPatternSet,
}

impl<A: Annotator> MultiwordTermDetector<A> {
    /// Compile `vocabulary` with `annotator`, then keep the annotator for
    /// scanning sentences.
    pub async fn new(
        vocabulary: &TermVocabulary,
        annotator: A,
        language: Language,
        config: CompilerConfig,
    ) -> Result<Self> {
        let patterns = PatternCompiler::new(language, config)
            .compile(vocabulary, &annotator)
            .await?;
        Ok(Self::from_patterns(annotator, patterns))
    }

    pub fn from_patterns(annotator: A, patterns: CompiledPatternSet) -> Self {
        Self {
            annotator,
            patterns,
        }
    }

    pub fn patterns(&self) -> &CompiledPatternSet {
        &self.patterns
    }

    pub fn language(&self) -> Language {
        self.patterns.language()
    }

    /// Run both matchers over an already annotated sentence.
    pub fn detect(&self, parse: &Tokenization) -> DetectedTerms {
        let spans = parse.char_spans();

        let mut high_confidence = HashSet::new();
        for found in self.patterns.lemma_matcher().find_all(parse) {
            let start = spans[found.start].0;
            let end = spans[found.end - 1].1;
            for text in found.terms {
                high_confidence.insert(Term {
                    text: text.clone(),
                    start,
                    end,
                });
            }
        }

        let graph = DependencyGraph::new(parse);
        let low_confidence = self
            .patterns
            .structural_matcher()
            .find_all(&graph)
            .into_iter()
            .filter_map(|found| {
                let (first, last) = found.token_range();
                let term = Term {
                    text: found.label.to_string(),
                    start: spans[first].0,
                    end: spans[last].1,
                };
                (!high_confidence.contains(&term)).then_some(term)
            })
            .collect();

        DetectedTerms {
            high_confidence,
            low_confidence,
        }
    }

    /// Annotate and scan one sentence. A blank sentence yields an empty
    /// analysis without calling the annotator.
    pub async fn find_multiword_terms(&self, sentence: &str) -> Result<(Tokenization, DetectedTerms)> {
        if sentence.trim().is_empty() {
            return Ok((Tokenization::default(), DetectedTerms::default()));
        }
        let parse = self.annotator.annotate(sentence, self.language()).await?;
        let detected = self.detect(&parse);
        Ok((parse, detected))
    }

    /// Scan many sentences with up to `concurrency` annotations in flight.
    /// Results come back in input order; one failure does not affect the
    /// others.
    pub async fn find_multiword_terms_batch(
        &self,
        sentences: &[String],
        concurrency: usize,
    ) -> Vec<Result<(Tokenization, DetectedTerms)>> {
        futures::stream::iter(sentences)
            .map(|sentence| self.find_multiword_terms(sentence))
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    /// One line per token: index, text, lemma, POS, dependency and head.
    pub async fn debug_parse(&self, text: &str) -> Result<String> {
        let parse = self.annotator.annotate(text, self.language()).await?;
        let mut out = format!("Parse of {text:?}:\n");
        for (idx, token) in parse.tokens.iter().enumerate() {
            writeln!(
                out,
                "  {idx}: {:?} (lemma: {:?}, pos: {}, dep: {}, head: {})",
                token.text.text, token.lemma.lemma, token.pos, token.dep, token.head
            )?;
        }
        Ok(out)
    }
}
