//! Compiles vocabulary terms into lemma-sequence keys and structural
//! patterns.
//!
//! Each term is annotated once, as if it were a short sentence. Its lemmas
//! become an exact-match key; its parse becomes a pattern rooted at the
//! term's content head, so the term can also be found when inflection, word
//! order or intervening material differ.

use crate::annotator::Annotator;
use crate::dep::DependencyRelation;
use crate::error::ConfigError;
use crate::graph::DependencyGraph;
use crate::matching::{LemmaMatcher, LemmaSequenceIndex, StructuralMatcher};
use crate::pattern::{Constraint, NodeId, PatternBuilder, Relation, StructuralPattern};
use crate::progress::progress_bar;
use crate::vocabulary::TermVocabulary;
use crate::{Language, LanguageProfile, Lemma, Token, Tokenization};
use anyhow::Result;
use futures::StreamExt as _;
use indexmap::IndexMap;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet, VecDeque};

/// Which attributes besides the lemma a structural node must match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttributeSelection {
    pub pos: bool,
    /// Never applied to the pattern root.
    pub dep: bool,
}

impl AttributeSelection {
    pub const LEMMA_ONLY: AttributeSelection = AttributeSelection {
        pos: false,
        dep: false,
    };

    pub const STRICT: AttributeSelection = AttributeSelection {
        pos: true,
        dep: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerConfig {
    pub attributes: AttributeSelection,
    /// How many terms are sent to the annotator at once.
    pub annotation_concurrency: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            attributes: AttributeSelection::LEMMA_ONLY,
            annotation_concurrency: 100,
        }
    }
}

pub struct PatternCompiler {
    language: Language,
    profile: LanguageProfile,
    config: CompilerConfig,
}

impl PatternCompiler {
    pub fn new(language: Language, config: CompilerConfig) -> Self {
        Self {
            language,
            profile: language.profile(),
            config,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Annotate every term and compile the results.
    ///
    /// Terms the annotator fails on are logged and left out. If it fails on
    /// all of them the annotator is considered unusable.
    pub async fn compile<A: Annotator>(
        &self,
        vocabulary: &TermVocabulary,
        annotator: &A,
    ) -> Result<CompiledPatternSet> {
        let terms = vocabulary.terms();
        info!(
            "Compiling patterns for {} {} terms",
            terms.len(),
            self.language
        );

        let pb = progress_bar(terms.len() as u64, "terms")?;
        let mut parses = futures::stream::iter(terms)
            .map(|term| {
                let pb = pb.clone();
                async move {
                    let parse = annotator.annotate(term, self.language).await;
                    pb.inc(1);
                    (term, parse)
                }
            })
            .buffered(self.config.annotation_concurrency.max(1));

        let mut builder = CompiledPatternSetBuilder::new(self.language);
        let mut failed = 0;
        let mut last_error = None;
        while let Some((term, parse)) = parses.next().await {
            match parse {
                Ok(parse) => self.add_term(&mut builder, term, &parse),
                Err(e) => {
                    warn!("Failed to annotate term {term:?}: {e:#}");
                    failed += 1;
                    last_error = Some(e);
                }
            }
        }
        pb.finish_and_clear();

        if let Some(e) = last_error {
            if failed == terms.len() {
                return Err(ConfigError::AnnotatorUnavailable {
                    attempted: failed,
                    reason: format!("{e:#}"),
                }
                .into());
            }
        }

        let patterns = builder.build();
        patterns.log_stats();
        Ok(patterns)
    }

    /// Compile terms whose parses are already known.
    pub fn compile_parsed<'a>(
        &self,
        parsed: impl IntoIterator<Item = (&'a str, &'a Tokenization)>,
    ) -> CompiledPatternSet {
        let mut builder = CompiledPatternSetBuilder::new(self.language);
        for (term, parse) in parsed {
            self.add_term(&mut builder, term, parse);
        }
        builder.build()
    }

    fn add_term(&self, builder: &mut CompiledPatternSetBuilder, term: &str, parse: &Tokenization) {
        builder.add_lemma_sequence(term, parse.lemmas());
        if let Some(pattern) = self.structural_pattern(term, parse) {
            debug!("Pattern for {term:?}: {pattern}");
            builder.add_structural_pattern(term, pattern);
        }
    }

    /// Derive the structural pattern for one term from its own parse.
    /// Returns `None` when the parse is not trustworthy enough to generalize.
    pub fn structural_pattern(&self, term: &str, parse: &Tokenization) -> Option<StructuralPattern> {
        match parse.tokens.as_slice() {
            [] => return None,
            [token] => {
                return Some(StructuralPattern::single(vec![Constraint::LowerText(
                    token.text.text.to_lowercase(),
                )]));
            }
            _ => {}
        }

        if let Some(pattern) = self.split_negation_pattern(parse) {
            return Some(pattern);
        }

        let graph = DependencyGraph::new(parse);
        let roots = graph.roots();
        if roots.len() > 1 {
            debug!("No structural pattern for {term:?}: {} roots", roots.len());
            return None;
        }
        if is_hyphen_fragment(parse) {
            debug!("No structural pattern for hyphenated fragment {term:?}");
            return None;
        }

        if let Some(pattern) = self.copular_idiom_pattern(term) {
            return Some(pattern);
        }

        let &[root] = roots.as_slice() else {
            debug!("No structural pattern for {term:?}: parse has no root");
            return None;
        };
        Some(self.clause_pattern(term, &graph, root))
    }

    /// "ne ... jamais": the particle followed, anywhere later in the
    /// sentence, by the first word of a known complement.
    fn split_negation_pattern(&self, parse: &Tokenization) -> Option<StructuralPattern> {
        let negation = self.profile.split_negation?;
        let (first, rest) = parse.tokens.split_first()?;
        if first.lemma.lemma != negation.particle {
            return None;
        }
        let rest_lemmas: Vec<&str> = rest.iter().map(|token| token.lemma.lemma.as_str()).collect();
        if !negation.is_complement(&rest_lemmas) {
            return None;
        }

        let mut builder = PatternBuilder::new(vec![Constraint::Lemma(first.lemma.clone())]);
        let root = builder.root();
        builder.add(
            root,
            Relation::Follows,
            vec![Constraint::Lemma(rest[0].lemma.clone())],
        );
        Some(builder.build())
    }

    fn copular_idiom_pattern(&self, term: &str) -> Option<StructuralPattern> {
        let surface = term.trim().replace('\u{2019}', "'").to_lowercase();
        let idiom = self
            .profile
            .copular_idioms
            .iter()
            .find(|idiom| idiom.surface == surface)?;

        // The pronoun and the copula both hang off the predicate.
        let mut builder =
            PatternBuilder::new(vec![Constraint::Lemma(Lemma::new(idiom.pronoun_lemma))]);
        let root = builder.root();
        builder.add(
            root,
            Relation::FollowingSibling,
            vec![
                Constraint::Dep(DependencyRelation::Cop),
                Constraint::Lemma(Lemma::new(idiom.copula_lemma)),
            ],
        );
        Some(builder.build())
    }

    /// Pattern over the subtree of the term's content head.
    fn clause_pattern(&self, term: &str, graph: &DependencyGraph<'_>, root: usize) -> StructuralPattern {
        let anchor = find_anchor(graph, root);

        let mut builder = PatternBuilder::new(self.root_constraints(graph.token(anchor)));
        let mut nodes: HashMap<usize, NodeId> = HashMap::from([(anchor, builder.root())]);
        let mut queue = VecDeque::from([anchor]);

        while let Some(parent) = queue.pop_front() {
            for &child in graph.children(parent) {
                if nodes.contains_key(&child) {
                    continue;
                }
                let token = graph.token(child);
                let id = builder.add(
                    nodes[&parent],
                    Relation::DirectChild,
                    self.node_constraints(token),
                );
                nodes.insert(child, id);
                queue.push_back(child);
            }
        }

        // Function words the parser attached above the anchor cannot be
        // reached from it.
        for idx in 0..graph.len() {
            let token = graph.token(idx);
            if !nodes.contains_key(&idx) && token.dep.is_always_included() {
                debug!(
                    "Dropping {} {:?} outside the subtree of {:?} in {term:?}",
                    token.dep,
                    token.text.text,
                    graph.token(anchor).text.text
                );
            }
        }

        builder.build()
    }

    fn root_constraints(&self, token: &Token) -> Vec<Constraint> {
        let mut constraints = vec![Constraint::Lemma(token.lemma.clone())];
        if self.config.attributes.pos {
            constraints.push(Constraint::Pos(token.pos));
        }
        constraints
    }

    fn node_constraints(&self, token: &Token) -> Vec<Constraint> {
        let mut constraints = self.root_constraints(token);
        if self.config.attributes.dep {
            constraints.push(Constraint::Dep(token.dep));
        }
        constraints
    }
}

fn is_weak(token: &Token) -> bool {
    token.dep.is_weak() || token.pos.is_weak()
}

/// Move from the parse root to the token that best represents the term:
/// up past function words, then down out of an artificial function-word
/// root whose dependents are all function words too.
fn find_anchor(graph: &DependencyGraph<'_>, root: usize) -> usize {
    let mut anchor = root;
    let mut visited = HashSet::from([root]);
    while is_weak(graph.token(anchor)) {
        match graph.head(anchor) {
            Some(head) if visited.insert(head) => anchor = head,
            _ => break,
        }
    }

    let children = graph.children(anchor);
    if graph.token(anchor).pos.is_weak()
        && children.iter().all(|&child| graph.token(child).dep.is_weak())
    {
        if let Some(&content) = children
            .iter()
            .find(|&&child| !graph.token(child).pos.is_weak())
        {
            anchor = content;
        }
    }

    anchor
}

/// Two or three tokens with a hyphen-led second token ("peut-être" split as
/// "peut", "-être").
fn is_hyphen_fragment(parse: &Tokenization) -> bool {
    (2..=3).contains(&parse.tokens.len()) && parse.tokens[1].text.text.starts_with('-')
}

/// Accumulates lemma keys and structural patterns while terms are compiled.
#[derive(Debug)]
pub struct CompiledPatternSetBuilder {
    language: Language,
    term_count: usize,
    index: LemmaSequenceIndex,
    patterns: IndexMap<String, StructuralPattern>,
}

impl CompiledPatternSetBuilder {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            term_count: 0,
            index: LemmaSequenceIndex::new(),
            patterns: IndexMap::new(),
        }
    }

    pub fn add_lemma_sequence(&mut self, term: &str, lemmas: Vec<Lemma>) {
        self.term_count += 1;
        self.index.insert(lemmas, term);
    }

    /// The first pattern registered for a term name is kept.
    pub fn add_structural_pattern(&mut self, term: &str, pattern: StructuralPattern) {
        self.patterns.entry(term.to_string()).or_insert(pattern);
    }

    pub fn build(self) -> CompiledPatternSet {
        CompiledPatternSet {
            language: self.language,
            term_count: self.term_count,
            lemma_matcher: self.index.into_matcher(),
            structural_matcher: StructuralMatcher::new(self.patterns.into_iter().collect()),
        }
    }
}

/// Immutable result of compiling a vocabulary; shared read-only by every
/// matching call.
#[derive(Debug, Clone)]
pub struct CompiledPatternSet {
    language: Language,
    term_count: usize,
    lemma_matcher: LemmaMatcher,
    structural_matcher: StructuralMatcher,
}

impl CompiledPatternSet {
    pub fn language(&self) -> Language {
        self.language
    }

    /// Terms that were successfully annotated and compiled.
    pub fn term_count(&self) -> usize {
        self.term_count
    }

    pub fn lemma_key_count(&self) -> usize {
        self.lemma_matcher.index().len()
    }

    pub fn structural_pattern_count(&self) -> usize {
        self.structural_matcher.pattern_count()
    }

    pub fn lemma_matcher(&self) -> &LemmaMatcher {
        &self.lemma_matcher
    }

    pub fn structural_matcher(&self) -> &StructuralMatcher {
        &self.structural_matcher
    }

    pub fn log_stats(&self) {
        info!(
            "Compiled {} terms into {} lemma sequences and {} structural patterns",
            self.term_count,
            self.lemma_key_count(),
            self.structural_pattern_count()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pos::PartOfSpeech;
    use crate::test_support::{create_test_token, tokenization};
    use crate::PreannotatedCorpus;

    fn french() -> PatternCompiler {
        PatternCompiler::new(Language::French, CompilerConfig::default())
    }

    fn node_summary(pattern: &StructuralPattern) -> Vec<(Option<(usize, Relation)>, String)> {
        pattern
            .nodes()
            .iter()
            .map(|node| {
                let constraints: Vec<String> =
                    node.constraints.iter().map(|c| c.to_string()).collect();
                (
                    node.parent.map(|(parent, relation)| (parent.index(), relation)),
                    constraints.join(","),
                )
            })
            .collect()
    }

    /// "kick the bucket"
    fn kick_the_bucket() -> Tokenization {
        tokenization(vec![
            create_test_token("kick", " ", PartOfSpeech::Verb, "kick", DependencyRelation::Root, 0),
            create_test_token("the", " ", PartOfSpeech::Det, "the", DependencyRelation::Det, 3),
            create_test_token("bucket", "", PartOfSpeech::Noun, "bucket", DependencyRelation::Obj, 1),
        ])
    }

    #[test]
    fn test_single_token_matches_surface_form() {
        let parse = tokenization(vec![create_test_token(
            "Bonjour",
            "",
            PartOfSpeech::Intj,
            "bonjour",
            DependencyRelation::Root,
            0,
        )]);

        let pattern = french().structural_pattern("Bonjour", &parse).unwrap();
        assert_eq!(pattern.to_string(), "n0[LOWER=bonjour]");
    }

    #[test]
    fn test_empty_parse_has_no_pattern() {
        assert!(french().structural_pattern("", &Tokenization::default()).is_none());
    }

    #[test]
    fn test_split_negation() {
        let parse = tokenization(vec![
            create_test_token("ne", " ", PartOfSpeech::Adv, "ne", DependencyRelation::Advmod, 2),
            create_test_token("jamais", "", PartOfSpeech::Adv, "jamais", DependencyRelation::Root, 0),
        ]);

        let pattern = french().structural_pattern("ne jamais", &parse).unwrap();
        assert_eq!(pattern.to_string(), "n0[LEMMA=ne]; n0 .* n1[LEMMA=jamais]");

        // Only French carries the override.
        let english = PatternCompiler::new(Language::English, CompilerConfig::default());
        let generic = english.structural_pattern("ne jamais", &parse).unwrap();
        assert_eq!(generic.root().constraints, vec![Constraint::Lemma(Lemma::new("jamais"))]);
    }

    #[test]
    fn test_split_negation_with_two_word_complement() {
        let parse = tokenization(vec![
            create_test_token("ne", " ", PartOfSpeech::Adv, "ne", DependencyRelation::Advmod, 3),
            create_test_token("nulle", " ", PartOfSpeech::Det, "nul", DependencyRelation::Det, 3),
            create_test_token("part", "", PartOfSpeech::Noun, "part", DependencyRelation::Root, 0),
        ]);
        // "nulle" lemmatized as "nul" is not a listed complement
        let generic = french().structural_pattern("ne nulle part", &parse).unwrap();
        assert_eq!(generic.root().constraints, vec![Constraint::Lemma(Lemma::new("part"))]);

        let parse = tokenization(vec![
            create_test_token("ne", " ", PartOfSpeech::Adv, "ne", DependencyRelation::Advmod, 3),
            create_test_token("nulle", " ", PartOfSpeech::Det, "nulle", DependencyRelation::Det, 3),
            create_test_token("part", "", PartOfSpeech::Noun, "part", DependencyRelation::Root, 0),
        ]);
        let pattern = french().structural_pattern("ne nulle part", &parse).unwrap();
        assert_eq!(pattern.to_string(), "n0[LEMMA=ne]; n0 .* n1[LEMMA=nulle]");
    }

    #[test]
    fn test_multiple_roots_decline() {
        let parse = tokenization(vec![
            create_test_token("oui", " ", PartOfSpeech::Intj, "oui", DependencyRelation::Root, 0),
            create_test_token("non", "", PartOfSpeech::Intj, "non", DependencyRelation::Root, 0),
        ]);
        assert!(french().structural_pattern("oui non", &parse).is_none());
    }

    #[test]
    fn test_hyphen_fragments_decline() {
        let two = tokenization(vec![
            create_test_token("peut", "", PartOfSpeech::Verb, "pouvoir", DependencyRelation::Root, 0),
            create_test_token("-être", "", PartOfSpeech::Aux, "être", DependencyRelation::Aux, 1),
        ]);
        assert!(french().structural_pattern("peut-être", &two).is_none());

        let three = tokenization(vec![
            create_test_token("après", "", PartOfSpeech::Adv, "après", DependencyRelation::Root, 0),
            create_test_token("-", "", PartOfSpeech::Punct, "-", DependencyRelation::Punct, 1),
            create_test_token("midi", "", PartOfSpeech::Noun, "midi", DependencyRelation::Compound, 1),
        ]);
        assert!(french().structural_pattern("après-midi", &three).is_none());
    }

    #[test]
    fn test_copular_idiom() {
        let parse = tokenization(vec![
            create_test_token("c'", "", PartOfSpeech::Pron, "ce", DependencyRelation::Nsubj, 2),
            create_test_token("est", "", PartOfSpeech::Aux, "être", DependencyRelation::Root, 0),
        ]);

        let pattern = french().structural_pattern("c'est", &parse).unwrap();
        assert_eq!(pattern.to_string(), "n0[LEMMA=ce]; n0 $++ n1[DEP=cop,LEMMA=être]");

        let curly = french().structural_pattern("C\u{2019}est", &parse).unwrap();
        assert_eq!(curly, pattern);
    }

    #[test]
    fn test_clause_pattern_is_rooted_at_content_head() {
        let pattern = french().structural_pattern("kick the bucket", &kick_the_bucket()).unwrap();

        assert_eq!(
            node_summary(&pattern),
            vec![
                (None, "LEMMA=kick".to_string()),
                (Some((0, Relation::DirectChild)), "LEMMA=bucket".to_string()),
                (Some((1, Relation::DirectChild)), "LEMMA=the".to_string()),
            ]
        );
    }

    #[test]
    fn test_strict_attributes_skip_root_dependency() {
        let strict = PatternCompiler::new(
            Language::English,
            CompilerConfig {
                attributes: AttributeSelection::STRICT,
                ..CompilerConfig::default()
            },
        );
        let pattern = strict.structural_pattern("kick the bucket", &kick_the_bucket()).unwrap();

        assert_eq!(
            node_summary(&pattern),
            vec![
                (None, "LEMMA=kick,POS=VERB".to_string()),
                (Some((0, Relation::DirectChild)), "LEMMA=bucket,POS=NOUN,DEP=obj".to_string()),
                (Some((1, Relation::DirectChild)), "LEMMA=the,POS=DET,DEP=det".to_string()),
            ]
        );
    }

    #[test]
    fn test_weak_root_is_demoted_to_content_child() {
        // "au lieu" parsed with the preposition as root
        let parse = tokenization(vec![
            create_test_token("au", " ", PartOfSpeech::Adp, "à", DependencyRelation::Root, 0),
            create_test_token("lieu", "", PartOfSpeech::Noun, "lieu", DependencyRelation::Det, 1),
        ]);

        let pattern = french().structural_pattern("au lieu", &parse).unwrap();
        assert_eq!(pattern.to_string(), "n0[LEMMA=lieu]");
    }

    #[test]
    fn test_always_included_token_above_anchor_is_dropped() {
        // The anchor moves down from "à" to "manger"; the case marker
        // hanging off "à" is no longer reachable and is left out.
        let parse = tokenization(vec![
            create_test_token("à", " ", PartOfSpeech::Adp, "à", DependencyRelation::Root, 0),
            create_test_token("manger", " ", PartOfSpeech::Verb, "manger", DependencyRelation::Mark, 1),
            create_test_token("de", "", PartOfSpeech::Adp, "de", DependencyRelation::Case, 1),
        ]);

        let pattern = french().structural_pattern("à manger de", &parse).unwrap();
        assert_eq!(pattern.to_string(), "n0[LEMMA=manger]");
    }

    #[test]
    fn test_grandchildren_hang_off_their_own_head() {
        let parse = tokenization(vec![
            create_test_token("avoir", " ", PartOfSpeech::Verb, "avoir", DependencyRelation::Root, 0),
            create_test_token("besoin", " ", PartOfSpeech::Noun, "besoin", DependencyRelation::Obj, 1),
            create_test_token("de", "", PartOfSpeech::Adp, "de", DependencyRelation::Case, 2),
        ]);

        let pattern = french().structural_pattern("avoir besoin de", &parse).unwrap();
        assert_eq!(
            pattern.to_string(),
            "n0[LEMMA=avoir]; n0 > n1[LEMMA=besoin]; n1 > n2[LEMMA=de]"
        );
    }

    #[test]
    fn test_weak_root_without_content_child_stays() {
        let parse = tokenization(vec![
            create_test_token("de", " ", PartOfSpeech::Adp, "de", DependencyRelation::Root, 0),
            create_test_token("rien", "", PartOfSpeech::Pron, "rien", DependencyRelation::Case, 1),
        ]);

        let pattern = french().structural_pattern("de rien", &parse).unwrap();
        assert_eq!(pattern.to_string(), "n0[LEMMA=de]; n0 > n1[LEMMA=rien]");
    }

    #[test]
    fn test_weak_tokens_promote_anchor() {
        // A cyclic head pair must not loop forever.
        let parse = tokenization(vec![
            create_test_token("le", " ", PartOfSpeech::Det, "le", DependencyRelation::Det, 2),
            create_test_token("la", "", PartOfSpeech::Det, "la", DependencyRelation::Det, 1),
        ]);
        assert!(french().structural_pattern("le la", &parse).is_none());

        let parse = kick_the_bucket();
        let graph = DependencyGraph::new(&parse);
        assert_eq!(find_anchor(&graph, 1), 2);
    }

    #[test]
    fn test_compile_parsed_collapses_inflections() {
        let ran = tokenization(vec![
            create_test_token("ran", " ", PartOfSpeech::Verb, "run", DependencyRelation::Root, 0),
            create_test_token("fast", "", PartOfSpeech::Adv, "fast", DependencyRelation::Advmod, 1),
        ]);
        let run = tokenization(vec![
            create_test_token("run", " ", PartOfSpeech::Verb, "run", DependencyRelation::Root, 0),
            create_test_token("fast", "", PartOfSpeech::Adv, "fast", DependencyRelation::Advmod, 1),
        ]);

        let compiler = PatternCompiler::new(Language::English, CompilerConfig::default());
        let set = compiler.compile_parsed([("ran fast", &ran), ("run fast", &run)]);

        assert_eq!(set.term_count(), 2);
        assert_eq!(set.lemma_key_count(), 1);
        assert_eq!(set.structural_pattern_count(), 2);
        assert_eq!(set.language(), Language::English);
    }

    #[tokio::test]
    async fn test_compile_skips_failed_terms() {
        let corpus = PreannotatedCorpus::from_tokenizations([(
            "kick the bucket".to_string(),
            kick_the_bucket(),
        )]);
        let vocabulary: TermVocabulary = ["kick the bucket", "spill the beans"].into_iter().collect();

        let compiler = PatternCompiler::new(Language::English, CompilerConfig::default());
        let set = compiler.compile(&vocabulary, &corpus).await.unwrap();

        assert_eq!(set.term_count(), 1);
        assert_eq!(set.structural_pattern_count(), 1);
    }

    #[tokio::test]
    async fn test_compile_fails_when_every_term_fails() {
        let corpus = PreannotatedCorpus::default();
        let vocabulary: TermVocabulary = ["kick the bucket"].into_iter().collect();

        let compiler = PatternCompiler::new(Language::English, CompilerConfig::default());
        let err = compiler.compile(&vocabulary, &corpus).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::AnnotatorUnavailable { attempted: 1, .. })
        ));
    }
}
