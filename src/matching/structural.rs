use crate::graph::DependencyGraph;
use crate::pattern::{AnchorKey, Relation, StructuralPattern};
use std::collections::HashMap;

/// One way of binding every node of a pattern to a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralMatch<'a> {
    pub pattern_index: usize,
    /// Name of the term that owns the pattern.
    pub label: &'a str,
    /// Token index bound to each pattern node, in node order.
    pub tokens: Vec<usize>,
}

impl StructuralMatch<'_> {
    /// First and last token index covered by the match.
    pub fn token_range(&self) -> (usize, usize) {
        let first = self.tokens.iter().copied().min().unwrap_or(0);
        let last = self.tokens.iter().copied().max().unwrap_or(0);
        (first, last)
    }
}

/// Searches dependency graphs for labelled structural patterns.
///
/// Patterns are indexed by what their root node requires (a lemma or a
/// lower-cased surface form), so each token is only tried against patterns
/// that could be anchored on it.
#[derive(Debug, Clone, Default)]
pub struct StructuralMatcher {
    patterns: Vec<(String, StructuralPattern)>,
    root_index: HashMap<AnchorKey, Vec<usize>>,
}

impl StructuralMatcher {
    pub fn new(patterns: Vec<(String, StructuralPattern)>) -> Self {
        let mut root_index: HashMap<AnchorKey, Vec<usize>> = HashMap::new();
        for (idx, (_, pattern)) in patterns.iter().enumerate() {
            root_index.entry(pattern.anchor_key()).or_default().push(idx);
        }

        Self {
            patterns,
            root_index,
        }
    }

    /// Every assignment of tokens to pattern nodes that satisfies a pattern,
    /// ordered by anchor token, then pattern. Distinct nodes always bind
    /// distinct tokens.
    pub fn find_all<'a>(&'a self, graph: &DependencyGraph<'_>) -> Vec<StructuralMatch<'a>> {
        let mut matches = Vec::new();

        for anchor in 0..graph.len() {
            let token = graph.token(anchor);
            let mut candidates: Vec<usize> = [
                AnchorKey::Lemma(token.lemma.lemma.clone()),
                AnchorKey::LowerText(token.text.text.to_lowercase()),
                AnchorKey::Unconstrained,
            ]
            .iter()
            .filter_map(|key| self.root_index.get(key))
            .flatten()
            .copied()
            .collect();
            candidates.sort_unstable();

            for pattern_index in candidates {
                let (label, pattern) = &self.patterns[pattern_index];
                if !pattern.root().matches(token) {
                    continue;
                }

                let mut assignment = vec![anchor];
                let mut found = Vec::new();
                extend_assignment(pattern, graph, &mut assignment, &mut found);
                matches.extend(found.into_iter().map(|tokens| StructuralMatch {
                    pattern_index,
                    label,
                    tokens,
                }));
            }
        }

        matches
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    pub fn patterns(&self) -> &[(String, StructuralPattern)] {
        &self.patterns
    }
}

/// Depth-first search over node bindings; nodes are bound in pattern order,
/// which guarantees a node's parent is bound first.
fn extend_assignment(
    pattern: &StructuralPattern,
    graph: &DependencyGraph<'_>,
    assignment: &mut Vec<usize>,
    found: &mut Vec<Vec<usize>>,
) {
    let Some(node) = pattern.nodes().get(assignment.len()) else {
        found.push(assignment.clone());
        return;
    };
    let Some((parent, relation)) = node.parent else {
        return;
    };
    let anchor = assignment[parent.index()];

    let candidates: Vec<usize> = match relation {
        Relation::DirectChild => graph.children(anchor).to_vec(),
        Relation::Descendant => graph.descendants(anchor),
        Relation::Follows => (anchor + 1..graph.len()).collect(),
        Relation::FollowingSibling => graph.following_siblings(anchor).to_vec(),
    };

    for candidate in candidates {
        if assignment.contains(&candidate) || !node.matches(graph.token(candidate)) {
            continue;
        }
        assignment.push(candidate);
        extend_assignment(pattern, graph, assignment, found);
        assignment.pop();
    }
}
