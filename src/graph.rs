//! Index-based view of the dependency tree in a [`Tokenization`].

use crate::dep::DependencyRelation;
use crate::{Token, Tokenization};
use std::collections::{HashSet, VecDeque};

/// Heads and children of every token, resolved once.
///
/// Heads that are `0`, out of range or self-referencing, and tokens labelled
/// `root`, are all treated as sentence roots. Broken parses may still contain
/// cycles; every walk below carries a visited set.
#[derive(Debug, Clone)]
pub struct DependencyGraph<'a> {
    tokens: &'a [Token],
    heads: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
}

impl<'a> DependencyGraph<'a> {
    pub fn new(tokenization: &'a Tokenization) -> Self {
        let tokens = tokenization.tokens.as_slice();
        let heads: Vec<Option<usize>> = tokens
            .iter()
            .enumerate()
            .map(|(idx, token)| resolve_head(token, idx, tokens.len()))
            .collect();

        let mut children = vec![Vec::new(); tokens.len()];
        for (idx, head) in heads.iter().enumerate() {
            if let Some(head) = *head {
                children[head].push(idx);
            }
        }

        Self {
            tokens,
            heads,
            children,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn token(&self, idx: usize) -> &'a Token {
        &self.tokens[idx]
    }

    pub fn head(&self, idx: usize) -> Option<usize> {
        self.heads[idx]
    }

    /// Direct dependents, in sentence order.
    pub fn children(&self, idx: usize) -> &[usize] {
        &self.children[idx]
    }

    pub fn roots(&self) -> Vec<usize> {
        (0..self.len())
            .filter(|&idx| self.heads[idx].is_none())
            .collect()
    }

    /// Every token below `idx`, breadth first, excluding `idx` itself.
    pub fn descendants(&self, idx: usize) -> Vec<usize> {
        let mut seen = HashSet::from([idx]);
        let mut order = Vec::new();
        let mut queue = VecDeque::from([idx]);

        while let Some(current) = queue.pop_front() {
            for &child in &self.children[current] {
                if seen.insert(child) {
                    order.push(child);
                    queue.push_back(child);
                }
            }
        }

        order
    }

    /// `idx` and everything below it.
    pub fn subtree(&self, idx: usize) -> HashSet<usize> {
        let mut subtree: HashSet<usize> = self.descendants(idx).into_iter().collect();
        subtree.insert(idx);
        subtree
    }

    /// Whether `node` sits strictly below `ancestor`.
    pub fn is_descendant(&self, ancestor: usize, node: usize) -> bool {
        let mut visited = HashSet::new();
        let mut current = node;
        while let Some(head) = self.heads[current] {
            if head == ancestor {
                return true;
            }
            if !visited.insert(head) {
                return false;
            }
            current = head;
        }
        false
    }

    /// Tokens sharing `idx`'s head that come after it in the sentence.
    pub fn following_siblings(&self, idx: usize) -> &[usize] {
        let Some(head) = self.heads[idx] else {
            return &[];
        };
        let siblings = &self.children[head];
        let after = siblings.partition_point(|&sibling| sibling <= idx);
        &siblings[after..]
    }
}

fn resolve_head(token: &Token, idx: usize, len: usize) -> Option<usize> {
    if token.dep == DependencyRelation::Root || token.head <= 0 {
        return None;
    }
    let head = usize::try_from(token.head - 1).ok()?;
    (head != idx && head < len).then_some(head)
}
