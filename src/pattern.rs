//! Structural patterns: a rooted tree of token constraints linked by
//! dependency or word-order relations.

use crate::dep::DependencyRelation;
use crate::pos::PartOfSpeech;
use crate::{Lemma, Token};
use std::fmt;

/// A single attribute a token must carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constraint {
    Lemma(Lemma),
    Pos(PartOfSpeech),
    Dep(DependencyRelation),
    /// Lower-cased surface form.
    LowerText(String),
}

impl Constraint {
    pub fn holds(&self, token: &Token) -> bool {
        match self {
            Constraint::Lemma(lemma) => token.lemma == *lemma,
            Constraint::Pos(pos) => token.pos == *pos,
            Constraint::Dep(dep) => token.dep == *dep,
            Constraint::LowerText(text) => token.text.text.to_lowercase() == *text,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Lemma(lemma) => write!(f, "LEMMA={}", lemma),
            Constraint::Pos(pos) => write!(f, "POS={}", pos),
            Constraint::Dep(dep) => write!(f, "DEP={}", dep),
            Constraint::LowerText(text) => write!(f, "LOWER={}", text),
        }
    }
}

/// How a node's token relates to the token matched by its parent node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Immediate dependent of the parent's token.
    DirectChild,
    /// Any token below the parent's token, at any depth.
    Descendant,
    /// Any token after the parent's token in the sentence.
    Follows,
    /// A later token with the same head as the parent's token.
    FollowingSibling,
}

impl Relation {
    /// Operator spelling used when logging patterns.
    pub fn operator(self) -> &'static str {
        match self {
            Relation::DirectChild => ">",
            Relation::Descendant => ">>",
            Relation::Follows => ".*",
            Relation::FollowingSibling => "$++",
        }
    }
}

/// Identifier of a node within one pattern. Only a [`PatternBuilder`] hands
/// these out, so every id refers to an existing node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternNode {
    pub constraints: Vec<Constraint>,
    /// `None` only for the root.
    pub parent: Option<(NodeId, Relation)>,
}

impl PatternNode {
    pub fn matches(&self, token: &Token) -> bool {
        self.constraints.iter().all(|constraint| constraint.holds(token))
    }
}

/// What the root node pins down, used to pick candidate patterns per token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnchorKey {
    Lemma(String),
    LowerText(String),
    Unconstrained,
}

/// A compiled pattern. Node 0 is the root and every other node's parent
/// comes before it, so nodes can be matched in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralPattern {
    nodes: Vec<PatternNode>,
}

impl StructuralPattern {
    pub fn single(constraints: Vec<Constraint>) -> Self {
        PatternBuilder::new(constraints).build()
    }

    pub fn root(&self) -> &PatternNode {
        &self.nodes[0]
    }

    pub fn nodes(&self) -> &[PatternNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn anchor_key(&self) -> AnchorKey {
        let constraints = &self.root().constraints;
        constraints
            .iter()
            .find_map(|constraint| match constraint {
                Constraint::Lemma(lemma) => Some(AnchorKey::Lemma(lemma.lemma.clone())),
                _ => None,
            })
            .or_else(|| {
                constraints.iter().find_map(|constraint| match constraint {
                    Constraint::LowerText(text) => Some(AnchorKey::LowerText(text.clone())),
                    _ => None,
                })
            })
            .unwrap_or(AnchorKey::Unconstrained)
    }
}

impl fmt::Display for StructuralPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, node) in self.nodes.iter().enumerate() {
            if idx > 0 {
                write!(f, "; ")?;
            }
            if let Some((parent, relation)) = node.parent {
                write!(f, "n{} {} ", parent.0, relation.operator())?;
            }
            let constraints: Vec<String> = node.constraints.iter().map(|c| c.to_string()).collect();
            write!(f, "n{}[{}]", idx, constraints.join(","))?;
        }
        Ok(())
    }
}

/// Grows a pattern one node at a time from its root.
#[derive(Debug, Clone)]
pub struct PatternBuilder {
    nodes: Vec<PatternNode>,
}

impl PatternBuilder {
    pub fn new(root_constraints: Vec<Constraint>) -> Self {
        Self {
            nodes: vec![PatternNode {
                constraints: root_constraints,
                parent: None,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn add(&mut self, parent: NodeId, relation: Relation, constraints: Vec<Constraint>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(PatternNode {
            constraints,
            parent: Some((parent, relation)),
        });
        id
    }

    pub fn build(self) -> StructuralPattern {
        StructuralPattern { nodes: self.nodes }
    }
}
