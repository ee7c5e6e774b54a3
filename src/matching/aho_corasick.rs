//! Aho-Corasick automaton over sequences of arbitrary hashable elements.
//!
//! Used with lemmas as the alphabet, so a sentence's lemma sequence is
//! scanned once for every vocabulary key.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

#[derive(Debug, Clone)]
struct TrieNode<T> {
    children: HashMap<T, usize>,
    /// Longest proper suffix of this node's path that is also a trie path.
    failure_link: usize,
    /// Patterns ending here, including those inherited via failure links.
    output: Vec<usize>,
}

impl<T> TrieNode<T> {
    fn new() -> Self {
        TrieNode {
            children: HashMap::new(),
            failure_link: 0,
            output: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AhoCorasick<T> {
    nodes: Vec<TrieNode<T>>,
    pattern_lengths: Vec<usize>,
}

/// One occurrence of a pattern: elements `start..end` of the searched
/// sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub pattern_index: usize,
    pub start: usize,
    pub end: usize,
}

impl<T> AhoCorasick<T>
where
    T: Eq + Hash + Clone,
{
    /// Patterns must be non-empty; empty ones never match.
    pub fn new<P: AsRef<[T]>>(patterns: &[P]) -> Self {
        let mut ac = AhoCorasick {
            nodes: vec![TrieNode::new()],
            pattern_lengths: patterns.iter().map(|p| p.as_ref().len()).collect(),
        };

        for (pattern_idx, pattern) in patterns.iter().enumerate() {
            let pattern = pattern.as_ref();
            if pattern.is_empty() {
                continue;
            }
            let end_node = ac.insert(pattern);
            ac.nodes[end_node].output.push(pattern_idx);
        }
        ac.build_failure_links();

        ac
    }

    fn insert(&mut self, pattern: &[T]) -> usize {
        let mut current = 0;
        for element in pattern {
            current = match self.nodes[current].children.get(element) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(TrieNode::new());
                    self.nodes[current].children.insert(element.clone(), child);
                    child
                }
            };
        }
        current
    }

    fn build_failure_links(&mut self) {
        let mut queue: VecDeque<usize> = self.nodes[0].children.values().copied().collect();

        while let Some(current) = queue.pop_front() {
            let children: Vec<(T, usize)> = self.nodes[current]
                .children
                .iter()
                .map(|(element, &child)| (element.clone(), child))
                .collect();

            for (element, child) in children {
                queue.push_back(child);

                let mut fallback = self.nodes[current].failure_link;
                let link = loop {
                    if let Some(&next) = self.nodes[fallback].children.get(&element) {
                        break next;
                    }
                    if fallback == 0 {
                        break 0;
                    }
                    fallback = self.nodes[fallback].failure_link;
                };

                self.nodes[child].failure_link = link;
                let inherited = self.nodes[link].output.clone();
                self.nodes[child].output.extend(inherited);
            }
        }
    }

    /// All occurrences of every pattern, overlapping ones included, ordered
    /// by end position.
    pub fn find_all(&self, sequence: &[T]) -> Vec<Match> {
        let mut current = 0;
        let mut matches = Vec::new();

        for (pos, element) in sequence.iter().enumerate() {
            loop {
                if let Some(&next) = self.nodes[current].children.get(element) {
                    current = next;
                    break;
                }
                if current == 0 {
                    break;
                }
                current = self.nodes[current].failure_link;
            }

            for &pattern_index in &self.nodes[current].output {
                let len = self.pattern_lengths[pattern_index];
                matches.push(Match {
                    pattern_index,
                    start: pos + 1 - len,
                    end: pos + 1,
                });
            }
        }

        matches
    }

    pub fn pattern_count(&self) -> usize {
        self.pattern_lengths.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_basic_char_matching() {
        let patterns = vec![chars("he"), chars("she"), chars("his"), chars("hers")];
        let ac = AhoCorasick::<char>::new(&patterns);

        let matches = ac.find_all(&chars("ushers"));

        assert_eq!(matches.len(), 3);
        assert!(matches.contains(&Match { pattern_index: 1, start: 1, end: 4 }));
        assert!(matches.contains(&Match { pattern_index: 0, start: 2, end: 4 }));
        assert!(matches.contains(&Match { pattern_index: 3, start: 2, end: 6 }));
    }

    #[test]
    fn test_overlapping_occurrences_of_one_pattern() {
        let ac = AhoCorasick::<char>::new(&[chars("aa"), chars("aaa")]);

        let matches = ac.find_all(&chars("aaa"));

        // "aa" at 0..2 and 1..3, "aaa" at 0..3
        assert_eq!(matches.len(), 3);
    }

    #[test]
    fn test_string_elements() {
        let patterns = vec![vec!["ne", "pas"], vec!["pas", "du", "tout"]];
        let ac = AhoCorasick::<&str>::new(&patterns);

        let sentence = ["je", "ne", "pas", "du", "tout"];
        let matches = ac.find_all(&sentence);

        assert_eq!(
            matches,
            vec![
                Match { pattern_index: 0, start: 1, end: 3 },
                Match { pattern_index: 1, start: 2, end: 5 },
            ]
        );
    }

    #[test]
    fn test_empty_pattern_set_and_empty_pattern() {
        let none: Vec<Vec<char>> = vec![];
        assert!(AhoCorasick::<char>::new(&none).find_all(&chars("abc")).is_empty());

        let with_empty = AhoCorasick::<char>::new(&[chars(""), chars("b")]);
        assert_eq!(with_empty.pattern_count(), 2);
        assert_eq!(
            with_empty.find_all(&chars("abc")),
            vec![Match { pattern_index: 1, start: 1, end: 2 }]
        );
    }
}
