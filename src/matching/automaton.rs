//! Aho-Corasick automaton over a [`Trie`].
//!
//! Failure links are computed once, breadth-first, when the automaton is
//! built. The automaton is immutable afterwards; a changed keyword set means
//! building a new one.

use super::trie::{NodeId, Trie};
use crate::Result;
use std::collections::VecDeque;
use std::iter::Enumerate;
use std::str::Chars;

/// A compiled multi-pattern matcher.
#[derive(Debug, Clone)]
pub struct Automaton<V> {
    trie: Trie<V>,
}

impl<V> Default for Automaton<V> {
    fn default() -> Self {
        Self::build(Trie::new())
    }
}

impl<V> Automaton<V> {
    /// Compiles failure links over `trie`.
    ///
    /// Nodes are visited breadth-first so every parent's link is final
    /// before its children are linked.
    #[must_use]
    pub fn build(mut trie: Trie<V>) -> Self {
        let mut queue = VecDeque::new();
        trie.set_fail(NodeId::ROOT, NodeId::ROOT);

        let depth_one: Vec<NodeId> = trie.children(NodeId::ROOT).map(|(_, n)| n).collect();
        for node in depth_one {
            trie.set_fail(node, NodeId::ROOT);
            queue.push_back(node);
        }

        while let Some(parent) = queue.pop_front() {
            let children: Vec<(char, NodeId)> = trie.children(parent).collect();
            for (c, node) in children {
                let mut candidate = trie.fail(parent);
                let link = loop {
                    if let Some(next) = trie.child(candidate, c) {
                        break next;
                    }
                    if candidate == NodeId::ROOT {
                        break NodeId::ROOT;
                    }
                    candidate = trie.fail(candidate);
                };
                trie.set_fail(node, link);
                queue.push_back(node);
            }
        }

        Self { trie }
    }

    /// Inserts every `(text, payload)` pair into a fresh trie and compiles it.
    ///
    /// # Errors
    ///
    /// Returns an error if any text is empty.
    pub fn from_entries<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, V)>,
        S: AsRef<str>,
    {
        let mut trie = Trie::new();
        for (text, payload) in entries {
            trie.insert(text.as_ref(), payload)?;
        }
        Ok(Self::build(trie))
    }

    /// Lazily yields `(end_index, payload)` for each character position whose
    /// automaton state carries a payload.
    ///
    /// `end_index` is the character index of the last character of the
    /// match. Only the current state's payload is reported; a shorter entry
    /// that is a proper suffix of the current state is not. Use
    /// [`Self::find_all_exhaustive`] to report those too.
    #[must_use]
    pub fn find_all<'a>(&'a self, text: &'a str) -> Matches<'a, V> {
        Matches::new(self, text, false)
    }

    /// Like [`Self::find_all`], but also follows the failure chain at each
    /// position and yields every payload on it, longest first.
    #[must_use]
    pub fn find_all_exhaustive<'a>(&'a self, text: &'a str) -> Matches<'a, V> {
        Matches::new(self, text, true)
    }

    /// Returns the underlying trie.
    #[must_use]
    pub const fn trie(&self) -> &Trie<V> {
        &self.trie
    }

    /// Number of strings the automaton matches.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.trie.len()
    }

    /// Returns `true` if the automaton matches nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.trie.is_empty()
    }

    fn step(&self, mut state: NodeId, c: char) -> NodeId {
        loop {
            if let Some(next) = self.trie.child(state, c) {
                return next;
            }
            if state == NodeId::ROOT {
                return NodeId::ROOT;
            }
            state = self.trie.fail(state);
        }
    }
}

/// Iterator returned by [`Automaton::find_all`].
///
/// Single pass; restarting requires a new scan.
pub struct Matches<'a, V> {
    automaton: &'a Automaton<V>,
    chars: Enumerate<Chars<'a>>,
    state: NodeId,
    exhaustive: bool,
    pending: Option<(usize, NodeId)>,
}

impl<'a, V> Matches<'a, V> {
    fn new(automaton: &'a Automaton<V>, text: &'a str, exhaustive: bool) -> Self {
        Self {
            automaton,
            chars: text.chars().enumerate(),
            state: NodeId::ROOT,
            exhaustive,
            pending: None,
        }
    }

    /// Walks the failure chain from `node`, stopping at the first payload.
    fn next_on_chain(&mut self, index: usize, mut node: NodeId) -> Option<(usize, &'a V)> {
        let automaton = self.automaton;
        let trie = &automaton.trie;
        while node != NodeId::ROOT {
            let next = trie.fail(node);
            if let Some(payload) = trie.payload(node) {
                self.pending = (next != NodeId::ROOT).then_some((index, next));
                return Some((index, payload));
            }
            node = next;
        }
        None
    }
}

impl<'a, V> Iterator for Matches<'a, V> {
    type Item = (usize, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((index, node)) = self.pending.take() {
                if let Some(hit) = self.next_on_chain(index, node) {
                    return Some(hit);
                }
                continue;
            }

            let automaton = self.automaton;
            let (index, c) = self.chars.next()?;
            self.state = automaton.step(self.state, c);

            if self.exhaustive {
                self.pending = Some((index, self.state));
                continue;
            }
            if let Some(payload) = automaton.trie.payload(self.state) {
                return Some((index, payload));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classic() -> Automaton<&'static str> {
        Automaton::from_entries(["he", "she", "his", "hers"].map(|k| (k, k))).unwrap()
    }

    #[test]
    fn test_failure_links() {
        let automaton = classic();
        let trie = automaton.trie();
        let node = |s: &str| trie.find(s).unwrap();

        assert_eq!(trie.fail(NodeId::ROOT), NodeId::ROOT);
        assert_eq!(trie.fail(node("h")), NodeId::ROOT);
        assert_eq!(trie.fail(node("s")), NodeId::ROOT);
        assert_eq!(trie.fail(node("sh")), node("h"));
        assert_eq!(trie.fail(node("she")), node("he"));
        assert_eq!(trie.fail(node("hi")), NodeId::ROOT);
        assert_eq!(trie.fail(node("his")), node("s"));
        assert_eq!(trie.fail(node("hers")), node("s"));
    }

    #[test]
    fn test_ushers_reports_current_state_only() {
        let automaton = classic();
        let hits: Vec<(usize, &str)> = automaton.find_all("ushers").map(|(i, v)| (i, *v)).collect();
        assert_eq!(hits, vec![(3, "she"), (5, "hers")]);
    }

    #[test]
    fn test_ushers_exhaustive_reports_suffixes() {
        let automaton = classic();
        let hits: Vec<(usize, &str)> = automaton
            .find_all_exhaustive("ushers")
            .map(|(i, v)| (i, *v))
            .collect();
        assert_eq!(hits, vec![(3, "she"), (3, "he"), (5, "hers")]);
    }

    #[test]
    fn test_end_index_is_rightmost_char() {
        let automaton = Automaton::from_entries([("cat", ())]).unwrap();
        let hits: Vec<usize> = automaton.find_all("a cat and a cat").map(|(i, _)| i).collect();
        assert_eq!(hits, vec![4, 14]);
    }

    #[test]
    fn test_overlapping_matches() {
        let automaton = Automaton::from_entries([("aa", ())]).unwrap();
        let hits: Vec<usize> = automaton.find_all("aaaa").map(|(i, _)| i).collect();
        assert_eq!(hits, vec![1, 2, 3]);
    }

    #[test]
    fn test_indices_count_chars_not_bytes() {
        let automaton = Automaton::from_entries([("café", ())]).unwrap();
        let hits: Vec<usize> = automaton.find_all("é café").map(|(i, _)| i).collect();
        assert_eq!(hits, vec![5]);
    }

    #[test]
    fn test_empty_text_and_empty_automaton() {
        let automaton = classic();
        assert_eq!(automaton.find_all("").count(), 0);

        let empty: Automaton<()> = Automaton::default();
        assert!(empty.is_empty());
        assert_eq!(empty.find_all("anything at all").count(), 0);
        assert_eq!(empty.find_all_exhaustive("anything").count(), 0);
    }

    #[test]
    fn test_scan_recovers_after_mismatch() {
        let automaton = Automaton::from_entries([("abcd", 1), ("bcx", 2)]).unwrap();
        let hits: Vec<(usize, i32)> = automaton.find_all("abcx").map(|(i, v)| (i, *v)).collect();
        assert_eq!(hits, vec![(3, 2)]);
    }
}
