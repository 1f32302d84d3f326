//! Property-based tests for the matcher and the registry.
//!
//! Uses proptest to verify invariants across random inputs:
//! - Deleting every inserted string leaves only the root
//! - Exhaustive search finds exactly the occurrences a naive scan finds
//! - Plain search never reports a hit the exhaustive search misses
//! - Rebuilding is independent of insertion order
//! - Case folding preserves character positions

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;
use std::collections::BTreeSet;
use watchbot::matching::{Automaton, Trie, fold_text};
use watchbot::models::UserId;
use watchbot::services::{NotificationRouter, WatchRegistry};

/// Every `(end_index, keyword)` occurrence, by brute force.
fn naive_occurrences(text: &str, keywords: &BTreeSet<String>) -> BTreeSet<(usize, String)> {
    let chars: Vec<char> = text.chars().collect();
    let mut found = BTreeSet::new();
    for keyword in keywords {
        let needle: Vec<char> = keyword.chars().collect();
        if needle.is_empty() || needle.len() > chars.len() {
            continue;
        }
        for start in 0..=chars.len() - needle.len() {
            if chars[start..start + needle.len()] == needle[..] {
                found.insert((start + needle.len() - 1, keyword.clone()));
            }
        }
    }
    found
}

fn keyword_set() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("[abc]{1,4}", 1..8)
}

// ============================================================================
// Trie
// ============================================================================

proptest! {
    /// Property: inserting then deleting every string leaves only the root.
    #[test]
    fn prop_delete_all_leaves_root(words in prop::collection::vec("[a-d]{1,6}", 1..20)) {
        let mut trie = Trie::new();
        for (i, word) in words.iter().enumerate() {
            trie.insert(word, i).unwrap();
        }
        let unique: BTreeSet<&String> = words.iter().collect();
        prop_assert_eq!(trie.len(), unique.len());

        for word in &unique {
            trie.delete(word).unwrap();
        }
        prop_assert!(trie.is_empty());
        prop_assert_eq!(trie.node_count(), 1);
    }

    /// Property: deleting one string keeps every other string findable.
    #[test]
    fn prop_delete_keeps_others(words in keyword_set(), pick in any::<prop::sample::Index>()) {
        let words: Vec<String> = words.into_iter().collect();
        let mut trie = Trie::new();
        for word in &words {
            trie.insert(word, word.clone()).unwrap();
        }

        let removed = pick.get(&words);
        prop_assert_eq!(trie.delete(removed).unwrap(), removed.clone());
        for word in &words {
            if word == removed {
                prop_assert!(trie.get(word).is_none());
            } else {
                prop_assert_eq!(trie.get(word), Some(word));
            }
        }
    }
}

// ============================================================================
// Automaton
// ============================================================================

proptest! {
    /// Property: exhaustive search equals a naive scan.
    #[test]
    fn prop_exhaustive_matches_naive(keywords in keyword_set(), text in "[abcd]{0,40}") {
        let automaton =
            Automaton::from_entries(keywords.iter().map(|k| (k.as_str(), k.clone()))).unwrap();

        let found: BTreeSet<(usize, String)> = automaton
            .find_all_exhaustive(&text)
            .map(|(end, keyword)| (end, keyword.clone()))
            .collect();
        prop_assert_eq!(found, naive_occurrences(&text, &keywords));
    }

    /// Property: plain search is a subset of exhaustive search, with at most
    /// one hit per position and indices in increasing order.
    #[test]
    fn prop_plain_is_subset(keywords in keyword_set(), text in "[abcd]{0,40}") {
        let automaton =
            Automaton::from_entries(keywords.iter().map(|k| (k.as_str(), k.clone()))).unwrap();

        let plain: Vec<(usize, String)> = automaton
            .find_all(&text)
            .map(|(end, keyword)| (end, keyword.clone()))
            .collect();
        let naive = naive_occurrences(&text, &keywords);

        for window in plain.windows(2) {
            prop_assert!(window[0].0 < window[1].0);
        }
        for hit in &plain {
            prop_assert!(naive.contains(hit));
        }
    }

    /// Property: folding never changes the number of characters.
    #[test]
    fn prop_fold_preserves_positions(text in "\\PC{0,40}") {
        prop_assert_eq!(fold_text(&text).chars().count(), text.chars().count());
    }
}

// ============================================================================
// Registry
// ============================================================================

proptest! {
    /// Property: the matched keywords do not depend on the order in which
    /// watches were added.
    #[test]
    fn prop_rebuild_order_independent(
        watches in prop::collection::vec((0u64..4, "[a-cA-C]{1,3}", any::<bool>(), any::<bool>()), 1..12)
            .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
        text in "[a-cA-C ]{0,30}",
    ) {
        let (original, shuffled) = watches;
        let build = |list: &[(u64, String, bool, bool)]| {
            let mut registry = WatchRegistry::new();
            for (user, keyword, match_case, whole_word) in list {
                registry
                    .add_keyword(UserId::new(*user), keyword, *match_case, *whole_word)
                    .unwrap();
            }
            registry
        };

        let first = build(&original).build_automaton();
        let second = build(&shuffled).build_automaton();
        let router = NotificationRouter::new().with_exhaustive_matches(true);

        let sorted = |mut m: std::collections::BTreeMap<UserId, Vec<String>>| {
            for keywords in m.values_mut() {
                keywords.sort();
            }
            m
        };
        prop_assert_eq!(
            sorted(router.collect_matches(&first, &text)),
            sorted(router.collect_matches(&second, &text))
        );
    }
}
