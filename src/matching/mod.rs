//! Multi-pattern keyword matching.
//!
//! [`Trie`] stores the keyword prefix tree, [`Automaton`] compiles it into an
//! Aho-Corasick matcher that scans a message in one pass.
//!
//! Keywords and messages are both case-folded with [`fold_text`] before they
//! reach the automaton. Folding maps each character to exactly one character,
//! so an index into folded text is also an index into the original text.

mod automaton;
mod trie;

pub use automaton::{Automaton, Matches};
pub use trie::{NodeId, Trie};

use crate::models::KeywordEntry;

/// Automaton whose payloads are keyword subscriptions.
pub type KeywordAutomaton = Automaton<KeywordEntry>;

/// Lowercases a single character.
///
/// Characters whose lowercase form is more than one character (such as
/// `'İ'`) are returned unchanged to keep folded text index-aligned.
#[must_use]
pub fn fold_char(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(single), None) => single,
        _ => c,
    }
}

/// Case-folds `text` character by character with [`fold_char`].
#[must_use]
pub fn fold_text(text: &str) -> String {
    text.chars().map(fold_char).collect()
}
