// Sift AC - Aho-Corasick keyword automaton
//!
// This crate finds any of N keywords inside an arbitrary text in a single
// linear pass, independent of N. It is the matching core behind sift's
// banned-word filter for chat turns.
//
// ## Architecture
//
// ```text
// ┌─────────────────────────────────────────────────┐
// │           TrieBuilder                           │
// │  (one code-point edge per keyword character)    │
// └──────────────┬──────────────────────────────────┘
//                │
//                v
// ┌─────────────────────────────────────────────────┐
// │         FailureLinkComputer                     │
// │  (BFS suffix links + inherited terminals)       │
// └──────────────┬──────────────────────────────────┘
//                │
//                v
// ┌─────────────────────────────────────────────────┐
// │         AutomatonCompactor                      │
// │  (goto-closure: one total table per state)      │
// └──────────────┬──────────────────────────────────┘
//                │
//                v
// ┌─────────────────────────────────────────────────┐
// │         Automaton (match engine)                │
// │  - contains_any / find_first                    │
// │  - find_all / replace                           │
// └─────────────────────────────────────────────────┘
// ```
//
// An `Automaton` only exists once construction has finished, and it is never
// mutated afterwards, so one instance can be shared by any number of threads.
// Changing the keyword set means building a new automaton.

mod builder;
mod compact;
mod failure;
mod matcher;
mod trie;

#[cfg(test)]
mod perf;

pub use builder::{build, AutomatonBuilder};
pub use matcher::{Automaton, Match};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_from_str_slices() {
        let automaton = build(["foo", "bar"]);
        assert_eq!(automaton.keyword_count(), 2);
        assert!(automaton.contains_any("a bar"));
    }

    #[test]
    fn test_build_from_owned_strings() {
        let words = vec!["foo".to_string(), "bar".to_string()];
        let automaton = build(&words);
        assert_eq!(automaton.keyword(1), Some("bar"));
    }
}
