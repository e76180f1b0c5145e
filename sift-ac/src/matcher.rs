// Keyword automaton and match engine
//
// Walks the compacted automaton over a text one code point at a time. A
// failed transition restarts from the start state instead of aborting the
// scan, which is enough because the start state holds every first character.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Enumerate;
use std::str::Chars;

/// A keyword occurrence found in a text
///
/// Positions are inclusive, 0-based code-point offsets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Match {
    /// Index of the keyword in construction order
    pub keyword_index: usize,

    /// The keyword that matched
    pub keyword: String,

    /// First code point of the match
    pub start: usize,

    /// Last code point of the match
    pub end: usize,
}

/// Index of a state in the automaton
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct StateId(usize);

impl StateId {
    pub(crate) const START: StateId = StateId(0);

    pub(crate) fn new(index: usize) -> Self {
        StateId(index)
    }

    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// A compacted automaton state
#[derive(Debug, Clone)]
pub(crate) struct State {
    /// Transitions: code point -> next state, failure chain already folded in
    transitions: AHashMap<char, StateId>,

    /// Keywords recognised here: own first, then inherited in chain order
    matches: Box<[usize]>,

    /// Is this an accepting state?
    is_match: bool,
}

impl State {
    pub(crate) fn new(transitions: AHashMap<char, StateId>, matches: Vec<usize>) -> Self {
        Self {
            transitions,
            is_match: !matches.is_empty(),
            matches: matches.into_boxed_slice(),
        }
    }

    pub(crate) fn transition(&self, c: char) -> Option<StateId> {
        self.transitions.get(&c).copied()
    }

    pub(crate) fn transitions(&self) -> impl Iterator<Item = (char, StateId)> + '_ {
        self.transitions.iter().map(|(&c, &next)| (c, next))
    }

    pub(crate) fn is_match(&self) -> bool {
        self.is_match
    }

    pub(crate) fn matches(&self) -> &[usize] {
        &self.matches
    }
}

/// An immutable Aho-Corasick automaton over a fixed keyword set
///
/// Built with [`build`](crate::build) or [`AutomatonBuilder`](crate::AutomatonBuilder).
/// Every matching operation is read-only, so a single automaton can be
/// shared across threads without locking.
#[derive(Clone)]
pub struct Automaton {
    states: Box<[State]>,
    keywords: Box<[String]>,

    /// Keyword lengths in code points
    keyword_lengths: Box<[usize]>,
}

impl Automaton {
    pub(crate) fn from_parts(states: Vec<State>, keywords: Vec<String>) -> Self {
        let keyword_lengths = keywords.iter().map(|k| k.chars().count()).collect();

        Self {
            states: states.into_boxed_slice(),
            keywords: keywords.into_boxed_slice(),
            keyword_lengths,
        }
    }

    /// Returns true as soon as any keyword occurs in `text`
    pub fn contains_any(&self, text: &str) -> bool {
        self.scan(text).next().is_some()
    }

    /// Returns the first recognised match
    ///
    /// When several keywords end at the same position the reported one is
    /// the first entry of that state's match list, which is the state's own
    /// keyword if it has one. That is not necessarily the longest keyword.
    pub fn find_first(&self, text: &str) -> Option<Match> {
        self.scan(text)
            .next()
            .map(|(end, state)| self.make_match(state.matches()[0], end))
    }

    /// Returns every match, in scan order
    ///
    /// All keywords ending at a position are reported, so overlapping and
    /// nested occurrences are included.
    pub fn find_all(&self, text: &str) -> Vec<Match> {
        let mut found = Vec::new();

        for (end, state) in self.scan(text) {
            found.extend(
                state
                    .matches()
                    .iter()
                    .map(|&keyword| self.make_match(keyword, end)),
            );
        }

        found
    }

    /// Overwrites every recognised occurrence with `mask`
    ///
    /// The masked span at each match position is the length of the first
    /// keyword in that state's match list. Overlapping spans simply mask
    /// the same code points again.
    pub fn replace(&self, text: &str, mask: char) -> String {
        let mut buffer: Vec<char> = text.chars().collect();

        for (end, state) in self.scan(text) {
            let span = self.keyword_lengths[state.matches()[0]];
            for slot in &mut buffer[end + 1 - span..=end] {
                *slot = mask;
            }
        }

        buffer.into_iter().collect()
    }

    /// Get the keywords in construction order
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Get a keyword by index
    pub fn keyword(&self, index: usize) -> Option<&str> {
        self.keywords.get(index).map(String::as_str)
    }

    /// Get the number of keywords in this automaton
    pub fn keyword_count(&self) -> usize {
        self.keywords.len()
    }

    /// Get the number of states, including the start state
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// True when built from an empty keyword list
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    fn scan<'a>(&'a self, text: &'a str) -> MatchPositions<'a> {
        MatchPositions {
            states: &self.states,
            chars: text.chars().enumerate(),
            current: None,
        }
    }

    fn make_match(&self, keyword_index: usize, end: usize) -> Match {
        Match {
            keyword_index,
            keyword: self.keywords[keyword_index].clone(),
            start: end + 1 - self.keyword_lengths[keyword_index],
            end,
        }
    }
}

impl fmt::Debug for Automaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Automaton")
            .field("keyword_count", &self.keywords.len())
            .field("state_count", &self.states.len())
            .finish()
    }
}

/// Positions where the walk lands on an accepting state
struct MatchPositions<'a> {
    states: &'a [State],
    chars: Enumerate<Chars<'a>>,
    current: Option<StateId>,
}

impl<'a> Iterator for MatchPositions<'a> {
    type Item = (usize, &'a State);

    fn next(&mut self) -> Option<Self::Item> {
        let states = self.states;
        let start = &states[StateId::START.index()];

        for (position, c) in &mut self.chars {
            let next = match self.current {
                None => start.transition(c),
                Some(id) => states[id.index()]
                    .transition(c)
                    .or_else(|| start.transition(c)),
            };
            self.current = next;

            if let Some(id) = next {
                let state = &states[id.index()];
                if state.is_match() {
                    return Some((position, state));
                }
            }
        }

        None
    }
}
