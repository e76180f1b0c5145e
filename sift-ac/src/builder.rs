// Automaton construction
//
// Runs the three construction phases back to back and hands out the finished
// automaton. There is no way to obtain a half-built one.

use crate::compact::AutomatonCompactor;
use crate::failure::FailureLinkComputer;
use crate::matcher::Automaton;
use crate::trie::TrieBuilder;
use tracing::debug;

/// Build an automaton from keywords; keyword `i` keeps index `i`
///
/// Empty lists and empty keywords are accepted. An empty keyword makes the
/// start state terminal and is reported as a zero-width match (`start ==
/// end + 1`) wherever a state inherits it.
pub fn build<I, S>(keywords: I) -> Automaton
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let keywords: Vec<String> = keywords
        .into_iter()
        .map(|keyword| keyword.as_ref().to_owned())
        .collect();

    let mut trie = TrieBuilder::insert_all(&keywords);
    FailureLinkComputer::run(&mut trie);
    let states = AutomatonCompactor::compact(&trie);

    debug!(
        keywords = keywords.len(),
        states = states.len(),
        depth = trie.layers.len() - 1,
        "Built keyword automaton"
    );

    Automaton::from_parts(states, keywords)
}

/// Builder for constructing an Automaton
#[derive(Debug, Default, Clone)]
pub struct AutomatonBuilder {
    keywords: Vec<String>,
}

impl AutomatonBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a keyword to the automaton
    pub fn add_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keywords.push(keyword.into());
        self
    }

    /// Add multiple keywords
    pub fn add_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    /// Get the number of keywords added so far
    pub fn keyword_count(&self) -> usize {
        self.keywords.len()
    }

    /// Build the automaton
    pub fn build(self) -> Automaton {
        build(self.keywords)
    }
}
