//! Keyword lists
//!
//! Keywords arrive either as one comma-separated config value or as a words
//! file with one keyword per line. Both are normalised the same way: trimmed,
//! empties dropped, de-duplicated and sorted.

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use sift_ac::Automaton;
use std::collections::BTreeSet;
use std::path::Path;

/// A normalised, sorted set of banned keywords
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordList(Vec<String>);

impl KeywordList {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique: BTreeSet<String> = words
            .into_iter()
            .map(|word| word.as_ref().trim().to_string())
            .filter(|word| !word.is_empty())
            .collect();

        Self(unique.into_iter().collect())
    }

    /// Parse a comma-separated list, e.g. `"foo, bar,baz"`
    pub fn parse_csv(value: &str) -> Self {
        Self::new(value.split(','))
    }

    /// Parse a newline-separated list
    pub fn parse_lines(value: &str) -> Self {
        Self::new(value.lines())
    }

    /// Join back into the comma-separated config form
    pub fn to_csv(&self) -> String {
        self.0.join(",")
    }

    /// Read a words file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Ok(Self::parse_lines(&content))
    }

    /// Write a words file: one keyword per line, empty file for an empty list
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let mut content = self.0.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Io(path.to_path_buf(), e))
    }

    /// Compile into a matching automaton; keyword indices follow this list
    pub fn compile(&self) -> Automaton {
        sift_ac::build(&self.0)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
