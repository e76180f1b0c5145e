//! Filter snapshots
//!
//! A snapshot bundles a config, its keyword list and the compiled automaton.
//! Snapshots are immutable; reconfiguring builds a new one and swaps it in,
//! so readers either see the old snapshot or the new one, never a mix.

use crate::config::{ConfigError, FilterConfig};
use crate::keywords::KeywordList;
use parking_lot::RwLock;
use sift_ac::Automaton;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// An immutable, fully built filter state
#[derive(Debug)]
pub struct FilterSnapshot {
    version: u64,
    config: FilterConfig,
    keywords: KeywordList,

    /// `None` when filtering is disabled or there is nothing to match
    automaton: Option<Automaton>,
}

impl FilterSnapshot {
    pub fn new(config: FilterConfig, keywords: KeywordList) -> Self {
        let automaton = if config.enable_message_filter && !keywords.is_empty() {
            Some(keywords.compile())
        } else {
            None
        };

        Self {
            version: 0,
            config,
            keywords,
            automaton,
        }
    }

    /// The snapshot used before any config has been applied
    pub fn disabled() -> Self {
        Self::new(FilterConfig::default(), KeywordList::default())
    }

    /// Number of installs that preceded this snapshot
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn keywords(&self) -> &KeywordList {
        &self.keywords
    }

    pub fn automaton(&self) -> Option<&Automaton> {
        self.automaton.as_ref()
    }

    /// True when messages are actually checked
    pub fn is_active(&self) -> bool {
        self.automaton.is_some()
    }
}

/// Shared handle to the current filter snapshot
#[derive(Debug)]
pub struct KeywordFilter {
    current: RwLock<Arc<FilterSnapshot>>,
}

impl KeywordFilter {
    /// Create a filter that lets everything through
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(FilterSnapshot::disabled())),
        }
    }

    /// Create a filter from a config whose keywords are already known
    pub fn with_keywords(config: FilterConfig, keywords: KeywordList) -> Self {
        let filter = Self::new();
        filter.install(config, keywords);
        filter
    }

    /// Get the current snapshot
    ///
    /// The returned snapshot stays valid even if another one is installed
    /// while it is in use.
    pub fn snapshot(&self) -> Arc<FilterSnapshot> {
        self.current.read().clone()
    }

    /// Build a snapshot and make it current
    pub fn install(&self, config: FilterConfig, keywords: KeywordList) -> Arc<FilterSnapshot> {
        // Compile outside the lock; only the swap is serialised.
        let mut snapshot = FilterSnapshot::new(config, keywords);

        let mut current = self.current.write();
        snapshot.version = current.version + 1;
        let snapshot = Arc::new(snapshot);
        *current = snapshot.clone();
        drop(current);

        info!(
            version = snapshot.version,
            keywords = snapshot.keywords.len(),
            active = snapshot.is_active(),
            "Installed filter snapshot"
        );

        snapshot
    }

    /// Validate `config`, resolve its keywords and install the result
    ///
    /// `base_dir` anchors a relative words file, normally the directory of
    /// the config file. Keywords resolve against the config currently in
    /// force, so an edited `filter_words` replaces the words file contents.
    /// This touches the filesystem and blocks.
    pub fn apply(
        &self,
        config: FilterConfig,
        base_dir: Option<&Path>,
    ) -> Result<Arc<FilterSnapshot>, ConfigError> {
        config.validate()?;
        let previous = self.snapshot();
        let keywords = config.resolve_keywords_since(previous.config(), base_dir)?;
        Ok(self.install(config, keywords))
    }
}

impl Default for KeywordFilter {
    fn default() -> Self {
        Self::new()
    }
}
