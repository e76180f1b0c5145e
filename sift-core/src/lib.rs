//! Sift Core
//!
//! Banned-word filtering for chat turns, built on the `sift-ac` automaton:
//! keyword lists, filter configuration, immutable filter snapshots with
//! atomic swap, chat message filtering and config hot reload.

pub mod config;
pub mod filter;
pub mod keywords;
pub mod reload;
pub mod snapshot;

pub use config::{ConfigError, FilterConfig, DEFAULT_MASK};
pub use filter::{ChatMessage, ContentPart, FilterError, FilterOutcome, MessageContent};
pub use keywords::KeywordList;
pub use reload::{ConfigChange, ConfigVersion, FilterReloader, ReloadError};
pub use snapshot::{FilterSnapshot, KeywordFilter};

/// Re-export the matching core
pub use sift_ac::{Automaton, Match};
