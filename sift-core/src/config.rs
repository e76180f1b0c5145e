//! Filter configuration
//!
//! Loaded from JSON or YAML, chosen by file extension.

use crate::keywords::KeywordList;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Mask character used when none is configured
pub const DEFAULT_MASK: char = '*';

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error accessing {0:?}: {1}")]
    Io(PathBuf, std::io::Error),

    #[error("Parse error in {0:?}: {1}")]
    Parse(PathBuf, String),

    #[error("Unsupported config format: {0:?}")]
    UnsupportedFormat(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Banned-word filter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Check the latest user turn at all
    pub enable_message_filter: bool,

    /// Comma-separated keywords, used when no words file is present
    pub filter_words: String,

    /// Words file, one keyword per line; relative to the config file
    pub filter_words_file: Option<PathBuf>,

    /// Mask matches instead of rejecting the message
    pub enable_replace: bool,

    /// Mask text; only its first character is used
    pub replace_with: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enable_message_filter: false,
            filter_words: String::new(),
            filter_words_file: None,
            enable_replace: false,
            replace_with: DEFAULT_MASK.to_string(),
        }
    }
}

impl FilterConfig {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::parse(path, &content)
    }

    /// Parse config content; `path` picks the format and names errors
    pub fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;

        let config: FilterConfig = match extension {
            "json" => serde_json::from_str(content)
                .map_err(|e| ConfigError::Parse(path.to_path_buf(), e.to_string()))?,
            "yaml" | "yml" => serde_yaml::from_str(content)
                .map_err(|e| ConfigError::Parse(path.to_path_buf(), e.to_string()))?,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.replace_with.is_empty() {
            return Err(ConfigError::Validation(
                "replace_with must contain at least one character".to_string(),
            ));
        }
        Ok(())
    }

    /// The character matches are masked with
    pub fn mask_char(&self) -> char {
        self.replace_with.chars().next().unwrap_or(DEFAULT_MASK)
    }

    /// Words file location, resolved against `base_dir` when relative
    pub fn words_file_path(&self, base_dir: Option<&Path>) -> Option<PathBuf> {
        let file = self.filter_words_file.as_ref()?;
        match base_dir {
            Some(dir) if file.is_relative() => Some(dir.join(file)),
            _ => Some(file.clone()),
        }
    }

    /// Work out the effective keyword list
    ///
    /// An existing words file wins over `filter_words`. A configured but
    /// missing words file is created from `filter_words`.
    pub fn resolve_keywords(&self, base_dir: Option<&Path>) -> Result<KeywordList, ConfigError> {
        let inline = || KeywordList::parse_csv(&self.filter_words);

        match self.words_file_path(base_dir) {
            Some(path) if path.is_file() => KeywordList::load(&path),
            Some(path) => {
                let keywords = inline();
                keywords.save(&path)?;
                info!(path = %path.display(), keywords = keywords.len(), "Created keyword file");
                Ok(keywords)
            }
            None => Ok(inline()),
        }
    }

    /// Work out the keyword list on a reload, with `previous` in force
    ///
    /// When `filter_words` was edited and the words file did not move, the
    /// edited list is authoritative and is written back to the file.
    /// Otherwise this resolves as [`resolve_keywords`](Self::resolve_keywords).
    pub fn resolve_keywords_since(
        &self,
        previous: &FilterConfig,
        base_dir: Option<&Path>,
    ) -> Result<KeywordList, ConfigError> {
        let path = self.words_file_path(base_dir);
        let words_edited = self.filter_words != previous.filter_words;

        match path {
            Some(path) if words_edited && previous.words_file_path(base_dir).as_ref() == Some(&path) => {
                let keywords = KeywordList::parse_csv(&self.filter_words);
                keywords.save(&path)?;
                info!(path = %path.display(), keywords = keywords.len(), "Rewrote keyword file");
                Ok(keywords)
            }
            _ => self.resolve_keywords(base_dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = FilterConfig::default();
        assert!(!config.enable_message_filter);
        assert!(!config.enable_replace);
        assert_eq!(config.mask_char(), '*');
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_json_with_defaults() {
        let config = FilterConfig::parse(
            Path::new("filter.json"),
            r#"{ "enable_message_filter": true, "filter_words": "a,b" }"#,
        )
        .unwrap();

        assert!(config.enable_message_filter);
        assert_eq!(config.filter_words, "a,b");
        assert_eq!(config.replace_with, "*");
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = "enable_message_filter: true\nenable_replace: true\nreplace_with: \"#\"\n";
        let config = FilterConfig::parse(Path::new("filter.yml"), yaml).unwrap();
        assert!(config.enable_replace);
        assert_eq!(config.mask_char(), '#');
    }

    #[test]
    fn test_mask_uses_first_character() {
        let config = FilterConfig {
            replace_with: "██".to_string(),
            ..Default::default()
        };
        assert_eq!(config.mask_char(), '█');
    }

    #[test]
    fn test_unsupported_format() {
        let result = FilterConfig::parse(Path::new("filter.toml"), "");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));

        let result = FilterConfig::parse(Path::new("filter"), "");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_parse_error() {
        let result = FilterConfig::parse(Path::new("filter.json"), "{ not json");
        assert!(matches!(result, Err(ConfigError::Parse(..))));
    }

    #[test]
    fn test_empty_mask_rejected() {
        let result = FilterConfig::parse(Path::new("filter.json"), r#"{ "replace_with": "" }"#);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_words_file_path_resolution() {
        let config = FilterConfig {
            filter_words_file: Some(PathBuf::from("words.txt")),
            ..Default::default()
        };
        assert_eq!(
            config.words_file_path(Some(Path::new("/etc/sift"))),
            Some(PathBuf::from("/etc/sift/words.txt"))
        );
        assert_eq!(config.words_file_path(None), Some(PathBuf::from("words.txt")));
        assert_eq!(FilterConfig::default().words_file_path(None), None);
    }

    #[test]
    fn test_resolve_keywords_inline() {
        let config = FilterConfig {
            filter_words: "b, a".to_string(),
            ..Default::default()
        };
        let keywords = config.resolve_keywords(None).unwrap();
        assert_eq!(keywords.as_slice(), &["a", "b"]);
    }

    #[test]
    fn test_resolve_keywords_prefers_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("words.txt"), "from-file\n").unwrap();

        let config = FilterConfig {
            filter_words: "inline".to_string(),
            filter_words_file: Some(PathBuf::from("words.txt")),
            ..Default::default()
        };
        let keywords = config.resolve_keywords(Some(dir.path())).unwrap();
        assert_eq!(keywords.as_slice(), &["from-file"]);
    }

    #[test]
    fn test_resolve_keywords_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = FilterConfig {
            filter_words: "x,y".to_string(),
            filter_words_file: Some(PathBuf::from("words.txt")),
            ..Default::default()
        };

        let keywords = config.resolve_keywords(Some(dir.path())).unwrap();
        assert_eq!(keywords.len(), 2);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("words.txt")).unwrap(),
            "x\ny\n"
        );
    }

    #[test]
    fn test_edited_inline_words_rewrite_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("words.txt"), "alpha\n").unwrap();

        let previous = FilterConfig {
            filter_words: "alpha".to_string(),
            filter_words_file: Some(PathBuf::from("words.txt")),
            ..Default::default()
        };
        let next = FilterConfig {
            filter_words: "beta".to_string(),
            ..previous.clone()
        };

        let keywords = next.resolve_keywords_since(&previous, Some(dir.path())).unwrap();
        assert_eq!(keywords.as_slice(), &["beta"]);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("words.txt")).unwrap(),
            "beta\n"
        );
    }

    #[test]
    fn test_unedited_inline_words_keep_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("words.txt"), "from-file\n").unwrap();

        let previous = FilterConfig {
            filter_words: "inline".to_string(),
            filter_words_file: Some(PathBuf::from("words.txt")),
            ..Default::default()
        };
        let next = FilterConfig {
            enable_replace: true,
            ..previous.clone()
        };

        let keywords = next.resolve_keywords_since(&previous, Some(dir.path())).unwrap();
        assert_eq!(keywords.as_slice(), &["from-file"]);
    }
}
