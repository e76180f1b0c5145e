//! Configuration Hot Reload
//!
//! Rebuilds the filter when its config file or words file changes.
//! Supports a polling file watcher and manual reloads.

use crate::config::{ConfigError, FilterConfig};
use crate::snapshot::KeywordFilter;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Hash recorded before the first successful reload
const INITIAL_HASH: &str = "init";

/// Configuration reload error types
#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Reload task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Configuration unchanged")]
    Unchanged,
}

/// Result type for config reload operations
pub type Result<T> = std::result::Result<T, ReloadError>;

/// Configuration change event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigChange {
    /// A new snapshot was installed
    Reloaded {
        version: u64,
        keyword_count: usize,
        active: bool,
    },

    /// The watcher saw a change but could not apply it
    Failed { error: String },
}

/// Configuration version tracking
#[derive(Debug, Clone)]
pub struct ConfigVersion {
    /// Snapshot version installed by the last reload
    pub version: u64,
    /// Timestamp of last reload
    pub timestamp: std::time::SystemTime,
    /// Hash of config and words file contents
    pub hash: String,
}

impl ConfigVersion {
    pub fn new(version: u64, hash: String) -> Self {
        Self {
            version,
            timestamp: std::time::SystemTime::now(),
            hash,
        }
    }
}

/// Config file contents plus the words file it points at
struct Sources {
    config: FilterConfig,
    /// Raw config text the hash was taken over
    content: String,
    hash: String,
}

/// Hash of a config file's text and its words file, if present
fn source_hash(content: &str, words: Option<&str>) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    if let Some(words) = words {
        words.hash(&mut hasher);
    }
    format!("{:x}", hasher.finish())
}

/// State shared between the reloader and its watcher task
#[derive(Clone)]
struct ReloadState {
    filter: Arc<KeywordFilter>,
    config_path: PathBuf,
    version: Arc<RwLock<ConfigVersion>>,
    change_tx: broadcast::Sender<ConfigChange>,
}

impl ReloadState {
    fn base_dir(&self) -> Option<&Path> {
        self.config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
    }

    /// A missing words file is created on apply; it hashes as absent.
    async fn read_words(&self, config: &FilterConfig) -> Option<String> {
        let words_path = config.words_file_path(self.base_dir())?;
        tokio::fs::read_to_string(&words_path).await.ok()
    }

    async fn read_sources(&self) -> Result<Sources> {
        let content = tokio::fs::read_to_string(&self.config_path).await?;
        let config = FilterConfig::parse(&self.config_path, &content)?;
        let words = self.read_words(&config).await;
        let hash = source_hash(&content, words.as_deref());

        Ok(Sources {
            config,
            content,
            hash,
        })
    }

    async fn changed(&self) -> Result<Option<Sources>> {
        let sources = self.read_sources().await?;
        let last = self.version.read().await;
        if last.hash == sources.hash {
            Ok(None)
        } else {
            Ok(Some(sources))
        }
    }

    async fn apply(&self, sources: Sources) -> Result<u64> {
        let Sources {
            config, content, ..
        } = sources;

        // Resolving keywords reads and may write the words file.
        let filter = self.filter.clone();
        let base_dir = self.base_dir().map(Path::to_path_buf);
        let snapshot =
            tokio::task::spawn_blocking(move || filter.apply(config, base_dir.as_deref()))
                .await??;

        // The config text is the one that was installed; only the words
        // file may have been created or rewritten since it was read.
        let words = self.read_words(snapshot.config()).await;
        let hash = source_hash(&content, words.as_deref());
        *self.version.write().await = ConfigVersion::new(snapshot.version(), hash);

        let _ = self.change_tx.send(ConfigChange::Reloaded {
            version: snapshot.version(),
            keyword_count: snapshot.keywords().len(),
            active: snapshot.is_active(),
        });

        Ok(snapshot.version())
    }
}

/// Keeps a `KeywordFilter` in sync with a config file
pub struct FilterReloader {
    state: ReloadState,
    /// File watcher handle
    watcher_handle: Option<JoinHandle<()>>,
}

impl FilterReloader {
    pub fn new(filter: Arc<KeywordFilter>, config_path: impl AsRef<Path>) -> Self {
        let (change_tx, _) = broadcast::channel(16);

        Self {
            state: ReloadState {
                filter,
                config_path: config_path.as_ref().to_path_buf(),
                version: Arc::new(RwLock::new(ConfigVersion::new(0, INITIAL_HASH.to_string()))),
                change_tx,
            },
            watcher_handle: None,
        }
    }

    pub fn filter(&self) -> &Arc<KeywordFilter> {
        &self.state.filter
    }

    pub fn config_path(&self) -> &Path {
        &self.state.config_path
    }

    /// Subscribe to configuration change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<ConfigChange> {
        self.state.change_tx.subscribe()
    }

    /// Get current configuration version
    pub async fn current_version(&self) -> ConfigVersion {
        self.state.version.read().await.clone()
    }

    /// Reload if the config or words file changed since the last reload
    pub async fn reload(&self) -> Result<u64> {
        info!(path = %self.state.config_path.display(), "Configuration reload requested");

        match self.state.changed().await? {
            Some(sources) => {
                let version = self.state.apply(sources).await?;
                info!(version, "Configuration reloaded successfully");
                Ok(version)
            }
            None => {
                warn!("Configuration unchanged, skipping reload");
                Err(ReloadError::Unchanged)
            }
        }
    }

    /// Reload unconditionally
    pub async fn force_reload(&self) -> Result<u64> {
        let sources = self.state.read_sources().await?;
        let version = self.state.apply(sources).await?;
        info!(version, "Configuration reloaded");
        Ok(version)
    }

    /// Start file watcher for hot reload
    ///
    /// The first poll happens immediately, so an unloaded filter picks up the
    /// config without waiting a full interval.
    pub fn start_file_watcher(&mut self, interval: Duration) {
        if let Some(handle) = self.watcher_handle.take() {
            handle.abort();
        }

        let state = self.state.clone();

        let handle = tokio::spawn(async move {
            info!(path = %state.config_path.display(), "Starting config file watcher");

            let mut ticker = tokio::time::interval(interval);

            loop {
                ticker.tick().await;

                match state.changed().await {
                    Ok(Some(sources)) => {
                        info!("Configuration changed, triggering reload");
                        match state.apply(sources).await {
                            Ok(version) => info!(version, "Configuration reload applied"),
                            Err(e) => {
                                error!(error = %e, "Failed to apply configuration");
                                let _ = state.change_tx.send(ConfigChange::Failed {
                                    error: e.to_string(),
                                });
                            }
                        }
                    }
                    Ok(None) => {
                        debug!("Configuration unchanged");
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to check config file");
                    }
                }
            }
        });

        self.watcher_handle = Some(handle);
    }

    /// Stop the file watcher, if running
    pub fn stop_file_watcher(&mut self) {
        if let Some(handle) = self.watcher_handle.take() {
            handle.abort();
            info!("Stopped config file watcher");
        }
    }

    pub fn is_watching(&self) -> bool {
        self.watcher_handle.is_some()
    }
}

impl Drop for FilterReloader {
    fn drop(&mut self) {
        if let Some(handle) = self.watcher_handle.take() {
            handle.abort();
        }
    }
}
