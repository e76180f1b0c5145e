//! Sift CLI
//!
//! Command-line interface for the sift banned-word filter.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use sift_core::{
    ChatMessage, ConfigChange, FilterConfig, FilterOutcome, FilterReloader, KeywordFilter,
    KeywordList, DEFAULT_MASK,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Sift - banned-word filter for chat messages", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report the first banned keyword in a text; exits 1 on a match
    Check {
        #[command(flatten)]
        source: KeywordSource,

        /// Text to check (read from stdin when omitted)
        text: Option<String>,
    },

    /// Mask every banned keyword in a text
    Mask {
        #[command(flatten)]
        source: KeywordSource,

        /// Mask character (defaults to the config's, then '*')
        #[arg(short, long)]
        mask: Option<char>,

        /// Text to mask (read from stdin when omitted)
        text: Option<String>,
    },

    /// Print every match as one JSON object per line
    Scan {
        #[command(flatten)]
        source: KeywordSource,

        /// Text to scan (read from stdin when omitted)
        text: Option<String>,
    },

    /// Filter the latest user turn of a chat payload
    Filter {
        /// Filter config file
        #[arg(short, long)]
        config: PathBuf,

        /// JSON file with a message array or an object with `messages`
        #[arg(short, long)]
        messages: PathBuf,
    },

    /// Watch a config file and log every reload
    Watch {
        /// Filter config file
        #[arg(short, long)]
        config: PathBuf,

        /// Polling interval
        #[arg(short, long, default_value_t = 5)]
        interval_secs: u64,
    },
}

/// Where keywords come from
#[derive(Args)]
#[group(required = true, multiple = false)]
struct KeywordSource {
    /// Comma-separated keywords
    #[arg(short, long)]
    words: Option<String>,

    /// Words file, one keyword per line
    #[arg(long)]
    words_file: Option<PathBuf>,

    /// Filter config file (json or yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl KeywordSource {
    fn load(&self) -> Result<(KeywordList, Option<FilterConfig>)> {
        if let Some(words) = &self.words {
            return Ok((KeywordList::parse_csv(words), None));
        }

        if let Some(path) = &self.words_file {
            let keywords = KeywordList::load(path)?;
            return Ok((keywords, None));
        }

        if let Some(path) = &self.config {
            let config = FilterConfig::load(path)?;
            let keywords = config.resolve_keywords(base_dir(path))?;
            return Ok((keywords, Some(config)));
        }

        anyhow::bail!("No keyword source given")
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level)?;

    match cli.command {
        Commands::Check { source, text } => check(&source, text),
        Commands::Mask { source, mask, text } => mask_text(&source, mask, text),
        Commands::Scan { source, text } => scan(&source, text),
        Commands::Filter { config, messages } => filter_payload(&config, &messages),
        Commands::Watch {
            config,
            interval_secs,
        } => watch(config, Duration::from_secs(interval_secs)).await,
    }
}

fn setup_logging(level: &str) -> Result<()> {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    Ok(())
}

fn base_dir(path: &Path) -> Option<&Path> {
    path.parent().filter(|dir| !dir.as_os_str().is_empty())
}

fn read_text(text: Option<String>) -> Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read text from stdin")?;
            Ok(buffer)
        }
    }
}

fn check(source: &KeywordSource, text: Option<String>) -> Result<ExitCode> {
    let (keywords, _) = source.load()?;
    let text = read_text(text)?;
    let automaton = keywords.compile();

    match automaton.find_first(&text) {
        Some(found) => {
            println!("{}\t{}\t{}", found.keyword, found.start, found.end);
            Ok(ExitCode::from(1))
        }
        None => {
            println!("clean");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn mask_text(source: &KeywordSource, mask: Option<char>, text: Option<String>) -> Result<ExitCode> {
    let (keywords, config) = source.load()?;
    let text = read_text(text)?;
    let mask = mask
        .or_else(|| config.as_ref().map(FilterConfig::mask_char))
        .unwrap_or(DEFAULT_MASK);

    let automaton = keywords.compile();
    print!("{}", automaton.replace(&text, mask));

    Ok(ExitCode::SUCCESS)
}

fn scan(source: &KeywordSource, text: Option<String>) -> Result<ExitCode> {
    let (keywords, _) = source.load()?;
    let text = read_text(text)?;
    let automaton = keywords.compile();

    let matches = automaton.find_all(&text);
    for found in &matches {
        println!("{}", serde_json::to_string(found)?);
    }
    info!(count = matches.len(), "Scan complete");

    Ok(ExitCode::SUCCESS)
}

fn filter_payload(config_path: &Path, messages_path: &Path) -> Result<ExitCode> {
    let config = FilterConfig::load(config_path)?;
    let filter = KeywordFilter::new();
    filter.apply(config, base_dir(config_path))?;

    let content = std::fs::read_to_string(messages_path)
        .with_context(|| format!("Failed to read {}", messages_path.display()))?;
    let mut payload: Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in {}", messages_path.display()))?;

    let slot = if payload.is_array() {
        &mut payload
    } else {
        payload
            .get_mut("messages")
            .context("Payload must be a message array or an object with `messages`")?
    };

    let mut messages: Vec<ChatMessage> =
        serde_json::from_value(slot.take()).context("Invalid message list")?;
    let outcome = filter.filter_messages(&mut messages)?;
    *slot = serde_json::to_value(&messages)?;

    match &outcome {
        FilterOutcome::Disabled => info!("Message filter disabled"),
        FilterOutcome::Clean => info!("No banned keywords found"),
        FilterOutcome::Masked { keywords } => info!(?keywords, "Masked banned keywords"),
    }

    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(ExitCode::SUCCESS)
}

async fn watch(config_path: PathBuf, interval: Duration) -> Result<ExitCode> {
    let filter = Arc::new(KeywordFilter::new());
    let mut reloader = FilterReloader::new(filter, &config_path);
    let mut changes = reloader.subscribe();

    reloader.start_file_watcher(interval);
    info!(path = %config_path.display(), "Watching config. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            change = changes.recv() => {
                if !log_change(change) {
                    break;
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
        }
    }

    reloader.stop_file_watcher();
    info!("Shutting down watcher");

    Ok(ExitCode::SUCCESS)
}

/// Log one change notification; false once the channel is gone
fn log_change(change: Result<ConfigChange, RecvError>) -> bool {
    match change {
        Ok(ConfigChange::Reloaded {
            version,
            keyword_count,
            active,
        }) => {
            info!(version, keyword_count, active, "Filter reloaded");
            true
        }
        Ok(ConfigChange::Failed { error }) => {
            error!(%error, "Filter reload failed");
            true
        }
        Err(RecvError::Lagged(skipped)) => {
            warn!(skipped, "Missed filter change notifications");
            true
        }
        Err(RecvError::Closed) => {
            error!("Change channel closed");
            false
        }
    }
}
