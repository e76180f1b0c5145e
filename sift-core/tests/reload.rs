// Integration tests for config hot reload
//
// Drives FilterReloader against real files in a temp directory and checks
// that the shared KeywordFilter follows along.

use sift_core::{
    ChatMessage, ConfigChange, FilterError, FilterOutcome, FilterReloader, KeywordFilter,
    ReloadError,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn write_config(path: &Path, words: &str, replace: bool) {
    let config = serde_json::json!({
        "enable_message_filter": true,
        "filter_words": words,
        "enable_replace": replace,
        "replace_with": "*",
    });
    std::fs::write(path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
}

#[tokio::test]
async fn test_manual_reload_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("filter.json");
    write_config(&config_path, "spam,eggs", false);

    let filter = Arc::new(KeywordFilter::new());
    let reloader = FilterReloader::new(filter.clone(), &config_path);
    let mut rx = reloader.subscribe();

    // 1. First reload picks the file up
    let version = reloader.reload().await.unwrap();
    assert_eq!(version, 1);
    assert_eq!(reloader.current_version().await.version, 1);
    assert_eq!(
        rx.try_recv().unwrap(),
        ConfigChange::Reloaded {
            version: 1,
            keyword_count: 2,
            active: true,
        }
    );

    let err = filter.filter_text("green eggs").unwrap_err();
    assert_eq!(
        err,
        FilterError::BannedKeyword {
            keyword: "eggs".to_string()
        }
    );

    // 2. Nothing changed
    assert!(matches!(reloader.reload().await, Err(ReloadError::Unchanged)));
    assert!(rx.try_recv().is_err());

    // 3. Switch to masking with a new word list
    write_config(&config_path, "ham", true);
    assert_eq!(reloader.reload().await.unwrap(), 2);
    assert_eq!(filter.filter_text("green eggs and ham").unwrap(), "green eggs and ***");

    // 4. Forced reload always installs
    assert_eq!(reloader.force_reload().await.unwrap(), 3);
}

#[tokio::test]
async fn test_words_file_created_and_tracked() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("filter.yaml");
    std::fs::write(
        &config_path,
        "enable_message_filter: true\nfilter_words: \"beta, alpha\"\nfilter_words_file: words.txt\nenable_replace: true\n",
    )
    .unwrap();

    let filter = Arc::new(KeywordFilter::new());
    let reloader = FilterReloader::new(filter.clone(), &config_path);
    reloader.reload().await.unwrap();

    let words_path = dir.path().join("words.txt");
    assert_eq!(std::fs::read_to_string(&words_path).unwrap(), "alpha\nbeta\n");

    // Creating the words file is not itself a change.
    assert!(matches!(reloader.reload().await, Err(ReloadError::Unchanged)));

    // Editing the words file is.
    std::fs::write(&words_path, "gamma\n").unwrap();
    reloader.reload().await.unwrap();

    let snapshot = filter.snapshot();
    assert_eq!(snapshot.keywords().as_slice(), &["gamma"]);
    assert_eq!(filter.filter_text("alpha gamma").unwrap(), "alpha *****");
}

#[tokio::test]
async fn test_edited_inline_words_replace_words_file() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("filter.yaml");
    let words_path = dir.path().join("words.txt");
    std::fs::write(
        &config_path,
        "enable_message_filter: true\nfilter_words: alpha\nfilter_words_file: words.txt\nenable_replace: true\n",
    )
    .unwrap();

    let filter = Arc::new(KeywordFilter::new());
    let reloader = FilterReloader::new(filter.clone(), &config_path);
    assert_eq!(reloader.reload().await.unwrap(), 1);
    assert_eq!(std::fs::read_to_string(&words_path).unwrap(), "alpha\n");

    std::fs::write(
        &config_path,
        "enable_message_filter: true\nfilter_words: beta\nfilter_words_file: words.txt\nenable_replace: true\n",
    )
    .unwrap();
    assert_eq!(reloader.reload().await.unwrap(), 2);

    assert_eq!(filter.snapshot().keywords().as_slice(), &["beta"]);
    assert_eq!(std::fs::read_to_string(&words_path).unwrap(), "beta\n");
    assert_eq!(filter.filter_text("alpha beta").unwrap(), "alpha ****");

    // Rewriting the file is part of the reload, not a further change.
    assert!(matches!(reloader.reload().await, Err(ReloadError::Unchanged)));
}

#[tokio::test]
async fn test_invalid_config_keeps_previous_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("filter.json");
    write_config(&config_path, "bad", true);

    let filter = Arc::new(KeywordFilter::new());
    let reloader = FilterReloader::new(filter.clone(), &config_path);
    reloader.reload().await.unwrap();

    std::fs::write(&config_path, "{ broken").unwrap();
    assert!(matches!(reloader.reload().await, Err(ReloadError::Config(_))));

    assert_eq!(filter.snapshot().version(), 1);
    assert_eq!(filter.filter_text("bad").unwrap(), "***");
}

#[tokio::test]
async fn test_file_watcher_applies_changes() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("filter.json");
    write_config(&config_path, "one", true);

    let filter = Arc::new(KeywordFilter::new());
    let mut reloader = FilterReloader::new(filter.clone(), &config_path);
    let mut rx = reloader.subscribe();
    reloader.start_file_watcher(Duration::from_millis(20));
    assert!(reloader.is_watching());

    let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(first, ConfigChange::Reloaded { version: 1, .. }));

    write_config(&config_path, "one,two", true);
    let second = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        second,
        ConfigChange::Reloaded {
            version: 2,
            keyword_count: 2,
            active: true,
        }
    );

    let mut messages = vec![ChatMessage::user("two of them")];
    let outcome = filter.filter_messages(&mut messages).unwrap();
    assert_eq!(
        outcome,
        FilterOutcome::Masked {
            keywords: vec!["two".to_string()]
        }
    );

    reloader.stop_file_watcher();
    assert!(!reloader.is_watching());
}
