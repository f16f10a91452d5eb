//! Checkpoint Integration Tests
//!
//! Saving, loading and clearing the resumable fetch cursor.

use sfdocs::core::ProgressTracker;
use sfdocs::domain::ProgressState;
use tempfile::TempDir;

#[tokio::test]
async fn test_resume_after_checkpoint_at_49() {
    let temp = TempDir::new().unwrap();
    let tracker = ProgressTracker::for_root(temp.path());

    let mut state = ProgressState::new(100);
    state.advance(49, "Case");
    tracker.save(&state).await.unwrap();

    // A restarted process reads the same file
    let restarted = ProgressTracker::for_root(temp.path());
    let loaded = restarted.load().await.unwrap();

    assert_eq!(loaded.processed_count, 50);
    assert_eq!(loaded.last_processed_object, "Case");
    assert_eq!(loaded.resume_index(), 50);
}

#[tokio::test]
async fn test_checkpoint_file_name_and_shape() {
    let temp = TempDir::new().unwrap();
    let tracker = ProgressTracker::for_root(temp.path());

    let mut state = ProgressState::new(3);
    state.advance(0, "Account");
    tracker.save(&state).await.unwrap();

    let path = temp.path().join(".describe-progress.json");
    assert_eq!(tracker.path(), path.as_path());

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["lastProcessedIndex"], 0);
    assert_eq!(json["lastProcessedObject"], "Account");
    assert_eq!(json["totalObjects"], 3);
}

#[tokio::test]
async fn test_missing_or_corrupt_checkpoint_means_no_progress() {
    let temp = TempDir::new().unwrap();
    let tracker = ProgressTracker::for_root(temp.path());
    assert!(tracker.load().await.is_none());

    std::fs::write(tracker.path(), "{ not json").unwrap();
    assert!(tracker.load().await.is_none());
}

#[tokio::test]
async fn test_clear_is_safe_without_checkpoint() {
    let temp = TempDir::new().unwrap();
    let tracker = ProgressTracker::for_root(temp.path());

    tracker.clear().await.unwrap();

    tracker.save(&ProgressState::new(1)).await.unwrap();
    tracker.clear().await.unwrap();
    assert!(!tracker.path().exists());
}
