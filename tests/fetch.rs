//! Fetch Integration Tests
//!
//! Bulk describe passes against an in-memory describe client.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sfdocs::adapters::{DescribeClient, DescribeError};
use sfdocs::core::{FetchOptions, ObjectStore, Orchestrator, ProgressTracker};
use sfdocs::domain::{
    DescribeField, DescribeSObjectResult, GlobalSObject, ProgressState, PropertyDescriptor,
    SchemaDocument, SchemaType,
};
use sfdocs::library::ObjectLookup;
use tempfile::TempDir;

#[derive(Clone, Copy)]
enum Failure {
    NotFound,
    Auth,
}

/// Describe client serving canned results
#[derive(Default)]
struct MockClient {
    catalog: Vec<GlobalSObject>,
    failures: HashMap<String, Failure>,
    calls: Mutex<Vec<String>>,
    /// Output root whose checkpoint is recorded on every describe call
    watch: Option<PathBuf>,
    seen: Mutex<Vec<(String, Option<ProgressState>)>>,
}

impl MockClient {
    fn with_objects(names: &[&str]) -> Self {
        Self {
            catalog: names
                .iter()
                .map(|name| GlobalSObject {
                    name: name.to_string(),
                    label: name.to_string(),
                    custom: name.ends_with("__c"),
                })
                .collect(),
            ..Default::default()
        }
    }

    fn failing(mut self, name: &str, failure: Failure) -> Self {
        self.failures.insert(name.to_string(), failure);
        self
    }

    fn watching(mut self, root: &std::path::Path) -> Self {
        self.watch = Some(root.to_path_buf());
        self
    }

    /// Checkpointed processed count seen when each object was described
    fn seen_counts(&self) -> Vec<(String, Option<usize>)> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|(name, state)| (name.clone(), state.as_ref().map(|s| s.processed_count)))
            .collect()
    }

    fn seen_states(&self) -> Vec<ProgressState> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, state)| state.clone())
            .collect()
    }

    fn calls(&self) -> Vec<String> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort();
        calls
    }
}

#[async_trait]
impl DescribeClient for MockClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn describe_global(&self) -> Result<Vec<GlobalSObject>, DescribeError> {
        Ok(self.catalog.clone())
    }

    async fn describe_object(&self, name: &str) -> Result<DescribeSObjectResult, DescribeError> {
        self.calls.lock().unwrap().push(name.to_string());

        if let Some(root) = &self.watch {
            let state = ProgressTracker::for_root(root).load().await;
            self.seen.lock().unwrap().push((name.to_string(), state));
        }

        match self.failures.get(name) {
            Some(Failure::NotFound) => return Err(DescribeError::NotFound(name.to_string())),
            Some(Failure::Auth) => return Err(DescribeError::Auth("INVALID_SESSION_ID".to_string())),
            None => {}
        }

        Ok(DescribeSObjectResult {
            name: name.to_string(),
            label: name.to_string(),
            fields: vec![
                DescribeField::new("Id", "id"),
                DescribeField::new("Name", "string"),
            ],
            queryable: true,
            custom: name.ends_with("__c"),
            ..Default::default()
        })
    }
}

fn fast_options() -> FetchOptions {
    FetchOptions {
        batch_size: 2,
        batch_pause: Duration::ZERO,
        checkpoint_interval: 2,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_full_pass_persists_and_indexes() {
    let temp = TempDir::new().unwrap();
    let client = Arc::new(MockClient::with_objects(&["Account", "Contact", "Invoice__c"]));
    let orchestrator = Orchestrator::new(client.clone(), ObjectStore::new(temp.path()));

    let report = orchestrator.run(&fast_options()).await.unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.processed, vec!["Account", "Contact", "Invoice__c"]);
    assert_eq!(report.created, 3);
    assert!(report.failed.is_empty());

    assert!(temp.path().join("objects/A/Account.json").exists());
    assert!(temp.path().join("objects/I/Invoice__c.json").exists());
    assert!(!temp.path().join(".describe-progress.json").exists());

    let lookup = ObjectLookup::new(temp.path());
    assert_eq!(lookup.load_index().await.unwrap().total_objects, 3);
}

#[tokio::test]
async fn test_per_object_failure_is_skipped() {
    let temp = TempDir::new().unwrap();
    let client = Arc::new(
        MockClient::with_objects(&["Account", "Broken", "Contact"])
            .failing("Broken", Failure::NotFound),
    );
    let orchestrator = Orchestrator::new(client, ObjectStore::new(temp.path()));

    let report = orchestrator.run(&fast_options()).await.unwrap();

    assert_eq!(report.processed, vec!["Account", "Contact"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].name, "Broken");
    assert!(!temp.path().join("objects/B/Broken.json").exists());
}

#[tokio::test]
async fn test_auth_failure_aborts_with_checkpoint() {
    let temp = TempDir::new().unwrap();
    let client = Arc::new(
        MockClient::with_objects(&["Account", "Case", "Contact", "Lead"])
            .failing("Contact", Failure::Auth),
    );
    let orchestrator = Orchestrator::new(client, ObjectStore::new(temp.path()));

    let err = orchestrator.run(&fast_options()).await.unwrap_err();
    assert!(format!("{:#}", err).contains("INVALID_SESSION_ID"));

    let state = ProgressTracker::for_root(temp.path()).load().await.unwrap();
    assert_eq!(state.last_processed_object, "Case");
    assert_eq!(state.resume_index(), 2);
    assert!(!temp.path().join("objects/L/Lead.json").exists());
}

#[tokio::test]
async fn test_resume_skips_processed_objects() {
    let temp = TempDir::new().unwrap();
    let tracker = ProgressTracker::for_root(temp.path());
    let mut state = ProgressState::new(4);
    state.advance(1, "Case");
    tracker.save(&state).await.unwrap();

    let client = Arc::new(MockClient::with_objects(&["Account", "Case", "Contact", "Lead"]));
    let orchestrator = Orchestrator::new(client.clone(), ObjectStore::new(temp.path()));

    let options = FetchOptions {
        resume: true,
        ..fast_options()
    };
    let report = orchestrator.run(&options).await.unwrap();

    assert_eq!(report.start_index, 2);
    assert_eq!(report.processed, vec!["Contact", "Lead"]);
    assert_eq!(client.calls(), vec!["Contact", "Lead"]);
    assert!(tracker.load().await.is_none());
}

#[tokio::test]
async fn test_manual_start_index_bypasses_checkpoint() {
    let temp = TempDir::new().unwrap();
    let mut state = ProgressState::new(3);
    state.advance(0, "Account");
    ProgressTracker::for_root(temp.path()).save(&state).await.unwrap();

    let client = Arc::new(MockClient::with_objects(&["Account", "Case", "Contact"]));
    let orchestrator = Orchestrator::new(client.clone(), ObjectStore::new(temp.path()));

    let options = FetchOptions {
        start_index: Some(2),
        ..fast_options()
    };
    let report = orchestrator.run(&options).await.unwrap();

    assert_eq!(report.processed, vec!["Contact"]);
    assert_eq!(client.calls(), vec!["Contact"]);
}

#[tokio::test]
async fn test_refetch_preserves_curated_descriptions() {
    let temp = TempDir::new().unwrap();
    let store = ObjectStore::new(temp.path());
    store
        .save(
            &SchemaDocument::new("Account")
                .with_description("Curated text")
                .with_property(
                    "Name",
                    PropertyDescriptor::new(SchemaType::String).with_description("Curated name"),
                ),
        )
        .await
        .unwrap();

    let client = Arc::new(MockClient::with_objects(&["Account"]));
    let orchestrator = Orchestrator::new(client, store.clone());

    let report = orchestrator.run(&fast_options()).await.unwrap();
    assert_eq!(report.updated, 1);

    let doc = store.load_document("Account").await.unwrap();
    assert_eq!(doc.description.as_deref(), Some("Curated text"));
    assert_eq!(doc.properties["Name"].description.as_deref(), Some("Curated name"));
    assert_eq!(doc.properties["Id"].description.as_deref(), Some("Id field"));
}

#[tokio::test]
async fn test_skip_custom_and_allow_list() {
    let temp = TempDir::new().unwrap();
    let client = Arc::new(MockClient::with_objects(&[
        "Account",
        "AccountHistory",
        "Contact",
        "Invoice__c",
    ]));
    let orchestrator = Orchestrator::new(client, ObjectStore::new(temp.path()));

    let options = FetchOptions {
        skip_custom: true,
        objects: vec!["Account*".to_string(), "Invoice__c".to_string()],
        ..fast_options()
    };
    let report = orchestrator.run(&options).await.unwrap();

    assert_eq!(report.processed, vec!["Account", "AccountHistory"]);
}

#[tokio::test]
async fn test_process_single_object() {
    let temp = TempDir::new().unwrap();
    let client = Arc::new(MockClient::with_objects(&[]));
    let orchestrator = Orchestrator::new(client, ObjectStore::new(temp.path()));

    let applied = orchestrator.process_object("Lead").await.unwrap();
    assert_eq!(applied.document.name, "Lead");
    assert_eq!(applied.document.field_count(), 2);
    assert!(temp.path().join("objects/L/Lead.json").exists());
}

fn sequential_options(interval: usize) -> FetchOptions {
    FetchOptions {
        batch_size: 1,
        batch_pause: Duration::ZERO,
        checkpoint_interval: interval,
        ..Default::default()
    }
}

const SEVEN: [&str; 7] = [
    "Account", "Asset", "Case", "Contact", "Lead", "Opportunity", "Task",
];

fn counts(expected: &[(&str, Option<usize>)]) -> Vec<(String, Option<usize>)> {
    expected
        .iter()
        .map(|(name, count)| (name.to_string(), *count))
        .collect()
}

#[tokio::test]
async fn test_checkpoint_written_every_interval_after_whole_objects() {
    let temp = TempDir::new().unwrap();
    let client = Arc::new(
        MockClient::with_objects(&SEVEN)
            .failing("Contact", Failure::NotFound)
            .watching(temp.path()),
    );
    let orchestrator = Orchestrator::new(client.clone(), ObjectStore::new(temp.path()));

    let report = orchestrator.run(&sequential_options(3)).await.unwrap();
    assert_eq!(report.failed.len(), 1);

    assert_eq!(
        client.seen_counts(),
        counts(&[
            ("Account", None),
            ("Asset", None),
            ("Case", None),
            ("Contact", Some(3)),
            ("Lead", Some(3)),
            ("Opportunity", Some(3)),
            ("Task", Some(6)),
        ])
    );

    // Each checkpoint names an object whose file was already written
    for state in client.seen_states() {
        assert_eq!(state.processed_count % 3, 0);
        assert_eq!(state.resume_index(), state.processed_count);
        let name = &state.last_processed_object;
        let path = ObjectStore::new(temp.path()).object_path(name).unwrap();
        assert!(path.exists(), "{} checkpointed before it was saved", name);
    }

    assert!(ProgressTracker::for_root(temp.path()).load().await.is_none());
}

#[tokio::test]
async fn test_resumed_pass_keeps_checkpoint_cadence() {
    let temp = TempDir::new().unwrap();
    let mut state = ProgressState::new(7);
    state.advance(1, "Asset");
    ProgressTracker::for_root(temp.path()).save(&state).await.unwrap();

    let client = Arc::new(MockClient::with_objects(&SEVEN).watching(temp.path()));
    let orchestrator = Orchestrator::new(client.clone(), ObjectStore::new(temp.path()));

    let options = FetchOptions {
        resume: true,
        ..sequential_options(3)
    };
    let report = orchestrator.run(&options).await.unwrap();
    assert_eq!(report.start_index, 2);

    // Catalog positions stay absolute: checkpoints land at 3 and 6, not after
    // every third object of this run
    assert_eq!(
        client.seen_counts(),
        counts(&[
            ("Case", Some(2)),
            ("Contact", Some(3)),
            ("Lead", Some(3)),
            ("Opportunity", Some(3)),
            ("Task", Some(6)),
        ])
    );
}
