//! Bulk describe pass over the object catalog.
//!
//! Coordinates describe calls, conversion, merging, persistence,
//! checkpointing and rate-limit pauses. Each object's
//! convert-merge-persist cycle runs strictly in catalog order; only the
//! describe calls inside a batch run concurrently.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use tracing::{debug, info, instrument, warn};

use crate::adapters::{DescribeClient, DescribeError};
use crate::config::FetchSettings;
use crate::convert::convert_object;
use crate::domain::{DescribeSObjectResult, GlobalSObject, ProgressState, SchemaDocument};

use super::merge::merge;
use super::progress::ProgressTracker;
use super::store::ObjectStore;

/// Options for one bulk pass
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Objects described concurrently before a pause
    pub batch_size: usize,
    /// Pause after each batch
    pub batch_pause: Duration,
    /// Checkpoint after this many catalog positions
    pub checkpoint_interval: usize,
    /// Continue from the saved checkpoint
    pub resume: bool,
    /// Manual start index; bypasses the checkpoint
    pub start_index: Option<usize>,
    /// Leave custom objects out of the catalog
    pub skip_custom: bool,
    /// Allow-list of names or glob patterns; empty means everything
    pub objects: Vec<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::from(&FetchSettings::default())
    }
}

impl From<&FetchSettings> for FetchOptions {
    fn from(settings: &FetchSettings) -> Self {
        Self {
            batch_size: settings.batch_size,
            batch_pause: Duration::from_millis(settings.batch_pause_ms),
            checkpoint_interval: settings.checkpoint_interval,
            resume: false,
            start_index: None,
            skip_custom: settings.skip_custom,
            objects: settings.objects.clone(),
        }
    }
}

/// What happened to one object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectOutcome {
    /// First time the object was persisted
    Created,
    /// Merged into an existing document
    Updated,
}

/// An object that was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedObject {
    pub name: String,
    pub reason: String,
}

/// Summary of a bulk pass
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    /// Catalog size after filtering
    pub total: usize,
    /// Index the pass started at
    pub start_index: usize,
    /// Objects persisted, in processing order
    pub processed: Vec<String>,
    pub created: usize,
    pub updated: usize,
    pub failed: Vec<FailedObject>,
}

impl FetchReport {
    fn record(&mut self, name: &str, outcome: ObjectOutcome) {
        self.processed.push(name.to_string());
        match outcome {
            ObjectOutcome::Created => self.created += 1,
            ObjectOutcome::Updated => self.updated += 1,
        }
    }

    fn fail(&mut self, name: &str, reason: impl Into<String>) {
        self.failed.push(FailedObject {
            name: name.to_string(),
            reason: reason.into(),
        });
    }
}

/// Result of processing one object
#[derive(Debug, Clone)]
pub struct AppliedObject {
    pub outcome: ObjectOutcome,
    pub document: SchemaDocument,
}

/// Catalog filter built from fetch options
struct ObjectFilter {
    patterns: Vec<Pattern>,
    names: Vec<String>,
    skip_custom: bool,
}

impl ObjectFilter {
    fn new(options: &FetchOptions) -> Self {
        let mut patterns = Vec::new();
        let mut names = Vec::new();
        for entry in &options.objects {
            match Pattern::new(entry) {
                Ok(pattern) => patterns.push(pattern),
                Err(e) => {
                    warn!(pattern = %entry, error = %e, "Invalid object pattern, matching by name");
                    names.push(entry.to_lowercase());
                }
            }
        }

        Self {
            patterns,
            names,
            skip_custom: options.skip_custom,
        }
    }

    fn allows(&self, object: &GlobalSObject) -> bool {
        if self.skip_custom && (object.custom || object.name.ends_with("__c")) {
            return false;
        }
        if self.patterns.is_empty() && self.names.is_empty() {
            return true;
        }

        let options = MatchOptions {
            case_sensitive: false,
            ..Default::default()
        };
        self.patterns
            .iter()
            .any(|p| p.matches_with(&object.name, options))
            || self.names.contains(&object.name.to_lowercase())
    }
}

/// Select the catalog for a pass, preserving describeGlobal order
pub fn select_objects(catalog: Vec<GlobalSObject>, options: &FetchOptions) -> Vec<GlobalSObject> {
    let filter = ObjectFilter::new(options);
    catalog.into_iter().filter(|o| filter.allows(o)).collect()
}

/// Bulk describe orchestrator
pub struct Orchestrator {
    client: Arc<dyn DescribeClient>,
    store: ObjectStore,
    tracker: ProgressTracker,
}

impl Orchestrator {
    /// Create an orchestrator writing into a store; the checkpoint lives in the store root
    pub fn new(client: Arc<dyn DescribeClient>, store: ObjectStore) -> Self {
        let tracker = ProgressTracker::for_root(store.root());
        Self {
            client,
            store,
            tracker,
        }
    }

    /// Run a bulk pass over the catalog
    #[instrument(skip(self, options), fields(client = %self.client.name()))]
    pub async fn run(&self, options: &FetchOptions) -> Result<FetchReport> {
        let catalog = self.client.describe_global().await.with_context(|| {
            format!(
                "Failed to list objects via {}. Check the instance URL and access token \
                 (SF_INSTANCE_URL, SF_ACCESS_TOKEN) or the describe directory",
                self.client.name()
            )
        })?;

        let objects = select_objects(catalog, options);
        let total = objects.len();
        let (start, checkpoint) = self.start_index(options, total).await?;

        info!(total, start, "Starting describe pass");

        let mut state = checkpoint.unwrap_or_else(|| ProgressState::new(total));
        state.total_objects = total;

        let mut report = FetchReport {
            total,
            start_index: start,
            ..Default::default()
        };

        let batch_size = options.batch_size.max(1);
        let interval = options.checkpoint_interval.max(1);
        let mut batch_start = start;

        while batch_start < total {
            let batch_end = (batch_start + batch_size).min(total);
            let names: Vec<String> = objects[batch_start..batch_end]
                .iter()
                .map(|o| o.name.clone())
                .collect();

            debug!(batch_start, batch_end, "Describing batch");
            let results = self.fetch_batch(&names).await;

            for (offset, (name, result)) in names.iter().zip(results).enumerate() {
                let index = batch_start + offset;

                match result {
                    Ok(describe) => match self.apply(describe).await {
                        Ok(applied) => {
                            debug!(object = %name, outcome = ?applied.outcome, "Object persisted");
                            report.record(name, applied.outcome);
                        }
                        Err(e) => {
                            warn!(object = %name, error = %format!("{:#}", e), "Skipping object");
                            report.fail(name, format!("{:#}", e));
                        }
                    },
                    Err(e) if e.is_fatal() => {
                        if state.processed_count > 0 {
                            self.checkpoint(&state).await;
                        }
                        return Err(anyhow::Error::new(e)).with_context(|| {
                            format!(
                                "Aborting pass at {} (index {}). Check connectivity and credentials, \
                                 then rerun with --resume",
                                name, index
                            )
                        });
                    }
                    Err(e) => {
                        warn!(object = %name, error = %e, "Skipping object");
                        report.fail(name, e.to_string());
                    }
                }

                state.advance(index, name.as_str());
                if state.processed_count % interval == 0 {
                    self.checkpoint(&state).await;
                }
            }

            batch_start = batch_end;
            if batch_start < total && !options.batch_pause.is_zero() {
                debug!(pause_ms = options.batch_pause.as_millis() as u64, "Pausing between batches");
                tokio::time::sleep(options.batch_pause).await;
            }
        }

        if let Err(e) = self.tracker.clear().await {
            warn!(error = %e, "Failed to clear checkpoint");
        }
        if let Err(e) = self.store.rebuild_index().await {
            warn!(error = %format!("{:#}", e), "Failed to rebuild index");
        }

        info!(
            processed = report.processed.len(),
            created = report.created,
            updated = report.updated,
            failed = report.failed.len(),
            "Describe pass complete"
        );
        Ok(report)
    }

    /// Describe, convert, merge and persist a single object
    #[instrument(skip(self))]
    pub async fn process_object(&self, name: &str) -> Result<AppliedObject> {
        let describe = self
            .client
            .describe_object(name)
            .await
            .with_context(|| format!("Failed to describe {}", name))?;
        self.apply(describe).await
    }

    /// Resolve where the pass starts
    async fn start_index(
        &self,
        options: &FetchOptions,
        total: usize,
    ) -> Result<(usize, Option<ProgressState>)> {
        if let Some(index) = options.start_index {
            info!(index, "Using manual start index");
            return Ok((index, None));
        }

        if options.resume {
            match self.tracker.load().await {
                Some(state) => {
                    if state.total_objects != total {
                        warn!(
                            saved = state.total_objects,
                            current = total,
                            "Catalog size changed since checkpoint"
                        );
                    }
                    info!(
                        last = %state.last_processed_object,
                        index = state.resume_index(),
                        "Resuming from checkpoint"
                    );
                    return Ok((state.resume_index(), Some(state)));
                }
                None => info!("No checkpoint found, starting from the beginning"),
            }
            return Ok((0, None));
        }

        self.tracker.clear().await?;
        Ok((0, None))
    }

    /// Describe a batch concurrently, returning results in input order
    async fn fetch_batch(&self, names: &[String]) -> Vec<Result<DescribeSObjectResult, DescribeError>> {
        let handles: Vec<_> = names
            .iter()
            .map(|name| {
                let client = Arc::clone(&self.client);
                let name = name.clone();
                tokio::spawn(async move { client.describe_object(&name).await })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(match handle.await {
                Ok(result) => result,
                Err(e) => Err(DescribeError::Task(e.to_string())),
            });
        }
        results
    }

    /// Convert, merge against the persisted file, and save
    async fn apply(&self, describe: DescribeSObjectResult) -> Result<AppliedObject> {
        let fresh = convert_object(&describe);
        let existing = self.store.load_existing(&fresh.name).await;

        let outcome = if existing.keys().any(|k| k.eq_ignore_ascii_case(&fresh.name)) {
            ObjectOutcome::Updated
        } else {
            ObjectOutcome::Created
        };

        let document = merge(fresh, &existing);
        self.store.save(&document).await?;

        Ok(AppliedObject { outcome, document })
    }

    async fn checkpoint(&self, state: &ProgressState) {
        if let Err(e) = self.tracker.save(state).await {
            warn!(error = %format!("{:#}", e), "Failed to save checkpoint");
        }
    }
}
