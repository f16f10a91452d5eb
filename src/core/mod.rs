//! Core reconciliation and fetch logic.
//!
//! This module contains:
//! - Merge: reconciling fresh describe output with curated documents
//! - ProgressTracker: resumable checkpoint persistence
//! - ObjectStore: the letter-partitioned object tree
//! - Orchestrator: the bulk describe pass

pub mod merge;
pub mod orchestrator;
pub mod progress;
pub mod store;

// Re-export commonly used types
pub use merge::{merge, DocumentStore};
pub use orchestrator::{
    AppliedObject, FailedObject, FetchOptions, FetchReport, ObjectOutcome, Orchestrator,
};
pub use progress::ProgressTracker;
pub use store::ObjectStore;
