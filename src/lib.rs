//! sfdocs - Salesforce object schema documentation aggregator
//!
//! Fetches object metadata through a describe client, converts it into
//! normalized schema documents, and merges it into a persisted,
//! letter-partitioned file tree without losing curated descriptions.
//!
//! # Architecture
//!
//! Data flows in one direction:
//! - Describe results are converted into `SchemaDocument`s
//! - Each document is merged against the persisted file for that object
//! - A checkpoint records the catalog cursor so long passes can resume
//! - The lookup layer reads the tree back through `index.json`
//!
//! # Modules
//!
//! - `adapters`: Describe clients (Salesforce REST, saved directory)
//! - `convert`: Field and object converters
//! - `core`: Merge engine, checkpointing, object store, bulk orchestrator
//! - `domain`: Data structures (SchemaDocument, describe shapes, ProgressState)
//! - `library`: Index and cached lookup
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Describe every object in the org
//! sfdocs fetch
//!
//! # Pick up where an interrupted pass stopped
//! sfdocs fetch --resume
//!
//! # Look things up
//! sfdocs search "acc*"
//! sfdocs get Account
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod convert;
pub mod core;
pub mod domain;
pub mod library;

// Re-export main types at crate root for convenience
pub use adapters::{DescribeClient, DescribeError, DirectoryClient, SalesforceClient};
pub use core::{merge, FetchOptions, FetchReport, ObjectStore, Orchestrator, ProgressTracker};
pub use domain::{ProgressState, PropertyDescriptor, SchemaDocument};
pub use library::{ObjectIndex, ObjectLookup};
