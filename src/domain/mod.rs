//! Domain types for sfdocs.
//!
//! This module contains the core data structures:
//! - Schema: normalized object and field documents
//! - Describe: raw describe results from Salesforce
//! - Progress: checkpoint record for bulk passes

pub mod describe;
pub mod progress;
pub mod schema;

// Re-export commonly used types
pub use describe::{
    DescribeChildRelationship, DescribeField, DescribeSObjectResult, GlobalDescribe,
    GlobalSObject, PicklistEntry, ThemeInfo,
};
pub use progress::ProgressState;
pub use schema::{
    ChildRelationship, Format, PropertyDescriptor, ReferenceTarget, SchemaDocument, SchemaType,
    UNKNOWN_MODULE,
};
