//! Describe clients for fetching object metadata.
//!
//! The core only consumes two shapes, a global object list and a per-object
//! describe result, so any source that can produce them plugs in here.

pub mod directory;
pub mod salesforce;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{DescribeSObjectResult, GlobalSObject};

pub use directory::DirectoryClient;
pub use salesforce::SalesforceClient;

/// Errors that can occur while describing objects
#[derive(Debug, Error)]
pub enum DescribeError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode describe result: {0}")]
    Decode(String),

    #[error("Describe task failed: {0}")]
    Task(String),
}

impl DescribeError {
    /// Connectivity and credential failures abort a whole run
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Auth(_))
    }
}

/// Source of object metadata
#[async_trait]
pub trait DescribeClient: Send + Sync {
    /// Human-readable client name
    fn name(&self) -> &str;

    /// List every object the source knows about
    async fn describe_global(&self) -> Result<Vec<GlobalSObject>, DescribeError>;

    /// Full describe of one object
    async fn describe_object(&self, name: &str) -> Result<DescribeSObjectResult, DescribeError>;
}
