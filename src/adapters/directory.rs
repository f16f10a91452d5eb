//! Directory-backed describe client for offline runs.
//!
//! Reads describe results previously saved from the REST API:
//!
//! ```text
//! <dir>/
//! ├── global.json        # optional: {"sobjects": [...]} or a bare array
//! ├── Account.json       # describe result for Account
//! └── Invoice__c.json
//! ```
//!
//! Without `global.json` the catalog is every `*.json` file in the directory.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::fs;

use crate::domain::{DescribeSObjectResult, GlobalSObject};

use super::{DescribeClient, DescribeError};

const GLOBAL_FILE: &str = "global.json";

/// Accepts both the REST envelope and a bare list
#[derive(Deserialize)]
#[serde(untagged)]
enum GlobalFile {
    Envelope { sobjects: Vec<GlobalSObject> },
    List(Vec<GlobalSObject>),
}

/// Describe client over a directory of saved describe results
pub struct DirectoryClient {
    dir: PathBuf,
}

impl DirectoryClient {
    /// Create a client for a directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn scan_catalog(&self) -> Result<Vec<GlobalSObject>, DescribeError> {
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| DescribeError::Connection(format!("{}: {}", self.dir.display(), e)))?;

        let mut objects = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DescribeError::Connection(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem == "global" {
                continue;
            }
            objects.push(GlobalSObject {
                name: stem.to_string(),
                label: stem.to_string(),
                custom: stem.ends_with("__c"),
            });
        }

        objects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(objects)
    }
}

#[async_trait]
impl DescribeClient for DirectoryClient {
    fn name(&self) -> &str {
        "directory"
    }

    async fn describe_global(&self) -> Result<Vec<GlobalSObject>, DescribeError> {
        if !self.dir.is_dir() {
            return Err(DescribeError::Connection(format!(
                "describe directory not found: {}",
                self.dir.display()
            )));
        }

        let global_path = self.dir.join(GLOBAL_FILE);
        if !global_path.exists() {
            return self.scan_catalog().await;
        }

        let content = fs::read_to_string(&global_path)
            .await
            .map_err(|e| DescribeError::Connection(e.to_string()))?;

        match serde_json::from_str(&content) {
            Ok(GlobalFile::Envelope { sobjects }) | Ok(GlobalFile::List(sobjects)) => Ok(sobjects),
            Err(e) => Err(DescribeError::Decode(format!("{}: {}", global_path.display(), e))),
        }
    }

    async fn describe_object(&self, name: &str) -> Result<DescribeSObjectResult, DescribeError> {
        let path = self.dir.join(format!("{}.json", name));
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DescribeError::NotFound(name.to_string()))
            }
            Err(e) => return Err(DescribeError::Connection(e.to_string())),
        };

        serde_json::from_str(&content)
            .map_err(|e| DescribeError::Decode(format!("{}: {}", path.display(), e)))
    }
}
