//! File-based object store with one JSON file per object.
//!
//! Each file holds `{ "<ObjectName>": <SchemaDocument> }` and lives at
//! `objects/<FirstLetter>/<ObjectName>.json` under the output root.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::paths;
use crate::domain::SchemaDocument;
use crate::library::ObjectIndex;

use super::merge::DocumentStore;

/// Persisted object tree
#[derive(Debug, Clone)]
pub struct ObjectStore {
    root: PathBuf,
}

impl ObjectStore {
    /// Open a store rooted at a directory (created lazily on first write)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the output root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of an object's file
    pub fn object_path(&self, name: &str) -> Result<PathBuf> {
        paths::object_file(&self.root, name)
            .with_context(|| format!("Invalid object name: {:?}", name))
    }

    /// Path of the master index
    pub fn index_path(&self) -> PathBuf {
        paths::index_file(&self.root)
    }

    /// Load the persisted documents for an object.
    ///
    /// A missing or unreadable file yields an empty store so the object is
    /// treated as new.
    pub async fn load_existing(&self, name: &str) -> DocumentStore {
        let path = match self.object_path(name) {
            Ok(path) => path,
            Err(e) => {
                warn!(object = name, error = %e, "Cannot locate object file");
                return DocumentStore::new();
            }
        };

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(object = name, "No persisted file");
                return DocumentStore::new();
            }
            Err(e) => {
                warn!(object = name, path = %path.display(), error = %e, "Failed to read object file, treating as new");
                return DocumentStore::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(store) => store,
            Err(e) => {
                warn!(object = name, path = %path.display(), error = %e, "Corrupt object file, treating as new");
                DocumentStore::new()
            }
        }
    }

    /// Load one document, if persisted
    pub async fn load_document(&self, name: &str) -> Option<SchemaDocument> {
        let mut store = self.load_existing(name).await;
        store.remove(name)
    }

    /// Persist a document, replacing its file atomically
    pub async fn save(&self, doc: &SchemaDocument) -> Result<PathBuf> {
        let path = self.object_path(&doc.name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut wrapper = DocumentStore::new();
        wrapper.insert(doc.name.clone(), doc.clone());
        let content = serde_json::to_string_pretty(&wrapper)?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .await
            .with_context(|| format!("Failed to write object file: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &path)
            .await
            .with_context(|| format!("Failed to replace object file: {}", path.display()))?;

        debug!(object = %doc.name, path = %path.display(), "Object saved");
        Ok(path)
    }

    /// Load every persisted document, skipping unreadable files
    pub async fn list_documents(&self) -> Result<Vec<SchemaDocument>> {
        let objects_dir = self.root.join(paths::OBJECTS_DIR);
        let mut docs = Vec::new();

        if !objects_dir.exists() {
            return Ok(docs);
        }

        let mut partitions = fs::read_dir(&objects_dir).await?;
        while let Some(partition) = partitions.next_entry().await? {
            if !partition.file_type().await?.is_dir() {
                continue;
            }

            let mut entries = fs::read_dir(partition.path()).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }

                let content = match fs::read_to_string(&path).await {
                    Ok(content) => content,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Skipping unreadable object file");
                        continue;
                    }
                };

                match serde_json::from_str::<DocumentStore>(&content) {
                    Ok(store) => docs.extend(store.into_values()),
                    Err(e) => warn!(path = %path.display(), error = %e, "Skipping corrupt object file"),
                }
            }
        }

        docs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(docs)
    }

    /// Build the index from the persisted tree
    pub async fn build_index(&self) -> Result<ObjectIndex> {
        let docs = self.list_documents().await?;
        Ok(ObjectIndex::from_documents(&docs))
    }

    /// Rebuild and write `index.json`
    pub async fn rebuild_index(&self) -> Result<ObjectIndex> {
        let index = self.build_index().await?;
        index.save(&self.index_path()).await?;
        info!(objects = index.total_objects, "Index rebuilt");
        Ok(index)
    }
}
