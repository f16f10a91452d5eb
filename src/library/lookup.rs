//! Read-side lookup over the persisted object tree.
//!
//! The cache is owned by the lookup value rather than living in a global,
//! so callers construct one `ObjectLookup` and share it by reference.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use tokio::fs;
use tracing::{debug, warn};

use crate::config::paths;
use crate::core::merge::DocumentStore;
use crate::core::ObjectStore;
use crate::domain::SchemaDocument;

use super::index::ObjectIndex;

#[derive(Default)]
struct LookupCache {
    index: Option<Arc<ObjectIndex>>,
    objects: HashMap<String, Arc<SchemaDocument>>,
}

/// Cached query surface over an output directory
pub struct ObjectLookup {
    root: PathBuf,
    caching: bool,
    cache: Mutex<LookupCache>,
}

impl ObjectLookup {
    /// Create a caching lookup over an output root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            caching: true,
            cache: Mutex::new(LookupCache::default()),
        }
    }

    /// Enable or disable caching
    pub fn with_caching(mut self, caching: bool) -> Self {
        self.caching = caching;
        self
    }

    fn cache(&self) -> MutexGuard<'_, LookupCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Load the index, building it from the object tree when `index.json` is absent.
    ///
    /// While caching is enabled repeated calls return the same `Arc`.
    pub async fn load_index(&self) -> Result<Arc<ObjectIndex>> {
        if self.caching {
            if let Some(index) = self.cache().index.clone() {
                return Ok(index);
            }
        }

        let path = paths::index_file(&self.root);
        let index = if path.exists() {
            match ObjectIndex::load(&path).await {
                Ok(index) => index,
                Err(e) => {
                    warn!(path = %path.display(), error = %format!("{:#}", e), "Unreadable index, scanning object tree");
                    ObjectStore::new(&self.root).build_index().await?
                }
            }
        } else {
            debug!(root = %self.root.display(), "No index file, scanning object tree");
            ObjectStore::new(&self.root).build_index().await?
        };

        let index = Arc::new(index);
        if self.caching {
            self.cache().index = Some(Arc::clone(&index));
        }
        Ok(index)
    }

    /// Get an object's full document by key or API name
    pub async fn get_object(&self, name: &str) -> Option<Arc<SchemaDocument>> {
        if self.caching {
            if let Some(doc) = self.cache().objects.get(name) {
                return Some(Arc::clone(doc));
            }
        }

        let (path, api_name) = self.locate(name).await?;
        let doc = Arc::new(read_document(&path, &api_name, name).await?);

        if self.caching {
            self.cache()
                .objects
                .insert(name.to_string(), Arc::clone(&doc));
        }
        Some(doc)
    }

    /// Object names matching a substring or glob, case-insensitively
    pub async fn search_objects(&self, pattern: &str) -> Vec<String> {
        match self.load_index().await {
            Ok(index) => index.search(pattern).into_iter().map(str::to_string).collect(),
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Index unavailable");
                Vec::new()
            }
        }
    }

    /// Object names whose description matches a substring or glob
    pub async fn search_objects_by_description(&self, pattern: &str) -> Vec<String> {
        match self.load_index().await {
            Ok(index) => index
                .search_descriptions(pattern)
                .into_iter()
                .map(str::to_string)
                .collect(),
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Index unavailable");
                Vec::new()
            }
        }
    }

    /// Get an object's description; `None` when absent or undocumented
    pub async fn get_object_description(&self, name: &str) -> Option<String> {
        if let Ok(index) = self.load_index().await {
            if let Some((_, entry)) = index.resolve(name) {
                if !entry.description.is_empty() {
                    return Some(entry.description.clone());
                }
            }
        }

        self.get_object(name)
            .await
            .and_then(|doc| doc.description.clone())
            .filter(|description| !description.is_empty())
    }

    /// Drop the cached index and documents
    pub fn clear_cache(&self) {
        let mut cache = self.cache();
        cache.index = None;
        cache.objects.clear();
    }

    /// Find the file and API name for a lookup
    async fn locate(&self, name: &str) -> Option<(PathBuf, String)> {
        if let Ok(index) = self.load_index().await {
            if let Some((key, entry)) = index.resolve(name) {
                let api_name = entry.api_name(key).to_string();
                let path = if entry.file.is_empty() {
                    paths::object_file(&self.root, &api_name)?
                } else {
                    self.root.join(&entry.file)
                };
                return Some((path, api_name));
            }
        }

        let path = paths::object_file(&self.root, name)?;
        Some((path, name.to_string()))
    }
}

/// Read one document from an object file.
///
/// Prefers the API name, then the lookup key, then a single-entry file.
async fn read_document(path: &Path, api_name: &str, key: &str) -> Option<SchemaDocument> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read object file");
            return None;
        }
    };

    let mut store: DocumentStore = match serde_json::from_str(&content) {
        Ok(store) => store,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Corrupt object file");
            return None;
        }
    };

    if let Some(doc) = store.remove(api_name) {
        return Some(doc);
    }
    if let Some(doc) = store.remove(key) {
        return Some(doc);
    }
    if store.len() == 1 {
        return store.into_values().next();
    }
    None
}
