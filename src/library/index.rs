//! Master index of all persisted objects.
//!
//! Simple JSON summary (`index.json`) that can be searched without loading
//! every object file.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::warn;

use crate::config::paths;
use crate::domain::SchemaDocument;

/// Current index format version
pub const INDEX_VERSION: u32 = 1;

/// Index of all persisted objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectIndex {
    /// Index format version
    pub version: u32,

    /// Number of indexed objects
    pub total_objects: usize,

    /// When the index was generated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,

    /// Lookup key -> summary
    #[serde(default)]
    pub objects: BTreeMap<String, IndexEntry>,
}

impl Default for ObjectIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of one object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    /// API name, when the index key is something else (e.g. a display name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub field_count: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Object file, relative to the index
    pub file: String,
}

impl IndexEntry {
    /// Summarize a document
    pub fn from_document(doc: &SchemaDocument) -> Self {
        let file = paths::object_relative_path(&doc.name)
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();

        Self {
            name: None,
            description: doc.description.clone().unwrap_or_default(),
            field_count: doc.field_count(),
            label: doc.label.clone(),
            file,
        }
    }

    /// API name of the entry, falling back to its key
    pub fn api_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(key)
    }
}

/// Case-insensitive name/description matcher.
///
/// Patterns containing `*`, `?` or `[` are treated as globs over the whole
/// value; anything else is a substring match.
#[derive(Debug, Clone)]
pub enum TextMatcher {
    Substring(String),
    Glob(Pattern),
}

impl TextMatcher {
    /// Build a matcher from user input
    pub fn new(pattern: &str) -> Self {
        let is_glob = pattern.contains(['*', '?', '[']);
        if is_glob {
            match Pattern::new(pattern) {
                Ok(glob) => return Self::Glob(glob),
                Err(e) => warn!(pattern, error = %e, "Invalid pattern, using substring match"),
            }
        }
        Self::Substring(pattern.to_lowercase())
    }

    /// Check a value
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Substring(needle) => value.to_lowercase().contains(needle),
            Self::Glob(glob) => glob.matches_with(
                value,
                MatchOptions {
                    case_sensitive: false,
                    ..Default::default()
                },
            ),
        }
    }
}

impl ObjectIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self {
            version: INDEX_VERSION,
            total_objects: 0,
            generated_at: None,
            objects: BTreeMap::new(),
        }
    }

    /// Build an index from documents
    pub fn from_documents<'a>(docs: impl IntoIterator<Item = &'a SchemaDocument>) -> Self {
        let mut index = Self::new();
        for doc in docs {
            index.add(doc.name.clone(), IndexEntry::from_document(doc));
        }
        index.generated_at = Some(Utc::now());
        index
    }

    /// Load an index from disk
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read index: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse index JSON: {}", path.display()))
    }

    /// Save the index to disk
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write index: {}", path.display()))?;

        Ok(())
    }

    /// Add or replace an entry
    pub fn add(&mut self, key: String, entry: IndexEntry) {
        self.objects.insert(key, entry);
        self.total_objects = self.objects.len();
    }

    /// Get an entry by exact key
    pub fn get(&self, key: &str) -> Option<&IndexEntry> {
        self.objects.get(key)
    }

    /// Resolve an object by key or API name.
    ///
    /// An exact key match wins; otherwise entries are scanned in key order for
    /// one whose `name` attribute equals the query.
    pub fn resolve(&self, query: &str) -> Option<(&str, &IndexEntry)> {
        let by_name = self
            .objects
            .iter()
            .find(|(_, entry)| entry.name.as_deref() == Some(query));

        if let Some((key, entry)) = self.objects.get_key_value(query) {
            if let Some((other_key, _)) = by_name.filter(|(k, _)| k.as_str() != query) {
                warn!(
                    query,
                    key = %key,
                    other = %other_key,
                    "Lookup matches one entry by key and another by name; using the key match"
                );
            }
            return Some((key.as_str(), entry));
        }

        by_name.map(|(key, entry)| (key.as_str(), entry))
    }

    /// Keys whose key, API name or label match the pattern
    pub fn search(&self, pattern: &str) -> Vec<&str> {
        let matcher = TextMatcher::new(pattern);
        self.objects
            .iter()
            .filter(|(key, entry)| {
                matcher.matches(key)
                    || entry.name.as_deref().is_some_and(|n| matcher.matches(n))
                    || entry.label.as_deref().is_some_and(|l| matcher.matches(l))
            })
            .map(|(key, _)| key.as_str())
            .collect()
    }

    /// Keys whose description matches the pattern
    pub fn search_descriptions(&self, pattern: &str) -> Vec<&str> {
        let matcher = TextMatcher::new(pattern);
        self.objects
            .iter()
            .filter(|(_, entry)| matcher.matches(&entry.description))
            .map(|(key, _)| key.as_str())
            .collect()
    }
}
