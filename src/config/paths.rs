//! Canonical layout of the persisted object tree.
//!
//! Single source of truth - import this instead of hardcoding paths.
//!
//! ```text
//! <output>/
//! ├── index.json                  # Master index of all objects
//! ├── .describe-progress.json     # Checkpoint of an interrupted bulk pass
//! └── objects/
//!     └── <FirstLetter>/
//!         └── <ObjectName>.json   # { "<ObjectName>": <SchemaDocument> }
//! ```

use std::path::{Path, PathBuf};

use anyhow::Result;

/// Directory holding the letter partitions
pub const OBJECTS_DIR: &str = "objects";

/// Master index file name
pub const INDEX_FILE: &str = "index.json";

/// Checkpoint file name
pub const PROGRESS_FILE: &str = ".describe-progress.json";

/// Partition for an object name: its first character, uppercased
pub fn partition(object_name: &str) -> Option<String> {
    object_name
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
}

/// Path of an object's file relative to the output root
pub fn object_relative_path(object_name: &str) -> Option<PathBuf> {
    let letter = partition(object_name)?;
    Some(
        PathBuf::from(OBJECTS_DIR)
            .join(letter)
            .join(format!("{}.json", object_name)),
    )
}

/// Path of an object's file under a root
pub fn object_file(root: &Path, object_name: &str) -> Option<PathBuf> {
    object_relative_path(object_name).map(|rel| root.join(rel))
}

/// Path of the master index under a root
pub fn index_file(root: &Path) -> PathBuf {
    root.join(INDEX_FILE)
}

/// Path of the checkpoint under a root
pub fn progress_file(root: &Path) -> PathBuf {
    root.join(PROGRESS_FILE)
}

/// Path of the master index under the configured output directory
pub fn default_index_file() -> Result<PathBuf> {
    Ok(index_file(&crate::config::output_dir()?))
}

/// Path of the checkpoint under the configured output directory
pub fn default_progress_file() -> Result<PathBuf> {
    Ok(progress_file(&crate::config::output_dir()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_uppercases_first_letter() {
        assert_eq!(partition("account").as_deref(), Some("A"));
        assert_eq!(partition("Zone__c").as_deref(), Some("Z"));
        assert_eq!(partition(""), None);
    }

    #[test]
    fn test_object_file_layout() {
        let root = PathBuf::from("/data");
        assert_eq!(
            object_file(&root, "Account"),
            Some(PathBuf::from("/data/objects/A/Account.json"))
        );
        assert_eq!(
            object_relative_path("opportunity"),
            Some(PathBuf::from("objects/O/opportunity.json"))
        );
        assert_eq!(object_file(&root, ""), None);
    }

    #[test]
    fn test_fixed_files() {
        let root = PathBuf::from("/data");
        assert_eq!(index_file(&root), PathBuf::from("/data/index.json"));
        assert_eq!(
            progress_file(&root),
            PathBuf::from("/data/.describe-progress.json")
        );
    }
}
