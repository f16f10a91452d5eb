//! Read-side access to the persisted object tree.
//!
//! # Storage Layout
//!
//! ```text
//! <output>/
//! ├── index.json                # Summary of all persisted objects
//! ├── .describe-progress.json   # Checkpoint, present only mid-pass
//! └── objects/
//!     └── <FirstLetter>/
//!         └── <ObjectName>.json # {"<ObjectName>": <SchemaDocument>}
//! ```

pub mod index;
pub mod lookup;

pub use index::{IndexEntry, ObjectIndex, TextMatcher, INDEX_VERSION};
pub use lookup::ObjectLookup;
