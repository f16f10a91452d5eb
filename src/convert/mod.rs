//! Converters from raw describe results to normalized schema documents.
//!
//! - `field`: one describe field to one property descriptor
//! - `object`: one describe result to one schema document

pub mod field;
pub mod object;

pub use field::{convert_field, map_field_type};
pub use object::{convert_object, extract_icon_path, is_required};
