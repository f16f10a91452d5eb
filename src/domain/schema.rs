//! Normalized, JSON-Schema-like representation of Salesforce objects.
//!
//! A `SchemaDocument` is what gets persisted per object. Known attributes are
//! typed fields; anything else found in a persisted file is kept in a residual
//! `extra` map so hand-edited extension keys survive a read-modify-write cycle.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Module tag applied to objects first discovered by a fetch
pub const UNKNOWN_MODULE: &str = "N/A";

/// One Salesforce object's normalized schema
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDocument {
    /// API name (e.g. "Account", "Invoice__c")
    pub name: String,

    /// Object description (authoritative only when curated)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_plural: Option<String>,

    /// Field name -> descriptor
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyDescriptor>,

    /// Fields that must be supplied on create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,

    /// Cloud/category tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,

    /// Documentation page for standard objects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    /// 3-character record id prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_prefix: Option<String>,

    /// Icon path relative to the org's icon root (e.g. "standard/account_120.png")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_fields: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_relationships: Option<Vec<ChildRelationship>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub createable: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updateable: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletable: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queryable: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub searchable: Option<bool>,

    /// Unrecognized extension keys, preserved verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl SchemaDocument {
    /// Create an empty document for an object
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a property
    pub fn with_property(mut self, name: impl Into<String>, property: PropertyDescriptor) -> Self {
        self.properties.insert(name.into(), property);
        self
    }

    /// Whether the object is custom, judged by the describe flag or the API name suffix
    pub fn is_custom(&self) -> bool {
        self.custom.unwrap_or(false) || self.name.ends_with("__c")
    }

    /// Number of documented fields
    pub fn field_count(&self) -> usize {
        self.properties.len()
    }
}

/// Semantic type tag of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
}

impl SchemaType {
    /// Whether numeric bounds apply to this type
    pub fn is_numeric(self) -> bool {
        matches!(self, SchemaType::Number | SchemaType::Integer)
    }
}

/// Refinement of a property's type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Format {
    Email,
    Uri,
    Date,
    DateTime,
    Currency,
    Percent,
    SalesforceId,
    Byte,
}

/// Target of a reference field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceTarget {
    /// Lookup or master-detail to one object
    Single(String),

    /// Polymorphic reference (e.g. WhoId -> Contact | Lead)
    Many(Vec<String>),
}

/// One field's normalized representation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,

    /// Field label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Curated or help-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Format>,

    /// Allowed values (choice fields only)
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,

    /// Single reference target
    #[serde(rename = "x-object", default, skip_serializing_if = "Option::is_none")]
    pub reference_to: Option<String>,

    /// Polymorphic reference targets
    #[serde(rename = "x-objects", default, skip_serializing_if = "Option::is_none")]
    pub reference_to_any: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,

    /// Step constraint derived from scale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_number: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculated: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissionable: Option<bool>,

    /// Unrecognized extension keys, preserved verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl PropertyDescriptor {
    /// Create a descriptor with a type
    pub fn new(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(schema_type),
            ..Default::default()
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the format
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// Set the allowed values
    pub fn with_enum(mut self, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Current reference target, if any
    pub fn reference(&self) -> Option<ReferenceTarget> {
        if let Some(ref single) = self.reference_to {
            return Some(ReferenceTarget::Single(single.clone()));
        }
        self.reference_to_any
            .as_ref()
            .map(|targets| ReferenceTarget::Many(targets.clone()))
    }

    /// Replace the reference target; a single and a polymorphic target are never both set
    pub fn set_reference(&mut self, target: Option<ReferenceTarget>) {
        self.reference_to = None;
        self.reference_to_any = None;
        match target {
            Some(ReferenceTarget::Single(object)) => self.reference_to = Some(object),
            Some(ReferenceTarget::Many(objects)) => self.reference_to_any = Some(objects),
            None => {}
        }
    }
}

/// A child relationship kept on the parent object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildRelationship {
    pub child_object: String,
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_name: Option<String>,
    #[serde(default)]
    pub cascade_delete: bool,
}
