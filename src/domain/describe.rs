//! Raw describe results as returned by the Salesforce REST API.
//!
//! Only the attributes the converters consume are modeled. Every field has a
//! default so partial fixtures and older API versions still parse.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of a describeGlobal response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSObject {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub custom: bool,
}

/// Envelope of `GET /services/data/vXX.X/sobjects`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalDescribe {
    #[serde(default)]
    pub sobjects: Vec<GlobalSObject>,
}

/// Full describe of one object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DescribeSObjectResult {
    pub name: String,
    pub label: String,
    pub label_plural: String,
    pub fields: Vec<DescribeField>,
    pub createable: bool,
    pub updateable: bool,
    pub deletable: bool,
    pub queryable: bool,
    pub searchable: bool,
    pub custom: bool,
    pub key_prefix: Option<String>,
    pub theme_info: Option<ThemeInfo>,
    pub child_relationships: Vec<DescribeChildRelationship>,
}

/// Icon and color information attached to an object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThemeInfo {
    pub color: Option<String>,
    pub icon_url: Option<String>,
}

/// Describe of one field
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DescribeField {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub inline_help_text: Option<String>,
    pub length: u32,
    pub precision: u32,
    pub scale: u32,
    pub nillable: bool,
    pub calculated: bool,
    pub createable: bool,
    pub updateable: bool,
    pub unique: bool,
    pub external_id: bool,
    pub auto_number: bool,
    pub permissionable: bool,
    pub name_field: bool,
    pub default_value: Option<Value>,
    pub default_value_formula: Option<String>,
    pub picklist_values: Vec<PicklistEntry>,
    pub reference_to: Vec<String>,
    pub relationship_name: Option<String>,
}

impl DescribeField {
    /// Create a field with a name and source type
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            field_type: field_type.into(),
            updateable: true,
            createable: true,
            ..Default::default()
        }
    }

    /// Whether a default value or default formula is configured
    pub fn has_default(&self) -> bool {
        let has_value = matches!(&self.default_value, Some(v) if !v.is_null());
        let has_formula = self
            .default_value_formula
            .as_deref()
            .is_some_and(|f| !f.is_empty());
        has_value || has_formula
    }
}

/// One picklist value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PicklistEntry {
    pub value: String,
    pub label: Option<String>,
    pub active: bool,
    pub default_value: bool,
}

impl PicklistEntry {
    /// Create an entry
    pub fn new(value: impl Into<String>, active: bool) -> Self {
        Self {
            value: value.into(),
            active,
            ..Default::default()
        }
    }
}

/// A child relationship as described by the parent object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DescribeChildRelationship {
    #[serde(rename = "childSObject")]
    pub child_sobject: String,
    pub field: String,
    pub relationship_name: Option<String>,
    pub cascade_delete: bool,
    pub deprecated_and_hidden: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rest_describe_fragment() {
        let json = r#"{
            "name": "Account",
            "label": "Account",
            "labelPlural": "Accounts",
            "keyPrefix": "001",
            "createable": true,
            "themeInfo": {"color": "7F8DE1", "iconUrl": "https://x.my.salesforce.com/img/icon/t4v35/standard/account_120.png"},
            "fields": [
                {"name": "Name", "type": "string", "length": 255, "nillable": false, "createable": true,
                 "defaultValue": null, "picklistValues": [], "referenceTo": []}
            ],
            "childRelationships": [
                {"childSObject": "Contact", "field": "AccountId", "relationshipName": "Contacts",
                 "cascadeDelete": false, "deprecatedAndHidden": false}
            ],
            "urls": {"describe": "/services/data/v60.0/sobjects/Account/describe"}
        }"#;

        let describe: DescribeSObjectResult = serde_json::from_str(json).unwrap();
        assert_eq!(describe.key_prefix.as_deref(), Some("001"));
        assert_eq!(describe.fields[0].field_type, "string");
        assert_eq!(describe.fields[0].length, 255);
        assert!(!describe.fields[0].has_default());
        assert_eq!(describe.child_relationships[0].child_sobject, "Contact");
    }

    #[test]
    fn test_has_default() {
        let mut field = DescribeField::new("Status", "picklist");
        assert!(!field.has_default());

        field.default_value = Some(Value::Bool(false));
        assert!(field.has_default());

        field.default_value = None;
        field.default_value_formula = Some("TODAY()".to_string());
        assert!(field.has_default());
    }
}
