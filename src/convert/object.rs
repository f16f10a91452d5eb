//! Object converter: one describe result to one `SchemaDocument`.

use std::collections::BTreeMap;

use crate::domain::{
    ChildRelationship, DescribeChildRelationship, DescribeField, DescribeSObjectResult,
    SchemaDocument,
};

use super::field::convert_field;

/// Path segment that precedes the icon version in Salesforce icon URLs
const ICON_MARKER: &str = "/icon/";

/// Whether a field must be supplied when a record is created
pub fn is_required(field: &DescribeField) -> bool {
    !field.nillable && !field.calculated && !field.has_default() && field.createable
}

/// Extract `<rest>` from an icon URL of shape `.../icon/<version>/<rest>`
pub fn extract_icon_path(icon_url: &str) -> Option<String> {
    let start = icon_url.find(ICON_MARKER)? + ICON_MARKER.len();
    let (version, rest) = icon_url[start..].split_once('/')?;
    if version.is_empty() || rest.is_empty() {
        return None;
    }
    Some(rest.to_string())
}

/// Whether a child relationship is worth documenting
fn keep_child_relationship(rel: &DescribeChildRelationship) -> bool {
    !rel.deprecated_and_hidden
        && !rel.child_sobject.is_empty()
        && !rel.child_sobject.ends_with("Feed")
}

fn non_empty(value: &str) -> Option<String> {
    Some(value.to_string()).filter(|v| !v.is_empty())
}

/// Convert one describe result
pub fn convert_object(describe: &DescribeSObjectResult) -> SchemaDocument {
    let properties: BTreeMap<_, _> = describe
        .fields
        .iter()
        .map(|field| (field.name.clone(), convert_field(field)))
        .collect();

    let required: Vec<String> = describe
        .fields
        .iter()
        .filter(|f| is_required(f))
        .map(|f| f.name.clone())
        .collect();

    let name_fields: Vec<String> = describe
        .fields
        .iter()
        .filter(|f| f.name_field)
        .map(|f| f.name.clone())
        .collect();

    let child_relationships: Vec<ChildRelationship> = describe
        .child_relationships
        .iter()
        .filter(|rel| keep_child_relationship(rel))
        .map(|rel| ChildRelationship {
            child_object: rel.child_sobject.clone(),
            field: rel.field.clone(),
            relationship_name: rel.relationship_name.clone(),
            cascade_delete: rel.cascade_delete,
        })
        .collect();

    let icon = describe
        .theme_info
        .as_ref()
        .and_then(|theme| theme.icon_url.as_deref())
        .and_then(extract_icon_path);

    SchemaDocument {
        name: describe.name.clone(),
        description: None,
        label: non_empty(&describe.label),
        label_plural: non_empty(&describe.label_plural),
        properties,
        required: Some(required).filter(|r| !r.is_empty()),
        module: None,
        source_url: None,
        key_prefix: describe.key_prefix.clone().filter(|p| !p.is_empty()),
        icon,
        name_fields: Some(name_fields).filter(|n| !n.is_empty()),
        child_relationships: Some(child_relationships).filter(|c| !c.is_empty()),
        custom: Some(describe.custom),
        createable: Some(describe.createable),
        updateable: Some(describe.updateable),
        deletable: Some(describe.deletable),
        queryable: Some(describe.queryable),
        searchable: Some(describe.searchable),
        extra: BTreeMap::new(),
    }
}
