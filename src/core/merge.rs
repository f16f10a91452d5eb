//! Merge engine: reconciles a freshly converted document with the curated store.
//!
//! Curated prose (object description, module, source URL and field
//! descriptions) always comes from the existing document. Machine-derived
//! attributes are refreshed from the fetch. Custom fields never go through the
//! two-sided merge; they only enter through the fresh-only branch.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::domain::{PropertyDescriptor, SchemaDocument, UNKNOWN_MODULE};

/// Markers that identify custom fields in API names
pub const CUSTOM_FIELD_MARKERS: [&str; 2] = ["__c", "__pc"];

/// Base URL of the Salesforce object reference
const OBJECT_REFERENCE_BASE: &str =
    "https://developer.salesforce.com/docs/atlas.en-us.object_reference.meta/object_reference";

/// Persisted documents keyed by object name
pub type DocumentStore = BTreeMap<String, SchemaDocument>;

/// Whether a field name carries a custom-field marker
pub fn is_custom_field(name: &str) -> bool {
    CUSTOM_FIELD_MARKERS.iter().any(|marker| name.contains(marker))
}

/// Documentation URL for a standard object
pub fn object_reference_url(object_name: &str) -> String {
    format!(
        "{}/sforce_api_objects_{}.htm",
        OBJECT_REFERENCE_BASE,
        object_name.to_lowercase()
    )
}

/// Fallback description for a field nobody has documented yet
pub fn fallback_field_description(field_name: &str) -> String {
    format!("{} field", field_name)
}

/// Fallback description for an object nobody has documented yet
pub fn fallback_object_description(object_name: &str) -> String {
    format!("{} object", object_name)
}

/// Merge a fresh document against the store, producing the document to persist.
pub fn merge(fresh: SchemaDocument, store: &DocumentStore) -> SchemaDocument {
    let key = fresh_key(store, &fresh.name);
    merge_document(fresh, store.get(&key))
}

fn fresh_key(store: &DocumentStore, name: &str) -> String {
    if store.contains_key(name) {
        return name.to_string();
    }
    // Persisted files written by hand sometimes differ in case only
    store
        .keys()
        .find(|k| k.eq_ignore_ascii_case(name))
        .cloned()
        .unwrap_or_else(|| name.to_string())
}

/// Merge a fresh document with an optional existing one.
pub fn merge_document(fresh: SchemaDocument, existing: Option<&SchemaDocument>) -> SchemaDocument {
    match existing {
        None => new_document(fresh),
        Some(existing) => reconcile(fresh, existing),
    }
}

/// Build the document for an object that has never been persisted
fn new_document(fresh: SchemaDocument) -> SchemaDocument {
    debug!(object = %fresh.name, "No existing entry, creating new document");

    let source_url = if fresh.is_custom() {
        None
    } else {
        Some(object_reference_url(&fresh.name))
    };

    let description = fresh
        .description
        .clone()
        .unwrap_or_else(|| fallback_object_description(&fresh.name));

    let properties = fresh
        .properties
        .into_iter()
        .map(|(name, prop)| {
            let prop = with_fallback_description(&name, prop);
            (name, prop)
        })
        .collect();

    SchemaDocument {
        description: Some(description),
        module: Some(UNKNOWN_MODULE.to_string()),
        source_url,
        properties,
        ..fresh
    }
}

/// Reconcile a fresh document with a curated one
fn reconcile(fresh: SchemaDocument, existing: &SchemaDocument) -> SchemaDocument {
    debug!(object = %existing.name, "Merging with existing document");

    let properties = merge_properties(&fresh.properties, &existing.properties);

    let mut extra = existing.extra.clone();
    extra.extend(fresh.extra);

    SchemaDocument {
        name: fresh.name,
        // Curated fields, never taken from the fetch
        description: existing.description.clone(),
        module: existing.module.clone(),
        source_url: existing.source_url.clone(),
        // Machine-derived fields: fresh when defined
        label: fresh.label.or_else(|| existing.label.clone()),
        label_plural: fresh.label_plural.or_else(|| existing.label_plural.clone()),
        properties,
        required: fresh.required.or_else(|| existing.required.clone()),
        key_prefix: fresh.key_prefix.or_else(|| existing.key_prefix.clone()),
        icon: fresh.icon.or_else(|| existing.icon.clone()),
        name_fields: fresh.name_fields.or_else(|| existing.name_fields.clone()),
        child_relationships: fresh
            .child_relationships
            .or_else(|| existing.child_relationships.clone()),
        custom: fresh.custom.or(existing.custom),
        createable: fresh.createable.or(existing.createable),
        updateable: fresh.updateable.or(existing.updateable),
        deletable: fresh.deletable.or(existing.deletable),
        queryable: fresh.queryable.or(existing.queryable),
        searchable: fresh.searchable.or(existing.searchable),
        extra,
    }
}

/// Merge property maps over the union of names
pub fn merge_properties(
    fresh: &BTreeMap<String, PropertyDescriptor>,
    existing: &BTreeMap<String, PropertyDescriptor>,
) -> BTreeMap<String, PropertyDescriptor> {
    let names: BTreeSet<&String> = fresh.keys().chain(existing.keys()).collect();
    let mut merged = BTreeMap::new();

    for name in names {
        let prop = match (fresh.get(name), existing.get(name)) {
            // Custom fields are never reconciled; the fetch is authoritative
            (Some(f), Some(_)) if is_custom_field(name) => {
                with_fallback_description(name, f.clone())
            }
            (Some(f), Some(e)) => merge_property(f, e),
            (None, Some(e)) => e.clone(),
            (Some(f), None) => with_fallback_description(name, f.clone()),
            (None, None) => continue,
        };
        merged.insert(name.clone(), prop);
    }

    merged
}

/// Two-sided merge of one property
pub fn merge_property(fresh: &PropertyDescriptor, existing: &PropertyDescriptor) -> PropertyDescriptor {
    PropertyDescriptor {
        schema_type: existing.schema_type.or(fresh.schema_type),
        description: existing.description.clone(),
        // Everything below is machine-derived: fresh when defined, else omitted
        ..fresh.clone()
    }
}

fn with_fallback_description(name: &str, mut prop: PropertyDescriptor) -> PropertyDescriptor {
    if prop.description.is_none() {
        prop.description = Some(fallback_field_description(name));
    }
    prop
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Format, SchemaType};

    fn store_with(doc: SchemaDocument) -> DocumentStore {
        let mut store = DocumentStore::new();
        store.insert(doc.name.clone(), doc);
        store
    }

    #[test]
    fn test_custom_field_markers() {
        assert!(is_custom_field("Region__c"));
        assert!(is_custom_field("Loyalty__pc"));
        assert!(!is_custom_field("AccountId"));
    }

    #[test]
    fn test_new_document_tags_unknown_module() {
        let fresh = SchemaDocument::new("Account")
            .with_property("Name", PropertyDescriptor::new(SchemaType::String));

        let merged = merge(fresh, &DocumentStore::new());
        assert_eq!(merged.module.as_deref(), Some(UNKNOWN_MODULE));
        assert_eq!(merged.description.as_deref(), Some("Account object"));
        assert_eq!(
            merged.source_url.as_deref(),
            Some(
                "https://developer.salesforce.com/docs/atlas.en-us.object_reference.meta/object_reference/sforce_api_objects_account.htm"
            )
        );
        assert_eq!(
            merged.properties["Name"].description.as_deref(),
            Some("Name field")
        );
    }

    #[test]
    fn test_new_custom_object_has_no_source_url() {
        let merged = merge(SchemaDocument::new("Invoice__c"), &DocumentStore::new());
        assert!(merged.source_url.is_none());
        assert_eq!(merged.module.as_deref(), Some(UNKNOWN_MODULE));
    }

    #[test]
    fn test_curated_fields_come_from_existing() {
        let mut existing = SchemaDocument::new("Account").with_description("Curated text");
        existing.module = Some("Sales Cloud".to_string());
        existing.source_url = None;

        let mut fresh = SchemaDocument::new("Account").with_description("Fresh text");
        fresh.module = Some("Other".to_string());
        fresh.source_url = Some("https://fresh.example".to_string());

        let merged = merge(fresh, &store_with(existing));
        assert_eq!(merged.description.as_deref(), Some("Curated text"));
        assert_eq!(merged.module.as_deref(), Some("Sales Cloud"));
        assert!(merged.source_url.is_none());
    }

    #[test]
    fn test_both_sides_takes_machine_fields_from_fresh() {
        let mut existing_prop = PropertyDescriptor::new(SchemaType::Number)
            .with_description("Curated")
            .with_format(Format::Percent);
        existing_prop.max_length = Some(10);

        let mut fresh_prop = PropertyDescriptor::new(SchemaType::String)
            .with_description("Help text")
            .with_enum(["A", "B"]);
        fresh_prop.read_only = Some(true);

        let merged = merge_property(&fresh_prop, &existing_prop);
        assert_eq!(merged.schema_type, Some(SchemaType::Number));
        assert_eq!(merged.description.as_deref(), Some("Curated"));
        assert_eq!(merged.enum_values, Some(vec!["A".to_string(), "B".to_string()]));
        assert_eq!(merged.read_only, Some(true));
        // Not defined on the fresh side, so omitted
        assert!(merged.format.is_none());
        assert!(merged.max_length.is_none());
    }

    #[test]
    fn test_empty_existing_description_still_wins() {
        let existing = PropertyDescriptor::new(SchemaType::String).with_description("");
        let fresh = PropertyDescriptor::new(SchemaType::String).with_description("Help");

        assert_eq!(merge_property(&fresh, &existing).description.as_deref(), Some(""));
    }

    #[test]
    fn test_type_falls_back_to_fresh() {
        let existing = PropertyDescriptor::default();
        let fresh = PropertyDescriptor::new(SchemaType::Boolean);
        assert_eq!(
            merge_property(&fresh, &existing).schema_type,
            Some(SchemaType::Boolean)
        );
    }

    #[test]
    fn test_zero_step_is_preserved() {
        let mut fresh = PropertyDescriptor::new(SchemaType::Number);
        fresh.multiple_of = Some(0.0);
        let existing = PropertyDescriptor::new(SchemaType::Number);

        assert_eq!(merge_property(&fresh, &existing).multiple_of, Some(0.0));
    }

    #[test]
    fn test_existing_only_property_kept_verbatim() {
        let mut legacy = PropertyDescriptor::new(SchemaType::String).with_description("Old");
        legacy.extra.insert("x-note".to_string(), serde_json::json!("keep me"));

        let existing = SchemaDocument::new("Account").with_property("Legacy", legacy.clone());
        let merged = merge(SchemaDocument::new("Account"), &store_with(existing));

        assert_eq!(merged.properties["Legacy"], legacy);
    }

    #[test]
    fn test_custom_field_in_both_passes_fresh_through() {
        let existing = SchemaDocument::new("Account").with_property(
            "Region__c",
            PropertyDescriptor::new(SchemaType::String).with_description("Region__c field"),
        );
        let fresh = SchemaDocument::new("Account").with_property(
            "Region__c",
            PropertyDescriptor::new(SchemaType::String)
                .with_description("Sales region for quota")
                .with_enum(["EMEA", "APAC"]),
        );

        let merged = merge(fresh, &store_with(existing));
        let region = &merged.properties["Region__c"];
        assert_eq!(region.description.as_deref(), Some("Sales region for quota"));
        assert_eq!(
            region.enum_values,
            Some(vec!["EMEA".to_string(), "APAC".to_string()])
        );
    }

    #[test]
    fn test_custom_field_in_both_without_help_text_is_synthesized() {
        let existing = SchemaDocument::new("Account").with_property(
            "Loyalty__pc",
            PropertyDescriptor::new(SchemaType::Number).with_description("Old words"),
        );
        let fresh = SchemaDocument::new("Account")
            .with_property("Loyalty__pc", PropertyDescriptor::new(SchemaType::Integer));

        let merged = merge(fresh, &store_with(existing));
        let loyalty = &merged.properties["Loyalty__pc"];
        assert_eq!(loyalty.schema_type, Some(SchemaType::Integer));
        assert_eq!(loyalty.description.as_deref(), Some("Loyalty__pc field"));
    }

    #[test]
    fn test_store_lookup_tolerates_case_difference() {
        let existing = SchemaDocument::new("account").with_description("Curated");
        let merged = merge(SchemaDocument::new("Account"), &store_with(existing));
        assert_eq!(merged.description.as_deref(), Some("Curated"));
    }

    #[test]
    fn test_residual_keys_unioned_fresh_wins() {
        let mut existing = SchemaDocument::new("Account");
        existing.extra.insert("x-a".to_string(), serde_json::json!(1));
        existing.extra.insert("x-b".to_string(), serde_json::json!(1));

        let mut fresh = SchemaDocument::new("Account");
        fresh.extra.insert("x-b".to_string(), serde_json::json!(2));

        let merged = merge(fresh, &store_with(existing));
        assert_eq!(merged.extra["x-a"], 1);
        assert_eq!(merged.extra["x-b"], 2);
    }
}
