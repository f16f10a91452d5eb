//! Field converter: one describe field to one `PropertyDescriptor`.

use crate::domain::{DescribeField, Format, PropertyDescriptor, ReferenceTarget, SchemaType};

/// Largest scale for which a `multipleOf` step is emitted
const MAX_STEP_SCALE: u32 = 8;

/// Map a Salesforce field type (case-insensitive) to a schema type and format.
///
/// Unknown types fall back to a plain string.
pub fn map_field_type(source_type: &str) -> (SchemaType, Option<Format>) {
    match source_type.to_lowercase().as_str() {
        "id" | "reference" => (SchemaType::String, Some(Format::SalesforceId)),
        "email" => (SchemaType::String, Some(Format::Email)),
        "url" => (SchemaType::String, Some(Format::Uri)),
        "date" => (SchemaType::String, Some(Format::Date)),
        "datetime" => (SchemaType::String, Some(Format::DateTime)),
        "base64" => (SchemaType::String, Some(Format::Byte)),
        "currency" => (SchemaType::Number, Some(Format::Currency)),
        "percent" => (SchemaType::Number, Some(Format::Percent)),
        "double" => (SchemaType::Number, None),
        "int" | "long" => (SchemaType::Integer, None),
        "boolean" => (SchemaType::Boolean, None),
        "address" | "location" | "complexvalue" => (SchemaType::Object, None),
        // string, textarea, phone, picklist, multipicklist, combobox,
        // encryptedstring, time, anytype and anything new
        _ => (SchemaType::String, None),
    }
}

/// Whether the source type is a choice field
fn is_picklist(source_type: &str) -> bool {
    matches!(
        source_type.to_lowercase().as_str(),
        "picklist" | "multipicklist"
    )
}

/// Symmetric bound for a decimal with the given precision and scale
pub fn numeric_bound(precision: u32, scale: u32) -> f64 {
    let integer_digits = precision as i32 - scale as i32;
    10f64.powi(integer_digits) - 10f64.powi(-(scale as i32))
}

/// Step for a decimal with the given scale; only scales 1..=8 produce one
pub fn numeric_step(scale: u32) -> Option<f64> {
    if (1..=MAX_STEP_SCALE).contains(&scale) {
        Some(10f64.powi(-(scale as i32)))
    } else {
        None
    }
}

/// Reference target for a list of referenced objects
pub fn reference_target(reference_to: &[String]) -> Option<ReferenceTarget> {
    match reference_to {
        [] => None,
        [single] => Some(ReferenceTarget::Single(single.clone())),
        many => Some(ReferenceTarget::Many(many.to_vec())),
    }
}

fn flag(value: bool) -> Option<bool> {
    value.then_some(true)
}

/// Convert one describe field
pub fn convert_field(field: &DescribeField) -> PropertyDescriptor {
    let (schema_type, format) = map_field_type(&field.field_type);

    let mut prop = PropertyDescriptor {
        schema_type: Some(schema_type),
        format,
        title: Some(field.label.clone()).filter(|l| !l.is_empty()),
        description: field
            .inline_help_text
            .as_ref()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()),
        ..Default::default()
    };

    if is_picklist(&field.field_type) {
        let active: Vec<String> = field
            .picklist_values
            .iter()
            .filter(|p| p.active)
            .map(|p| p.value.clone())
            .collect();
        if !active.is_empty() {
            prop.enum_values = Some(active);
        }
    }

    prop.set_reference(reference_target(&field.reference_to));

    if schema_type == SchemaType::String && field.length > 0 {
        prop.max_length = Some(field.length);
    }

    if schema_type.is_numeric() && field.precision > 0 {
        let bound = numeric_bound(field.precision, field.scale);
        prop.minimum = Some(-bound);
        prop.maximum = Some(bound);
        prop.multiple_of = numeric_step(field.scale);
    }

    prop.nullable = flag(field.nillable);
    prop.read_only = flag(field.calculated || !field.updateable);
    prop.calculated = flag(field.calculated);
    prop.unique = flag(field.unique);
    prop.external_id = flag(field.external_id);
    prop.auto_number = flag(field.auto_number);
    prop.permissionable = flag(field.permissionable);

    prop
}
