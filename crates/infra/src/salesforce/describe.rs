//! Mapping of describe metadata onto field definitions

use sfsync_domain::{FieldDefinition, FieldKind, ObjectSchema, Result};
use tracing::debug;

use super::types::{DescribeField, DescribeResponse};

/// Kind of a remote field type; `None` for compound types that are skipped
pub(crate) fn kind_for(field_type: &str) -> Option<FieldKind> {
    let kind = match field_type {
        "picklist" => FieldKind::Picklist,
        "multipicklist" => FieldKind::MultiPicklist,
        "double" | "int" | "long" | "percent" => FieldKind::Number,
        "currency" => FieldKind::Currency,
        "date" => FieldKind::Date,
        "datetime" => FieldKind::DateTime,
        "boolean" => FieldKind::Boolean,
        "id" | "reference" => FieldKind::Reference,
        "address" | "location" => return None,
        "string" | "textarea" | "phone" | "url" | "email" | "combobox" | "encryptedstring" | "time"
        | "base64" | "anyType" => FieldKind::Text,
        other => {
            debug!(field_type = other, "unrecognised field type treated as text");
            FieldKind::Text
        }
    };
    Some(kind)
}

fn definition(field: DescribeField) -> Option<FieldDefinition> {
    let kind = kind_for(&field.field_type)?;
    let required = field.createable && !field.nillable && !field.defaulted_on_create;

    let mut definition = FieldDefinition::new(field.name, kind);
    if !field.label.is_empty() {
        definition = definition.label(field.label);
    }
    if required {
        definition = definition.required();
    }

    match kind {
        FieldKind::Text if field.length > 0 => definition = definition.max_length(field.length),
        FieldKind::Number | FieldKind::Currency => {
            // integer types report their size in `digits`
            if field.field_type == "int" || field.field_type == "long" {
                if field.digits > 0 {
                    definition = definition.digits(field.digits, 0);
                }
            } else if field.precision > 0 {
                definition = definition.digits(field.precision, field.scale);
            }
        }
        FieldKind::Picklist | FieldKind::MultiPicklist => {
            definition = definition.allowed_values(
                field.picklist_values.into_iter().filter(|entry| entry.active).map(|entry| entry.value),
            );
        }
        FieldKind::Reference => {
            if let Some(target) = field.reference_to.into_iter().next() {
                definition = definition.references(target, field.relationship_name.as_deref());
            }
        }
        _ => {}
    }

    Some(definition)
}

/// Build the schema of a describe response, skipping compound fields
pub(crate) fn into_schema(response: DescribeResponse) -> Result<ObjectSchema> {
    let fields = response.fields.into_iter().filter_map(definition).collect();
    ObjectSchema::new(response.name, fields)
}
