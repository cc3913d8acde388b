//! Validation engine: schema checks, required fields, business rules
//!
//! Validation never short-circuits. Errors come out in a fixed order:
//! 1. shape errors, in schema field order
//! 2. `required` errors, in schema field order
//! 3. business-rule errors, in rule registration order

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use sfsync_domain::{
    ErrorCode, FieldDefinition, FieldError, FieldKind, ObjectSchema, Record, Result, SyncError,
    ValidationResult, Value,
};
use tracing::debug;

use super::rules::BusinessRule;
use crate::schema::SchemaRegistry;
use crate::transform::{parse_date, parse_datetime};

/// 15- or 18-character record identifier
static RECORD_ID: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^[a-zA-Z0-9]{15}(?:[a-zA-Z0-9]{3})?$").unwrap()
});

/// Validates candidate records against the registry and ordered rules
pub struct ValidationEngine {
    registry: Arc<SchemaRegistry>,
    rules: Vec<Arc<dyn BusinessRule>>,
}

impl ValidationEngine {
    #[must_use]
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry, rules: Vec::new() }
    }

    /// Append a rule; rules run in registration order
    #[must_use]
    pub fn with_rule(mut self, rule: Arc<dyn BusinessRule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn add_rule(&mut self, rule: Arc<dyn BusinessRule>) {
        self.rules.push(rule);
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// Validate `record`; `partial` is for update payloads
    ///
    /// # Errors
    /// - `SchemaDiscovery` when `object_type` has not been discovered
    /// - `UnknownField` for keys that name no schema field, including dotted
    ///   relationship projections
    pub fn validate(&self, object_type: &str, record: &Record, partial: bool) -> Result<ValidationResult> {
        let schema = self.registry.schema(object_type)?;
        let result = validate_against(&schema, &self.rules, record, partial)?;
        if !result.ok {
            debug!(object_type, errors = result.errors.len(), "record failed validation");
        }
        Ok(result)
    }
}

/// Schema-level validation without a registry
///
/// # Errors
/// `UnknownField` as for [`ValidationEngine::validate`].
pub fn validate_against(
    schema: &ObjectSchema,
    rules: &[Arc<dyn BusinessRule>],
    record: &Record,
    partial: bool,
) -> Result<ValidationResult> {
    if let Some(unknown) = record.keys().find(|key| key.contains('.') || schema.field(key).is_none()) {
        return Err(SyncError::UnknownField {
            object_type: schema.object_type.clone(),
            field: unknown.to_string(),
        });
    }

    let mut errors = Vec::new();
    for field in schema.fields() {
        if let Some(value) = record.get(&field.name) {
            check_shape(field, value, &mut errors);
        }
    }

    for field in schema.fields() {
        if !field.is_required_for(record) {
            continue;
        }
        let missing = match record.get(&field.name) {
            None => !partial,
            Some(value) => value.is_blank(),
        };
        if missing {
            errors.push(FieldError::required(&field.name));
        }
    }

    for rule in rules {
        match rule.check(record, schema) {
            Ok(found) => errors.extend(found),
            Err(fault) => errors.push(FieldError::new(
                rule.name(),
                ErrorCode::BusinessRule,
                format!("rule {} could not evaluate the record: {fault}", rule.name()),
            )),
        }
    }

    Ok(ValidationResult::from_errors(errors))
}

fn check_shape(field: &FieldDefinition, value: &Value, errors: &mut Vec<FieldError>) {
    if value.is_null() {
        return;
    }
    let mut push = |code: ErrorCode, message: String| errors.push(FieldError::new(&field.name, code, message));
    let wrong_type = |expected: &str| format!("expected {expected}, got {}", value.type_name());

    match (field.kind, value) {
        (FieldKind::Text, Value::Text(text) | Value::Attachment { url: text, .. }) => {
            if let Some(message) = length_violation(field, text) {
                push(ErrorCode::LengthExceeded, message);
            }
        }
        (FieldKind::Text, _) => push(ErrorCode::InvalidType, wrong_type("text")),

        (FieldKind::Picklist, Value::Text(text)) => {
            if let Some(allowed) = &field.allowed_values {
                if !text.is_empty() && !allowed.contains(text) {
                    push(ErrorCode::InvalidValue, format!("'{text}' is not an allowed value"));
                }
            }
        }
        (FieldKind::Picklist, _) => push(ErrorCode::InvalidType, wrong_type("a picklist value")),

        (FieldKind::MultiPicklist, Value::List(_) | Value::Text(_)) => {
            let selections = match value {
                Value::List(items) => items.clone(),
                _ => value.to_string().split(';').filter(|s| !s.is_empty()).map(str::to_string).collect(),
            };
            if let Some(allowed) = &field.allowed_values {
                let rejected: Vec<&str> =
                    selections.iter().filter(|s| !allowed.contains(*s)).map(String::as_str).collect();
                if !rejected.is_empty() {
                    push(ErrorCode::InvalidValue, format!("not allowed: {}", rejected.join(", ")));
                }
            }
            if let Some(message) = length_violation(field, &value.to_string()) {
                push(ErrorCode::LengthExceeded, message);
            }
        }
        (FieldKind::MultiPicklist, _) => push(ErrorCode::InvalidType, wrong_type("a list of picklist values")),

        (FieldKind::Number | FieldKind::Currency, Value::Number(number)) => {
            if let Some(message) = digits_violation(field, *number) {
                push(ErrorCode::InvalidValue, message);
            }
        }
        (FieldKind::Number | FieldKind::Currency, _) => push(ErrorCode::InvalidType, wrong_type("a number")),

        (FieldKind::Date, Value::Date(_)) => {}
        (FieldKind::Date, Value::Text(text)) if parse_date(text).is_some() => {}
        (FieldKind::Date, _) => push(ErrorCode::InvalidType, wrong_type("a YYYY-MM-DD date")),

        (FieldKind::DateTime, Value::DateTime(_)) => {}
        (FieldKind::DateTime, Value::Text(text)) if parse_datetime(text).is_some() => {}
        (FieldKind::DateTime, _) => push(ErrorCode::InvalidType, wrong_type("an offset timestamp")),

        (FieldKind::Boolean, Value::Bool(_)) => {}
        (FieldKind::Boolean, _) => push(ErrorCode::InvalidType, wrong_type("a boolean")),

        (FieldKind::Reference, Value::Text(id)) => {
            if !id.is_empty() && !RECORD_ID.is_match(id) {
                push(ErrorCode::InvalidValue, format!("'{id}' is not a 15 or 18 character record id"));
            }
        }
        (FieldKind::Reference, _) => push(ErrorCode::InvalidType, wrong_type("a record id")),
    }
}

fn length_violation(field: &FieldDefinition, text: &str) -> Option<String> {
    let max = usize::try_from(field.max_length?).ok()?;
    let length = text.chars().count();
    (length > max).then(|| format!("{length} characters exceeds the limit of {max}"))
}

/// Integer digits are bounded by `precision - scale`; plain numbers may not
/// carry more fractional digits than `scale` (currency is rounded instead)
fn digits_violation(field: &FieldDefinition, number: Decimal) -> Option<String> {
    let scale = field.scale.unwrap_or(0);
    if let Some(precision) = field.precision {
        let integer_digits = integer_digit_count(number);
        let allowed = precision.saturating_sub(scale);
        if integer_digits > allowed {
            return Some(format!("{number} has {integer_digits} integer digits, at most {allowed} allowed"));
        }
    }
    if field.kind == FieldKind::Number && field.scale.is_some() {
        let fractional = number.normalize().scale();
        if fractional > scale {
            return Some(format!("{number} has {fractional} decimal places, at most {scale} allowed"));
        }
    }
    None
}

fn integer_digit_count(number: Decimal) -> u32 {
    let integer = number.trunc().abs().normalize();
    if integer.is_zero() {
        0
    } else {
        u32::try_from(integer.to_string().len()).unwrap_or(u32::MAX)
    }
}
