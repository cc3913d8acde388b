//! Type transformer: application-native records <-> wire records
//!
//! Dispatch is an exhaustive match on [`FieldKind`]. Relationship payloads
//! nested by the remote store (`{"Parent": {"Name": ..}}`) are flattened
//! into dotted keys (`Parent.Name`) on the way in and re-nested on the way
//! out. The `attributes` metadata object is dropped at every level.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::{Map, Number, Value as Json};
use sfsync_domain::constants::{ATTRIBUTES_KEY, DATETIME_FORMAT, DATE_FORMAT, MULTI_SELECT_SEPARATOR};
use sfsync_domain::{FieldDefinition, FieldKind, ObjectSchema, Record, Result, SyncError, Value, WireRecord};

use crate::schema::SchemaRegistry;

/// Schema-driven conversion for a registry's object types
pub struct TypeTransformer {
    registry: Arc<SchemaRegistry>,
}

impl TypeTransformer {
    #[must_use]
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }

    /// # Errors
    /// `UnmappedField` for keys the schema does not know; `InvalidValue`
    /// when a value cannot take its field's wire shape.
    pub fn to_wire(&self, object_type: &str, record: &Record) -> Result<WireRecord> {
        let schema = self.registry.schema(object_type)?;
        encode_record(&schema, record)
    }

    /// # Errors
    /// `SchemaDiscovery` when `object_type` has not been discovered.
    pub fn from_wire(&self, object_type: &str, wire: &WireRecord) -> Result<Record> {
        let schema = self.registry.schema(object_type)?;
        Ok(decode_record(&schema, wire))
    }
}

/// Parse a `YYYY-MM-DD` date
pub(crate) fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok()
}

/// Parse the remote's timestamp profile, falling back to RFC 3339
pub(crate) fn parse_datetime(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    DateTime::parse_from_str(text, DATETIME_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(text))
        .ok()
}

/// Encode a record against `schema`
///
/// # Errors
/// See [`TypeTransformer::to_wire`].
pub fn encode_record(schema: &ObjectSchema, record: &Record) -> Result<WireRecord> {
    let mut wire = Map::new();
    for (key, value) in record.iter() {
        if let Some((relationship, rest)) = key.split_once('.') {
            if schema.field_by_relationship(relationship).is_none() {
                return Err(unmapped(schema, key));
            }
            insert_path(&mut wire, relationship, rest, encode_generic(key, value)?);
            continue;
        }

        match schema.field(key) {
            Some(field) => {
                wire.insert(key.to_string(), encode_value(field, value)?);
            }
            None if value.is_null() && schema.field_by_relationship(key).is_some() => {
                wire.insert(key.to_string(), Json::Null);
            }
            None => return Err(unmapped(schema, key)),
        }
    }
    Ok(wire)
}

/// Decode a wire record against `schema`; never fails
///
/// Keys unknown to the schema are decoded by their JSON shape.
pub fn decode_record(schema: &ObjectSchema, wire: &WireRecord) -> Record {
    let mut record = Record::new();
    for (key, json) in wire {
        if key == ATTRIBUTES_KEY {
            continue;
        }
        match (schema.field(key), json) {
            (_, Json::Object(nested)) => flatten_into(&mut record, key, nested),
            (Some(field), json) => {
                record.insert(key.clone(), decode_value(field, json));
            }
            (None, json) => {
                record.insert(key.clone(), decode_generic(json));
            }
        }
    }
    record
}

/// Decode without a schema (ad-hoc query projections)
pub fn decode_untyped(wire: &WireRecord) -> Record {
    let mut record = Record::new();
    for (key, json) in wire {
        match json {
            _ if key == ATTRIBUTES_KEY => {}
            Json::Object(nested) => flatten_into(&mut record, key, nested),
            json => {
                record.insert(key.clone(), decode_generic(json));
            }
        }
    }
    record
}

fn unmapped(schema: &ObjectSchema, key: &str) -> SyncError {
    SyncError::UnmappedField { object_type: schema.object_type.clone(), field: key.to_string() }
}

fn invalid(field: &FieldDefinition, value: &Value) -> SyncError {
    SyncError::InvalidValue {
        field: field.name.clone(),
        message: format!("{} field cannot hold a {} value", field.kind, value.type_name()),
    }
}

fn encode_value(field: &FieldDefinition, value: &Value) -> Result<Json> {
    if value.is_null() {
        return Ok(Json::Null);
    }
    match field.kind {
        FieldKind::Text => Ok(Json::String(value.to_string())),
        FieldKind::Picklist | FieldKind::Reference => match value {
            Value::Text(text) => Ok(Json::String(text.clone())),
            other => Err(invalid(field, other)),
        },
        FieldKind::MultiPicklist => match value {
            Value::List(_) | Value::Text(_) => Ok(Json::String(value.to_string())),
            other => Err(invalid(field, other)),
        },
        FieldKind::Number => match value {
            Value::Number(number) => number_to_json(&field.name, *number),
            Value::Text(text) => number_to_json(&field.name, parse_decimal(field, text)?),
            other => Err(invalid(field, other)),
        },
        FieldKind::Currency => {
            let amount = match value {
                Value::Number(number) => *number,
                Value::Text(text) => parse_decimal(field, text)?,
                other => return Err(invalid(field, other)),
            };
            let rounded = match field.scale {
                Some(scale) => amount.round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven),
                None => amount,
            };
            number_to_json(&field.name, rounded)
        }
        FieldKind::Date => match value {
            Value::Date(date) => Ok(Json::String(date.format(DATE_FORMAT).to_string())),
            Value::DateTime(at) => Ok(Json::String(at.date_naive().format(DATE_FORMAT).to_string())),
            Value::Text(text) => parse_date(text)
                .map(|date| Json::String(date.format(DATE_FORMAT).to_string()))
                .ok_or_else(|| invalid(field, value)),
            other => Err(invalid(field, other)),
        },
        FieldKind::DateTime => match value {
            Value::DateTime(at) => Ok(Json::String(at.format(DATETIME_FORMAT).to_string())),
            Value::Text(text) => parse_datetime(text)
                .map(|at| Json::String(at.format(DATETIME_FORMAT).to_string()))
                .ok_or_else(|| invalid(field, value)),
            other => Err(invalid(field, other)),
        },
        FieldKind::Boolean => match value {
            Value::Bool(flag) => Ok(Json::Bool(*flag)),
            other => Err(invalid(field, other)),
        },
    }
}

fn encode_generic(key: &str, value: &Value) -> Result<Json> {
    match value {
        Value::Null => Ok(Json::Null),
        Value::Bool(flag) => Ok(Json::Bool(*flag)),
        Value::Number(number) => number_to_json(key, *number),
        other => Ok(Json::String(other.to_string())),
    }
}

fn parse_decimal(field: &FieldDefinition, text: &str) -> Result<Decimal> {
    Decimal::from_str(text.trim()).map_err(|err| SyncError::InvalidValue {
        field: field.name.clone(),
        message: format!("not a number: {err}"),
    })
}

/// Integral values go out as JSON integers, everything else as floats
fn number_to_json(field: &str, number: Decimal) -> Result<Json> {
    if number.scale() == 0 {
        if let Some(integer) = number.to_i64() {
            return Ok(Json::Number(integer.into()));
        }
    }
    // through text: the shortest float repr read back in parses to the same f64
    number
        .to_string()
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Json::Number)
        .ok_or_else(|| SyncError::InvalidValue {
            field: field.to_string(),
            message: format!("{number} has no JSON representation"),
        })
}

/// Keeps the textual scale so `5.0` stays a float on the way back out
fn json_to_decimal(number: &Number) -> Option<Decimal> {
    let text = number.to_string();
    Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)).ok()
}

fn decode_value(field: &FieldDefinition, json: &Json) -> Value {
    match (field.kind, json) {
        (_, Json::Null) => Value::Null,
        (FieldKind::Text | FieldKind::Picklist | FieldKind::Reference, Json::String(text)) => {
            Value::Text(text.clone())
        }
        (FieldKind::MultiPicklist, Json::String(text)) if text.is_empty() => Value::List(Vec::new()),
        (FieldKind::MultiPicklist, Json::String(text)) => {
            Value::list(text.split(MULTI_SELECT_SEPARATOR))
        }
        (FieldKind::Number | FieldKind::Currency, Json::Number(number)) => {
            json_to_decimal(number).map_or_else(|| decode_generic(json), Value::Number)
        }
        (FieldKind::Date, Json::String(text)) => {
            parse_date(text).map_or_else(|| Value::Text(text.clone()), Value::Date)
        }
        (FieldKind::DateTime, Json::String(text)) => DateTime::parse_from_str(text, DATETIME_FORMAT)
            .map_or_else(|_| Value::Text(text.clone()), Value::DateTime),
        (FieldKind::Boolean, Json::Bool(flag)) => Value::Bool(*flag),
        (_, json) => decode_generic(json),
    }
}

fn decode_generic(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(flag) => Value::Bool(*flag),
        Json::Number(number) => {
            json_to_decimal(number).map_or_else(|| Value::Text(number.to_string()), Value::Number)
        }
        Json::String(text) => Value::Text(text.clone()),
        Json::Array(items) => Value::List(
            items
                .iter()
                .map(|item| match item {
                    Json::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ),
        Json::Object(_) => Value::Text(json.to_string()),
    }
}

fn flatten_into(record: &mut Record, prefix: &str, nested: &Map<String, Json>) {
    for (key, json) in nested {
        if key == ATTRIBUTES_KEY {
            continue;
        }
        let path = format!("{prefix}.{key}");
        match json {
            Json::Object(deeper) => flatten_into(record, &path, deeper),
            json => {
                record.insert(path, decode_generic(json));
            }
        }
    }
}

fn insert_path(wire: &mut WireRecord, head: &str, rest: &str, value: Json) {
    let slot = wire.entry(head.to_string()).or_insert_with(|| Json::Object(Map::new()));
    if !slot.is_object() {
        *slot = Json::Object(Map::new());
    }
    if let Json::Object(nested) = slot {
        match rest.split_once('.') {
            Some((next, remainder)) => insert_path(nested, next, remainder, value),
            None => {
                nested.insert(rest.to_string(), value);
            }
        }
    }
}
