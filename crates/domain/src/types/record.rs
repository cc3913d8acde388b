//! Application-native records and values

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;

use crate::constants::{DATETIME_FORMAT, DATE_FORMAT, ID_FIELD, MULTI_SELECT_SEPARATOR};

/// Raw JSON object as sent to / received from the remote store
pub type WireRecord = serde_json::Map<String, serde_json::Value>;

/// A single application-native field value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicitly clears the field
    Null,
    Text(String),
    Bool(bool),
    Number(Decimal),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    /// Multi-select values, in selection order
    List(Vec<String>),
    /// File reference from a spreadsheet host; only the URL goes over the wire
    Attachment { url: String, filename: Option<String> },
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(values.into_iter().map(Into::into).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Null, whitespace-only text or an empty selection
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.trim().is_empty(),
            Self::List(items) => items.is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Short name of the value's shape, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::List(_) => "list",
            Self::Attachment { .. } => "attachment",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Text(text) => f.write_str(text),
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Number(number) => write!(f, "{number}"),
            Self::Date(date) => write!(f, "{}", date.format(DATE_FORMAT)),
            Self::DateTime(at) => write!(f, "{}", at.format(DATETIME_FORMAT)),
            Self::List(items) => {
                let separator = MULTI_SELECT_SEPARATOR.to_string();
                f.write_str(&items.join(&separator))
            }
            Self::Attachment { url, .. } => f.write_str(url),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(Decimal::from(value))
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::DateTime(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Field name to value mapping; an absent key means "leave unchanged"
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Present and not blank
    pub fn is_set(&self, field: &str) -> bool {
        self.get(field).is_some_and(|value| !value.is_blank())
    }

    /// Text value of a field, if it holds one
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_text)
    }

    /// Record identifier (`Id`), when present and non-empty
    pub fn id(&self) -> Option<&str> {
        self.text(ID_FIELD).filter(|id| !id.trim().is_empty())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { fields: iter.into_iter().map(|(key, value)| (key.into(), value.into())).collect() }
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values() {
        assert!(Value::Null.is_blank());
        assert!(Value::text("  ").is_blank());
        assert!(Value::List(vec![]).is_blank());
        assert!(!Value::text("Acme").is_blank());
        assert!(!Value::Bool(false).is_blank());
    }

    #[test]
    fn record_builder_and_lookup() {
        let record = Record::new().with("Id", "001000000000001").with("Name", "Acme").with("Phone", Value::Null);

        assert_eq!(record.id(), Some("001000000000001"));
        assert_eq!(record.text("Name"), Some("Acme"));
        assert!(record.contains("Phone"));
        assert!(!record.is_set("Phone"));
        assert_eq!(record.len(), 3);
    }

    #[test]
    fn display_uses_wire_shapes() {
        assert_eq!(Value::list(["A", "B"]).to_string(), "A;B");
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(Value::Date(date).to_string(), "2024-02-29");
        assert_eq!(Value::Null.to_string(), "");
    }

    #[test]
    fn option_converts_to_null() {
        let missing: Option<&str> = None;
        assert_eq!(Value::from(missing), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::text("x"));
    }
}
