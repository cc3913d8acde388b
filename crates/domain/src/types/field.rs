//! Field metadata discovered from the remote store

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::record::{Record, Value};
use crate::errors::{Result, SyncError};
use crate::impl_domain_status_conversions;

/// Closed set of field kinds; remote types are mapped onto these at discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Picklist,
    MultiPicklist,
    Number,
    Currency,
    Date,
    DateTime,
    Boolean,
    Reference,
}

impl_domain_status_conversions!(FieldKind {
    Text => "text",
    Picklist => "picklist",
    MultiPicklist => "multi_picklist",
    Number => "number",
    Currency => "currency",
    Date => "date",
    DateTime => "datetime",
    Boolean => "boolean",
    Reference => "reference",
});

type Predicate = dyn Fn(&Record) -> bool + Send + Sync;

/// Conditional-required predicate evaluated against the candidate record
#[derive(Clone)]
pub struct RequiredWhen {
    description: String,
    predicate: Arc<Predicate>,
}

impl RequiredWhen {
    pub fn new<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        Self { description: description.into(), predicate: Arc::new(predicate) }
    }

    pub fn applies(&self, record: &Record) -> bool {
        (self.predicate)(record)
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for RequiredWhen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequiredWhen").field("description", &self.description).finish()
    }
}

/// Required when `field` currently holds `value`
pub fn field_equals(field: impl Into<String>, value: impl Into<Value>) -> RequiredWhen {
    let field = field.into();
    let value = value.into();
    RequiredWhen::new(format!("{field} == {value}"), move |record: &Record| {
        record.get(&field) == Some(&value)
    })
}

/// Metadata of one field of an object type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub max_length: Option<u32>,
    /// Total digit count of numeric fields
    pub precision: Option<u32>,
    /// Fractional digit count of numeric fields
    pub scale: Option<u32>,
    pub allowed_values: Option<BTreeSet<String>>,
    pub reference_target: Option<String>,
    /// Name under which the related object is nested (`ParentId` -> `Parent`)
    pub relationship_name: Option<String>,
    #[serde(skip)]
    pub required_when: Option<RequiredWhen>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            kind,
            required: false,
            max_length: None,
            precision: None,
            scale: None,
            allowed_values: None,
            reference_target: None,
            relationship_name: None,
            required_when: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn digits(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn references(mut self, target: impl Into<String>, relationship: Option<&str>) -> Self {
        self.reference_target = Some(target.into());
        self.relationship_name = relationship.map(str::to_string);
        self
    }

    pub fn required_when(mut self, rule: RequiredWhen) -> Self {
        self.required_when = Some(rule);
        self
    }

    /// Static flag or conditional predicate
    pub fn is_required_for(&self, record: &Record) -> bool {
        self.required || self.required_when.as_ref().is_some_and(|rule| rule.applies(record))
    }
}

/// Ordered field definitions of one object type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectSchema {
    pub object_type: String,
    fields: Vec<FieldDefinition>,
}

impl ObjectSchema {
    /// Build a schema, rejecting duplicate field names
    pub fn new(object_type: impl Into<String>, fields: Vec<FieldDefinition>) -> Result<Self> {
        let object_type = object_type.into();
        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SyncError::SchemaDiscovery {
                    object_type,
                    message: format!("duplicate field {}", field.name),
                });
            }
        }
        Ok(Self { object_type, fields })
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Reference field whose related object is nested under `relationship`
    pub fn field_by_relationship(&self, relationship: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.relationship_name.as_deref() == Some(relationship))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }

    pub fn into_fields(self) -> Vec<FieldDefinition> {
        self.fields
    }
}
