//! Declarative business rules run after the field-level checks

use std::fmt;
use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use sfsync_domain::{ErrorCode, FieldError, ObjectSchema, Record, Value};
use thiserror::Error;

/// A rule could not evaluate the record (malformed input, missing field)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct RuleFault(pub String);

/// Record-level rule over the full record and its schema
pub trait BusinessRule: Send + Sync {
    /// Stable identifier, reported when the rule faults
    fn name(&self) -> &str;

    /// Zero or more violations; `Err` when the rule itself cannot run
    fn check(&self, record: &Record, schema: &ObjectSchema) -> Result<Vec<FieldError>, RuleFault>;
}

type RuleFn = dyn Fn(&Record, &ObjectSchema) -> Result<Vec<FieldError>, RuleFault> + Send + Sync;

/// Closure-backed rule
#[derive(Clone)]
pub struct FnRule {
    name: String,
    check: Arc<RuleFn>,
}

impl FnRule {
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Record, &ObjectSchema) -> Result<Vec<FieldError>, RuleFault> + Send + Sync + 'static,
    {
        Self { name: name.into(), check: Arc::new(check) }
    }
}

impl fmt::Debug for FnRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRule").field("name", &self.name).finish_non_exhaustive()
    }
}

impl BusinessRule for FnRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, record: &Record, schema: &ObjectSchema) -> Result<Vec<FieldError>, RuleFault> {
        (self.check)(record, schema)
    }
}

type QualifierFn = dyn Fn(&str) -> bool + Send + Sync;

/// When `classification_field == sentinel`, the tracking identifier must be
/// set and the linked transactions must hold at least `min_qualifying`
/// qualifying entries.
///
/// Linked transactions are either a list of transaction references or a
/// numeric count. An entry qualifies when it is non-blank and passes the
/// optional qualifier.
#[derive(Clone)]
pub struct SentinelClassificationRule {
    pub classification_field: String,
    pub sentinel: String,
    pub tracking_field: String,
    pub transactions_field: String,
    pub min_qualifying: usize,
    qualifier: Option<Arc<QualifierFn>>,
}

impl SentinelClassificationRule {
    pub fn new(
        classification_field: impl Into<String>,
        sentinel: impl Into<String>,
        tracking_field: impl Into<String>,
        transactions_field: impl Into<String>,
    ) -> Self {
        Self {
            classification_field: classification_field.into(),
            sentinel: sentinel.into(),
            tracking_field: tracking_field.into(),
            transactions_field: transactions_field.into(),
            min_qualifying: 1,
            qualifier: None,
        }
    }

    #[must_use]
    pub fn min_qualifying(mut self, min_qualifying: usize) -> Self {
        self.min_qualifying = min_qualifying;
        self
    }

    /// Only entries accepted by `qualifier` count
    #[must_use]
    pub fn qualifying<F>(mut self, qualifier: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.qualifier = Some(Arc::new(qualifier));
        self
    }

    fn qualifying_count(&self, value: Option<&Value>) -> Result<usize, RuleFault> {
        let qualifies = |entry: &str| {
            !entry.trim().is_empty() && self.qualifier.as_ref().map_or(true, |q| q(entry))
        };
        match value {
            None | Some(Value::Null) => Ok(0),
            Some(Value::List(entries)) => Ok(entries.iter().filter(|entry| qualifies(entry)).count()),
            Some(Value::Number(count)) if count.is_sign_negative() || !count.fract().is_zero() => {
                Err(RuleFault(format!("{} holds a non-integral count {count}", self.transactions_field)))
            }
            Some(Value::Number(count)) => count.to_usize().ok_or_else(|| {
                RuleFault(format!("{} count {count} is out of range", self.transactions_field))
            }),
            Some(other) => Err(RuleFault(format!(
                "{} must be a list or a count, got {}",
                self.transactions_field,
                other.type_name()
            ))),
        }
    }
}

impl fmt::Debug for SentinelClassificationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SentinelClassificationRule")
            .field("classification_field", &self.classification_field)
            .field("sentinel", &self.sentinel)
            .field("tracking_field", &self.tracking_field)
            .field("transactions_field", &self.transactions_field)
            .field("min_qualifying", &self.min_qualifying)
            .finish_non_exhaustive()
    }
}

impl BusinessRule for SentinelClassificationRule {
    fn name(&self) -> &str {
        "sentinel_classification"
    }

    fn check(&self, record: &Record, schema: &ObjectSchema) -> Result<Vec<FieldError>, RuleFault> {
        if schema.field(&self.tracking_field).is_none() {
            return Err(RuleFault(format!(
                "{} has no field {}",
                schema.object_type, self.tracking_field
            )));
        }
        if record.text(&self.classification_field) != Some(self.sentinel.as_str()) {
            return Ok(Vec::new());
        }

        let mut errors = Vec::new();
        if !record.is_set(&self.tracking_field) {
            errors.push(FieldError::new(
                &self.tracking_field,
                ErrorCode::BusinessRule,
                format!("{} is required when {} is {}", self.tracking_field, self.classification_field, self.sentinel),
            ));
        }

        let qualifying = self.qualifying_count(record.get(&self.transactions_field))?;
        if qualifying < self.min_qualifying {
            errors.push(FieldError::new(
                &self.transactions_field,
                ErrorCode::BusinessRule,
                format!(
                    "{} needs at least {} qualifying transaction(s), found {qualifying}",
                    self.transactions_field, self.min_qualifying
                ),
            ));
        }
        Ok(errors)
    }
}
