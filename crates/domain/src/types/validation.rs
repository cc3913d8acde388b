//! Structured validation outcome

use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Required,
    InvalidType,
    InvalidValue,
    LengthExceeded,
    BusinessRule,
}

impl_domain_status_conversions!(ErrorCode {
    Required => "required",
    InvalidType => "invalid_type",
    InvalidValue => "invalid_value",
    LengthExceeded => "length_exceeded",
    BusinessRule => "business_rule",
});

/// One violation attached to a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub code: ErrorCode,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, code: ErrorCode, message: impl Into<String>) -> Self {
        Self { field: field.into(), code, message: message.into() }
    }

    pub fn required(field: impl Into<String>) -> Self {
        let field = field.into();
        let message = format!("{field} is required");
        Self::new(field, ErrorCode::Required, message)
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]: {}", self.field, self.code, self.message)
    }
}

/// `ok` iff `errors` is empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub ok: bool,
    pub errors: Vec<FieldError>,
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<FieldError>) -> Self {
        Self { ok: errors.is_empty(), errors }
    }

    pub fn valid() -> Self {
        Self::from_errors(Vec::new())
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn errors_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> {
        self.errors.iter().filter(move |error| error.field == field)
    }

    pub fn has_error(&self, field: &str, code: ErrorCode) -> bool {
        self.errors_for(field).any(|error| error.code == code)
    }

    /// Single-line summary, `; ` separated
    pub fn summary(&self) -> String {
        self.errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    }
}
