//! SOQL text helpers
//!
//! ```
//! use sfsync_core::utils::soql::{escape_literal, is_field_path};
//!
//! assert_eq!(escape_literal("O'Brien"), r"O\'Brien");
//! assert!(is_field_path("Parent.AccountNumber"));
//! assert!(!is_field_path("Name = 'x' OR Id"));
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

/// A field name, optionally one relationship hop deep
static FIELD_PATH: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(?:\.[A-Za-z][A-Za-z0-9_]*)?$").unwrap()
});

/// Escape a value for use inside a single-quoted SOQL string literal
pub fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str(r"\\"),
            '\'' => escaped.push_str(r"\'"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str(r"\n"),
            '\r' => escaped.push_str(r"\r"),
            '\t' => escaped.push_str(r"\t"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Whether `name` can be spliced into a query as a field reference
pub fn is_field_path(name: &str) -> bool {
    FIELD_PATH.is_match(name)
}
