//! Domain types and models

pub mod auth;
pub mod batch;
pub mod field;
pub mod query;
pub mod record;
pub mod validation;

pub use auth::{AuthStatus, Grant, TokenSet};
pub use batch::{
    BatchJob, BatchResult, Chunk, Operation, RecordError, RecordOutcome, SubmitPath,
};
pub use field::{field_equals, FieldDefinition, FieldKind, ObjectSchema, RequiredWhen};
pub use query::QueryPage;
pub use record::{Record, Value, WireRecord};
pub use validation::{ErrorCode, FieldError, ValidationResult};
