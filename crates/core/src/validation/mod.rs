//! Record validation against discovered schemas and business rules

pub mod engine;
pub mod rules;

pub use engine::{validate_against, ValidationEngine};
pub use rules::{BusinessRule, FnRule, RuleFault, SentinelClassificationRule};
