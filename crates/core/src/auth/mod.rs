//! Credential lifecycle

pub mod ports;
pub mod session;

pub use ports::TokenEndpoint;
pub use session::CredentialSession;
