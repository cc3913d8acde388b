//! Paginated reads

pub mod cursor;

pub use cursor::{Page, QueryCursor};
