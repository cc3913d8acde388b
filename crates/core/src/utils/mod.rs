//! Small helpers shared by the services

pub mod soql;
