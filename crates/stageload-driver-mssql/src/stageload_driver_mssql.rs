//! MS SQL Server driver for the stageload bulk loader
//!
//! Implements the core loader traits over tiberius: private connections
//! executing opaque statement text, a transaction-count-guarded commit, and
//! INFORMATION_SCHEMA-based table description with identity detection.

mod connection;
mod driver;
mod schema;

#[cfg(test)]
mod connection_tests;
#[cfg(test)]
mod driver_tests;
#[cfg(test)]
mod schema_tests;

pub use connection::{MssqlConnection, MssqlConnectionError};
pub use driver::{ConnectionSettings, MssqlDriver};
