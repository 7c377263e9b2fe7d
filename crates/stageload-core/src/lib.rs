//! Stageload Core - Core abstractions and traits for the bulk loader
//!
//! This crate provides the fundamental traits and types the staging engine
//! and the database drivers depend on. It defines:
//!
//! - `BulkDriver` - Trait for database driver implementations
//! - `BulkConnection` - Trait for private bulk-load connections
//! - `SchemaSource` - Trait for destination table description
//! - Common types like `Value`, `Frame`, `ColumnSpec`, `Batch`, etc.

mod batch;
mod connection;
mod driver;
mod error;
mod frame;
mod schema;
mod types;

pub use batch::*;
pub use connection::*;
pub use driver::*;
pub use error::*;
pub use frame::*;
pub use schema::*;
pub use types::*;
