//! Concurrent staged-load engine
//!
//! Bulk-loads an in-memory [`Frame`](stageload_core::Frame) into a
//! destination table: the input is validated against the live destination
//! schema, partitioned into batches, and fanned out to a pool of workers
//! that each stage their batches into a private temporary table over a
//! private connection. The destination is touched exactly once, at the very
//! end, and only if every worker succeeded.
//!
//! Entry point: [`load`].

mod artifacts;
mod chunk;
mod encode;
mod load;
mod options;
mod validate;
mod worker;

#[cfg(test)]
mod mock;

#[cfg(test)]
mod chunk_tests;
#[cfg(test)]
mod encode_tests;
#[cfg(test)]
mod load_tests;
#[cfg(test)]
mod validate_tests;
#[cfg(test)]
mod worker_tests;

pub use artifacts::default_artifact_root;
pub use chunk::{chunk, effective_worker_count};
pub use encode::{encode_literal, encoded_width};
pub use load::load;
pub use options::LoadOptions;
pub use validate::validate;
