//! Storage layer for Stockroom
//!
//! A single JSON ledger document with atomic writes, a transactional
//! closure API and a shared/exclusive gate for restore.

pub mod dataset;
pub mod file_io;
pub mod lock;
pub mod store;

pub use dataset::{Dataset, DatasetCounts, SCHEMA_VERSION};
pub use file_io::{read_json, write_bytes_atomic, write_json_atomic};
pub use lock::LockPolicy;
pub use store::{ExclusiveAccess, Store};
