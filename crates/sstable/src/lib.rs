//! Sorted table writers for bulk-loadable output.
//!
//! A table is declared with [`TableSchema`], rows are bound positionally
//! through an [`InsertTemplate`], placed by a [`Partitioner`] and written by
//! a [`TableWriter`]. Production output goes through RocksDB's
//! `SstFileWriter` ([`SstTableWriter`]); [`MemoryTableWriter`] keeps rows in
//! memory with the same ordering rules.

pub mod error;
pub mod key;
pub mod memory;
pub mod partitioner;
pub mod rocks;
pub mod schema;
pub mod writer;

pub use error::{SchemaError, WriteError};
pub use memory::{MemoryHandle, MemoryRow, MemoryTableWriter};
pub use partitioner::{Murmur3Partitioner, Partitioner};
pub use rocks::{SstTableWriter, SstTableWriterBuilder};
pub use schema::{ColumnKind, InsertTemplate, TableSchema};
pub use writer::{TableWriter, WriterSummary};
