use std::path::PathBuf;

use crate::error::WriteError;

/// An append-only writer of one table.
///
/// `values` follow the column order of the writer's insert template.
pub trait TableWriter {
    fn add_row(&mut self, values: &[&str]) -> Result<(), WriteError>;

    /// Flushes everything still buffered and releases the writer.
    fn close(self) -> Result<WriterSummary, WriteError>
    where
        Self: Sized;
}

/// What a writer produced once closed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriterSummary {
    pub table: String,
    /// Rows accepted by `add_row`, including rows that replaced an equal key.
    pub rows: u64,
    pub files: Vec<PathBuf>,
}
