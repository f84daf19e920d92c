use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use mappings_sstable::{InsertTemplate, Partitioner, TableSchema, TableWriter, WriteError};

/// A contract for a named stream of input lines.
pub trait LineSource {
    fn name(&self) -> String;

    fn open(&self) -> std::io::Result<Box<dyn BufRead + '_>>;
}

/// A contract for opening the sorted table writer of one output table.
pub trait WriterFactory {
    type Writer: TableWriter;

    fn open(
        &self,
        output_dir: &Path,
        schema: TableSchema,
        template: &InsertTemplate,
        partitioner: Arc<dyn Partitioner>,
    ) -> Result<Self::Writer, WriteError>;
}
