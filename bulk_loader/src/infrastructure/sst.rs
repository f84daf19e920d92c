use std::path::Path;
use std::sync::Arc;

use mappings_sstable::{InsertTemplate, Partitioner, SstTableWriter, TableSchema, WriteError};

use crate::application::ports::WriterFactory;
use crate::config::Config;

/// An adapter that implements the `WriterFactory` port with RocksDB SST
/// files, one writer per table directory.
pub struct RocksWriterFactory {
    sorted: bool,
    buffer_size_mb: usize,
}

impl RocksWriterFactory {
    pub fn new(config: &Config) -> Self {
        Self {
            sorted: config.bulk_loader.sorted,
            buffer_size_mb: config.bulk_loader.buffer_size_mb,
        }
    }
}

impl WriterFactory for RocksWriterFactory {
    type Writer = SstTableWriter;

    fn open(
        &self,
        output_dir: &Path,
        schema: TableSchema,
        template: &InsertTemplate,
        partitioner: Arc<dyn Partitioner>,
    ) -> Result<Self::Writer, WriteError> {
        SstTableWriter::builder()
            .in_directory(output_dir)
            .for_table(schema)
            .using(template)
            .with_partitioner(partitioner)
            .sorted(self.sorted)
            .with_buffer_size_mb(self.buffer_size_mb)
            .build()
    }
}
