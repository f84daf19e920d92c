//! RocksDB SST output.
//!
//! Rows are encoded into ordered byte keys and buffered in a sorted run.
//! Once the run has grown past the buffer size, the next row first writes it
//! out through `rocksdb::SstFileWriter` as
//! `<keyspace>-<table>-<generation>.sst` in the writer's directory; `close`
//! writes what is left. A run that fails to write stays buffered and no file
//! is left behind for it.
//!
//! Rows may arrive in any order by default; each file is sorted but files may
//! overlap. In sorted mode every row must not sort before the previous one and
//! the output files are disjoint and ordered.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rocksdb::{Options, SstFileWriter};

use crate::error::WriteError;
use crate::key::{OrderCheck, RowEncoder};
use crate::partitioner::{Murmur3Partitioner, Partitioner};
use crate::schema::{InsertTemplate, TableSchema};
use crate::writer::{TableWriter, WriterSummary};

pub const DEFAULT_BUFFER_SIZE_MB: usize = 128;

/// Configures an [`SstTableWriter`].
#[derive(Debug, Default)]
pub struct SstTableWriterBuilder {
    directory: Option<PathBuf>,
    schema: Option<TableSchema>,
    columns: Option<Vec<String>>,
    partitioner: Option<Arc<dyn Partitioner>>,
    sorted: bool,
    buffer_size_mb: Option<usize>,
}

impl SstTableWriterBuilder {
    /// Directory the SST files are written to. Must exist.
    pub fn in_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn for_table(mut self, schema: TableSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Insert template; its column order is the order of `add_row` values.
    pub fn using(mut self, template: &InsertTemplate) -> Self {
        self.schema.get_or_insert_with(|| template.schema().clone());
        self.columns = Some(template.columns().to_vec());
        self
    }

    /// Defaults to [`Murmur3Partitioner`].
    pub fn with_partitioner(mut self, partitioner: Arc<dyn Partitioner>) -> Self {
        self.partitioner = Some(partitioner);
        self
    }

    /// Require rows in key order, rejecting rows that sort before the
    /// previous one. Off by default: rows are buffered in any order.
    pub fn sorted(mut self, sorted: bool) -> Self {
        self.sorted = sorted;
        self
    }

    pub fn with_buffer_size_mb(mut self, buffer_size_mb: usize) -> Self {
        self.buffer_size_mb = Some(buffer_size_mb);
        self
    }

    pub fn build(self) -> Result<SstTableWriter, WriteError> {
        let missing = |what: &str| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("sst writer has no {what}"),
            )
        };

        let directory = self.directory.ok_or_else(|| missing("output directory"))?;
        if !directory.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("output directory {} does not exist", directory.display()),
            )
            .into());
        }

        let schema = self.schema.ok_or_else(|| missing("table schema"))?;
        let columns = self.columns.ok_or_else(|| missing("insert template"))?;
        let template = InsertTemplate::new(&schema, columns)?;
        let partitioner = self
            .partitioner
            .unwrap_or_else(|| Arc::new(Murmur3Partitioner));
        let sorted = self.sorted;
        let buffer_limit = self.buffer_size_mb.unwrap_or(DEFAULT_BUFFER_SIZE_MB) * 1024 * 1024;

        tracing::debug!(
            table = %schema.qualified_name(),
            directory = %directory.display(),
            partitioner = partitioner.name(),
            sorted,
            buffer_limit,
            "opening sst table writer"
        );

        Ok(SstTableWriter {
            directory,
            file_prefix: format!("{}-{}", schema.keyspace(), schema.name()),
            encoder: RowEncoder::new(template, partitioner),
            sorted,
            order: OrderCheck::default(),
            buffer: BTreeMap::new(),
            buffered_bytes: 0,
            buffer_limit,
            generation: 1,
            rows: 0,
            files: Vec::new(),
            options: Options::default(),
        })
    }
}

pub struct SstTableWriter {
    directory: PathBuf,
    file_prefix: String,
    encoder: RowEncoder,
    sorted: bool,
    order: OrderCheck,
    buffer: BTreeMap<Vec<u8>, Vec<u8>>,
    buffered_bytes: usize,
    buffer_limit: usize,
    generation: u32,
    rows: u64,
    files: Vec<PathBuf>,
    options: Options,
}

impl SstTableWriter {
    pub fn builder() -> SstTableWriterBuilder {
        SstTableWriterBuilder::default()
    }

    /// Writes the buffered run to the next SST file. On failure the run
    /// stays buffered and the partial file is removed.
    fn flush(&mut self) -> Result<(), WriteError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let path = self
            .directory
            .join(format!("{}-{}.sst", self.file_prefix, self.generation));

        if let Err(e) = write_sst_file(&self.options, &path, &self.buffer) {
            match std::fs::remove_file(&path) {
                Err(remove) if remove.kind() != std::io::ErrorKind::NotFound => tracing::warn!(
                    path = %path.display(),
                    error = %remove,
                    "cannot remove partial sst file"
                ),
                _ => {}
            }
            return Err(e);
        }
        self.generation += 1;
        tracing::debug!(
            table = self.encoder.table(),
            path = %path.display(),
            entries = self.buffer.len(),
            bytes = self.buffered_bytes,
            "flushed sorted run"
        );

        self.files.push(path);
        self.buffer.clear();
        self.buffered_bytes = 0;
        Ok(())
    }
}

fn write_sst_file(
    options: &Options,
    path: &Path,
    run: &BTreeMap<Vec<u8>, Vec<u8>>,
) -> Result<(), WriteError> {
    let mut writer = SstFileWriter::create(options);
    writer.open(path)?;
    for (key, value) in run {
        writer.put(key, value)?;
    }
    writer.finish()?;
    Ok(())
}

impl TableWriter for SstTableWriter {
    fn add_row(&mut self, values: &[&str]) -> Result<(), WriteError> {
        let row = self.encoder.encode(values)?;
        // a full run is written before the row is admitted, so a failed
        // flush rejects this row only
        if self.buffered_bytes >= self.buffer_limit {
            self.flush()?;
        }
        if self.sorted {
            self.order.admit(self.encoder.table(), &row)?;
        }

        let key_len = row.key.len();
        self.buffered_bytes += key_len + row.value.len();
        if let Some(previous) = self.buffer.insert(row.key, row.value) {
            self.buffered_bytes -= key_len + previous.len();
        }
        self.rows += 1;
        Ok(())
    }

    fn close(mut self) -> Result<WriterSummary, WriteError> {
        self.flush()?;
        Ok(WriterSummary {
            table: self.encoder.table().to_string(),
            rows: self.rows,
            files: self.files,
        })
    }
}
