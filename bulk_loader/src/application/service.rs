use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use mappings_model::event::decode_bytes;
use mappings_model::tables::{self, PROFILES, SEGMENTS_MAPPING};
use mappings_model::{ProfileRow, RowInsert, SegmentMappingRow, route};
use mappings_sstable::{Murmur3Partitioner, Partitioner, TableWriter};

use super::builder::TableBuilder;
use super::error::SetupError;
use super::ports::{LineSource, WriterFactory};

/// What the pipeline needs to know about its output.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub output_dir: PathBuf,
    pub keyspace: String,
    pub profiles_ttl: Duration,
    pub segments_ttl: Duration,
}

/// Counters of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Lines that decoded into an event and were routed.
    pub events_routed: u64,
    pub decode_errors: u64,
    pub write_errors: u64,
    pub read_errors: u64,
    pub profile_rows: u64,
    pub segment_rows: u64,
    pub finalize_errors: u64,
}

struct Tables<W: TableWriter> {
    profiles: TableBuilder<W, ProfileRow>,
    segments: TableBuilder<W, SegmentMappingRow>,
}

impl<W: TableWriter> Tables<W> {
    /// Finalizes both builders; returns how many failed.
    fn finalize(self) -> u64 {
        let mut failed = 0;
        for (table, result) in [
            (self.profiles.table().to_string(), self.profiles.finalize()),
            (self.segments.table().to_string(), self.segments.finalize()),
        ] {
            match result {
                Ok(summary) => tracing::info!(
                    %table,
                    rows = summary.rows,
                    files = summary.files.len(),
                    "table finalized"
                ),
                Err(e) => {
                    failed += 1;
                    tracing::error!(%table, error = ?e, "failed to finalize table");
                }
            }
        }
        failed
    }
}

/// The main application service that drives the ingestion pipeline.
/// It is generic over the WriterFactory port, so the same driver writes
/// SST files in production and in-memory tables in tests.
pub struct IngestService<F: WriterFactory> {
    factory: F,
    settings: PipelineSettings,
}

impl<F: WriterFactory> IngestService<F> {
    pub fn new(factory: F, settings: PipelineSettings) -> Self {
        Self { factory, settings }
    }

    /// Output directory of one table: `<output_dir>/<keyspace>/<table>`.
    pub fn table_dir(&self, table: &str) -> PathBuf {
        self.settings
            .output_dir
            .join(&self.settings.keyspace)
            .join(table)
    }

    /// Runs the pipeline over `sources` in order.
    ///
    /// Only setup failures are returned. Per-line and per-source failures are
    /// logged and counted, raw unparseable lines are written to `rejected`,
    /// and both tables are finalized exactly once.
    pub fn run<S: LineSource>(
        &self,
        sources: &[S],
        rejected: &mut dyn Write,
    ) -> Result<PipelineReport, SetupError> {
        tracing::info!("Starting Init: output directories and table builders");
        let tables = self.init()?;

        let mut report = PipelineReport::default();
        let mut finalize_errors = 0;
        {
            let mut tables = scopeguard::guard(tables, |tables| {
                tracing::info!("Starting Close: finalizing tables");
                finalize_errors = tables.finalize();
            });

            tracing::info!(sources = sources.len(), "Starting Streaming");
            for source in sources {
                self.stream_source(source, &mut tables, &mut report, rejected);
            }
            tracing::info!("Input exhausted, draining");
        }
        report.finalize_errors = finalize_errors;

        tracing::info!(?report, "Pipeline closed");
        Ok(report)
    }

    fn init(&self) -> Result<Tables<F::Writer>, SetupError> {
        let profiles_dir = self.create_table_dir(PROFILES)?;
        let segments_dir = self.create_table_dir(SEGMENTS_MAPPING)?;
        let keyspace = &self.settings.keyspace;

        let schema = tables::profiles_schema(keyspace, self.settings.profiles_ttl);
        let template = tables::profiles_insert(&schema)?;
        let profiles = self.open_builder(&profiles_dir, schema, template)?;

        let schema = tables::segments_schema(keyspace, self.settings.segments_ttl);
        let template = tables::segments_insert(&schema)?;
        let segments = self.open_builder(&segments_dir, schema, template)?;

        Ok(Tables { profiles, segments })
    }

    fn create_table_dir(&self, table: &str) -> Result<PathBuf, SetupError> {
        let path = self.table_dir(table);
        std::fs::create_dir_all(&path).map_err(|source| SetupError::CreateDir {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    fn open_builder<R: mappings_model::Row>(
        &self,
        dir: &Path,
        schema: mappings_sstable::TableSchema,
        template: mappings_sstable::InsertTemplate,
    ) -> Result<TableBuilder<F::Writer, R>, SetupError> {
        let table = schema.qualified_name();
        let partitioner: Arc<dyn Partitioner> = Arc::new(Murmur3Partitioner);
        TableBuilder::open(&self.factory, dir, schema, template, partitioner)
            .map_err(|source| SetupError::OpenWriter { table, source })
    }

    fn stream_source<S: LineSource>(
        &self,
        source: &S,
        tables: &mut Tables<F::Writer>,
        report: &mut PipelineReport,
        rejected: &mut dyn Write,
    ) {
        let name = source.name();
        let mut reader = match source.open() {
            Ok(reader) => reader,
            Err(e) => {
                report.read_errors += 1;
                tracing::error!(source = %name, error = %e, "cannot open input, skipping");
                return;
            }
        };
        tracing::info!(source = %name, "reading input");

        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) => break,
                Ok(_) => self.ingest_line(&line, tables, report, rejected),
                Err(e) => {
                    report.read_errors += 1;
                    tracing::error!(
                        source = %name,
                        error = %e,
                        "read failed, skipping the rest of this input"
                    );
                    break;
                }
            }
        }
    }

    fn ingest_line(
        &self,
        line: &[u8],
        tables: &mut Tables<F::Writer>,
        report: &mut PipelineReport,
        rejected: &mut dyn Write,
    ) {
        let event = match decode_bytes(line) {
            Ok(event) => event,
            Err(e) => {
                report.decode_errors += 1;
                tracing::warn!(error = %e.source, "skipping malformed record");
                if let Err(io) = writeln!(rejected, "{}", e.line) {
                    tracing::debug!(error = %io, "cannot echo rejected line");
                }
                return;
            }
        };
        report.events_routed += 1;

        for insert in route(&event) {
            let (table, result, appended) = match &insert {
                RowInsert::Profile(row) => (
                    PROFILES,
                    tables.profiles.append(row),
                    &mut report.profile_rows,
                ),
                RowInsert::Segment(row) => (
                    SEGMENTS_MAPPING,
                    tables.segments.append(row),
                    &mut report.segment_rows,
                ),
            };
            match result {
                Ok(()) => *appended += 1,
                Err(e) => {
                    report.write_errors += 1;
                    tracing::warn!(table, error = %e, "dropping row");
                }
            }
        }
    }
}
