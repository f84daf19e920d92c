//! Fixtures shared by the ingest benchmarks.

use std::sync::Arc;

use mappings_model::bulk_data::EventGenerator;
use mappings_model::tables::{self, DEFAULT_KEYSPACE, PROFILES_TTL, SEGMENTS_TTL};
use mappings_model::{Row, RowInsert, decode, route};
use mappings_sstable::{
    InsertTemplate, Murmur3Partitioner, Partitioner, SchemaError, TableWriter, WriteError,
};

/// Batch sizes the benchmarks are run with.
pub const QUALITIES: [usize; 3] = [1_000, 10_000, 100_000];

/// Seeded input lines, so every run sees the same batch.
pub fn event_lines(count: usize) -> Vec<String> {
    EventGenerator::seeded(count as u64).take(count).collect()
}

pub fn partitioner() -> Arc<dyn Partitioner> {
    Arc::new(Murmur3Partitioner)
}

/// Insert templates of both output tables.
pub struct Templates {
    pub profiles: InsertTemplate,
    pub segments: InsertTemplate,
}

impl Templates {
    pub fn new() -> Result<Self, SchemaError> {
        let profiles = tables::profiles_schema(DEFAULT_KEYSPACE, PROFILES_TTL);
        let segments = tables::segments_schema(DEFAULT_KEYSPACE, SEGMENTS_TTL);
        Ok(Self {
            profiles: tables::profiles_insert(&profiles)?,
            segments: tables::segments_insert(&segments)?,
        })
    }
}

/// Positional values of `row` in template column order.
pub fn bind<'r, R: Row>(
    template: &InsertTemplate,
    row: &'r R,
) -> Result<Vec<&'r str>, WriteError> {
    template
        .columns()
        .iter()
        .map(|column| {
            row.column(column)
                .ok_or_else(|| WriteError::unbound(template.schema().qualified_name(), column))
        })
        .collect()
}

/// Decodes, routes and appends every line; returns the rows written.
///
/// Rejected rows are skipped, like the loader does.
pub fn ingest<P: TableWriter, S: TableWriter>(
    templates: &Templates,
    lines: &[String],
    profiles: &mut P,
    segments: &mut S,
) -> u64 {
    let mut written = 0;
    for line in lines {
        let Ok(event) = decode(line) else { continue };
        for insert in route(&event) {
            let result: Result<(), WriteError> = match &insert {
                RowInsert::Profile(row) => {
                    bind(&templates.profiles, row).and_then(|values| profiles.add_row(&values))
                }
                RowInsert::Segment(row) => {
                    bind(&templates.segments, row).and_then(|values| segments.add_row(&values))
                }
            };
            written += u64::from(result.is_ok());
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use mappings_model::{SegmentKind, SegmentMappingRow};
    use mappings_sstable::{MemoryTableWriter, TableSchema};

    use super::*;

    #[test]
    fn ingest_keeps_every_routed_row() {
        let templates = Templates::new().unwrap();
        let lines = event_lines(200);
        let mut profiles = MemoryTableWriter::new(templates.profiles.clone(), partitioner());
        let mut segments = MemoryTableWriter::new(templates.segments.clone(), partitioner());
        let handles = (profiles.handle(), segments.handle());

        let written = ingest(&templates, &lines, &mut profiles, &mut segments);

        let routed: usize = lines
            .iter()
            .filter_map(|line| decode(line).ok())
            .map(|event| route(&event).count())
            .sum();
        assert!(written > 0);
        assert_eq!(written as usize, routed);
        assert_eq!(handles.0.rows().len() + handles.1.rows().len(), routed);
    }

    #[test]
    fn missing_template_column_is_unbound() {
        let schema = TableSchema::new("ks", "odd")
            .partition_key("marker")
            .column("extra");
        let template = InsertTemplate::new(&schema, ["marker", "extra"]).unwrap();
        let row = SegmentMappingRow {
            marker: "m".into(),
            segment: "s".into(),
            source_id: "src".into(),
            kind: SegmentKind::Segment,
        };

        let err = bind(&template, &row).unwrap_err();
        assert!(matches!(err, WriteError::Unbound { column, .. } if column == "extra"));
    }
}
