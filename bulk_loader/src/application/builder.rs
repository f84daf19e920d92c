use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use mappings_model::Row;
use mappings_sstable::{
    InsertTemplate, Partitioner, TableSchema, TableWriter, WriteError, WriterSummary,
};

use super::ports::WriterFactory;

/// Appends typed rows of one table to its sorted table writer.
///
/// Each row is bound to the insert template by column name and handed to
/// the writer as a positional value list. Writer errors are returned as is.
pub struct TableBuilder<W, R> {
    table: String,
    template: InsertTemplate,
    writer: W,
    _row: PhantomData<fn(&R)>,
}

impl<W: TableWriter, R: Row> TableBuilder<W, R> {
    pub fn open<F>(
        factory: &F,
        output_dir: &Path,
        schema: TableSchema,
        template: InsertTemplate,
        partitioner: Arc<dyn Partitioner>,
    ) -> Result<Self, WriteError>
    where
        F: WriterFactory<Writer = W>,
    {
        let table = schema.qualified_name();
        let writer = factory.open(output_dir, schema, &template, partitioner)?;
        tracing::debug!(%table, insert = %template, "table builder opened");

        Ok(Self {
            table,
            template,
            writer,
            _row: PhantomData,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn append(&mut self, row: &R) -> Result<(), WriteError> {
        let values = self
            .template
            .columns()
            .iter()
            .map(|column| {
                row.column(column)
                    .ok_or_else(|| WriteError::unbound(&self.table, column))
            })
            .collect::<Result<Vec<&str>, _>>()?;

        self.writer.add_row(&values)
    }

    pub fn finalize(self) -> Result<WriterSummary, WriteError> {
        self.writer.close()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::path::PathBuf;

    use mappings_model::tables::{self, DEFAULT_KEYSPACE, PROFILES_TTL};
    use mappings_model::{ProfileRow, SegmentKind, SegmentMappingRow};
    use mappings_sstable::{MemoryHandle, MemoryTableWriter, Murmur3Partitioner};

    use super::*;

    #[derive(Default)]
    struct Memory {
        sorted: bool,
        handles: RefCell<Vec<MemoryHandle>>,
        dirs: RefCell<Vec<PathBuf>>,
    }

    impl WriterFactory for Memory {
        type Writer = MemoryTableWriter;

        fn open(
            &self,
            output_dir: &Path,
            _schema: TableSchema,
            template: &InsertTemplate,
            partitioner: Arc<dyn Partitioner>,
        ) -> Result<Self::Writer, WriteError> {
            let writer = MemoryTableWriter::new(template.clone(), partitioner).sorted(self.sorted);
            self.handles.borrow_mut().push(writer.handle());
            self.dirs.borrow_mut().push(output_dir.to_path_buf());
            Ok(writer)
        }
    }

    fn profile(ssp: &str, id: &str) -> ProfileRow {
        ProfileRow {
            ssp: ssp.into(),
            id: id.into(),
            marker: "m".into(),
        }
    }

    #[test]
    fn rows_are_bound_in_template_column_order() {
        let factory = Memory::default();
        let schema = tables::profiles_schema(DEFAULT_KEYSPACE, PROFILES_TTL);
        let template = tables::profiles_insert(&schema).unwrap();
        let mut builder: TableBuilder<_, ProfileRow> = TableBuilder::open(
            &factory,
            Path::new("out/mappings/profiles"),
            schema,
            template,
            Arc::new(Murmur3Partitioner),
        )
        .unwrap();

        builder.append(&profile("ssp1", "u1")).unwrap();

        let handle = factory.handles.borrow()[0].clone();
        assert_eq!(handle.values(), vec![vec!["m", "ssp1", "u1"]]);
        assert_eq!(
            factory.dirs.borrow().as_slice(),
            [PathBuf::from("out/mappings/profiles")]
        );
        assert_eq!(builder.table(), "mappings.profiles");

        let summary = builder.finalize().unwrap();
        assert_eq!(summary.rows, 1);
        assert_eq!(handle.close_count(), 1);
    }

    #[test]
    fn row_missing_a_template_column_is_a_write_error() {
        let factory = Memory::default();
        // bind segment rows against a template that names a column they lack
        let schema = TableSchema::new("ks", "odd")
            .partition_key("marker")
            .column("extra");
        let template = InsertTemplate::new(&schema, ["marker", "extra"]).unwrap();
        let mut builder: TableBuilder<_, SegmentMappingRow> = TableBuilder::open(
            &factory,
            Path::new("out"),
            schema,
            template,
            Arc::new(Murmur3Partitioner),
        )
        .unwrap();

        let row = SegmentMappingRow {
            marker: "m".into(),
            segment: "s".into(),
            source_id: "src".into(),
            kind: SegmentKind::Segment,
        };
        let err = builder.append(&row).unwrap_err();
        assert!(matches!(err, WriteError::Unbound { column, .. } if column == "extra"));
        assert!(factory.handles.borrow()[0].rows().is_empty());
    }

    #[test]
    fn writer_ordering_errors_surface_untouched() {
        let factory = Memory {
            sorted: true,
            ..Memory::default()
        };
        let schema = tables::profiles_schema(DEFAULT_KEYSPACE, PROFILES_TTL);
        let template = tables::profiles_insert(&schema).unwrap();
        let mut builder: TableBuilder<_, ProfileRow> = TableBuilder::open(
            &factory,
            Path::new("out"),
            schema,
            template,
            Arc::new(Murmur3Partitioner),
        )
        .unwrap();

        let mut rows: Vec<_> = (0..8).map(|i| profile("ssp", &format!("u{i}"))).collect();
        let key = |r: &ProfileRow| {
            let pk = mappings_sstable::key::serialize_partition_key(&[
                r.ssp.as_bytes(),
                r.id.as_bytes(),
            ])
            .unwrap();
            Murmur3Partitioner.token(&pk)
        };
        rows.sort_by_key(|r| std::cmp::Reverse(key(r)));

        builder.append(&rows[0]).unwrap();
        let err = builder.append(&rows[1]).unwrap_err();
        assert!(matches!(err, WriteError::OutOfOrder { .. }));
    }
}
