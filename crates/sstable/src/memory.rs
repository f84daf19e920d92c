//! In-memory table writer.
//!
//! Encodes rows exactly like [`crate::SstTableWriter`] and applies the same
//! ordering rule when sorted mode is requested, but keeps accepted rows in memory in append
//! order. A [`MemoryHandle`] stays readable after the writer is closed.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::error::WriteError;
use crate::key::{OrderCheck, RowEncoder};
use crate::partitioner::Partitioner;
use crate::schema::InsertTemplate;
use crate::writer::{TableWriter, WriterSummary};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRow {
    pub token: i64,
    pub key: Vec<u8>,
    pub values: Vec<String>,
}

#[derive(Debug, Default)]
struct MemoryTable {
    rows: Vec<MemoryRow>,
    closed: usize,
}

pub struct MemoryTableWriter {
    encoder: RowEncoder,
    sorted: bool,
    order: OrderCheck,
    table: Rc<RefCell<MemoryTable>>,
}

impl MemoryTableWriter {
    pub fn new(template: InsertTemplate, partitioner: Arc<dyn Partitioner>) -> Self {
        Self {
            encoder: RowEncoder::new(template, partitioner),
            sorted: false,
            order: OrderCheck::default(),
            table: Rc::default(),
        }
    }

    /// Reject rows that sort before the previous one. Off by default.
    pub fn sorted(mut self, sorted: bool) -> Self {
        self.sorted = sorted;
        self
    }

    pub fn handle(&self) -> MemoryHandle {
        MemoryHandle(Rc::clone(&self.table))
    }
}

impl TableWriter for MemoryTableWriter {
    fn add_row(&mut self, values: &[&str]) -> Result<(), WriteError> {
        let row = self.encoder.encode(values)?;
        if self.sorted {
            self.order.admit(self.encoder.table(), &row)?;
        }
        self.table.borrow_mut().rows.push(MemoryRow {
            token: row.token,
            key: row.key,
            values: values.iter().map(|v| v.to_string()).collect(),
        });
        Ok(())
    }

    fn close(self) -> Result<WriterSummary, WriteError> {
        let mut table = self.table.borrow_mut();
        table.closed += 1;
        Ok(WriterSummary {
            table: self.encoder.table().to_string(),
            rows: table.rows.len() as u64,
            files: Vec::new(),
        })
    }
}

/// Read access to the rows of a [`MemoryTableWriter`].
#[derive(Clone)]
pub struct MemoryHandle(Rc<RefCell<MemoryTable>>);

impl MemoryHandle {
    /// Accepted rows, in append order.
    pub fn rows(&self) -> Vec<MemoryRow> {
        self.0.borrow().rows.clone()
    }

    /// Accepted rows as their positional values, in append order.
    pub fn values(&self) -> Vec<Vec<String>> {
        self.0.borrow().rows.iter().map(|r| r.values.clone()).collect()
    }

    pub fn close_count(&self) -> usize {
        self.0.borrow().closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partitioner::Murmur3Partitioner;
    use crate::schema::TableSchema;

    fn writer() -> MemoryTableWriter {
        let schema = TableSchema::new("ks", "segments")
            .partition_key("marker")
            .clustering("segment");
        let template = InsertTemplate::new(&schema, ["marker", "segment"]).unwrap();
        MemoryTableWriter::new(template, Arc::new(Murmur3Partitioner))
    }

    #[test]
    fn sorted_writer_rejects_out_of_order_rows_and_continues() {
        let mut writer = writer().sorted(true);
        let handle = writer.handle();

        writer.add_row(&["m1", "b"]).unwrap();
        let err = writer.add_row(&["m1", "a"]).unwrap_err();
        assert!(matches!(err, WriteError::OutOfOrder { .. }));
        writer.add_row(&["m1", "c"]).unwrap();

        assert_eq!(handle.values(), vec![vec!["m1", "b"], vec!["m1", "c"]]);
        let summary = writer.close().unwrap();
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.table, "ks.segments");
        assert_eq!(handle.close_count(), 1);
    }

    #[test]
    fn default_writer_accepts_any_order() {
        let mut writer = writer();
        let handle = writer.handle();

        writer.add_row(&["m1", "u2"]).unwrap();
        writer.add_row(&["m1", "seg9"]).unwrap();
        writer.add_row(&["m0", "a"]).unwrap();

        assert_eq!(
            handle.values(),
            vec![vec!["m1", "u2"], vec!["m1", "seg9"], vec!["m0", "a"]]
        );
    }
}
