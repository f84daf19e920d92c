pub mod bulk_data;
pub mod event;
pub mod route;
pub mod rows;
pub mod tables;

pub use event::{DecodeError, Event, decode};
pub use route::{RowInsert, SYNC_DSPS, SYNC_SSPS, route};
pub use rows::{ProfileRow, Row, SegmentKind, SegmentMappingRow};
