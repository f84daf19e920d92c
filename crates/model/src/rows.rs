//! Typed output rows.

use std::fmt;

use crate::tables::{PROFILES, SEGMENTS_MAPPING};

/// A row that can be bound to an insert template by column name.
pub trait Row {
    const TABLE: &'static str;

    fn column(&self, name: &str) -> Option<&str>;
}

/// Row of the `profiles` table, partitioned by `(ssp, id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRow {
    pub ssp: String,
    pub id: String,
    pub marker: String,
}

impl Row for ProfileRow {
    const TABLE: &'static str = PROFILES;

    fn column(&self, name: &str) -> Option<&str> {
        match name {
            "ssp" => Some(&self.ssp),
            "id" => Some(&self.id),
            "marker" => Some(&self.marker),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SegmentKind {
    Dsp,
    Segment,
}

impl SegmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentKind::Dsp => "dsp",
            SegmentKind::Segment => "segment",
        }
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row of the `segments_mapping` table: partition `marker`, clustered by
/// `(segment, sourceId, type)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentMappingRow {
    pub marker: String,
    pub segment: String,
    pub source_id: String,
    pub kind: SegmentKind,
}

impl Row for SegmentMappingRow {
    const TABLE: &'static str = SEGMENTS_MAPPING;

    fn column(&self, name: &str) -> Option<&str> {
        match name {
            "marker" => Some(&self.marker),
            "segment" => Some(&self.segment),
            "sourceId" => Some(&self.source_id),
            "type" => Some(self.kind.as_str()),
            _ => None,
        }
    }
}
