//! Event classification.

use crate::event::Event;
use crate::rows::{ProfileRow, SegmentKind, SegmentMappingRow};

/// A profile sync from a supply-side platform.
pub const SYNC_SSPS: &str = "/user/sync/ssps";

/// A user id sync from a demand-side platform.
pub const SYNC_DSPS: &str = "/user/sync/dsps";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowInsert {
    Profile(ProfileRow),
    Segment(SegmentMappingRow),
}

/// Rows produced by one event.
///
/// The action row comes first: a profile for [`SYNC_SSPS`], a `dsp`
/// mapping for [`SYNC_DSPS`], nothing for any other action. A `segment`
/// mapping follows when the event carries a non-empty segment.
pub fn route(event: &Event) -> impl Iterator<Item = RowInsert> + '_ {
    let by_action = match event.action.as_str() {
        SYNC_SSPS => Some(RowInsert::Profile(ProfileRow {
            ssp: event.source_id.clone(),
            id: event.user_id.clone(),
            marker: event.marker.clone(),
        })),
        SYNC_DSPS => Some(RowInsert::Segment(SegmentMappingRow {
            marker: event.marker.clone(),
            segment: event.user_id.clone(),
            source_id: event.source_id.clone(),
            kind: SegmentKind::Dsp,
        })),
        _ => None,
    };

    let by_segment = event.segment().map(|segment| {
        RowInsert::Segment(SegmentMappingRow {
            marker: event.marker.clone(),
            segment: segment.to_string(),
            source_id: event.source_id.clone(),
            kind: SegmentKind::Segment,
        })
    });

    by_action.into_iter().chain(by_segment)
}
