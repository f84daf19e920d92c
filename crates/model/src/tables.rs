//! The two output tables.

use std::time::Duration;

use mappings_sstable::{InsertTemplate, SchemaError, TableSchema};

pub const DEFAULT_KEYSPACE: &str = "mappings";

pub const PROFILES: &str = "profiles";
pub const SEGMENTS_MAPPING: &str = "segments_mapping";

/// 30 days.
pub const PROFILES_TTL: Duration = Duration::from_secs(2_592_000);
/// 90 days.
pub const SEGMENTS_TTL: Duration = Duration::from_secs(7_776_000);

pub const PROFILES_INSERT: [&str; 3] = ["marker", "ssp", "id"];
pub const SEGMENTS_INSERT: [&str; 4] = ["marker", "segment", "sourceId", "type"];

pub fn profiles_schema(keyspace: &str, ttl: Duration) -> TableSchema {
    TableSchema::new(keyspace, PROFILES)
        .partition_key("ssp")
        .partition_key("id")
        .column("marker")
        .with_default_ttl(ttl)
}

pub fn segments_schema(keyspace: &str, ttl: Duration) -> TableSchema {
    TableSchema::new(keyspace, SEGMENTS_MAPPING)
        .partition_key("marker")
        .clustering("segment")
        .clustering("sourceId")
        .clustering("type")
        .with_default_ttl(ttl)
}

pub fn profiles_insert(schema: &TableSchema) -> Result<InsertTemplate, SchemaError> {
    InsertTemplate::new(schema, PROFILES_INSERT)
}

pub fn segments_insert(schema: &TableSchema) -> Result<InsertTemplate, SchemaError> {
    InsertTemplate::new(schema, SEGMENTS_INSERT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_bind_against_their_schemas() {
        let profiles = profiles_insert(&profiles_schema(DEFAULT_KEYSPACE, PROFILES_TTL)).unwrap();
        assert_eq!(
            profiles.to_string(),
            "INSERT INTO mappings.profiles (marker,ssp,id) VALUES (?, ?, ?)"
        );
        assert_eq!(profiles.schema().default_ttl(), Some(PROFILES_TTL));

        let segments = segments_insert(&segments_schema(DEFAULT_KEYSPACE, SEGMENTS_TTL)).unwrap();
        assert_eq!(
            segments.to_string(),
            "INSERT INTO mappings.segments_mapping (marker,segment,\"sourceId\",type) VALUES (?, ?, ?, ?)"
        );
    }
}
