//! Table declarations and insert templates.

use std::fmt;
use std::time::Duration;

use crate::error::SchemaError;

/// Role of a column in the table's primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    PartitionKey,
    Clustering,
    Regular,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// Declaration of one output table.
///
/// Key columns are ordered by declaration: the first partition key column
/// declared is the first component of the partition key, and clustering
/// columns sort ascending in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    keyspace: String,
    name: String,
    columns: Vec<Column>,
    default_ttl: Option<Duration>,
}

impl TableSchema {
    pub fn new(keyspace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            keyspace: keyspace.into(),
            name: name.into(),
            columns: Vec::new(),
            default_ttl: None,
        }
    }

    pub fn partition_key(self, name: impl Into<String>) -> Self {
        self.with_column(name, ColumnKind::PartitionKey)
    }

    pub fn clustering(self, name: impl Into<String>) -> Self {
        self.with_column(name, ColumnKind::Clustering)
    }

    pub fn column(self, name: impl Into<String>) -> Self {
        self.with_column(name, ColumnKind::Regular)
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    fn with_column(mut self, name: impl Into<String>, kind: ColumnKind) -> Self {
        self.columns.push(Column {
            name: name.into(),
            kind,
        });
        self
    }

    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `keyspace.table`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.keyspace, self.name)
    }

    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn columns_of(&self, kind: ColumnKind) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(move |c| c.kind == kind)
    }

    fn validate(&self) -> Result<(), SchemaError> {
        for (i, column) in self.columns.iter().enumerate() {
            if self.columns[..i].iter().any(|c| c.name == column.name) {
                return Err(SchemaError::DuplicateColumn {
                    table: self.qualified_name(),
                    column: column.name.clone(),
                });
            }
        }
        if self.columns_of(ColumnKind::PartitionKey).next().is_none() {
            return Err(SchemaError::NoPartitionKey {
                table: self.qualified_name(),
            });
        }
        Ok(())
    }
}

/// Ordered column list of an insert statement bound to a schema.
///
/// Values handed to a writer are positional and must follow
/// [`InsertTemplate::columns`]. The template precomputes where each key and
/// regular column sits in that list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertTemplate {
    schema: TableSchema,
    columns: Vec<String>,
    partition_positions: Vec<usize>,
    clustering_positions: Vec<usize>,
    regular_positions: Vec<(String, usize)>,
}

impl InsertTemplate {
    pub fn new<I, S>(schema: &TableSchema, columns: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        schema.validate()?;
        let table = schema.qualified_name();
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();

        for (i, column) in columns.iter().enumerate() {
            if columns[..i].contains(column) {
                return Err(SchemaError::DuplicateBinding {
                    table,
                    column: column.clone(),
                });
            }
            if !schema.columns.iter().any(|c| &c.name == column) {
                return Err(SchemaError::UnknownColumn {
                    table,
                    column: column.clone(),
                });
            }
        }

        let position = |name: &str| columns.iter().position(|c| c == name);
        let key_positions = |kind| {
            schema
                .columns_of(kind)
                .map(|c| {
                    position(&c.name).ok_or_else(|| SchemaError::MissingKeyColumn {
                        table: table.clone(),
                        column: c.name.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        };
        let partition_positions = key_positions(ColumnKind::PartitionKey)?;
        let clustering_positions = key_positions(ColumnKind::Clustering)?;
        let regular_positions = schema
            .columns_of(ColumnKind::Regular)
            .filter_map(|c| position(&c.name).map(|p| (c.name.clone(), p)))
            .collect();

        Ok(Self {
            schema: schema.clone(),
            columns,
            partition_positions,
            clustering_positions,
            regular_positions,
        })
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of placeholders.
    pub fn arity(&self) -> usize {
        self.columns.len()
    }

    pub(crate) fn partition_positions(&self) -> &[usize] {
        &self.partition_positions
    }

    pub(crate) fn clustering_positions(&self) -> &[usize] {
        &self.clustering_positions
    }

    pub(crate) fn regular_positions(&self) -> &[(String, usize)] {
        &self.regular_positions
    }
}

impl fmt::Display for InsertTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quote = |c: &String| {
            if c.chars().any(|ch| ch.is_ascii_uppercase()) {
                format!("\"{c}\"")
            } else {
                c.clone()
            }
        };
        let names: Vec<String> = self.columns.iter().map(quote).collect();
        let placeholders = vec!["?"; self.columns.len()];
        write!(
            f,
            "INSERT INTO {} ({}) VALUES ({})",
            self.schema.qualified_name(),
            names.join(","),
            placeholders.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments() -> TableSchema {
        TableSchema::new("ks", "segments")
            .partition_key("marker")
            .clustering("segment")
            .clustering("sourceId")
            .clustering("type")
    }

    #[test]
    fn template_positions_follow_schema_order() {
        let template =
            InsertTemplate::new(&segments(), ["type", "marker", "sourceId", "segment"]).unwrap();

        assert_eq!(template.arity(), 4);
        assert_eq!(template.partition_positions(), &[1]);
        assert_eq!(template.clustering_positions(), &[3, 2, 0]);
        assert!(template.regular_positions().is_empty());
    }

    #[test]
    fn template_renders_as_insert_statement() {
        let schema = TableSchema::new("ks", "profiles")
            .partition_key("ssp")
            .partition_key("id")
            .column("marker");
        let template = InsertTemplate::new(&schema, ["marker", "ssp", "id"]).unwrap();
        assert_eq!(
            template.to_string(),
            "INSERT INTO ks.profiles (marker,ssp,id) VALUES (?, ?, ?)"
        );

        let template =
            InsertTemplate::new(&segments(), ["marker", "segment", "sourceId", "type"]).unwrap();
        assert!(template.to_string().contains("\"sourceId\""));
    }

    #[test]
    fn template_rejects_unknown_and_duplicate_columns() {
        let err = InsertTemplate::new(&segments(), ["marker", "nope"]).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownColumn { column, .. } if column == "nope"));

        let err = InsertTemplate::new(&segments(), ["marker", "marker"]).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateBinding { .. }));
    }

    #[test]
    fn template_requires_every_key_column() {
        let err = InsertTemplate::new(&segments(), ["marker", "segment", "type"]).unwrap_err();
        assert!(
            matches!(err, SchemaError::MissingKeyColumn { column, .. } if column == "sourceId")
        );
    }

    #[test]
    fn schema_requires_partition_key() {
        let schema = TableSchema::new("ks", "t").column("a");
        let err = InsertTemplate::new(&schema, ["a"]).unwrap_err();
        assert!(matches!(err, SchemaError::NoPartitionKey { .. }));

        let schema = TableSchema::new("ks", "t").partition_key("a").column("a");
        let err = InsertTemplate::new(&schema, ["a"]).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateColumn { .. }));
    }
}
