use thiserror::Error;

/// Errors raised while declaring a table or binding an insert to it.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("table {table} declares no partition key")]
    NoPartitionKey { table: String },

    #[error("table {table} declares column '{column}' twice")]
    DuplicateColumn { table: String, column: String },

    #[error("table {table} has no column '{column}'")]
    UnknownColumn { table: String, column: String },

    #[error("insert into {table} binds column '{column}' twice")]
    DuplicateBinding { table: String, column: String },

    #[error("insert into {table} does not bind key column '{column}'")]
    MissingKeyColumn { table: String, column: String },
}

/// Errors raised by a table writer while appending or closing.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The row key sorts before the previously appended row key.
    #[error(
        "row for {table} sorts before the previous row: {}",
        order_detail(.token, .previous_token)
    )]
    OutOfOrder {
        table: String,
        token: i64,
        previous_token: i64,
    },

    #[error("insert into {table} expects {expected} values, got {got}")]
    Arity {
        table: String,
        expected: usize,
        got: usize,
    },

    /// The typed row has nothing to bind to a template column.
    #[error("row for {table} has no value for column '{column}'")]
    Unbound { table: String, column: String },

    #[error("partition key component of {len} bytes exceeds {max} bytes")]
    KeyTooLarge { len: usize, max: usize },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("cannot encode row value")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("sst file writer failed")]
    Rocks(#[from] rocksdb::Error),
}

fn order_detail(token: &i64, previous_token: &i64) -> String {
    if token == previous_token {
        format!("clustering values out of order within partition token {token}")
    } else {
        format!("token {token} is below previous token {previous_token}")
    }
}

impl WriteError {
    #[inline]
    pub fn unbound(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::Unbound {
            table: table.into(),
            column: column.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn out_of_order(token: i64, previous_token: i64) -> String {
        WriteError::OutOfOrder {
            table: "ks.t".into(),
            token,
            previous_token,
        }
        .to_string()
    }

    #[test]
    fn out_of_order_within_a_partition_names_the_clustering_values() {
        assert_eq!(
            out_of_order(7, 7),
            "row for ks.t sorts before the previous row: \
             clustering values out of order within partition token 7"
        );
    }

    #[test]
    fn out_of_order_across_partitions_names_both_tokens() {
        assert_eq!(
            out_of_order(-3, 9),
            "row for ks.t sorts before the previous row: token -3 is below previous token 9"
        );
    }
}
