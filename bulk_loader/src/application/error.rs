use std::path::PathBuf;

use mappings_sstable::{SchemaError, WriteError};
use thiserror::Error;

/// Failures before the first row is written. These abort the run.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("cannot create output directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot open table writer for {table}")]
    OpenWriter {
        table: String,
        #[source]
        source: WriteError,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
