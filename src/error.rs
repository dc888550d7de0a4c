// Error type shared by the loader, the table operations and the partitioner.
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed csv in {origin}: {source}")]
    Csv {
        origin: String,
        #[source]
        source: csv::Error,
    },

    #[error("invalid config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("column `{0}` not found")]
    MissingColumn(String),

    #[error("unknown mode `{0}` (expected player-|team- followed by action, vaep, end or xt)")]
    UnknownMode(String),

    #[error("column `{column}` row {row}: `{value}` is not numeric")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },

    /// A row whose width differs from the header.
    #[error("row {row} has {found} cells, table has {expected} columns")]
    RaggedTable {
        row: usize,
        expected: usize,
        found: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
