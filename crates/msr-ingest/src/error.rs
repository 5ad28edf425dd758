use std::path::PathBuf;
use thiserror::Error;

/// Structural failures only. Bad cell values never surface here; they load
/// as absent fields.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no header row with a loan ID column found in the first {scanned} rows")]
    MissingHeader { scanned: usize },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid loan ID pattern: {0}")]
    Pattern(#[from] regex::Error),
}
