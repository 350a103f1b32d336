//! ---
//! gait_section: "05-replay"
//! gait_subsection: "module"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Errors raised while loading recorded sources."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Load-time failures. All of them are fatal for the process that hit them.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("unable to open {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unsupported source format: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("invalid csv in {path}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("row {row}: {reason}")]
    Row { row: u64, reason: String },
    #[error("invalid trial store {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("no group named `{0}`")]
    MissingGroup(String),
    #[error("{group}: `{field}` has {actual} rows, expected {expected}")]
    ShapeMismatch {
        group: String,
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("source {0} holds no records")]
    Empty(String),
}
