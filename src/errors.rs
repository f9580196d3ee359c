// errors.rs - Application-level error type

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum UmiClusterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported input format '{0}' (expected .sam or .bam)")]
    UnsupportedFormat(String),

    #[error("Paired-end input is not supported (record '{read_id}' is segmented)")]
    PairedEndInput { read_id: String },

    #[error("No usable reads found in '{}'", .path.display())]
    NoReads { path: PathBuf },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to write '{path}': {message}")]
    Output { path: String, message: String },

    #[error("{0} read group(s) failed")]
    GroupsFailed(usize),
}

impl UmiClusterError {
    pub fn output(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Output {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, UmiClusterError>;
