use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationReport;

/// The main error type for cocokit operations.
#[derive(Debug, Error)]
pub enum CocoKitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse COCO JSON from {path}: {source}")]
    CocoJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write COCO JSON to {path}: {source}")]
    CocoJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Schema error in {dataset}: missing required field '{field}'")]
    Schema { dataset: String, field: String },

    #[error("Reference error in {dataset}: {message}")]
    Reference { dataset: String, message: String },

    #[error("Duplicate {kind} id {id} in {dataset}")]
    DuplicateId {
        dataset: String,
        kind: &'static str,
        id: i64,
    },

    #[error("Nothing to merge: no input datasets were given")]
    NoInputs,

    #[error("No files matching '{pattern}' found in {dir}")]
    NoInputFiles { dir: PathBuf, pattern: String },

    #[error("Invalid file pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Failed to read rule config from {path}: {source}")]
    RuleParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },
}
