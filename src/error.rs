use std::path::PathBuf;
use thiserror::Error;

use crate::model::AnnotationId;

/// The main error type for synstore operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Container I/O failed at {path}: {source}")]
    ContainerIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed container at {path}: {message}")]
    Format { path: String, message: String },

    #[error("Invalid container path: {0}")]
    InvalidPath(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedVersion(String),

    #[error("Dataset missing: {0}")]
    DatasetMissing(String),

    #[error("Attribute '{name}' missing at {path}")]
    AttributeMissing { path: String, name: String },

    #[error("Unknown annotation type '{0}'")]
    UnknownKind(String),

    #[error("Duplicate annotation ID {0}")]
    DuplicateId(AnnotationId),

    #[error("Partner pair ({pre}, {post}) is not a presynaptic/postsynaptic site pair")]
    PartnerKindMismatch {
        pre: AnnotationId,
        post: AnnotationId,
    },

    #[error("Partner pair ({pre}, {post}) references an unknown annotation")]
    DanglingPartner {
        pre: AnnotationId,
        post: AnnotationId,
    },

    #[error("Dataset {path} has shape {found:?}, expected {expected}")]
    ShapeMismatch {
        path: String,
        expected: String,
        found: Vec<usize>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse annotations JSON from {path}: {source}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write annotations JSON to {path}: {source}")]
    JsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
