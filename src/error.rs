//! Error types for schema-workbench

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while editing catalog annotations
#[derive(Error, Debug)]
pub enum WorkbenchError {
    #[error("Unresolved source path component {component} in context of {context}")]
    UnresolvedPathComponent { component: String, context: String },

    #[error("Unresolved constraint {schema}:{name} ({direction}) in context of {context}")]
    UnresolvedConstraint {
        schema: String,
        name: String,
        direction: &'static str,
        context: String,
    },

    #[error("Duplicate source key: {key}")]
    DuplicateKey { key: String },

    #[error("Duplicate context: {name}")]
    DuplicateContext { name: String },

    #[error("Malformed entry at {location}: {detail}")]
    MalformedEntry { location: String, detail: String },

    #[error("Unknown context: {name}")]
    UnknownContext { name: String },

    #[error("Invalid context name: {name:?}")]
    InvalidContextName { name: String },

    #[error("Entry index {index} out of range for context {context} ({len} entries)")]
    EntryIndexOutOfRange {
        context: String,
        index: usize,
        len: usize,
    },

    #[error("{kind} entries are not allowed in context {context}")]
    EntryNotAllowed { kind: &'static str, context: String },

    #[error("Invalid source key: {key:?}")]
    InvalidSourceKey { key: String },

    #[error("Unknown source key: {key}")]
    UnknownSourceKey { key: String },

    #[error("Unknown model object: {object}")]
    UnknownObject { object: String },

    #[error("Failed to read catalog model: {path}")]
    ModelReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog model")]
    ModelParseError {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode catalog model")]
    ModelEncodeError {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write catalog model to {path}")]
    ModelWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read configuration file: {path}")]
    ConfigReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file: {path}")]
    ConfigParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write configuration file: {path}")]
    ConfigWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("A {kind} task is already in progress")]
    TaskBusy { kind: &'static str },
}

impl WorkbenchError {
    /// Whether the error belongs to the path-resolution family, which truncates
    /// a source path instead of rejecting the enclosing document.
    pub fn is_path_error(&self) -> bool {
        matches!(
            self,
            WorkbenchError::UnresolvedPathComponent { .. }
                | WorkbenchError::UnresolvedConstraint { .. }
        )
    }
}
