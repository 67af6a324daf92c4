//! Error types for sqlsift.

use std::path::PathBuf;
use thiserror::Error;

use crate::dialect::Dialect;

/// The main error type for sqlsift operations.
#[derive(Debug, Error)]
pub enum SiftError {
    /// The diffing tool could not be started.
    #[error("Failed to start '{command}': {source}")]
    ToolSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The diffing tool ran but exited unsuccessfully.
    #[error("{stage} exited with {}: {output}", status_label(.status))]
    ToolFailed {
        stage: String,
        status: Option<i32>,
        output: String,
    },

    /// A working file or directory could not be created, read or written.
    #[error("IO error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// A dialect's qualifier properties could not be read.
    #[error("Cannot read properties '{}': {source}", .path.display())]
    Properties {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Run configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A statement was handed to the translator of another dialect.
    #[error("Statement for {found} passed to the {expected} translator")]
    DialectMismatch { expected: Dialect, found: Dialect },

    /// Unknown dialect name.
    #[error("Unknown dialect: '{0}'. Expected: mysql, mssql or oracle")]
    UnknownDialect(String),

    /// Unknown change kind.
    #[error("Unknown change kind: '{0}'. Expected: schema or data")]
    UnknownChangeKind(String),
}

impl SiftError {
    /// Wrap an IO error with a description of what was being attempted.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a tool failure for the given stage.
    pub fn tool_failed(stage: impl Into<String>, status: Option<i32>, output: impl Into<String>) -> Self {
        Self::ToolFailed {
            stage: stage.into(),
            status,
            output: output.into(),
        }
    }
}

fn status_label(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("status {code}"),
        None => "signal".to_string(),
    }
}

/// Result type alias for sqlsift operations.
pub type SiftResult<T> = Result<T, SiftError>;
