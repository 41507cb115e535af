//! Error types for eisen
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (validation, unknown project, bad args or config)
//! - 4: Operation failed (I/O, parse, import/export)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the eisen CLI
pub mod exit_codes {
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for eisen operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid quadrant: {0} (expected 1-4)")]
    InvalidQuadrant(String),

    #[error("Task description cannot be empty")]
    EmptyDescription,

    #[error("Project name cannot be empty")]
    EmptyProjectName,

    #[error("Cannot delete the last project")]
    LastProject,

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Operation failures (exit code 4)
    #[error("Import from {path} failed: {reason}")]
    Import { path: PathBuf, reason: String },

    #[error("Export to {path} failed: {reason}")]
    Export { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::InvalidQuadrant(_)
            | Error::EmptyDescription
            | Error::EmptyProjectName
            | Error::LastProject
            | Error::ProjectNotFound(_)
            | Error::InvalidArgument(_)
            | Error::InvalidConfig(_) => exit_codes::USER_ERROR,

            // Operation failures
            Error::Import { .. }
            | Error::Export { .. }
            | Error::Io(_)
            | Error::Json(_)
            | Error::Csv(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Machine-readable class matching the exit code.
    pub fn kind(&self) -> &'static str {
        match self.exit_code() {
            exit_codes::USER_ERROR => "user_error",
            _ => "operation_failed",
        }
    }

    /// True for domain validation failures (bad quadrant, empty names).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidQuadrant(_)
                | Error::EmptyDescription
                | Error::EmptyProjectName
                | Error::LastProject
        )
    }

    /// Structured details for machine-readable error output
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::InvalidQuadrant(value) => Some(serde_json::json!({ "quadrant": value })),
            Error::ProjectNotFound(id) => Some(serde_json::json!({ "project": id })),
            Error::InvalidArgument(message) | Error::InvalidConfig(message) => {
                Some(serde_json::json!({ "message": message }))
            }
            Error::Import { path, reason } | Error::Export { path, reason } => {
                Some(serde_json::json!({
                    "path": path.to_string_lossy(),
                    "reason": reason,
                }))
            }
            _ => None,
        }
    }

    /// Wrap a failure from an import use case, keeping the cause text.
    pub fn import(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Error::Import {
            path: path.into(),
            reason: err.to_string(),
        }
    }

    /// Wrap a failure from an export use case, keeping the cause text.
    pub fn export(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Error::Export {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}

/// Result type alias for eisen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub message: String,
    pub code: i32,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            message: err.to_string(),
            code: err.exit_code(),
            kind: err.kind(),
            details: err.details(),
        }
    }
}
