//! # Error Handling
//!
//! This module defines the centralized error type for `build-tools`. It uses
//! the `thiserror` library to build one `Error` enum covering every failure a
//! packaging run can hit, grouped in four families:
//!
//! - **Configuration**: a descriptor line without a key/value separator, or a
//!   required key (`name`, `target`) that is missing.
//! - **Resolution**: an unknown `%variable%`, an unbalanced `%` marker, or a
//!   cyclic set of placeholder references.
//! - **Filesystem**: missing source files, copy failures, and archive
//!   creation failures (including wrapped `io`, `zip`, `walkdir` and `glob`
//!   errors).
//! - **External process**: the build command could not be started. A
//!   non-zero exit code of a started build command is not an error.
//!
//! The `Result` alias is used by every library function so errors propagate
//! with `?` up to the batch driver or the CLI.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for build-tools operations
#[derive(Error, Debug)]
pub enum Error {
    /// A descriptor line has no `:` separator after comment stripping.
    #[error("Malformed descriptor line {line}: '{content}'\n  hint: use 'key: value'")]
    MalformedLine { line: usize, content: String },

    /// A key required by the packaging step is absent from the descriptor.
    #[error("Missing required key '{key}' in {}", path.display())]
    MissingKey { key: String, path: PathBuf },

    /// A placeholder references a key the descriptor does not define.
    #[error("Unknown variable '%{variable}%' referenced by key '{key}'")]
    UnknownVariable { key: String, variable: String },

    /// A value contains an odd number of `%` markers.
    #[error("Unbalanced placeholder markers in key '{key}': '{value}'")]
    PlaceholderSyntax { key: String, value: String },

    /// Placeholder resolution stopped making progress.
    #[error("Cyclic variable reference after {passes} passes: {}", keys.join(", "))]
    CyclicReference { keys: Vec<String>, passes: usize },

    /// A literal include/config entry or the target binary does not exist.
    #[error("Source file not found: {}", path.display())]
    MissingSource { path: PathBuf },

    /// A staging or archive operation failed.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// The external build command could not be started.
    #[error("External process error: {command} - {message}")]
    ExternalProcess { command: String, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An archive error, wrapped from `zip::result::ZipError`.
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A directory traversal error, wrapped from `walkdir::Error`.
    #[error("Directory walk error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),
}

impl Error {
    /// Missing keys and malformed descriptor lines.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::MalformedLine { .. } | Error::MissingKey { .. })
    }

    /// Failures raised by the variable resolver.
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            Error::UnknownVariable { .. }
                | Error::PlaceholderSyntax { .. }
                | Error::CyclicReference { .. }
        )
    }

    pub fn is_filesystem(&self) -> bool {
        matches!(
            self,
            Error::MissingSource { .. }
                | Error::Filesystem { .. }
                | Error::Io(_)
                | Error::Zip(_)
                | Error::WalkDir(_)
                | Error::Glob(_)
        )
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
