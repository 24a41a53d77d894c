/*!
 * Error types for the tiergrid library.
 *
 * This module contains custom error types for the annotation model, the audio
 * collaborator and the external analysis tool, using the thiserror crate for
 * ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the annotation document model, its parsers and its edit operations
#[derive(Error, Debug)]
pub enum TextgridError {
    /// Malformed or truncated input
    #[error("Parse error: {0}")]
    Parse(String),

    /// A construction step would violate a tier or document invariant
    #[error("Validation error: {0}")]
    Validation(String),

    /// An edit operation in `error` collision mode met overlapping content
    #[error("Collision error: {0}")]
    Collision(String),

    /// A timestamp left [0, inf) or the declared bounds
    #[error("Out of bounds: {0}")]
    OutOfBounds(String),

    /// Lookup of a tier name that is not in the document
    #[error("Tier not found: {0}")]
    TierNotFound(String),

    /// A tier name is already used in the document
    #[error("Duplicate tier name: '{0}'")]
    DuplicateTierName(String),

    /// An operation was given a tier of the wrong kind
    #[error("Tier '{name}' has the wrong kind: expected {expected}, found {found}")]
    IncompatibleTier {
        /// Tier name
        name: String,
        /// Kind required by the operation
        expected: String,
        /// Kind of the given tier
        found: String,
    },

    /// An argument outside its accepted range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// File system failure while reading or writing a document
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON document
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the document model
pub type Result<T> = std::result::Result<T, TextgridError>;

/// Errors that can occur when reading or writing audio
#[derive(Error, Debug)]
pub enum AudioError {
    /// Error from the WAV codec
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// Only single channel audio is supported
    #[error("Audio must be mono, found {0} channels")]
    NotMono(u16),

    /// A requested time range is empty or outside the recording
    #[error("Invalid audio range: {start} - {end}")]
    InvalidRange {
        /// Range start in seconds
        start: f64,
        /// Range end in seconds
        end: f64,
    },

    /// File system failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when running the external analysis program
#[derive(Error, Debug)]
pub enum ExternalToolError {
    /// The executable could not be started
    #[error("External tool not found: {0}")]
    NotFound(PathBuf),

    /// The subprocess exited unsuccessfully
    #[error("External tool failed ({command}) with status {status:?}: {stderr}")]
    Failed {
        /// Command line that was run
        command: String,
        /// Exit code, None when killed by a signal
        status: Option<i32>,
        /// Captured standard output
        stdout: String,
        /// Captured standard error
        stderr: String,
    },

    /// The tool's output file could not be interpreted
    #[error("Could not parse tool output: {0}")]
    OutputParse(String),

    /// File system failure around the subprocess
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the annotation model
    #[error("Textgrid error: {0}")]
    Textgrid(#[from] TextgridError),

    /// Error from the audio collaborator
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// Error from the external analysis program
    #[error("External tool error: {0}")]
    ExternalTool(#[from] ExternalToolError),

    /// Error in the configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
