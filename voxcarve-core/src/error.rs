//! Error types for voxcarve

use thiserror::Error;

/// Main error type for voxcarve operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad magic line, malformed header or unparsable numeric field
    #[error("Invalid format: {0}")]
    Format(String),

    /// The file ended before the number of rows declared in its header
    #[error("Broken file: expected {expected} data rows, found {found}")]
    BrokenFile { expected: usize, found: usize },

    #[error("Index out of range: {0}")]
    IndexOutOfRange(String),

    #[error("Numeric degeneracy: {0}")]
    NumericDegeneracy(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A silhouette mask could not be located or decoded
    #[error("Silhouette mask for view {view}: {message}")]
    Mask { view: usize, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Algorithm error: {0}")]
    Algorithm(String),
}

impl Error {
    /// Shorthand for a format error raised at a given 1-based line
    pub fn format_at(line: usize, message: impl std::fmt::Display) -> Self {
        Error::Format(format!("line {}: {}", line, message))
    }
}

/// Result type alias for voxcarve operations
pub type Result<T> = std::result::Result<T, Error>;
