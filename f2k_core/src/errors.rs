//! # Error Types
//!
//! Structured error types for f2k_core. Fatal conditions are
//! [`InterchangeError`] values returned through [`InterchangeResult`];
//! conditions the engine recovers from on its own are
//! [`InterchangeWarning`] values that are logged and collected so callers
//! can still inspect them after the fact.
//!
//! ## Example
//!
//! ```rust
//! use f2k_core::errors::{InterchangeError, InterchangeResult};
//!
//! fn validate_tolerance(tolerance: f64) -> InterchangeResult<()> {
//!     if !(tolerance >= 0.0) {
//!         return Err(InterchangeError::invalid_input(
//!             "tolerance",
//!             tolerance.to_string(),
//!             "Tolerance must be a non-negative number",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dialect::Dialect;

/// Result type alias for f2k_core operations
pub type InterchangeResult<T> = Result<T, InterchangeError>;

/// Structured error type for interchange operations.
#[derive(Error, Debug)]
pub enum InterchangeError {
    /// The text contains no header line recognized by the selected dialect
    #[error("Format mismatch: no {dialect} table header found in '{source_name}'")]
    FormatMismatch {
        dialect: Dialect,
        source_name: String,
    },

    /// The unit declaration is absent or names an unknown unit
    #[error("Units not found: {detail}")]
    UnitsNotFound { detail: String },

    /// An input value is invalid (non-finite coordinate, negative tolerance, ...)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// File I/O error, carrying the underlying error unchanged
    #[error("File error: {operation} on '{path}' - {source}")]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed
    #[error("Config error in '{path}': {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl InterchangeError {
    /// Create a FormatMismatch error
    pub fn format_mismatch(dialect: Dialect, source_name: impl Into<String>) -> Self {
        InterchangeError::FormatMismatch {
            dialect,
            source_name: source_name.into(),
        }
    }

    /// Create a UnitsNotFound error
    pub fn units_not_found(detail: impl Into<String>) -> Self {
        InterchangeError::UnitsNotFound {
            detail: detail.into(),
        }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        InterchangeError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        InterchangeError::MissingField {
            field: field.into(),
        }
    }

    /// Create an Io error
    pub fn io(operation: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        InterchangeError::Io {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Check if the session can continue after this error
    /// (e.g. by supplying explicit units)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, InterchangeError::UnitsNotFound { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            InterchangeError::FormatMismatch { .. } => "FORMAT_MISMATCH",
            InterchangeError::UnitsNotFound { .. } => "UNITS_NOT_FOUND",
            InterchangeError::InvalidInput { .. } => "INVALID_INPUT",
            InterchangeError::MissingField { .. } => "MISSING_FIELD",
            InterchangeError::Io { .. } => "IO_ERROR",
            InterchangeError::Config { .. } => "CONFIG_ERROR",
        }
    }
}

/// Non-fatal conditions recovered locally during parsing or seeding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum InterchangeWarning {
    /// Input ended while a table was still open; the table was closed
    /// with the content accumulated so far
    TruncatedInput { table: String },

    /// A point table holds content but no line matched the dialect's
    /// point pattern; the table is treated as having no known points
    PointPatternUnrecognized { table: String },
}

impl InterchangeWarning {
    /// Get a short warning code for programmatic handling
    pub fn warning_code(&self) -> &'static str {
        match self {
            InterchangeWarning::TruncatedInput { .. } => "TRUNCATED_INPUT",
            InterchangeWarning::PointPatternUnrecognized { .. } => "POINT_PATTERN_UNRECOGNIZED",
        }
    }
}

impl std::fmt::Display for InterchangeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterchangeWarning::TruncatedInput { table } => {
                write!(f, "input ended inside table '{}' without a terminator", table)
            }
            InterchangeWarning::PointPatternUnrecognized { table } => {
                write!(f, "no point records recognized in table '{}'", table)
            }
        }
    }
}
