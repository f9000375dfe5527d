//! Error types for schema resolution, line conversion, and stream I/O.

use std::io;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FixedWidthError>;

/// Configuration errors raised while resolving a record schema.
///
/// These are programming errors in a record's column description and are
/// never recovered from or cached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("column '{field}' of {record} declares a zero width")]
    ZeroWidth { record: &'static str, field: String },

    #[error("column '{field}' of {record} references unknown converter '{converter}'")]
    UnknownConverter {
        record: &'static str,
        field: String,
        converter: String,
    },

    #[error("converter '{converter}' for column '{field}' could not be created: {reason}")]
    ConverterInit {
        field: String,
        converter: String,
        reason: String,
    },
}

/// A single value could not be converted to or from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConversionError(pub String);

impl ConversionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors surfaced by the codec and the stream adapter.
#[derive(Debug, Error)]
pub enum FixedWidthError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("field '{field}': {message}")]
    Conversion { field: String, message: String },

    #[error("field '{field}' needs {width} characters but its text has {len}")]
    Overflow {
        field: String,
        width: usize,
        len: usize,
    },

    #[error("line ends at {line_len} characters, before field '{field}' at offset {offset}")]
    ShortLine {
        field: String,
        offset: usize,
        line_len: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("operation cancelled after {lines} lines")]
    Cancelled { lines: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_converts() {
        let err: FixedWidthError = SchemaError::ZeroWidth {
            record: "Example",
            field: "name".to_string(),
        }
        .into();
        assert!(matches!(err, FixedWidthError::Schema(_)));
        assert_eq!(
            err.to_string(),
            "column 'name' of Example declares a zero width"
        );
    }

    #[test]
    fn test_io_error_converts() {
        let err: FixedWidthError = io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into();
        assert!(matches!(err, FixedWidthError::Io(_)));
    }
}
