//! Error types for rowpack
//!
//! This module defines the error kinds surfaced by the codec, the batcher
//! and the identity resolver. We use `thiserror` for automatic `Display`
//! and `Error` trait implementations. Nothing here is retried or swallowed:
//! every operation is a pure transformation, so every error goes straight
//! back to the caller.

use thiserror::Error;

/// Boxed cause carried by format errors
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for rowpack operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for rowpack
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or truncated block, unknown type tag, or an opaque payload
    /// that could not be reconstructed. Fatal for the record being decoded.
    #[error("Format error at offset {offset}: {detail}")]
    Format {
        /// Human-readable description
        detail: String,
        /// Byte offset in the block where decoding failed
        offset: usize,
        /// Underlying cause, if any
        #[source]
        source: Option<BoxError>,
    },

    /// The opaque serializer failed while encoding a non-primitive value
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// A record violated a precondition (e.g. empty destination)
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// The schema collaborator could not supply primary keys
    #[error("Schema lookup error: {0}")]
    Schema(String),
}

impl Error {
    /// Create a format error without an underlying cause
    pub fn format(detail: impl Into<String>, offset: usize) -> Self {
        Error::Format {
            detail: detail.into(),
            offset,
            source: None,
        }
    }

    /// Create a format error wrapping an underlying cause
    pub fn format_with_source(
        detail: impl Into<String>,
        offset: usize,
        source: impl Into<BoxError>,
    ) -> Self {
        Error::Format {
            detail: detail.into(),
            offset,
            source: Some(source.into()),
        }
    }

    /// Check if this is a format error
    pub fn is_format(&self) -> bool {
        matches!(self, Error::Format { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;
    use std::io;

    #[test]
    fn test_error_display_format() {
        let err = Error::format("unknown type tag 0x42", 17);
        let msg = err.to_string();
        assert!(msg.contains("Format error"));
        assert!(msg.contains("17"));
        assert!(msg.contains("0x42"));
        assert!(err.is_format());
    }

    #[test]
    fn test_format_error_carries_source() {
        let cause = io::Error::new(io::ErrorKind::InvalidData, "bad payload");
        let err = Error::format_with_source("opaque payload", 3, cause);
        let source = err.source().expect("source should be attached");
        assert!(source.to_string().contains("bad payload"));
    }

    #[test]
    fn test_format_error_without_source() {
        let err = Error::format("truncated", 0);
        assert!(err.source().is_none());
    }

    #[test]
    fn test_error_display_encoding() {
        let err = Error::Encoding("unregistered type".to_string());
        let msg = err.to_string();
        assert!(msg.contains("Encoding error"));
        assert!(msg.contains("unregistered type"));
        assert!(!err.is_format());
    }

    #[test]
    fn test_error_display_invalid_record() {
        let err = Error::InvalidRecord("destination_id must not be empty".to_string());
        assert!(err.to_string().contains("Invalid record"));
    }

    #[test]
    fn test_error_display_schema() {
        let err = Error::Schema("table not found: EVENTS".to_string());
        let msg = err.to_string();
        assert!(msg.contains("Schema lookup error"));
        assert!(msg.contains("EVENTS"));
    }

    #[test]
    fn test_error_pattern_matching() {
        let err = Error::format("truncated", 9);
        match err {
            Error::Format { offset, .. } => assert_eq!(offset, 9),
            _ => panic!("Wrong error variant"),
        }
    }
}
