//! # Error Types
//!
//! Errors raised by the core primitives. Higher crates wrap these with
//! `#[from]` in their own error enums.

use thiserror::Error;

/// Error while reading or writing XML.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XmlError {
    /// The input is not well-formed XML.
    #[error("malformed XML at byte {position}: {message}")]
    Parse {
        /// Byte offset where the reader stopped.
        position: usize,
        /// Reader diagnostic.
        message: String,
    },

    /// The input has no root element.
    #[error("XML document has no root element")]
    NoRoot,

    /// Serialization failed.
    #[error("XML write failed: {0}")]
    Write(String),
}

/// Error while deriving or validating a document key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// Key is not 44 characters long.
    #[error("document key must have 44 digits, got {0}")]
    InvalidLength(usize),

    /// Key contains a non-digit character.
    #[error("document key must be numeric: {0:?}")]
    NonNumeric(String),

    /// Stored check digit differs from the computed one.
    #[error("document key check digit mismatch: expected {expected}, found {found}")]
    CheckDigitMismatch {
        /// Digit computed from the first 43 positions.
        expected: u8,
        /// Digit present in the key.
        found: u8,
    },

    /// A key field does not fit its fixed width.
    #[error("key field {field} out of range: {value}")]
    FieldOutOfRange {
        /// Field name (e.g. `nBP`).
        field: &'static str,
        /// Offending value as text.
        value: String,
    },
}
