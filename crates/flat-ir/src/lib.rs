#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # flat-ir
//!
//! Typed values and nested records exchanged with fixed-width flat files.
//!
//! Decoding a flat file produces a [`Record`] whose keys are segment names;
//! encoding consumes the same shape, one record per segment occurrence.

/// Ordered name -> entry mappings and their nesting rules.
pub mod record;
/// Path navigation over decoded records.
pub mod traversal;
/// Scalar values carried by a single field.
pub mod value;

/// Nested record primitives.
pub use record::{Entry, Record};
/// Path lookup entry points.
pub use traversal::Cursor;
/// Scalar value type.
pub use value::Value;

use thiserror::Error;

/// Errors that can occur when working with values and records
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Entry not found at path: {path}")]
    NotFound { path: String },

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },
}

impl Error {
    /// Build a not-found error with path context.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Build an invalid-path error with input path and parsing reason.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Build a type mismatch error.
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Crate-local result type for IR operations.
pub type Result<T> = std::result::Result<T, Error>;
