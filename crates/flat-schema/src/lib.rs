//! # flat-schema
//!
//! Schema description model and loader for fixed-width flat files.
//!
//! A description is the declarative, serializable form of a flat-file format:
//! global options plus ordered segments, each an ordered list of fixed-width
//! elements. It is loaded from JSON or YAML and handed to the codec, which
//! builds its runtime model from it.

pub mod loader;
pub mod model;
pub mod registry;

pub use loader::SchemaLoader;
pub use model::{ElementDescription, Justify, SchemaDescription, SegmentDescription, TargetType};
pub use registry::SchemaCache;

use thiserror::Error;

/// Errors that can occur when loading schema descriptions
#[derive(Error, Debug)]
pub enum Error {
    #[error("Schema not found: {0}")]
    NotFound(String),

    #[error("Invalid schema format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
