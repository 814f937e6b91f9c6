#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # flat-pipeline
//!
//! Feeds files and whole directories to a shared [`flat_codec::Schema`].
//!
//! Directory decoding runs on tokio, one blocking task per file, with a
//! configurable concurrency limit. Failures either abort the batch or are
//! turned into `{"error": ...}` records, depending on the
//! [`AcceptancePolicy`].

pub mod pipeline;
pub mod policies;

pub use pipeline::{FileResult, Pipeline, PipelineBatchResult, PipelineConfig};
pub use policies::AcceptancePolicy;

use thiserror::Error;

/// Errors that can occur in the pipeline
#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("Pipeline error during {operation} for '{path}': {message}")]
    Pipeline {
        operation: String,
        path: String,
        message: String,
    },

    #[error("IO error during {operation} for '{path}': {message}")]
    Io {
        operation: String,
        path: String,
        message: String,
    },

    #[error("Failed to decode '{path}': {source}")]
    Decode {
        path: String,
        #[source]
        source: flat_codec::Error,
    },

    #[error(transparent)]
    Codec(#[from] flat_codec::Error),
}

impl Error {
    /// Create a structured pipeline error with operation/path context.
    pub fn pipeline(
        operation: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Pipeline {
            operation: operation.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a structured I/O error with operation/path context.
    pub fn io(
        operation: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    /// Attach the input path to a codec error
    pub fn decode(path: impl Into<String>, source: flat_codec::Error) -> Self {
        Self::Decode {
            path: path.into(),
            source,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("io", "<unknown>", e.to_string())
    }
}

impl From<flat_schema::Error> for Error {
    fn from(e: flat_schema::Error) -> Self {
        Error::Codec(e.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
