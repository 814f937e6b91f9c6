//! Error types for the flat codec with context

use thiserror::Error;

/// Errors that can occur while decoding or encoding flat records
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Value longer than its field, and truncation was not allowed or not possible
    #[error("Element '{element}' exceeds its size of {size}: '{value}'")]
    ExceededSize {
        element: String,
        value: String,
        size: usize,
    },

    /// Required field absent, unparseable or inconvertible
    #[error("Required element '{element}' is missing: {reason}")]
    RequiredElementMissing { element: String, reason: String },

    /// Number of decoded values differs from the number of elements
    #[error("Segment '{segment}' expects {expected} values, got {actual}")]
    ElementsNumberIncorrect {
        segment: String,
        expected: usize,
        actual: usize,
    },

    /// A line could not be split into one slice per element
    #[error("Segment '{segment}' expects {expected} fields, the line holds {actual}")]
    FieldCountMismatch {
        segment: String,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown converter: '{0}'")]
    ConverterNotFound(String),

    #[error("Converter '{converter}' failed: {message}")]
    ConversionFailed { converter: String, message: String },

    #[error("Missing required segments: {}", .0.join(", "))]
    MissingRequiredSegments(Vec<String>),

    #[error("Unknown segments: {}", .0.join(", "))]
    UnknownSegments(Vec<String>),

    #[error(
        "Line {line} length is incorrect for segment '{segment}' (actual:{actual} vs needed:{expected})"
    )]
    LineLengthMismatch {
        segment: String,
        line: usize,
        actual: usize,
        expected: usize,
    },

    /// Child segment line with no enclosing parent line before it
    #[error("Line {line} of segment '{segment}' has no parent line to attach to")]
    OrphanLine { segment: String, line: usize },

    #[error("Unknown segment name: '{0}'")]
    UnknownSegmentName(String),

    #[error("Segment '{segment}' has no element named '{element}'")]
    UnknownElement { segment: String, element: String },

    /// Encode input of the wrong shape
    #[error("Invalid value for '{field}' in segment '{segment}': {reason}")]
    InvalidValue {
        segment: String,
        field: String,
        reason: String,
    },

    /// Field bytes that are not UTF-8; `line` is 0 until the decode driver
    /// attaches the line number
    #[error("Element '{element}' of segment '{segment}' is not valid UTF-8 (line {line})")]
    InvalidEncoding {
        segment: String,
        element: String,
        line: usize,
    },

    #[error("Too many '{name}' segments ({count})")]
    TooManySegments { name: String, count: usize },

    /// The schema description cannot be turned into a codec
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
}

impl Error {
    /// Create a size overflow error
    pub fn exceeded_size(element: impl Into<String>, value: impl Into<String>, size: usize) -> Self {
        Self::ExceededSize {
            element: element.into(),
            value: value.into(),
            size,
        }
    }

    /// Create a missing required element error
    pub fn required_missing(element: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RequiredElementMissing {
            element: element.into(),
            reason: reason.into(),
        }
    }

    /// Create a conversion failure error
    pub fn conversion_failed(converter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConversionFailed {
            converter: converter.into(),
            message: message.into(),
        }
    }

    /// Create an unknown element error
    pub fn unknown_element(segment: impl Into<String>, element: impl Into<String>) -> Self {
        Self::UnknownElement {
            segment: segment.into(),
            element: element.into(),
        }
    }

    /// Create an invalid encode input error
    pub fn invalid_value(
        segment: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            segment: segment.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a schema configuration error
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::InvalidSchema(message.into())
    }

    /// Create an invalid encoding error, not yet tied to a line
    pub fn invalid_encoding(segment: impl Into<String>, element: impl Into<String>) -> Self {
        Self::InvalidEncoding {
            segment: segment.into(),
            element: element.into(),
            line: 0,
        }
    }

    /// Attach an input line number to errors that carry one
    #[must_use]
    pub fn with_line(mut self, number: usize) -> Self {
        if let Self::InvalidEncoding { line, .. } = &mut self {
            *line = number;
        }
        self
    }

    /// Get the input line number if the error is tied to one
    pub fn line_number(&self) -> Option<usize> {
        match self {
            Self::LineLengthMismatch { line, .. } | Self::OrphanLine { line, .. } => Some(*line),
            Self::InvalidEncoding { line, .. } if *line > 0 => Some(*line),
            _ => None,
        }
    }
}

impl From<flat_schema::Error> for Error {
    fn from(e: flat_schema::Error) -> Self {
        Self::InvalidSchema(e.to_string())
    }
}

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, Error>;
