//! Codec options derived from a schema description

use crate::{Error, Result};
use flat_schema::SchemaDescription;
use regex::Regex;
use std::sync::OnceLock;

/// `first-3`, `first_3_letters` and the like
static METHOD_PATTERN: OnceLock<Regex> = OnceLock::new();

fn method_regex() -> &'static Regex {
    METHOD_PATTERN.get_or_init(|| {
        Regex::new(r"^first[-_](\d+)(?:[-_]letters?)?$").expect("Invalid identifier method pattern")
    })
}

/// How the record-type tag is read from a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierMethod {
    width: usize,
}

impl IdentifierMethod {
    /// Take the first `width` bytes of the line
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSchema`] if `width` is zero.
    pub fn first(width: usize) -> Result<Self> {
        if width == 0 {
            return Err(Error::invalid_schema("identifier width must be at least 1"));
        }
        Ok(Self { width })
    }

    /// Parse `first-1`, `first-3`, `first_3_letters` and the like
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSchema`] for any other spelling.
    pub fn parse(method: &str) -> Result<Self> {
        let width = method_regex()
            .captures(method.trim())
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<usize>().ok())
            .ok_or_else(|| Error::invalid_schema(format!("unsupported identifier method '{method}'")))?;
        Self::first(width)
    }

    #[must_use]
    pub fn width(self) -> usize {
        self.width
    }

    /// Identifier prefix of a line; shorter lines yield the whole line
    #[must_use]
    pub fn extract(self, line: &[u8]) -> &[u8] {
        &line[..line.len().min(self.width)]
    }
}

impl Default for IdentifierMethod {
    fn default() -> Self {
        Self { width: 3 }
    }
}

/// Global options applied by a [`crate::Schema`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecOptions {
    pub identifier_method: IdentifierMethod,
    /// Fail instead of skipping lines whose identifier is unknown
    pub raise_on_unknown_segment: bool,
    /// Omit empty fields from decoded records
    pub skip_null_fields: bool,
    /// Padding character used when encoding, always ASCII so that padding
    /// never changes a field's byte width
    pub fill: char,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            identifier_method: IdentifierMethod::default(),
            raise_on_unknown_segment: false,
            skip_null_fields: true,
            fill: ' ',
        }
    }
}

impl CodecOptions {
    /// Read the options carried by a description
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSchema`] for an unsupported method or a fill
    /// that is not exactly one ASCII character.
    pub fn from_description(description: &SchemaDescription) -> Result<Self> {
        let mut chars = description.fill.chars();
        let fill = match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii() => c,
            _ => {
                return Err(Error::invalid_schema(format!(
                    "fill must be a single ASCII character, got '{}'",
                    description.fill
                )));
            }
        };

        Ok(Self {
            identifier_method: IdentifierMethod::parse(&description.method)?,
            raise_on_unknown_segment: description.raise_if_unknown_segment,
            skip_null_fields: description.skip_null_value,
            fill,
        })
    }
}
