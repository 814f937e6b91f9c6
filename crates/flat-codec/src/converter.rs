//! Named bidirectional value converters
//!
//! A [`ConverterRegistry`] is built once, usually through
//! [`ConverterRegistry::with_builtins`], then shared read-only through an
//! `Arc` by every [`crate::Schema`] that needs it.

use crate::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use flat_ir::Value;
use std::collections::HashMap;
use std::fmt::{self, Write as _};
use std::sync::Arc;
use tracing::debug;

/// One direction of a converter. Failures are reported as plain messages and
/// wrapped into [`Error::ConversionFailed`] by the registry.
pub type ConvertFn = Arc<dyn Fn(&Value) -> std::result::Result<Value, String> + Send + Sync>;

/// A named pair of transforms between external and internal forms
#[derive(Clone)]
pub struct Converter {
    /// Registration name
    pub name: String,

    /// External to internal
    decode: ConvertFn,

    /// Internal to external
    encode: ConvertFn,
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter").field("name", &self.name).finish()
    }
}

impl Converter {
    /// Create a converter from a pair of closures
    pub fn new(
        name: impl Into<String>,
        decode: impl Fn(&Value) -> std::result::Result<Value, String> + Send + Sync + 'static,
        encode: impl Fn(&Value) -> std::result::Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            decode: Arc::new(decode),
            encode: Arc::new(encode),
        }
    }

    /// Integer text on the wire, `value / multiplier` in memory.
    ///
    /// Encoding truncates toward zero.
    #[allow(clippy::cast_precision_loss)]
    pub fn scaled_integer(name: impl Into<String>, multiplier: i64) -> Self {
        let factor = multiplier as f64;
        Self::new(
            name,
            move |value| {
                let raw = match value {
                    Value::Integer(i) => *i as f64,
                    Value::Float(f) => *f,
                    Value::String(s) => s
                        .trim()
                        .parse::<f64>()
                        .map_err(|e| format!("'{s}' is not a number: {e}"))?,
                    other => return Err(format!("cannot scale a {}", other.type_name())),
                };
                Ok(Value::Float(raw / factor))
            },
            move |value| {
                let number = value
                    .as_f64()
                    .ok_or_else(|| format!("cannot scale a {}", value.type_name()))?;
                let scaled = (number * factor).trunc();
                if !scaled.is_finite() || scaled.abs() > 9.0e15 {
                    return Err(format!("{number} is out of range"));
                }
                #[allow(clippy::cast_possible_truncation)]
                let scaled = scaled as i64;
                Ok(Value::Integer(scaled))
            },
        )
    }

    /// Zero padded decimal text with a comma separator, e.g. `0000000000123,45`
    pub fn fixed_decimal(name: impl Into<String>, decimals: usize, width: usize) -> Self {
        Self::new(
            name,
            |value| match value {
                Value::String(s) => {
                    let text = s.trim().replace(',', ".");
                    text.parse::<f64>()
                        .map(Value::Float)
                        .map_err(|e| format!("'{s}' is not a decimal: {e}"))
                }
                Value::Integer(_) | Value::Float(_) => {
                    Ok(Value::Float(value.as_f64().unwrap_or_default()))
                }
                other => Err(format!("cannot read a {} as a decimal", other.type_name())),
            },
            move |value| {
                let number = match value {
                    Value::String(s) => s
                        .trim()
                        .replace(',', ".")
                        .parse::<f64>()
                        .map_err(|e| format!("'{s}' is not a decimal: {e}"))?,
                    other => other
                        .as_f64()
                        .ok_or_else(|| format!("cannot write a {} as a decimal", other.type_name()))?,
                };
                let text = format!("{number:.decimals$}").replace('.', ",");
                Ok(Value::String(zero_pad(&text, width)))
            },
        )
    }

    /// Calendar date text such as `20240501`, a timestamp at midnight in memory
    pub fn date(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        let pattern: Arc<str> = Arc::from(pattern.into());
        let decode_pattern = Arc::clone(&pattern);
        Self::new(
            name,
            move |value| {
                let text = match value {
                    Value::DateTime(_) => return Ok(value.clone()),
                    Value::String(s) => s.trim().to_string(),
                    Value::Integer(i) => i.to_string(),
                    other => return Err(format!("cannot read a {} as a date", other.type_name())),
                };
                NaiveDate::parse_from_str(&text, &decode_pattern)
                    .map(|date| Value::DateTime(date.and_time(NaiveTime::MIN)))
                    .map_err(|e| format!("'{text}' does not match '{decode_pattern}': {e}"))
            },
            move |value| match value {
                Value::DateTime(dt) => format_datetime(dt, &pattern).map(Value::String),
                Value::String(_) => Ok(value.clone()),
                other => Err(format!("cannot write a {} as a date", other.type_name())),
            },
        )
    }

    /// Apply the external to internal direction
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConversionFailed`] if the input cannot be converted.
    pub fn decode(&self, value: &Value) -> Result<Value> {
        (self.decode)(value).map_err(|message| Error::conversion_failed(&self.name, message))
    }

    /// Apply the internal to external direction
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConversionFailed`] if the input cannot be converted.
    pub fn encode(&self, value: &Value) -> Result<Value> {
        (self.encode)(value).map_err(|message| Error::conversion_failed(&self.name, message))
    }
}

fn zero_pad(text: &str, width: usize) -> String {
    match text.strip_prefix('-') {
        Some(digits) => format!("-{digits:0>pad$}", pad = width.saturating_sub(1)),
        None => format!("{text:0>width$}"),
    }
}

fn format_datetime(dt: &NaiveDateTime, pattern: &str) -> std::result::Result<String, String> {
    let mut out = String::new();
    write!(out, "{}", dt.format(pattern)).map_err(|_| format!("invalid date pattern '{pattern}'"))?;
    Ok(out)
}

/// Registry of converters, in registration order
#[derive(Debug, Clone, Default)]
pub struct ConverterRegistry {
    order: Vec<String>,
    converters: HashMap<String, Converter>,
}

impl ConverterRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the standard converters
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_converter(Converter::scaled_integer("X 1 000", 1000));
        registry.register_converter(Converter::scaled_integer("X 10 000", 10_000));
        registry.register_converter(Converter::fixed_decimal("9v5", 5, 15));
        registry.register_converter(Converter::fixed_decimal("12v2", 2, 15));
        registry.register_converter(Converter::fixed_decimal("13v2", 2, 16));
        registry.register_converter(Converter::fixed_decimal("17v2", 2, 20));
        registry.register_converter(Converter::date("SSAAMMJJ", "%Y%m%d"));
        registry.register_converter(Converter::date("AAAAMMJJ", "%Y%m%d"));
        registry
    }

    /// Register a converter from closures; a duplicate name replaces the
    /// previous converter and keeps its position
    pub fn register(
        &mut self,
        name: impl Into<String>,
        decode: impl Fn(&Value) -> std::result::Result<Value, String> + Send + Sync + 'static,
        encode: impl Fn(&Value) -> std::result::Result<Value, String> + Send + Sync + 'static,
    ) -> &mut Self {
        self.register_converter(Converter::new(name, decode, encode))
    }

    /// Register a prepared converter
    pub fn register_converter(&mut self, converter: Converter) -> &mut Self {
        let name = converter.name.clone();
        if self.converters.insert(name.clone(), converter).is_some() {
            debug!(converter = %name, "Replacing registered converter");
        } else {
            self.order.push(name);
        }
        self
    }

    /// Get a converter by name
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConverterNotFound`] if `name` was never registered.
    pub fn get(&self, name: &str) -> Result<&Converter> {
        self.converters
            .get(name)
            .ok_or_else(|| Error::ConverterNotFound(name.to_string()))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.converters.contains_key(name)
    }

    /// Convert an external value with the named converter
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConverterNotFound`] or [`Error::ConversionFailed`].
    pub fn decode(&self, name: &str, value: &Value) -> Result<Value> {
        self.get(name)?.decode(value)
    }

    /// Convert an internal value with the named converter
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConverterNotFound`] or [`Error::ConversionFailed`].
    pub fn encode(&self, name: &str, value: &Value) -> Result<Value> {
        self.get(name)?.encode(value)
    }

    /// Registered names in registration order
    #[must_use]
    pub fn list(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
