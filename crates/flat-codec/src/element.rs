//! Fixed-width fields
//!
//! An [`Element`] turns the raw text of one column into a typed [`Value`]
//! and renders a stored value back to exactly `size` characters.

use crate::converter::ConverterRegistry;
use crate::{Error, Result};
use flat_ir::Value;
use flat_schema::{ElementDescription, Justify, TargetType};
use tracing::trace;

/// One field of a segment, with the value it will be encoded with
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    /// Documentation only
    pub description: Option<String>,
    /// Width in bytes
    pub size: usize,
    pub justify: Justify,
    pub required: bool,
    /// Fallback in external form
    pub default: Option<String>,
    pub ttype: TargetType,
    pub converter: Option<String>,
    value: Value,
}

impl Element {
    /// Build an element template from its description
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSchema`] if the size is zero.
    pub fn from_description(description: &ElementDescription) -> Result<Self> {
        if description.size == 0 {
            return Err(Error::invalid_schema(format!(
                "element '{}' must have a size greater than zero",
                description.name
            )));
        }

        Ok(Self {
            name: description.name.clone(),
            description: description.description.clone(),
            size: description.size,
            justify: description.justify,
            required: description.required,
            default: description.default.clone(),
            ttype: description.ttype,
            converter: description.converter.clone(),
            value: Value::Null,
        })
    }

    /// The default as a value, `Null` when there is none
    #[must_use]
    pub fn default_value(&self) -> Value {
        Value::from(self.default.clone())
    }

    /// Value stored by [`Element::set_value`]
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Parse the raw text of this column.
    ///
    /// Blank text yields the default. Text that does not cast to the target
    /// type, or that the converter rejects, yields the default unless the
    /// element is required.
    ///
    /// # Errors
    ///
    /// - [`Error::ExceededSize`] when `raw` is wider than the element and
    ///   `allow_truncate` is false
    /// - [`Error::RequiredElementMissing`] when a required element cannot be
    ///   cast or converted
    /// - [`Error::ConverterNotFound`] when a required element names an
    ///   unregistered converter
    pub fn decode(&self, raw: &str, allow_truncate: bool, converters: &ConverterRegistry) -> Result<Value> {
        let raw = if raw.len() > self.size {
            if !allow_truncate {
                return Err(Error::exceeded_size(&self.name, raw, self.size));
            }
            truncate_bytes(raw, self.size)
        } else {
            raw
        };

        let text = raw.trim();
        if text.is_empty() {
            return Ok(self.default_value());
        }

        let value = match self.cast(text) {
            Ok(value) => value,
            Err(reason) if self.required => {
                return Err(Error::required_missing(&self.name, reason));
            }
            Err(reason) => {
                trace!(element = %self.name, %reason, "Cast failed, using default");
                return Ok(self.default_value());
            }
        };

        let Some(converter) = &self.converter else {
            return Ok(value);
        };

        match converters.decode(converter, &value) {
            Ok(converted) => Ok(converted),
            Err(err @ Error::ConverterNotFound(_)) if self.required => Err(err),
            Err(err) if self.required => Err(Error::required_missing(&self.name, err.to_string())),
            Err(err) => {
                trace!(element = %self.name, error = %err, "Conversion failed, using default");
                Ok(self.default_value())
            }
        }
    }

    fn cast(&self, text: &str) -> std::result::Result<Value, String> {
        match self.ttype {
            TargetType::String => Ok(Value::from(text)),
            TargetType::Integer => text
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|e| format!("'{text}' is not an integer: {e}")),
            TargetType::Float => text
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| format!("'{text}' is not a float: {e}")),
        }
    }

    /// Store a value for encoding.
    ///
    /// Text longer than the element is cut to at most `size` bytes, on a
    /// character boundary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExceededSize`] for a number too wide for the element.
    pub fn set_value(&mut self, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        self.value = match value {
            Value::Integer(_) | Value::Float(_) => {
                let text = match &value {
                    Value::Float(f) => format!("{f:.2}"),
                    other => other.to_string(),
                };
                if text.len() > self.size {
                    return Err(Error::exceeded_size(&self.name, text, self.size));
                }
                value
            }
            Value::String(s) if s.len() > self.size => {
                Value::String(truncate_bytes(&s, self.size).to_string())
            }
            other => other,
        };
        Ok(())
    }

    /// Render the stored value, or the default, as a field of `size` bytes
    /// padded with `fill`, which must be an ASCII character.
    ///
    /// A converted value already as wide as the element is returned as is.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RequiredElementMissing`] when a required element has
    /// neither value nor default, and converter errors unchanged.
    pub fn encode(&self, fill: char, converters: &ConverterRegistry) -> Result<String> {
        let value = match (&self.value, &self.default) {
            (Value::Null, Some(default)) if !default.is_empty() => Value::from(default.as_str()),
            (Value::Null, _) if self.required => {
                return Err(Error::required_missing(&self.name, "no value to encode"));
            }
            (Value::Null, _) => return Ok(fill.to_string().repeat(self.size)),
            (value, _) => value.clone(),
        };

        let value = match &self.converter {
            Some(converter) => converters.encode(converter, &value)?,
            None => value,
        };

        let text = value.render().unwrap_or_default();
        let width = text.len();
        if width >= self.size {
            return Ok(text);
        }

        let padding = fill.to_string().repeat(self.size - width);
        Ok(match self.justify {
            Justify::Left => text + &padding,
            Justify::Right => padding + &text,
        })
    }
}

fn truncate_bytes(text: &str, size: usize) -> &str {
    let mut end = size.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn amount(size: usize) -> Element {
        Element::from_description(
            &ElementDescription::new("Amount", size)
                .right()
                .with_type(TargetType::Integer)
                .with_converter("X 1 000"),
        )
        .unwrap()
    }

    fn text(size: usize) -> Element {
        Element::from_description(&ElementDescription::new("Description", size)).unwrap()
    }

    #[test]
    fn test_decode_scaled_amount() {
        let registry = ConverterRegistry::with_builtins();
        let element = amount(10);

        let cases = [
            ("1234567890", Value::Float(1_234_567.89)),
            ("123456789000", Value::Float(1_234_567.89)),
            (" 123456789", Value::Float(123_456.789)),
            ("       1  ", Value::Float(0.001)),
            ("1", Value::Float(0.001)),
            ("          ", Value::Null),
            ("", Value::Null),
        ];
        for (raw, expected) in cases {
            assert_eq!(element.decode(raw, true, &registry).unwrap(), expected, "raw {raw:?}");
        }
    }

    #[test]
    fn test_encode_scaled_amount() {
        let registry = ConverterRegistry::with_builtins();
        let cases = [
            (Some(1_234_567.89), "1234567890"),
            (Some(123_456.789), " 123456789"),
            (Some(12_345.678_9), "  12345678"),
            (Some(1_234.567_89), "   1234567"),
            (Some(1_234.5), "   1234500"),
            (Some(123.45), "    123450"),
            (Some(0.999), "       999"),
            (Some(0.099), "        99"),
            (Some(0.009), "         9"),
            (None, "          "),
        ];
        for (value, expected) in cases {
            let mut element = amount(10);
            element.set_value(value).unwrap();
            assert_eq!(element.encode(' ', &registry).unwrap(), expected, "value {value:?}");
        }
    }

    #[test]
    fn test_wide_amount() {
        let registry = ConverterRegistry::with_builtins();
        let mut element = amount(20);
        assert_eq!(element.decode("123450", false, &registry).unwrap(), Value::Float(123.45));

        element.set_value(123.45).unwrap();
        assert_eq!(element.encode(' ', &registry).unwrap(), "              123450");
    }

    #[test]
    fn test_decode_text() {
        let registry = ConverterRegistry::with_builtins();
        let element = text(10);

        assert_eq!(element.decode("   Lorem ", false, &registry).unwrap(), Value::from("Lorem"));
        assert!(matches!(
            element.decode("Lorem ipsum dolor", false, &registry),
            Err(Error::ExceededSize { size: 10, .. })
        ));
        assert_eq!(
            element.decode("Lorem ipsum dolor", true, &registry).unwrap(),
            Value::from("Lorem ipsu")
        );
    }

    #[test]
    fn test_truncate_on_char_boundary() {
        let registry = ConverterRegistry::with_builtins();
        let element = text(3);
        assert_eq!(element.decode("abé!", true, &registry).unwrap(), Value::from("ab"));
    }

    #[test]
    fn test_encode_text() {
        let registry = ConverterRegistry::with_builtins();

        let mut left = text(10);
        left.set_value("Lorem").unwrap();
        assert_eq!(left.encode(' ', &registry).unwrap(), "Lorem     ");

        let mut right = Element::from_description(&ElementDescription::new("Name", 10).right()).unwrap();
        right.set_value("Name A").unwrap();
        assert_eq!(right.encode(' ', &registry).unwrap(), "    Name A");

        let mut long = text(10);
        long.set_value("Lorem ipsum dolor").unwrap();
        assert_eq!(long.value(), &Value::from("Lorem ipsu"));
        assert_eq!(long.encode(' ', &registry).unwrap(), "Lorem ipsu");

        assert_eq!(text(4).encode('0', &registry).unwrap(), "0000");
    }

    #[test]
    fn test_width_is_counted_in_bytes() {
        let registry = ConverterRegistry::with_builtins();

        let mut element = text(6);
        element.set_value("café").unwrap();
        assert_eq!(element.encode(' ', &registry).unwrap(), "café ");
        assert_eq!(element.encode(' ', &registry).unwrap().len(), 6);

        // a two byte character straddling the limit is dropped whole
        let mut element = text(4);
        element.set_value("café").unwrap();
        assert_eq!(element.value(), &Value::from("caf"));
        assert_eq!(element.encode(' ', &registry).unwrap(), "caf ");
    }

    #[test]
    fn test_encode_default() {
        let registry = ConverterRegistry::with_builtins();
        let element =
            Element::from_description(&ElementDescription::new("Tag", 3).with_default("IDX")).unwrap();
        assert_eq!(element.encode(' ', &registry).unwrap(), "IDX");
        assert_eq!(element.decode("   ", false, &registry).unwrap(), Value::from("IDX"));
    }

    #[test]
    fn test_encode_required_without_value() {
        let registry = ConverterRegistry::with_builtins();
        let element =
            Element::from_description(&ElementDescription::new("POHNUM", 20).required()).unwrap();
        assert!(matches!(
            element.encode(' ', &registry),
            Err(Error::RequiredElementMissing { .. })
        ));
    }

    #[test]
    fn test_numbers_are_never_truncated() {
        let mut element = Element::from_description(
            &ElementDescription::new("POPLIN", 4).with_type(TargetType::Integer),
        )
        .unwrap();
        assert!(element.set_value(1234).is_ok());
        assert!(matches!(
            element.set_value(12345),
            Err(Error::ExceededSize { .. })
        ));
        assert!(matches!(
            element.set_value(12.5),
            Err(Error::ExceededSize { .. })
        ));
    }

    #[test]
    fn test_cast_failures() {
        let registry = ConverterRegistry::with_builtins();
        let optional = Element::from_description(
            &ElementDescription::new("Qty", 5)
                .with_type(TargetType::Integer)
                .with_default("0"),
        )
        .unwrap();
        assert_eq!(optional.decode("ab", false, &registry).unwrap(), Value::from("0"));

        let required = Element::from_description(
            &ElementDescription::new("Qty", 5)
                .with_type(TargetType::Integer)
                .required(),
        )
        .unwrap();
        assert!(matches!(
            required.decode("ab", false, &registry),
            Err(Error::RequiredElementMissing { .. })
        ));
        assert_eq!(required.decode(" 42  ", false, &registry).unwrap(), Value::Integer(42));

        let float = Element::from_description(
            &ElementDescription::new("Rate", 6).with_type(TargetType::Float),
        )
        .unwrap();
        assert_eq!(float.decode("  1.25", false, &registry).unwrap(), Value::Float(1.25));
    }

    #[test]
    fn test_converter_failures() {
        let registry = ConverterRegistry::with_builtins();

        let optional = Element::from_description(
            &ElementDescription::new("Date", 8).with_converter("AAAAMMJJ"),
        )
        .unwrap();
        assert_eq!(optional.decode("2024-13-", false, &registry).unwrap(), Value::Null);

        let required = Element::from_description(
            &ElementDescription::new("Date", 8)
                .with_converter("AAAAMMJJ")
                .required(),
        )
        .unwrap();
        assert!(matches!(
            required.decode("2024-13-", false, &registry),
            Err(Error::RequiredElementMissing { .. })
        ));

        let unknown = Element::from_description(
            &ElementDescription::new("Code", 4).with_converter("missing").required(),
        )
        .unwrap();
        assert!(matches!(
            unknown.decode("ABCD", false, &registry),
            Err(Error::ConverterNotFound(_))
        ));

        let unknown_optional = Element::from_description(
            &ElementDescription::new("Code", 4)
                .with_converter("missing")
                .with_default("NONE"),
        )
        .unwrap();
        assert_eq!(
            unknown_optional.decode("ABCD", false, &registry).unwrap(),
            Value::from("NONE")
        );
    }

    #[test]
    fn test_date_field() {
        let registry = ConverterRegistry::with_builtins();
        let mut element = Element::from_description(
            &ElementDescription::new("RCPDAT", 8).with_converter("AAAAMMJJ"),
        )
        .unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();

        assert_eq!(element.decode("20240610", false, &registry).unwrap(), Value::from(date));
        element.set_value(date).unwrap();
        assert_eq!(element.encode(' ', &registry).unwrap(), "20240610");
    }

    #[test]
    fn test_overflow_after_conversion_passes_through() {
        let registry = ConverterRegistry::with_builtins();
        let mut element = Element::from_description(
            &ElementDescription::new("Total", 10).with_converter("13v2"),
        )
        .unwrap();
        element.set_value(123.45).unwrap();
        assert_eq!(element.encode(' ', &registry).unwrap(), "0000000000123,45");
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(matches!(
            Element::from_description(&ElementDescription::new("Empty", 0)),
            Err(Error::InvalidSchema(_))
        ));
    }
}
