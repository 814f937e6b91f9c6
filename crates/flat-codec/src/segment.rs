//! Record types: ordered elements sharing one line
//!
//! A [`Segment`] is an immutable template built once per schema. Encoding
//! works on [`SegmentInstance`]s, each holding its own copy of the elements.

use crate::converter::ConverterRegistry;
use crate::element::Element;
use crate::{Error, Result};
use flat_ir::{Entry, Record, Value};
use flat_schema::SegmentDescription;
use std::collections::HashMap;

/// Template for one record type
#[derive(Debug, Clone)]
pub struct Segment {
    pub name: String,
    pub required: bool,
    /// May occur any number of times
    pub multiple: bool,
    /// Name of the enclosing segment
    pub parent: Option<String>,
    elements: Vec<Element>,
    by_name: HashMap<String, usize>,
}

impl Segment {
    /// Build a template from its description
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSchema`] when the segment has no elements,
    /// duplicate element names, a zero sized element, or a first element
    /// without default (the identifier).
    pub fn from_description(description: &SegmentDescription) -> Result<Self> {
        if description.elements.is_empty() {
            return Err(Error::invalid_schema(format!(
                "segment '{}' has no elements",
                description.name
            )));
        }

        let elements = description
            .elements
            .iter()
            .map(Element::from_description)
            .collect::<Result<Vec<_>>>()?;

        let mut by_name = HashMap::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            if by_name.insert(element.name.clone(), index).is_some() {
                return Err(Error::invalid_schema(format!(
                    "segment '{}' declares element '{}' twice",
                    description.name, element.name
                )));
            }
        }

        if elements[0].default.as_deref().is_none_or(str::is_empty) {
            return Err(Error::invalid_schema(format!(
                "segment '{}' has no identifier: its first element needs a default",
                description.name
            )));
        }

        Ok(Self {
            name: description.name.clone(),
            required: description.required,
            multiple: description.multiple,
            parent: description.parent.clone(),
            elements,
            by_name,
        })
    }

    /// Record-type tag, the default of the first element
    #[must_use]
    pub fn identifier(&self) -> &str {
        self.elements[0].default.as_deref().unwrap_or_default()
    }

    /// Line width in bytes
    #[must_use]
    pub fn size(&self) -> usize {
        self.elements.iter().map(|e| e.size).sum()
    }

    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    #[must_use]
    pub fn element(&self, name: &str) -> Option<&Element> {
        self.by_name.get(name).map(|&i| &self.elements[i])
    }

    /// Cut a line into one raw slice per element
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldCountMismatch`] if the line ends before the last
    /// element, and [`Error::InvalidEncoding`] for a field whose bytes are
    /// not UTF-8, including a character cut by a column boundary.
    pub fn decode(&self, line: &[u8]) -> Result<Vec<String>> {
        let mut slices = Vec::with_capacity(self.elements.len());
        let mut offset = 0;

        for element in &self.elements {
            let end = offset + element.size;
            let Some(bytes) = line.get(offset..end) else {
                return Err(Error::FieldCountMismatch {
                    segment: self.name.clone(),
                    expected: self.elements.len(),
                    actual: slices.len(),
                });
            };
            let text = std::str::from_utf8(bytes)
                .map_err(|_| Error::invalid_encoding(&self.name, &element.name))?;
            slices.push(text.to_string());
            offset = end;
        }

        Ok(slices)
    }

    /// Decode raw slices positionally
    ///
    /// # Errors
    ///
    /// Returns [`Error::ElementsNumberIncorrect`] when the slice count is
    /// wrong, and element decode errors unchanged.
    pub fn decode_values(&self, raw: &[String], converters: &ConverterRegistry) -> Result<Vec<Value>> {
        if raw.len() != self.elements.len() {
            return Err(Error::ElementsNumberIncorrect {
                segment: self.name.clone(),
                expected: self.elements.len(),
                actual: raw.len(),
            });
        }

        self.elements
            .iter()
            .zip(raw)
            .map(|(element, text)| element.decode(text, false, converters))
            .collect()
    }

    /// Name the decoded values; with `skip_nulls`, null and empty values are
    /// left out
    #[must_use]
    pub fn to_mapping(&self, values: Vec<Value>, skip_nulls: bool) -> Record {
        self.elements
            .iter()
            .zip(values)
            .filter(|(_, value)| !(skip_nulls && value.is_empty()))
            .map(|(element, value)| (element.name.clone(), Entry::Value(value)))
            .collect()
    }

    /// Decode one whole line into a record
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`Segment::decode`] and
    /// [`Segment::decode_values`].
    pub fn decode_line(&self, line: &[u8], converters: &ConverterRegistry, skip_nulls: bool) -> Result<Record> {
        let raw = self.decode(line)?;
        let values = self.decode_values(&raw, converters)?;
        Ok(self.to_mapping(values, skip_nulls))
    }

    /// Names of required elements whose decoded value is empty
    #[must_use]
    pub fn missing_required(&self, values: &[Value]) -> Vec<&str> {
        self.elements
            .iter()
            .zip(values)
            .filter(|(element, value)| element.required && value.is_empty())
            .map(|(element, _)| element.name.as_str())
            .collect()
    }

    /// Copy the template and store `values` in the copy
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownElement`] for a key that names no element,
    /// [`Error::InvalidValue`] for a nested record or list, and
    /// [`Error::ExceededSize`] from [`Element::set_value`].
    pub fn instantiate(&self, values: Record) -> Result<SegmentInstance> {
        let mut elements = self.elements.clone();

        for (key, entry) in values {
            let index = *self
                .by_name
                .get(&key)
                .ok_or_else(|| Error::unknown_element(&self.name, &key))?;
            let Entry::Value(value) = entry else {
                return Err(Error::invalid_value(
                    &self.name,
                    key,
                    "nested records are only accepted for child segments",
                ));
            };
            elements[index].set_value(value)?;
        }

        Ok(SegmentInstance {
            name: self.name.clone(),
            elements,
        })
    }
}

/// One occurrence of a segment, ready to encode
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentInstance {
    name: String,
    elements: Vec<Element>,
}

impl SegmentInstance {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Stored value of an element, `None` if the element does not exist
    #[must_use]
    pub fn value(&self, element: &str) -> Option<&Value> {
        self.elements
            .iter()
            .find(|e| e.name == element)
            .map(Element::value)
    }

    /// Render the line
    ///
    /// # Errors
    ///
    /// Propagates the first element encode error.
    pub fn encode(&self, fill: char, converters: &ConverterRegistry) -> Result<String> {
        self.elements
            .iter()
            .map(|element| element.encode(fill, converters))
            .collect()
    }
}
