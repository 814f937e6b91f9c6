//! Schema description definitions
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]

use serde::{Deserialize, Deserializer, Serialize};

/// A complete flat-file format description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescription {
    pub name: String,
    #[serde(default)]
    pub collection: String,
    #[serde(default)]
    pub version: String,
    /// How the record-type tag is read from a line, e.g. `first-3`
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default, alias = "raise_on_unknown_segment")]
    pub raise_if_unknown_segment: bool,
    #[serde(default = "default_true", alias = "skip_null_fields")]
    pub skip_null_value: bool,
    /// Padding used when encoding
    #[serde(
        default = "default_fill",
        alias = "separator",
        deserialize_with = "deserialize_fill"
    )]
    pub fill: String,
    #[serde(default)]
    pub segments: Vec<SegmentDescription>,
}

/// Description of one record type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentDescription {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub elements: Vec<ElementDescription>,
}

/// Description of one fixed-width field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDescription {
    pub name: String,
    /// Human readable label, documentation only
    #[serde(default, rename = "string", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(alias = "length")]
    pub size: usize,
    #[serde(default)]
    pub justify: Justify,
    #[serde(default)]
    pub required: bool,
    /// Fallback in external form; on the first element of a segment this is
    /// the record-type identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default)]
    pub ttype: TargetType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converter: Option<String>,
}

/// Field justification when padding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Justify {
    #[default]
    Left,
    Right,
}

/// Type a raw field is cast to before conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TargetType {
    #[default]
    #[serde(rename = "str", alias = "string")]
    String,
    #[serde(rename = "int", alias = "integer")]
    Integer,
    #[serde(rename = "float")]
    Float,
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetType::String => write!(f, "str"),
            TargetType::Integer => write!(f, "int"),
            TargetType::Float => write!(f, "float"),
        }
    }
}

fn default_method() -> String {
    "first-3".to_string()
}

fn default_true() -> bool {
    true
}

fn default_fill() -> String {
    " ".to_string()
}

fn deserialize_fill<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let fill = String::deserialize(deserializer)?;
    Ok(if fill == "space" { default_fill() } else { fill })
}

impl SchemaDescription {
    /// Create a description with default options and no segments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collection: String::new(),
            version: String::new(),
            method: default_method(),
            raise_if_unknown_segment: false,
            skip_null_value: true,
            fill: default_fill(),
            segments: Vec::new(),
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_version(mut self, collection: impl Into<String>, version: impl Into<String>) -> Self {
        self.collection = collection.into();
        self.version = version.into();
        self
    }

    pub fn raise_if_unknown_segment(mut self, raise: bool) -> Self {
        self.raise_if_unknown_segment = raise;
        self
    }

    pub fn skip_null_value(mut self, skip: bool) -> Self {
        self.skip_null_value = skip;
        self
    }

    pub fn with_fill(mut self, fill: impl Into<String>) -> Self {
        self.fill = fill.into();
        self
    }

    pub fn add_segment(mut self, segment: SegmentDescription) -> Self {
        self.segments.push(segment);
        self
    }

    /// Find a segment description by name
    pub fn find_segment(&self, name: &str) -> Option<&SegmentDescription> {
        self.segments.iter().find(|s| s.name == name)
    }
}

impl SegmentDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            multiple: false,
            parent: None,
            elements: Vec::new(),
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn add_element(mut self, element: ElementDescription) -> Self {
        self.elements.push(element);
        self
    }
}

impl ElementDescription {
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            description: None,
            size,
            justify: Justify::Left,
            required: false,
            default: None,
            ttype: TargetType::String,
            converter: None,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn right(mut self) -> Self {
        self.justify = Justify::Right;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_type(mut self, ttype: TargetType) -> Self {
        self.ttype = ttype;
        self
    }

    pub fn with_converter(mut self, converter: impl Into<String>) -> Self {
        self.converter = Some(converter.into());
        self
    }
}
