//! In-memory format definition
//!
//! A [`Schema`] is built once from a [`SchemaDescription`] and is read-only
//! afterwards, so it can be shared between threads to decode many inputs.

use crate::config::CodecOptions;
use crate::converter::ConverterRegistry;
use crate::exchange::Exchange;
use crate::segment::Segment;
use crate::{Error, Result};
use flat_schema::SchemaDescription;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Segment templates, lookup indexes and options of one format
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    collection: String,
    version: String,
    segments: Vec<Segment>,
    by_identifier: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
    /// parent name -> child names, in declaration order
    relations: HashMap<String, Vec<String>>,
    options: CodecOptions,
    converters: Arc<ConverterRegistry>,
}

impl Schema {
    /// Build a schema from its description
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSchema`] for bad options, invalid segments,
    /// duplicate segment names, parents naming unknown segments and cyclic
    /// parent chains.
    pub fn new(description: &SchemaDescription, converters: Arc<ConverterRegistry>) -> Result<Self> {
        let options = CodecOptions::from_description(description)?;

        let segments = description
            .segments
            .iter()
            .map(Segment::from_description)
            .collect::<Result<Vec<_>>>()?;

        let mut by_name = HashMap::with_capacity(segments.len());
        let mut by_identifier = HashMap::with_capacity(segments.len());
        for (index, segment) in segments.iter().enumerate() {
            if by_name.insert(segment.name.clone(), index).is_some() {
                return Err(Error::invalid_schema(format!(
                    "segment '{}' is declared twice",
                    segment.name
                )));
            }

            let identifier = segment.identifier();
            if identifier.len() != options.identifier_method.width() {
                warn!(
                    segment = %segment.name,
                    identifier,
                    width = options.identifier_method.width(),
                    "Identifier width differs from the identifier method"
                );
            }
            if let Some(previous) = by_identifier.insert(identifier.to_string(), index) {
                warn!(
                    identifier,
                    replaced = %segments[previous].name,
                    by = %segment.name,
                    "Duplicate segment identifier, the last declaration wins"
                );
            }

            for element in segment.elements() {
                if let Some(converter) = &element.converter {
                    if !converters.contains(converter) {
                        warn!(
                            segment = %segment.name,
                            element = %element.name,
                            converter = %converter,
                            "Element uses an unregistered converter"
                        );
                    }
                }
            }
        }

        let mut relations: HashMap<String, Vec<String>> = HashMap::new();
        for segment in &segments {
            if let Some(parent) = &segment.parent {
                if !by_name.contains_key(parent) {
                    return Err(Error::invalid_schema(format!(
                        "segment '{}' has unknown parent '{parent}'",
                        segment.name
                    )));
                }
                relations
                    .entry(parent.clone())
                    .or_default()
                    .push(segment.name.clone());
            }
        }

        let schema = Self {
            name: description.name.clone(),
            collection: description.collection.clone(),
            version: description.version.clone(),
            segments,
            by_identifier,
            by_name,
            relations,
            options,
            converters,
        };
        schema.check_cycles()?;

        debug!(
            schema = %schema.name,
            segments = schema.segments.len(),
            "Schema built"
        );
        Ok(schema)
    }

    /// Build a schema with the standard converters
    ///
    /// # Errors
    ///
    /// Same as [`Schema::new`].
    pub fn with_builtins(description: &SchemaDescription) -> Result<Self> {
        Self::new(description, Arc::new(ConverterRegistry::with_builtins()))
    }

    fn check_cycles(&self) -> Result<()> {
        for segment in &self.segments {
            let mut current = segment.parent.as_deref();
            let mut steps = 0;
            while let Some(parent) = current {
                steps += 1;
                if parent == segment.name || steps > self.segments.len() {
                    return Err(Error::invalid_schema(format!(
                        "segment '{}' is its own ancestor",
                        segment.name
                    )));
                }
                current = self
                    .by_name
                    .get(parent)
                    .and_then(|&i| self.segments[i].parent.as_deref());
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    #[must_use]
    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    /// Segment templates in declaration order
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Look up a segment template by name
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownSegmentName`] if no segment has that name.
    pub fn segment(&self, name: &str) -> Result<&Segment> {
        self.by_name
            .get(name)
            .map(|&i| &self.segments[i])
            .ok_or_else(|| Error::UnknownSegmentName(name.to_string()))
    }

    /// Segment template selected by a record-type tag
    #[must_use]
    pub fn segment_for(&self, identifier: &str) -> Option<&Segment> {
        self.by_identifier.get(identifier).map(|&i| &self.segments[i])
    }

    /// Names of the segments declared with `name` as parent
    #[must_use]
    pub fn children(&self, name: &str) -> &[String] {
        self.relations.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Parent chain of a segment, outermost first, without the segment itself
    #[must_use]
    pub fn ancestors(&self, name: &str) -> Vec<&str> {
        let mut chain = Vec::new();
        let mut current = self.segment(name).ok().and_then(|s| s.parent.as_deref());
        while let Some(parent) = current {
            chain.push(parent);
            current = self.segment(parent).ok().and_then(|s| s.parent.as_deref());
        }
        chain.reverse();
        chain
    }

    /// Element names per segment, in declaration order
    #[must_use]
    pub fn structure(&self) -> Vec<(&str, Vec<&str>)> {
        self.segments
            .iter()
            .map(|segment| {
                (
                    segment.name.as_str(),
                    segment.elements().iter().map(|e| e.name.as_str()).collect(),
                )
            })
            .collect()
    }

    /// Start assembling an output record
    #[must_use]
    pub fn create_exchange(&self) -> Exchange<'_> {
        Exchange::new(self)
    }
}
