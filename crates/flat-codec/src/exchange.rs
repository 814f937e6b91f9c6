//! Output records assembled segment by segment

use crate::schema::Schema;
use crate::segment::SegmentInstance;
use crate::{Error, Result};
use flat_ir::Record;
use std::collections::HashMap;
use tracing::debug;

/// Name of the segment written by [`Exchange::set_header`]
pub const HEADER_SEGMENT: &str = "Header";

/// Segment instances of one output record, in emission order
#[derive(Debug, Clone)]
pub struct Exchange<'s> {
    schema: &'s Schema,
    segments: Vec<SegmentInstance>,
}

impl<'s> Exchange<'s> {
    #[must_use]
    pub fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            segments: Vec::new(),
        }
    }

    /// Put the header segment, and its children, at the front.
    ///
    /// Calling this twice yields two headers, which [`Exchange::check`]
    /// reports unless the header is `multiple`.
    ///
    /// # Errors
    ///
    /// Same as [`Schema::build`].
    pub fn set_header(&mut self, values: Record) -> Result<&mut Self> {
        let built = self.schema.build(HEADER_SEGMENT, values)?;
        self.segments.splice(0..0, built);
        Ok(self)
    }

    /// Append a segment and its children
    ///
    /// # Errors
    ///
    /// Same as [`Schema::build`].
    pub fn add_segment(&mut self, name: &str, values: Record) -> Result<&mut Self> {
        let built = self.schema.build(name, values)?;
        self.segments.extend(built);
        Ok(self)
    }

    #[must_use]
    pub fn segments(&self) -> &[SegmentInstance] {
        &self.segments
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Verify segment counts against the schema
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingRequiredSegments`] when a required segment
    /// has no instance, and [`Error::TooManySegments`] when a top-level
    /// segment that is not `multiple` occurs more than once.
    pub fn check(&self) -> Result<()> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for instance in &self.segments {
            *counts.entry(instance.name()).or_default() += 1;
        }

        let missing: Vec<String> = self
            .schema
            .segments()
            .iter()
            .filter(|s| s.required && !counts.contains_key(s.name.as_str()))
            .map(|s| s.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingRequiredSegments(missing));
        }

        for segment in self.schema.segments() {
            if segment.multiple || segment.parent.is_some() {
                continue;
            }
            let count = counts.get(segment.name.as_str()).copied().unwrap_or_default();
            if count > 1 {
                return Err(Error::TooManySegments {
                    name: segment.name.clone(),
                    count,
                });
            }
        }

        Ok(())
    }

    /// Check, then render every instance, one per line
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Exchange::check`] and the first segment
    /// encode error.
    pub fn dump(&self) -> Result<String> {
        self.check()?;

        let fill = self.schema.options().fill;
        let lines = self
            .segments
            .iter()
            .map(|instance| instance.encode(fill, self.schema.converters()))
            .collect::<Result<Vec<_>>>()?;

        debug!(schema = %self.schema.name(), lines = lines.len(), "Dumped exchange");
        Ok(lines.join("\n"))
    }
}
