//! Decode driver: flat lines to a nested record

use crate::schema::Schema;
use crate::segment::Segment;
use crate::{Error, Result};
use flat_ir::{Entry, Record};
use std::collections::HashSet;
use tracing::{debug, trace, warn};

/// Non-empty lines with their 1-based line numbers; `\r` before `\n` is
/// dropped
fn split_lines(content: &[u8]) -> Vec<(usize, &[u8])> {
    content
        .split(|&b| b == b'\n')
        .enumerate()
        .map(|(index, line)| (index + 1, line.strip_suffix(b"\r").unwrap_or(line)))
        .filter(|(_, line)| !line.is_empty())
        .collect()
}

impl Schema {
    /// Decode a whole flat buffer.
    ///
    /// Every required segment must have at least one line and, when
    /// configured, every line must have a known identifier; both checks run
    /// before any line is decoded. Lines with an unknown identifier are
    /// otherwise skipped.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingRequiredSegments`] / [`Error::UnknownSegments`]
    ///   from the up-front checks
    /// - [`Error::LineLengthMismatch`] for a line shorter than its segment
    /// - [`Error::OrphanLine`] for a child line with no parent line before it
    /// - [`Error::InvalidEncoding`] for a field that is not UTF-8
    /// - any element decode error
    pub fn decode(&self, content: &[u8]) -> Result<Record> {
        let method = self.options().identifier_method;
        // a prefix that is not UTF-8 names no segment
        let lines: Vec<(usize, &[u8], Option<&str>)> = split_lines(content)
            .into_iter()
            .map(|(number, line)| (number, line, std::str::from_utf8(method.extract(line)).ok()))
            .collect();

        self.check_identifiers(&lines)?;

        let skip_nulls = self.options().skip_null_fields;
        let mut data = Record::new();
        let mut last_top_level: Option<&str> = None;
        let mut decoded = 0usize;

        for (number, line, identifier) in &lines {
            let Some(segment) = identifier.and_then(|id| self.segment_for(id)) else {
                warn!(
                    line = number,
                    identifier = %method.extract(line).escape_ascii(),
                    "Skipping line with unknown identifier"
                );
                continue;
            };

            if line.len() < segment.size() {
                return Err(Error::LineLengthMismatch {
                    segment: segment.name.clone(),
                    line: *number,
                    actual: line.len(),
                    expected: segment.size(),
                });
            }

            let values = segment
                .decode_line(line, self.converters(), skip_nulls)
                .map_err(|e| e.with_line(*number))?;
            trace!(line = number, segment = %segment.name, fields = values.len(), "Decoded line");

            if segment.parent.is_some() {
                self.place_child(&mut data, segment, last_top_level, *number, values)?;
            } else {
                place_top_level(&mut data, segment, values);
                last_top_level = Some(&segment.name);
            }
            decoded += 1;
        }

        debug!(
            schema = %self.name(),
            lines = lines.len(),
            segments = decoded,
            "Decoded flat content"
        );
        Ok(data)
    }

    /// Decode UTF-8 text
    ///
    /// # Errors
    ///
    /// Same as [`Schema::decode`].
    pub fn decode_str(&self, content: &str) -> Result<Record> {
        self.decode(content.as_bytes())
    }

    /// Decode without failing: an error becomes a record holding only an
    /// `error` message, for batch callers that move on to the next input
    #[must_use]
    pub fn decode_silent(&self, content: &[u8]) -> Record {
        self.decode(content).unwrap_or_else(|err| {
            warn!(schema = %self.name(), error = %err, "Decode failed");
            Record::new().with("error", err.to_string())
        })
    }

    fn check_identifiers(&self, lines: &[(usize, &[u8], Option<&str>)]) -> Result<()> {
        let present: HashSet<&str> = lines.iter().filter_map(|(_, _, id)| *id).collect();

        let missing: Vec<String> = self
            .segments()
            .iter()
            .filter(|s| s.required && !present.contains(s.identifier()))
            .map(|s| s.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingRequiredSegments(missing));
        }

        if self.options().raise_on_unknown_segment {
            let method = self.options().identifier_method;
            let mut seen = HashSet::new();
            let unknown: Vec<String> = lines
                .iter()
                .filter(|(_, _, id)| id.is_none_or(|id| self.segment_for(id).is_none()))
                .map(|(_, line, _)| method.extract(line).escape_ascii().to_string())
                .filter(|id| seen.insert(id.clone()))
                .collect();
            if !unknown.is_empty() {
                return Err(Error::UnknownSegments(unknown));
            }
        }

        Ok(())
    }

    /// Nest a child line under the last occurrence of its parent chain. The
    /// chain must start at the most recent top-level segment. A repeated
    /// single child replaces the previous one.
    fn place_child(
        &self,
        data: &mut Record,
        segment: &Segment,
        last_top_level: Option<&str>,
        line: usize,
        values: Record,
    ) -> Result<()> {
        let orphan = || Error::OrphanLine {
            segment: segment.name.clone(),
            line,
        };

        let chain = self.ancestors(&segment.name);
        let (root, rest) = chain.split_first().ok_or_else(orphan)?;
        if last_top_level != Some(*root) {
            return Err(orphan());
        }

        let mut container = data.last_record_mut(root).ok_or_else(orphan)?;
        for ancestor in rest {
            container = container.last_record_mut(ancestor).ok_or_else(orphan)?;
        }

        if segment.multiple {
            container.push_to_list(&segment.name, values);
        } else {
            container.insert(segment.name.clone(), values);
        }
        Ok(())
    }
}

/// Append to the segment's list, or merge into its single record
fn place_top_level(data: &mut Record, segment: &Segment, values: Record) {
    if segment.multiple {
        data.push_to_list(&segment.name, values);
    } else if let Some(Entry::Record(existing)) = data.get_mut(&segment.name) {
        existing.merge(values);
    } else {
        data.insert(segment.name.clone(), values);
    }
}
