//! Path navigation over decoded records

use crate::record::{Entry, Record};
use crate::value::Value;
use crate::{Error, Result};

/// A borrowed view of whatever a path resolves to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cursor<'a> {
    /// A field value
    Value(&'a Value),
    /// A single record (non-repeating segment, or one element of a list)
    Record(&'a Record),
    /// Repeated records
    List(&'a [Record]),
}

impl<'a> Cursor<'a> {
    fn from_entry(entry: &'a Entry) -> Self {
        match entry {
            Entry::Value(value) => Cursor::Value(value),
            Entry::Record(record) => Cursor::Record(record),
            Entry::List(list) => Cursor::List(list),
        }
    }

    #[must_use]
    pub fn value(self) -> Option<&'a Value> {
        match self {
            Cursor::Value(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn record(self) -> Option<&'a Record> {
        match self {
            Cursor::Record(record) => Some(record),
            _ => None,
        }
    }

    #[must_use]
    pub fn list(self) -> Option<&'a [Record]> {
        match self {
            Cursor::List(list) => Some(list),
            _ => None,
        }
    }

    fn kind(self) -> &'static str {
        match self {
            Cursor::Value(_) => "value",
            Cursor::Record(_) => "record",
            Cursor::List(_) => "list",
        }
    }
}

impl Record {
    /// Resolve a slash separated path such as `Lines[1]/LotNumber[0]/YTEXTE`.
    ///
    /// A bare name on a list resolves to the list itself when it is the last
    /// step, and to its last element when navigation continues below it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] for malformed steps and
    /// [`Error::NotFound`] when a step does not exist.
    pub fn lookup(&self, path: &str) -> Result<Cursor<'_>> {
        let steps: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if steps.is_empty() {
            return Err(Error::invalid_path(path, "empty path"));
        }

        let mut cursor = Cursor::Record(self);
        let mut walked: Vec<&str> = Vec::with_capacity(steps.len());

        for step in steps {
            let (name, index) = parse_step(path, step)?;

            let record = match cursor {
                Cursor::Record(record) => record,
                Cursor::List(list) => list
                    .last()
                    .ok_or_else(|| Error::not_found(walked.join("/")))?,
                Cursor::Value(_) => {
                    return Err(Error::invalid_path(
                        path,
                        format!("'{}' is a value and has no children", walked.join("/")),
                    ));
                }
            };

            walked.push(step);
            let entry = record
                .get(name)
                .ok_or_else(|| Error::not_found(walked.join("/")))?;

            cursor = match (Cursor::from_entry(entry), index) {
                (Cursor::List(list), Some(i)) => Cursor::Record(
                    list.get(i)
                        .ok_or_else(|| Error::not_found(walked.join("/")))?,
                ),
                (other, Some(_)) => {
                    return Err(Error::type_mismatch("list", other.kind()));
                }
                (other, None) => other,
            };
        }

        Ok(cursor)
    }

    /// Resolve a path to a field value
    ///
    /// # Errors
    ///
    /// Same as [`Record::lookup`], plus a type mismatch when the path ends on
    /// a nested record or list.
    pub fn lookup_value(&self, path: &str) -> Result<&Value> {
        let cursor = self.lookup(path)?;
        cursor
            .value()
            .ok_or_else(|| Error::type_mismatch("value", cursor.kind()))
    }
}

fn parse_step<'p>(path: &str, step: &'p str) -> Result<(&'p str, Option<usize>)> {
    let Some(open) = step.find('[') else {
        return Ok((step, None));
    };
    let close = step
        .find(']')
        .ok_or_else(|| Error::invalid_path(path, format!("unclosed bracket in '{step}'")))?;
    let index = step[open + 1..close]
        .parse::<usize>()
        .map_err(|_| Error::invalid_path(path, format!("invalid index in '{step}'")))?;
    Ok((&step[..open], Some(index)))
}
