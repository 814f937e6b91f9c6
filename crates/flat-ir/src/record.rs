//! Ordered records for decoded and to-be-encoded flat data
#![allow(clippy::must_use_candidate)] // Builder/accessor API intentionally omits pervasive #[must_use].
#![allow(clippy::return_self_not_must_use)] // Fluent builder methods return Self for ergonomics.

use crate::value::Value;
use chrono::NaiveDateTime;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// One entry of a [`Record`]
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// Field value
    Value(Value),

    /// Single nested record (non-repeating segment)
    Record(Record),

    /// Repeated nested records (`multiple` segment)
    List(Vec<Record>),
}

/// An ordered name -> entry mapping.
///
/// Keys keep their insertion order; inserting an existing key replaces its
/// entry in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: Vec<(String, Entry)>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Record::insert`]
    pub fn with(mut self, name: impl Into<String>, entry: impl Into<Entry>) -> Self {
        self.insert(name, entry);
        self
    }

    /// Insert or replace an entry, returning the previous one
    pub fn insert(&mut self, name: impl Into<String>, entry: impl Into<Entry>) -> Option<Entry> {
        let name = name.into();
        let entry = entry.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, entry)),
            None => {
                self.entries.push((name, entry));
                None
            }
        }
    }

    /// Remove an entry, preserving the order of the others
    pub fn remove(&mut self, name: &str) -> Option<Entry> {
        let index = self.entries.iter().position(|(key, _)| key == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, entry)| entry)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Entry> {
        self.entries
            .iter_mut()
            .find(|(key, _)| key == name)
            .map(|(_, entry)| entry)
    }

    /// Get a field value by name
    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.get(name) {
            Some(Entry::Value(value)) => Some(value),
            _ => None,
        }
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    /// Copy every entry of `other` into this record, replacing duplicates
    pub fn merge(&mut self, other: Record) {
        for (name, entry) in other.entries {
            self.insert(name, entry);
        }
    }

    /// Append a record to the list stored under `name`.
    ///
    /// A missing entry becomes a one-element list; a non-list entry is
    /// replaced by one.
    pub fn push_to_list(&mut self, name: &str, record: Record) {
        match self.get_mut(name) {
            Some(Entry::List(list)) => list.push(record),
            Some(slot) => *slot = Entry::List(vec![record]),
            None => {
                self.entries
                    .push((name.to_string(), Entry::List(vec![record])));
            }
        }
    }

    /// The record an entry resolves to when nesting: a single record, or the
    /// last element of a list.
    pub fn last_record_mut(&mut self, name: &str) -> Option<&mut Record> {
        match self.get_mut(name)? {
            Entry::Record(record) => Some(record),
            Entry::List(list) => list.last_mut(),
            Entry::Value(_) => None,
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, Entry);
    type IntoIter = std::vec::IntoIter<(String, Entry)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(String, Entry)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Entry)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, entry) in iter {
            record.insert(name, entry);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, entry) in &self.entries {
            map.serialize_entry(name, entry)?;
        }
        map.end()
    }
}

impl Serialize for Entry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Entry::Value(value) => value.serialize(serializer),
            Entry::Record(record) => record.serialize(serializer),
            Entry::List(list) => list.serialize(serializer),
        }
    }
}

impl From<Value> for Entry {
    fn from(value: Value) -> Self {
        Entry::Value(value)
    }
}

impl From<Record> for Entry {
    fn from(record: Record) -> Self {
        Entry::Record(record)
    }
}

impl From<Vec<Record>> for Entry {
    fn from(list: Vec<Record>) -> Self {
        Entry::List(list)
    }
}

impl From<&str> for Entry {
    fn from(s: &str) -> Self {
        Entry::Value(Value::from(s))
    }
}

impl From<String> for Entry {
    fn from(s: String) -> Self {
        Entry::Value(Value::from(s))
    }
}

impl From<i64> for Entry {
    fn from(i: i64) -> Self {
        Entry::Value(Value::from(i))
    }
}

impl From<i32> for Entry {
    fn from(i: i32) -> Self {
        Entry::Value(Value::from(i))
    }
}

impl From<f64> for Entry {
    fn from(f: f64) -> Self {
        Entry::Value(Value::from(f))
    }
}

impl From<NaiveDateTime> for Entry {
    fn from(dt: NaiveDateTime) -> Self {
        Entry::Value(Value::from(dt))
    }
}
