//! The `version` table: named integer counters read from the database
//! client's pipe-delimited output.

use serde::Serialize;
use std::num::ParseIntError;
use thiserror::Error;

pub const FIELD_SEPARATOR: char = '|';

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionEntry {
    pub name: String,
    pub value: i64,
}

/// Name → version mapping that keeps first-insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VersionTable {
    entries: Vec<VersionEntry>,
}

#[derive(Error, Debug)]
pub enum VersionParseError {
    #[error("line {line}: version of '{name}' is not an integer: '{value}'")]
    NotAnInteger {
        line: usize,
        name: String,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

impl VersionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite. An existing name keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, value: i64) {
        let name = name.into();
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.value = value,
            None => self.entries.push(VersionEntry { name, value }),
        }
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VersionEntry> {
        self.entries.iter()
    }

    /// Parse the client's list-mode output.
    ///
    /// Only lines that split into exactly two fields are used; everything
    /// else is skipped. There is no header detection: a two-field header row
    /// fails to parse like any other non-integer value.
    pub fn parse(output: &str) -> Result<Self, VersionParseError> {
        let mut table = Self::new();
        for (index, line) in output.split('\n').enumerate() {
            let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
            let [name, raw_value] = fields.as_slice() else {
                continue;
            };
            let value = raw_value
                .trim()
                .parse::<i64>()
                .map_err(|source| VersionParseError::NotAnInteger {
                    line: index + 1,
                    name: name.to_string(),
                    value: raw_value.to_string(),
                    source,
                })?;
            table.insert(*name, value);
        }
        Ok(table)
    }
}

impl<'a> IntoIterator for &'a VersionTable {
    type Item = &'a VersionEntry;
    type IntoIter = std::slice::Iter<'a, VersionEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
