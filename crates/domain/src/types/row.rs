//! Decoded result rows

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// A decoded cell.
///
/// `TIMESTAMP` columns decode to [`Cell::Timestamp`]; every other column
/// keeps the JSON value exactly as the service sent it.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Timestamp(DateTime<Utc>),
    Value(serde_json::Value),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Value(serde_json::Value::String(s)) => Some(s),
            _ => None,
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Timestamp(ts) => ts.serialize(serializer),
            Self::Value(value) => value.serialize(serializer),
        }
    }
}

/// Column name -> cell, in schema order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Cell)>,
}

impl Row {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { columns: Vec::with_capacity(capacity) }
    }

    pub fn push(&mut self, name: impl Into<String>, cell: Cell) {
        self.columns.push((name.into(), cell));
    }

    pub fn get(&self, name: &str) -> Option<&Cell> {
        self.columns.iter().find(|(column, _)| column == name).map(|(_, cell)| cell)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.columns.iter().map(|(name, cell)| (name.as_str(), cell))
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, cell) in &self.columns {
            map.serialize_entry(name, cell)?;
        }
        map.end()
    }
}
