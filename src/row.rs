//! Row and column abstractions a host provides to a filter.

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Row is a read-only, name-keyed view of one record.
pub trait Row {
    /// Get the text value of a field.
    ///
    /// Returns `None` when the field is absent or its value is not text.
    fn field(&self, name: &str) -> Option<&str>;
}

impl<S: BuildHasher> Row for HashMap<String, String, S> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl Row for BTreeMap<String, String> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// JSON objects expose only their string members as text.
impl Row for serde_json::Map<String, Value> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }
}

/// ColumnContext tells a filter which field of a row to read.
pub trait ColumnContext {
    /// Name of the active column, if there is one.
    fn active_column(&self) -> Option<&str>;
}

impl ColumnContext for str {
    fn active_column(&self) -> Option<&str> {
        Some(self)
    }
}

impl ColumnContext for String {
    fn active_column(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl<T: ColumnContext + ?Sized> ColumnContext for &T {
    fn active_column(&self) -> Option<&str> {
        (**self).active_column()
    }
}

impl<T: ColumnContext> ColumnContext for Option<T> {
    fn active_column(&self) -> Option<&str> {
        self.as_ref().and_then(ColumnContext::active_column)
    }
}

/// Cursor models a host's column cursor, which may rest on no column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor {
    column: Option<String>,
}

impl Cursor {
    /// Create a cursor on the named column.
    pub fn at(column: impl Into<String>) -> Self {
        Self {
            column: Some(column.into()),
        }
    }

    /// Move the cursor to another column.
    pub fn move_to(&mut self, column: impl Into<String>) {
        self.column = Some(column.into());
    }

    /// Leave the cursor without an active column.
    pub fn clear(&mut self) {
        self.column = None;
    }
}

impl ColumnContext for Cursor {
    fn active_column(&self) -> Option<&str> {
        self.column.as_deref()
    }
}
