//! Column descriptors.
//!
//! A `ColumnDescriptor` describes one physical column: its name, the kind of
//! data it holds, whether it accepts NULL, and the index the store should
//! build for it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Kind of data stored in a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataKind {
    /// UTF-8 text.
    String,
    /// Boolean.
    Boolean,
    /// Instant in time (UTC).
    DateTime,
    /// 64-bit signed integer.
    Integer,
    /// Floating-point number.
    Decimal,
    /// Opaque bytes.
    Binary,
}

impl DataKind {
    /// Converts a catalog element type into a data kind.
    ///
    /// Matching is case-insensitive. Returns `None` for element types with
    /// no dedicated kind; callers store those as strings.
    #[must_use]
    pub fn from_element_type(element_type: &str) -> Option<Self> {
        match element_type.to_ascii_lowercase().as_str() {
            "string" | "text" | "choice" => Some(Self::String),
            "integer" | "int" => Some(Self::Integer),
            "number" | "decimal" => Some(Self::Decimal),
            "boolean" | "bool" => Some(Self::Boolean),
            "date" | "datetime" | "time" => Some(Self::DateTime),
            "binary" => Some(Self::Binary),
            _ => None,
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataKind::String => write!(f, "STRING"),
            DataKind::Boolean => write!(f, "BOOLEAN"),
            DataKind::DateTime => write!(f, "DATETIME"),
            DataKind::Integer => write!(f, "INTEGER"),
            DataKind::Decimal => write!(f, "DECIMAL"),
            DataKind::Binary => write!(f, "BINARY"),
        }
    }
}

/// Index the store should maintain for a column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexKind {
    /// No index.
    #[default]
    None,
    /// Equality lookups.
    Hash,
    /// Range scans.
    Ordered,
}

impl IndexKind {
    /// Returns true if an index is requested.
    pub fn is_indexed(&self) -> bool {
        !matches!(self, IndexKind::None)
    }
}

/// A column in a physical schema (name + kind + nullability + index).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Physical column name.
    pub name: String,
    /// Data kind.
    pub kind: DataKind,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Requested index.
    pub index: IndexKind,
}

impl ColumnDescriptor {
    /// Creates a new, unindexed column.
    pub fn new(name: impl Into<String>, kind: DataKind, nullable: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable,
            index: IndexKind::None,
        }
    }

    /// Creates a new nullable column.
    pub fn nullable(name: impl Into<String>, kind: DataKind) -> Self {
        Self::new(name, kind, true)
    }

    /// Creates a new non-nullable column.
    pub fn not_null(name: impl Into<String>, kind: DataKind) -> Self {
        Self::new(name, kind, false)
    }

    /// Sets the requested index.
    pub fn with_index(mut self, index: IndexKind) -> Self {
        self.index = index;
        self
    }

    /// Returns the column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if `value` may be stored in this column.
    pub fn accepts(&self, value: &Value) -> bool {
        match value.kind() {
            None => self.nullable,
            Some(kind) => kind == self.kind,
        }
    }
}

impl fmt::Display for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}{}",
            self.name,
            self.kind,
            if self.nullable { "" } else { " NOT NULL" }
        )?;
        match self.index {
            IndexKind::None => Ok(()),
            IndexKind::Hash => write!(f, " HASH INDEX"),
            IndexKind::Ordered => write!(f, " ORDERED INDEX"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_type_mapping() {
        assert_eq!(DataKind::from_element_type("integer"), Some(DataKind::Integer));
        assert_eq!(DataKind::from_element_type("Number"), Some(DataKind::Decimal));
        assert_eq!(DataKind::from_element_type("dateTime"), Some(DataKind::DateTime));
        assert_eq!(DataKind::from_element_type("BOOLEAN"), Some(DataKind::Boolean));
        assert_eq!(DataKind::from_element_type("geopoint"), None);
    }

    #[test]
    fn test_accepts() {
        let nullable = ColumnDescriptor::nullable("NAME", DataKind::String);
        assert!(nullable.accepts(&Value::Null));
        assert!(nullable.accepts(&Value::string("x")));
        assert!(!nullable.accepts(&Value::Integer(1)));

        let required = ColumnDescriptor::not_null("DELETED", DataKind::Boolean);
        assert!(!required.accepts(&Value::Null));
        assert!(required.accepts(&Value::Boolean(false)));
    }

    #[test]
    fn test_display() {
        let col = ColumnDescriptor::nullable("FILTER_VALUE", DataKind::String)
            .with_index(IndexKind::Hash);
        assert_eq!(col.to_string(), "FILTER_VALUE: STRING HASH INDEX");

        let col = ColumnDescriptor::not_null("ROW_VERSION", DataKind::String);
        assert_eq!(col.to_string(), "ROW_VERSION: STRING NOT NULL");
    }
}
