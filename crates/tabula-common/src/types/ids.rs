//! Core identifier types for tabula.
//!
//! These types provide type-safe wrappers around string identifiers,
//! preventing a logical table id from being passed where a physical
//! relation name or a row id is expected.
//!
//! Construction is unchecked. Validation belongs to the identifier
//! normalizer (for table ids) and the row resolver (for row ids).

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Logical table identifier - the opaque id chosen by a table's owner.
///
/// Logical ids are unique across the system and immutable once assigned.
/// They may contain any characters; the physical store never sees them
/// directly.
///
/// # Example
///
/// ```rust
/// use tabula_common::types::LogicalTableId;
///
/// let table = LogicalTableId::new("household_survey");
/// assert_eq!(table.as_str(), "household_survey");
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogicalTableId(String);

impl LogicalTableId {
    /// Creates a new `LogicalTableId`.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the id is the empty string.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for LogicalTableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogicalTableId({:?})", self.0)
    }
}

impl fmt::Display for LogicalTableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LogicalTableId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for LogicalTableId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Physical relation identifier - the store-safe name of a relation.
///
/// Produced by normalizing a [`LogicalTableId`]. Also serves as the key of
/// the per-table schema lock.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhysicalId(String);

impl PhysicalId {
    /// Creates a new `PhysicalId`.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the length of the id in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the id is the empty string.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for PhysicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysicalId({})", self.0)
    }
}

impl fmt::Display for PhysicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Row identifier - unique within one table.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(String);

impl RowId {
    /// Creates a new `RowId`.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the id is the empty string.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RowId({:?})", self.0)
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RowId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RowId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RowId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_logical_table_id() {
        let table = LogicalTableId::new("census");
        assert_eq!(table.as_str(), "census");
        assert!(!table.is_empty());
        assert!(LogicalTableId::new("").is_empty());
        assert_eq!(table.to_string(), "census");
        assert_eq!(format!("{:?}", table), "LogicalTableId(\"census\")");
    }

    #[test]
    fn test_physical_id() {
        let id = PhysicalId::new("UT_CENSUS");
        assert_eq!(id.len(), 9);
        assert_eq!(id.to_string(), "UT_CENSUS");
    }

    #[test]
    fn test_row_id_borrow() {
        let mut ids = HashSet::new();
        ids.insert(RowId::new("r1"));
        assert!(ids.contains("r1"));
        assert!(!ids.contains("r2"));
    }

    #[test]
    fn test_row_id_ordering() {
        let mut ids = vec![RowId::from("b"), RowId::from("a"), RowId::from("c")];
        ids.sort();
        assert_eq!(ids, vec![RowId::from("a"), RowId::from("b"), RowId::from("c")]);
    }

    #[test]
    fn test_serde_transparent() {
        let row = RowId::new("uuid:1");
        let encoded = toml::to_string(&std::collections::BTreeMap::from([("id", row.clone())]))
            .unwrap();
        assert_eq!(encoded.trim(), "id = \"uuid:1\"");
    }
}
