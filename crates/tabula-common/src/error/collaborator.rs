//! Errors reported by external collaborators.
//!
//! The column catalog and the persistence engine report failures with these
//! types. `TabulaError` wraps them as a `#[source]` so the original cause is
//! never lost.

use thiserror::Error;

/// Error reported by a column-metadata catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog has no definitions for the table.
    #[error("no column definitions registered for table '{table}'")]
    NotFound {
        /// The logical table id that was looked up.
        table: String,
    },

    /// The table already has definitions.
    #[error("column definitions for table '{table}' already exist")]
    AlreadyDefined {
        /// The logical table id.
        table: String,
    },

    /// The catalog could not be reached.
    #[error("catalog unavailable: {reason}")]
    Unavailable {
        /// Why the catalog could not serve the request.
        reason: String,
    },

    /// The request was cancelled or its deadline passed.
    #[error("catalog request cancelled")]
    Cancelled,
}

/// Error reported by the persistence engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The store could not be reached.
    #[error("store unavailable: {reason}")]
    Unavailable {
        /// Why the store could not serve the request.
        reason: String,
    },

    /// A requested column definition conflicts with the existing relation.
    #[error("conflicting definition for column '{column}' in relation '{relation}': {reason}")]
    DefinitionConflict {
        /// Physical relation name.
        relation: String,
        /// Offending column.
        column: String,
        /// Description of the conflict.
        reason: String,
    },

    /// The relation does not exist.
    #[error("relation '{relation}' does not exist")]
    UnknownRelation {
        /// Physical relation name.
        relation: String,
    },

    /// A record does not fit the relation's columns.
    #[error("invalid record '{row_id}' for relation '{relation}': {reason}")]
    InvalidRecord {
        /// Physical relation name.
        relation: String,
        /// Row id of the record.
        row_id: String,
        /// Why the record was rejected.
        reason: String,
    },

    /// The request was cancelled.
    #[error("engine request cancelled")]
    Cancelled,

    /// The request deadline passed before the engine could answer.
    #[error("engine request deadline exceeded")]
    DeadlineExceeded,
}

impl CatalogError {
    /// Returns true if retrying the request may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

impl EngineError {
    /// Returns true if retrying the request may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::DeadlineExceeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_error_display() {
        let err = CatalogError::NotFound {
            table: "census".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no column definitions registered for table 'census'"
        );
        assert!(!err.is_transient());
        assert!(CatalogError::Unavailable {
            reason: "down".to_string()
        }
        .is_transient());
    }

    #[test]
    fn test_engine_error_transient() {
        assert!(EngineError::DeadlineExceeded.is_transient());
        assert!(!EngineError::Cancelled.is_transient());
        assert!(!EngineError::UnknownRelation {
            relation: "UT_X".to_string()
        }
        .is_transient());
    }
}
