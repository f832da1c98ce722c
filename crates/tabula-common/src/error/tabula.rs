//! Binder and resolver error types.
//!
//! Errors fall into four groups: caller misuse (never retried, raised before
//! any external call), infrastructure failures (surfaced for the caller's
//! retry decision), permanent definition problems (need administrative
//! correction), and row misses (a business outcome, not a failure of the
//! infrastructure).

use std::fmt;
use thiserror::Error;

use super::collaborator::{CatalogError, EngineError};

/// Error codes for categorizing errors.
///
/// These codes can be used for programmatic error handling and
/// are stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // General errors (0x0000 - 0x00FF)
    /// Invalid argument provided.
    InvalidArgument = 0x0001,
    /// Invalid configuration.
    InvalidConfig = 0x0002,

    // Identifier errors (0x0100 - 0x01FF)
    /// Identifier is empty, too long or contains illegal characters.
    InvalidIdentifier = 0x0100,

    // Catalog errors (0x0200 - 0x02FF)
    /// Catalog could not be reached or has no entry for the table.
    CatalogUnavailable = 0x0200,

    // Schema errors (0x0300 - 0x03FF)
    /// Column names collide.
    SchemaConflict = 0x0300,
    /// The engine rejected the relation definition.
    SchemaBind = 0x0301,
    /// Timed out waiting for the per-table schema lock.
    SchemaLockTimeout = 0x0302,

    // Row errors (0x0400 - 0x04FF)
    /// A requested row does not exist.
    RowNotFound = 0x0400,

    // Engine errors (0x0500 - 0x05FF)
    /// The engine failed while reading rows.
    EngineFailure = 0x0500,
    /// The engine returned data that breaks its own guarantees.
    EngineInvariant = 0x0501,
}

impl ErrorCode {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match (*self as u16) >> 8 {
            0x00 => "General",
            0x01 => "Identifier",
            0x02 => "Catalog",
            0x03 => "Schema",
            0x04 => "Row",
            0x05 => "Engine",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The main error type for tabula.
///
/// Every variant carries enough context (table id, physical id, row id,
/// underlying cause) to diagnose the failure without re-querying.
///
/// # Example
///
/// ```rust
/// use tabula_common::error::{ErrorCode, TabulaError, TabulaResult};
///
/// fn require_rows(ids: &[&str]) -> TabulaResult<()> {
///     if ids.is_empty() {
///         return Err(TabulaError::invalid_argument("no row ids requested"));
///     }
///     Ok(())
/// }
///
/// let err = require_rows(&[]).unwrap_err();
/// assert_eq!(err.code(), ErrorCode::InvalidArgument);
/// assert!(err.is_caller_error());
/// ```
#[derive(Debug, Error)]
pub enum TabulaError {
    // ==========================================================================
    // Caller Errors
    // ==========================================================================
    /// Identifier is empty or cannot be represented in the store.
    #[error("invalid identifier '{id}': {reason}")]
    InvalidIdentifier {
        /// The offending identifier.
        id: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Invalid argument provided.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Error message.
        message: String,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Error message.
        message: String,
    },

    // ==========================================================================
    // Catalog Errors
    // ==========================================================================
    /// The column catalog failed.
    #[error("column catalog unavailable for table '{table_id}'")]
    CatalogUnavailable {
        /// Logical table id.
        table_id: String,
        /// The catalog's error.
        #[source]
        source: CatalogError,
    },

    // ==========================================================================
    // Schema Errors
    // ==========================================================================
    /// Two columns of the table share a name, or the catalog holds a column
    /// name that cannot be stored.
    #[error("schema conflict in table '{table_id}' on column '{column}': {reason}")]
    SchemaConflict {
        /// Logical table id.
        table_id: String,
        /// The offending column name.
        column: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Timed out waiting for another binder of the same table.
    #[error("timed out after {waited_ms}ms waiting for schema lock on '{physical_id}'")]
    SchemaLockTimeout {
        /// Physical relation name.
        physical_id: String,
        /// How long the binder waited.
        waited_ms: u64,
    },

    /// The engine could not create or open the relation.
    #[error("failed to bind table '{table_id}' to relation '{physical_id}'")]
    SchemaBind {
        /// Logical table id.
        table_id: String,
        /// Physical relation name.
        physical_id: String,
        /// The engine's error.
        #[source]
        source: EngineError,
    },

    // ==========================================================================
    // Row Errors
    // ==========================================================================
    /// At least one requested row does not exist.
    #[error("row '{row_id}' not found in table '{table_id}' ({missing} of the requested rows missing)")]
    RowNotFound {
        /// Logical table id.
        table_id: String,
        /// The first missing row id.
        row_id: String,
        /// How many requested rows are missing.
        missing: usize,
    },

    // ==========================================================================
    // Engine Errors
    // ==========================================================================
    /// The engine failed while reading.
    #[error("engine failure on relation '{physical_id}'")]
    Engine {
        /// Physical relation name.
        physical_id: String,
        /// The engine's error.
        #[source]
        source: EngineError,
    },

    /// The engine returned data that violates its own guarantees.
    #[error("engine invariant violated on relation '{physical_id}': {message}")]
    EngineInvariant {
        /// Physical relation name.
        physical_id: String,
        /// Description of the violation.
        message: String,
    },
}

impl TabulaError {
    /// Returns the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidIdentifier { .. } => ErrorCode::InvalidIdentifier,
            Self::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            Self::InvalidConfig { .. } => ErrorCode::InvalidConfig,
            Self::CatalogUnavailable { .. } => ErrorCode::CatalogUnavailable,
            Self::SchemaConflict { .. } => ErrorCode::SchemaConflict,
            Self::SchemaLockTimeout { .. } => ErrorCode::SchemaLockTimeout,
            Self::SchemaBind { .. } => ErrorCode::SchemaBind,
            Self::RowNotFound { .. } => ErrorCode::RowNotFound,
            Self::Engine { .. } => ErrorCode::EngineFailure,
            Self::EngineInvariant { .. } => ErrorCode::EngineInvariant,
        }
    }

    /// Returns true if this error is retryable.
    ///
    /// Only infrastructure failures qualify; nothing in this crate retries
    /// on its own.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::CatalogUnavailable { source, .. } => source.is_transient(),
            Self::SchemaBind { source, .. } | Self::Engine { source, .. } => {
                source.is_transient()
            }
            Self::SchemaLockTimeout { .. } => true,
            _ => false,
        }
    }

    /// Returns true if the caller supplied bad input.
    #[must_use]
    pub const fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentifier { .. }
                | Self::InvalidArgument { .. }
                | Self::InvalidConfig { .. }
        )
    }

    /// Returns true if the error needs administrative correction.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::SchemaConflict { .. } | Self::EngineInvariant { .. }
        )
    }

    /// Returns true if the error is a row miss.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::RowNotFound { .. })
    }

    /// Creates an invalid identifier error.
    #[must_use]
    pub fn invalid_identifier(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates an engine invariant error.
    #[must_use]
    pub fn engine_invariant(physical_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EngineInvariant {
            physical_id: physical_id.into(),
            message: message.into(),
        }
    }
}
