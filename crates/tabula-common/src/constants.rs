//! System-wide constants for tabula.
//!
//! This module defines identifier limits and configuration defaults.

// =============================================================================
// Identifier Constants
// =============================================================================

/// Default namespace prefix applied to every physical relation name.
///
/// Keeps user tables out of the namespace of the store's own relations.
pub const DEFAULT_NAMESPACE_PREFIX: &str = "UT_";

/// Default maximum length of a physical identifier, in bytes.
///
/// Matches the identifier limit of common relational stores (63 bytes).
pub const DEFAULT_MAX_IDENTIFIER_LENGTH: usize = 63;

/// Name of the identity column the persistence engine keys rows by.
///
/// Engine-owned; never part of a physical schema descriptor.
pub const ROW_ID_COLUMN: &str = "_ID";

// =============================================================================
// Locking Constants
// =============================================================================

/// Default time to wait for the per-table schema lock (30 seconds).
pub const DEFAULT_SCHEMA_LOCK_TIMEOUT_MS: u64 = 30_000;
