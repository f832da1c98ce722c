//! Error handling for tabula.
//!
//! This module provides the unified error type returned by the binder and
//! the resolver, and the error types reported by their collaborators.

mod collaborator;
mod tabula;

pub use collaborator::{CatalogError, EngineError};
pub use tabula::{ErrorCode, TabulaError};

/// Result type alias for tabula operations.
pub type TabulaResult<T> = std::result::Result<T, TabulaError>;
