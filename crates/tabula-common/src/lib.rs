//! # tabula-common
//!
//! Common types, errors, and configuration for tabula.
//!
//! This crate provides the foundational types shared by the schema binder
//! and the row resolver. It includes:
//!
//! - **Types**: Identifier newtypes (`LogicalTableId`, `PhysicalId`, `RowId`)
//!   and the request-scoped `RequestContext`
//! - **Errors**: Unified error handling with `TabulaError`, plus the errors
//!   reported by the catalog and persistence-engine collaborators
//! - **Config**: Binder configuration loaded from TOML
//! - **Constants**: Identifier limits and defaults
//!
//! ## Example
//!
//! ```rust
//! use tabula_common::types::{LogicalTableId, RequestContext, RowId};
//! use tabula_common::error::TabulaResult;
//!
//! fn example() -> TabulaResult<()> {
//!     let table = LogicalTableId::new("household_survey");
//!     let row = RowId::new("uuid:5d1c1a0e");
//!     let ctx = RequestContext::new().with_identity("mailto:admin@example.org");
//!     assert_eq!(table.as_str(), "household_survey");
//!     assert_eq!(row.as_str(), "uuid:5d1c1a0e");
//!     assert!(!ctx.is_cancelled());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

// Re-export commonly used items at the crate root
pub use config::BinderConfig;
pub use constants::*;
pub use error::{CatalogError, EngineError, ErrorCode, TabulaError, TabulaResult};
pub use types::{CancellationFlag, LogicalTableId, PhysicalId, RequestContext, RowId};
