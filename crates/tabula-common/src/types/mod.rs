//! Type definitions for tabula.
//!
//! This module contains the identifier types and the request context that
//! are threaded through every binder and resolver call.

mod context;
mod ids;

pub use context::{CancellationFlag, RequestContext};
pub use ids::{LogicalTableId, PhysicalId, RowId};
