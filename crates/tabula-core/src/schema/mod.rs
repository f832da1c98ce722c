//! Schema descriptors.
//!
//! - [`ColumnDescriptor`]: one column's name, kind, nullability and index
//! - [`FixedSchemaSet`]: the bookkeeping columns every table carries
//! - [`PhysicalSchema`]: a table's full, bound column list

mod column;
pub mod fixed;
mod physical;

pub use column::{ColumnDescriptor, DataKind, IndexKind};
pub use fixed::{static_columns, FixedSchemaSet};
pub use physical::PhysicalSchema;
