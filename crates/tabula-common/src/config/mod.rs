//! Configuration for tabula.
//!
//! This module provides the configuration used to build a schema binder.

mod binder;

pub use binder::{BinderConfig, BinderConfigBuilder};
