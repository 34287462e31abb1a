//! Attribute wrapping.
//!
//! This module provides the wrap specification tree, the pure transformer
//! that interprets it, and the YAML configuration layer.

pub mod config;
pub mod spec;
pub mod transform;

// Re-export key types
pub use config::{load_mappers_from_dir, Bindings, MapperConfig, PrefixConfig, SourceConfig, WrapConfig};
pub use spec::{
    DelegateMapper, MapperDef, MapperDefBuilder, ModelBuilder, NamedModel, SourceAttr, SpecError,
    WrapSpec, WrapSpecBuilder,
};
pub use transform::{apply_wraps, WrapError};
