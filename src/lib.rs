//! # Rewrap: Record Attribute Wrapping and Nesting
//!
//! Rewrap reshapes flat records: it extracts a subset of a record's
//! attributes and nests them under a single key, as a sub-record or as a
//! constructed model instance, with optional renaming, prefix stripping,
//! delegation to an external mapper, and recursive nesting.
//!
//! ## Features
//!
//! - **Ordered records**: insertion-order-preserving attribute maps for
//!   deterministic output
//! - **Wrap specifications**: built once via a builder, applied fresh on
//!   every record, safely shared across threads
//! - **Prefix stripping**: derive nested attribute names by removing a
//!   leading prefix and separator from source keys
//! - **Delegate mappers and model builders**: plug in external
//!   transformations and constructed-object factories at any nesting depth
//! - **YAML definitions**: express mapper definitions as data and bind
//!   named delegates/models at load time
//!
//! ## Example: builder API
//!
//! ```
//! use rewrap::{MapperDef, Record, WrapSpec};
//!
//! let mapper = MapperDef::builder()
//!     .wrap(
//!         WrapSpec::builder("contacts")
//!             .prefix("contact")
//!             .attr("email")
//!             .attr("skype")
//!             .build(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let mut record = Record::new();
//! record.insert("id", 1);
//! record.insert("contact_email", "a@b.com");
//! record.insert("contact_skype", "joe");
//!
//! let output = mapper.apply(&record).unwrap();
//!
//! let contacts = output.get("contacts").unwrap().as_record().unwrap();
//! assert_eq!(contacts.get("email").and_then(|v| v.as_str()), Some("a@b.com"));
//! assert!(!output.contains("contact_email"));
//! ```
//!
//! ## Example: YAML definition
//!
//! ```yaml
//! mapper:
//!   attributes: [id, name]
//!   wraps:
//!     - target: contacts
//!       prefix: contact
//!       sources:
//!         - email
//!         - name: main_skype
//!           from: skype_handle
//!       model: Contact
//! ```

// Core modules
pub mod record;
pub mod value;

// Wrap specification tree, transformer, and configuration layer
pub mod wrap;

// Re-export key types
pub use record::Record;
pub use value::{ModelInstance, Value};

// Re-export wrap types
pub use wrap::{
    apply_wraps, load_mappers_from_dir, Bindings, DelegateMapper, MapperConfig, MapperDef,
    MapperDefBuilder, ModelBuilder, NamedModel, PrefixConfig, SourceAttr, SourceConfig, SpecError,
    WrapConfig, WrapError, WrapSpec, WrapSpecBuilder,
};
