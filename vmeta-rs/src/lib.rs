//! Vehicle meta identifier conflict resolution.
//!
//! Vehicle customization data ships as a pair of cross-referencing meta
//! files: a customization catalog (`carcols.meta`) and a variation catalog
//! (`carvariations.meta`). When several of these pairs are merged into one
//! environment their numeric identifiers collide. This library renumbers
//! them while keeping both files consistent with each other.
//!
//! # Overview
//!
//! - [`xml::Document`] loads a meta file into a mutable tree that keeps
//!   comments and sibling order, and writes it back with stable formatting.
//! - [`IdAllocator`] hands out random identifiers that collide with nothing
//!   already in use.
//! - [`ConflictResolver`] finds identifiers in both files, reallocates them,
//!   and mirrors each change into the counterpart file, optionally scoped to
//!   one vehicle.
//!
//! # Example
//!
//! ```no_run
//! use vehicle_meta::{ConflictResolver, ResolverConfig};
//!
//! let config = ResolverConfig::default();
//! let mut resolver = ConflictResolver::open("carcols.meta", "carvariations.meta", &config)?;
//! let changes = resolver.resolve_kit_conflicts(Some("valor"))?;
//! print!("{}", changes);
//! # Ok::<(), vehicle_meta::Error>(())
//! ```

pub mod backup;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod inspect;
pub mod node;
pub mod resolve;
pub mod xml;

// Re-export commonly used types
pub use backup::create_backup;
pub use config::{PersistPolicy, ResolverConfig};
pub use error::{Error, Result};
pub use ids::{IdAllocator, IdRange};
pub use inspect::Inventory;
pub use node::{NodeInner, NodeRef, XmlComment, XmlContent, XmlElement, XmlText};
pub use resolve::{
    belongs_to_entity, existing_ids, extract_entity_name, Change, ChangeSet, ConflictResolver,
    MetaFile,
};
pub use xml::{Document, DocumentKind};
