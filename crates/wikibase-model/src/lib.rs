//! Wikibase data model: entities, statements, terms and structural diffs.
//!
//! This crate provides the in-memory model of a collaborative knowledge
//! base together with its array (JSON) form, content hashing, and the diff
//! engine used for edit conflicts, undo and change propagation.
//!
//! # Overview
//!
//! - **Entities**: items and properties, each with a multilingual
//!   fingerprint (labels, descriptions, aliases) and a list of statements.
//!   Items additionally carry site links.
//! - **Statements**: a main snak, qualifiers, a rank and references,
//!   identified by a GUID once attached to an entity. Content hashes never
//!   include the GUID.
//! - **Diffs**: per-section add/remove/change operations between two
//!   snapshots, which can be applied, reversed and merged three-way.
//!
//! # Quick Start
//!
//! ```rust
//! use wikibase_model::{
//!     ArrayCodec, ClaimGuidGenerator, DataValue, EntityDiff, GuidGenerator, Item, ItemId,
//!     PropertyId, SiteLink, Snak, Statement,
//! };
//!
//! let q64 = ItemId::new(64).unwrap();
//! let mut berlin = Item::with_id(q64);
//! berlin.fingerprint_mut().set_label("en", "Berlin").unwrap();
//!
//! let mut statement = Statement::new(Snak::value(
//!     PropertyId::new(1082).unwrap(),
//!     DataValue::quantity("+3664088"),
//! ));
//! statement.set_guid(ClaimGuidGenerator::new().new_guid(q64.into()));
//! berlin.add_claim(statement).unwrap();
//!
//! // Edit a copy and diff it against the original
//! let mut edited = berlin.copy();
//! edited.add_site_link(SiteLink::new("enwiki", "Berlin").unwrap()).unwrap();
//! let diff = EntityDiff::between_items(&berlin, &edited);
//! assert_eq!(diff.op_count(), 1);
//!
//! // Apply it to another copy of the original
//! let mut patched = berlin.copy();
//! diff.apply_to_item(&mut patched).unwrap();
//! assert_eq!(patched, edited);
//!
//! // The array form round-trips
//! let array = edited.to_array();
//! assert_eq!(Item::from_array(&array).unwrap(), edited);
//! ```
//!
//! # Modules
//!
//! - [`model`]: Core data types (ids, values, snaks, statements, terms, entities)
//! - [`codec`]: Array format, content hashing and the binary change envelope
//! - [`diff`]: Entity diffs, patching, reversal and three-way merge
//! - [`guid`]: Statement GUID parsing, generation and validation
//! - [`change`]: Change notifications and their transmitter
//! - [`store`]: Entity storage and access limits
//! - [`term_index`]: Term lookup and uniqueness checks
//! - [`validate`]: Schema validation
//! - [`error`]: Error types
//! - [`limits`]: Size limits and format constants
//!
//! # Change Envelope
//!
//! Changes travel in a small binary frame with optional zstd compression:
//! - Uncompressed: `WBCH` magic + version + length-prefixed JSON
//! - Compressed: `WBCHZ` magic + uncompressed size + zstd data
//!
//! The decoder automatically detects and handles both formats.

pub mod change;
pub mod codec;
pub mod diff;
pub mod error;
pub mod guid;
pub mod limits;
pub mod model;
pub mod store;
pub mod term_index;
pub mod validate;

// Re-export commonly used types at crate root
pub use change::{Change, ChangeAction, ChangeTransmitter, RecordingChangeTransmitter};
pub use codec::{decode_change, encode_change, encode_change_compressed, ArrayCodec, ChangeEncodeOptions};
pub use diff::{merge_diffs, resolve_edit_conflict, DiffOp, EntityDiff, MapDiff, StatementDiffer};
pub use error::{
    DecodeError, EncodeError, MergeConflict, MergeError, ModelError, StoreError, ValidationError,
};
pub use guid::{ClaimGuidGenerator, GuidGenerator, StatementGuid, StatementGuidValidator};
pub use model::{
    AliasGroupList, Claim, DataValue, DataValueType, Entity, EntityDocument, EntityId, EntityType,
    Fingerprint, Item, ItemBuilder, ItemId, Property, PropertyBuilder, PropertyId, Rank, Reference,
    ReferenceList, SiteLink, SiteLinkList, Snak, SnakList, SnakType, Statement, StatementBuilder,
    StatementList, Term, TermList,
};
pub use store::{EntityStore, InMemoryEntityStore, Revision};
pub use term_index::{InMemoryTermIndex, TermEntry, TermIndex, TermType};
pub use validate::{validate_entity, SchemaContext};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
