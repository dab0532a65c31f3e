//! Data model types.
//!
//! This module contains the core types of the knowledge base:
//! - Identifiers (`Q42`, `P7`)
//! - Data values and snaks
//! - Claims, statements and their references
//! - Fingerprints (labels, descriptions, aliases)
//! - Entities (items, properties) and builders

pub mod builder;
pub mod entity;
pub mod id;
pub mod reference;
pub mod sitelink;
pub mod snak;
pub mod statement;
pub mod statement_list;
pub mod term;
pub mod value;

pub use builder::{ItemBuilder, PropertyBuilder, StatementBuilder};
pub use entity::{Entity, EntityDocument, Item, Property};
pub use id::{EntityId, EntityType, ItemId, PropertyId};
pub use reference::{Reference, ReferenceList};
pub use sitelink::{SiteLink, SiteLinkList};
pub use snak::{Snak, SnakList, SnakType};
pub use statement::{AnyClaim, Claim, Rank, Statement};
pub use statement_list::StatementList;
pub use term::{AliasGroupList, Fingerprint, LanguageFallbackChain, Term, TermList};
pub use value::{DataValue, DataValueType};
