//! Builder API for ergonomic entity construction.
//!
//! Provides a fluent interface for building items, properties and their
//! statements.
//!
//! # Example
//!
//! ```rust
//! use wikibase_model::model::{DataValue, ItemBuilder, ItemId, PropertyId, Rank, Snak};
//!
//! let p31 = PropertyId::new(31).unwrap();
//! let item = ItemBuilder::new()
//!     .id(ItemId::new(64).unwrap())
//!     .label("en", "Berlin")
//!     .description("en", "capital of Germany")
//!     .alias("en", "Spree-Athen")
//!     .site_link("enwiki", "Berlin")
//!     .statement(Snak::value(p31, DataValue::string("city")), |s| s
//!         .guid("Q64$0F2D9C6B-6E58-4C2A-9E35-0F6E0A9A1E11")
//!         .rank(Rank::Preferred)
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(item.claims().len(), 1);
//! ```
//!
//! Fallible inputs (term lengths, duplicate site links, GUID ownership) are
//! checked by `build()`, which reports the first failure.

use crate::error::ModelError;
use crate::model::{
    Fingerprint, Item, ItemId, Property, PropertyId, Rank, Reference, ReferenceList, SiteLink,
    Snak, SnakList, Statement,
};

/// Builder for a single statement.
#[derive(Debug, Clone)]
pub struct StatementBuilder {
    main_snak: Snak,
    qualifiers: SnakList,
    references: ReferenceList,
    rank: Rank,
    guid: Option<String>,
}

impl StatementBuilder {
    /// Creates a normal-rank builder for the given main snak.
    pub fn new(main_snak: Snak) -> Self {
        Self {
            main_snak,
            qualifiers: SnakList::new(),
            references: ReferenceList::new(),
            rank: Rank::Normal,
            guid: None,
        }
    }

    /// Adds a qualifier. Duplicates are dropped.
    pub fn qualifier(mut self, snak: Snak) -> Self {
        self.qualifiers.add_snak(snak);
        self
    }

    /// Adds a reference made of the given snaks.
    pub fn reference(mut self, snaks: impl IntoIterator<Item = Snak>) -> Self {
        self.references.add_reference(snaks.into_iter().collect::<Reference>());
        self
    }

    pub fn rank(mut self, rank: Rank) -> Self {
        self.rank = rank;
        self
    }

    pub fn guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = Some(guid.into());
        self
    }

    pub fn build(self) -> Statement {
        let mut statement = Statement::new(self.main_snak);
        statement.set_qualifiers(self.qualifiers);
        statement.set_references(self.references);
        statement.set_rank(self.rank);
        if let Some(guid) = self.guid {
            statement.set_guid(guid);
        }
        statement
    }
}

// =========================================================================
// Shared term/statement accumulation
// =========================================================================

#[derive(Debug, Clone, Default)]
struct Parts {
    labels: Vec<(String, String)>,
    descriptions: Vec<(String, String)>,
    aliases: Vec<(String, String)>,
    statements: Vec<Statement>,
}

impl Parts {
    fn fingerprint(&self) -> Result<Fingerprint, ModelError> {
        let mut fingerprint = Fingerprint::new();
        for (language, text) in &self.labels {
            fingerprint.set_label(language.as_str(), text.as_str())?;
        }
        for (language, text) in &self.descriptions {
            fingerprint.set_description(language.as_str(), text.as_str())?;
        }
        for (language, alias) in &self.aliases {
            fingerprint.alias_groups_mut().add(language, [alias.as_str()])?;
        }
        Ok(fingerprint)
    }
}

/// Builder for an [`Item`].
#[derive(Debug, Clone, Default)]
pub struct ItemBuilder {
    id: Option<ItemId>,
    parts: Parts,
    site_links: Vec<SiteLinkSpec>,
}

#[derive(Debug, Clone)]
struct SiteLinkSpec {
    site_id: String,
    page_name: String,
    badges: Vec<ItemId>,
}

impl ItemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: ItemId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets a label; a later call for the same language wins.
    pub fn label(mut self, language: impl Into<String>, text: impl Into<String>) -> Self {
        self.parts.labels.push((language.into(), text.into()));
        self
    }

    pub fn description(mut self, language: impl Into<String>, text: impl Into<String>) -> Self {
        self.parts.descriptions.push((language.into(), text.into()));
        self
    }

    /// Appends an alias to a language.
    pub fn alias(mut self, language: impl Into<String>, alias: impl Into<String>) -> Self {
        self.parts.aliases.push((language.into(), alias.into()));
        self
    }

    pub fn site_link(self, site_id: impl Into<String>, page_name: impl Into<String>) -> Self {
        self.site_link_with_badges(site_id, page_name, [])
    }

    pub fn site_link_with_badges(
        mut self,
        site_id: impl Into<String>,
        page_name: impl Into<String>,
        badges: impl IntoIterator<Item = ItemId>,
    ) -> Self {
        self.site_links.push(SiteLinkSpec {
            site_id: site_id.into(),
            page_name: page_name.into(),
            badges: badges.into_iter().collect(),
        });
        self
    }

    /// Adds a statement using a builder function.
    pub fn statement<F>(mut self, main_snak: Snak, f: F) -> Self
    where
        F: FnOnce(StatementBuilder) -> StatementBuilder,
    {
        self.parts.statements.push(f(StatementBuilder::new(main_snak)).build());
        self
    }

    /// Adds a ready-made statement.
    pub fn push_statement(mut self, statement: Statement) -> Self {
        self.parts.statements.push(statement);
        self
    }

    /// Returns the number of statements added so far.
    pub fn statement_count(&self) -> usize {
        self.parts.statements.len()
    }

    pub fn build(self) -> Result<Item, ModelError> {
        let mut item = Item::new_empty();
        if let Some(id) = self.id {
            item.set_id(id)?;
        }
        item.set_fingerprint(self.parts.fingerprint()?);
        for statement in self.parts.statements {
            item.add_claim(statement)?;
        }
        for spec in self.site_links {
            item.add_site_link(SiteLink::with_badges(spec.site_id, spec.page_name, spec.badges)?)?;
        }
        Ok(item)
    }
}

/// Builder for a [`Property`].
#[derive(Debug, Clone)]
pub struct PropertyBuilder {
    id: Option<PropertyId>,
    data_type_id: String,
    parts: Parts,
}

impl PropertyBuilder {
    pub fn new(data_type_id: impl Into<String>) -> Self {
        Self {
            id: None,
            data_type_id: data_type_id.into(),
            parts: Parts::default(),
        }
    }

    pub fn id(mut self, id: PropertyId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn label(mut self, language: impl Into<String>, text: impl Into<String>) -> Self {
        self.parts.labels.push((language.into(), text.into()));
        self
    }

    pub fn description(mut self, language: impl Into<String>, text: impl Into<String>) -> Self {
        self.parts.descriptions.push((language.into(), text.into()));
        self
    }

    pub fn alias(mut self, language: impl Into<String>, alias: impl Into<String>) -> Self {
        self.parts.aliases.push((language.into(), alias.into()));
        self
    }

    pub fn statement<F>(mut self, main_snak: Snak, f: F) -> Self
    where
        F: FnOnce(StatementBuilder) -> StatementBuilder,
    {
        self.parts.statements.push(f(StatementBuilder::new(main_snak)).build());
        self
    }

    pub fn build(self) -> Result<Property, ModelError> {
        let mut property = Property::new_empty(self.data_type_id);
        if let Some(id) = self.id {
            property.set_id(id)?;
        }
        property.set_fingerprint(self.parts.fingerprint()?);
        for statement in self.parts.statements {
            property.add_claim(statement)?;
        }
        Ok(property)
    }
}
