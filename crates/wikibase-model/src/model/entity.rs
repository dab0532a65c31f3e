//! Entities: items and properties.
//!
//! Entities are aggregate roots holding an id, a fingerprint and
//! statements; items additionally hold site links. The id is absent until
//! the entity is first saved and cannot be changed once set.

use crate::error::ModelError;
use crate::guid::StatementGuid;
use crate::model::{
    EntityId, EntityType, Fingerprint, ItemId, PropertyId, SiteLink, SiteLinkList, Statement,
    StatementList,
};

/// Read API shared by all entity types.
pub trait EntityDocument {
    fn entity_id(&self) -> Option<EntityId>;
    fn entity_type(&self) -> EntityType;
    fn fingerprint(&self) -> &Fingerprint;
    fn statements(&self) -> &StatementList;
    fn is_empty(&self) -> bool;
}

/// Applies the write-once rule for entity ids.
fn assign_id<T: Copy + PartialEq + std::fmt::Display>(
    slot: &mut Option<T>,
    id: T,
) -> Result<(), ModelError> {
    match slot {
        Some(current) if *current != id => Err(ModelError::IdReassignment {
            current: current.to_string(),
            requested: id.to_string(),
        }),
        _ => {
            *slot = Some(id);
            Ok(())
        }
    }
}

/// Rejects a statement whose GUID names a different entity.
///
/// GUIDs that do not parse are left to [`crate::validate`].
fn check_statement_owner(id: Option<EntityId>, statement: &Statement) -> Result<(), ModelError> {
    let (Some(id), Some(guid)) = (id, statement.guid()) else {
        return Ok(());
    };
    match guid.parse::<StatementGuid>() {
        Ok(parsed) if parsed.entity_id() != id => Err(ModelError::GuidMismatch {
            guid: guid.to_string(),
            entity_id: id.to_string(),
        }),
        _ => Ok(()),
    }
}

/// An item: a thing the knowledge base describes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Item {
    id: Option<ItemId>,
    fingerprint: Fingerprint,
    statements: StatementList,
    site_links: SiteLinkList,
}

impl Item {
    pub fn new_empty() -> Self {
        Self::default()
    }

    pub fn with_id(id: ItemId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn id(&self) -> Option<ItemId> {
        self.id
    }

    /// Sets the id. Setting the current id again is a no-op; changing it fails.
    pub fn set_id(&mut self, id: ItemId) -> Result<(), ModelError> {
        assign_id(&mut self.id, id)
    }

    pub fn fingerprint_mut(&mut self) -> &mut Fingerprint {
        &mut self.fingerprint
    }

    pub fn set_fingerprint(&mut self, fingerprint: Fingerprint) {
        self.fingerprint = fingerprint;
    }

    pub fn statements_mut(&mut self) -> &mut StatementList {
        &mut self.statements
    }

    pub fn set_statements(&mut self, statements: StatementList) {
        self.statements = statements;
    }

    /// Appends a statement, rejecting GUIDs that belong to another entity.
    pub fn add_claim(&mut self, statement: Statement) -> Result<(), ModelError> {
        check_statement_owner(self.id.map(EntityId::Item), &statement)?;
        self.statements.add(statement);
        Ok(())
    }

    pub fn claims(&self) -> &[Statement] {
        self.statements.statements()
    }

    pub fn site_links(&self) -> &SiteLinkList {
        &self.site_links
    }

    pub fn site_links_mut(&mut self) -> &mut SiteLinkList {
        &mut self.site_links
    }

    pub fn site_link(&self, site_id: &str) -> Option<&SiteLink> {
        self.site_links.get(site_id)
    }

    /// Adds a site link; a second link for the same site is rejected.
    pub fn add_site_link(&mut self, link: SiteLink) -> Result<(), ModelError> {
        self.site_links.add(link)
    }

    /// Adds or replaces the link for the link's site.
    pub fn set_site_link(&mut self, link: SiteLink) -> Option<SiteLink> {
        self.site_links.set(link)
    }

    pub fn remove_site_link(&mut self, site_id: &str) -> Option<SiteLink> {
        self.site_links.remove(site_id)
    }

    pub fn has_link_to_site(&self, site_id: &str) -> bool {
        self.site_links.has(site_id)
    }

    /// Empties all content but keeps the id.
    pub fn clear(&mut self) {
        self.fingerprint.clear();
        self.statements.clear();
        self.site_links.clear();
    }

    /// Deep copy for snapshotting before mutation.
    pub fn copy(&self) -> Self {
        self.clone()
    }
}

impl EntityDocument for Item {
    fn entity_id(&self) -> Option<EntityId> {
        self.id.map(EntityId::Item)
    }

    fn entity_type(&self) -> EntityType {
        EntityType::Item
    }

    fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    fn statements(&self) -> &StatementList {
        &self.statements
    }

    fn is_empty(&self) -> bool {
        self.fingerprint.is_empty() && self.statements.is_empty() && self.site_links.is_empty()
    }
}

/// A property: the predicate of snaks, with a fixed data type.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    id: Option<PropertyId>,
    fingerprint: Fingerprint,
    data_type_id: String,
    statements: StatementList,
}

impl Property {
    pub fn new_empty(data_type_id: impl Into<String>) -> Self {
        Self {
            id: None,
            fingerprint: Fingerprint::new(),
            data_type_id: data_type_id.into(),
            statements: StatementList::new(),
        }
    }

    pub fn id(&self) -> Option<PropertyId> {
        self.id
    }

    /// Sets the id. Setting the current id again is a no-op; changing it fails.
    pub fn set_id(&mut self, id: PropertyId) -> Result<(), ModelError> {
        assign_id(&mut self.id, id)
    }

    /// Data type identifier such as `wikibase-item` or `external-id`.
    pub fn data_type_id(&self) -> &str {
        &self.data_type_id
    }

    pub fn set_data_type_id(&mut self, data_type_id: impl Into<String>) {
        self.data_type_id = data_type_id.into();
    }

    pub fn fingerprint_mut(&mut self) -> &mut Fingerprint {
        &mut self.fingerprint
    }

    pub fn set_fingerprint(&mut self, fingerprint: Fingerprint) {
        self.fingerprint = fingerprint;
    }

    pub fn statements_mut(&mut self) -> &mut StatementList {
        &mut self.statements
    }

    pub fn set_statements(&mut self, statements: StatementList) {
        self.statements = statements;
    }

    /// Appends a statement, rejecting GUIDs that belong to another entity.
    pub fn add_claim(&mut self, statement: Statement) -> Result<(), ModelError> {
        check_statement_owner(self.id.map(EntityId::Property), &statement)?;
        self.statements.add(statement);
        Ok(())
    }

    pub fn claims(&self) -> &[Statement] {
        self.statements.statements()
    }

    /// Empties fingerprint and statements; the id and data type stay.
    pub fn clear(&mut self) {
        self.fingerprint.clear();
        self.statements.clear();
    }

    pub fn copy(&self) -> Self {
        self.clone()
    }
}

impl EntityDocument for Property {
    fn entity_id(&self) -> Option<EntityId> {
        self.id.map(EntityId::Property)
    }

    fn entity_type(&self) -> EntityType {
        EntityType::Property
    }

    fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    fn statements(&self) -> &StatementList {
        &self.statements
    }

    fn is_empty(&self) -> bool {
        self.fingerprint.is_empty() && self.statements.is_empty()
    }
}

/// Any entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Item(Item),
    Property(Property),
}

impl Entity {
    /// Sets the id, which must match the entity's type and may not change.
    pub fn set_id(&mut self, id: EntityId) -> Result<(), ModelError> {
        match (self, id) {
            (Entity::Item(item), EntityId::Item(id)) => item.set_id(id),
            (Entity::Property(property), EntityId::Property(id)) => property.set_id(id),
            (entity, id) => Err(ModelError::WrongEntityType {
                id: id.to_string(),
                expected: entity.entity_type().as_str(),
            }),
        }
    }

    pub fn fingerprint_mut(&mut self) -> &mut Fingerprint {
        match self {
            Entity::Item(item) => item.fingerprint_mut(),
            Entity::Property(property) => property.fingerprint_mut(),
        }
    }

    pub fn statements_mut(&mut self) -> &mut StatementList {
        match self {
            Entity::Item(item) => item.statements_mut(),
            Entity::Property(property) => property.statements_mut(),
        }
    }

    pub fn add_claim(&mut self, statement: Statement) -> Result<(), ModelError> {
        match self {
            Entity::Item(item) => item.add_claim(statement),
            Entity::Property(property) => property.add_claim(statement),
        }
    }

    /// Site links of an item; `None` for entity types without site links.
    pub fn site_links(&self) -> Option<&SiteLinkList> {
        match self {
            Entity::Item(item) => Some(item.site_links()),
            Entity::Property(_) => None,
        }
    }

    pub fn site_links_mut(&mut self) -> Option<&mut SiteLinkList> {
        match self {
            Entity::Item(item) => Some(item.site_links_mut()),
            Entity::Property(_) => None,
        }
    }

    pub fn as_item(&self) -> Option<&Item> {
        match self {
            Entity::Item(item) => Some(item),
            Entity::Property(_) => None,
        }
    }

    pub fn as_property(&self) -> Option<&Property> {
        match self {
            Entity::Property(property) => Some(property),
            Entity::Item(_) => None,
        }
    }

    pub fn clear(&mut self) {
        match self {
            Entity::Item(item) => item.clear(),
            Entity::Property(property) => property.clear(),
        }
    }

    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Content hash of the entity's array form (language and site keys sorted).
    pub fn hash(&self) -> String {
        crate::codec::entity::entity_hash(self)
    }
}

impl EntityDocument for Entity {
    fn entity_id(&self) -> Option<EntityId> {
        match self {
            Entity::Item(item) => item.entity_id(),
            Entity::Property(property) => property.entity_id(),
        }
    }

    fn entity_type(&self) -> EntityType {
        match self {
            Entity::Item(_) => EntityType::Item,
            Entity::Property(_) => EntityType::Property,
        }
    }

    fn fingerprint(&self) -> &Fingerprint {
        match self {
            Entity::Item(item) => item.fingerprint(),
            Entity::Property(property) => property.fingerprint(),
        }
    }

    fn statements(&self) -> &StatementList {
        match self {
            Entity::Item(item) => item.statements(),
            Entity::Property(property) => property.statements(),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Entity::Item(item) => item.is_empty(),
            Entity::Property(property) => property.is_empty(),
        }
    }
}

impl From<Item> for Entity {
    fn from(item: Item) -> Self {
        Entity::Item(item)
    }
}

impl From<Property> for Entity {
    fn from(property: Property) -> Self {
        Entity::Property(property)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Snak;

    fn q(n: u64) -> ItemId {
        ItemId::new(n).unwrap()
    }

    fn p(n: u64) -> PropertyId {
        PropertyId::new(n).unwrap()
    }

    #[test]
    fn test_new_item_is_empty() {
        let item = Item::new_empty();
        assert!(item.is_empty());
        assert_eq!(item.id(), None);
        assert_eq!(item.entity_type(), EntityType::Item);
    }

    #[test]
    fn test_id_is_write_once() {
        let mut item = Item::new_empty();
        item.set_id(q(42)).unwrap();
        item.set_id(q(42)).unwrap();
        assert!(matches!(item.set_id(q(43)), Err(ModelError::IdReassignment { .. })));
        assert_eq!(item.id(), Some(q(42)));
    }

    #[test]
    fn test_entity_set_id_checks_type() {
        let mut entity = Entity::from(Property::new_empty("string"));
        let err = entity.set_id(EntityId::Item(q(1))).unwrap_err();
        assert_eq!(
            err,
            ModelError::WrongEntityType {
                id: "Q1".to_string(),
                expected: "property"
            }
        );
        entity.set_id(EntityId::Property(p(1))).unwrap();
        assert_eq!(entity.entity_id(), Some(EntityId::Property(p(1))));
    }

    #[test]
    fn test_add_claim_rejects_foreign_guid() {
        let mut item = Item::with_id(q(31));
        let mut statement = Statement::new(Snak::no_value(p(42)));
        statement.set_guid("Q32$D8404CDA-25E4-4334-AF13-A3290BCD9C0F");
        assert!(matches!(item.add_claim(statement.clone()), Err(ModelError::GuidMismatch { .. })));

        statement.set_guid("q31$D8404CDA-25E4-4334-AF13-A3290BCD9C0F");
        item.add_claim(statement).unwrap();
        assert_eq!(item.claims().len(), 1);
        assert!(!item.is_empty());
    }

    #[test]
    fn test_clear_keeps_id() {
        let mut item = Item::with_id(q(64));
        item.fingerprint_mut().set_label("en", "Berlin").unwrap();
        item.add_site_link(SiteLink::new("enwiki", "Berlin").unwrap()).unwrap();
        item.add_claim(Statement::new(Snak::some_value(p(17)))).unwrap();

        item.clear();
        assert!(item.is_empty());
        assert_eq!(item.id(), Some(q(64)));
    }

    #[test]
    fn test_copy_is_independent() {
        let mut original = Item::with_id(q(1));
        original.fingerprint_mut().set_label("en", "one").unwrap();
        let mut copy = original.copy();
        copy.fingerprint_mut().set_label("en", "uno").unwrap();
        assert_eq!(original.fingerprint().label("en"), Some("one"));
        assert_ne!(original, copy);
    }

    #[test]
    fn test_property_has_no_site_links() {
        let entity = Entity::from(Property::new_empty("wikibase-item"));
        assert!(entity.site_links().is_none());
        assert_eq!(entity.as_property().unwrap().data_type_id(), "wikibase-item");
    }
}
