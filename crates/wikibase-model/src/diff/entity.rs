//! Entity diffs: computing, applying and reversing.

use std::convert::Infallible;

use tracing::debug;

use crate::diff::map::{MapDiff, PatchTarget};
use crate::diff::statement::{apply_statement_diff, diff_statements};
use crate::error::{DiffSection, ModelError};
use crate::model::{
    AliasGroupList, Entity, EntityDocument, EntityType, Fingerprint, Item, Property, SiteLink,
    SiteLinkList, Statement, TermList,
};

/// A structural delta between two snapshots of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDiff {
    entity_type: EntityType,
    labels: MapDiff<String>,
    descriptions: MapDiff<String>,
    aliases: MapDiff<Vec<String>>,
    claims: MapDiff<Statement>,
    site_links: MapDiff<SiteLink>,
}

impl EntityDiff {
    /// Creates an empty diff for entities of the given type.
    pub fn new(entity_type: EntityType) -> Self {
        Self {
            entity_type,
            labels: MapDiff::new(),
            descriptions: MapDiff::new(),
            aliases: MapDiff::new(),
            claims: MapDiff::new(),
            site_links: MapDiff::new(),
        }
    }

    /// Computes the diff turning `old` into `new`.
    pub fn between(old: &Entity, new: &Entity) -> Result<Self, ModelError> {
        match (old, new) {
            (Entity::Item(old), Entity::Item(new)) => Ok(Self::between_items(old, new)),
            (Entity::Property(old), Entity::Property(new)) => Ok(Self::between_properties(old, new)),
            _ => Err(ModelError::EntityTypeMismatch {
                expected: old.entity_type().as_str(),
                found: new.entity_type().as_str(),
            }),
        }
    }

    pub fn between_items(old: &Item, new: &Item) -> Self {
        let mut diff = Self::between_documents(EntityType::Item, old, new);
        diff.site_links = MapDiff::between(
            old.site_links().iter().map(|l| (l.site_id(), l)),
            new.site_links().iter().map(|l| (l.site_id(), l)),
        );
        diff
    }

    pub fn between_properties(old: &Property, new: &Property) -> Self {
        Self::between_documents(EntityType::Property, old, new)
    }

    fn between_documents(entity_type: EntityType, old: &dyn EntityDocument, new: &dyn EntityDocument) -> Self {
        let (old_fp, new_fp) = (old.fingerprint(), new.fingerprint());
        Self {
            entity_type,
            labels: MapDiff::between(terms(old_fp.labels()), terms(new_fp.labels())),
            descriptions: MapDiff::between(terms(old_fp.descriptions()), terms(new_fp.descriptions())),
            aliases: MapDiff::between(
                old_fp.alias_groups().as_map().iter().map(|(k, v)| (k.as_str(), v)),
                new_fp.alias_groups().as_map().iter().map(|(k, v)| (k.as_str(), v)),
            ),
            claims: diff_statements(old.statements(), new.statements()),
            site_links: MapDiff::new(),
        }
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    pub fn labels(&self) -> &MapDiff<String> {
        &self.labels
    }

    pub fn labels_mut(&mut self) -> &mut MapDiff<String> {
        &mut self.labels
    }

    pub fn descriptions(&self) -> &MapDiff<String> {
        &self.descriptions
    }

    pub fn descriptions_mut(&mut self) -> &mut MapDiff<String> {
        &mut self.descriptions
    }

    pub fn aliases(&self) -> &MapDiff<Vec<String>> {
        &self.aliases
    }

    pub fn aliases_mut(&mut self) -> &mut MapDiff<Vec<String>> {
        &mut self.aliases
    }

    /// Statement operations keyed by GUID (or a synthetic key).
    pub fn claims(&self) -> &MapDiff<Statement> {
        &self.claims
    }

    pub fn claims_mut(&mut self) -> &mut MapDiff<Statement> {
        &mut self.claims
    }

    /// Site link operations keyed by site id. Always empty for properties.
    pub fn site_links(&self) -> &MapDiff<SiteLink> {
        &self.site_links
    }

    pub fn site_links_mut(&mut self) -> &mut MapDiff<SiteLink> {
        &mut self.site_links
    }

    /// True iff no section holds an operation.
    pub fn is_empty(&self) -> bool {
        self.op_count() == 0
    }

    /// Total number of operations over all sections.
    pub fn op_count(&self) -> usize {
        self.labels.len()
            + self.descriptions.len()
            + self.aliases.len()
            + self.claims.len()
            + self.site_links.len()
    }

    /// Returns the sections that hold at least one operation.
    pub fn touched_sections(&self) -> Vec<DiffSection> {
        [
            (DiffSection::Labels, self.labels.is_empty()),
            (DiffSection::Descriptions, self.descriptions.is_empty()),
            (DiffSection::Aliases, self.aliases.is_empty()),
            (DiffSection::Claims, self.claims.is_empty()),
            (DiffSection::SiteLinks, self.site_links.is_empty()),
        ]
        .into_iter()
        .filter_map(|(section, empty)| (!empty).then_some(section))
        .collect()
    }

    /// Returns the diff that undoes this one.
    pub fn reverse(&self) -> Self {
        Self {
            entity_type: self.entity_type,
            labels: self.labels.reverse(),
            descriptions: self.descriptions.reverse(),
            aliases: self.aliases.reverse(),
            claims: self.claims.reverse(),
            site_links: self.site_links.reverse(),
        }
    }

    /// Applies the diff to an entity of the same type.
    pub fn apply(&self, entity: &mut Entity) -> Result<(), ModelError> {
        match entity {
            Entity::Item(item) => self.apply_to_item(item),
            Entity::Property(property) => self.apply_to_property(property),
        }
    }

    pub fn apply_to_item(&self, item: &mut Item) -> Result<(), ModelError> {
        self.check_type(EntityType::Item)?;
        self.apply_fingerprint(item.fingerprint_mut())?;
        apply_statement_diff(&self.claims, item.statements_mut());
        self.site_links
            .apply(item.site_links_mut())
            .map_err(|never: Infallible| -> ModelError { match never {} })?;
        debug!(ops = self.op_count(), id = ?item.id(), "applied diff to item");
        Ok(())
    }

    pub fn apply_to_property(&self, property: &mut Property) -> Result<(), ModelError> {
        self.check_type(EntityType::Property)?;
        self.apply_fingerprint(property.fingerprint_mut())?;
        apply_statement_diff(&self.claims, property.statements_mut());
        debug!(ops = self.op_count(), id = ?property.id(), "applied diff to property");
        Ok(())
    }

    fn apply_fingerprint(&self, fingerprint: &mut Fingerprint) -> Result<(), ModelError> {
        self.labels.apply(fingerprint.labels_mut())?;
        self.descriptions.apply(fingerprint.descriptions_mut())?;
        self.aliases.apply(fingerprint.alias_groups_mut())
    }

    fn check_type(&self, found: EntityType) -> Result<(), ModelError> {
        if self.entity_type != found {
            return Err(ModelError::EntityTypeMismatch {
                expected: self.entity_type.as_str(),
                found: found.as_str(),
            });
        }
        Ok(())
    }
}

fn terms(list: &TermList) -> impl Iterator<Item = (&str, &String)> {
    list.as_map().iter().map(|(k, v)| (k.as_str(), v))
}

// =============================================================================
// Patch targets
// =============================================================================

impl PatchTarget<String> for TermList {
    type Error = ModelError;

    fn current(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }

    fn put(&mut self, key: &str, value: String) -> Result<(), ModelError> {
        self.set(key, value).map(drop)
    }

    fn take(&mut self, key: &str) {
        self.remove(key);
    }
}

impl PatchTarget<Vec<String>> for AliasGroupList {
    type Error = ModelError;

    fn current(&self, key: &str) -> Option<Vec<String>> {
        self.has(key).then(|| self.get(key).to_vec())
    }

    fn put(&mut self, key: &str, value: Vec<String>) -> Result<(), ModelError> {
        self.set(key, value)
    }

    fn take(&mut self, key: &str) {
        self.remove(key);
    }
}

impl PatchTarget<SiteLink> for SiteLinkList {
    type Error = Infallible;

    fn current(&self, key: &str) -> Option<SiteLink> {
        self.get(key).cloned()
    }

    /// Stores the link under its own site id; `key` is the same for diffs
    /// produced by [`EntityDiff::between_items`].
    fn put(&mut self, key: &str, value: SiteLink) -> Result<(), Infallible> {
        if value.site_id() != key {
            debug!(key, site = value.site_id(), "site link stored under its own site id");
        }
        self.set(value);
        Ok(())
    }

    fn take(&mut self, key: &str) {
        self.remove(key);
    }
}

/// Computes the diff turning `old` into `new`.
pub fn diff_entities(old: &Entity, new: &Entity) -> Result<EntityDiff, ModelError> {
    EntityDiff::between(old, new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::map::DiffOp;
    use crate::model::{DataValue, ItemId, PropertyId, Snak};

    fn p(n: u64) -> PropertyId {
        PropertyId::new(n).unwrap()
    }

    fn sample() -> Item {
        let mut item = Item::with_id(ItemId::new(1).unwrap());
        item.fingerprint_mut().set_label("en", "cat").unwrap();
        item.fingerprint_mut().set_aliases("en", ["kitty"]).unwrap();
        let mut statement = Statement::new(Snak::no_value(p(42)));
        statement.set_guid("X");
        item.add_claim(statement).unwrap();
        item
    }

    #[test]
    fn test_diff_of_identical_is_empty() {
        let item = sample();
        let diff = EntityDiff::between_items(&item, &item.copy());
        assert!(diff.is_empty());
        assert!(diff.touched_sections().is_empty());
    }

    #[test]
    fn test_roundtrip_and_reverse() {
        let old = sample();
        let mut new = old.copy();
        new.fingerprint_mut().set_label("en", "house cat").unwrap();
        new.fingerprint_mut().set_description("de", "Haustier").unwrap();
        new.fingerprint_mut().remove_aliases("en");
        new.add_site_link(SiteLink::new("enwiki", "Cat").unwrap()).unwrap();
        new.statements_mut()
            .get_by_guid_mut("X")
            .unwrap()
            .qualifiers_mut()
            .add_snak(Snak::value(p(10), DataValue::string("a kitten!")));

        let diff = EntityDiff::between_items(&old, &new);
        assert_eq!(diff.op_count(), 5);

        let mut patched = old.copy();
        diff.apply_to_item(&mut patched).unwrap();
        assert_eq!(patched, new);

        diff.reverse().apply_to_item(&mut patched).unwrap();
        assert_eq!(patched, old);
    }

    #[test]
    fn test_type_mismatch() {
        let item = Entity::from(Item::new_empty());
        let property = Entity::from(Property::new_empty("string"));
        assert!(matches!(
            EntityDiff::between(&item, &property),
            Err(ModelError::EntityTypeMismatch { .. })
        ));

        let mut property = Property::new_empty("string");
        let diff = EntityDiff::new(EntityType::Item);
        assert!(diff.apply_to_property(&mut property).is_err());
    }

    #[test]
    fn test_apply_tolerates_stale_removal() {
        let mut diff = EntityDiff::new(EntityType::Item);
        diff.labels_mut().insert("fr", DiffOp::Remove("chat".to_string()));
        let mut item = sample();
        diff.apply_to_item(&mut item).unwrap();
        assert_eq!(item, sample());
    }
}
