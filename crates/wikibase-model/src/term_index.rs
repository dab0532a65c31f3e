//! Term lookup.
//!
//! A [`TermIndex`] keeps the labels, descriptions and aliases of every
//! entity searchable. It only sees the [`Fingerprint`] of an entity.
//!
//! [`Fingerprint`]: crate::model::Fingerprint

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{ModelError, StoreError};
use crate::model::{AliasGroupList, EntityDocument, EntityId, EntityType, TermList};

/// Which part of a fingerprint a term comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermType {
    Label,
    Description,
    Alias,
}

impl TermType {
    pub fn as_str(self) -> &'static str {
        match self {
            TermType::Label => "label",
            TermType::Description => "description",
            TermType::Alias => "alias",
        }
    }
}

impl fmt::Display for TermType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One indexed term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TermEntry {
    pub entity_id: EntityId,
    pub term_type: TermType,
    pub language: String,
    pub text: String,
}

impl TermEntry {
    pub fn new(entity_id: EntityId, term_type: TermType, language: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            entity_id,
            term_type,
            language: language.into(),
            text: text.into(),
        }
    }
}

/// Text to look for, optionally restricted to one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermMatchCriteria {
    pub text: String,
    pub language: Option<String>,
}

impl TermMatchCriteria {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: None,
        }
    }

    pub fn in_language(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: Some(language.into()),
        }
    }
}

/// Options for [`TermIndex::get_matching_terms`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermMatchOptions {
    /// Compare texts exactly (default) or ignoring case.
    pub case_sensitive: bool,
    /// Match texts starting with the criteria text.
    pub prefix_search: bool,
    /// Maximum number of entries returned.
    pub limit: Option<usize>,
}

impl Default for TermMatchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            prefix_search: false,
            limit: None,
        }
    }
}

impl TermMatchOptions {
    /// Exact, case-sensitive, unlimited matching.
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive prefix matching, as used for search suggestions.
    pub fn prefix(limit: usize) -> Self {
        Self {
            case_sensitive: false,
            prefix_search: true,
            limit: Some(limit),
        }
    }

    fn matches(&self, wanted: &str, text: &str) -> bool {
        if self.case_sensitive {
            if self.prefix_search {
                text.starts_with(wanted)
            } else {
                text == wanted
            }
        } else {
            let wanted = wanted.to_lowercase();
            let text = text.to_lowercase();
            if self.prefix_search {
                text.starts_with(&wanted)
            } else {
                text == wanted
            }
        }
    }
}

/// Lists the terms of an entity.
///
/// Labels come first, then descriptions, then aliases, each ordered by
/// language. The entity must have an id.
pub fn terms_of_entity<E: EntityDocument + ?Sized>(entity: &E) -> Result<Vec<TermEntry>, ModelError> {
    let id = entity.entity_id().ok_or(ModelError::MissingEntityId)?;
    let fingerprint = entity.fingerprint();

    let mut terms = Vec::new();
    for (language, text) in fingerprint.labels().iter() {
        terms.push(TermEntry::new(id, TermType::Label, language, text));
    }
    for (language, text) in fingerprint.descriptions().iter() {
        terms.push(TermEntry::new(id, TermType::Description, language, text));
    }
    for (language, aliases) in fingerprint.alias_groups().iter() {
        for alias in aliases {
            terms.push(TermEntry::new(id, TermType::Alias, language, alias));
        }
    }
    Ok(terms)
}

/// Keeps the terms of entities searchable.
pub trait TermIndex {
    /// Replaces the indexed terms of an entity with its current ones.
    fn save_terms_of_entity(&mut self, entity: &dyn EntityDocument) -> Result<(), StoreError>;

    /// Removes every term of an entity.
    fn delete_terms_of_entity(&mut self, id: EntityId) -> Result<(), StoreError>;

    /// Returns the terms of the given entities, optionally restricted to
    /// some term types and languages.
    fn get_terms_of_entities(
        &self,
        ids: &[EntityId],
        term_types: Option<&[TermType]>,
        languages: Option<&[&str]>,
    ) -> Result<Vec<TermEntry>, StoreError>;

    /// Returns terms matching any of the criteria.
    fn get_matching_terms(
        &self,
        criteria: &[TermMatchCriteria],
        term_type: Option<TermType>,
        entity_type: Option<EntityType>,
        options: &TermMatchOptions,
    ) -> Result<Vec<TermEntry>, StoreError>;
}

// =============================================================================
// IN-MEMORY INDEX
// =============================================================================

/// A [`TermIndex`] held in memory. Results are ordered by entity id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTermIndex {
    terms: BTreeMap<EntityId, Vec<TermEntry>>,
}

impl InMemoryTermIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed terms.
    pub fn len(&self) -> usize {
        self.terms.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    fn entries(&self) -> impl Iterator<Item = &TermEntry> {
        self.terms.values().flatten()
    }

    /// Finds labels (and, if given, aliases) of entities of `entity_type`
    /// that equal one of `labels` in the same language.
    ///
    /// Used to keep property labels unique. The caller filters out the
    /// entity being edited.
    pub fn get_label_conflicts(
        &self,
        entity_type: EntityType,
        labels: &TermList,
        aliases: Option<&AliasGroupList>,
    ) -> Vec<TermEntry> {
        let mut wanted: Vec<(&str, &str)> = labels.iter().collect();
        if let Some(aliases) = aliases {
            for (language, group) in aliases.iter() {
                wanted.extend(group.iter().map(|alias| (language, alias.as_str())));
            }
        }

        self.entries()
            .filter(|entry| entry.entity_id.entity_type() == entity_type)
            .filter(|entry| entry.term_type == TermType::Label)
            .filter(|entry| {
                wanted
                    .iter()
                    .any(|(language, text)| entry.language == *language && entry.text == *text)
            })
            .cloned()
            .collect()
    }

    /// Finds entities of `entity_type` that carry the same label and the
    /// same description as given, both in the same language.
    ///
    /// Used to keep item label+description pairs unique. Returns the
    /// conflicting labels.
    pub fn get_label_with_description_conflicts(
        &self,
        entity_type: EntityType,
        labels: &TermList,
        descriptions: &TermList,
    ) -> Vec<TermEntry> {
        let mut conflicts = Vec::new();
        for (id, entries) in &self.terms {
            if id.entity_type() != entity_type {
                continue;
            }
            let has = |term_type: TermType, language: &str, text: &str| {
                entries
                    .iter()
                    .any(|e| e.term_type == term_type && e.language == language && e.text == text)
            };
            for (language, label) in labels.iter() {
                let Some(description) = descriptions.get(language) else {
                    continue;
                };
                if has(TermType::Label, language, label) && has(TermType::Description, language, description) {
                    conflicts.push(TermEntry::new(*id, TermType::Label, language, label));
                }
            }
        }
        conflicts
    }
}

impl TermIndex for InMemoryTermIndex {
    fn save_terms_of_entity(&mut self, entity: &dyn EntityDocument) -> Result<(), StoreError> {
        let terms = terms_of_entity(entity)?;
        let id = entity.entity_id().ok_or(ModelError::MissingEntityId)?;
        debug!(entity = %id, terms = terms.len(), "indexed terms");
        if terms.is_empty() {
            self.terms.remove(&id);
        } else {
            self.terms.insert(id, terms);
        }
        Ok(())
    }

    fn delete_terms_of_entity(&mut self, id: EntityId) -> Result<(), StoreError> {
        if self.terms.remove(&id).is_some() {
            debug!(entity = %id, "removed terms");
        }
        Ok(())
    }

    fn get_terms_of_entities(
        &self,
        ids: &[EntityId],
        term_types: Option<&[TermType]>,
        languages: Option<&[&str]>,
    ) -> Result<Vec<TermEntry>, StoreError> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        Ok(ids
            .iter()
            .filter_map(|id| self.terms.get(id))
            .flatten()
            .filter(|entry| term_types.is_none_or(|types| types.contains(&entry.term_type)))
            .filter(|entry| languages.is_none_or(|langs| langs.contains(&entry.language.as_str())))
            .cloned()
            .collect())
    }

    fn get_matching_terms(
        &self,
        criteria: &[TermMatchCriteria],
        term_type: Option<TermType>,
        entity_type: Option<EntityType>,
        options: &TermMatchOptions,
    ) -> Result<Vec<TermEntry>, StoreError> {
        let limit = options.limit.unwrap_or(usize::MAX);
        let matches: Vec<TermEntry> = self
            .entries()
            .filter(|entry| entity_type.is_none_or(|t| entry.entity_id.entity_type() == t))
            .filter(|entry| term_type.is_none_or(|t| entry.term_type == t))
            .filter(|entry| {
                criteria.iter().any(|c| {
                    c.language.as_deref().is_none_or(|l| l == entry.language)
                        && options.matches(&c.text, &entry.text)
                })
            })
            .take(limit)
            .cloned()
            .collect();
        trace!(criteria = criteria.len(), found = matches.len(), "matched terms");
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Item, ItemId, Property, PropertyId};

    fn item(n: u64, label: &str, description: Option<&str>) -> Item {
        let mut item = Item::with_id(ItemId::new(n).unwrap());
        item.fingerprint_mut().set_label("en", label).unwrap();
        if let Some(description) = description {
            item.fingerprint_mut().set_description("en", description).unwrap();
        }
        item
    }

    fn property(n: u64, label: &str) -> Property {
        let mut property = Property::new_empty("string");
        property.set_id(PropertyId::new(n).unwrap()).unwrap();
        property.fingerprint_mut().set_label("en", label).unwrap();
        property
    }

    #[test]
    fn test_terms_of_entity() {
        let mut berlin = item(64, "Berlin", Some("capital of Germany"));
        berlin.fingerprint_mut().set_label("de", "Berlin").unwrap();
        berlin.fingerprint_mut().set_aliases("en", ["Berlin, Germany"]).unwrap();

        let terms = terms_of_entity(&berlin).unwrap();
        let types: Vec<TermType> = terms.iter().map(|t| t.term_type).collect();
        assert_eq!(
            types,
            vec![TermType::Label, TermType::Label, TermType::Description, TermType::Alias]
        );
        assert_eq!(terms[0].language, "de");

        assert_eq!(terms_of_entity(&Item::new_empty()), Err(ModelError::MissingEntityId));
    }

    #[test]
    fn test_save_replaces_and_delete_removes() {
        let mut index = InMemoryTermIndex::new();
        let mut berlin = item(64, "Berlin", None);
        index.save_terms_of_entity(&berlin).unwrap();
        assert_eq!(index.len(), 1);

        berlin.fingerprint_mut().set_label("en", "Berlin, Germany").unwrap();
        index.save_terms_of_entity(&berlin).unwrap();
        let id = EntityId::from(ItemId::new(64).unwrap());
        let terms = index.get_terms_of_entities(&[id], None, None).unwrap();
        assert_eq!(terms, vec![TermEntry::new(id, TermType::Label, "en", "Berlin, Germany")]);

        index.delete_terms_of_entity(id).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_get_terms_of_entities_filters() {
        let mut index = InMemoryTermIndex::new();
        let mut berlin = item(64, "Berlin", Some("capital of Germany"));
        berlin.fingerprint_mut().set_label("fr", "Berlin").unwrap();
        index.save_terms_of_entity(&berlin).unwrap();
        index.save_terms_of_entity(&item(90, "Paris", None)).unwrap();

        let q64 = EntityId::from(ItemId::new(64).unwrap());
        let labels = index
            .get_terms_of_entities(&[q64], Some(&[TermType::Label]), Some(&["fr"]))
            .unwrap();
        assert_eq!(labels, vec![TermEntry::new(q64, TermType::Label, "fr", "Berlin")]);

        let all = index
            .get_terms_of_entities(&[q64, q64, ItemId::new(90).unwrap().into()], None, None)
            .unwrap();
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_matching_terms() {
        let mut index = InMemoryTermIndex::new();
        index.save_terms_of_entity(&item(64, "Berlin", None)).unwrap();
        index.save_terms_of_entity(&item(65, "Bern", None)).unwrap();
        index.save_terms_of_entity(&property(31, "berlin id")).unwrap();

        let exact = index
            .get_matching_terms(&[TermMatchCriteria::new("Berlin")], None, None, &TermMatchOptions::new())
            .unwrap();
        assert_eq!(exact.len(), 1);

        let prefix = index
            .get_matching_terms(
                &[TermMatchCriteria::in_language("ber", "en")],
                Some(TermType::Label),
                Some(EntityType::Item),
                &TermMatchOptions::prefix(10),
            )
            .unwrap();
        let texts: Vec<&str> = prefix.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["Berlin", "Bern"]);

        let limited = index
            .get_matching_terms(&[TermMatchCriteria::new("BER")], None, None, &TermMatchOptions::prefix(2))
            .unwrap();
        assert_eq!(limited.len(), 2);

        let wrong_language = index
            .get_matching_terms(
                &[TermMatchCriteria::in_language("Berlin", "de")],
                None,
                None,
                &TermMatchOptions::new(),
            )
            .unwrap();
        assert!(wrong_language.is_empty());
    }

    #[test]
    fn test_label_conflicts() {
        let mut index = InMemoryTermIndex::new();
        index.save_terms_of_entity(&property(1, "instance of")).unwrap();
        index.save_terms_of_entity(&item(1, "instance of", None)).unwrap();

        let mut labels = TermList::new();
        labels.set("en", "instance of").unwrap();
        let conflicts = index.get_label_conflicts(EntityType::Property, &labels, None);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].entity_id.to_string(), "P1");

        let mut aliases = AliasGroupList::new();
        aliases.set("en", ["instance of"]).unwrap();
        let conflicts = index.get_label_conflicts(EntityType::Property, &TermList::new(), Some(&aliases));
        assert_eq!(conflicts.len(), 1);
    }

    #[test]
    fn test_label_with_description_conflicts() {
        let mut index = InMemoryTermIndex::new();
        index
            .save_terms_of_entity(&item(64, "Berlin", Some("capital of Germany")))
            .unwrap();
        index
            .save_terms_of_entity(&item(821244, "Berlin", Some("town in New Hampshire")))
            .unwrap();

        let mut labels = TermList::new();
        labels.set("en", "Berlin").unwrap();
        let mut descriptions = TermList::new();
        descriptions.set("en", "capital of Germany").unwrap();

        let conflicts = index.get_label_with_description_conflicts(EntityType::Item, &labels, &descriptions);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].entity_id.to_string(), "Q64");

        // A label alone is not a conflict
        let conflicts = index.get_label_with_description_conflicts(EntityType::Item, &labels, &TermList::new());
        assert!(conflicts.is_empty());
    }
}
