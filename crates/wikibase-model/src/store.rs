//! Entity storage.
//!
//! The model never loads or saves entities itself. [`EntityStore`] is the
//! seam the surrounding application implements; [`InMemoryEntityStore`] is
//! a complete implementation used by tests and tools.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::change::{timestamp_now, Change, ChangeTransmitter};
use crate::diff::resolve_edit_conflict;
use crate::error::{ModelError, StoreError};
use crate::model::{Entity, EntityDocument, EntityId, EntityType, ItemId, PropertyId};

/// A saved revision of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Revision {
    pub id: u64,
    pub entity_id: EntityId,
}

/// Loads and saves entities.
pub trait EntityStore {
    /// Saves `entity` as a new revision, assigning an id if it has none.
    fn save(&mut self, entity: Entity) -> Result<Revision, StoreError>;

    /// Loads the latest revision of an entity.
    fn get(&self, id: EntityId) -> Result<Option<Entity>, StoreError>;
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// Keeps every revision of every entity in memory.
///
/// Revision ids are global and increase by one per save, starting at 1.
#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    history: FxHashMap<EntityId, Vec<(u64, Entity)>>,
    last_revision: u64,
    last_item: u64,
    last_property: u64,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the latest revision id of an entity.
    pub fn latest_revision(&self, id: EntityId) -> Option<u64> {
        self.history.get(&id).and_then(|revisions| revisions.last()).map(|(rev, _)| *rev)
    }

    /// Loads a specific revision of an entity.
    pub fn get_revision(&self, id: EntityId, revision: u64) -> Option<&Entity> {
        self.history
            .get(&id)?
            .iter()
            .find(|(rev, _)| *rev == revision)
            .map(|(_, entity)| entity)
    }

    /// Number of stored entities.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Saves an edit that was made against `base_revision`.
    ///
    /// If the entity changed since then, the edit is rebased onto the latest
    /// revision with a three-way merge; a conflicting edit is refused.
    pub fn save_with_base(&mut self, entity: Entity, base_revision: u64) -> Result<Revision, StoreError> {
        let id = entity.entity_id().ok_or(ModelError::MissingEntityId)?;
        let latest = self
            .latest_revision(id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        if latest == base_revision {
            return self.save(entity);
        }

        let base = self
            .get_revision(id, base_revision)
            .ok_or(StoreError::RevisionMismatch {
                expected: base_revision,
                actual: latest,
            })?;
        let current = self
            .get_revision(id, latest)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;

        let resolved = resolve_edit_conflict(base, current, &entity).map_err(|err| {
            warn!(entity = %id, base = base_revision, latest, "edit conflict");
            StoreError::from(err)
        })?;
        debug!(entity = %id, base = base_revision, latest, "rebased edit");
        self.save(resolved)
    }

    fn assign_id(&mut self, entity: &mut Entity) -> Result<EntityId, StoreError> {
        if let Some(id) = entity.entity_id() {
            let counter = match id.entity_type() {
                EntityType::Item => &mut self.last_item,
                EntityType::Property => &mut self.last_property,
            };
            *counter = (*counter).max(id.numeric());
            return Ok(id);
        }

        let id: EntityId = match entity.entity_type() {
            EntityType::Item => {
                self.last_item += 1;
                ItemId::new(self.last_item)?.into()
            }
            EntityType::Property => {
                self.last_property += 1;
                PropertyId::new(self.last_property)?.into()
            }
        };
        entity.set_id(id)?;
        debug!(entity = %id, "assigned entity id");
        Ok(id)
    }
}

impl EntityStore for InMemoryEntityStore {
    fn save(&mut self, mut entity: Entity) -> Result<Revision, StoreError> {
        let entity_id = self.assign_id(&mut entity)?;
        self.last_revision += 1;
        let revision = Revision {
            id: self.last_revision,
            entity_id,
        };
        self.history
            .entry(entity_id)
            .or_default()
            .push((revision.id, entity));
        debug!(entity = %entity_id, revision = revision.id, "saved entity");
        Ok(revision)
    }

    fn get(&self, id: EntityId) -> Result<Option<Entity>, StoreError> {
        Ok(self
            .history
            .get(&id)
            .and_then(|revisions| revisions.last())
            .map(|(_, entity)| entity.copy()))
    }
}

/// Saves an entity and announces the edit.
///
/// The change carries the diff between the previously stored revision (if
/// any) and the saved entity.
pub fn save_and_transmit<S, T>(store: &mut S, entity: Entity, transmitter: &mut T) -> Result<Revision, StoreError>
where
    S: EntityStore + ?Sized,
    T: ChangeTransmitter + ?Sized,
{
    let old = match entity.entity_id() {
        Some(id) => store.get(id)?,
        None => None,
    };
    let revision = store.save(entity)?;
    let new = store
        .get(revision.entity_id)?
        .ok_or_else(|| StoreError::NotFound {
            id: revision.entity_id.to_string(),
        })?;

    let change = Change::from_snapshots(old.as_ref(), Some(&new), revision.id, timestamp_now())?;
    transmitter.transmit_change(&change);
    Ok(revision)
}

// =============================================================================
// ACCESS LIMITS
// =============================================================================

/// Counts the distinct entities loaded through a [`LimitedEntityLookup`].
///
/// Loading the same entity again does not count twice.
#[derive(Debug, Clone)]
pub struct EntityAccessLimiter {
    limit: usize,
    accessed: FxHashSet<EntityId>,
}

impl EntityAccessLimiter {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            accessed: FxHashSet::default(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of distinct entities accessed so far.
    pub fn count(&self) -> usize {
        self.accessed.len()
    }

    pub fn has_accessed(&self, id: EntityId) -> bool {
        self.accessed.contains(&id)
    }

    /// Records an access, refusing it once the limit is reached.
    pub fn record(&mut self, id: EntityId) -> Result<(), StoreError> {
        if self.accessed.contains(&id) {
            return Ok(());
        }
        if self.accessed.len() >= self.limit {
            warn!(entity = %id, limit = self.limit, "entity access limit exceeded");
            return Err(StoreError::AccessLimitExceeded { limit: self.limit });
        }
        self.accessed.insert(id);
        Ok(())
    }

    /// Forgets all recorded accesses.
    pub fn reset(&mut self) {
        self.accessed.clear();
    }
}

/// Read access to a store, bounded by an [`EntityAccessLimiter`].
pub struct LimitedEntityLookup<'a, S: EntityStore + ?Sized> {
    store: &'a S,
    limiter: &'a mut EntityAccessLimiter,
}

impl<'a, S: EntityStore + ?Sized> LimitedEntityLookup<'a, S> {
    pub fn new(store: &'a S, limiter: &'a mut EntityAccessLimiter) -> Self {
        Self { store, limiter }
    }

    /// Loads an entity, counting it against the limit.
    pub fn get(&mut self, id: EntityId) -> Result<Option<Entity>, StoreError> {
        self.limiter.record(id)?;
        self.store.get(id)
    }

    pub fn limiter(&self) -> &EntityAccessLimiter {
        self.limiter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{ChangeAction, RecordingChangeTransmitter};
    use crate::error::{DiffSection, MergeConflict};
    use crate::model::{Item, Property};

    fn berlin() -> Entity {
        let mut item = Item::new_empty();
        item.fingerprint_mut().set_label("en", "Berlin").unwrap();
        Entity::from(item)
    }

    #[test]
    fn test_save_assigns_ids_and_revisions() {
        let mut store = InMemoryEntityStore::new();

        let first = store.save(berlin()).unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(first.entity_id.to_string(), "Q1");

        let second = store.save(Entity::from(Property::new_empty("string"))).unwrap();
        assert_eq!(second.id, 2);
        assert_eq!(second.entity_id.to_string(), "P1");

        let loaded = store.get(first.entity_id).unwrap().unwrap();
        assert_eq!(loaded.entity_id(), Some(first.entity_id));
        assert_eq!(loaded.fingerprint().label("en"), Some("Berlin"));

        let again = store.save(loaded).unwrap();
        assert_eq!(again, Revision { id: 3, entity_id: first.entity_id });
        assert_eq!(store.latest_revision(first.entity_id), Some(3));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_explicit_ids_advance_counter() {
        let mut store = InMemoryEntityStore::new();
        store
            .save(Entity::from(Item::with_id(ItemId::new(64).unwrap())))
            .unwrap();
        let fresh = store.save(berlin()).unwrap();
        assert_eq!(fresh.entity_id.to_string(), "Q65");
    }

    #[test]
    fn test_get_missing_is_none() {
        let store = InMemoryEntityStore::new();
        assert_eq!(store.get("Q42".parse().unwrap()).unwrap(), None);
    }

    #[test]
    fn test_save_with_stale_base_merges() {
        let mut store = InMemoryEntityStore::new();
        let base_rev = store.save(berlin()).unwrap();
        let id = base_rev.entity_id;

        let mut theirs = store.get(id).unwrap().unwrap();
        theirs.fingerprint_mut().set_label("de", "Berlin").unwrap();
        store.save(theirs).unwrap();

        let mut ours = store.get_revision(id, base_rev.id).unwrap().copy();
        ours.fingerprint_mut().set_description("en", "capital of Germany").unwrap();
        let merged_rev = store.save_with_base(ours, base_rev.id).unwrap();
        assert_eq!(merged_rev.id, 3);

        let merged = store.get(id).unwrap().unwrap();
        assert_eq!(merged.fingerprint().label("de"), Some("Berlin"));
        assert_eq!(merged.fingerprint().description("en"), Some("capital of Germany"));
    }

    #[test]
    fn test_save_with_stale_base_conflicts() {
        let mut store = InMemoryEntityStore::new();
        let base_rev = store.save(berlin()).unwrap();
        let id = base_rev.entity_id;

        let mut theirs = store.get(id).unwrap().unwrap();
        theirs.fingerprint_mut().set_label("en", "Berlin, Germany").unwrap();
        store.save(theirs).unwrap();

        let mut ours = store.get_revision(id, base_rev.id).unwrap().copy();
        ours.fingerprint_mut().set_label("en", "City of Berlin").unwrap();
        assert_eq!(
            store.save_with_base(ours, base_rev.id),
            Err(StoreError::Conflict(MergeConflict {
                section: DiffSection::Labels,
                key: "en".to_string(),
            }))
        );
        assert_eq!(store.latest_revision(id), Some(2));
    }

    #[test]
    fn test_save_with_unknown_base() {
        let mut store = InMemoryEntityStore::new();
        let rev = store.save(berlin()).unwrap();
        let entity = store.get(rev.entity_id).unwrap().unwrap();
        assert_eq!(
            store.save_with_base(entity, 99),
            Err(StoreError::RevisionMismatch { expected: 99, actual: 1 })
        );
    }

    #[test]
    fn test_save_and_transmit() {
        let mut store = InMemoryEntityStore::new();
        let mut transmitter = RecordingChangeTransmitter::new();

        let rev = save_and_transmit(&mut store, berlin(), &mut transmitter).unwrap();
        let mut edited = store.get(rev.entity_id).unwrap().unwrap();
        edited.fingerprint_mut().set_label("fr", "Berlin").unwrap();
        save_and_transmit(&mut store, edited, &mut transmitter).unwrap();

        let changes = transmitter.take();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].action, ChangeAction::Add);
        assert_eq!(changes[0].revision_id, 1);
        assert_eq!(changes[1].type_string(), "wikibase-item~update");
        assert_eq!(changes[1].diff.op_count(), 1);
    }

    #[test]
    fn test_access_limit() {
        let mut store = InMemoryEntityStore::new();
        let q1 = store.save(berlin()).unwrap().entity_id;
        let q2 = store.save(berlin()).unwrap().entity_id;

        let mut limiter = EntityAccessLimiter::new(1);
        let mut lookup = LimitedEntityLookup::new(&store, &mut limiter);
        assert!(lookup.get(q1).unwrap().is_some());
        // Same entity again is free
        assert!(lookup.get(q1).unwrap().is_some());
        assert_eq!(
            lookup.get(q2),
            Err(StoreError::AccessLimitExceeded { limit: 1 })
        );
        assert_eq!(lookup.limiter().count(), 1);

        limiter.reset();
        assert_eq!(limiter.count(), 0);
    }
}
