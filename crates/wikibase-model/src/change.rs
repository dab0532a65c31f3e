//! Change notifications.
//!
//! A [`Change`] wraps the diff of one saved edit together with the entity
//! id, the kind of edit and the revision it produced. Changes are handed to
//! a [`ChangeTransmitter`], which propagates them to subscribers.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diff::EntityDiff;
use crate::error::ModelError;
use crate::model::{Entity, EntityDocument, EntityId, Item, Property};

/// The kind of edit a change records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Add,
    Update,
    Remove,
    Restore,
}

impl ChangeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeAction::Add => "add",
            ChangeAction::Update => "update",
            ChangeAction::Remove => "remove",
            ChangeAction::Restore => "restore",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One saved edit of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub entity_id: EntityId,
    pub action: ChangeAction,
    pub revision_id: u64,
    /// Microseconds since the Unix epoch.
    pub timestamp: i64,
    pub diff: EntityDiff,
}

impl Change {
    pub fn new(entity_id: EntityId, action: ChangeAction, revision_id: u64, timestamp: i64, diff: EntityDiff) -> Self {
        Self {
            entity_id,
            action,
            revision_id,
            timestamp,
            diff,
        }
    }

    /// Builds a change from the entity before and after an edit.
    ///
    /// A missing `old` makes an add, a missing `new` a removal. The id is
    /// taken from whichever snapshot has one.
    pub fn from_snapshots(
        old: Option<&Entity>,
        new: Option<&Entity>,
        revision_id: u64,
        timestamp: i64,
    ) -> Result<Self, ModelError> {
        let (action, diff, id) = match (old, new) {
            (Some(old), Some(new)) => (
                ChangeAction::Update,
                EntityDiff::between(old, new)?,
                new.entity_id().or(old.entity_id()),
            ),
            (None, Some(new)) => (ChangeAction::Add, EntityDiff::between(&empty_like(new), new)?, new.entity_id()),
            (Some(old), None) => (ChangeAction::Remove, EntityDiff::between(old, &empty_like(old))?, old.entity_id()),
            (None, None) => return Err(ModelError::MissingEntity),
        };
        let entity_id = id.ok_or(ModelError::MissingEntityId)?;
        Ok(Self::new(entity_id, action, revision_id, timestamp, diff))
    }

    /// Returns the change type, e.g. `wikibase-item~update`.
    pub fn type_string(&self) -> String {
        format!("wikibase-{}~{}", self.entity_id.entity_type().as_str(), self.action)
    }
}

fn empty_like(entity: &Entity) -> Entity {
    match entity {
        Entity::Item(_) => Entity::Item(Item::new_empty()),
        Entity::Property(property) => Entity::Property(Property::new_empty(property.data_type_id())),
    }
}

/// Returns the current time in microseconds since the Unix epoch.
pub fn timestamp_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as i64)
        .unwrap_or(0)
}

/// Propagates changes to subscribers.
pub trait ChangeTransmitter {
    fn transmit_change(&mut self, change: &Change);
}

/// Keeps every transmitted change, in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingChangeTransmitter {
    changes: Vec<Change>,
}

impl RecordingChangeTransmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Removes and returns the recorded changes.
    pub fn take(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.changes)
    }
}

impl ChangeTransmitter for RecordingChangeTransmitter {
    fn transmit_change(&mut self, change: &Change) {
        debug!(change = %change.type_string(), revision = change.revision_id, "recorded change");
        self.changes.push(change.clone());
    }
}
