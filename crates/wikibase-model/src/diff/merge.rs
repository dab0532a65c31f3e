//! Three-way merge of concurrent edits.
//!
//! Two diffs against the same base merge when no key carries different
//! operations on the two sides. An identical operation on both sides is a
//! benign overlap and kept once.

use tracing::{debug, warn};

use crate::diff::entity::EntityDiff;
use crate::diff::map::MapDiff;
use crate::error::{DiffSection, MergeConflict, MergeError, ModelError};
use crate::model::Entity;

fn merge_section<T: Clone + PartialEq>(
    section: DiffSection,
    ours: &MapDiff<T>,
    theirs: &MapDiff<T>,
) -> Result<MapDiff<T>, MergeConflict> {
    let mut merged = ours.clone();
    for (key, op) in theirs.iter() {
        match ours.get(key) {
            Some(existing) if existing == op => {
                debug!(section = section.as_str(), key, "identical operation on both sides");
            }
            Some(_) => {
                warn!(section = section.as_str(), key, "edit conflict");
                return Err(MergeConflict {
                    section,
                    key: key.to_string(),
                });
            }
            None => merged.insert(key, op.clone()),
        }
    }
    Ok(merged)
}

/// Combines two diffs computed against the same base.
///
/// Both diffs must be of the same entity type.
pub fn merge_diffs(ours: &EntityDiff, theirs: &EntityDiff) -> Result<EntityDiff, MergeError> {
    if ours.entity_type() != theirs.entity_type() {
        return Err(ModelError::EntityTypeMismatch {
            expected: ours.entity_type().as_str(),
            found: theirs.entity_type().as_str(),
        }
        .into());
    }
    let mut merged = EntityDiff::new(ours.entity_type());
    *merged.labels_mut() = merge_section(DiffSection::Labels, ours.labels(), theirs.labels())?;
    *merged.descriptions_mut() =
        merge_section(DiffSection::Descriptions, ours.descriptions(), theirs.descriptions())?;
    *merged.aliases_mut() = merge_section(DiffSection::Aliases, ours.aliases(), theirs.aliases())?;
    *merged.claims_mut() = merge_section(DiffSection::Claims, ours.claims(), theirs.claims())?;
    *merged.site_links_mut() =
        merge_section(DiffSection::SiteLinks, ours.site_links(), theirs.site_links())?;
    Ok(merged)
}

/// Rebases a submitted edit onto the current revision.
///
/// `submitted` was made against `base`; meanwhile `base` became `current`.
/// Returns `current` with the submitted changes applied, or the first
/// conflicting key.
pub fn resolve_edit_conflict(base: &Entity, current: &Entity, submitted: &Entity) -> Result<Entity, MergeError> {
    let theirs = EntityDiff::between(base, current)?;
    let ours = EntityDiff::between(base, submitted)?;
    let merged = merge_diffs(&ours, &theirs)?;

    let mut resolved = base.copy();
    merged.apply(&mut resolved)?;
    debug!(
        ours = ours.op_count(),
        theirs = theirs.op_count(),
        "resolved edit conflict"
    );
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::map::DiffOp;
    use crate::model::{EntityDocument, EntityType, Item, SiteLink};

    fn base() -> Entity {
        let mut item = Item::new_empty();
        item.fingerprint_mut().set_label("en", "Berlin").unwrap();
        Entity::from(item)
    }

    #[test]
    fn test_disjoint_edits_merge() {
        let base = base();
        let mut current = base.copy();
        current.fingerprint_mut().set_label("de", "Berlin").unwrap();
        let mut submitted = base.copy();
        submitted.fingerprint_mut().set_description("en", "capital of Germany").unwrap();

        let resolved = resolve_edit_conflict(&base, &current, &submitted).unwrap();
        assert_eq!(resolved.fingerprint().label("de"), Some("Berlin"));
        assert_eq!(resolved.fingerprint().description("en"), Some("capital of Germany"));
    }

    #[test]
    fn test_same_key_conflicts() {
        let base = base();
        let mut current = base.copy();
        current.fingerprint_mut().set_label("en", "Berlin, Germany").unwrap();
        let mut submitted = base.copy();
        submitted.fingerprint_mut().set_label("en", "City of Berlin").unwrap();

        let err = resolve_edit_conflict(&base, &current, &submitted).unwrap_err();
        assert_eq!(
            err,
            MergeError::Conflict(MergeConflict {
                section: DiffSection::Labels,
                key: "en".to_string()
            })
        );
    }

    #[test]
    fn test_identical_edits_are_benign() {
        let mut ours = EntityDiff::new(EntityType::Item);
        ours.site_links_mut()
            .insert("enwiki", DiffOp::Add(SiteLink::new("enwiki", "Berlin").unwrap()));
        let theirs = ours.clone();

        let merged = merge_diffs(&ours, &theirs).unwrap();
        assert_eq!(merged, ours);
    }

    #[test]
    fn test_mixed_entity_types_rejected() {
        let ours = EntityDiff::new(EntityType::Item);
        let theirs = EntityDiff::new(EntityType::Property);

        assert_eq!(
            merge_diffs(&ours, &theirs),
            Err(MergeError::Model(ModelError::EntityTypeMismatch {
                expected: "item",
                found: "property",
            }))
        );
    }
}
