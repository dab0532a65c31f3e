//! References (sourcing snak groups) and reference lists.

use std::sync::OnceLock;

use crate::codec::canonical::content_hash;
use crate::model::{Snak, SnakList};

/// A group of snaks citing the source of a statement.
///
/// The hash is computed from the snaks in canonical order and memoized;
/// any mutation through this type drops the memoized value.
#[derive(Debug, Clone, Default)]
pub struct Reference {
    snaks: SnakList,
    hash: OnceLock<String>,
}

impl Reference {
    pub fn new(snaks: SnakList) -> Self {
        Self {
            snaks,
            hash: OnceLock::new(),
        }
    }

    pub fn snaks(&self) -> &SnakList {
        &self.snaks
    }

    /// Adds a snak. Returns true if the snak was not already present.
    pub fn add_snak(&mut self, snak: Snak) -> bool {
        let added = self.snaks.add_snak(snak);
        if added {
            self.hash = OnceLock::new();
        }
        added
    }

    /// Removes a snak. Returns true if it was present.
    pub fn remove_snak(&mut self, snak: &Snak) -> bool {
        let removed = self.snaks.remove_snak(snak);
        if removed {
            self.hash = OnceLock::new();
        }
        removed
    }

    pub fn is_empty(&self) -> bool {
        self.snaks.is_empty()
    }

    /// Returns the content hash, computing it on first access.
    pub fn hash(&self) -> &str {
        self.hash.get_or_init(|| content_hash(&self.snaks))
    }
}

impl PartialEq for Reference {
    fn eq(&self, other: &Self) -> bool {
        self.hash() == other.hash()
    }
}

impl FromIterator<Snak> for Reference {
    fn from_iter<I: IntoIterator<Item = Snak>>(iter: I) -> Self {
        Reference::new(iter.into_iter().collect())
    }
}

/// An ordered list of references, unique by hash.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReferenceList {
    references: Vec<Reference>,
}

impl ReferenceList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a reference unless one with the same hash is present.
    /// Returns true if added.
    pub fn add_reference(&mut self, reference: Reference) -> bool {
        if self.has_reference_hash(reference.hash()) {
            return false;
        }
        self.references.push(reference);
        true
    }

    /// Inserts a reference at `index`.
    ///
    /// An already-present reference with the same hash is moved to `index`,
    /// which is how references are reordered. Indexes past the end append.
    pub fn insert_reference(&mut self, reference: Reference, index: usize) {
        if let Some(existing) = self.index_of_hash(reference.hash()) {
            self.references.remove(existing);
        }
        let index = index.min(self.references.len());
        self.references.insert(index, reference);
    }

    pub fn has_reference_hash(&self, hash: &str) -> bool {
        self.index_of_hash(hash).is_some()
    }

    pub fn has_reference(&self, reference: &Reference) -> bool {
        self.has_reference_hash(reference.hash())
    }

    /// Returns the position of a reference with the same hash.
    pub fn index_of(&self, reference: &Reference) -> Option<usize> {
        self.index_of_hash(reference.hash())
    }

    pub fn index_of_hash(&self, hash: &str) -> Option<usize> {
        self.references.iter().position(|r| r.hash() == hash)
    }

    pub fn get_by_hash(&self, hash: &str) -> Option<&Reference> {
        self.references.iter().find(|r| r.hash() == hash)
    }

    /// Removes the reference with the given hash, returning it.
    pub fn remove_by_hash(&mut self, hash: &str) -> Option<Reference> {
        let index = self.index_of_hash(hash)?;
        Some(self.references.remove(index))
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Reference> {
        self.references.iter()
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// Returns the content hash of the list. Reference order is significant.
    pub fn hash(&self) -> String {
        content_hash(self)
    }
}

impl FromIterator<Reference> for ReferenceList {
    fn from_iter<I: IntoIterator<Item = Reference>>(iter: I) -> Self {
        let mut list = ReferenceList::new();
        for reference in iter {
            list.add_reference(reference);
        }
        list
    }
}

impl<'a> IntoIterator for &'a ReferenceList {
    type Item = &'a Reference;
    type IntoIter = std::slice::Iter<'a, Reference>;

    fn into_iter(self) -> Self::IntoIter {
        self.references.iter()
    }
}
