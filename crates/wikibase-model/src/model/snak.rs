//! Snaks: single property-value assertions, and ordered snak sets.

use rustc_hash::FxHashSet;

use crate::codec::canonical::content_hash;
use crate::model::{DataValue, PropertyId};

/// The three kinds of snak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnakType {
    NoValue,
    SomeValue,
    Value,
}

impl SnakType {
    /// Returns the name used in array structures.
    pub fn as_str(self) -> &'static str {
        match self {
            SnakType::NoValue => "novalue",
            SnakType::SomeValue => "somevalue",
            SnakType::Value => "value",
        }
    }

    /// Looks up a snak type by name.
    pub fn from_name(name: &str) -> Option<SnakType> {
        match name {
            "novalue" => Some(SnakType::NoValue),
            "somevalue" => Some(SnakType::SomeValue),
            "value" => Some(SnakType::Value),
            _ => None,
        }
    }
}

/// A property-value assertion.
///
/// The property is always a [`PropertyId`]; non-property ids cannot be
/// represented.
#[derive(Debug, Clone, PartialEq)]
pub enum Snak {
    /// The property has no value.
    NoValue { property: PropertyId },
    /// The property has a value that is not known.
    SomeValue { property: PropertyId },
    /// The property has the given value.
    Value {
        property: PropertyId,
        value: DataValue,
    },
}

impl Snak {
    pub fn no_value(property: PropertyId) -> Self {
        Snak::NoValue { property }
    }

    pub fn some_value(property: PropertyId) -> Self {
        Snak::SomeValue { property }
    }

    pub fn value(property: PropertyId, value: DataValue) -> Self {
        Snak::Value { property, value }
    }

    /// Returns the property this snak is about.
    pub fn property_id(&self) -> PropertyId {
        match self {
            Snak::NoValue { property } | Snak::SomeValue { property } | Snak::Value { property, .. } => {
                *property
            }
        }
    }

    /// Returns the kind of snak.
    pub fn snak_type(&self) -> SnakType {
        match self {
            Snak::NoValue { .. } => SnakType::NoValue,
            Snak::SomeValue { .. } => SnakType::SomeValue,
            Snak::Value { .. } => SnakType::Value,
        }
    }

    /// Returns the data value of a value snak.
    pub fn data_value(&self) -> Option<&DataValue> {
        match self {
            Snak::Value { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Returns the content hash of this snak.
    pub fn hash(&self) -> String {
        content_hash(self)
    }
}

/// An ordered list of snaks with set semantics.
///
/// Insertion order is preserved; adding a snak equal to one already present
/// is a no-op.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SnakList {
    snaks: Vec<Snak>,
}

impl SnakList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a snak unless an equal one is present. Returns true if added.
    pub fn add_snak(&mut self, snak: Snak) -> bool {
        if self.has_snak(&snak) {
            return false;
        }
        self.snaks.push(snak);
        true
    }

    /// Returns true if a structurally equal snak is present.
    pub fn has_snak(&self, snak: &Snak) -> bool {
        self.snaks.iter().any(|s| s == snak)
    }

    /// Removes a structurally equal snak. Returns true if one was removed.
    pub fn remove_snak(&mut self, snak: &Snak) -> bool {
        match self.snaks.iter().position(|s| s == snak) {
            Some(index) => {
                self.snaks.remove(index);
                true
            }
            None => false,
        }
    }

    /// Returns the snaks in insertion order.
    pub fn snaks(&self) -> &[Snak] {
        &self.snaks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Snak> {
        self.snaks.iter()
    }

    pub fn len(&self) -> usize {
        self.snaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snaks.is_empty()
    }

    /// Returns the distinct property ids in first-seen order.
    pub fn property_ids(&self) -> Vec<PropertyId> {
        let mut seen = FxHashSet::default();
        self.snaks
            .iter()
            .map(Snak::property_id)
            .filter(|p| seen.insert(*p))
            .collect()
    }

    /// Returns the snaks grouped by property, groups sorted by the property
    /// id's serialization, insertion order kept inside each group.
    ///
    /// This is the order hashing uses, so two lists that differ only in how
    /// snaks of different properties were interleaved hash identically.
    pub fn canonical_order(&self) -> Vec<&Snak> {
        let mut keyed: Vec<(String, &Snak)> = self
            .snaks
            .iter()
            .map(|s| (s.property_id().to_string(), s))
            .collect();
        // Stable sort keeps the within-group order.
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        keyed.into_iter().map(|(_, s)| s).collect()
    }

    /// Returns the content hash of the list in canonical order.
    pub fn hash(&self) -> String {
        content_hash(self)
    }
}

impl FromIterator<Snak> for SnakList {
    fn from_iter<I: IntoIterator<Item = Snak>>(iter: I) -> Self {
        let mut list = SnakList::new();
        for snak in iter {
            list.add_snak(snak);
        }
        list
    }
}

impl<'a> IntoIterator for &'a SnakList {
    type Item = &'a Snak;
    type IntoIter = std::slice::Iter<'a, Snak>;

    fn into_iter(self) -> Self::IntoIter {
        self.snaks.iter()
    }
}
