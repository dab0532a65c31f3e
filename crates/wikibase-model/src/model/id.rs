//! Typed entity identifiers.
//!
//! An entity id is a type prefix followed by a positive number: `Q42` for
//! items, `P7` for properties. Parsing is case-insensitive, formatting always
//! uses the upper-case prefix, and equality is equality of the serialization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ModelError;
use crate::limits::MAX_NUMERIC_ID;

/// The kinds of entities in the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityType {
    Item,
    Property,
}

impl EntityType {
    /// Returns the serialization prefix for this type.
    pub fn prefix(self) -> char {
        match self {
            EntityType::Item => 'Q',
            EntityType::Property => 'P',
        }
    }

    /// Returns the type name used in array structures.
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Item => "item",
            EntityType::Property => "property",
        }
    }

    /// Looks up a type by its array-structure name.
    pub fn from_name(name: &str) -> Option<EntityType> {
        match name {
            "item" => Some(EntityType::Item),
            "property" => Some(EntityType::Property),
            _ => None,
        }
    }

    fn from_prefix(c: char) -> Option<EntityType> {
        match c.to_ascii_uppercase() {
            'Q' => Some(EntityType::Item),
            'P' => Some(EntityType::Property),
            _ => None,
        }
    }
}

/// Identifier of an item (`Q<n>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u64);

/// Identifier of a property (`P<n>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(u64);

macro_rules! numeric_id {
    ($name:ident, $entity_type:expr) => {
        impl $name {
            /// Creates an id from its numeric part.
            pub fn new(numeric: u64) -> Result<Self, ModelError> {
                if numeric == 0 || numeric > MAX_NUMERIC_ID {
                    return Err(ModelError::MalformedEntityId {
                        id: format!("{}{}", $entity_type.prefix(), numeric),
                    });
                }
                Ok(Self(numeric))
            }

            /// Returns the numeric part.
            pub fn numeric(self) -> u64 {
                self.0
            }

            /// Returns the serialization (e.g. `Q42`).
            pub fn serialization(self) -> String {
                self.to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $entity_type.prefix(), self.0)
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let (entity_type, numeric) = parse_serialization(s)?;
                if entity_type != $entity_type {
                    return Err(ModelError::WrongEntityType {
                        id: s.to_string(),
                        expected: $entity_type.as_str(),
                    });
                }
                Ok(Self(numeric))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

numeric_id!(ItemId, EntityType::Item);
numeric_id!(PropertyId, EntityType::Property);

/// Identifier of any entity.
///
/// Ordering sorts items before properties, then by number, which keeps
/// `BTreeMap<EntityId, _>` iteration stable across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityId {
    Item(ItemId),
    Property(PropertyId),
}

impl EntityId {
    /// Returns the entity type this id refers to.
    pub fn entity_type(self) -> EntityType {
        match self {
            EntityId::Item(_) => EntityType::Item,
            EntityId::Property(_) => EntityType::Property,
        }
    }

    /// Returns the numeric part.
    pub fn numeric(self) -> u64 {
        match self {
            EntityId::Item(id) => id.numeric(),
            EntityId::Property(id) => id.numeric(),
        }
    }

    /// Returns the serialization (e.g. `Q42`).
    pub fn serialization(self) -> String {
        self.to_string()
    }

    /// Returns the item id, if this is one.
    pub fn as_item(self) -> Option<ItemId> {
        match self {
            EntityId::Item(id) => Some(id),
            EntityId::Property(_) => None,
        }
    }

    /// Returns the property id, if this is one.
    pub fn as_property(self) -> Option<PropertyId> {
        match self {
            EntityId::Property(id) => Some(id),
            EntityId::Item(_) => None,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Item(id) => id.fmt(f),
            EntityId::Property(id) => id.fmt(f),
        }
    }
}

impl FromStr for EntityId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (entity_type, numeric) = parse_serialization(s)?;
        Ok(match entity_type {
            EntityType::Item => EntityId::Item(ItemId(numeric)),
            EntityType::Property => EntityId::Property(PropertyId(numeric)),
        })
    }
}

impl From<ItemId> for EntityId {
    fn from(id: ItemId) -> Self {
        EntityId::Item(id)
    }
}

impl From<PropertyId> for EntityId {
    fn from(id: PropertyId) -> Self {
        EntityId::Property(id)
    }
}

impl TryFrom<EntityId> for PropertyId {
    type Error = ModelError;

    fn try_from(id: EntityId) -> Result<Self, Self::Error> {
        id.as_property().ok_or_else(|| ModelError::WrongEntityType {
            id: id.to_string(),
            expected: EntityType::Property.as_str(),
        })
    }
}

impl TryFrom<EntityId> for ItemId {
    type Error = ModelError;

    fn try_from(id: EntityId) -> Result<Self, Self::Error> {
        id.as_item().ok_or_else(|| ModelError::WrongEntityType {
            id: id.to_string(),
            expected: EntityType::Item.as_str(),
        })
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Splits `Q42` into its type and numeric part.
///
/// Leading zeros, zero, and numbers above [`MAX_NUMERIC_ID`] are rejected so
/// that every id has exactly one serialization.
fn parse_serialization(s: &str) -> Result<(EntityType, u64), ModelError> {
    let malformed = || ModelError::MalformedEntityId { id: s.to_string() };

    let mut chars = s.chars();
    let entity_type = chars
        .next()
        .and_then(EntityType::from_prefix)
        .ok_or_else(malformed)?;
    let digits = chars.as_str();

    if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let numeric: u64 = digits.parse().map_err(|_| malformed())?;
    if numeric > MAX_NUMERIC_ID {
        return Err(malformed());
    }
    Ok((entity_type, numeric))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_format() {
        let id: EntityId = "Q42".parse().unwrap();
        assert_eq!(id.entity_type(), EntityType::Item);
        assert_eq!(id.numeric(), 42);
        assert_eq!(id.to_string(), "Q42");

        let lower: EntityId = "p7".parse().unwrap();
        assert_eq!(lower.to_string(), "P7");
        assert_eq!(lower, EntityId::Property(PropertyId::new(7).unwrap()));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "Q", "Q0", "Q042", "X1", "Q-1", "Q1a", "Q 1", "Q2147483648"] {
            assert!(bad.parse::<EntityId>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_typed_parse_enforces_type() {
        assert!("P31".parse::<PropertyId>().is_ok());
        assert!(matches!(
            "Q31".parse::<PropertyId>(),
            Err(ModelError::WrongEntityType { expected: "property", .. })
        ));
        let item: EntityId = "Q5".parse().unwrap();
        assert!(PropertyId::try_from(item).is_err());
        assert_eq!(ItemId::try_from(item).unwrap().numeric(), 5);
    }

    #[test]
    fn test_ordering_is_stable() {
        let mut ids: Vec<EntityId> = ["P2", "Q10", "Q9", "P1"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        ids.sort();
        let rendered: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        assert_eq!(rendered, ["Q9", "Q10", "P1", "P2"]);
    }

    #[test]
    fn test_serde_as_string() {
        let id: EntityId = "Q64".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"Q64\"");
        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
