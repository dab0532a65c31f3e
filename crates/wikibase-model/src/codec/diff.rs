//! Array form of diffs.
//!
//! ```text
//! {
//!   "type": "diff/item",
//!   "labels":       {"en": {"op": "change", "old": "cat", "new": "kitty"}},
//!   "descriptions": {"de": {"op": "add", "new": "Haustier"}},
//!   "aliases":      {"en": {"op": "remove", "old": ["kitty"]}},
//!   "claims":       {"Q1$...": {"op": "change", "old": <statement>, "new": <statement>}},
//!   "links":        {"enwiki": {"op": "add", "new": <sitelink>}}
//! }
//! ```
//!
//! Empty sections are omitted.

use serde_json::{json, Map, Value};

use crate::codec::{as_array, as_object, as_str, field, opt_field, type_tag, ArrayCodec};
use crate::diff::{DiffOp, EntityDiff, MapDiff};
use crate::error::{DecodeError, DiffSection};
use crate::model::{EntityType, SiteLink, Statement};

const TYPE_PREFIX: &str = "diff/";

/// Values that can appear inside a diff operation.
pub trait DiffValue: Sized {
    fn to_value(&self) -> Value;
    fn from_value(value: &Value) -> Result<Self, DecodeError>;
}

impl DiffValue for String {
    fn to_value(&self) -> Value {
        json!(self)
    }

    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        Ok(as_str(value, "term")?.to_string())
    }
}

impl DiffValue for Vec<String> {
    fn to_value(&self) -> Value {
        json!(self)
    }

    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        as_array(value, "aliases")?
            .iter()
            .map(|alias| Ok(as_str(alias, "alias")?.to_string()))
            .collect()
    }
}

impl DiffValue for SiteLink {
    fn to_value(&self) -> Value {
        self.to_array()
    }

    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        SiteLink::from_array(value)
    }
}

impl DiffValue for Statement {
    fn to_value(&self) -> Value {
        self.to_array()
    }

    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        Statement::from_array(value)
    }
}

fn op_to_array<T: DiffValue>(op: &DiffOp<T>) -> Value {
    let mut map = Map::new();
    map.insert("op".into(), json!(op.kind()));
    if let Some(old) = op.old_value() {
        map.insert("old".into(), old.to_value());
    }
    if let Some(new) = op.new_value() {
        map.insert("new".into(), new.to_value());
    }
    Value::Object(map)
}

fn op_from_array<T: DiffValue>(array: &Value) -> Result<DiffOp<T>, DecodeError> {
    let map = as_object(array, "diff op")?;
    let kind = as_str(field(map, "op")?, "op")?;
    let read = |key: &'static str| T::from_value(field(map, key)?);
    match kind {
        "add" => Ok(DiffOp::Add(read("new")?)),
        "remove" => Ok(DiffOp::Remove(read("old")?)),
        "change" => Ok(DiffOp::Change {
            old: read("old")?,
            new: read("new")?,
        }),
        other => Err(DecodeError::UnknownKind {
            field: "op",
            kind: other.to_string(),
        }),
    }
}

impl<T: DiffValue + Clone + PartialEq> ArrayCodec for MapDiff<T> {
    fn to_array(&self) -> Value {
        Value::Object(self.iter().map(|(key, op)| (key.to_string(), op_to_array(op))).collect())
    }

    fn from_array(array: &Value) -> Result<Self, DecodeError> {
        as_object(array, "diff")?
            .iter()
            .map(|(key, op)| Ok((key.clone(), op_from_array(op)?)))
            .collect()
    }
}

fn read_section<T: DiffValue + Clone + PartialEq>(map: &Map<String, Value>, section: DiffSection) -> Result<MapDiff<T>, DecodeError> {
    opt_field(map, section.as_str())
        .map(MapDiff::<T>::from_array)
        .transpose()
        .map(Option::unwrap_or_default)
}

impl ArrayCodec for EntityDiff {
    fn to_array(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".into(), json!(format!("{TYPE_PREFIX}{}", self.entity_type().as_str())));
        let sections = [
            (DiffSection::Labels, self.labels().to_array(), self.labels().is_empty()),
            (DiffSection::Descriptions, self.descriptions().to_array(), self.descriptions().is_empty()),
            (DiffSection::Aliases, self.aliases().to_array(), self.aliases().is_empty()),
            (DiffSection::Claims, self.claims().to_array(), self.claims().is_empty()),
            (DiffSection::SiteLinks, self.site_links().to_array(), self.site_links().is_empty()),
        ];
        for (section, array, empty) in sections {
            if !empty {
                map.insert(section.as_str().into(), array);
            }
        }
        Value::Object(map)
    }

    fn from_array(array: &Value) -> Result<Self, DecodeError> {
        let map = as_object(array, "diff")?;
        let tag = type_tag(map)?;
        let entity_type = tag
            .strip_prefix(TYPE_PREFIX)
            .and_then(EntityType::from_name)
            .ok_or_else(|| DecodeError::UnknownKind {
                field: "diff type",
                kind: tag.to_string(),
            })?;

        let mut diff = EntityDiff::new(entity_type);
        *diff.labels_mut() = read_section(map, DiffSection::Labels)?;
        *diff.descriptions_mut() = read_section(map, DiffSection::Descriptions)?;
        *diff.aliases_mut() = read_section(map, DiffSection::Aliases)?;
        *diff.claims_mut() = read_section(map, DiffSection::Claims)?;
        *diff.site_links_mut() = read_section(map, DiffSection::SiteLinks)?;
        if entity_type != EntityType::Item && !diff.site_links().is_empty() {
            return Err(DecodeError::invalid("links", "only item diffs carry site links"));
        }
        Ok(diff)
    }
}

crate::codec::serde_via_array!(EntityDiff);
