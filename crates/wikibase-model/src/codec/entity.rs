//! Array form of fingerprints, site links and entities.
//!
//! ```text
//! {
//!   "type": "item" | "property",
//!   "id": "Q64" | null,
//!   "datatype": "wikibase-item",            (properties only)
//!   "labels": {"en": "Berlin", ...},
//!   "descriptions": {"en": "...", ...},
//!   "aliases": {"en": ["...", ...], ...},
//!   "claims": [<statement>, ...],
//!   "sitelinks": {"enwiki": {"title": "Berlin", "badges": ["Q17437796"]}}   (items only)
//! }
//! ```
//!
//! Object keys come out sorted, so the serialized form of an entity does not
//! depend on the order its terms or site links were added in.

use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use crate::codec::{as_array, as_object, as_str, field, opt_field, str_field, type_tag, ArrayCodec};
use crate::error::DecodeError;
use crate::model::{
    AliasGroupList, Entity, EntityDocument, EntityId, EntityType, Fingerprint, Item, ItemId,
    Property, SiteLink, SiteLinkList, Statement, StatementList, TermList,
};

// =============================================================================
// Terms
// =============================================================================

impl ArrayCodec for TermList {
    fn to_array(&self) -> Value {
        Value::Object(self.iter().map(|(language, text)| (language.to_string(), json!(text))).collect())
    }

    fn from_array(array: &Value) -> Result<Self, DecodeError> {
        let mut terms = TermList::new();
        for (language, text) in as_object(array, "terms")? {
            terms.set(language.as_str(), as_str(text, "term")?)?;
        }
        Ok(terms)
    }
}

impl ArrayCodec for AliasGroupList {
    fn to_array(&self) -> Value {
        Value::Object(
            self.iter()
                .map(|(language, aliases)| (language.to_string(), json!(aliases)))
                .collect(),
        )
    }

    fn from_array(array: &Value) -> Result<Self, DecodeError> {
        let mut groups = AliasGroupList::new();
        for (language, aliases) in as_object(array, "aliases")? {
            let aliases = as_array(aliases, "aliases")?
                .iter()
                .map(|alias| as_str(alias, "alias"))
                .collect::<Result<Vec<_>, _>>()?;
            groups.set(language.as_str(), aliases)?;
        }
        Ok(groups)
    }
}

impl ArrayCodec for Fingerprint {
    fn to_array(&self) -> Value {
        Value::Object(fingerprint_fields(self))
    }

    fn from_array(array: &Value) -> Result<Self, DecodeError> {
        read_fingerprint(as_object(array, "fingerprint")?)
    }
}

fn fingerprint_fields(fingerprint: &Fingerprint) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("labels".into(), fingerprint.labels().to_array());
    map.insert("descriptions".into(), fingerprint.descriptions().to_array());
    map.insert("aliases".into(), fingerprint.alias_groups().to_array());
    map
}

fn read_fingerprint(map: &Map<String, Value>) -> Result<Fingerprint, DecodeError> {
    let labels = opt_field(map, "labels").map(TermList::from_array).transpose()?;
    let descriptions = opt_field(map, "descriptions").map(TermList::from_array).transpose()?;
    let aliases = opt_field(map, "aliases").map(AliasGroupList::from_array).transpose()?;
    Ok(Fingerprint::from_parts(
        labels.unwrap_or_default(),
        descriptions.unwrap_or_default(),
        aliases.unwrap_or_default(),
    ))
}

// =============================================================================
// Site links
// =============================================================================

impl ArrayCodec for SiteLink {
    /// Inside a [`SiteLinkList`] the site id becomes the object key and is
    /// dropped from the entry.
    fn to_array(&self) -> Value {
        let badges: Vec<String> = self.badges().iter().map(|b| b.serialization()).collect();
        json!({
            "site": self.site_id(),
            "title": self.page_name(),
            "badges": badges,
        })
    }

    fn from_array(array: &Value) -> Result<Self, DecodeError> {
        let map = as_object(array, "sitelink")?;
        read_site_link(str_field(map, "site")?, map)
    }
}

fn read_site_link(site_id: &str, map: &Map<String, Value>) -> Result<SiteLink, DecodeError> {
    let badges = match opt_field(map, "badges") {
        Some(badges) => as_array(badges, "badges")?
            .iter()
            .map(|badge| Ok(as_str(badge, "badge")?.parse::<ItemId>()?))
            .collect::<Result<Vec<_>, DecodeError>>()?,
        None => Vec::new(),
    };
    Ok(SiteLink::with_badges(site_id, str_field(map, "title")?, badges)?)
}

impl ArrayCodec for SiteLinkList {
    fn to_array(&self) -> Value {
        Value::Object(
            self.iter()
                .map(|link| {
                    let mut entry = link.to_array();
                    if let Some(obj) = entry.as_object_mut() {
                        obj.remove("site");
                    }
                    (link.site_id().to_string(), entry)
                })
                .collect(),
        )
    }

    fn from_array(array: &Value) -> Result<Self, DecodeError> {
        let mut links = SiteLinkList::new();
        for (site_id, entry) in as_object(array, "sitelinks")? {
            links.add(read_site_link(site_id, as_object(entry, "sitelink")?)?)?;
        }
        Ok(links)
    }
}

// =============================================================================
// Entities
// =============================================================================

fn statements_to_array(statements: &StatementList) -> Value {
    Value::Array(statements.iter().map(Statement::to_array).collect())
}

fn read_statements(map: &Map<String, Value>) -> Result<StatementList, DecodeError> {
    match opt_field(map, "claims") {
        Some(claims) => as_array(claims, "claims")?.iter().map(Statement::from_array).collect(),
        None => Ok(StatementList::new()),
    }
}

fn entity_fields(entity: &dyn EntityDocument) -> Map<String, Value> {
    let mut map = fingerprint_fields(entity.fingerprint());
    map.insert("type".into(), json!(entity.entity_type().as_str()));
    map.insert("id".into(), json!(entity.entity_id().map(EntityId::serialization)));
    map.insert("claims".into(), statements_to_array(entity.statements()));
    map
}

/// Reads the id, checking that it has the expected type.
fn read_id(map: &Map<String, Value>, expected: EntityType) -> Result<Option<EntityId>, DecodeError> {
    let Some(id) = opt_field(map, "id") else {
        return Ok(None);
    };
    let id: EntityId = as_str(id, "id")?.parse()?;
    if id.entity_type() != expected {
        return Err(DecodeError::invalid("id", format!("{id} is not a {} id", expected.as_str())));
    }
    Ok(Some(id))
}

fn read_item(map: &Map<String, Value>) -> Result<Item, DecodeError> {
    let mut item = Item::new_empty();
    if let Some(id) = read_id(map, EntityType::Item)?.and_then(EntityId::as_item) {
        item.set_id(id)?;
    }
    item.set_fingerprint(read_fingerprint(map)?);
    // Statements are restored as stored; GUID ownership is left to validation.
    item.set_statements(read_statements(map)?);
    if let Some(links) = opt_field(map, "sitelinks") {
        *item.site_links_mut() = SiteLinkList::from_array(links)?;
    }
    Ok(item)
}

fn read_property(map: &Map<String, Value>) -> Result<Property, DecodeError> {
    let mut property = Property::new_empty(str_field(map, "datatype")?);
    if let Some(id) = read_id(map, EntityType::Property)?.and_then(EntityId::as_property) {
        property.set_id(id)?;
    }
    property.set_fingerprint(read_fingerprint(map)?);
    property.set_statements(read_statements(map)?);
    Ok(property)
}

fn check_type(map: &Map<String, Value>, expected: EntityType) -> Result<(), DecodeError> {
    let found = type_tag(map)?;
    if found != expected.as_str() {
        return Err(DecodeError::invalid("type", format!("expected {}, found {found}", expected.as_str())));
    }
    Ok(())
}

impl ArrayCodec for Item {
    fn to_array(&self) -> Value {
        let mut map = entity_fields(self);
        map.insert("sitelinks".into(), self.site_links().to_array());
        Value::Object(map)
    }

    fn from_array(array: &Value) -> Result<Self, DecodeError> {
        let map = as_object(array, "entity")?;
        check_type(map, EntityType::Item)?;
        read_item(map)
    }
}

impl ArrayCodec for Property {
    fn to_array(&self) -> Value {
        let mut map = entity_fields(self);
        map.insert("datatype".into(), json!(self.data_type_id()));
        Value::Object(map)
    }

    fn from_array(array: &Value) -> Result<Self, DecodeError> {
        let map = as_object(array, "entity")?;
        check_type(map, EntityType::Property)?;
        read_property(map)
    }
}

impl ArrayCodec for Entity {
    fn to_array(&self) -> Value {
        match self {
            Entity::Item(item) => item.to_array(),
            Entity::Property(property) => property.to_array(),
        }
    }

    fn from_array(array: &Value) -> Result<Self, DecodeError> {
        let map = as_object(array, "entity")?;
        let kind = type_tag(map)?;
        match EntityType::from_name(kind) {
            Some(EntityType::Item) => Ok(Entity::Item(read_item(map)?)),
            Some(EntityType::Property) => Ok(Entity::Property(read_property(map)?)),
            None => Err(DecodeError::UnknownKind {
                field: "entity type",
                kind: kind.to_string(),
            }),
        }
    }
}

crate::codec::serde_via_array!(TermList, AliasGroupList, Fingerprint, SiteLink, SiteLinkList, Item, Property, Entity);

/// Returns the SHA-256 hash of the entity's serialized array form.
pub fn entity_hash(entity: &Entity) -> String {
    let serialized = entity.to_array().to_string();
    hex::encode(Sha256::digest(serialized.as_bytes()))
}
