//! Array form of snaks, references, claims and statements.
//!
//! ```text
//! Snak:      ["novalue"|"somevalue"|"value", "P42", <datavalue>?]
//! Reference: [<snak>, ...]
//! Claim:     {"type": "claim", "m": <snak>, "q": [<snak>, ...], "g": <guid>|null}
//! Statement: Claim fields with "type": "statement", plus
//!            "rank": 0|1|2 and "refs": [<reference>, ...]
//! ```
//!
//! Qualifiers are written in insertion order so the array form round-trips
//! exactly; hashing applies its own canonical order.

use serde_json::{json, Map, Value};

use crate::codec::{
    as_array, as_i64, as_object, as_str, field, opt_field, type_tag, ArrayCodec,
};
use crate::error::DecodeError;
use crate::limits::MAX_GUID_LEN;
use crate::model::{
    AnyClaim, Claim, DataValue, PropertyId, Rank, Reference, ReferenceList, Snak, SnakList,
    SnakType, Statement,
};

// =============================================================================
// Snaks
// =============================================================================

impl ArrayCodec for Snak {
    fn to_array(&self) -> Value {
        let mut parts = vec![
            json!(self.snak_type().as_str()),
            json!(self.property_id().serialization()),
        ];
        if let Some(value) = self.data_value() {
            parts.push(value.to_array());
        }
        Value::Array(parts)
    }

    fn from_array(array: &Value) -> Result<Self, DecodeError> {
        let parts = as_array(array, "snak")?;
        let kind = as_str(parts.first().ok_or(DecodeError::MissingField { field: "snak type" })?, "snak type")?;
        let snak_type = SnakType::from_name(kind).ok_or_else(|| DecodeError::UnknownKind {
            field: "snak type",
            kind: kind.to_string(),
        })?;
        let property: PropertyId = as_str(
            parts.get(1).ok_or(DecodeError::MissingField { field: "snak property" })?,
            "snak property",
        )?
        .parse()?;

        let expected_len = if snak_type == SnakType::Value { 3 } else { 2 };
        if parts.len() > expected_len {
            return Err(DecodeError::invalid(
                "snak",
                format!("{} snak has {} elements", snak_type.as_str(), parts.len()),
            ));
        }

        Ok(match snak_type {
            SnakType::NoValue => Snak::no_value(property),
            SnakType::SomeValue => Snak::some_value(property),
            SnakType::Value => {
                let value = parts.get(2).ok_or(DecodeError::MissingField { field: "snak value" })?;
                Snak::value(property, DataValue::from_array(value)?)
            }
        })
    }
}

impl ArrayCodec for SnakList {
    fn to_array(&self) -> Value {
        Value::Array(self.iter().map(Snak::to_array).collect())
    }

    /// Duplicates in the input collapse, as with [`SnakList::add_snak`].
    fn from_array(array: &Value) -> Result<Self, DecodeError> {
        as_array(array, "snaks")?.iter().map(Snak::from_array).collect()
    }
}

impl ArrayCodec for Reference {
    fn to_array(&self) -> Value {
        self.snaks().to_array()
    }

    fn from_array(array: &Value) -> Result<Self, DecodeError> {
        Ok(Reference::new(SnakList::from_array(array)?))
    }
}

impl ArrayCodec for ReferenceList {
    fn to_array(&self) -> Value {
        Value::Array(self.iter().map(Reference::to_array).collect())
    }

    fn from_array(array: &Value) -> Result<Self, DecodeError> {
        as_array(array, "refs")?.iter().map(Reference::from_array).collect()
    }
}

// =============================================================================
// Claims and statements
// =============================================================================

fn claim_fields(claim: &Claim, kind: &'static str) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("type".into(), json!(kind));
    map.insert("m".into(), claim.main_snak().to_array());
    map.insert("q".into(), claim.qualifiers().to_array());
    map.insert("g".into(), json!(claim.guid()));
    map
}

fn read_claim(map: &Map<String, Value>) -> Result<Claim, DecodeError> {
    let main_snak = Snak::from_array(field(map, "m")?)?;
    let qualifiers = match opt_field(map, "q") {
        Some(q) => SnakList::from_array(q)?,
        None => SnakList::new(),
    };
    let mut claim = Claim::with_qualifiers(main_snak, qualifiers);
    if let Some(guid) = opt_field(map, "g") {
        let guid = as_str(guid, "g")?;
        if guid.len() > MAX_GUID_LEN {
            return Err(DecodeError::LengthExceedsLimit {
                field: "g",
                len: guid.len(),
                max: MAX_GUID_LEN,
            });
        }
        claim.set_guid(guid);
    }
    Ok(claim)
}

fn read_statement(map: &Map<String, Value>) -> Result<Statement, DecodeError> {
    let mut statement = Statement::from(read_claim(map)?);
    if let Some(rank) = opt_field(map, "rank") {
        statement.set_rank(Rank::try_from(as_i64(rank, "rank")?)?);
    }
    if let Some(refs) = opt_field(map, "refs") {
        statement.set_references(ReferenceList::from_array(refs)?);
    }
    Ok(statement)
}

impl ArrayCodec for Claim {
    fn to_array(&self) -> Value {
        Value::Object(claim_fields(self, "claim"))
    }

    /// Reads a plain claim. A statement array is rejected; use [`AnyClaim`]
    /// to accept either.
    fn from_array(array: &Value) -> Result<Self, DecodeError> {
        match AnyClaim::from_array(array)? {
            AnyClaim::Claim(claim) => Ok(claim),
            AnyClaim::Statement(_) => Err(DecodeError::invalid("type", "expected a claim, found a statement")),
        }
    }
}

impl ArrayCodec for Statement {
    fn to_array(&self) -> Value {
        let mut map = claim_fields(self.claim(), "statement");
        map.insert("rank".into(), json!(self.rank().as_u8()));
        map.insert("refs".into(), self.references().to_array());
        Value::Object(map)
    }

    /// Reads a statement. A plain claim array is accepted and promoted to a
    /// normal-rank statement without references.
    fn from_array(array: &Value) -> Result<Self, DecodeError> {
        Ok(match AnyClaim::from_array(array)? {
            AnyClaim::Claim(claim) => Statement::from(claim),
            AnyClaim::Statement(statement) => statement,
        })
    }
}

impl ArrayCodec for AnyClaim {
    fn to_array(&self) -> Value {
        match self {
            AnyClaim::Claim(claim) => claim.to_array(),
            AnyClaim::Statement(statement) => statement.to_array(),
        }
    }

    /// Dispatches on the explicit `"type"` tag.
    fn from_array(array: &Value) -> Result<Self, DecodeError> {
        let map = as_object(array, "claim")?;
        match type_tag(map)? {
            "claim" => Ok(AnyClaim::Claim(read_claim(map)?)),
            "statement" => Ok(AnyClaim::Statement(read_statement(map)?)),
            other => Err(DecodeError::UnknownKind {
                field: "claim type",
                kind: other.to_string(),
            }),
        }
    }
}

crate::codec::serde_via_array!(Snak, SnakList, Reference, ReferenceList, Claim, Statement, AnyClaim);

#[cfg(test)]
mod tests {
    use super::*;

    fn p(n: u64) -> PropertyId {
        PropertyId::new(n).unwrap()
    }

    fn sample_statement() -> Statement {
        let mut statement = Statement::new(Snak::value(p(31), DataValue::string("city")));
        statement.qualifiers_mut().add_snak(Snak::some_value(p(580)));
        statement.qualifiers_mut().add_snak(Snak::no_value(p(17)));
        statement.add_reference([Snak::value(p(854), DataValue::string("https://example.org"))].into_iter().collect());
        statement.set_rank(Rank::Preferred);
        statement.set_guid("Q64$5D2C7AF6-9A8A-4C44-9D1B-24D1F5A1C3E0");
        statement
    }

    #[test]
    fn test_snak_shapes() {
        assert_eq!(Snak::no_value(p(42)).to_array(), json!(["novalue", "P42"]));
        assert_eq!(
            Snak::value(p(10), DataValue::string("a kitten!")).to_array(),
            json!(["value", "P10", {"type": "string", "value": "a kitten!"}])
        );
    }

    #[test]
    fn test_snak_decode_errors() {
        assert!(matches!(
            Snak::from_array(&json!(["value", "P1"])),
            Err(DecodeError::MissingField { field: "snak value" })
        ));
        assert!(matches!(
            Snak::from_array(&json!(["novalue", "Q1"])),
            Err(DecodeError::Model(_))
        ));
        assert!(matches!(
            Snak::from_array(&json!(["whatever", "P1"])),
            Err(DecodeError::UnknownKind { .. })
        ));
        assert!(Snak::from_array(&json!(["novalue", "P1", {"type": "string", "value": "x"}])).is_err());
    }

    #[test]
    fn test_statement_roundtrip_keeps_hash_and_guid() {
        let statement = sample_statement();
        let back = Statement::from_array(&statement.to_array()).unwrap();
        assert_eq!(back, statement);
        assert_eq!(back.hash(), statement.hash());
        assert_eq!(back.guid(), statement.guid());
        assert_eq!(back.qualifiers().snaks(), statement.qualifiers().snaks());
    }

    #[test]
    fn test_claim_shape() {
        let mut claim = Claim::new(Snak::no_value(p(42)));
        claim.set_guid("X");
        assert_eq!(
            claim.to_array(),
            json!({"type": "claim", "m": ["novalue", "P42"], "q": [], "g": "X"})
        );
    }

    #[test]
    fn test_dispatch_by_type_tag() {
        let claim = Claim::new(Snak::no_value(p(1)));
        let statement = sample_statement();

        assert!(matches!(AnyClaim::from_array(&claim.to_array()).unwrap(), AnyClaim::Claim(_)));
        assert!(matches!(AnyClaim::from_array(&statement.to_array()).unwrap(), AnyClaim::Statement(_)));
        assert!(Claim::from_array(&statement.to_array()).is_err());
        assert_eq!(Statement::from_array(&claim.to_array()).unwrap().rank(), Rank::Normal);

        let untagged = json!({"m": ["novalue", "P1"], "rank": 1});
        assert_eq!(
            AnyClaim::from_array(&untagged).unwrap_err(),
            DecodeError::MissingField { field: "type" }
        );
    }

    #[test]
    fn test_invalid_rank_rejected() {
        let mut array = sample_statement().to_array();
        array["rank"] = json!(9001);
        assert_eq!(
            Statement::from_array(&array).unwrap_err(),
            DecodeError::Model(crate::error::ModelError::InvalidRank { value: 9001 })
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let statement = sample_statement();
        let text = serde_json::to_string(&statement).unwrap();
        let back: Statement = serde_json::from_str(&text).unwrap();
        assert_eq!(back.hash(), statement.hash());
    }
}
