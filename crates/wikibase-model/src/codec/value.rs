//! Array form of data values.
//!
//! Every value is `{"type": <name>, "value": <payload>}`:
//!
//! | type                | payload                                                    |
//! |---------------------|------------------------------------------------------------|
//! | `string`            | the string                                                 |
//! | `monolingualtext`   | `{text, language}`                                         |
//! | `quantity`          | `{amount, unit, upperBound?, lowerBound?}`                 |
//! | `time`              | `{time, timezone, before, after, precision, calendarmodel}`|
//! | `globecoordinate`   | `{latitude, longitude, altitude, precision, globe}`        |
//! | `wikibase-entityid` | `{entity-type, numeric-id, id}`                            |

use serde_json::{json, Map, Value};

use crate::codec::{
    as_f64, as_object, as_str, field, int_field, opt_field, str_field, type_tag, ArrayCodec,
};
use crate::error::DecodeError;
use crate::model::{DataValue, DataValueType, EntityId, EntityType};

impl ArrayCodec for DataValue {
    fn to_array(&self) -> Value {
        let payload = match self {
            DataValue::String(s) => json!(s),
            DataValue::MonolingualText { text, language } => json!({
                "text": text,
                "language": language,
            }),
            DataValue::Quantity {
                amount,
                unit,
                upper_bound,
                lower_bound,
            } => {
                let mut map = Map::new();
                map.insert("amount".into(), json!(amount));
                map.insert("unit".into(), json!(unit));
                if let Some(upper) = upper_bound {
                    map.insert("upperBound".into(), json!(upper));
                }
                if let Some(lower) = lower_bound {
                    map.insert("lowerBound".into(), json!(lower));
                }
                Value::Object(map)
            }
            DataValue::Time {
                time,
                timezone,
                before,
                after,
                precision,
                calendar_model,
            } => json!({
                "time": time,
                "timezone": timezone,
                "before": before,
                "after": after,
                "precision": precision,
                "calendarmodel": calendar_model,
            }),
            DataValue::GlobeCoordinate {
                latitude,
                longitude,
                altitude,
                precision,
                globe,
            } => json!({
                "latitude": latitude,
                "longitude": longitude,
                "altitude": altitude,
                "precision": precision,
                "globe": globe,
            }),
            DataValue::EntityId(id) => json!({
                "entity-type": id.entity_type().as_str(),
                "numeric-id": id.numeric(),
                "id": id.serialization(),
            }),
        };
        json!({
            "type": self.value_type().as_str(),
            "value": payload,
        })
    }

    fn from_array(array: &Value) -> Result<Self, DecodeError> {
        let map = as_object(array, "datavalue")?;
        let name = type_tag(map)?;
        let value_type = DataValueType::from_name(name).ok_or_else(|| DecodeError::UnknownKind {
            field: "datavalue type",
            kind: name.to_string(),
        })?;
        let payload = field(map, "value")?;

        match value_type {
            DataValueType::String => Ok(DataValue::String(as_str(payload, "value")?.to_string())),
            DataValueType::MonolingualText => {
                let p = as_object(payload, "value")?;
                Ok(DataValue::MonolingualText {
                    text: str_field(p, "text")?.to_string(),
                    language: str_field(p, "language")?.to_string(),
                })
            }
            DataValueType::Quantity => {
                let p = as_object(payload, "value")?;
                Ok(DataValue::Quantity {
                    amount: str_field(p, "amount")?.to_string(),
                    unit: str_field(p, "unit")?.to_string(),
                    upper_bound: opt_string(p, "upperBound")?,
                    lower_bound: opt_string(p, "lowerBound")?,
                })
            }
            DataValueType::Time => {
                let p = as_object(payload, "value")?;
                Ok(DataValue::Time {
                    time: str_field(p, "time")?.to_string(),
                    timezone: int_field(p, "timezone")?,
                    before: int_field(p, "before")?,
                    after: int_field(p, "after")?,
                    precision: int_field(p, "precision")?,
                    calendar_model: str_field(p, "calendarmodel")?.to_string(),
                })
            }
            DataValueType::GlobeCoordinate => {
                let p = as_object(payload, "value")?;
                Ok(DataValue::GlobeCoordinate {
                    latitude: as_f64(field(p, "latitude")?, "latitude")?,
                    longitude: as_f64(field(p, "longitude")?, "longitude")?,
                    altitude: opt_f64(p, "altitude")?,
                    precision: opt_f64(p, "precision")?,
                    globe: str_field(p, "globe")?.to_string(),
                })
            }
            DataValueType::EntityId => decode_entity_id_value(as_object(payload, "value")?),
        }
    }
}

crate::codec::serde_via_array!(DataValue);

/// Reads a `wikibase-entityid` payload.
///
/// `id` wins when present; older payloads only carry the type and the
/// numeric id, and both must agree when both are given.
fn decode_entity_id_value(p: &Map<String, Value>) -> Result<DataValue, DecodeError> {
    let from_parts = match (opt_field(p, "entity-type"), opt_field(p, "numeric-id")) {
        (Some(kind), Some(numeric)) => {
            let kind = as_str(kind, "entity-type")?;
            let entity_type = EntityType::from_name(kind).ok_or_else(|| DecodeError::UnknownKind {
                field: "entity-type",
                kind: kind.to_string(),
            })?;
            let numeric = numeric
                .as_u64()
                .ok_or_else(|| DecodeError::invalid("numeric-id", "expected a positive integer"))?;
            let id: EntityId = format!("{}{}", entity_type.prefix(), numeric).parse()?;
            Some(id)
        }
        _ => None,
    };

    let id = match (opt_field(p, "id"), from_parts) {
        (Some(id), parts) => {
            let id: EntityId = as_str(id, "id")?.parse()?;
            if parts.is_some_and(|parts| parts != id) {
                return Err(DecodeError::invalid("id", "does not match entity-type and numeric-id"));
            }
            id
        }
        (None, Some(parts)) => parts,
        (None, None) => return Err(DecodeError::MissingField { field: "id" }),
    };
    Ok(DataValue::EntityId(id))
}

fn opt_string(map: &Map<String, Value>, key: &'static str) -> Result<Option<String>, DecodeError> {
    opt_field(map, key)
        .map(|v| as_str(v, key).map(str::to_string))
        .transpose()
}

fn opt_f64(map: &Map<String, Value>, key: &'static str) -> Result<Option<f64>, DecodeError> {
    opt_field(map, key).map(|v| as_f64(v, key)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemId, value::GREGORIAN_CALENDAR};

    #[test]
    fn test_string_value_shape() {
        let value = DataValue::string("a kitten!");
        assert_eq!(value.to_array(), json!({"type": "string", "value": "a kitten!"}));
    }

    #[test]
    fn test_quantity_omits_absent_bounds() {
        let array = DataValue::quantity("+5").to_array();
        assert_eq!(array, json!({"type": "quantity", "value": {"amount": "+5", "unit": "1"}}));
        assert_eq!(DataValue::from_array(&array).unwrap(), DataValue::quantity("+5"));
    }

    #[test]
    fn test_time_roundtrip() {
        let value = DataValue::Time {
            time: "+1952-03-11T00:00:00Z".into(),
            timezone: 60,
            before: 0,
            after: 1,
            precision: 11,
            calendar_model: GREGORIAN_CALENDAR.into(),
        };
        assert_eq!(DataValue::from_array(&value.to_array()).unwrap(), value);
    }

    #[test]
    fn test_coordinate_roundtrip_with_nulls() {
        let value = DataValue::coordinate(52.516666, 13.383333, None);
        let array = value.to_array();
        assert_eq!(array["value"]["precision"], Value::Null);
        assert_eq!(DataValue::from_array(&array).unwrap(), value);
    }

    #[test]
    fn test_entity_id_value() {
        let value = DataValue::EntityId(ItemId::new(5).unwrap().into());
        let array = value.to_array();
        assert_eq!(
            array,
            json!({"type": "wikibase-entityid", "value": {"entity-type": "item", "numeric-id": 5, "id": "Q5"}})
        );
        assert_eq!(DataValue::from_array(&array).unwrap(), value);

        let legacy = json!({"type": "wikibase-entityid", "value": {"entity-type": "property", "numeric-id": 7}});
        assert_eq!(DataValue::from_array(&legacy).unwrap().to_array()["value"]["id"], "P7");

        let inconsistent = json!({"type": "wikibase-entityid", "value": {"entity-type": "item", "numeric-id": 6, "id": "Q5"}});
        assert!(DataValue::from_array(&inconsistent).is_err());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = DataValue::from_array(&json!({"type": "bogus", "value": 1})).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownKind { .. }));
        let err = DataValue::from_array(&json!({"type": "string"})).unwrap_err();
        assert_eq!(err, DecodeError::MissingField { field: "value" });
    }

    #[test]
    fn test_serde_delegates_to_array() {
        let value = DataValue::monolingual("en", "Berlin");
        let text = serde_json::to_string(&value).unwrap();
        let back: DataValue = serde_json::from_str(&text).unwrap();
        assert_eq!(back, value);
    }
}
