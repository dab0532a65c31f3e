//! Data values carried by value snaks.
//!
//! Data values are immutable and compared structurally.

use crate::error::ModelError;
use crate::model::EntityId;

/// Calendar model used by time values unless stated otherwise (proleptic Gregorian).
pub const GREGORIAN_CALENDAR: &str = "http://www.wikidata.org/entity/Q1985727";

/// Globe used by coordinate values unless stated otherwise (Earth).
pub const EARTH_GLOBE: &str = "http://www.wikidata.org/entity/Q2";

/// Unit of a quantity without unit.
pub const UNITLESS: &str = "1";

/// Value types, named as they appear in array structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataValueType {
    String,
    MonolingualText,
    Quantity,
    Time,
    GlobeCoordinate,
    EntityId,
}

impl DataValueType {
    /// Returns the type name used in array structures.
    pub fn as_str(self) -> &'static str {
        match self {
            DataValueType::String => "string",
            DataValueType::MonolingualText => "monolingualtext",
            DataValueType::Quantity => "quantity",
            DataValueType::Time => "time",
            DataValueType::GlobeCoordinate => "globecoordinate",
            DataValueType::EntityId => "wikibase-entityid",
        }
    }

    /// Looks up a value type by name.
    pub fn from_name(name: &str) -> Option<DataValueType> {
        match name {
            "string" => Some(DataValueType::String),
            "monolingualtext" => Some(DataValueType::MonolingualText),
            "quantity" => Some(DataValueType::Quantity),
            "time" => Some(DataValueType::Time),
            "globecoordinate" => Some(DataValueType::GlobeCoordinate),
            "wikibase-entityid" => Some(DataValueType::EntityId),
            _ => None,
        }
    }

    /// Canonical single-byte tag used in content hashing.
    pub(crate) fn tag(self) -> u8 {
        match self {
            DataValueType::String => 1,
            DataValueType::MonolingualText => 2,
            DataValueType::Quantity => 3,
            DataValueType::Time => 4,
            DataValueType::GlobeCoordinate => 5,
            DataValueType::EntityId => 6,
        }
    }
}

/// A typed value that can be asserted by a value snak.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    /// Plain string (identifiers, URLs, file names, ...).
    String(String),

    /// Text in a specific language.
    MonolingualText { text: String, language: String },

    /// Decimal amount with unit and optional uncertainty bounds.
    ///
    /// Amounts are decimal strings with a mandatory sign, e.g. `+1.5`.
    Quantity {
        amount: String,
        /// Unit concept URI, or [`UNITLESS`].
        unit: String,
        upper_bound: Option<String>,
        lower_bound: Option<String>,
    },

    /// Point in time, e.g. `+2013-01-01T00:00:00Z`.
    Time {
        time: String,
        /// Offset from UTC in minutes.
        timezone: i32,
        before: u32,
        after: u32,
        /// 0 (billion years) to 14 (second).
        precision: u8,
        calendar_model: String,
    },

    /// WGS84-style coordinate on a globe.
    GlobeCoordinate {
        latitude: f64,
        longitude: f64,
        altitude: Option<f64>,
        precision: Option<f64>,
        globe: String,
    },

    /// Reference to another entity.
    EntityId(EntityId),
}

impl DataValue {
    /// Creates a string value.
    pub fn string(value: impl Into<String>) -> Self {
        DataValue::String(value.into())
    }

    /// Creates a monolingual text value.
    pub fn monolingual(language: impl Into<String>, text: impl Into<String>) -> Self {
        DataValue::MonolingualText {
            text: text.into(),
            language: language.into(),
        }
    }

    /// Creates a unitless quantity without bounds.
    pub fn quantity(amount: impl Into<String>) -> Self {
        DataValue::Quantity {
            amount: amount.into(),
            unit: UNITLESS.to_string(),
            upper_bound: None,
            lower_bound: None,
        }
    }

    /// Creates a Gregorian time value in UTC.
    pub fn time(time: impl Into<String>, precision: u8) -> Self {
        DataValue::Time {
            time: time.into(),
            timezone: 0,
            before: 0,
            after: 0,
            precision,
            calendar_model: GREGORIAN_CALENDAR.to_string(),
        }
    }

    /// Creates an Earth coordinate.
    pub fn coordinate(latitude: f64, longitude: f64, precision: Option<f64>) -> Self {
        DataValue::GlobeCoordinate {
            latitude,
            longitude,
            altitude: None,
            precision,
            globe: EARTH_GLOBE.to_string(),
        }
    }

    /// Returns the type of this value.
    pub fn value_type(&self) -> DataValueType {
        match self {
            DataValue::String(_) => DataValueType::String,
            DataValue::MonolingualText { .. } => DataValueType::MonolingualText,
            DataValue::Quantity { .. } => DataValueType::Quantity,
            DataValue::Time { .. } => DataValueType::Time,
            DataValue::GlobeCoordinate { .. } => DataValueType::GlobeCoordinate,
            DataValue::EntityId(_) => DataValueType::EntityId,
        }
    }

    /// Validates this value.
    ///
    /// Returns an error description if invalid, None if valid.
    pub fn validate(&self) -> Option<&'static str> {
        match self {
            DataValue::MonolingualText { language, .. } => {
                if language.is_empty() {
                    return Some("language code cannot be empty");
                }
            }
            DataValue::Quantity {
                amount,
                unit,
                upper_bound,
                lower_bound,
            } => {
                if !is_signed_decimal(amount) {
                    return Some("amount is not a signed decimal");
                }
                if unit.is_empty() {
                    return Some("unit cannot be empty");
                }
                if upper_bound.is_some() != lower_bound.is_some() {
                    return Some("bounds must be given together");
                }
                for bound in [upper_bound, lower_bound].into_iter().flatten() {
                    if !is_signed_decimal(bound) {
                        return Some("bound is not a signed decimal");
                    }
                }
            }
            DataValue::Time {
                time,
                timezone,
                precision,
                calendar_model,
                ..
            } => {
                if !(time.starts_with('+') || time.starts_with('-'))
                    || !time.contains('T')
                    || !time.ends_with('Z')
                {
                    return Some("time must look like +YYYY-MM-DDThh:mm:ssZ");
                }
                if *precision > 14 {
                    return Some("precision outside range [0, 14]");
                }
                if *timezone < -1440 || *timezone > 1440 {
                    return Some("timezone outside range [-1440, +1440]");
                }
                if calendar_model.is_empty() {
                    return Some("calendar model cannot be empty");
                }
            }
            DataValue::GlobeCoordinate {
                latitude,
                longitude,
                altitude,
                precision,
                globe,
            } => {
                if latitude.is_nan() || longitude.is_nan() {
                    return Some("NaN is not allowed in coordinates");
                }
                if *latitude < -90.0 || *latitude > 90.0 {
                    return Some("latitude out of range [-90, +90]");
                }
                if *longitude < -360.0 || *longitude > 360.0 {
                    return Some("longitude out of range [-360, +360]");
                }
                if altitude.is_some_and(f64::is_nan) || precision.is_some_and(f64::is_nan) {
                    return Some("NaN is not allowed in altitude or precision");
                }
                if globe.is_empty() {
                    return Some("globe cannot be empty");
                }
            }
            DataValue::String(_) | DataValue::EntityId(_) => {}
        }
        None
    }

    /// Like [`validate`](Self::validate), as a typed error.
    pub fn check(&self) -> Result<(), ModelError> {
        match self.validate() {
            Some(reason) => Err(ModelError::InvalidDataValue {
                value_type: self.value_type().as_str(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

/// Checks for `+123`, `-0.5`, `+0` style decimals.
fn is_signed_decimal(s: &str) -> bool {
    let Some(rest) = s.strip_prefix('+').or_else(|| s.strip_prefix('-')) else {
        return false;
    };
    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rest, None),
    };
    let digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    if !digits(int_part) || (int_part.len() > 1 && int_part.starts_with('0')) {
        return false;
    }
    frac_part.is_none_or(digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_names_roundtrip() {
        for t in [
            DataValueType::String,
            DataValueType::MonolingualText,
            DataValueType::Quantity,
            DataValueType::Time,
            DataValueType::GlobeCoordinate,
            DataValueType::EntityId,
        ] {
            assert_eq!(DataValueType::from_name(t.as_str()), Some(t));
        }
        assert_eq!(DataValueType::from_name("bogus"), None);
    }

    #[test]
    fn test_quantity_validation() {
        assert!(DataValue::quantity("+12").validate().is_none());
        assert!(DataValue::quantity("-0.25").validate().is_none());
        assert!(DataValue::quantity("12").validate().is_some());
        assert!(DataValue::quantity("+012").validate().is_some());
        assert!(DataValue::quantity("+1.").validate().is_some());

        let half_bounded = DataValue::Quantity {
            amount: "+1".into(),
            unit: UNITLESS.into(),
            upper_bound: Some("+2".into()),
            lower_bound: None,
        };
        assert!(half_bounded.validate().is_some());
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(DataValue::coordinate(52.5, 13.4, Some(0.1)).validate().is_none());
        assert!(DataValue::coordinate(91.0, 0.0, None).validate().is_some());
        assert!(DataValue::coordinate(f64::NAN, 0.0, None).validate().is_some());
        assert!(DataValue::coordinate(0.0, 0.0, Some(f64::NAN)).validate().is_some());
    }

    #[test]
    fn test_time_validation() {
        assert!(DataValue::time("+2013-01-01T00:00:00Z", 11).validate().is_none());
        assert!(DataValue::time("2013-01-01T00:00:00Z", 11).validate().is_some());
        assert!(DataValue::time("+2013-01-01T00:00:00Z", 15).validate().is_some());
    }

    #[test]
    fn test_check_reports_type() {
        let err = DataValue::quantity("nope").check().unwrap_err();
        assert!(matches!(
            err,
            ModelError::InvalidDataValue { value_type: "quantity", .. }
        ));
    }
}
