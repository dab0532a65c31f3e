//! Canonical byte encoding for content hashing.
//!
//! Every hashable type writes a type tag followed by its fields in a fixed
//! order. Snak lists are written in [`SnakList::canonical_order`], so the
//! encoding does not depend on how the value was constructed.
//!
//! ```text
//! hash = hex(SHA-256(canonical_bytes))
//! ```

use sha2::{Digest, Sha256};

use crate::codec::primitives::Writer;
use crate::model::{Claim, DataValue, EntityId, ReferenceList, Snak, SnakList, Statement};

/// Types with a canonical byte encoding.
pub trait CanonicalEncode {
    fn write_canonical(&self, writer: &mut Writer);
}

/// Returns the SHA-256 content hash of a value as 64 lowercase hex characters.
pub fn content_hash<T: CanonicalEncode + ?Sized>(value: &T) -> String {
    let mut writer = Writer::with_capacity(128);
    value.write_canonical(&mut writer);
    hex::encode(Sha256::digest(writer.as_bytes()))
}

impl CanonicalEncode for EntityId {
    fn write_canonical(&self, writer: &mut Writer) {
        writer.write_string(&self.to_string());
    }
}

impl CanonicalEncode for DataValue {
    fn write_canonical(&self, writer: &mut Writer) {
        writer.write_byte(self.value_type().tag());
        match self {
            DataValue::String(value) => writer.write_string(value),
            DataValue::MonolingualText { text, language } => {
                writer.write_string(language);
                writer.write_string(text);
            }
            DataValue::Quantity {
                amount,
                unit,
                upper_bound,
                lower_bound,
            } => {
                writer.write_string(amount);
                writer.write_string(unit);
                writer.write_opt_string(upper_bound.as_deref());
                writer.write_opt_string(lower_bound.as_deref());
            }
            DataValue::Time {
                time,
                timezone,
                before,
                after,
                precision,
                calendar_model,
            } => {
                writer.write_string(time);
                writer.write_signed_varint(i64::from(*timezone));
                writer.write_varint(u64::from(*before));
                writer.write_varint(u64::from(*after));
                writer.write_byte(*precision);
                writer.write_string(calendar_model);
            }
            DataValue::GlobeCoordinate {
                latitude,
                longitude,
                altitude,
                precision,
                globe,
            } => {
                writer.write_f64(*latitude);
                writer.write_f64(*longitude);
                for optional in [altitude, precision] {
                    match optional {
                        Some(v) => {
                            writer.write_byte(1);
                            writer.write_f64(*v);
                        }
                        None => writer.write_byte(0),
                    }
                }
                writer.write_string(globe);
            }
            DataValue::EntityId(id) => id.write_canonical(writer),
        }
    }
}

impl CanonicalEncode for Snak {
    fn write_canonical(&self, writer: &mut Writer) {
        writer.write_string(self.snak_type().as_str());
        writer.write_string(&self.property_id().to_string());
        if let Some(value) = self.data_value() {
            value.write_canonical(writer);
        }
    }
}

impl CanonicalEncode for SnakList {
    fn write_canonical(&self, writer: &mut Writer) {
        writer.write_string("snaks");
        writer.write_varint(self.len() as u64);
        for snak in self.canonical_order() {
            snak.write_canonical(writer);
        }
    }
}

impl CanonicalEncode for ReferenceList {
    fn write_canonical(&self, writer: &mut Writer) {
        writer.write_string("references");
        writer.write_varint(self.len() as u64);
        for reference in self {
            writer.write_string(reference.hash());
        }
    }
}

impl CanonicalEncode for Claim {
    fn write_canonical(&self, writer: &mut Writer) {
        writer.write_string("claim");
        self.main_snak().write_canonical(writer);
        self.qualifiers().write_canonical(writer);
    }
}

impl CanonicalEncode for Statement {
    fn write_canonical(&self, writer: &mut Writer) {
        writer.write_string("statement");
        self.main_snak().write_canonical(writer);
        self.qualifiers().write_canonical(writer);
        writer.write_byte(self.rank().as_u8());
        self.references().write_canonical(writer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyId;

    #[test]
    fn test_hash_shape() {
        let hash = content_hash(&DataValue::string("Berlin"));
        assert_eq!(hash.len(), 64);
        assert!(hash.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
    }

    #[test]
    fn test_hash_deterministic_and_discriminating() {
        let a = content_hash(&DataValue::string("Berlin"));
        assert_eq!(a, content_hash(&DataValue::string("Berlin")));
        assert_ne!(a, content_hash(&DataValue::monolingual("Berlin", "")));
    }

    #[test]
    fn test_snak_variants_hash_differently() {
        let p = PropertyId::new(42).unwrap();
        assert_ne!(
            content_hash(&Snak::no_value(p)),
            content_hash(&Snak::some_value(p))
        );
    }

    #[test]
    fn test_negative_zero_coordinate_hashes_like_zero() {
        assert_eq!(
            content_hash(&DataValue::coordinate(0.0, 10.0, None)),
            content_hash(&DataValue::coordinate(-0.0, 10.0, None))
        );
    }
}
