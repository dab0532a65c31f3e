//! Statement GUIDs.
//!
//! A GUID is the owning entity's id, a `$`, and a UUID-shaped token:
//!
//! ```text
//! Q31$D8404CDA-25E4-4334-AF13-A3290BCD9C0F
//! ```
//!
//! GUIDs are minted by a [`GuidGenerator`] when a statement is first
//! attached to an entity. Claims and statements never create their own.

use std::fmt;
use std::str::FromStr;

use tracing::trace;
use uuid::Uuid;

use crate::error::ModelError;
use crate::limits::MAX_GUID_LEN;
use crate::model::EntityId;

/// Separator between the entity id and the token.
pub const GUID_SEPARATOR: char = '$';

/// A parsed statement GUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatementGuid {
    entity_id: EntityId,
    guid_part: String,
}

impl StatementGuid {
    pub fn new(entity_id: EntityId, guid_part: impl Into<String>) -> Self {
        Self {
            entity_id,
            guid_part: guid_part.into(),
        }
    }

    /// Returns the id of the entity the statement belongs to.
    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    /// Returns the token after the separator.
    pub fn guid_part(&self) -> &str {
        &self.guid_part
    }

    /// Returns true if the token is a hyphenated UUID.
    pub fn has_uuid_token(&self) -> bool {
        self.guid_part.len() == 36 && Uuid::parse_str(&self.guid_part).is_ok()
    }
}

impl fmt::Display for StatementGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.entity_id, GUID_SEPARATOR, self.guid_part)
    }
}

impl FromStr for StatementGuid {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ModelError::MalformedGuid { guid: s.to_string() };
        if s.len() > MAX_GUID_LEN {
            return Err(malformed());
        }
        let (entity, token) = s.split_once(GUID_SEPARATOR).ok_or_else(malformed)?;
        if token.is_empty() {
            return Err(malformed());
        }
        let entity_id = entity.parse().map_err(|_| malformed())?;
        Ok(Self::new(entity_id, token))
    }
}

/// Mints statement GUIDs.
pub trait GuidGenerator {
    /// Returns a fresh GUID for a statement of `entity_id`.
    fn new_guid(&mut self, entity_id: EntityId) -> String;
}

/// Random GUIDs with an upper-case UUIDv4 token.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimGuidGenerator;

impl ClaimGuidGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl GuidGenerator for ClaimGuidGenerator {
    fn new_guid(&mut self, entity_id: EntityId) -> String {
        let token = Uuid::new_v4().hyphenated().to_string().to_uppercase();
        let guid = StatementGuid::new(entity_id, token).to_string();
        trace!(%guid, "minted statement guid");
        guid
    }
}

/// Deterministic GUIDs from a counter, for tests and replays.
#[derive(Debug, Clone, Default)]
pub struct SequentialGuidGenerator {
    next: u64,
}

impl SequentialGuidGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }
}

impl GuidGenerator for SequentialGuidGenerator {
    fn new_guid(&mut self, entity_id: EntityId) -> String {
        let token = Uuid::from_u128(u128::from(self.next)).hyphenated().to_string().to_uppercase();
        self.next += 1;
        StatementGuid::new(entity_id, token).to_string()
    }
}

/// Checks GUID strings against the expected format.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementGuidValidator;

impl StatementGuidValidator {
    /// Parses `guid`, requiring a UUID-shaped token.
    pub fn validate(guid: &str) -> Result<StatementGuid, ModelError> {
        let parsed: StatementGuid = guid.parse()?;
        if !parsed.has_uuid_token() {
            return Err(ModelError::MalformedGuid {
                guid: guid.to_string(),
            });
        }
        Ok(parsed)
    }

    /// Like [`validate`](Self::validate), additionally requiring the GUID to
    /// belong to `entity_id`.
    pub fn validate_for_entity(guid: &str, entity_id: EntityId) -> Result<StatementGuid, ModelError> {
        let parsed = Self::validate(guid)?;
        if parsed.entity_id() != entity_id {
            return Err(ModelError::GuidMismatch {
                guid: guid.to_string(),
                entity_id: entity_id.to_string(),
            });
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q31() -> EntityId {
        "Q31".parse().unwrap()
    }

    #[test]
    fn test_generated_guid_format() {
        let guid = ClaimGuidGenerator::new().new_guid(q31());
        assert!(guid.starts_with("Q31$"));
        assert_eq!(guid.len(), "Q31$".len() + 36);

        let parsed = StatementGuidValidator::validate_for_entity(&guid, q31()).unwrap();
        assert_eq!(parsed.entity_id(), q31());
        assert_eq!(parsed.to_string(), guid);
    }

    #[test]
    fn test_generated_guids_are_unique() {
        let mut generator = ClaimGuidGenerator::new();
        let a = generator.new_guid(q31());
        let b = generator.new_guid(q31());
        assert_ne!(a, b);
    }

    #[test]
    fn test_sequential_generator_is_deterministic() {
        let mut a = SequentialGuidGenerator::new();
        let mut b = SequentialGuidGenerator::new();
        assert_eq!(a.new_guid(q31()), b.new_guid(q31()));
        assert_eq!(
            a.new_guid(q31()),
            "Q31$00000000-0000-0000-0000-000000000001"
        );
        assert!(StatementGuidValidator::validate(&b.new_guid(q31())).is_ok());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "Q31", "Q31$", "$abc", "X31$abc", "Q031$abc"] {
            assert!(bad.parse::<StatementGuid>().is_err(), "accepted {bad:?}");
        }
        let lower: StatementGuid = "q31$abc".parse().unwrap();
        assert_eq!(lower.entity_id(), q31());
    }

    #[test]
    fn test_validator_requires_uuid_and_owner() {
        assert!(matches!(
            StatementGuidValidator::validate("Q31$not-a-uuid"),
            Err(ModelError::MalformedGuid { .. })
        ));
        let guid = "Q31$D8404CDA-25E4-4334-AF13-A3290BCD9C0F";
        assert!(StatementGuidValidator::validate(guid).is_ok());
        assert!(matches!(
            StatementGuidValidator::validate_for_entity(guid, "Q32".parse().unwrap()),
            Err(ModelError::GuidMismatch { .. })
        ));
    }
}
