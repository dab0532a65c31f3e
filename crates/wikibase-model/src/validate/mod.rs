//! Semantic validation for entities.
//!
//! Structural checks happen while reading arrays; the checks here need
//! context the model does not carry (which value type a property expects)
//! or walk the whole entity (value invariants, GUID ownership).
//!
//! **Note:** Type checking is advisory by default. A property missing from
//! the [`SchemaContext`] is accepted unless the context is strict.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::ValidationError;
use crate::guid::StatementGuidValidator;
use crate::model::{DataValue, DataValueType, EntityDocument, PropertyId, Snak, Statement};

/// Expected value types of properties.
#[derive(Debug, Clone, Default)]
pub struct SchemaContext {
    properties: FxHashMap<PropertyId, DataValueType>,
    strict: bool,
}

impl SchemaContext {
    /// Creates a new empty, non-strict schema context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context that rejects properties it does not know.
    pub fn strict() -> Self {
        Self {
            properties: FxHashMap::default(),
            strict: true,
        }
    }

    /// Registers a property with its expected value type.
    pub fn add_property(&mut self, id: PropertyId, value_type: DataValueType) {
        self.properties.insert(id, value_type);
    }

    /// Gets the expected value type for a property, if registered.
    pub fn get_property_type(&self, id: PropertyId) -> Option<DataValueType> {
        self.properties.get(&id).copied()
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }
}

/// Validates an entity against a schema context.
///
/// Checks every snak of every statement (main snak, qualifiers and
/// reference snaks):
/// - value snaks carry a value of the registered type
/// - every data value passes [`DataValue::validate`]
/// - unknown properties are rejected when the context is strict
///
/// Statement GUIDs must be well formed and, once the entity has an id,
/// belong to it. Statements without a GUID are accepted.
pub fn validate_entity<E: EntityDocument + ?Sized>(
    entity: &E,
    schema: &SchemaContext,
) -> Result<(), ValidationError> {
    for statement in entity.statements() {
        validate_guid(entity, statement)?;
        for snak in statement.all_snaks() {
            validate_snak(snak, schema)?;
        }
    }
    debug!(
        entity = ?entity.entity_id(),
        statements = entity.statements().len(),
        "entity validated"
    );
    Ok(())
}

fn validate_guid<E: EntityDocument + ?Sized>(entity: &E, statement: &Statement) -> Result<(), ValidationError> {
    let Some(guid) = statement.guid() else {
        return Ok(());
    };
    let result = match entity.entity_id() {
        Some(id) => StatementGuidValidator::validate_for_entity(guid, id),
        None => StatementGuidValidator::validate(guid),
    };
    result.map(|_| ()).map_err(|source| ValidationError::InvalidStatement {
        guid: guid.to_string(),
        source,
    })
}

/// Validates one snak against the schema.
pub fn validate_snak(snak: &Snak, schema: &SchemaContext) -> Result<(), ValidationError> {
    let property = snak.property_id();
    let expected = schema.get_property_type(property);
    if expected.is_none() && schema.is_strict() {
        return Err(ValidationError::PropertyNotFound {
            property: property.to_string(),
        });
    }

    let Some(value) = snak.data_value() else {
        return Ok(());
    };
    if let Some(expected) = expected {
        let found = value.value_type();
        if expected != found {
            return Err(ValidationError::TypeMismatch {
                property: property.to_string(),
                expected: expected.as_str().to_string(),
                found: found.as_str().to_string(),
            });
        }
    }
    validate_value(value)?;
    Ok(())
}

/// Validates a single value (independent of property context).
///
/// This checks value-level constraints like:
/// - signed decimals in quantities
/// - time precision and timezone ranges
/// - coordinate bounds, no NaN
pub fn validate_value(value: &DataValue) -> Result<(), ValidationError> {
    value.check().map_err(ValidationError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::model::{Item, ItemId};

    const GUID: &str = "Q7$D8404CDA-25E4-4334-AF13-A3290BCD9C0F";

    fn p(n: u64) -> PropertyId {
        PropertyId::new(n).unwrap()
    }

    fn item_with(snak: Snak) -> Item {
        let mut item = Item::with_id(ItemId::new(7).unwrap());
        let mut statement = Statement::new(snak);
        statement.set_guid(GUID);
        item.add_claim(statement).unwrap();
        item
    }

    #[test]
    fn test_validate_type_mismatch() {
        let mut schema = SchemaContext::new();
        schema.add_property(p(1), DataValueType::Quantity);

        let item = item_with(Snak::value(p(1), DataValue::string("not a quantity")));
        let result = validate_entity(&item, &schema);
        assert!(matches!(result, Err(ValidationError::TypeMismatch { .. })));
    }

    #[test]
    fn test_validate_type_match() {
        let mut schema = SchemaContext::new();
        schema.add_property(p(1), DataValueType::Quantity);

        let item = item_with(Snak::value(p(1), DataValue::quantity("+42")));
        assert!(validate_entity(&item, &schema).is_ok());
    }

    #[test]
    fn test_validate_unknown_property() {
        let item = item_with(Snak::value(p(99), DataValue::string("test")));

        // Unknown properties are allowed unless the schema is strict
        assert!(validate_entity(&item, &SchemaContext::new()).is_ok());
        assert!(matches!(
            validate_entity(&item, &SchemaContext::strict()),
            Err(ValidationError::PropertyNotFound { .. })
        ));
    }

    #[test]
    fn test_invalid_value_in_qualifier() {
        let mut item = item_with(Snak::no_value(p(1)));
        let statement = item.statements_mut().get_by_guid_mut(GUID).unwrap();
        statement
            .qualifiers_mut()
            .add_snak(Snak::value(p(2), DataValue::coordinate(91.0, 0.0, None)));

        assert!(matches!(
            validate_entity(&item, &SchemaContext::new()),
            Err(ValidationError::Model(ModelError::InvalidDataValue { .. }))
        ));
    }

    #[test]
    fn test_guid_must_be_well_formed() {
        let mut item = Item::new_empty();
        let mut statement = Statement::new(Snak::no_value(p(1)));
        statement.set_guid("X");
        item.add_claim(statement).unwrap();

        assert!(matches!(
            validate_entity(&item, &SchemaContext::new()),
            Err(ValidationError::InvalidStatement { .. })
        ));
    }

    #[test]
    fn test_statement_without_guid_is_fine() {
        let mut item = Item::new_empty();
        item.add_claim(Statement::new(Snak::some_value(p(1)))).unwrap();
        assert!(validate_entity(&item, &SchemaContext::new()).is_ok());
    }
}
