//! Claims and statements.
//!
//! A [`Claim`] is a main snak plus qualifiers and an optional GUID. A
//! [`Statement`] adds a rank and references. Both are mutable containers
//! around immutable snaks; neither ever mints its own GUID (see
//! [`crate::guid`]).

use std::fmt;

use crate::codec::canonical::content_hash;
use crate::error::ModelError;
use crate::model::{PropertyId, Reference, ReferenceList, Snak, SnakList};

/// Statement rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum Rank {
    Deprecated = 0,
    #[default]
    Normal = 1,
    Preferred = 2,
}

impl Rank {
    /// Returns the integer used in array structures.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rank::Deprecated => "deprecated",
            Rank::Normal => "normal",
            Rank::Preferred => "preferred",
        }
    }
}

impl TryFrom<i64> for Rank {
    type Error = ModelError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Rank::Deprecated),
            1 => Ok(Rank::Normal),
            2 => Ok(Rank::Preferred),
            _ => Err(ModelError::InvalidRank { value }),
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A main snak with qualifiers, identified by a GUID once persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Claim {
    main_snak: Snak,
    qualifiers: SnakList,
    guid: Option<String>,
}

impl Claim {
    pub fn new(main_snak: Snak) -> Self {
        Self {
            main_snak,
            qualifiers: SnakList::new(),
            guid: None,
        }
    }

    pub fn with_qualifiers(main_snak: Snak, qualifiers: SnakList) -> Self {
        Self {
            main_snak,
            qualifiers,
            guid: None,
        }
    }

    pub fn main_snak(&self) -> &Snak {
        &self.main_snak
    }

    /// Replaces the main snak. The GUID is left untouched.
    pub fn set_main_snak(&mut self, snak: Snak) {
        self.main_snak = snak;
    }

    pub fn qualifiers(&self) -> &SnakList {
        &self.qualifiers
    }

    pub fn qualifiers_mut(&mut self) -> &mut SnakList {
        &mut self.qualifiers
    }

    pub fn set_qualifiers(&mut self, qualifiers: SnakList) {
        self.qualifiers = qualifiers;
    }

    pub fn guid(&self) -> Option<&str> {
        self.guid.as_deref()
    }

    /// Assigns the GUID. Reassignment is permitted.
    pub fn set_guid(&mut self, guid: impl Into<String>) {
        self.guid = Some(guid.into());
    }

    pub fn clear_guid(&mut self) {
        self.guid = None;
    }

    /// Returns the property of the main snak.
    pub fn property_id(&self) -> PropertyId {
        self.main_snak.property_id()
    }

    /// Returns the main snak followed by the qualifiers.
    pub fn all_snaks(&self) -> Vec<&Snak> {
        std::iter::once(&self.main_snak).chain(self.qualifiers.iter()).collect()
    }

    /// Content hash over the main snak and the qualifiers in canonical
    /// order. The GUID does not take part.
    pub fn hash(&self) -> String {
        content_hash(self)
    }
}

/// A claim with a rank and sourcing references.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    claim: Claim,
    rank: Rank,
    references: ReferenceList,
}

impl Statement {
    /// Creates a normal-rank statement without qualifiers or references.
    pub fn new(main_snak: Snak) -> Self {
        Claim::new(main_snak).into()
    }

    pub fn claim(&self) -> &Claim {
        &self.claim
    }

    pub fn claim_mut(&mut self) -> &mut Claim {
        &mut self.claim
    }

    pub fn into_claim(self) -> Claim {
        self.claim
    }

    pub fn main_snak(&self) -> &Snak {
        self.claim.main_snak()
    }

    pub fn set_main_snak(&mut self, snak: Snak) {
        self.claim.set_main_snak(snak);
    }

    pub fn qualifiers(&self) -> &SnakList {
        self.claim.qualifiers()
    }

    pub fn qualifiers_mut(&mut self) -> &mut SnakList {
        self.claim.qualifiers_mut()
    }

    pub fn set_qualifiers(&mut self, qualifiers: SnakList) {
        self.claim.set_qualifiers(qualifiers);
    }

    pub fn guid(&self) -> Option<&str> {
        self.claim.guid()
    }

    pub fn set_guid(&mut self, guid: impl Into<String>) {
        self.claim.set_guid(guid);
    }

    pub fn property_id(&self) -> PropertyId {
        self.claim.property_id()
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn set_rank(&mut self, rank: Rank) {
        self.rank = rank;
    }

    /// Sets the rank from its integer form, failing on anything but 0, 1 or 2.
    pub fn set_rank_value(&mut self, value: i64) -> Result<(), ModelError> {
        self.rank = Rank::try_from(value)?;
        Ok(())
    }

    pub fn references(&self) -> &ReferenceList {
        &self.references
    }

    pub fn references_mut(&mut self) -> &mut ReferenceList {
        &mut self.references
    }

    pub fn set_references(&mut self, references: ReferenceList) {
        self.references = references;
    }

    /// Adds a reference unless an identical one is present.
    pub fn add_reference(&mut self, reference: Reference) -> bool {
        self.references.add_reference(reference)
    }

    /// Main snak, qualifiers, then every reference snak.
    pub fn all_snaks(&self) -> Vec<&Snak> {
        let mut snaks = self.claim.all_snaks();
        for reference in &self.references {
            snaks.extend(reference.snaks().iter());
        }
        snaks
    }

    /// Content hash over the claim content, the rank and the reference list.
    /// The GUID does not take part.
    pub fn hash(&self) -> String {
        content_hash(self)
    }
}

impl From<Claim> for Statement {
    fn from(claim: Claim) -> Self {
        Self {
            claim,
            rank: Rank::Normal,
            references: ReferenceList::new(),
        }
    }
}

/// Either kind of claim, as produced by the polymorphic array decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyClaim {
    Claim(Claim),
    Statement(Statement),
}

impl AnyClaim {
    /// Returns the discriminant used in array structures.
    pub fn kind(&self) -> &'static str {
        match self {
            AnyClaim::Claim(_) => "claim",
            AnyClaim::Statement(_) => "statement",
        }
    }

    pub fn claim(&self) -> &Claim {
        match self {
            AnyClaim::Claim(claim) => claim,
            AnyClaim::Statement(statement) => statement.claim(),
        }
    }

    pub fn guid(&self) -> Option<&str> {
        self.claim().guid()
    }

    pub fn hash(&self) -> String {
        match self {
            AnyClaim::Claim(claim) => claim.hash(),
            AnyClaim::Statement(statement) => statement.hash(),
        }
    }
}
