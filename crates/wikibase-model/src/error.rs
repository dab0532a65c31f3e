//! Error types for the data model, the array/envelope codecs, validation,
//! merging and the storage collaborators.

use thiserror::Error;

/// Error codes attached to decode failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E001: Invalid magic/version
    InvalidMagicOrVersion,
    /// E002: Missing field in an array structure
    MissingField,
    /// E003: Field present but of the wrong shape or value
    InvalidField,
    /// E004: Invalid UTF-8 encoding
    InvalidUtf8,
    /// E005: Malformed varint/length/compression
    MalformedEncoding,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::InvalidMagicOrVersion => "E001",
            ErrorCode::MissingField => "E002",
            ErrorCode::InvalidField => "E003",
            ErrorCode::InvalidUtf8 => "E004",
            ErrorCode::MalformedEncoding => "E005",
        }
    }
}

/// Construction and mutation errors raised by the data model.
///
/// These are surfaced at the setter that caused them, never deferred.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("invalid rank {value}: expected 0 (deprecated), 1 (normal) or 2 (preferred)")]
    InvalidRank { value: i64 },

    #[error("malformed entity id {id:?}")]
    MalformedEntityId { id: String },

    #[error("entity id {id} is not of type {expected}")]
    WrongEntityType { id: String, expected: &'static str },

    #[error("expected a {expected} entity, found a {found}")]
    EntityTypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("entity has no id yet")]
    MissingEntityId,

    #[error("neither an old nor a new entity was given")]
    MissingEntity,

    #[error("entity id is already set to {current}, refusing to change it to {requested}")]
    IdReassignment { current: String, requested: String },

    #[error("a site link for {site_id} already exists")]
    DuplicateSiteLink { site_id: String },

    #[error("malformed statement GUID {guid:?}")]
    MalformedGuid { guid: String },

    #[error("statement GUID {guid} does not belong to entity {entity_id}")]
    GuidMismatch { guid: String, entity_id: String },

    #[error("invalid {value_type} value: {reason}")]
    InvalidDataValue {
        value_type: &'static str,
        reason: &'static str,
    },

    #[error("{field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

/// Error while reading an array structure or an encoded change envelope.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    // === E001: Invalid magic/version ===
    #[error("[E001] invalid magic bytes: expected WBCH or WBCHZ, found {found:?}")]
    InvalidMagic { found: [u8; 4] },

    #[error("[E001] unsupported version: {version}")]
    UnsupportedVersion { version: u8 },

    // === E002: Missing field ===
    #[error("[E002] missing field {field}")]
    MissingField { field: &'static str },

    // === E003: Invalid field ===
    #[error("[E003] invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("[E003] unknown {field} kind {kind:?}")]
    UnknownKind { field: &'static str, kind: String },

    #[error("[E003] {0}")]
    Model(#[from] ModelError),

    // === E004: Invalid UTF-8 ===
    #[error("[E004] invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },

    // === E005: Malformed encoding ===
    #[error("[E005] unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("[E005] varint exceeds maximum length (10 bytes)")]
    VarintTooLong,

    #[error("[E005] varint overflow (value exceeds u64)")]
    VarintOverflow,

    #[error("[E005] {field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("[E005] malformed JSON payload: {0}")]
    Json(String),

    #[error("[E005] zstd decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("[E005] decompressed size {actual} doesn't match declared {declared}")]
    UncompressedSizeMismatch { declared: usize, actual: usize },
}

impl DecodeError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            DecodeError::InvalidMagic { .. } | DecodeError::UnsupportedVersion { .. } => {
                ErrorCode::InvalidMagicOrVersion
            }
            DecodeError::MissingField { .. } => ErrorCode::MissingField,
            DecodeError::InvalidField { .. }
            | DecodeError::UnknownKind { .. }
            | DecodeError::Model(_) => ErrorCode::InvalidField,
            DecodeError::InvalidUtf8 { .. } => ErrorCode::InvalidUtf8,
            _ => ErrorCode::MalformedEncoding,
        }
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        DecodeError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Error while encoding a change envelope.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("{field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("JSON serialization failed: {0}")]
    Json(String),

    #[error("zstd compression failed: {0}")]
    CompressionFailed(String),
}

/// Error during schema validation of an entity.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("value type mismatch for property {property}: expected {expected}, found {found}")]
    TypeMismatch {
        property: String,
        expected: String,
        found: String,
    },

    #[error("property {property} not found in schema")]
    PropertyNotFound { property: String },

    #[error("statement {guid}: {source}")]
    InvalidStatement {
        guid: String,
        #[source]
        source: ModelError,
    },

    #[error("{0}")]
    Model(#[from] ModelError),
}

/// Which part of an entity diff two concurrent edits disagree on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffSection {
    Labels,
    Descriptions,
    Aliases,
    Claims,
    SiteLinks,
}

impl DiffSection {
    /// Returns the key used for this section in the diff array format.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffSection::Labels => "labels",
            DiffSection::Descriptions => "descriptions",
            DiffSection::Aliases => "aliases",
            DiffSection::Claims => "claims",
            DiffSection::SiteLinks => "links",
        }
    }
}

/// Two diffs contain contradicting operations for the same key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("edit conflict in {} at {key:?}", section.as_str())]
pub struct MergeConflict {
    pub section: DiffSection,
    pub key: String,
}

/// Failure to reconcile two concurrent edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("{0}")]
    Conflict(#[from] MergeConflict),

    #[error("{0}")]
    Model(#[from] ModelError),
}

/// Errors reported by the storage collaborators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("entity access limit of {limit} exceeded")]
    AccessLimitExceeded { limit: usize },

    #[error("entity {id} not found")]
    NotFound { id: String },

    #[error("base revision {expected} is stale, latest is {actual}")]
    RevisionMismatch { expected: u64, actual: u64 },

    #[error("{0}")]
    Model(#[from] ModelError),

    #[error("{0}")]
    Conflict(#[from] MergeConflict),
}

impl From<MergeError> for StoreError {
    fn from(err: MergeError) -> Self {
        match err {
            MergeError::Conflict(conflict) => StoreError::Conflict(conflict),
            MergeError::Model(model) => StoreError::Model(model),
        }
    }
}
