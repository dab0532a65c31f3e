//! Change envelope encoding/decoding.
//!
//! ```text
//! Uncompressed: "WBCH" | version: u8 | len: varint | JSON(change)
//! Compressed:   "WBCHZ" | uncompressed_size: varint | zstd(uncompressed envelope)
//! ```
//!
//! The decoder detects both forms.

use std::io::Read;

use tracing::trace;

use crate::change::Change;
use crate::codec::primitives::{Reader, Writer};
use crate::error::{DecodeError, EncodeError};
use crate::limits::{
    FORMAT_VERSION, MAGIC_COMPRESSED, MAGIC_UNCOMPRESSED, MAX_CHANGE_SIZE, MIN_FORMAT_VERSION,
};

// =============================================================================
// DECODING
// =============================================================================

/// Decodes a change envelope, compressed or not.
pub fn decode_change(input: &[u8]) -> Result<Change, DecodeError> {
    if input.len() < 4 {
        return Err(DecodeError::UnexpectedEof { context: "magic" });
    }

    if input.len() >= 5 && &input[0..5] == MAGIC_COMPRESSED {
        let decompressed = decompress_zstd(&input[5..])?;
        decode_uncompressed(&decompressed)
    } else if &input[0..4] == MAGIC_UNCOMPRESSED {
        if input.len() > MAX_CHANGE_SIZE {
            return Err(DecodeError::LengthExceedsLimit {
                field: "change",
                len: input.len(),
                max: MAX_CHANGE_SIZE,
            });
        }
        decode_uncompressed(input)
    } else {
        let mut found = [0u8; 4];
        found.copy_from_slice(&input[0..4]);
        Err(DecodeError::InvalidMagic { found })
    }
}

fn decode_uncompressed(input: &[u8]) -> Result<Change, DecodeError> {
    let mut reader = Reader::new(input);

    let magic = reader.read_bytes(4, "magic")?;
    if magic != MAGIC_UNCOMPRESSED {
        let mut found = [0u8; 4];
        found.copy_from_slice(magic);
        return Err(DecodeError::InvalidMagic { found });
    }

    let version = reader.read_byte("version")?;
    if !(MIN_FORMAT_VERSION..=FORMAT_VERSION).contains(&version) {
        return Err(DecodeError::UnsupportedVersion { version });
    }

    let payload = reader.read_bytes_prefixed(MAX_CHANGE_SIZE, "payload")?;
    if !reader.is_empty() {
        return Err(DecodeError::invalid(
            "payload",
            format!("{} trailing bytes", reader.remaining().len()),
        ));
    }

    let text = std::str::from_utf8(payload).map_err(|_| DecodeError::InvalidUtf8 { field: "payload" })?;
    let change: Change = serde_json::from_str(text).map_err(|e| DecodeError::Json(e.to_string()))?;
    trace!(change = %change.type_string(), revision = change.revision_id, "decoded change");
    Ok(change)
}

fn decompress_zstd(compressed: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut reader = Reader::new(compressed);
    let declared_size = reader.read_varint("uncompressed_size")? as usize;

    if declared_size > MAX_CHANGE_SIZE {
        return Err(DecodeError::LengthExceedsLimit {
            field: "uncompressed_size",
            len: declared_size,
            max: MAX_CHANGE_SIZE,
        });
    }

    let decoder = zstd::Decoder::new(reader.remaining())
        .map_err(|e| DecodeError::DecompressionFailed(e.to_string()))?;

    // Read one byte past the declared size so oversized payloads are caught
    // without inflating them fully.
    let mut decompressed = Vec::with_capacity(declared_size);
    decoder
        .take(declared_size as u64 + 1)
        .read_to_end(&mut decompressed)
        .map_err(|e| DecodeError::DecompressionFailed(e.to_string()))?;

    if decompressed.len() != declared_size {
        return Err(DecodeError::UncompressedSizeMismatch {
            declared: declared_size,
            actual: decompressed.len(),
        });
    }

    Ok(decompressed)
}

// =============================================================================
// ENCODING
// =============================================================================

/// Options for encoding change envelopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeEncodeOptions {
    /// zstd level to compress with; `None` writes an uncompressed envelope.
    pub compression_level: Option<i32>,
}

impl ChangeEncodeOptions {
    /// Creates default (uncompressed) options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options compressing at the given zstd level.
    pub fn compressed(level: i32) -> Self {
        Self {
            compression_level: Some(level),
        }
    }
}

/// Encodes a change as an uncompressed envelope.
pub fn encode_change(change: &Change) -> Result<Vec<u8>, EncodeError> {
    let payload = serde_json::to_vec(change).map_err(|e| EncodeError::Json(e.to_string()))?;

    let mut writer = Writer::with_capacity(4 + 1 + 10 + payload.len());
    writer.write_bytes(MAGIC_UNCOMPRESSED);
    writer.write_byte(FORMAT_VERSION);
    writer.write_bytes_prefixed(&payload);

    if writer.as_bytes().len() > MAX_CHANGE_SIZE {
        return Err(EncodeError::LengthExceedsLimit {
            field: "change",
            len: writer.as_bytes().len(),
            max: MAX_CHANGE_SIZE,
        });
    }
    Ok(writer.into_bytes())
}

/// Encodes a change with zstd compression.
pub fn encode_change_compressed(change: &Change, level: i32) -> Result<Vec<u8>, EncodeError> {
    let uncompressed = encode_change(change)?;

    let compressed = zstd::encode_all(uncompressed.as_slice(), level)
        .map_err(|e| EncodeError::CompressionFailed(e.to_string()))?;

    let mut writer = Writer::with_capacity(5 + 10 + compressed.len());
    writer.write_bytes(MAGIC_COMPRESSED);
    writer.write_varint(uncompressed.len() as u64);
    writer.write_bytes(&compressed);

    Ok(writer.into_bytes())
}

/// Encodes a change according to `options`.
pub fn encode_change_with_options(change: &Change, options: ChangeEncodeOptions) -> Result<Vec<u8>, EncodeError> {
    match options.compression_level {
        Some(level) => encode_change_compressed(change, level),
        None => encode_change(change),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeAction;
    use crate::diff::EntityDiff;
    use crate::model::{Item, ItemId, SiteLink};

    fn make_test_change() -> Change {
        let old = Item::with_id(ItemId::new(64).unwrap());
        let mut new = old.copy();
        new.add_site_link(SiteLink::new("enwiki", "Berlin").unwrap()).unwrap();
        new.fingerprint_mut().set_label("en", "Berlin").unwrap();
        Change::new(
            ItemId::new(64).unwrap().into(),
            ChangeAction::Update,
            42,
            1_234_567_890,
            EntityDiff::between_items(&old, &new),
        )
    }

    #[test]
    fn test_change_roundtrip() {
        let change = make_test_change();
        let encoded = encode_change(&change).unwrap();
        assert_eq!(&encoded[0..4], b"WBCH");
        assert_eq!(encoded[4], FORMAT_VERSION);
        assert_eq!(decode_change(&encoded).unwrap(), change);
    }

    #[test]
    fn test_change_compressed_roundtrip() {
        let change = make_test_change();
        let encoded = encode_change_with_options(&change, ChangeEncodeOptions::compressed(3)).unwrap();
        assert_eq!(&encoded[0..5], b"WBCHZ");
        assert_eq!(decode_change(&encoded).unwrap(), change);
    }

    #[test]
    fn test_invalid_magic() {
        let result = decode_change(b"XXXX");
        assert!(matches!(result, Err(DecodeError::InvalidMagic { .. })));
        assert!(matches!(decode_change(b"WB"), Err(DecodeError::UnexpectedEof { .. })));
    }

    #[test]
    fn test_unsupported_version() {
        let mut data = Vec::new();
        data.extend_from_slice(MAGIC_UNCOMPRESSED);
        data.push(99);
        data.extend_from_slice(&[0u8; 16]);

        let result = decode_change(&data);
        assert!(matches!(result, Err(DecodeError::UnsupportedVersion { version: 99 })));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut encoded = encode_change(&make_test_change()).unwrap();
        encoded.push(0);
        assert!(matches!(decode_change(&encoded), Err(DecodeError::InvalidField { .. })));
    }

    #[test]
    fn test_declared_size_mismatch() {
        let change = make_test_change();
        let uncompressed = encode_change(&change).unwrap();
        let compressed = zstd::encode_all(uncompressed.as_slice(), 3).unwrap();

        let mut writer = Writer::new();
        writer.write_bytes(MAGIC_COMPRESSED);
        writer.write_varint(uncompressed.len() as u64 - 1);
        writer.write_bytes(&compressed);

        assert!(matches!(
            decode_change(&writer.into_bytes()),
            Err(DecodeError::UncompressedSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_malformed_json_payload() {
        let mut writer = Writer::new();
        writer.write_bytes(MAGIC_UNCOMPRESSED);
        writer.write_byte(FORMAT_VERSION);
        writer.write_bytes_prefixed(b"{\"entity_id\": 5}");
        assert!(matches!(decode_change(&writer.into_bytes()), Err(DecodeError::Json(_))));
    }
}
