//! Byte-level building blocks.
//!
//! [`Writer`] produces the canonical bytes content hashes are computed over
//! and the change envelope frame; [`Reader`] only has to take the envelope
//! frame apart again.

use crate::error::DecodeError;
use crate::limits::MAX_VARINT_BYTES;

// =============================================================================
// DECODING
// =============================================================================

/// Bounds-checked cursor over an envelope frame.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn read_byte(&mut self, context: &'static str) -> Result<u8, DecodeError> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or(DecodeError::UnexpectedEof { context })?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn read_bytes(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining().len() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Reads an unsigned LEB128 varint of at most [`MAX_VARINT_BYTES`].
    pub fn read_varint(&mut self, context: &'static str) -> Result<u64, DecodeError> {
        let mut result: u64 = 0;
        for i in 0..MAX_VARINT_BYTES {
            let byte = self.read_byte(context)?;
            let value = u64::from(byte & 0x7F);
            let shift = 7 * i as u32;
            if shift == 63 && value > 1 {
                return Err(DecodeError::VarintOverflow);
            }
            result |= value << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(DecodeError::VarintTooLong)
    }

    /// Reads a varint length, checks it against `max_len`, then borrows
    /// that many bytes.
    pub fn read_bytes_prefixed(&mut self, max_len: usize, field: &'static str) -> Result<&'a [u8], DecodeError> {
        let len = self.read_varint(field)? as usize;
        if len > max_len {
            return Err(DecodeError::LengthExceedsLimit {
                field,
                len,
                max: max_len,
            });
        }
        self.read_bytes(len, field)
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Append-only byte buffer.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes an unsigned LEB128 varint.
    pub fn write_varint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.push((value as u8 & 0x7F) | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }

    /// Writes a zigzag-mapped signed varint (0, -1, 1, -2 become 0, 1, 2, 3).
    pub fn write_signed_varint(&mut self, value: i64) {
        self.write_varint(((value << 1) ^ (value >> 63)) as u64);
    }

    pub fn write_string(&mut self, s: &str) {
        self.write_bytes_prefixed(s.as_bytes());
    }

    pub fn write_bytes_prefixed(&mut self, bytes: &[u8]) {
        self.write_varint(bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
    }

    /// Presence byte, then the string if present.
    pub fn write_opt_string(&mut self, s: Option<&str>) {
        match s {
            Some(s) => {
                self.write_byte(1);
                self.write_string(s);
            }
            None => self.write_byte(0),
        }
    }

    /// Little-endian f64, with `-0.0` folded into `0.0`.
    pub fn write_f64(&mut self, value: f64) {
        let value = if value == 0.0 { 0.0 } else { value };
        self.buf.extend_from_slice(&value.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_varint_mapping() {
        let encoded: Vec<Vec<u8>> = [0i64, -1, 1, -2]
            .into_iter()
            .map(|v| {
                let mut writer = Writer::new();
                writer.write_signed_varint(v);
                writer.into_bytes()
            })
            .collect();
        assert_eq!(encoded, [vec![0], vec![1], vec![2], vec![3]]);
    }

    #[test]
    fn test_varint_boundaries() {
        for v in [0u64, 127, 128, 16384, u64::MAX] {
            let mut writer = Writer::new();
            writer.write_varint(v);

            let mut reader = Reader::new(writer.as_bytes());
            assert_eq!(reader.read_varint("test").unwrap(), v, "failed for {}", v);
            assert!(reader.is_empty());
        }
    }

    #[test]
    fn test_negative_zero_normalized() {
        let mut a = Writer::new();
        a.write_f64(0.0);
        let mut b = Writer::new();
        b.write_f64(-0.0);
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_varint_too_long() {
        let data = [0x80u8; 11];
        let mut reader = Reader::new(&data);
        assert!(matches!(reader.read_varint("test"), Err(DecodeError::VarintTooLong)));
    }

    #[test]
    fn test_prefixed_bytes_over_limit() {
        let mut writer = Writer::new();
        writer.write_bytes_prefixed(&[7u8; 1000]);

        let mut reader = Reader::new(writer.as_bytes());
        assert!(matches!(
            reader.read_bytes_prefixed(100, "test"),
            Err(DecodeError::LengthExceedsLimit { max: 100, .. })
        ));
    }

    #[test]
    fn test_unexpected_eof() {
        let data = [0u8; 5];
        let mut reader = Reader::new(&data);
        assert!(matches!(reader.read_bytes(10, "test"), Err(DecodeError::UnexpectedEof { .. })));
    }
}
