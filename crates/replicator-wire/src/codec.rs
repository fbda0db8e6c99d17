//! Little-endian, length-prefixed binary codec.
//!
//! The source this protocol was distilled from read and wrote primitives in
//! host byte order; §9 of the design notes explicitly standardizes on
//! little-endian instead, so the wire format is portable across hosts.
//! Byte strings and vectors are length-prefixed with a `u32`.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::WireError;

/// Maximum length accepted for any length-prefixed byte string or vector,
/// guarding against a corrupt or adversarial length prefix causing an
/// unbounded allocation.
pub const MAX_PREFIXED_LEN: u32 = 64 * 1024 * 1024;

/// Appends little-endian, length-prefixed values to an in-memory buffer.
#[derive(Debug, Default)]
pub struct BinaryWriter {
    buf: BytesMut,
}

/// A reserved-but-not-yet-written `u32` length field.
///
/// Obtained from [`BinaryWriter::reserve_u32_placeholder`]; write the body,
/// then call [`BinaryWriter::fill_u32_placeholder`] with the body's length.
#[derive(Debug, Clone, Copy)]
pub struct Placeholder {
    offset: usize,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(u8::from(value));
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buf.put_u16_le(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.put_u32_le(value);
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf.put_u64_le(value);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.put_i32_le(value);
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buf.put_i64_le(value);
    }

    /// Writes a length-prefixed (`u32`) byte slice.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_u32(bytes.len() as u32);
        self.buf.put_slice(bytes);
    }

    /// Writes a length-prefixed (`u32`) UTF-8 string.
    pub fn write_str(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    /// Writes a length-prefixed (`u32`) vector of `Encode` values.
    pub fn write_vec<T: Encode>(&mut self, items: &[T]) {
        self.write_u32(items.len() as u32);
        for item in items {
            item.encode(self);
        }
    }

    /// Reserves a `u32` length field to be back-patched later, returning a
    /// handle that must be passed to [`Self::fill_u32_placeholder`].
    pub fn reserve_u32_placeholder(&mut self) -> Placeholder {
        let offset = self.buf.len();
        self.buf.put_u32_le(0);
        Placeholder { offset }
    }

    /// Back-patches a previously reserved placeholder with its final value.
    pub fn fill_u32_placeholder(&mut self, placeholder: Placeholder, value: u32) {
        self.buf[placeholder.offset..placeholder.offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Returns the number of bytes written so far, relative to the start of
    /// this writer — used to compute the length to back-patch into a
    /// placeholder for a nested variable-length field.
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Reads little-endian, length-prefixed values from an in-memory buffer.
pub struct BinaryReader<'a> {
    buf: &'a [u8],
}

impl<'a> BinaryReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn require(&self, needed: usize) -> Result<(), WireError> {
        if self.buf.len() < needed {
            Err(WireError::UnexpectedEof {
                needed,
                available: self.buf.len(),
            })
        } else {
            Ok(())
        }
    }

    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        self.require(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_bool(&mut self) -> Result<bool, WireError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16, WireError> {
        self.require(2)?;
        Ok(self.buf.get_u16_le())
    }

    pub fn read_u32(&mut self) -> Result<u32, WireError> {
        self.require(4)?;
        Ok(self.buf.get_u32_le())
    }

    pub fn read_u64(&mut self) -> Result<u64, WireError> {
        self.require(8)?;
        Ok(self.buf.get_u64_le())
    }

    pub fn read_i32(&mut self) -> Result<i32, WireError> {
        self.require(4)?;
        Ok(self.buf.get_i32_le())
    }

    pub fn read_i64(&mut self) -> Result<i64, WireError> {
        self.require(8)?;
        Ok(self.buf.get_i64_le())
    }

    /// Reads a length-prefixed (`u32`) byte vector.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>, WireError> {
        let len = self.read_u32()?;
        if len > MAX_PREFIXED_LEN {
            return Err(WireError::LengthExceedsMax {
                len,
                max: MAX_PREFIXED_LEN,
            });
        }
        let len = len as usize;
        self.require(len)?;
        let mut out = vec![0u8; len];
        self.buf.copy_to_slice(&mut out);
        Ok(out)
    }

    /// Reads a length-prefixed (`u32`) UTF-8 string.
    pub fn read_str(&mut self) -> Result<String, WireError> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes).map_err(|_| WireError::InvalidUtf8)
    }

    /// Reads a length-prefixed (`u32`) vector of `Decode` values.
    pub fn read_vec<T: Decode>(&mut self) -> Result<Vec<T>, WireError> {
        let len = self.read_u32()?;
        if len > MAX_PREFIXED_LEN {
            return Err(WireError::LengthExceedsMax {
                len,
                max: MAX_PREFIXED_LEN,
            });
        }
        let mut out = Vec::with_capacity(len as usize);
        for _ in 0..len {
            out.push(T::decode(self)?);
        }
        Ok(out)
    }

    pub fn remaining(&self) -> usize {
        self.buf.len()
    }
}

/// A value that can be written to a [`BinaryWriter`].
pub trait Encode {
    fn encode(&self, writer: &mut BinaryWriter);
}

/// A value that can be read from a [`BinaryReader`].
pub trait Decode: Sized {
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, WireError>;
}

impl Encode for u8 {
    fn encode(&self, writer: &mut BinaryWriter) {
        writer.write_u8(*self);
    }
}
impl Decode for u8 {
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, WireError> {
        reader.read_u8()
    }
}

impl Encode for u32 {
    fn encode(&self, writer: &mut BinaryWriter) {
        writer.write_u32(*self);
    }
}
impl Decode for u32 {
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, WireError> {
        reader.read_u32()
    }
}

impl Encode for u64 {
    fn encode(&self, writer: &mut BinaryWriter) {
        writer.write_u64(*self);
    }
}
impl Decode for u64 {
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, WireError> {
        reader.read_u64()
    }
}

impl Encode for String {
    fn encode(&self, writer: &mut BinaryWriter) {
        writer.write_str(self);
    }
}
impl Decode for String {
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self, WireError> {
        reader.read_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_primitives() {
        let mut w = BinaryWriter::new();
        w.write_u8(7);
        w.write_bool(true);
        w.write_u32(0xDEAD_BEEF);
        w.write_i64(-42);
        w.write_str("gpid");

        let bytes = w.into_bytes();
        let mut r = BinaryReader::new(&bytes);
        assert_eq!(r.read_u8().unwrap(), 7);
        assert!(r.read_bool().unwrap());
        assert_eq!(r.read_u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(r.read_i64().unwrap(), -42);
        assert_eq!(r.read_str().unwrap(), "gpid");
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn round_trips_vec_of_strings() {
        let mut w = BinaryWriter::new();
        let items = vec!["a".to_string(), "bb".to_string(), "ccc".to_string()];
        w.write_vec(&items);

        let bytes = w.into_bytes();
        let mut r = BinaryReader::new(&bytes);
        let decoded: Vec<String> = r.read_vec().unwrap();
        assert_eq!(decoded, items);
    }

    #[test]
    fn placeholder_back_patches_length() {
        let mut w = BinaryWriter::new();
        w.write_u32(1); // leading field, to prove offsets aren't zero-based
        let placeholder = w.reserve_u32_placeholder();
        let body_start = w.position();
        w.write_str("nested body");
        let body_len = (w.position() - body_start) as u32;
        w.fill_u32_placeholder(placeholder, body_len);

        let bytes = w.into_bytes();
        let mut r = BinaryReader::new(&bytes);
        assert_eq!(r.read_u32().unwrap(), 1);
        let declared_len = r.read_u32().unwrap();
        assert_eq!(declared_len, body_len);
        assert_eq!(r.read_str().unwrap(), "nested body");
    }

    #[test]
    fn truncated_buffer_reports_unexpected_eof() {
        let mut r = BinaryReader::new(&[0x01, 0x00]);
        assert_eq!(
            r.read_u32().unwrap_err(),
            WireError::UnexpectedEof {
                needed: 4,
                available: 2
            }
        );
    }

    #[test]
    fn oversized_length_prefix_is_rejected() {
        let mut w = BinaryWriter::new();
        w.write_u32(MAX_PREFIXED_LEN + 1);
        let bytes = w.into_bytes();
        let mut r = BinaryReader::new(&bytes);
        assert_eq!(
            r.read_bytes().unwrap_err(),
            WireError::LengthExceedsMax {
                len: MAX_PREFIXED_LEN + 1,
                max: MAX_PREFIXED_LEN,
            }
        );
    }
}
