//! Binary reading utilities for Heroes III asset formats.
//!
//! Every read is bounds-checked; running off the end of a buffer yields
//! [`DecodeError::TruncatedInput`] with the size that was needed.
//!
//! Two styles are offered:
//! - free functions taking an explicit offset, used by the random-access
//!   formats (LOD directories, DEF frames);
//! - [`ByteReader`], a forward-only cursor used by the sequential map format.
//!
//! # Example
//!
//! ```
//! use h3_assets::binary::{read_fixed_string, read_u32_le};
//!
//! // First directory record of an archive: name, then payload offset
//! let mut record = b"H3BITMAP.TXT\0\0\0\0".to_vec();
//! record.extend_from_slice(&0x1000u32.to_le_bytes());
//!
//! assert_eq!(read_fixed_string(&record, 0, 16).unwrap(), "H3BITMAP.TXT");
//! assert_eq!(read_u32_le(&record, 16).unwrap(), 0x1000);
//! ```

use crate::error::{DecodeError, Result};

/// Returns `offset..offset + len` if it lies within a buffer of `available` bytes.
fn checked_range(offset: usize, len: usize, available: usize) -> Result<std::ops::Range<usize>> {
    let end = offset
        .checked_add(len)
        .ok_or_else(|| DecodeError::truncated(usize::MAX, available))?;

    if end > available {
        return Err(DecodeError::truncated(end, available));
    }

    Ok(offset..end)
}

/// Reads a single byte at the given offset.
///
/// # Errors
///
/// Returns `DecodeError::TruncatedInput` if `offset` is beyond the buffer.
pub fn read_u8(bytes: &[u8], offset: usize) -> Result<u8> {
    bytes
        .get(offset)
        .copied()
        .ok_or_else(|| DecodeError::truncated(offset.saturating_add(1), bytes.len()))
}

/// Reads a `u16` stored little-endian at `offset`.
///
/// # Errors
///
/// Returns `DecodeError::TruncatedInput` if fewer than 2 bytes remain.
///
/// ```
/// use h3_assets::binary::read_u16_le;
///
/// // Faction mask allowing all nine towns
/// assert_eq!(read_u16_le(&[0xFF, 0x01], 0).unwrap(), 0x01FF);
/// ```
pub fn read_u16_le(bytes: &[u8], offset: usize) -> Result<u16> {
    let range = checked_range(offset, 2, bytes.len())?;
    let slice = &bytes[range];
    Ok(u16::from_le_bytes([slice[0], slice[1]]))
}

/// Reads a `u32` stored little-endian at `offset`.
///
/// # Errors
///
/// Returns `DecodeError::TruncatedInput` if fewer than 4 bytes remain.
///
/// ```
/// use h3_assets::binary::read_u32_le;
///
/// // DEF kind tag of an adventure-map object
/// assert_eq!(read_u32_le(&[0x43, 0, 0, 0], 0).unwrap(), 0x43);
/// ```
pub fn read_u32_le(bytes: &[u8], offset: usize) -> Result<u32> {
    let range = checked_range(offset, 4, bytes.len())?;
    let slice = &bytes[range];
    Ok(u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]))
}

/// Reads a little-endian i32 value from the byte buffer at the given offset.
///
/// # Errors
///
/// Returns `DecodeError::TruncatedInput` if fewer than 4 bytes remain.
pub fn read_i32_le(bytes: &[u8], offset: usize) -> Result<i32> {
    read_u32_le(bytes, offset).map(|v| i32::from_le_bytes(v.to_le_bytes()))
}

/// Borrows `len` bytes starting at `offset`.
///
/// # Errors
///
/// Returns `DecodeError::TruncatedInput` if the range ends past the buffer,
/// including when `offset + len` overflows.
///
/// ```
/// use h3_assets::binary::read_bytes;
///
/// let data = b"LOD\x00\xC8\x00\x00\x00";
/// assert_eq!(read_bytes(data, 0, 4).unwrap(), b"LOD\x00");
/// ```
pub fn read_bytes(bytes: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    let range = checked_range(offset, len, bytes.len())?;
    Ok(&bytes[range])
}

/// Reads a fixed-length, NUL-padded name field.
///
/// The name ends at the first NUL byte or at `len`. Heroes III names are
/// single-byte encoded; each byte maps to the Unicode code point of the same
/// value (Latin-1), so decoding never fails.
///
/// # Errors
///
/// Returns `DecodeError::TruncatedInput` if `offset + len` is beyond the buffer.
///
/// ```
/// use h3_assets::binary::read_fixed_string;
///
/// let data = b"grass0.pcx\0\0\0";
/// assert_eq!(read_fixed_string(data, 0, 13).unwrap(), "grass0.pcx");
/// ```
pub fn read_fixed_string(bytes: &[u8], offset: usize, len: usize) -> Result<String> {
    let field = read_bytes(bytes, offset, len)?;
    let name = field.split(|&b| b == 0).next().unwrap_or(field);
    Ok(latin1_to_string(name))
}

/// Decodes single-byte text, mapping each byte to the same code point.
#[must_use]
pub fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// A forward-only cursor over a byte buffer.
///
/// Each read advances the position past the consumed bytes. On failure the
/// position is left unchanged.
///
/// ```
/// use h3_assets::binary::ByteReader;
///
/// let mut reader = ByteReader::new(b"\x04\x00\x00\x00Hero\x01");
/// assert_eq!(reader.read_string().unwrap(), "Hero");
/// assert!(reader.read_bool().unwrap());
/// assert_eq!(reader.remaining(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a reader positioned at the start of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        ByteReader { data, position: 0 }
    }

    /// Current offset from the start of the buffer.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes left to read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Reads `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::TruncatedInput` if fewer than `len` bytes remain.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let slice = read_bytes(self.data, self.position, len)?;
        self.position += len;
        Ok(slice)
    }

    /// Skips `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::TruncatedInput` if fewer than `len` bytes remain.
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.read_bytes(len).map(|_| ())
    }

    /// Reads one byte.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::TruncatedInput` at the end of the buffer.
    pub fn read_u8(&mut self) -> Result<u8> {
        let value = read_u8(self.data, self.position)?;
        self.position += 1;
        Ok(value)
    }

    /// Reads one signed byte.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::TruncatedInput` at the end of the buffer.
    pub fn read_i8(&mut self) -> Result<i8> {
        self.read_u8().map(|b| i8::from_le_bytes([b]))
    }

    /// Reads a byte as a boolean (any non-zero value is `true`).
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::TruncatedInput` at the end of the buffer.
    pub fn read_bool(&mut self) -> Result<bool> {
        self.read_u8().map(|b| b != 0)
    }

    /// Reads a little-endian u16.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::TruncatedInput` if fewer than 2 bytes remain.
    pub fn read_u16(&mut self) -> Result<u16> {
        let value = read_u16_le(self.data, self.position)?;
        self.position += 2;
        Ok(value)
    }

    /// Reads a little-endian u32.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::TruncatedInput` if fewer than 4 bytes remain.
    pub fn read_u32(&mut self) -> Result<u32> {
        let value = read_u32_le(self.data, self.position)?;
        self.position += 4;
        Ok(value)
    }

    /// Reads a `u32` length-prefixed Latin-1 string.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::TruncatedInput` if the prefix or the string body
    /// runs past the end of the buffer.
    pub fn read_string(&mut self) -> Result<String> {
        let start = self.position;
        let len = self.read_u32()? as usize;
        match self.read_bytes(len) {
            Ok(bytes) => Ok(latin1_to_string(bytes)),
            Err(e) => {
                self.position = start;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u8() {
        let data = [0x01, 0xFF];
        assert_eq!(read_u8(&data, 1).unwrap(), 0xFF);
        assert!(matches!(
            read_u8(&data, 2),
            Err(DecodeError::TruncatedInput {
                expected: 3,
                available: 2
            })
        ));
    }

    #[test]
    fn test_read_u16_le_straddles_end() {
        let factions = 0x01FFu16.to_le_bytes();
        assert_eq!(read_u16_le(&factions, 0).unwrap(), 0x01FF);
        assert!(matches!(
            read_u16_le(&factions, 1),
            Err(DecodeError::TruncatedInput {
                expected: 3,
                available: 2
            })
        ));
        assert!(read_u16_le(&factions, 10).is_err());
    }

    #[test]
    fn test_read_u32_le_real_lod_kind() {
        // Base-game archives store 200 at offset 4
        let data = [0x4C, 0x4F, 0x44, 0x00, 0xC8, 0x00, 0x00, 0x00];
        assert_eq!(read_u32_le(&data, 4).unwrap(), 200);
    }

    #[test]
    fn test_read_u32_le_cut_short() {
        let def_kind = [0x43, 0x00, 0x00];
        assert!(matches!(
            read_u32_le(&def_kind, 0),
            Err(DecodeError::TruncatedInput {
                expected: 4,
                available: 3
            })
        ));
    }

    #[test]
    fn test_read_i32_le_negative() {
        let data = (-7i32).to_le_bytes();
        assert_eq!(read_i32_le(&data, 0).unwrap(), -7);
    }

    #[test]
    fn test_read_bytes_zero_length_at_end() {
        let data = b"LOD\0";
        assert_eq!(read_bytes(data, 4, 0).unwrap(), &[] as &[u8]);
    }

    #[test]
    fn test_read_bytes_huge_length_does_not_overflow() {
        let data = b"LOD\0";
        assert!(matches!(
            read_bytes(data, 2, usize::MAX),
            Err(DecodeError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn test_read_fixed_string_padding() {
        let data = b"AVWattak.def\x00\x00\x00\x00";
        assert_eq!(read_fixed_string(data, 0, 16).unwrap(), "AVWattak.def");

        // A name filling the whole field has no terminator
        let data = b"ZELF_AVATAR.PCX\x00";
        assert_eq!(read_fixed_string(data, 0, 13).unwrap(), "ZELF_AVATAR.P");
    }

    #[test]
    fn test_read_fixed_string_latin1() {
        let data = [b'C', 0xE9, 0x00];
        assert_eq!(read_fixed_string(&data, 0, 3).unwrap(), "C\u{e9}");
    }

    #[test]
    fn test_byte_reader_sequence() {
        let mut data = vec![0x1C, 0x00, 0x00, 0x00, 0x01, 0xFE];
        data.extend_from_slice(&0x0102u16.to_le_bytes());

        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_u32().unwrap(), 0x1C);
        assert!(reader.read_bool().unwrap());
        assert_eq!(reader.read_i8().unwrap(), -2);
        assert_eq!(reader.read_u16().unwrap(), 0x0102);
        assert_eq!(reader.position(), 8);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_byte_reader_failed_read_keeps_position() {
        let mut reader = ByteReader::new(&[0x01, 0x02, 0x03]);
        reader.skip(1).unwrap();
        assert!(reader.read_u32().is_err());
        assert_eq!(reader.position(), 1);
        assert_eq!(reader.read_u16().unwrap(), 0x0302);
    }

    #[test]
    fn test_byte_reader_truncated_string() {
        let mut data = 10u32.to_le_bytes().to_vec();
        data.extend_from_slice(b"short");

        let mut reader = ByteReader::new(&data);
        assert!(matches!(
            reader.read_string(),
            Err(DecodeError::TruncatedInput { .. })
        ));
        assert_eq!(reader.position(), 0);
    }
}
