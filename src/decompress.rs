//! Zlib and gzip inflation for archive entries and map files.
//!
//! - **LOD entries** with a non-zero compressed size hold a single zlib
//!   stream that inflates to exactly the entry's declared size.
//! - **Map files** (`.h3m`) ship as gzip members; an uncompressed map is
//!   passed through unchanged. Inflated maps may not exceed
//!   [`MAX_MAP_LEN`] bytes.
//!
//! Neither path trusts a declared size for allocation: output is read
//! through a hard limit and the buffer grows only as bytes arrive.

use std::borrow::Cow;
use std::io::Read;

use flate2::read::{GzDecoder, ZlibDecoder};

use crate::error::{DecodeError, Result};

/// The two leading bytes of every gzip member.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Largest inflated map accepted by [`maybe_gunzip`].
pub const MAX_MAP_LEN: usize = 0x100_0000;

/// Upper bound on the buffer reserved ahead of inflation.
const INITIAL_CAPACITY: usize = 0x10_0000;

/// Inflates a zlib stream that must produce exactly `expected_len` bytes.
///
/// # Arguments
///
/// * `name` - Entry name, used in error messages
/// * `data` - The compressed bytes
/// * `expected_len` - The declared uncompressed size
///
/// # Errors
///
/// Returns `DecodeError::DecompressionFailed` if the stream is corrupt or
/// inflates to a different length.
///
/// ```
/// use std::io::Write;
/// use flate2::{write::ZlibEncoder, Compression};
/// use h3_assets::decompress::inflate_zlib;
///
/// let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
/// encoder.write_all(b"Test").unwrap();
/// let compressed = encoder.finish().unwrap();
///
/// assert_eq!(inflate_zlib("test.txt", &compressed, 4).unwrap(), b"Test");
/// ```
pub fn inflate_zlib(name: &str, data: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    let result = read_bounded(name, ZlibDecoder::new(data), expected_len)?;

    if result.len() != expected_len {
        return Err(DecodeError::DecompressionFailed {
            name: name.to_string(),
            reason: format!(
                "inflated to {} bytes, directory declares {expected_len}",
                result.len()
            ),
        });
    }

    Ok(result)
}

/// Reads `reader` to the end, failing once more than `limit` bytes come out.
fn read_bounded(name: &str, reader: impl Read, limit: usize) -> Result<Vec<u8>> {
    let failed = |reason: String| DecodeError::DecompressionFailed {
        name: name.to_string(),
        reason,
    };

    let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    let mut result = Vec::with_capacity(limit.min(INITIAL_CAPACITY));
    reader
        .take(cap)
        .read_to_end(&mut result)
        .map_err(|e| failed(e.to_string()))?;

    if result.len() > limit {
        return Err(failed(format!("inflates past {limit} bytes")));
    }
    Ok(result)
}

/// Returns `true` if `data` starts with the gzip magic bytes.
#[must_use]
pub fn is_gzip(data: &[u8]) -> bool {
    data.starts_with(&GZIP_MAGIC)
}

/// Inflates `data` if it is a gzip member, otherwise borrows it unchanged.
///
/// # Errors
///
/// Returns `DecodeError::DecompressionFailed` if a gzip member is corrupt or
/// inflates past [`MAX_MAP_LEN`] bytes.
pub fn maybe_gunzip<'a>(name: &str, data: &'a [u8]) -> Result<Cow<'a, [u8]>> {
    gunzip_within(name, data, MAX_MAP_LEN)
}

/// Like [`maybe_gunzip`], with an explicit output limit.
///
/// # Errors
///
/// Returns `DecodeError::DecompressionFailed` if a gzip member is corrupt or
/// inflates past `limit` bytes.
pub fn gunzip_within<'a>(name: &str, data: &'a [u8], limit: usize) -> Result<Cow<'a, [u8]>> {
    if !is_gzip(data) {
        return Ok(Cow::Borrowed(data));
    }

    let result = read_bounded(name, GzDecoder::new(data), limit)?;

    log::debug!("Inflated {name}: {} -> {} bytes", data.len(), result.len());
    Ok(Cow::Owned(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use flate2::write::{GzEncoder, ZlibEncoder};
    use flate2::Compression;

    /// Creates valid zlib compressed data for "Test" string.
    fn create_zlib_test_data() -> Vec<u8> {
        vec![0x78, 0x9C, 0x0B, 0x49, 0x2D, 0x2E, 0x01, 0x00, 0x03, 0xDD, 0x01, 0xA1]
    }

    #[test]
    fn test_inflate_known_stream() {
        let result = inflate_zlib("test", &create_zlib_test_data(), 4).unwrap();
        assert_eq!(result, b"Test");
    }

    #[test]
    fn test_inflate_roundtrip_larger_payload() {
        let payload: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(&payload).unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(
            inflate_zlib("ramp.bin", &compressed, payload.len()).unwrap(),
            payload
        );
    }

    #[test]
    fn test_inflate_length_mismatch() {
        let result = inflate_zlib("test", &create_zlib_test_data(), 5);
        assert!(matches!(
            result,
            Err(DecodeError::DecompressionFailed { .. })
        ));
    }

    #[test]
    fn test_inflate_invalid_zlib() {
        let result = inflate_zlib("broken.def", &[0xFF, 0xFF, 0xFF, 0xFF], 4);
        match result {
            Err(DecodeError::DecompressionFailed { name, .. }) => assert_eq!(name, "broken.def"),
            other => panic!("Expected DecompressionFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_inflate_longer_than_declared() {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(&[0u8; 10_000]).unwrap();
        let compressed = encoder.finish().unwrap();

        match inflate_zlib("bomb.def", &compressed, 100) {
            Err(DecodeError::DecompressionFailed { reason, .. }) => {
                assert!(reason.contains("past 100 bytes"), "{reason}");
            }
            other => panic!("Expected DecompressionFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_inflate_huge_declared_size() {
        // Declares 4 GiB, holds 4 bytes
        let result = inflate_zlib("test", &create_zlib_test_data(), u32::MAX as usize);
        match result {
            Err(DecodeError::DecompressionFailed { reason, .. }) => {
                assert!(reason.contains("inflated to 4 bytes"), "{reason}");
            }
            other => panic!("Expected DecompressionFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_gunzip_over_limit() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&[7u8; 4096]).unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(gunzip_within("map.h3m", &compressed, 4096).unwrap().len(), 4096);
        assert!(matches!(
            gunzip_within("map.h3m", &compressed, 4095),
            Err(DecodeError::DecompressionFailed { .. })
        ));
    }

    #[test]
    fn test_maybe_gunzip_passthrough() {
        let data = b"\x1C\x00\x00\x00plain map";
        let result = maybe_gunzip("map.h3m", data).unwrap();
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(&*result, data);
    }

    #[test]
    fn test_maybe_gunzip_inflates() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"map body").unwrap();
        let compressed = encoder.finish().unwrap();

        assert!(is_gzip(&compressed));
        assert_eq!(&*maybe_gunzip("map.h3m", &compressed).unwrap(), b"map body");
    }

    #[test]
    fn test_maybe_gunzip_corrupt() {
        let data = [0x1F, 0x8B, 0x08, 0x00, 0xFF, 0xFF];
        assert!(matches!(
            maybe_gunzip("map.h3m", &data),
            Err(DecodeError::DecompressionFailed { .. })
        ));
    }
}
