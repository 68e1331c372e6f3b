//! Image entries stored in LOD archives (`.pcx` names).
//!
//! Despite the extension these are not ZSoft PCX files. The layout is:
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0x00 | 4 | `size` - payload bytes |
//! | 0x04 | 4 | `width` |
//! | 0x08 | 4 | `height` |
//! | 0x0C | `size` | pixel payload |
//!
//! When `size == width * height` the payload is palette indices and a
//! 768-byte palette follows it. When `size == width * height * 3` the payload
//! is raw blue-green-red triples.

use crate::binary::{read_bytes, read_u32_le};
use crate::error::{DecodeError, Result};
use crate::palette::{Palette, PALETTE_SIZE};
use crate::pixels::{self, PixelMatrix, PixelSource, RAW_BYTES_PER_PIXEL};

/// Size of the image header in bytes.
pub const PCX_HEADER_SIZE: usize = 12;

/// A decoded image entry, not yet expanded to RGBA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcxImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// The pixel payload.
    pub source: PixelSource,
}

impl PcxImage {
    /// Parses an image entry.
    ///
    /// # Errors
    ///
    /// - `DecodeError::TruncatedInput` if the header, payload or palette is cut short
    /// - `DecodeError::DimensionMismatch` if exactly one side is zero
    /// - `DecodeError::MalformedPixelData` if `size` matches neither the
    ///   indexed nor the raw layout
    pub fn parse(data: &[u8]) -> Result<Self> {
        let size = read_u32_le(data, 0)? as usize;
        let width = read_u32_le(data, 4)?;
        let height = read_u32_le(data, 8)?;

        if (width == 0) != (height == 0) {
            return Err(DecodeError::DimensionMismatch {
                reason: format!("image of {width}x{height} has one empty side"),
            });
        }

        let pixel_count = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| DecodeError::DimensionMismatch {
                reason: format!("image of {width}x{height} is too large"),
            })?;

        let payload = read_bytes(data, PCX_HEADER_SIZE, size)?;

        let source = if size == pixel_count {
            let palette = Palette::parse(read_bytes(data, PCX_HEADER_SIZE + size, PALETTE_SIZE)?)?;
            PixelSource::IndexedWithPalette {
                indices: payload.to_vec(),
                palette,
            }
        } else if Some(size) == pixel_count.checked_mul(RAW_BYTES_PER_PIXEL) {
            PixelSource::RawRgb(payload.to_vec())
        } else {
            return Err(DecodeError::MalformedPixelData {
                reason: format!(
                    "payload of {size} bytes fits neither indexed nor RGB {width}x{height}"
                ),
            });
        };

        Ok(PcxImage {
            width,
            height,
            source,
        })
    }

    /// Returns `true` if the image carries its own palette.
    #[must_use]
    pub fn is_indexed(&self) -> bool {
        matches!(self.source, PixelSource::IndexedWithPalette { .. })
    }

    /// Expands the image to RGBA.
    ///
    /// # Errors
    ///
    /// Propagates [`pixels::decode`] failures.
    pub fn to_pixels(&self) -> Result<PixelMatrix> {
        pixels::decode(&self.source, self.width as usize)
    }
}
