//! Expansion of undecoded pixel payloads into RGBA pixel matrices.
//!
//! A [`PixelSource`] is pixel data that has not been expanded to full color
//! yet: either palette indices plus the palette that gives them meaning, or
//! raw 24-bit triples. [`decode`] turns either form into a [`PixelMatrix`] of
//! packed `0xRRGGBBAA` words (see [`crate::palette`]).
//!
//! Decoding is a pure function of its inputs and may run on any thread.

use crate::error::{DecodeError, Result};
use crate::palette::{Palette, OPAQUE, PALETTE_COLORS};

/// Bytes per pixel of a raw 24-bit payload.
pub const RAW_BYTES_PER_PIXEL: usize = 3;

/// Pixel data awaiting expansion to RGBA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PixelSource {
    /// One palette index per pixel.
    IndexedWithPalette {
        /// Palette index of each pixel, row-major.
        indices: Vec<u8>,
        /// Palette the indices refer to.
        palette: Palette,
    },

    /// Three bytes per pixel, stored blue, green, red.
    RawRgb(Vec<u8>),
}

impl PixelSource {
    /// Number of pixels this source describes, if its length is well formed.
    #[must_use]
    pub fn pixel_count(&self) -> Option<usize> {
        match self {
            PixelSource::IndexedWithPalette { indices, .. } => Some(indices.len()),
            PixelSource::RawRgb(bytes) => (bytes.len() % RAW_BYTES_PER_PIXEL == 0)
                .then_some(bytes.len() / RAW_BYTES_PER_PIXEL),
        }
    }
}

/// A row-major grid of packed RGBA pixels where every row is `width` long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelMatrix {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl PixelMatrix {
    /// Builds a matrix from a flat pixel vector.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::DimensionMismatch` if `width` is zero while
    /// pixels are present, or the pixel count is not a multiple of `width`.
    pub fn from_pixels(width: usize, pixels: Vec<u32>) -> Result<Self> {
        if pixels.is_empty() {
            return Ok(PixelMatrix {
                width,
                height: 0,
                pixels,
            });
        }

        if width == 0 || pixels.len() % width != 0 {
            return Err(DecodeError::DimensionMismatch {
                reason: format!(
                    "{} pixels do not form rows of width {width}",
                    pixels.len()
                ),
            });
        }

        Ok(PixelMatrix {
            width,
            height: pixels.len() / width,
            pixels,
        })
    }

    /// Creates a matrix filled with one color.
    #[must_use]
    pub fn filled(width: usize, height: usize, rgba: u32) -> Self {
        PixelMatrix {
            width,
            height,
            pixels: vec![rgba; width * height],
        }
    }

    /// Row length in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// All pixels, row-major.
    #[must_use]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Returns the pixel at `(x, y)`, if inside the matrix.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    /// Iterates over the rows; each row is exactly `width` pixels.
    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        // chunks_exact panics on 0, and a zero-width matrix has no rows
        self.pixels.chunks_exact(self.width.max(1))
    }

    /// Serializes the pixels as RGBA8888 bytes, `width * 4` bytes per row.
    #[must_use]
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_be_bytes()).collect()
    }

    /// Consumes the matrix, returning its pixel vector.
    #[must_use]
    pub fn into_pixels(self) -> Vec<u32> {
        self.pixels
    }
}

/// Expands `indices` through a 256-entry RGBA lookup table.
///
/// # Errors
///
/// Returns `DecodeError::MalformedPalette` if the table is not 256 entries,
/// or `DecodeError::DimensionMismatch` for an invalid `width`.
pub fn decode_indexed(indices: &[u8], table: &[u32], width: usize) -> Result<PixelMatrix> {
    if table.len() != PALETTE_COLORS {
        return Err(DecodeError::MalformedPalette {
            expected: PALETTE_COLORS,
            available: table.len(),
        });
    }

    let pixels = indices.iter().map(|&i| table[usize::from(i)]).collect();
    PixelMatrix::from_pixels(width, pixels)
}

/// Expands a pixel source into rows of `width` RGBA pixels.
///
/// # Errors
///
/// - `DecodeError::MalformedPixelData` if a raw RGB payload's length is not
///   a multiple of 3
/// - `DecodeError::DimensionMismatch` if the pixel count is not a multiple of
///   `width`
///
/// ```
/// use h3_assets::pixels::{decode, PixelSource};
///
/// // Two pixels, stored blue-green-red
/// let source = PixelSource::RawRgb(vec![0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00]);
/// let matrix = decode(&source, 2).unwrap();
/// assert_eq!(matrix.pixels(), &[0xFF00_00FF, 0x0000_FFFF]);
/// ```
pub fn decode(source: &PixelSource, width: usize) -> Result<PixelMatrix> {
    match source {
        PixelSource::IndexedWithPalette { indices, palette } => {
            decode_indexed(indices, &palette.expand_to_rgba(), width)
        }
        PixelSource::RawRgb(bytes) => {
            if bytes.len() % RAW_BYTES_PER_PIXEL != 0 {
                return Err(DecodeError::MalformedPixelData {
                    reason: format!(
                        "raw RGB payload of {} bytes is not a multiple of {RAW_BYTES_PER_PIXEL}",
                        bytes.len()
                    ),
                });
            }

            let pixels = bytes
                .chunks_exact(RAW_BYTES_PER_PIXEL)
                .map(|bgr| u32::from_be_bytes([bgr[2], bgr[1], bgr[0], OPAQUE]))
                .collect();
            PixelMatrix::from_pixels(width, pixels)
        }
    }
}
