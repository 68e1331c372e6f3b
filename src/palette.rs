//! 256-entry RGB palettes and their expansion to packed RGBA words.
//!
//! Palettes appear embedded in DEF sprite files, appended to indexed PCX
//! images, and as stand-alone `.pal` archive entries. On disk a palette is
//! 256 consecutive `(r, g, b)` byte triples.
//!
//! # Packed pixel words
//!
//! Expanded colors are `u32` words laid out as `0xRRGGBBAA`. Writing a word
//! with [`u32::to_be_bytes`] yields the `R, G, B, A` byte sequence of an
//! RGBA8888 bitmap, which is what [`crate::materialize`] consumes.

use crate::error::{DecodeError, Result};

/// Number of colors in every palette.
pub const PALETTE_COLORS: usize = 256;

/// Size of an on-disk palette block in bytes.
pub const PALETTE_SIZE: usize = PALETTE_COLORS * 3;

/// Alpha used for fully opaque pixels.
pub const OPAQUE: u8 = 0xFF;

/// A 24-bit palette color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Creates a color from its channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    /// Packs the color with the given alpha into a `0xRRGGBBAA` word.
    #[must_use]
    pub const fn to_rgba(self, alpha: u8) -> u32 {
        u32::from_be_bytes([self.r, self.g, self.b, alpha])
    }
}

/// An immutable table of exactly 256 colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: [Color; PALETTE_COLORS],
}

impl Palette {
    /// Parses a palette from the first 768 bytes of `bytes`.
    ///
    /// Extra trailing bytes are ignored.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::MalformedPalette` if fewer than 768 bytes are
    /// available.
    ///
    /// ```
    /// use h3_assets::palette::Palette;
    ///
    /// let mut bytes = vec![0u8; 768];
    /// bytes[3..6].copy_from_slice(&[255, 128, 0]);
    /// let palette = Palette::parse(&bytes).unwrap();
    /// assert_eq!(palette.color(1).g, 128);
    /// ```
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < PALETTE_SIZE {
            return Err(DecodeError::MalformedPalette {
                expected: PALETTE_SIZE,
                available: bytes.len(),
            });
        }

        let mut colors = [Color::default(); PALETTE_COLORS];
        for (color, rgb) in colors.iter_mut().zip(bytes.chunks_exact(3)) {
            *color = Color::new(rgb[0], rgb[1], rgb[2]);
        }

        Ok(Palette { colors })
    }

    /// Builds a palette from an explicit color array.
    #[must_use]
    pub fn from_colors(colors: [Color; PALETTE_COLORS]) -> Self {
        Palette { colors }
    }

    /// Returns the color at `index`.
    #[must_use]
    pub fn color(&self, index: u8) -> Color {
        self.colors[usize::from(index)]
    }

    /// Returns all 256 colors.
    #[must_use]
    pub fn colors(&self) -> &[Color; PALETTE_COLORS] {
        &self.colors
    }

    /// Expands every entry to an opaque packed RGBA word.
    ///
    /// ```
    /// use h3_assets::palette::{Color, Palette};
    ///
    /// let mut colors = [Color::default(); 256];
    /// colors[7] = Color::new(0x12, 0x34, 0x56);
    /// let table = Palette::from_colors(colors).expand_to_rgba();
    /// assert_eq!(table[7], 0x1234_56FF);
    /// ```
    #[must_use]
    pub fn expand_to_rgba(&self) -> [u32; PALETTE_COLORS] {
        self.colors.map(|c| c.to_rgba(OPAQUE))
    }

    /// Expands the palette with the game's reserved sprite colors applied.
    ///
    /// Sprite frames reserve the low palette indices: index 0 is the
    /// transparent background, index 1 the soft shadow edge and index 4 the
    /// solid shadow body. The remaining entries are opaque.
    #[must_use]
    pub fn expand_with_sprite_keys(&self) -> [u32; PALETTE_COLORS] {
        let mut table = self.expand_to_rgba();
        table[0] = 0x0000_0000;
        table[1] = 0x0000_0040;
        table[4] = 0x0000_0080;
        table
    }
}
