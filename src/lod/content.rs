//! Typed payloads produced by decoding archive entries.

use crate::binary::{read_bytes, read_u8};
use crate::def::DefFile;
use crate::error::Result;
use crate::palette::Palette;
use crate::pcx::PcxImage;

/// Size of a `.msk` entry in bytes.
pub const MASK_SIZE: usize = 14;

/// The decoded form of an archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedContent {
    /// A text table, undecoded bytes.
    Text(Vec<u8>),
    /// An image.
    Image(PcxImage),
    /// A sprite definition.
    Definition(DefFile),
    /// A standalone palette.
    Palette(Palette),
    /// An object mask.
    Mask(Mask),
    /// Content passed through unparsed (fonts, campaigns, audio).
    Binary(Vec<u8>),
}

impl DecodedContent {
    /// Short label for the variant, used in listings.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            DecodedContent::Text(_) => "text",
            DecodedContent::Image(_) => "image",
            DecodedContent::Definition(_) => "definition",
            DecodedContent::Palette(_) => "palette",
            DecodedContent::Mask(_) => "mask",
            DecodedContent::Binary(_) => "binary",
        }
    }
}

/// An adventure-map object mask.
///
/// Width and height are in tiles. Each bitmap has one bit per tile of the
/// object's 8x6 footprint, anchored at the bottom-right corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mask {
    /// Footprint width in tiles.
    pub width: u8,
    /// Footprint height in tiles.
    pub height: u8,
    /// Set bits block movement.
    pub passability: [u8; 6],
    /// Set bits carry the object's shadow.
    pub shadow: [u8; 6],
}

impl Mask {
    /// Parses a 14-byte mask entry.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::TruncatedInput` if fewer than 14 bytes are present.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut passability = [0u8; 6];
        let mut shadow = [0u8; 6];
        passability.copy_from_slice(read_bytes(data, 2, 6)?);
        shadow.copy_from_slice(read_bytes(data, 8, 6)?);

        Ok(Mask {
            width: read_u8(data, 0)?,
            height: read_u8(data, 1)?,
            passability,
            shadow,
        })
    }

    /// Returns `true` if the tile `(dx, dy)`, counted from the object's
    /// bottom-right corner, blocks movement.
    #[must_use]
    pub fn blocks(&self, dx: usize, dy: usize) -> bool {
        bit_set(&self.passability, dx, dy)
    }
}

fn bit_set(bitmap: &[u8; 6], dx: usize, dy: usize) -> bool {
    if dx >= 8 || dy >= 6 {
        return false;
    }
    bitmap[5 - dy] & (1 << dx) != 0
}
