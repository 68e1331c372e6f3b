//! LOD directory records.
//!
//! Each record is 32 bytes:
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0x00 | 16 | name, NUL padded |
//! | 0x10 | 4 | payload offset |
//! | 0x14 | 4 | uncompressed size |
//! | 0x18 | 4 | kind tag |
//! | 0x1C | 4 | compressed size (0 = stored raw) |

use crate::binary::{read_fixed_string, read_u32_le};
use crate::error::Result;

/// Size of one directory record in bytes.
pub const ENTRY_RECORD_SIZE: usize = 32;

/// Length of the name field of a directory record.
pub const ENTRY_NAME_SIZE: usize = 16;

/// What an archive entry contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// An image (`.pcx`).
    Image,
    /// A sprite definition (`.def`).
    SpriteDef,
    /// A text table (`.txt`).
    Text,
    /// A bitmap font (`.fnt`).
    Font,
    /// A campaign (`.h3c`).
    Campaign,
    /// A standalone palette (`.pal`).
    Palette,
    /// An object passability mask (`.msk`).
    Mask,
    /// An audio index or sound bank (`.xmi`, `.wav`, `.snd`).
    AudioIndex,
    /// Anything else.
    Unknown,
}

impl EntryKind {
    /// Classifies an entry by its directory tag, falling back to the file
    /// extension for tags the game leaves generic.
    ///
    /// ```
    /// use h3_assets::lod::EntryKind;
    ///
    /// assert_eq!(EntryKind::classify(0x42, "CBEHOL.DEF"), EntryKind::SpriteDef);
    /// assert_eq!(EntryKind::classify(0x00, "Theme.xmi"), EntryKind::AudioIndex);
    /// assert_eq!(EntryKind::classify(0x00, "readme"), EntryKind::Unknown);
    /// ```
    #[must_use]
    pub fn classify(tag: u32, name: &str) -> Self {
        match tag {
            0x01 => EntryKind::Campaign,
            0x02 => EntryKind::Text,
            0x10 | 0x11 => EntryKind::Image,
            0x40..=0x49 => EntryKind::SpriteDef,
            0x4F => EntryKind::Mask,
            0x50 => EntryKind::Font,
            0x60 => EntryKind::Palette,
            _ => Self::from_extension(name),
        }
    }

    fn from_extension(name: &str) -> Self {
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pcx" => EntryKind::Image,
            "def" => EntryKind::SpriteDef,
            "txt" => EntryKind::Text,
            "fnt" => EntryKind::Font,
            "h3c" => EntryKind::Campaign,
            "pal" => EntryKind::Palette,
            "msk" => EntryKind::Mask,
            "xmi" | "wav" | "snd" => EntryKind::AudioIndex,
            _ => EntryKind::Unknown,
        }
    }
}

/// How an entry's payload is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Stored as-is.
    None,
    /// A single zlib stream.
    Zlib,
}

/// One directory record of a LOD archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Entry name as stored, e.g. `"AvWattak.def"`.
    pub name: String,
    /// Content classification.
    pub kind: EntryKind,
    /// Raw kind tag from the directory.
    pub tag: u32,
    /// Payload offset from the start of the archive.
    pub offset: u32,
    /// Payload size inside the archive.
    pub stored_size: u32,
    /// Size after decompression.
    pub actual_size: u32,
    /// Payload storage method.
    pub compression: Compression,
}

impl ArchiveEntry {
    /// Parses the directory record at `offset`.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::TruncatedInput` if the record is cut short.
    pub fn parse(data: &[u8], offset: usize) -> Result<Self> {
        let name = read_fixed_string(data, offset, ENTRY_NAME_SIZE)?;
        let payload_offset = read_u32_le(data, offset + 0x10)?;
        let actual_size = read_u32_le(data, offset + 0x14)?;
        let tag = read_u32_le(data, offset + 0x18)?;
        let compressed_size = read_u32_le(data, offset + 0x1C)?;

        let (compression, stored_size) = if compressed_size == 0 {
            (Compression::None, actual_size)
        } else {
            (Compression::Zlib, compressed_size)
        };

        Ok(ArchiveEntry {
            kind: EntryKind::classify(tag, &name),
            name,
            tag,
            offset: payload_offset,
            stored_size,
            actual_size,
            compression,
        })
    }

    /// Returns `true` if the payload is zlib-compressed.
    #[must_use]
    pub fn is_compressed(&self) -> bool {
        self.compression == Compression::Zlib
    }

    /// End offset of the payload, or `None` on overflow.
    #[must_use]
    pub fn end(&self) -> Option<usize> {
        (self.offset as usize).checked_add(self.stored_size as usize)
    }
}
