//! DEF sprite-definition files.
//!
//! A DEF file groups animation frames into blocks that share one embedded
//! palette. Creatures, adventure-map objects, terrain tiles, cursors and
//! interface buttons are all stored this way.
//!
//! # Layout
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0x000 | 4 | kind tag (0x40–0x49) |
//! | 0x004 | 4 | width |
//! | 0x008 | 4 | height |
//! | 0x00C | 4 | block count |
//! | 0x010 | 768 | palette |
//! | 0x310 | var | block directories |
//!
//! Each block directory is `id: u32`, `frame_count: u32`, 8 reserved bytes,
//! `frame_count` 13-byte frame names and `frame_count` u32 frame offsets.
//! Frame payloads follow the last directory. Each starts with a 32-byte
//! header:
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0x00 | 4 | payload size |
//! | 0x04 | 4 | encoding (see [`rle`]) |
//! | 0x08 | 4 | full width |
//! | 0x0C | 4 | full height |
//! | 0x10 | 4 | content width |
//! | 0x14 | 4 | content height |
//! | 0x18 | 4 | left margin (i32) |
//! | 0x1C | 4 | top margin (i32) |
//!
//! # Example
//!
//! ```no_run
//! use h3_assets::def::DefFile;
//!
//! let data = std::fs::read("AvWattak.def").unwrap();
//! let def = DefFile::parse(&data)?;
//! for block in &def.blocks {
//!     println!("block {}: {} frames", block.id, block.frames.len());
//! }
//! # Ok::<(), h3_assets::error::DecodeError>(())
//! ```

pub mod rle;

use crate::binary::{read_bytes, read_fixed_string, read_i32_le, read_u32_le};
use crate::error::{DecodeError, Result};
use crate::palette::{Palette, PALETTE_SIZE};
use crate::pixels::{decode_indexed, PixelMatrix};

pub use rle::FrameEncoding;

/// Offset of the first block directory.
pub const DEF_DIRECTORY_OFFSET: usize = 16 + PALETTE_SIZE;

/// Size of the fixed part of a block directory.
pub const BLOCK_HEADER_SIZE: usize = 16;

/// Largest frame canvas side accepted, in pixels.
pub const MAX_FRAME_SIDE: u32 = 0x1_0000;

/// Largest frame canvas accepted, in pixels.
pub const MAX_FRAME_PIXELS: usize = 0x100_0000;

/// Length of a frame name field.
pub const FRAME_NAME_SIZE: usize = 13;

/// Size of a frame header.
pub const FRAME_HEADER_SIZE: usize = 32;

/// What a DEF file animates, from its header tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefKind {
    /// Spell effect animation (0x40).
    Spell,
    /// Generic sprite (0x41).
    Sprite,
    /// Combat creature (0x42).
    Creature,
    /// Adventure-map object (0x43).
    AdventureObject,
    /// Adventure-map hero (0x44).
    AdventureHero,
    /// Terrain tile set (0x45).
    Terrain,
    /// Mouse cursor (0x46).
    Cursor,
    /// Interface element (0x47).
    Interface,
    /// Single sprite frame (0x48).
    SpriteFrame,
    /// Combat hero (0x49).
    CombatHero,
}

impl DefKind {
    /// Maps a header tag to a kind.
    #[must_use]
    pub const fn from_tag(tag: u32) -> Option<Self> {
        Some(match tag {
            0x40 => DefKind::Spell,
            0x41 => DefKind::Sprite,
            0x42 => DefKind::Creature,
            0x43 => DefKind::AdventureObject,
            0x44 => DefKind::AdventureHero,
            0x45 => DefKind::Terrain,
            0x46 => DefKind::Cursor,
            0x47 => DefKind::Interface,
            0x48 => DefKind::SpriteFrame,
            0x49 => DefKind::CombatHero,
            _ => return None,
        })
    }

    /// Returns the header tag for this kind.
    #[must_use]
    pub const fn tag(self) -> u32 {
        match self {
            DefKind::Spell => 0x40,
            DefKind::Sprite => 0x41,
            DefKind::Creature => 0x42,
            DefKind::AdventureObject => 0x43,
            DefKind::AdventureHero => 0x44,
            DefKind::Terrain => 0x45,
            DefKind::Cursor => 0x46,
            DefKind::Interface => 0x47,
            DefKind::SpriteFrame => 0x48,
            DefKind::CombatHero => 0x49,
        }
    }
}

/// The opaque region of a frame inside its full canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameRect {
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// One animation frame, expanded onto its full canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Name of the frame as stored in the block directory.
    pub file_name: String,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Where the encoded content sits on the canvas.
    pub rect: FrameRect,
    /// Palette indices, `width * height` bytes, row-major.
    pub pixel_data: Vec<u8>,
}

impl Frame {
    /// Parses the frame whose header starts at `offset`.
    fn parse(data: &[u8], offset: usize, file_name: String) -> Result<Self> {
        let size = read_u32_le(data, offset)? as usize;
        let encoding = FrameEncoding::from_id(read_u32_le(data, offset + 0x04)?)?;
        let full_width = read_u32_le(data, offset + 0x08)?;
        let full_height = read_u32_le(data, offset + 0x0C)?;
        let width = read_u32_le(data, offset + 0x10)?;
        let height = read_u32_le(data, offset + 0x14)?;
        let left = read_i32_le(data, offset + 0x18)?;
        let top = read_i32_le(data, offset + 0x1C)?;

        let canvas_len = canvas_size(&file_name, full_width, full_height)?;
        let rect = content_rect(&file_name, full_width, full_height, width, height, left, top)?;

        let payload_start = offset + FRAME_HEADER_SIZE;
        let payload = read_bytes(data, payload_start, data.len().saturating_sub(payload_start))?;
        let content = rle::decode_payload(encoding, payload, size, width as usize, height as usize)?;

        let canvas_width = full_width as usize;
        let mut pixel_data = vec![0u8; canvas_len];
        if width > 0 {
            for (row, line) in content.chunks_exact(width as usize).enumerate() {
                let start = (rect.y as usize + row) * canvas_width + rect.x as usize;
                pixel_data[start..start + line.len()].copy_from_slice(line);
            }
        }

        Ok(Frame {
            file_name,
            width: full_width,
            height: full_height,
            rect,
            pixel_data,
        })
    }

    /// Expands the frame to RGBA using the reserved sprite colors.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::DimensionMismatch` if the pixel data does not
    /// match the canvas size.
    pub fn to_pixels(&self, palette: &Palette) -> Result<PixelMatrix> {
        let matrix = decode_indexed(
            &self.pixel_data,
            &palette.expand_with_sprite_keys(),
            self.width as usize,
        )?;

        if matrix.height() != self.height as usize {
            return Err(DecodeError::DimensionMismatch {
                reason: format!(
                    "frame '{}' has {} rows, canvas is {} high",
                    self.file_name,
                    matrix.height(),
                    self.height
                ),
            });
        }

        Ok(matrix)
    }
}

/// Checks a frame canvas before anything is allocated for it.
///
/// Both sides must be zero or both non-zero, and the canvas must stay within
/// [`MAX_FRAME_SIDE`] and [`MAX_FRAME_PIXELS`]. Returns the canvas length.
fn canvas_size(name: &str, full_width: u32, full_height: u32) -> Result<usize> {
    let mismatch = |problem: &str| DecodeError::DimensionMismatch {
        reason: format!("frame '{name}' canvas {full_width}x{full_height} is {problem}"),
    };

    if (full_width == 0) != (full_height == 0) {
        return Err(mismatch("degenerate"));
    }
    if full_width > MAX_FRAME_SIDE || full_height > MAX_FRAME_SIDE {
        return Err(mismatch("too large"));
    }

    (full_width as usize)
        .checked_mul(full_height as usize)
        .filter(|&len| len <= MAX_FRAME_PIXELS)
        .ok_or_else(|| mismatch("too large"))
}

/// Validates that a content rectangle fits its canvas.
fn content_rect(
    name: &str,
    full_width: u32,
    full_height: u32,
    width: u32,
    height: u32,
    left: i32,
    top: i32,
) -> Result<FrameRect> {
    let mismatch = || DecodeError::DimensionMismatch {
        reason: format!(
            "frame '{name}' content {width}x{height} at ({left}, {top}) exceeds canvas {full_width}x{full_height}"
        ),
    };

    let x = u32::try_from(left).map_err(|_| mismatch())?;
    let y = u32::try_from(top).map_err(|_| mismatch())?;

    let fits_x = x.checked_add(width).is_some_and(|right| right <= full_width);
    let fits_y = y.checked_add(height).is_some_and(|bottom| bottom <= full_height);
    if !(fits_x && fits_y) {
        return Err(mismatch());
    }

    Ok(FrameRect {
        x,
        y,
        width,
        height,
    })
}

/// A group of frames, typically one animation sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Block identifier (animation group).
    pub id: u32,
    /// Frames in playback order.
    pub frames: Vec<Frame>,
}

/// The directory part of a block, read before any frame payload.
struct BlockDirectory {
    id: u32,
    names: Vec<String>,
    offsets: Vec<usize>,
}

impl BlockDirectory {
    fn parse(data: &[u8], offset: usize) -> Result<(Self, usize)> {
        let id = read_u32_le(data, offset)?;
        let frame_count = read_u32_le(data, offset + 4)? as usize;
        read_bytes(data, offset + 8, 8)?;

        let names_start = offset + BLOCK_HEADER_SIZE;
        let offsets_start = names_start.saturating_add(frame_count.saturating_mul(FRAME_NAME_SIZE));
        let end = offsets_start.saturating_add(frame_count.saturating_mul(4));
        if end > data.len() {
            return Err(DecodeError::truncated(end, data.len()));
        }

        let names = (0..frame_count)
            .map(|i| read_fixed_string(data, names_start + i * FRAME_NAME_SIZE, FRAME_NAME_SIZE))
            .collect::<Result<Vec<_>>>()?;
        let offsets = (0..frame_count)
            .map(|i| read_u32_le(data, offsets_start + i * 4).map(|o| o as usize))
            .collect::<Result<Vec<_>>>()?;

        Ok((BlockDirectory { id, names, offsets }, end))
    }
}

/// A parsed DEF file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefFile {
    /// What the file animates.
    pub kind: DefKind,
    /// Nominal sprite width.
    pub width: u32,
    /// Nominal sprite height.
    pub height: u32,
    /// Palette shared by every frame.
    pub palette: Palette,
    /// Frame groups in file order.
    pub blocks: Vec<Block>,
}

impl DefFile {
    /// Parses a complete DEF file.
    ///
    /// # Errors
    ///
    /// - `DecodeError::InvalidHeader` if the kind tag is unrecognized
    /// - `DecodeError::TruncatedInput` if the buffer ends before the declared
    ///   blocks, or the block directories run into frame payloads
    /// - `DecodeError::DimensionMismatch` / `MalformedPixelData` for
    ///   inconsistent frames
    pub fn parse(data: &[u8]) -> Result<Self> {
        let tag = read_u32_le(data, 0)?;
        let kind = DefKind::from_tag(tag).ok_or_else(|| DecodeError::InvalidHeader {
            reason: format!("unknown DEF kind tag 0x{tag:02X}"),
        })?;
        let width = read_u32_le(data, 4)?;
        let height = read_u32_le(data, 8)?;
        let block_count = read_u32_le(data, 12)?;
        let palette = Palette::parse(read_bytes(data, 16, PALETTE_SIZE)?)?;

        let mut directories = Vec::new();
        let mut offset = DEF_DIRECTORY_OFFSET;
        for _ in 0..block_count {
            let (directory, end) = BlockDirectory::parse(data, offset)?;
            directories.push(directory);
            offset = end;
        }

        // Payloads live after the directories; an earlier payload means the
        // declared counts describe more directory bytes than the file has.
        let first_payload = directories
            .iter()
            .flat_map(|d| d.offsets.iter().copied())
            .min();
        if let Some(first_payload) = first_payload {
            if first_payload < offset {
                return Err(DecodeError::truncated(offset, first_payload));
            }
        }

        let blocks = directories
            .into_iter()
            .map(|directory| {
                let frames = directory
                    .names
                    .into_iter()
                    .zip(directory.offsets)
                    .map(|(name, frame_offset)| Frame::parse(data, frame_offset, name))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Block {
                    id: directory.id,
                    frames,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "Parsed DEF {kind:?} {width}x{height}: {} blocks, {} frames",
            blocks.len(),
            blocks.iter().map(|b| b.frames.len()).sum::<usize>()
        );

        Ok(DefFile {
            kind,
            width,
            height,
            palette,
            blocks,
        })
    }

    /// Returns the block with the given id.
    #[must_use]
    pub fn block(&self, id: u32) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// Returns frames of all blocks in file order.
    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.blocks.iter().flat_map(|b| b.frames.iter())
    }

    /// Returns the `index`-th frame counted across all blocks.
    #[must_use]
    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames().nth(index)
    }

    /// Total number of frames.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.blocks.iter().map(|b| b.frames.len()).sum()
    }
}
