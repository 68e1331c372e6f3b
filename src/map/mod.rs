//! Adventure map (`.h3m`) parsing.
//!
//! Shipped maps are gzip members; the parser inflates them transparently.
//! The decompressed stream is read sequentially:
//!
//! 1. version tag ([`MapFormat`])
//! 2. basic info ([`BasicInfo`])
//! 3. eight player slots ([`PlayersInfo`])
//! 4. object template catalog ([`ObjectTemplate`])
//! 5. one tile grid per level, surface first ([`Level`])
//!
//! Every integer is little-endian and every string is a `u32` length
//! followed by Latin-1 bytes.
//!
//! # Example
//!
//! ```no_run
//! use h3_assets::map::Map;
//!
//! let data = std::fs::read("Arrogance.h3m").unwrap();
//! let map = Map::parse(&data)?;
//! println!("{} ({:?})", map.basic_info.name, map.basic_info.size);
//! println!("{} tiles above ground", map.world.above.tiles.len());
//! # Ok::<(), h3_assets::error::DecodeError>(())
//! ```

pub mod basic;
pub mod format;
pub mod player;
pub mod tile;

pub use basic::{BasicInfo, Difficulty};
pub use format::{MapFormat, MapSize};
pub use player::{AiBehavior, HeroRef, MainTown, Player, PlayerColor, PlayersInfo};
pub use tile::{
    Level, ObjectRef, ObjectTemplate, Position, River, Road, Terrain, Tile, TileFlags,
};

use crate::binary::ByteReader;
use crate::decompress::maybe_gunzip;
use crate::error::{DecodeError, Result};

/// Upper bound on catalog entries, to reject absurd counts before allocating.
const MAX_TEMPLATES: u32 = 0x1_0000;

/// The surface and optional underground level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct World {
    /// Surface level.
    pub above: Level,
    /// Underground level, if the map has one.
    pub below: Option<Level>,
}

impl World {
    /// Iterates over the levels, surface first.
    pub fn levels(&self) -> impl Iterator<Item = &Level> {
        std::iter::once(&self.above).chain(self.below.as_ref())
    }
}

/// A parsed adventure map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Map {
    /// Header information.
    pub basic_info: BasicInfo,
    /// The eight player slots.
    pub players_info: PlayersInfo,
    /// Object templates referenced by tile objects.
    pub templates: Vec<ObjectTemplate>,
    /// Tile grids.
    pub world: World,
}

impl Map {
    /// Parses a map, inflating it first if it is gzip-compressed.
    ///
    /// # Errors
    ///
    /// - `DecodeError::DecompressionFailed` for a corrupt or oversized gzip wrapper
    /// - `DecodeError::UnsupportedMapVersion` for unknown version tags
    /// - `DecodeError::InvalidHeader` for a non-standard size or difficulty
    /// - `DecodeError::TruncatedInput` if the header, players or catalog are cut short
    /// - `DecodeError::DimensionMismatch` if a tile grid is cut short
    /// - `DecodeError::InvalidTileReference` for unknown terrain, river or
    ///   road ids and out-of-catalog templates
    pub fn parse(data: &[u8]) -> Result<Self> {
        let data = maybe_gunzip("map", data)?;
        let mut reader = ByteReader::new(&data);

        let format = MapFormat::from_version(reader.read_u32()?)?;
        let basic_info = BasicInfo::read(&mut reader, format)?;
        let players_info = PlayersInfo::read(&mut reader, format)?;

        let template_count = reader.read_u32()?;
        if template_count > MAX_TEMPLATES {
            return Err(DecodeError::InvalidHeader {
                reason: format!("template catalog of {template_count} entries"),
            });
        }
        let templates = (0..template_count)
            .map(|_| ObjectTemplate::read(&mut reader))
            .collect::<Result<Vec<_>>>()?;

        let size = basic_info.size;
        let above = Level::read(&mut reader, size, 0, templates.len())?;
        let below = if basic_info.has_underground {
            Some(Level::read(&mut reader, size, 1, templates.len())?)
        } else {
            None
        };

        if reader.remaining() > 0 {
            log::debug!("Map has {} trailing bytes", reader.remaining());
        }

        log::debug!(
            "Parsed map '{}' ({} {:?}): {} templates, {} playable slots",
            basic_info.name,
            format.name(),
            size,
            templates.len(),
            players_info.playable().count()
        );

        Ok(Map {
            basic_info,
            players_info,
            templates,
            world: World { above, below },
        })
    }

    /// Returns the level at `depth` (0 surface, 1 underground).
    #[must_use]
    pub fn level(&self, depth: u32) -> Option<&Level> {
        match depth {
            0 => Some(&self.world.above),
            1 => self.world.below.as_ref(),
            _ => None,
        }
    }

    /// Returns the template an object refers to.
    #[must_use]
    pub fn template(&self, object: &ObjectRef) -> Option<&ObjectTemplate> {
        self.templates.get(object.template as usize)
    }
}
