//! Map header: format, size and descriptive text.

use crate::binary::ByteReader;
use crate::error::{DecodeError, Result};

use super::format::{MapFormat, MapSize};

/// Difficulty the map author assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Difficulty {
    /// Easy (0).
    Easy,
    /// Normal (1).
    Normal,
    /// Hard (2).
    Hard,
    /// Expert (3).
    Expert,
    /// Impossible (4).
    Impossible,
}

impl Difficulty {
    fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Difficulty::Easy),
            1 => Ok(Difficulty::Normal),
            2 => Ok(Difficulty::Hard),
            3 => Ok(Difficulty::Expert),
            4 => Ok(Difficulty::Impossible),
            _ => Err(DecodeError::InvalidHeader {
                reason: format!("unknown difficulty {value}"),
            }),
        }
    }
}

/// General information about a map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicInfo {
    /// Game release the map targets.
    pub format: MapFormat,
    /// Whether any player slot is assigned.
    pub any_players: bool,
    /// Size class.
    pub size: MapSize,
    /// Whether the map has an underground level.
    pub has_underground: bool,
    /// Map title.
    pub name: String,
    /// Map description.
    pub description: String,
    /// Author-assigned difficulty.
    pub difficulty: Difficulty,
    /// Highest level heroes may reach, AB and later; 0 means no cap.
    pub hero_level_cap: Option<u8>,
}

impl BasicInfo {
    /// Reads the header fields that follow the version tag.
    pub(crate) fn read(reader: &mut ByteReader<'_>, format: MapFormat) -> Result<Self> {
        let any_players = reader.read_bool()?;
        let size = MapSize::from_width(reader.read_u32()?)?;
        let has_underground = reader.read_bool()?;
        let name = reader.read_string()?;
        let description = reader.read_string()?;
        let difficulty = Difficulty::from_u8(reader.read_u8()?)?;
        let hero_level_cap = if format.at_least_ab() {
            Some(reader.read_u8()?)
        } else {
            None
        };

        Ok(BasicInfo {
            format,
            any_players,
            size,
            has_underground,
            name,
            description,
            difficulty,
            hero_level_cap,
        })
    }

    /// Number of levels the map stores.
    #[must_use]
    pub fn level_count(&self) -> usize {
        if self.has_underground {
            2
        } else {
            1
        }
    }
}
