//! Map format versions and size classes.

use crate::error::{DecodeError, Result};

/// Game release a map was saved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapFormat {
    /// The Restoration of Erathia (0x0E).
    RestorationOfErathia,
    /// Armageddon's Blade (0x15).
    ArmageddonsBlade,
    /// The Shadow of Death (0x1C).
    ShadowOfDeath,
}

impl MapFormat {
    /// Maps a version tag to a format.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::UnsupportedMapVersion` for any other tag.
    ///
    /// ```
    /// use h3_assets::map::MapFormat;
    ///
    /// assert_eq!(MapFormat::from_version(0x1C).unwrap(), MapFormat::ShadowOfDeath);
    /// assert!(MapFormat::from_version(0x33).is_err());
    /// ```
    pub fn from_version(version: u32) -> Result<Self> {
        match version {
            0x0E => Ok(MapFormat::RestorationOfErathia),
            0x15 => Ok(MapFormat::ArmageddonsBlade),
            0x1C => Ok(MapFormat::ShadowOfDeath),
            _ => Err(DecodeError::UnsupportedMapVersion { version }),
        }
    }

    /// Returns the version tag stored in the file.
    #[must_use]
    pub const fn version(self) -> u32 {
        match self {
            MapFormat::RestorationOfErathia => 0x0E,
            MapFormat::ArmageddonsBlade => 0x15,
            MapFormat::ShadowOfDeath => 0x1C,
        }
    }

    /// `true` for Armageddon's Blade and later.
    #[must_use]
    pub fn at_least_ab(self) -> bool {
        self >= MapFormat::ArmageddonsBlade
    }

    /// `true` for The Shadow of Death.
    #[must_use]
    pub fn at_least_sod(self) -> bool {
        self >= MapFormat::ShadowOfDeath
    }

    /// Short display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            MapFormat::RestorationOfErathia => "RoE",
            MapFormat::ArmageddonsBlade => "AB",
            MapFormat::ShadowOfDeath => "SoD",
        }
    }
}

/// Map size class. Every map is square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapSize {
    /// 36 × 36 tiles.
    Small,
    /// 72 × 72 tiles.
    Medium,
    /// 108 × 108 tiles.
    Large,
    /// 144 × 144 tiles.
    ExtraLarge,
}

impl MapSize {
    /// Maps a stored edge length to a size class.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::InvalidHeader` for non-standard sizes.
    pub fn from_width(width: u32) -> Result<Self> {
        match width {
            36 => Ok(MapSize::Small),
            72 => Ok(MapSize::Medium),
            108 => Ok(MapSize::Large),
            144 => Ok(MapSize::ExtraLarge),
            _ => Err(DecodeError::InvalidHeader {
                reason: format!("unsupported map size {width}"),
            }),
        }
    }

    /// Edge length in tiles.
    #[must_use]
    pub const fn width(self) -> u32 {
        match self {
            MapSize::Small => 36,
            MapSize::Medium => 72,
            MapSize::Large => 108,
            MapSize::ExtraLarge => 144,
        }
    }

    /// Tiles per level.
    #[must_use]
    pub const fn tile_count(self) -> usize {
        let w = self.width() as usize;
        w * w
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_roundtrip() {
        for version in [0x0E, 0x15, 0x1C] {
            assert_eq!(MapFormat::from_version(version).unwrap().version(), version);
        }
        assert!(matches!(
            MapFormat::from_version(0x33),
            Err(DecodeError::UnsupportedMapVersion { version: 0x33 })
        ));
    }

    #[test]
    fn test_format_ordering() {
        assert!(!MapFormat::RestorationOfErathia.at_least_ab());
        assert!(MapFormat::ArmageddonsBlade.at_least_ab());
        assert!(!MapFormat::ArmageddonsBlade.at_least_sod());
        assert!(MapFormat::ShadowOfDeath.at_least_sod());
    }

    #[test]
    fn test_sizes() {
        assert_eq!(MapSize::from_width(72).unwrap(), MapSize::Medium);
        assert_eq!(MapSize::Medium.tile_count(), 5184);
        assert!(matches!(
            MapSize::from_width(50),
            Err(DecodeError::InvalidHeader { .. })
        ));
    }
}
