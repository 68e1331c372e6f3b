//! Object templates and the per-level tile grid.

use crate::binary::ByteReader;
use crate::error::{DecodeError, Result};

use super::format::MapSize;

/// Ground type of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terrain {
    /// Dirt (0).
    Dirt,
    /// Sand (1).
    Sand,
    /// Grass (2).
    Grass,
    /// Snow (3).
    Snow,
    /// Swamp (4).
    Swamp,
    /// Rough (5).
    Rough,
    /// Subterranean (6).
    Subterranean,
    /// Lava (7).
    Lava,
    /// Water (8).
    Water,
    /// Rock (9).
    Rock,
}

impl Terrain {
    /// Maps a stored terrain id.
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            0 => Terrain::Dirt,
            1 => Terrain::Sand,
            2 => Terrain::Grass,
            3 => Terrain::Snow,
            4 => Terrain::Swamp,
            5 => Terrain::Rough,
            6 => Terrain::Subterranean,
            7 => Terrain::Lava,
            8 => Terrain::Water,
            9 => Terrain::Rock,
            _ => return None,
        })
    }

    /// Name of the DEF holding this terrain's tiles.
    #[must_use]
    pub const fn sprite_name(self) -> &'static str {
        match self {
            Terrain::Dirt => "dirttl.def",
            Terrain::Sand => "sandtl.def",
            Terrain::Grass => "grastl.def",
            Terrain::Snow => "snowtl.def",
            Terrain::Swamp => "swmptl.def",
            Terrain::Rough => "rougtl.def",
            Terrain::Subterranean => "subbtl.def",
            Terrain::Lava => "lavatl.def",
            Terrain::Water => "watrtl.def",
            Terrain::Rock => "rocktl.def",
        }
    }
}

/// River overlay of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum River {
    /// Clear water (1).
    Clear,
    /// Icy (2).
    Icy,
    /// Muddy (3).
    Mud,
    /// Lava (4).
    Lava,
}

impl River {
    /// Maps a stored river id; 0 means no river.
    fn from_id(id: u8) -> Option<Option<Self>> {
        match id {
            0 => Some(None),
            1 => Some(Some(River::Clear)),
            2 => Some(Some(River::Icy)),
            3 => Some(Some(River::Mud)),
            4 => Some(Some(River::Lava)),
            _ => None,
        }
    }

    /// Name of the DEF holding this river's segments.
    #[must_use]
    pub const fn sprite_name(self) -> &'static str {
        match self {
            River::Clear => "clrrvr.def",
            River::Icy => "icyrvr.def",
            River::Mud => "mudrvr.def",
            River::Lava => "lavrvr.def",
        }
    }
}

/// Road overlay of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Road {
    /// Dirt road (1).
    Dirt,
    /// Gravel road (2).
    Gravel,
    /// Cobblestone road (3).
    Cobblestone,
}

impl Road {
    /// Maps a stored road id; 0 means no road.
    fn from_id(id: u8) -> Option<Option<Self>> {
        match id {
            0 => Some(None),
            1 => Some(Some(Road::Dirt)),
            2 => Some(Some(Road::Gravel)),
            3 => Some(Some(Road::Cobblestone)),
            _ => None,
        }
    }

    /// Name of the DEF holding this road's segments.
    #[must_use]
    pub const fn sprite_name(self) -> &'static str {
        match self {
            Road::Dirt => "dirtrd.def",
            Road::Gravel => "gravrd.def",
            Road::Cobblestone => "cobbrd.def",
        }
    }
}

/// Mirroring and coast bits of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileFlags(pub u8);

impl TileFlags {
    /// Terrain sprite is mirrored horizontally.
    #[must_use]
    pub fn terrain_flip_x(self) -> bool {
        self.0 & 0x01 != 0
    }

    /// Terrain sprite is mirrored vertically.
    #[must_use]
    pub fn terrain_flip_y(self) -> bool {
        self.0 & 0x02 != 0
    }

    /// River sprite is mirrored horizontally.
    #[must_use]
    pub fn river_flip_x(self) -> bool {
        self.0 & 0x04 != 0
    }

    /// River sprite is mirrored vertically.
    #[must_use]
    pub fn river_flip_y(self) -> bool {
        self.0 & 0x08 != 0
    }

    /// Road sprite is mirrored horizontally.
    #[must_use]
    pub fn road_flip_x(self) -> bool {
        self.0 & 0x10 != 0
    }

    /// Road sprite is mirrored vertically.
    #[must_use]
    pub fn road_flip_y(self) -> bool {
        self.0 & 0x20 != 0
    }

    /// Tile borders water.
    #[must_use]
    pub fn is_coast(self) -> bool {
        self.0 & 0x40 != 0
    }
}

/// A tile coordinate; `z` is 0 for the surface and 1 underground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
    /// Level.
    pub z: u32,
}

/// An object placed on a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectRef {
    /// Map-unique object id.
    pub id: u32,
    /// Index into the map's template catalog.
    pub template: u32,
    /// Pixel offset from the tile's anchor.
    pub offset: (i8, i8),
}

/// One cell of a level grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    /// Where the tile is.
    pub position: Position,
    /// Ground type.
    pub terrain: Terrain,
    /// Frame of the terrain DEF.
    pub terrain_view: u8,
    /// River overlay, if any.
    pub river: Option<River>,
    /// Frame of the river DEF.
    pub river_direction: u8,
    /// Road overlay, if any.
    pub road: Option<Road>,
    /// Frame of the road DEF.
    pub road_direction: u8,
    /// Mirroring and coast bits.
    pub flags: TileFlags,
    /// Objects anchored on this tile.
    pub objects: Vec<ObjectRef>,
}

/// An entry of the map's object template catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectTemplate {
    /// DEF name of the object's sprite.
    pub sprite: String,
    /// Blocked-tile bitmap, bottom row last.
    pub passability: [u8; 6],
    /// Visitable-tile bitmap, bottom row last.
    pub actions: [u8; 6],
    /// Bitmask of terrains the object may stand on.
    pub allowed_terrains: u16,
    /// Editor terrain group.
    pub terrain_group: u16,
    /// Object class id.
    pub class: u32,
    /// Object subclass id.
    pub subclass: u32,
    /// Editor object group.
    pub group: u8,
    /// Drawn above other objects.
    pub is_overlay: bool,
}

impl ObjectTemplate {
    pub(crate) fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let sprite = reader.read_string()?;
        let mut passability = [0u8; 6];
        passability.copy_from_slice(reader.read_bytes(6)?);
        let mut actions = [0u8; 6];
        actions.copy_from_slice(reader.read_bytes(6)?);
        let allowed_terrains = reader.read_u16()?;
        let terrain_group = reader.read_u16()?;
        let class = reader.read_u32()?;
        let subclass = reader.read_u32()?;
        let group = reader.read_u8()?;
        let is_overlay = reader.read_bool()?;
        reader.skip(16)?;

        Ok(ObjectTemplate {
            sprite,
            passability,
            actions,
            allowed_terrains,
            terrain_group,
            class,
            subclass,
            group,
            is_overlay,
        })
    }
}

/// One level's tile grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    /// 0 for the surface, 1 underground.
    pub depth: u32,
    /// Size class; the grid is `size.width()` squared.
    pub size: MapSize,
    /// Tiles in row-major order.
    pub tiles: Vec<Tile>,
}

impl Level {
    /// Reads a full grid for `size`.
    ///
    /// Running out of bytes anywhere inside the grid is reported as
    /// `DimensionMismatch`, since the grid size is fixed by the header.
    pub(crate) fn read(
        reader: &mut ByteReader<'_>,
        size: MapSize,
        depth: u32,
        template_count: usize,
    ) -> Result<Self> {
        let width = size.width();
        let mut tiles = Vec::with_capacity(size.tile_count());

        for y in 0..width {
            for x in 0..width {
                let position = Position { x, y, z: depth };
                let tile = read_tile(reader, position, template_count).map_err(|e| match e {
                    DecodeError::TruncatedInput { .. } => DecodeError::DimensionMismatch {
                        reason: format!(
                            "level {depth} ends at tile ({x}, {y}) of a {width}x{width} grid"
                        ),
                    },
                    other => other,
                })?;
                tiles.push(tile);
            }
        }

        Ok(Level { depth, size, tiles })
    }

    /// Edge length in tiles.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.size.width()
    }

    /// Returns the tile at `(x, y)`.
    #[must_use]
    pub fn tile(&self, x: u32, y: u32) -> Option<&Tile> {
        let width = self.width();
        (x < width && y < width).then(|| &self.tiles[(y * width + x) as usize])
    }
}

fn read_tile(reader: &mut ByteReader<'_>, position: Position, template_count: usize) -> Result<Tile> {
    let invalid = |reason: String| DecodeError::InvalidTileReference {
        x: position.x,
        y: position.y,
        z: position.z,
        reason,
    };

    let terrain_id = reader.read_u8()?;
    let terrain_view = reader.read_u8()?;
    let river_id = reader.read_u8()?;
    let river_direction = reader.read_u8()?;
    let road_id = reader.read_u8()?;
    let road_direction = reader.read_u8()?;
    let flags = TileFlags(reader.read_u8()?);
    let object_count = reader.read_u8()?;

    let terrain =
        Terrain::from_id(terrain_id).ok_or_else(|| invalid(format!("unknown terrain {terrain_id}")))?;
    let river = River::from_id(river_id).ok_or_else(|| invalid(format!("unknown river {river_id}")))?;
    let road = Road::from_id(road_id).ok_or_else(|| invalid(format!("unknown road {road_id}")))?;

    let mut objects = Vec::with_capacity(usize::from(object_count));
    for _ in 0..object_count {
        let id = reader.read_u32()?;
        let template = reader.read_u32()?;
        let offset = (reader.read_i8()?, reader.read_i8()?);

        if template as usize >= template_count {
            return Err(invalid(format!(
                "object {id} uses template {template}, catalog has {template_count}"
            )));
        }
        objects.push(ObjectRef {
            id,
            template,
            offset,
        });
    }

    Ok(Tile {
        position,
        terrain,
        terrain_view,
        river,
        river_direction,
        road,
        road_direction,
        flags,
        objects,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile_bytes(terrain: u8, river: u8, road: u8, objects: &[(u32, u32)]) -> Vec<u8> {
        let mut data = vec![terrain, 3, river, 1, road, 2, 0x41, objects.len() as u8];
        for &(id, template) in objects {
            data.extend_from_slice(&id.to_le_bytes());
            data.extend_from_slice(&template.to_le_bytes());
            data.extend_from_slice(&[0xFE, 0x02]);
        }
        data
    }

    fn origin() -> Position {
        Position { x: 0, y: 0, z: 0 }
    }

    #[test]
    fn test_read_tile() {
        let data = tile_bytes(2, 1, 3, &[(42, 0)]);
        let mut reader = ByteReader::new(&data);
        let tile = read_tile(&mut reader, origin(), 1).unwrap();

        assert_eq!(tile.terrain, Terrain::Grass);
        assert_eq!(tile.terrain_view, 3);
        assert_eq!(tile.river, Some(River::Clear));
        assert_eq!(tile.road, Some(Road::Cobblestone));
        assert!(tile.flags.terrain_flip_x());
        assert!(!tile.flags.terrain_flip_y());
        assert!(tile.flags.is_coast());
        assert_eq!(tile.objects[0].offset, (-2, 2));
    }

    #[test]
    fn test_template_out_of_catalog() {
        let data = tile_bytes(0, 0, 0, &[(1, 3)]);
        let mut reader = ByteReader::new(&data);
        assert!(matches!(
            read_tile(&mut reader, origin(), 3),
            Err(DecodeError::InvalidTileReference { .. })
        ));
    }

    #[test]
    fn test_unknown_ids() {
        for (terrain, river, road) in [(10, 0, 0), (0, 5, 0), (0, 0, 4)] {
            let data = tile_bytes(terrain, river, road, &[]);
            let mut reader = ByteReader::new(&data);
            assert!(matches!(
                read_tile(&mut reader, origin(), 0),
                Err(DecodeError::InvalidTileReference { .. })
            ));
        }
    }

    #[test]
    fn test_short_grid_is_dimension_mismatch() {
        let data = tile_bytes(8, 0, 0, &[]).repeat(36 * 36 - 1);
        let mut reader = ByteReader::new(&data);
        assert!(matches!(
            Level::read(&mut reader, MapSize::Small, 0, 0),
            Err(DecodeError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_level_lookup() {
        let data = tile_bytes(8, 0, 0, &[]).repeat(36 * 36);
        let mut reader = ByteReader::new(&data);
        let level = Level::read(&mut reader, MapSize::Small, 1, 0).unwrap();

        assert_eq!(level.tiles.len(), 36 * 36);
        assert_eq!(level.tile(5, 7).unwrap().position, Position { x: 5, y: 7, z: 1 });
        assert!(level.tile(36, 0).is_none());
    }

    #[test]
    fn test_read_template() {
        let mut data = Vec::new();
        data.extend_from_slice(&11u32.to_le_bytes());
        data.extend_from_slice(b"AVWmine.def");
        data.extend_from_slice(&[0xFF; 6]);
        data.extend_from_slice(&[0x00, 0, 0, 0, 0, 0x80]);
        data.extend_from_slice(&0x01FFu16.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&53u32.to_le_bytes());
        data.extend_from_slice(&7u32.to_le_bytes());
        data.extend_from_slice(&[2, 1]);
        data.extend_from_slice(&[0; 16]);

        let mut reader = ByteReader::new(&data);
        let template = ObjectTemplate::read(&mut reader).unwrap();
        assert_eq!(template.sprite, "AVWmine.def");
        assert_eq!(template.class, 53);
        assert!(template.is_overlay);
        assert_eq!(reader.remaining(), 0);
    }
}
