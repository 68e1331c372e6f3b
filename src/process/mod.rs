//! Turns a parsed [`Map`] into ready-to-draw bitmaps.
//!
//! For every tile the processor resolves the terrain, river and road DEFs
//! through an [`AssetResolver`], picks the frame the tile names, mirrors it
//! as the tile flags request, and materializes it. Objects use the first
//! frame of their template's sprite, anchored so the sprite's bottom-right
//! corner sits on the bottom-right corner of the object's tile.
//!
//! A sprite that cannot be resolved or decoded does not fail the run. It is
//! drawn as a magenta square, listed in [`ProcessedMap::skipped`] and logged.
//!
//! # Example
//!
//! ```no_run
//! use h3_assets::lod::LodArchive;
//! use h3_assets::map::Map;
//! use h3_assets::process::MapProcessor;
//!
//! let sprites = LodArchive::parse("H3sprite.lod", std::fs::read("H3sprite.lod").unwrap())?;
//! let map = Map::parse(&std::fs::read("Arrogance.h3m").unwrap())?;
//!
//! let processed = MapProcessor::new(&sprites).process(&map, &mut |progress| {
//!     println!("{} ({}/{})", progress.step, progress.completed, progress.total);
//! })?;
//! println!("{} sprites skipped", processed.skipped.len());
//! # Ok::<(), h3_assets::error::DecodeError>(())
//! ```

pub mod progress;
pub mod resolver;

pub use progress::{spawn_load_archives, spawn_process_map, Event, LoadingProgress};
pub use resolver::{AssetCatalog, AssetResolver};

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use image::RgbaImage;

use crate::def::DefFile;
use crate::error::Result;
use crate::map::{Level, Map, ObjectRef, Position, Tile};
use crate::materialize::{flipped, materialize, solid};

/// Edge length of a map tile in pixels.
pub const TILE_SIZE: u32 = 32;

/// Color of the square drawn in place of a missing sprite.
pub const PLACEHOLDER_COLOR: u32 = 0xFF00_FFFF;

/// A rectangle in level pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    /// Left edge; may be negative for sprites overhanging the map edge.
    pub x: i32,
    /// Top edge; may be negative.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// What a tile image depicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageHint {
    /// Ground.
    Terrain,
    /// River overlay.
    River,
    /// Road overlay.
    Road,
    /// Stand-in for a sprite that failed to load.
    Placeholder,
}

/// One layer of a processed tile.
#[derive(Debug, Clone)]
pub struct TileImage {
    /// The layer bitmap.
    pub image: RgbaImage,
    /// What the layer depicts.
    pub hint: ImageHint,
    /// Where the layer goes on the level canvas.
    pub rect: Rect,
}

/// A tile with its resolved layers, bottom layer first.
#[derive(Debug, Clone)]
pub struct ProcessedTile {
    /// Tile coordinate.
    pub position: Position,
    /// The source tile.
    pub tile: Tile,
    /// Terrain, then river, then road.
    pub images: Vec<TileImage>,
}

/// All processed tiles of one level.
#[derive(Debug, Clone)]
pub struct ProcessedLevel {
    /// 0 for the surface, 1 underground.
    pub depth: u32,
    /// Tiles in row-major order.
    pub tiles: Vec<ProcessedTile>,
}

/// A placed object with its sprite.
#[derive(Debug, Clone)]
pub struct ProcessedObject {
    /// The source object.
    pub object: ObjectRef,
    /// Level the object is on.
    pub depth: u32,
    /// Sprite bitmap.
    pub image: RgbaImage,
    /// Top-left corner on the level canvas, in pixels.
    pub position: (i32, i32),
    /// Sprite width in pixels.
    pub width: u32,
    /// Sprite height in pixels.
    pub height: u32,
}

/// A sprite that was replaced by a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SkippedSprite {
    /// Sprite (DEF) name.
    pub name: String,
    /// Requested frame.
    pub frame: usize,
    /// Why it was skipped.
    pub reason: String,
}

/// The read-only result of processing a map.
#[derive(Debug, Clone)]
pub struct ProcessedMap {
    /// Edge length of every level in tiles.
    pub width: u32,
    /// Surface first, then underground.
    pub levels: Vec<ProcessedLevel>,
    /// Objects of all levels.
    pub objects: Vec<ProcessedObject>,
    /// Sprites drawn as placeholders, each listed once.
    pub skipped: Vec<SkippedSprite>,
}

/// Processes maps against one asset resolver.
#[derive(Debug)]
pub struct MapProcessor<R> {
    resolver: R,
}

/// State of one processing run.
struct Run<'r, R> {
    resolver: &'r R,
    definitions: HashMap<String, std::result::Result<Rc<DefFile>, String>>,
    skipped: Vec<SkippedSprite>,
    seen_skips: HashSet<(String, usize)>,
}

impl<R: AssetResolver> MapProcessor<R> {
    /// Creates a processor resolving sprites through `resolver`.
    #[must_use]
    pub fn new(resolver: R) -> Self {
        MapProcessor { resolver }
    }

    /// The resolver sprites come from.
    #[must_use]
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Processes every level and object of `map`.
    ///
    /// `progress` is called after each tile row and once after the objects;
    /// the last call reports `completed == total`.
    ///
    /// # Errors
    ///
    /// Only bitmap materialization failures abort the run. Missing or broken
    /// sprites are replaced by placeholders.
    pub fn process(
        &self,
        map: &Map,
        progress: &mut dyn FnMut(LoadingProgress),
    ) -> Result<ProcessedMap> {
        let width = map.basic_info.size.width();
        let levels: Vec<&Level> = map.world.levels().collect();
        let object_count: usize = levels
            .iter()
            .flat_map(|l| l.tiles.iter())
            .map(|t| t.objects.len())
            .sum();
        let total = levels.len() * width as usize + 1;

        let mut run = Run {
            resolver: &self.resolver,
            definitions: HashMap::new(),
            skipped: Vec::new(),
            seen_skips: HashSet::new(),
        };

        let mut processed_levels = Vec::with_capacity(levels.len());
        let mut completed = 0;
        for level in &levels {
            let mut tiles = Vec::with_capacity(level.tiles.len());
            for row in level.tiles.chunks(width as usize) {
                for tile in row {
                    tiles.push(run.process_tile(tile)?);
                }
                completed += 1;
                progress(LoadingProgress {
                    step: format!(
                        "level {}: row {} of {width}",
                        level.depth,
                        row.first().map_or(0, |t| t.position.y + 1)
                    ),
                    completed,
                    total,
                });
            }
            processed_levels.push(ProcessedLevel {
                depth: level.depth,
                tiles,
            });
        }

        let mut objects = Vec::with_capacity(object_count);
        for level in &levels {
            for tile in &level.tiles {
                for object in &tile.objects {
                    objects.push(run.process_object(map, tile, object)?);
                }
            }
        }
        progress(LoadingProgress {
            step: format!("placed {object_count} objects"),
            completed: total,
            total,
        });

        log::debug!(
            "Processed map '{}': {} levels, {} objects, {} skipped sprites, {} DEFs loaded",
            map.basic_info.name,
            processed_levels.len(),
            objects.len(),
            run.skipped.len(),
            run.definitions.len()
        );

        Ok(ProcessedMap {
            width,
            levels: processed_levels,
            objects,
            skipped: run.skipped,
        })
    }
}

impl<R: AssetResolver> Run<'_, R> {
    /// Returns the parsed DEF for `name`, loading it on first use.
    fn definition(&mut self, name: &str) -> std::result::Result<Rc<DefFile>, String> {
        let key = name.to_ascii_lowercase();
        if let Some(cached) = self.definitions.get(&key) {
            return cached.clone();
        }

        let loaded = self
            .resolver
            .resolve(name)
            .and_then(|bytes| DefFile::parse(&bytes))
            .map(Rc::new)
            .map_err(|e| e.to_string());
        self.definitions.insert(key, loaded.clone());
        loaded
    }

    /// Materializes frame `frame` of sprite `name`, or a placeholder.
    fn sprite(&mut self, name: &str, frame: usize, flip_x: bool, flip_y: bool) -> Result<Option<RgbaImage>> {
        let failure = match self.definition(name) {
            Ok(def) => match def.frame(frame).map(|f| f.to_pixels(&def.palette)) {
                Some(Ok(pixels)) => {
                    let image = materialize(&pixels)?;
                    return Ok(Some(flipped(&image, flip_x, flip_y)));
                }
                Some(Err(e)) => e.to_string(),
                None => format!("frame {frame} out of {}", def.frame_count()),
            },
            Err(reason) => reason,
        };

        if self.seen_skips.insert((name.to_ascii_lowercase(), frame)) {
            log::warn!("Skipping sprite {name} frame {frame}: {failure}");
            self.skipped.push(SkippedSprite {
                name: name.to_string(),
                frame,
                reason: failure,
            });
        }
        Ok(None)
    }

    fn process_tile(&mut self, tile: &Tile) -> Result<ProcessedTile> {
        let rect = Rect {
            x: pixel(tile.position.x),
            y: pixel(tile.position.y),
            width: TILE_SIZE,
            height: TILE_SIZE,
        };
        let flags = tile.flags;

        let mut layers = vec![(
            tile.terrain.sprite_name(),
            tile.terrain_view,
            flags.terrain_flip_x(),
            flags.terrain_flip_y(),
            ImageHint::Terrain,
        )];
        if let Some(river) = tile.river {
            layers.push((
                river.sprite_name(),
                tile.river_direction,
                flags.river_flip_x(),
                flags.river_flip_y(),
                ImageHint::River,
            ));
        }
        if let Some(road) = tile.road {
            layers.push((
                road.sprite_name(),
                tile.road_direction,
                flags.road_flip_x(),
                flags.road_flip_y(),
                ImageHint::Road,
            ));
        }

        let mut images = Vec::with_capacity(layers.len());
        for (name, frame, flip_x, flip_y, hint) in layers {
            let image = match self.sprite(name, usize::from(frame), flip_x, flip_y)? {
                Some(image) => TileImage { image, hint, rect },
                None => TileImage {
                    image: placeholder(),
                    hint: ImageHint::Placeholder,
                    rect,
                },
            };
            images.push(image);
        }

        Ok(ProcessedTile {
            position: tile.position,
            tile: tile.clone(),
            images,
        })
    }

    fn process_object(&mut self, map: &Map, tile: &Tile, object: &ObjectRef) -> Result<ProcessedObject> {
        // The parser guarantees every template index is inside the catalog.
        let sprite = map
            .template(object)
            .map(|t| t.sprite.clone())
            .unwrap_or_default();
        let image = self.sprite(&sprite, 0, false, false)?.unwrap_or_else(placeholder);
        let (width, height) = image.dimensions();

        let right = pixel(tile.position.x + 1) + i32::from(object.offset.0);
        let bottom = pixel(tile.position.y + 1) + i32::from(object.offset.1);
        let position = (right - to_i32(width), bottom - to_i32(height));

        Ok(ProcessedObject {
            object: *object,
            depth: tile.position.z,
            image,
            position,
            width,
            height,
        })
    }
}

fn placeholder() -> RgbaImage {
    solid(TILE_SIZE, TILE_SIZE, PLACEHOLDER_COLOR)
}

/// Pixel coordinate of a tile edge. Map edges are at most 144 tiles.
fn pixel(tiles: u32) -> i32 {
    to_i32(tiles * TILE_SIZE)
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
