//! Conversion of pixel matrices into `image` bitmaps.
//!
//! Bitmaps are RGBA8888, rows top to bottom, `width * 4` bytes per row.

use image::{imageops, Rgba, RgbaImage};

use crate::error::{DecodeError, Result};
use crate::pixels::PixelMatrix;
use crate::process::{ProcessedMap, TILE_SIZE};

/// Converts a pixel matrix into a bitmap.
///
/// # Errors
///
/// Returns `DecodeError::DimensionMismatch` if the matrix is larger than a
/// bitmap can address.
///
/// ```
/// use h3_assets::materialize::materialize;
/// use h3_assets::pixels::PixelMatrix;
///
/// let matrix = PixelMatrix::from_pixels(2, vec![0xFF00_00FF, 0x00FF_00FF]).unwrap();
/// let image = materialize(&matrix).unwrap();
/// assert_eq!(image.dimensions(), (2, 1));
/// assert_eq!(image.get_pixel(1, 0).0, [0x00, 0xFF, 0x00, 0xFF]);
/// ```
pub fn materialize(matrix: &PixelMatrix) -> Result<RgbaImage> {
    let too_large = || DecodeError::DimensionMismatch {
        reason: format!(
            "{}x{} pixel matrix exceeds bitmap limits",
            matrix.width(),
            matrix.height()
        ),
    };

    let width = u32::try_from(matrix.width()).map_err(|_| too_large())?;
    let height = u32::try_from(matrix.height()).map_err(|_| too_large())?;

    RgbaImage::from_raw(width, height, matrix.to_rgba_bytes()).ok_or_else(too_large)
}

/// Returns a copy of `image` mirrored as requested.
#[must_use]
pub fn flipped(image: &RgbaImage, horizontal: bool, vertical: bool) -> RgbaImage {
    match (horizontal, vertical) {
        (false, false) => image.clone(),
        (true, false) => imageops::flip_horizontal(image),
        (false, true) => imageops::flip_vertical(image),
        (true, true) => imageops::rotate180(image),
    }
}

/// A solid bitmap of one packed `0xRRGGBBAA` color.
#[must_use]
pub fn solid(width: u32, height: u32, rgba: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(rgba.to_be_bytes()))
}

/// Lays out one processed level on a single canvas.
///
/// Tile layers are drawn in order, then objects in the order the processor
/// produced them. Returns `None` if the map has no level at `depth`.
#[must_use]
pub fn compose_level(map: &ProcessedMap, depth: u32) -> Option<RgbaImage> {
    let level = map.levels.iter().find(|l| l.depth == depth)?;
    let side = map.width * TILE_SIZE;
    let mut canvas = RgbaImage::new(side, side);

    for tile in &level.tiles {
        for layer in &tile.images {
            imageops::overlay(
                &mut canvas,
                &layer.image,
                i64::from(layer.rect.x),
                i64::from(layer.rect.y),
            );
        }
    }

    for object in map.objects.iter().filter(|o| o.depth == depth) {
        imageops::overlay(
            &mut canvas,
            &object.image,
            i64::from(object.position.0),
            i64::from(object.position.1),
        );
    }

    Some(canvas)
}
