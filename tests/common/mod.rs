//! Synthetic asset builders shared by the integration tests.
//!
//! Game files cannot ship with the crate, so each test assembles the bytes
//! it needs in memory.

#![allow(dead_code)]

use std::io::Write;

use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;

// ============================================================================
// LOD
// ============================================================================

/// One file to place in a synthetic archive.
pub struct LodFile<'a> {
    pub name: &'a str,
    pub tag: u32,
    pub payload: &'a [u8],
    pub compress: bool,
}

impl<'a> LodFile<'a> {
    pub fn stored(name: &'a str, tag: u32, payload: &'a [u8]) -> Self {
        LodFile {
            name,
            tag,
            payload,
            compress: false,
        }
    }

    pub fn zlib(name: &'a str, tag: u32, payload: &'a [u8]) -> Self {
        LodFile {
            name,
            tag,
            payload,
            compress: true,
        }
    }
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Builds a LOD archive: header, directory, then payloads in order.
pub fn build_lod(files: &[LodFile<'_>]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"LOD\0");
    data.extend_from_slice(&500u32.to_le_bytes());
    data.extend_from_slice(&(files.len() as u32).to_le_bytes());
    data.resize(0x5C, 0);

    let stored: Vec<Vec<u8>> = files
        .iter()
        .map(|f| if f.compress { zlib(f.payload) } else { f.payload.to_vec() })
        .collect();

    let mut offset = 0x5C + files.len() * 32;
    for (file, bytes) in files.iter().zip(&stored) {
        let mut name = [0u8; 16];
        name[..file.name.len()].copy_from_slice(file.name.as_bytes());
        data.extend_from_slice(&name);
        data.extend_from_slice(&(offset as u32).to_le_bytes());
        data.extend_from_slice(&(file.payload.len() as u32).to_le_bytes());
        data.extend_from_slice(&file.tag.to_le_bytes());
        let compressed = if file.compress { bytes.len() as u32 } else { 0 };
        data.extend_from_slice(&compressed.to_le_bytes());
        offset += bytes.len();
    }

    for bytes in stored {
        data.extend_from_slice(&bytes);
    }
    data
}

// ============================================================================
// Palettes and images
// ============================================================================

/// Palette where entry `i` is `(i, 255 - i, i / 2)`.
pub fn ramp_palette() -> Vec<u8> {
    (0..=255u8).flat_map(|i| [i, 255 - i, i / 2]).collect()
}

/// An indexed image entry with the ramp palette.
pub fn build_indexed_pcx(width: u32, height: u32, indices: &[u8]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&(indices.len() as u32).to_le_bytes());
    data.extend_from_slice(&width.to_le_bytes());
    data.extend_from_slice(&height.to_le_bytes());
    data.extend_from_slice(indices);
    data.extend_from_slice(&ramp_palette());
    data
}

// ============================================================================
// DEF
// ============================================================================

/// A raw (uncompressed) frame covering its whole canvas.
pub struct DefFrame {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub indices: Vec<u8>,
}

impl DefFrame {
    pub fn filled(name: &str, width: u32, height: u32, index: u8) -> Self {
        DefFrame {
            name: name.to_string(),
            width,
            height,
            indices: vec![index; (width * height) as usize],
        }
    }
}

/// Builds a DEF file with the ramp palette and raw frames.
pub fn build_def(kind: u32, blocks: &[(u32, Vec<DefFrame>)]) -> Vec<u8> {
    let mut data = Vec::new();
    let (width, height) = blocks
        .iter()
        .flat_map(|(_, frames)| frames.first())
        .map(|f| (f.width, f.height))
        .next()
        .unwrap_or((0, 0));
    data.extend_from_slice(&kind.to_le_bytes());
    data.extend_from_slice(&width.to_le_bytes());
    data.extend_from_slice(&height.to_le_bytes());
    data.extend_from_slice(&(blocks.len() as u32).to_le_bytes());
    data.extend_from_slice(&ramp_palette());

    let directory_len: usize = blocks
        .iter()
        .map(|(_, frames)| 16 + frames.len() * (13 + 4))
        .sum();
    let mut payload_offset = data.len() + directory_len;

    for (id, frames) in blocks {
        data.extend_from_slice(&id.to_le_bytes());
        data.extend_from_slice(&(frames.len() as u32).to_le_bytes());
        data.extend_from_slice(&[0u8; 8]);
        for frame in frames {
            let mut name = [0u8; 13];
            name[..frame.name.len()].copy_from_slice(frame.name.as_bytes());
            data.extend_from_slice(&name);
        }
        for frame in frames {
            data.extend_from_slice(&(payload_offset as u32).to_le_bytes());
            payload_offset += 32 + frame.indices.len();
        }
    }

    for (_, frames) in blocks {
        for frame in frames {
            let size = frame.indices.len() as u32;
            for field in [size, 0, frame.width, frame.height, frame.width, frame.height, 0, 0] {
                data.extend_from_slice(&field.to_le_bytes());
            }
            data.extend_from_slice(&frame.indices);
        }
    }
    data
}

/// A single-block DEF with one `width x height` frame filled with `index`.
pub fn single_frame_def(width: u32, height: u32, index: u8) -> Vec<u8> {
    build_def(
        0x43,
        &[(0, vec![DefFrame::filled("frame.pcx", width, height, index)])],
    )
}

// ============================================================================
// Maps
// ============================================================================

/// Version tags.
pub const ROE: u32 = 0x0E;
pub const AB: u32 = 0x15;
pub const SOD: u32 = 0x1C;

/// Bytes per tile record without objects.
pub const TILE_RECORD_SIZE: usize = 8;

/// An object to place on the surface or underground grid.
pub struct MapObject {
    pub x: u32,
    pub y: u32,
    pub z: u32,
    pub template: u32,
    pub offset: (i8, i8),
}

/// Describes a synthetic map.
pub struct MapSpec {
    pub version: u32,
    pub size: u32,
    pub underground: bool,
    pub name: String,
    /// Terrain id of every tile.
    pub terrain: u8,
    /// Template sprite names, in catalog order.
    pub templates: Vec<String>,
    pub objects: Vec<MapObject>,
}

impl MapSpec {
    pub fn new(version: u32, size: u32) -> Self {
        MapSpec {
            version,
            size,
            underground: false,
            name: "Test Map".to_string(),
            terrain: 2,
            templates: Vec::new(),
            objects: Vec::new(),
        }
    }
}

fn push_string(data: &mut Vec<u8>, text: &str) {
    data.extend_from_slice(&(text.len() as u32).to_le_bytes());
    data.extend_from_slice(text.as_bytes());
}

/// Builds an uncompressed map. Slot 0 is human-playable; the others are closed.
pub fn build_map(spec: &MapSpec) -> Vec<u8> {
    let ab = spec.version >= AB;
    let sod = spec.version >= SOD;

    let mut data = Vec::new();
    data.extend_from_slice(&spec.version.to_le_bytes());
    data.push(1);
    data.extend_from_slice(&spec.size.to_le_bytes());
    data.push(u8::from(spec.underground));
    push_string(&mut data, &spec.name);
    push_string(&mut data, "Synthetic fixture");
    data.push(1);
    if ab {
        data.push(0);
    }

    // Slot 0: human, no town, no hero
    data.extend_from_slice(&[1, 0, 0]);
    if sod {
        data.push(0);
    }
    if ab {
        data.extend_from_slice(&0x00FFu16.to_le_bytes());
    } else {
        data.push(0xFF);
    }
    data.extend_from_slice(&[0, 0, 0, 0xFF]);
    if ab {
        data.extend_from_slice(&[0, 0, 0, 0, 0]);
    }
    // Slots 1-7: closed
    let filler = if sod {
        13
    } else if ab {
        12
    } else {
        6
    };
    for _ in 1..8 {
        data.extend_from_slice(&[0, 0]);
        data.extend(std::iter::repeat(0).take(filler));
    }

    data.extend_from_slice(&(spec.templates.len() as u32).to_le_bytes());
    for sprite in &spec.templates {
        push_string(&mut data, sprite);
        data.extend_from_slice(&[0xFF; 6]);
        data.extend_from_slice(&[0; 6]);
        data.extend_from_slice(&0x01FFu16.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&53u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&[0, 0]);
        data.extend_from_slice(&[0; 16]);
    }

    let levels = if spec.underground { 2 } else { 1 };
    for z in 0..levels {
        for y in 0..spec.size {
            for x in 0..spec.size {
                let objects: Vec<&MapObject> = spec
                    .objects
                    .iter()
                    .filter(|o| (o.x, o.y, o.z) == (x, y, z))
                    .collect();
                data.extend_from_slice(&[
                    spec.terrain,
                    (x % 4) as u8,
                    0,
                    0,
                    0,
                    0,
                    0,
                    objects.len() as u8,
                ]);
                for (i, object) in objects.iter().enumerate() {
                    data.extend_from_slice(&(i as u32 + 1).to_le_bytes());
                    data.extend_from_slice(&object.template.to_le_bytes());
                    data.push(object.offset.0 as u8);
                    data.push(object.offset.1 as u8);
                }
            }
        }
    }

    data
}
