//! # H3 Assets
//!
//! Decoders for Heroes of Might and Magic III game assets.
//!
//! This library reads the game's binary formats and turns them into plain
//! Rust values and RGBA bitmaps:
//! - **LOD archives** with lazily decoded, optionally zlib-compressed entries
//! - **DEF sprite definitions** with run-length encoded frames
//! - **Palette images** (`.pcx` entries), indexed or raw 24-bit
//! - **Adventure maps** (`.h3m`) with players, templates and tile grids
//!
//! ## Quick Start
//!
//! ```no_run
//! use h3_assets::error::Result;
//! use h3_assets::lod::{DecodedContent, LodArchive};
//! use h3_assets::materialize::materialize;
//!
//! fn export_first_image(data: Vec<u8>) -> Result<()> {
//!     let archive = LodArchive::parse("H3bitmap.lod", data)?;
//!
//!     for entry in archive.entries() {
//!         if let DecodedContent::Image(image) = archive.decode(entry)? {
//!             let bitmap = materialize(&image.to_pixels()?)?;
//!             println!("{}: {}x{}", entry.name, bitmap.width(), bitmap.height());
//!             break;
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`error`] - Error type and result alias shared by every decoder
//! - [`binary`] - Bounds-checked little-endian reading utilities
//! - [`decompress`] - Zlib and gzip inflation
//! - [`palette`] - 256-color palettes and their RGBA expansion
//! - [`pixels`] - Pixel sources and the RGBA pixel matrix
//! - [`pcx`] - Image entries
//! - [`def`] - Sprite definitions
//! - [`lod`] - Archive containers
//! - [`map`] - Adventure maps
//! - [`materialize`] - Conversion to `image` bitmaps
//! - [`process`] - Map rendering, asset resolution and background progress
//!
//! ## Threading
//!
//! Every parser is a pure function over a byte slice. A [`lod::LodArchive`]
//! is `Send + Sync`, so entries can be decoded from several threads at once;
//! the borrow checker keeps the archive alive while decodes are in flight.
//!
//! All multi-byte integers are stored in little-endian byte order.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod binary;
pub mod decompress;
pub mod def;
pub mod error;
pub mod lod;
pub mod map;
pub mod materialize;
pub mod palette;
pub mod pcx;
pub mod pixels;
pub mod process;

// Re-export commonly used types at the crate root
pub use def::{Block, DefFile, DefKind, Frame, FrameRect};
pub use error::{DecodeError, Result};
pub use lod::{ArchiveEntry, Compression, DecodedContent, EntryKind, LodArchive};
pub use map::{Level, Map, MapFormat, MapSize, Tile};
pub use materialize::materialize;
pub use palette::{Color, Palette};
pub use pcx::PcxImage;
pub use pixels::{PixelMatrix, PixelSource};
pub use process::{
    AssetCatalog, AssetResolver, Event, LoadingProgress, MapProcessor, ProcessedMap,
};
