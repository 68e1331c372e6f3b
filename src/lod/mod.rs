//! LOD archives, the game's resource containers.
//!
//! # Layout
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0x00 | 4 | magic `"LOD\0"` |
//! | 0x04 | 4 | archive kind (200 base game, 500 expansion) |
//! | 0x08 | 4 | entry count |
//! | 0x0C | 80 | reserved |
//! | 0x5C | 32 × count | directory records (see [`entry`]) |
//!
//! Parsing reads only the directory. Entry payloads are located, inflated
//! and decoded on demand with [`LodArchive::entry_bytes`] and
//! [`LodArchive::decode`], both of which borrow the archive immutably and can
//! run concurrently from several threads.
//!
//! # Example
//!
//! ```no_run
//! use h3_assets::lod::{DecodedContent, LodArchive};
//!
//! let data = std::fs::read("H3sprite.lod").unwrap();
//! let archive = LodArchive::parse("H3sprite.lod", data)?;
//!
//! if let Some(entry) = archive.find("AvWattak.def") {
//!     if let DecodedContent::Definition(def) = archive.decode(entry)? {
//!         println!("{} frames", def.frame_count());
//!     }
//! }
//! # Ok::<(), h3_assets::error::DecodeError>(())
//! ```

pub mod content;
pub mod entry;

pub use content::{DecodedContent, Mask};
pub use entry::{ArchiveEntry, Compression, EntryKind};

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

use crate::binary::{read_bytes, read_u32_le};
use crate::decompress::inflate_zlib;
use crate::def::DefFile;
use crate::error::{DecodeError, Result};
use crate::palette::Palette;
use crate::pcx::PcxImage;

use entry::ENTRY_RECORD_SIZE;

/// Magic bytes at the start of every LOD archive.
pub const LOD_MAGIC: &[u8; 4] = b"LOD\0";

/// Size of the archive header; the directory starts here.
pub const LOD_HEADER_SIZE: usize = 0x5C;

/// Which game release an archive belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LodKind {
    /// Base game archive (200).
    Base,
    /// Expansion archive (500).
    Expansion,
    /// Any other value found in the header.
    Other(u32),
}

impl From<u32> for LodKind {
    fn from(value: u32) -> Self {
        match value {
            200 => LodKind::Base,
            500 => LodKind::Expansion,
            other => LodKind::Other(other),
        }
    }
}

/// A parsed LOD archive that owns its bytes.
#[derive(Debug, Clone)]
pub struct LodArchive {
    file_name: String,
    kind: LodKind,
    entries: Vec<ArchiveEntry>,
    index: HashMap<String, usize>,
    data: Vec<u8>,
}

impl LodArchive {
    /// Parses an archive's header and directory.
    ///
    /// When two records share a name (ignoring case) the later record
    /// replaces the earlier one in place.
    ///
    /// # Arguments
    ///
    /// * `file_name` - Archive name, kept for diagnostics
    /// * `data` - The complete archive bytes
    ///
    /// # Errors
    ///
    /// - `DecodeError::InvalidMagic` if the buffer does not start with `LOD\0`
    /// - `DecodeError::TruncatedInput` if the header is cut short
    /// - `DecodeError::TruncatedDirectory` if fewer records are present than declared
    /// - `DecodeError::OffsetOutOfBounds` if an entry's payload lies outside the buffer
    pub fn parse(file_name: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        let file_name = file_name.into();

        let magic = read_bytes(&data, 0, LOD_MAGIC.len())?;
        if magic != LOD_MAGIC {
            return Err(DecodeError::invalid_magic(LOD_MAGIC, magic));
        }

        let kind = LodKind::from(read_u32_le(&data, 4)?);
        let declared = read_u32_le(&data, 8)?;
        read_bytes(&data, 0x0C, LOD_HEADER_SIZE - 0x0C)?;

        let available = (data.len() - LOD_HEADER_SIZE) / ENTRY_RECORD_SIZE;
        if (declared as usize) > available {
            return Err(DecodeError::TruncatedDirectory {
                declared,
                available,
            });
        }

        let mut entries: Vec<ArchiveEntry> = Vec::with_capacity(declared as usize);
        let mut index = HashMap::with_capacity(declared as usize);

        for i in 0..declared as usize {
            let entry = ArchiveEntry::parse(&data, LOD_HEADER_SIZE + i * ENTRY_RECORD_SIZE)?;

            if entry.end().map_or(true, |end| end > data.len()) {
                return Err(DecodeError::OffsetOutOfBounds {
                    name: entry.name,
                    offset: entry.offset,
                    size: entry.stored_size,
                    buffer_len: data.len(),
                });
            }

            let key = entry.name.to_ascii_lowercase();
            if let Some(&existing) = index.get(&key) {
                log::warn!(
                    "{file_name}: duplicate entry '{}', keeping the later record",
                    entry.name
                );
                entries[existing] = entry;
            } else {
                index.insert(key, entries.len());
                entries.push(entry);
            }
        }

        log::debug!(
            "Parsed {file_name} ({kind:?}): {} entries, {} bytes",
            entries.len(),
            data.len()
        );

        Ok(LodArchive {
            file_name,
            kind,
            entries,
            index,
            data,
        })
    }

    /// Reads and parses the archive at `path`, naming it after the file.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::IoError` if the file cannot be read, otherwise
    /// the same errors as [`LodArchive::parse`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Self::parse(file_name, data)
    }

    /// The name the archive was opened under.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The release this archive belongs to.
    #[must_use]
    pub fn kind(&self) -> LodKind {
        self.kind
    }

    /// All entries in directory order.
    #[must_use]
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Number of distinct entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the archive has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds an entry by name, ignoring ASCII case.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ArchiveEntry> {
        self.index
            .get(&name.to_ascii_lowercase())
            .map(|&i| &self.entries[i])
    }

    /// Returns the entry's payload, inflated if it is compressed.
    ///
    /// Stored entries are borrowed straight from the archive buffer.
    ///
    /// # Errors
    ///
    /// - `DecodeError::OffsetOutOfBounds` if the entry does not belong to
    ///   this archive's buffer
    /// - `DecodeError::DecompressionFailed` if the zlib stream is corrupt or
    ///   inflates to a size other than `actual_size`
    pub fn entry_bytes(&self, entry: &ArchiveEntry) -> Result<Cow<'_, [u8]>> {
        let out_of_bounds = || DecodeError::OffsetOutOfBounds {
            name: entry.name.clone(),
            offset: entry.offset,
            size: entry.stored_size,
            buffer_len: self.data.len(),
        };

        let end = entry.end().ok_or_else(out_of_bounds)?;
        let stored = self
            .data
            .get(entry.offset as usize..end)
            .ok_or_else(out_of_bounds)?;

        match entry.compression {
            Compression::None => Ok(Cow::Borrowed(stored)),
            Compression::Zlib => {
                inflate_zlib(&entry.name, stored, entry.actual_size as usize).map(Cow::Owned)
            }
        }
    }

    /// Decodes an entry into its typed form.
    ///
    /// Decoding is pure: the same entry always yields an equal result.
    ///
    /// # Errors
    ///
    /// - `DecodeError::UnsupportedEntryKind` for entries of unknown kind
    /// - `DecodeError::Entry` wrapping the nested parser's error, so the
    ///   failing entry name is always reported
    pub fn decode(&self, entry: &ArchiveEntry) -> Result<DecodedContent> {
        let bytes = || self.entry_bytes(entry);

        let content = match entry.kind {
            EntryKind::Unknown => {
                return Err(DecodeError::UnsupportedEntryKind {
                    name: entry.name.clone(),
                    tag: entry.tag,
                })
            }
            EntryKind::Text => Ok(DecodedContent::Text(bytes()?.into_owned())),
            EntryKind::Image => PcxImage::parse(&bytes()?).map(DecodedContent::Image),
            EntryKind::SpriteDef => DefFile::parse(&bytes()?).map(DecodedContent::Definition),
            EntryKind::Palette => Palette::parse(&bytes()?).map(DecodedContent::Palette),
            EntryKind::Mask => Mask::parse(&bytes()?).map(DecodedContent::Mask),
            EntryKind::Font | EntryKind::Campaign | EntryKind::AudioIndex => {
                Ok(DecodedContent::Binary(bytes()?.into_owned()))
            }
        };

        content.map_err(|e| e.in_entry(&entry.name))
    }

    /// Finds and decodes an entry by name.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::AssetNotFound` if no entry has that name, or any
    /// error from [`LodArchive::decode`].
    pub fn decode_by_name(&self, name: &str) -> Result<DecodedContent> {
        let entry = self.find(name).ok_or_else(|| DecodeError::AssetNotFound {
            name: name.to_string(),
        })?;
        self.decode(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use flate2::write::ZlibEncoder;

    /// Builds an archive from `(name, tag, payload, compress)` tuples.
    fn build_lod(files: &[(&str, u32, &[u8], bool)]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(LOD_MAGIC);
        data.extend_from_slice(&200u32.to_le_bytes());
        data.extend_from_slice(&(files.len() as u32).to_le_bytes());
        data.resize(LOD_HEADER_SIZE, 0);

        let payloads: Vec<Vec<u8>> = files
            .iter()
            .map(|&(_, _, payload, compress)| {
                if compress {
                    let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
                    encoder.write_all(payload).unwrap();
                    encoder.finish().unwrap()
                } else {
                    payload.to_vec()
                }
            })
            .collect();

        let mut offset = LOD_HEADER_SIZE + files.len() * ENTRY_RECORD_SIZE;
        for (&(name, tag, payload, compress), stored) in files.iter().zip(&payloads) {
            let mut record = [0u8; 16];
            record[..name.len()].copy_from_slice(name.as_bytes());
            data.extend_from_slice(&record);
            data.extend_from_slice(&(offset as u32).to_le_bytes());
            data.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            data.extend_from_slice(&tag.to_le_bytes());
            let compressed = if compress { stored.len() as u32 } else { 0 };
            data.extend_from_slice(&compressed.to_le_bytes());
            offset += stored.len();
        }

        for stored in payloads {
            data.extend_from_slice(&stored);
        }
        data
    }

    #[test]
    fn test_parse_and_decode_text() {
        let data = build_lod(&[
            ("HELLO.TXT", 2, &b"hello"[..], false),
            ("ZIP.TXT", 2, &b"zipped text"[..], true),
        ]);
        let archive = LodArchive::parse("test.lod", data).unwrap();

        assert_eq!(archive.len(), 2);
        assert_eq!(archive.kind(), LodKind::Base);

        let entry = archive.find("hello.txt").unwrap();
        let bytes = archive.entry_bytes(entry).unwrap();
        assert!(matches!(bytes, Cow::Borrowed(_)));
        assert_eq!(&*bytes, b"hello");

        let zipped = archive.find("ZIP.TXT").unwrap();
        assert_eq!(
            archive.decode(zipped).unwrap(),
            DecodedContent::Text(b"zipped text".to_vec())
        );
    }

    #[test]
    fn test_invalid_magic() {
        let mut data = build_lod(&[]);
        data[0] = b'X';
        assert!(matches!(
            LodArchive::parse("bad.lod", data),
            Err(DecodeError::InvalidMagic { .. })
        ));
    }

    #[test]
    fn test_short_header() {
        assert!(matches!(
            LodArchive::parse("short.lod", b"LOD\0\xC8\0\0\0".to_vec()),
            Err(DecodeError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn test_offset_out_of_bounds() {
        let mut data = build_lod(&[("A.TXT", 2, &b"abc"[..], false)]);
        let size_field = LOD_HEADER_SIZE + 0x14;
        data[size_field..size_field + 4].copy_from_slice(&1000u32.to_le_bytes());

        match LodArchive::parse("oob.lod", data) {
            Err(DecodeError::OffsetOutOfBounds { name, size, .. }) => {
                assert_eq!(name, "A.TXT");
                assert_eq!(size, 1000);
            }
            other => panic!("Expected OffsetOutOfBounds, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_names_last_wins() {
        let data = build_lod(&[
            ("DUP.TXT", 2, &b"first"[..], false),
            ("OTHER.TXT", 2, &b"other"[..], false),
            ("dup.txt", 2, &b"second"[..], false),
        ]);
        let archive = LodArchive::parse("dup.lod", data).unwrap();

        assert_eq!(archive.len(), 2);
        assert_eq!(archive.entries()[0].name, "dup.txt");
        assert_eq!(
            archive.decode_by_name("Dup.Txt").unwrap(),
            DecodedContent::Text(b"second".to_vec())
        );
    }

    #[test]
    fn test_unknown_kind_unsupported() {
        let data = build_lod(&[("MYSTERY", 0x77, &b"??"[..], false)]);
        let archive = LodArchive::parse("odd.lod", data).unwrap();
        let entry = archive.find("MYSTERY").unwrap();

        assert!(matches!(
            archive.decode(entry),
            Err(DecodeError::UnsupportedEntryKind { tag: 0x77, .. })
        ));
    }

    #[test]
    fn test_nested_error_names_entry() {
        let data = build_lod(&[("BROKEN.PCX", 0x10, &[1u8, 2, 3][..], false)]);
        let archive = LodArchive::parse("img.lod", data).unwrap();

        let err = archive.decode_by_name("BROKEN.PCX").unwrap_err();
        match &err {
            DecodeError::Entry { name, .. } => assert_eq!(name, "BROKEN.PCX"),
            other => panic!("Expected Entry, got {other:?}"),
        }
        assert!(matches!(err.root(), DecodeError::TruncatedInput { .. }));
    }

    #[test]
    fn test_binary_passthrough() {
        let data = build_lod(&[("THEME.XMI", 0, &b"MThd"[..], false)]);
        let archive = LodArchive::parse("music.lod", data).unwrap();

        assert_eq!(
            archive.decode_by_name("theme.xmi").unwrap(),
            DecodedContent::Binary(b"MThd".to_vec())
        );
    }

    #[test]
    fn test_missing_name() {
        let archive = LodArchive::parse("empty.lod", build_lod(&[])).unwrap();
        assert!(archive.is_empty());
        assert!(matches!(
            archive.decode_by_name("nothing.def"),
            Err(DecodeError::AssetNotFound { .. })
        ));
    }
}
