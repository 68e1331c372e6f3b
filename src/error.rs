//! Error types for the Heroes III asset decoders.
//!
//! Every decoder in this crate fails fast with a specific [`DecodeError`]
//! variant. None of them retry, and none of them panic on malformed input.
//! Orchestrating code (archive lookups, map processing) decides whether a
//! failure is fatal or can be skipped.

use thiserror::Error;

/// The main error type for asset decoding operations.
///
/// # Example
///
/// ```
/// use h3_assets::error::{DecodeError, Result};
///
/// fn check_def_kind(kind: u32) -> Result<()> {
///     if (0x40..=0x49).contains(&kind) {
///         Ok(())
///     } else {
///         Err(DecodeError::InvalidHeader {
///             reason: format!("unknown DEF kind 0x{kind:02X}"),
///         })
///     }
/// }
///
/// assert!(check_def_kind(0x43).is_ok());
/// assert!(check_def_kind(0x30).is_err());
/// ```
#[derive(Error, Debug)]
pub enum DecodeError {
    /// An I/O error occurred while reading an asset file.
    #[error("Cannot read asset file: {0}")]
    IoError(#[from] std::io::Error),

    /// The file's magic bytes do not match the expected container format.
    #[error("Invalid magic bytes: expected {expected}, found {found}")]
    InvalidMagic {
        /// The expected magic bytes (as hex string for display).
        expected: String,
        /// The actual bytes found (as hex string).
        found: String,
    },

    /// A header field holds a value outside its legal domain.
    #[error("Invalid header: {reason}")]
    InvalidHeader {
        /// A description of what makes the header invalid.
        reason: String,
    },

    /// The data ended before a declared structure could be read.
    #[error("Truncated input: expected {expected} bytes, but only {available} available")]
    TruncatedInput {
        /// The number of bytes that were needed.
        expected: usize,
        /// The number of bytes actually available.
        available: usize,
    },

    /// A LOD directory declares more records than the buffer holds.
    #[error("Truncated directory: header declares {declared} entries, buffer holds {available}")]
    TruncatedDirectory {
        /// Entry count declared by the archive header.
        declared: u32,
        /// Number of complete directory records present.
        available: usize,
    },

    /// An archive entry's byte range lies outside the archive buffer.
    #[error("Entry '{name}' at offset 0x{offset:X} ({size} bytes) exceeds buffer of {buffer_len} bytes")]
    OffsetOutOfBounds {
        /// Name of the offending entry.
        name: String,
        /// Start offset of the entry payload.
        offset: u32,
        /// Stored size of the entry payload.
        size: u32,
        /// Length of the archive buffer.
        buffer_len: usize,
    },

    /// A zlib or gzip stream could not be inflated.
    #[error("Decompression of '{name}' failed: {reason}")]
    DecompressionFailed {
        /// Name of the entry or file being inflated.
        name: String,
        /// A description of the decompression failure.
        reason: String,
    },

    /// An archive entry has a kind this crate cannot decode.
    #[error("Unsupported entry kind 0x{tag:02X} for '{name}'")]
    UnsupportedEntryKind {
        /// Name of the entry.
        name: String,
        /// Raw kind tag from the directory record.
        tag: u32,
    },

    /// A palette block holds fewer than 256 RGB triples.
    #[error("Malformed palette: expected {expected} bytes, found {available}")]
    MalformedPalette {
        /// Bytes required for a full palette.
        expected: usize,
        /// Bytes actually present.
        available: usize,
    },

    /// Pixel payload bytes are inconsistent with their declared encoding.
    #[error("Malformed pixel data: {reason}")]
    MalformedPixelData {
        /// A description of the inconsistency.
        reason: String,
    },

    /// Pixel or tile counts do not match the declared dimensions.
    #[error("Dimension mismatch: {reason}")]
    DimensionMismatch {
        /// A description of the mismatch.
        reason: String,
    },

    /// The map's format tag is not one of the supported game versions.
    #[error("Unsupported map version 0x{version:X}")]
    UnsupportedMapVersion {
        /// The version tag read from the map header.
        version: u32,
    },

    /// A tile references a sprite, template or terrain that does not exist.
    #[error("Invalid tile reference at ({x}, {y}, {z}): {reason}")]
    InvalidTileReference {
        /// Tile column.
        x: u32,
        /// Tile row.
        y: u32,
        /// Level index (0 surface, 1 underground).
        z: u32,
        /// What was referenced and why it is invalid.
        reason: String,
    },

    /// An asset resolver has no asset under the requested name.
    #[error("Asset not found: {name}")]
    AssetNotFound {
        /// The requested asset name.
        name: String,
    },

    /// A background job panicked before producing a result.
    #[error("Background job panicked: {reason}")]
    WorkerPanicked {
        /// The panic message, if it was a string.
        reason: String,
    },

    /// A nested decoder failed while decoding a named archive entry.
    #[error("Entry '{name}': {source}")]
    Entry {
        /// Name of the archive entry.
        name: String,
        /// The underlying failure.
        #[source]
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    /// Creates an `InvalidMagic` error with the given byte slices.
    ///
    /// ```
    /// use h3_assets::error::DecodeError;
    ///
    /// let err = DecodeError::invalid_magic(b"LOD\0", b"\x00\x00\x00\x00");
    /// assert!(err.to_string().contains("Invalid magic bytes"));
    /// ```
    #[must_use]
    pub fn invalid_magic(expected: &[u8], found: &[u8]) -> Self {
        DecodeError::InvalidMagic {
            expected: bytes_to_hex(expected),
            found: bytes_to_hex(found),
        }
    }

    /// Creates a `TruncatedInput` error with the given sizes.
    #[must_use]
    pub fn truncated(expected: usize, available: usize) -> Self {
        DecodeError::TruncatedInput { expected, available }
    }

    /// Wraps this error with the name of the archive entry it came from.
    #[must_use]
    pub fn in_entry(self, name: &str) -> Self {
        DecodeError::Entry {
            name: name.to_string(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, peeling off `Entry` context.
    #[must_use]
    pub fn root(&self) -> &DecodeError {
        match self {
            DecodeError::Entry { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Space-separated uppercase hex, cut after 8 bytes.
fn bytes_to_hex(bytes: &[u8]) -> String {
    let shown = &bytes[..bytes.len().min(8)];
    let prefix = shown
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ");

    if bytes.len() <= 8 {
        prefix
    } else {
        format!("{prefix}... ({} bytes total)", bytes.len())
    }
}

/// A specialized Result type for decoding operations.
pub type Result<T> = std::result::Result<T, DecodeError>;
