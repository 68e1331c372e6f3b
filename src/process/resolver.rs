//! Name-based asset lookup.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::error::{DecodeError, Result};
use crate::lod::{ArchiveEntry, LodArchive};

/// Supplies asset bytes by name.
///
/// Implementations must be safe to call repeatedly; the map processor
/// resolves each distinct name at most once per run.
pub trait AssetResolver {
    /// Returns the bytes of the named asset.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::AssetNotFound` if the name is unknown, or any
    /// error raised while extracting the asset.
    fn resolve(&self, name: &str) -> Result<Cow<'_, [u8]>>;
}

fn not_found(name: &str) -> DecodeError {
    DecodeError::AssetNotFound {
        name: name.to_string(),
    }
}

impl AssetResolver for LodArchive {
    fn resolve(&self, name: &str) -> Result<Cow<'_, [u8]>> {
        let entry = self.find(name).ok_or_else(|| not_found(name))?;
        self.entry_bytes(entry)
    }
}

impl AssetResolver for HashMap<String, Vec<u8>> {
    fn resolve(&self, name: &str) -> Result<Cow<'_, [u8]>> {
        self.get(name)
            .or_else(|| {
                self.iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, bytes)| bytes)
            })
            .map(|bytes| Cow::Borrowed(bytes.as_slice()))
            .ok_or_else(|| not_found(name))
    }
}

impl<T: AssetResolver + ?Sized> AssetResolver for &T {
    fn resolve(&self, name: &str) -> Result<Cow<'_, [u8]>> {
        (**self).resolve(name)
    }
}

/// An ordered set of archives searched front to back.
///
/// Put expansion archives before base archives so their entries take
/// precedence.
#[derive(Debug, Clone, Default)]
pub struct AssetCatalog {
    archives: Vec<LodArchive>,
}

impl AssetCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an archive with the lowest precedence so far.
    pub fn push(&mut self, archive: LodArchive) {
        self.archives.push(archive);
    }

    /// The archives in search order.
    #[must_use]
    pub fn archives(&self) -> &[LodArchive] {
        &self.archives
    }

    /// Finds the first archive holding `name`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<(&LodArchive, &ArchiveEntry)> {
        self.archives
            .iter()
            .find_map(|archive| archive.find(name).map(|entry| (archive, entry)))
    }
}

impl From<Vec<LodArchive>> for AssetCatalog {
    fn from(archives: Vec<LodArchive>) -> Self {
        AssetCatalog { archives }
    }
}

impl AssetResolver for AssetCatalog {
    fn resolve(&self, name: &str) -> Result<Cow<'_, [u8]>> {
        let (archive, entry) = self.find(name).ok_or_else(|| not_found(name))?;
        archive.entry_bytes(entry)
    }
}
