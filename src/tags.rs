//! Tag-id to name translation table.
//!
//! TIFF-family metadata is keyed by numeric tag ids; callers want stable
//! human-readable names. The table is injectable data rather than a
//! compiled-in constant so the decode logic can be exercised against
//! synthetic tag sets, with [`TagTable::baseline`] providing the canonical
//! mapping used by the detector file layout.
//!
//! Both backends translate through the same table: the primary codec looks
//! up every table id in a frame's directory, the fallback codec only the
//! ids it can synthesize from its generic decode. Translated names have
//! their first character lowercased so dictionaries look identical across
//! backends.

use std::collections::BTreeMap;

/// Canonical tag ids and names for the detector TIFF layout.
///
/// Only tags listed here are translated; ids absent from the table are
/// omitted from decoded dictionaries, not errors.
const BASELINE: &[(u16, &str)] = &[
    (256, "NumberOfColumns"),
    (257, "NumberOfRows"),
    (258, "BitsPerSample"),
    (259, "Compression"),
    (262, "PhotometricInterpretation"),
    (270, "ImageDescription"),
    (273, "StripOffsets"),
    (277, "SamplesPerPixel"),
    (278, "RowsPerStrip"),
    (279, "StripByteCounts"),
    (282, "XResolution"),
    (283, "YResolution"),
    (296, "ResolutionUnit"),
    (305, "Software"),
    (306, "Date"),
    (320, "Colormap"),
    (339, "SampleFormat"),
];

// =============================================================================
// TagTable
// =============================================================================

/// Read-only id → name mapping shared by both decoder backends.
#[derive(Debug, Clone)]
pub struct TagTable {
    names: BTreeMap<u16, String>,
}

impl TagTable {
    /// The canonical table for the detector TIFF layout.
    pub fn baseline() -> Self {
        Self::from_pairs(BASELINE.iter().map(|&(id, name)| (id, name)))
    }

    /// Build a table from arbitrary (id, name) pairs.
    ///
    /// Later pairs override earlier ones for duplicate ids, keeping keys
    /// unique within the table.
    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (u16, S)>) -> Self {
        Self {
            names: pairs
                .into_iter()
                .map(|(id, name)| (id, name.into()))
                .collect(),
        }
    }

    /// Canonical (untranslated) name for a tag id.
    pub fn name_of(&self, id: u16) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Dictionary key for a tag id: the canonical name with its first
    /// character lowercased.
    pub fn key_of(&self, id: u16) -> Option<String> {
        self.name_of(id).map(lowercase_first)
    }

    /// All ids known to the table, in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = u16> + '_ {
        self.names.keys().copied()
    }

    /// Number of ids in the table.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for TagTable {
    fn default() -> Self {
        Self::baseline()
    }
}

/// Lowercase the first character of a name, leaving the rest untouched.
pub fn lowercase_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

// =============================================================================
// Tests
// =============================================================================
