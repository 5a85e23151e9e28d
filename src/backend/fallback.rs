//! Fallback decoder backend: generic single-frame raster codec.
//!
//! Wraps the `image` crate. The generic codec exposes no per-tag access,
//! so the adapter synthesizes a native id → value map from the properties
//! the codec does understand (width, height, bits per sample, samples per
//! pixel) and translates it through the shared tag table with the same
//! lowercase-first and scalar-collapse normalization as the primary path.
//!
//! This backend always yields exactly one frame.

use std::collections::BTreeMap;
use std::io::Cursor;

use bytes::Bytes;
use image::{DynamicImage, ImageReader};

use crate::error::{BackendError, DecodeError};
use crate::frame::{PixelBuffer, PixelData, TagDictionary, TagValue};
use crate::tags::TagTable;

use super::{BackendKind, DecodeBackend};

/// Tag ids the generic codec can synthesize from its decode result.
const NATIVE_WIDTH: u16 = 256;
const NATIVE_HEIGHT: u16 = 257;
const NATIVE_BITS_PER_SAMPLE: u16 = 258;
const NATIVE_SAMPLES_PER_PIXEL: u16 = 277;

// =============================================================================
// FallbackDecoder
// =============================================================================

/// Adapter over the `image` crate.
///
/// Decodes eagerly on open; the frame accessors hand out copies of the
/// materialized result until close releases it.
pub struct FallbackDecoder {
    decoded: Option<(TagDictionary, PixelBuffer)>,
}

impl FallbackDecoder {
    /// Decode a byte stream with the generic raster codec.
    ///
    /// # Errors
    ///
    /// [`BackendError::Raster`] if the codec cannot interpret the stream
    /// at all (not a recognized raster format).
    pub fn open(data: Bytes, table: &TagTable) -> Result<Self, BackendError> {
        let image = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(image::ImageError::IoError)?
            .decode()?;

        let native = native_tag_map(&image);
        let header = translate(&native, table);
        let buffer = into_pixel_buffer(image)?;

        Ok(Self {
            decoded: Some((header, buffer)),
        })
    }

    /// Reject non-zero indices and access after close.
    fn checked(&self, index: usize) -> Result<&(TagDictionary, PixelBuffer), DecodeError> {
        if index != 0 {
            return Err(DecodeError::Unsupported {
                backend: BackendKind::Fallback.name(),
                operation: "multi-frame indexing",
            });
        }
        self.decoded.as_ref().ok_or(DecodeError::Unsupported {
            backend: BackendKind::Fallback.name(),
            operation: "frame access after close",
        })
    }
}

impl DecodeBackend for FallbackDecoder {
    fn kind(&self) -> BackendKind {
        BackendKind::Fallback
    }

    fn frame_count(&self) -> usize {
        1
    }

    fn frame_header(&mut self, index: usize) -> Result<TagDictionary, DecodeError> {
        let (header, _) = self.checked(index)?;
        Ok(header.clone())
    }

    fn frame_data(&mut self, index: usize) -> Result<PixelBuffer, DecodeError> {
        let (_, buffer) = self.checked(index)?;
        Ok(buffer.clone())
    }

    fn close(&mut self) {
        self.decoded = None;
    }
}

/// Synthesize the codec's native per-image tag map.
///
/// Bits per sample is deliberately a per-channel list so that grayscale
/// images exercise the one-element collapse and multi-channel images keep
/// their tuple shape, matching what the primary codec produces.
fn native_tag_map(image: &DynamicImage) -> BTreeMap<u16, TagValue> {
    let color = image.color();
    let channels = u64::from(color.channel_count());
    let bits_per_sample = u64::from(color.bits_per_pixel()) / channels.max(1);

    let mut native = BTreeMap::new();
    native.insert(NATIVE_WIDTH, TagValue::Unsigned(u64::from(image.width())));
    native.insert(NATIVE_HEIGHT, TagValue::Unsigned(u64::from(image.height())));
    native.insert(
        NATIVE_BITS_PER_SAMPLE,
        TagValue::List(vec![TagValue::Unsigned(bits_per_sample); channels as usize]),
    );
    native.insert(NATIVE_SAMPLES_PER_PIXEL, TagValue::Unsigned(channels));
    native
}

/// Translate a native tag map through the shared table.
///
/// Only ids known to the table are kept; names get a lowercased first
/// character and one-element lists collapse to their scalar.
fn translate(native: &BTreeMap<u16, TagValue>, table: &TagTable) -> TagDictionary {
    let mut header = TagDictionary::new();
    for id in table.ids() {
        if let (Some(key), Some(value)) = (table.key_of(id), native.get(&id)) {
            header.insert(key, value.clone().collapse());
        }
    }
    header
}

/// Materialize the decoded raster as a pixel buffer without multi-frame
/// indexing. Exotic color layouts are converted to 8-bit RGB.
fn into_pixel_buffer(image: DynamicImage) -> Result<PixelBuffer, BackendError> {
    let width = image.width() as usize;
    let height = image.height() as usize;

    let (channels, data) = match image {
        DynamicImage::ImageLuma8(b) => (1, PixelData::U8(b.into_raw())),
        DynamicImage::ImageLumaA8(b) => (2, PixelData::U8(b.into_raw())),
        DynamicImage::ImageRgb8(b) => (3, PixelData::U8(b.into_raw())),
        DynamicImage::ImageRgba8(b) => (4, PixelData::U8(b.into_raw())),
        DynamicImage::ImageLuma16(b) => (1, PixelData::U16(b.into_raw())),
        DynamicImage::ImageLumaA16(b) => (2, PixelData::U16(b.into_raw())),
        DynamicImage::ImageRgb16(b) => (3, PixelData::U16(b.into_raw())),
        DynamicImage::ImageRgba16(b) => (4, PixelData::U16(b.into_raw())),
        DynamicImage::ImageRgb32F(b) => (3, PixelData::F32(b.into_raw())),
        DynamicImage::ImageRgba32F(b) => (4, PixelData::F32(b.into_raw())),
        other => (3, PixelData::U8(other.to_rgb8().into_raw())),
    };

    let len = data.len();
    PixelBuffer::new(width, height, channels, data)
        .ok_or(BackendError::Shape { len, width, height })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, ImageEncoder};

    /// Encode a small grayscale PNG the generic codec can parse.
    fn tiny_png(width: u32, height: u32) -> Bytes {
        let pixels = vec![0x40u8; (width * height) as usize];
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(&pixels, width, height, ExtendedColorType::L8)
            .unwrap();
        Bytes::from(out)
    }

    #[test]
    fn test_open_decodes_png() {
        let backend = FallbackDecoder::open(tiny_png(8, 5), &TagTable::baseline()).unwrap();
        assert_eq!(backend.frame_count(), 1);
        assert_eq!(backend.kind(), BackendKind::Fallback);
    }

    #[test]
    fn test_open_rejects_garbage() {
        let data = Bytes::from_static(b"neither a raster nor anything else");
        assert!(FallbackDecoder::open(data, &TagTable::baseline()).is_err());
    }

    #[test]
    fn test_header_translation_and_collapse() {
        let mut backend = FallbackDecoder::open(tiny_png(8, 5), &TagTable::baseline()).unwrap();
        let header = backend.frame_header(0).unwrap();
        assert_eq!(
            header.get("numberOfColumns").and_then(TagValue::as_unsigned),
            Some(8)
        );
        assert_eq!(
            header.get("numberOfRows").and_then(TagValue::as_unsigned),
            Some(5)
        );
        // One-element bits-per-sample list collapses to a bare scalar.
        assert_eq!(
            header.get("bitsPerSample").and_then(TagValue::as_unsigned),
            Some(8)
        );
        assert_eq!(
            header.get("samplesPerPixel").and_then(TagValue::as_unsigned),
            Some(1)
        );
    }

    #[test]
    fn test_tags_outside_table_are_omitted() {
        let table = TagTable::from_pairs([(256u16, "NumberOfColumns")]);
        let mut backend = FallbackDecoder::open(tiny_png(4, 4), &table).unwrap();
        let header = backend.frame_header(0).unwrap();
        assert_eq!(header.len(), 1);
        assert!(header.contains_key("numberOfColumns"));
    }

    #[test]
    fn test_data_geometry() {
        let mut backend = FallbackDecoder::open(tiny_png(8, 5), &TagTable::baseline()).unwrap();
        let buffer = backend.frame_data(0).unwrap();
        assert_eq!(buffer.width(), 8);
        assert_eq!(buffer.height(), 5);
        assert_eq!(buffer.channels(), 1);
        assert_eq!(buffer.rank(), 2);
    }

    #[test]
    fn test_nonzero_index_is_unsupported() {
        let mut backend = FallbackDecoder::open(tiny_png(4, 4), &TagTable::baseline()).unwrap();
        assert!(matches!(
            backend.frame_header(1),
            Err(DecodeError::Unsupported { .. })
        ));
        assert!(matches!(
            backend.frame_data(1),
            Err(DecodeError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut backend = FallbackDecoder::open(tiny_png(4, 4), &TagTable::baseline()).unwrap();
        backend.close();
        backend.close();
        assert!(backend.frame_data(0).is_err());
    }

    #[test]
    fn test_close_blocks_header_and_data_alike() {
        let mut backend = FallbackDecoder::open(tiny_png(4, 4), &TagTable::baseline()).unwrap();
        backend.frame_header(0).unwrap();
        backend.close();
        // Header access degrades exactly like data access, not to an
        // empty-but-Ok dictionary.
        assert!(matches!(
            backend.frame_header(0),
            Err(DecodeError::Unsupported { .. })
        ));
        assert!(matches!(
            backend.frame_data(0),
            Err(DecodeError::Unsupported { .. })
        ));
    }
}
