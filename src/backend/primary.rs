//! Primary decoder backend: full-featured multi-frame TIFF codec.
//!
//! Wraps the `tiff` crate decoder. The open walks the whole IFD chain to
//! establish the frame count up front, then seeks back to the first
//! directory; any structural error during that walk is recoverable and
//! sends the orchestrator to the fallback backend.

use std::io::Cursor;

use bytes::Bytes;
use tiff::decoder::ifd::Value;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

use crate::error::{BackendError, DecodeError};
use crate::frame::{PixelBuffer, PixelData, TagDictionary, TagValue};
use crate::tags::TagTable;

use super::{BackendKind, DecodeBackend};

// =============================================================================
// PrimaryDecoder
// =============================================================================

/// Adapter over the `tiff` crate decoder.
pub struct PrimaryDecoder {
    decoder: Option<Decoder<Cursor<Bytes>>>,
    table: TagTable,
    frame_count: usize,
    /// Directory currently loaded in the wrapped decoder.
    current: usize,
}

impl PrimaryDecoder {
    /// Structurally open a TIFF byte stream and count its frames.
    ///
    /// # Errors
    ///
    /// Any malformed structure, unsupported compression or I/O failure
    /// during the directory walk is returned as a recoverable
    /// [`BackendError`]; the caller decides whether to fall back.
    pub fn open(data: Bytes, table: TagTable) -> Result<Self, BackendError> {
        let mut decoder = Decoder::new(Cursor::new(data))?;

        // Decoder::new loads the first directory, so the chain holds at
        // least one frame once construction succeeds.
        let mut frame_count = 1;
        while decoder.more_images() {
            decoder.next_image()?;
            frame_count += 1;
        }
        decoder.seek_to_image(0)?;

        Ok(Self {
            decoder: Some(decoder),
            table,
            frame_count,
            current: 0,
        })
    }

    /// Seek the wrapped decoder to the directory for `index`.
    fn seek(&mut self, index: usize) -> Result<&mut Decoder<Cursor<Bytes>>, DecodeError> {
        if index >= self.frame_count {
            return Err(DecodeError::FrameOutOfRange {
                index,
                count: self.frame_count,
            });
        }
        let current = &mut self.current;
        let decoder = self.decoder.as_mut().ok_or(DecodeError::Unsupported {
            backend: BackendKind::Primary.name(),
            operation: "frame access after close",
        })?;
        if *current != index {
            decoder.seek_to_image(index).map_err(BackendError::Tiff)?;
            *current = index;
        }
        Ok(decoder)
    }
}

impl DecodeBackend for PrimaryDecoder {
    fn kind(&self) -> BackendKind {
        BackendKind::Primary
    }

    fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Translate every table id present in the frame's directory.
    ///
    /// Unknown directory entries are skipped; one-element lists collapse
    /// to their scalar so both backends produce the same value shapes.
    fn frame_header(&mut self, index: usize) -> Result<TagDictionary, DecodeError> {
        // Borrow the table by value copy of ids to avoid aliasing the
        // mutable decoder borrow below.
        let ids: Vec<u16> = self.table.ids().collect();
        let mut header = TagDictionary::new();
        for id in ids {
            let key = match self.table.key_of(id) {
                Some(key) => key,
                None => continue,
            };
            let decoder = self.seek(index)?;
            let value = decoder
                .find_tag(Tag::from_u16_exhaustive(id))
                .map_err(BackendError::Tiff)?;
            if let Some(value) = value {
                header.insert(key, convert_value(value).collapse());
            }
        }
        Ok(header)
    }

    fn frame_data(&mut self, index: usize) -> Result<PixelBuffer, DecodeError> {
        let decoder = self.seek(index)?;
        let (width, height) = decoder.dimensions().map_err(BackendError::Tiff)?;
        let data = convert_result(decoder.read_image().map_err(BackendError::Tiff)?);

        let (width, height) = (width as usize, height as usize);
        let pixels = width * height;
        let channels = if pixels > 0 && data.len() % pixels == 0 {
            data.len() / pixels
        } else {
            1
        };
        let len = data.len();
        PixelBuffer::new(width, height, channels, data).ok_or_else(|| {
            DecodeError::Backend(BackendError::Shape { len, width, height })
        })
    }

    fn close(&mut self) {
        self.decoder = None;
    }
}

/// Map a codec tag value into the shared tag vocabulary.
fn convert_value(value: Value) -> TagValue {
    match value {
        Value::Byte(v) => TagValue::Unsigned(u64::from(v)),
        Value::Short(v) => TagValue::Unsigned(u64::from(v)),
        Value::Unsigned(v) => TagValue::Unsigned(u64::from(v)),
        Value::UnsignedBig(v) => TagValue::Unsigned(v),
        Value::Signed(v) => TagValue::Signed(i64::from(v)),
        Value::SignedBig(v) => TagValue::Signed(v),
        Value::Float(v) => TagValue::Float(f64::from(v)),
        Value::Double(v) => TagValue::Float(v),
        Value::Rational(n, d) => TagValue::Rational(u64::from(n), u64::from(d)),
        Value::RationalBig(n, d) => TagValue::Rational(n, d),
        Value::SRational(n, d) => TagValue::SignedRational(i64::from(n), i64::from(d)),
        Value::SRationalBig(n, d) => TagValue::SignedRational(n, d),
        Value::Ascii(s) => TagValue::Text(s),
        Value::List(items) => TagValue::List(items.into_iter().map(convert_value).collect()),
        other => TagValue::Text(format!("{other:?}")),
    }
}

/// Map the codec's decode result into the shared sample storage.
fn convert_result(result: DecodingResult) -> PixelData {
    match result {
        DecodingResult::U8(v) => PixelData::U8(v),
        DecodingResult::U16(v) => PixelData::U16(v),
        DecodingResult::U32(v) => PixelData::U32(v),
        DecodingResult::U64(v) => PixelData::U64(v),
        DecodingResult::I8(v) => PixelData::I8(v),
        DecodingResult::I16(v) => PixelData::I16(v),
        DecodingResult::I32(v) => PixelData::I32(v),
        DecodingResult::I64(v) => PixelData::I64(v),
        DecodingResult::F32(v) => PixelData::F32(v),
        DecodingResult::F64(v) => PixelData::F64(v),
    }
}

// =============================================================================
// Tests
// =============================================================================
