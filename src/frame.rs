//! Frame model: one exposure's tag dictionary plus pixel buffer.
//!
//! Both decoder backends produce [`Frame`]s through this module, so the
//! divergent value shapes of the two codecs (rich typed tag entries on the
//! primary side, synthesized scalars on the fallback side) are normalized
//! into one [`TagValue`] vocabulary here.

use std::collections::HashMap;

// =============================================================================
// Tag Values
// =============================================================================

/// A scalar or compound metadata value attached to a translated tag name.
///
/// One-element lists never appear in a dictionary: adapters collapse them
/// to their inner scalar during translation so that the same tag yields
/// the same shape regardless of which backend decoded it.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    /// Unsigned integer (BYTE, SHORT, LONG, LONG8 field types).
    Unsigned(u64),

    /// Signed integer (SBYTE, SSHORT, SLONG, SLONG8 field types).
    Signed(i64),

    /// Floating point (FLOAT, DOUBLE field types).
    Float(f64),

    /// Unsigned rational as (numerator, denominator).
    Rational(u64, u64),

    /// Signed rational as (numerator, denominator).
    SignedRational(i64, i64),

    /// ASCII text.
    Text(String),

    /// Multi-element value; always has two or more elements.
    List(Vec<TagValue>),
}

impl TagValue {
    /// Interpret the value as an unsigned integer, if it is one.
    pub fn as_unsigned(&self) -> Option<u64> {
        match self {
            TagValue::Unsigned(v) => Some(*v),
            TagValue::Signed(v) if *v >= 0 => Some(*v as u64),
            _ => None,
        }
    }

    /// Interpret the value as text, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TagValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Collapse a one-element list to its inner scalar.
    ///
    /// Multi-element lists and scalars are returned unchanged. This is the
    /// cross-backend normalization applied to every translated tag value.
    pub fn collapse(self) -> TagValue {
        match self {
            TagValue::List(mut items) if items.len() == 1 => items.remove(0).collapse(),
            other => other,
        }
    }
}

impl std::fmt::Display for TagValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagValue::Unsigned(v) => write!(f, "{v}"),
            TagValue::Signed(v) => write!(f, "{v}"),
            TagValue::Float(v) => write!(f, "{v}"),
            TagValue::Rational(n, d) => write!(f, "{n}/{d}"),
            TagValue::SignedRational(n, d) => write!(f, "{n}/{d}"),
            TagValue::Text(s) => f.write_str(s),
            TagValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Translated tag dictionary: unique human-readable keys to values.
pub type TagDictionary = HashMap<String, TagValue>;

// =============================================================================
// Pixel Buffers
// =============================================================================

/// Decoded sample storage, element type fixed per decode.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl PixelData {
    /// Number of samples in the buffer.
    pub fn len(&self) -> usize {
        match self {
            PixelData::U8(v) => v.len(),
            PixelData::U16(v) => v.len(),
            PixelData::U32(v) => v.len(),
            PixelData::U64(v) => v.len(),
            PixelData::I8(v) => v.len(),
            PixelData::I16(v) => v.len(),
            PixelData::I32(v) => v.len(),
            PixelData::I64(v) => v.len(),
            PixelData::F32(v) => v.len(),
            PixelData::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name of the element type, used in error messages.
    pub const fn element_name(&self) -> &'static str {
        match self {
            PixelData::U8(_) => "u8",
            PixelData::U16(_) => "u16",
            PixelData::U32(_) => "u32",
            PixelData::U64(_) => "u64",
            PixelData::I8(_) => "i8",
            PixelData::I16(_) => "i16",
            PixelData::I32(_) => "i32",
            PixelData::I64(_) => "i64",
            PixelData::F32(_) => "f32",
            PixelData::F64(_) => "f64",
        }
    }

    /// Bits per sample of the element type.
    pub const fn bits_per_sample(&self) -> u16 {
        match self {
            PixelData::U8(_) | PixelData::I8(_) => 8,
            PixelData::U16(_) | PixelData::I16(_) => 16,
            PixelData::U32(_) | PixelData::I32(_) | PixelData::F32(_) => 32,
            PixelData::U64(_) | PixelData::I64(_) | PixelData::F64(_) => 64,
        }
    }
}

/// A decoded raster: row-major samples with `height x width` geometry and
/// an optional interleaved channel axis.
///
/// Invariant: `data.len() == width * height * channels`. The container's
/// `dim1`/`dim2` fields always mirror `width`/`height` after a successful
/// decode.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    channels: usize,
    data: PixelData,
}

impl PixelBuffer {
    /// Build a buffer, validating the sample count against the geometry.
    ///
    /// Returns `None` when `data.len() != width * height * channels`.
    pub fn new(width: usize, height: usize, channels: usize, data: PixelData) -> Option<Self> {
        if channels == 0 || data.len() != width * height * channels {
            return None;
        }
        Some(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Width in pixels (second axis extent).
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels (first axis extent).
    pub fn height(&self) -> usize {
        self.height
    }

    /// Interleaved channel count; 1 for grayscale detector data.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Array rank: 2 for single-channel data, 3 when a channel axis exists.
    pub fn rank(&self) -> usize {
        if self.channels > 1 {
            3
        } else {
            2
        }
    }

    /// The sample storage.
    pub fn data(&self) -> &PixelData {
        &self.data
    }

    /// Consume the buffer, returning the sample storage.
    pub fn into_data(self) -> PixelData {
        self.data
    }
}

// =============================================================================
// Frame
// =============================================================================

/// One exposure: a translated tag dictionary paired with its pixel buffer.
///
/// Frames are read-only once produced by a decoder adapter.
#[derive(Debug, Clone)]
pub struct Frame {
    header: TagDictionary,
    data: PixelBuffer,
}

impl Frame {
    pub fn new(header: TagDictionary, data: PixelBuffer) -> Self {
        Self { header, data }
    }

    /// The translated tag dictionary for this exposure.
    pub fn header(&self) -> &TagDictionary {
        &self.header
    }

    /// The decoded pixel buffer for this exposure.
    pub fn data(&self) -> &PixelBuffer {
        &self.data
    }

    /// Split the frame into its header and buffer.
    pub fn into_parts(self) -> (TagDictionary, PixelBuffer) {
        (self.header, self.data)
    }
}

// =============================================================================
// Tests
// =============================================================================
