//! Frame writer: serializes through the primary TIFF codec only.
//!
//! There is no fallback writer. The encoder session is scoped to the call
//! and released on every exit path, including mid-write failures, so
//! callers never leak an open handle; any failure propagates directly
//! with no retry.
//!
//! Alongside the pixel data the writer embeds a software-identifier tag,
//! a generation timestamp, and the caller's header entries serialized
//! into the ImageDescription tag.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use tiff::encoder::{colortype, colortype::ColorType, TiffEncoder, TiffValue};
use tiff::tags::Tag;

use crate::error::WriteError;
use crate::frame::{PixelBuffer, PixelData, TagDictionary};

/// Value of the embedded software-identifier tag.
pub const SOFTWARE_TAG: &str = concat!("frameio ", env!("CARGO_PKG_VERSION"));

/// TIFF timestamp layout (`YYYY:MM:DD HH:MM:SS`).
const DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Write one frame to a file.
///
/// # Errors
///
/// [`WriteError::UnsupportedBuffer`] when the buffer's element type and
/// channel count have no TIFF encoding in the primary codec; codec and
/// I/O failures propagate unchanged.
pub fn write_frame(
    path: impl AsRef<Path>,
    buffer: &PixelBuffer,
    header: &TagDictionary,
) -> Result<(), WriteError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_frame_to(&mut writer, buffer, header)?;
    writer.flush()?;
    Ok(())
}

/// Write one frame to any seekable stream.
pub fn write_frame_to<W: Write + Seek>(
    writer: &mut W,
    buffer: &PixelBuffer,
    header: &TagDictionary,
) -> Result<(), WriteError> {
    let timestamp = chrono::Local::now().format(DATETIME_FORMAT).to_string();
    let description = serialize_header(header);

    // The encoder is dropped at the end of this scope whether or not the
    // write succeeds, releasing the session.
    let mut encoder = TiffEncoder::new(writer)?;

    let width = buffer.width() as u32;
    let height = buffer.height() as u32;
    match (buffer.data(), buffer.channels()) {
        (PixelData::U8(samples), 1) => {
            encode::<_, colortype::Gray8>(&mut encoder, width, height, samples, &timestamp, &description)
        }
        (PixelData::U8(samples), 3) => {
            encode::<_, colortype::RGB8>(&mut encoder, width, height, samples, &timestamp, &description)
        }
        (PixelData::U8(samples), 4) => {
            encode::<_, colortype::RGBA8>(&mut encoder, width, height, samples, &timestamp, &description)
        }
        (PixelData::U16(samples), 1) => {
            encode::<_, colortype::Gray16>(&mut encoder, width, height, samples, &timestamp, &description)
        }
        (PixelData::U16(samples), 3) => {
            encode::<_, colortype::RGB16>(&mut encoder, width, height, samples, &timestamp, &description)
        }
        (PixelData::U16(samples), 4) => {
            encode::<_, colortype::RGBA16>(&mut encoder, width, height, samples, &timestamp, &description)
        }
        (PixelData::U32(samples), 1) => {
            encode::<_, colortype::Gray32>(&mut encoder, width, height, samples, &timestamp, &description)
        }
        (PixelData::U64(samples), 1) => {
            encode::<_, colortype::Gray64>(&mut encoder, width, height, samples, &timestamp, &description)
        }
        (PixelData::F32(samples), 1) => encode::<_, colortype::Gray32Float>(
            &mut encoder,
            width,
            height,
            samples,
            &timestamp,
            &description,
        ),
        (PixelData::F64(samples), 1) => encode::<_, colortype::Gray64Float>(
            &mut encoder,
            width,
            height,
            samples,
            &timestamp,
            &description,
        ),
        (data, channels) => Err(WriteError::UnsupportedBuffer {
            element: data.element_name(),
            channels,
        }),
    }
}

/// Encode one image directory with the metadata tags attached.
fn encode<W, C>(
    encoder: &mut TiffEncoder<W>,
    width: u32,
    height: u32,
    samples: &[C::Inner],
    timestamp: &str,
    description: &str,
) -> Result<(), WriteError>
where
    W: Write + Seek,
    C: ColorType,
    [C::Inner]: TiffValue,
{
    let mut image = encoder.new_image::<C>(width, height)?;
    image.encoder().write_tag(Tag::Software, SOFTWARE_TAG)?;
    image.encoder().write_tag(Tag::DateTime, timestamp)?;
    if !description.is_empty() {
        image
            .encoder()
            .write_tag(Tag::ImageDescription, description)?;
    }
    image.write_data(samples)?;
    Ok(())
}

/// Serialize header entries as `key=value` lines, sorted by key so the
/// embedded description is deterministic.
fn serialize_header(header: &TagDictionary) -> String {
    let mut entries: Vec<_> = header.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// =============================================================================
// Tests
// =============================================================================
