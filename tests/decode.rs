//! End-to-end decode and encode tests.
//!
//! These tests verify:
//! - Write followed by a primary-backend decode reproduces dims and samples
//! - The fallback backend activates when the primary codec rejects a file
//! - Total decode failure is a hard error with nothing partially populated
//! - Frame indexing bounds on a multi-frame container
//! - Idempotent close on both backends
//! - Tag normalization parity between the two backends

use std::io::Cursor;

use bytes::Bytes;

use frameio::{
    write_frame_to, BackendKind, DecodeError, ImageContainer, PixelBuffer, PixelData,
    TagDictionary, TagValue, SOFTWARE_TAG,
};

// =============================================================================
// Helpers
// =============================================================================

/// Opt-in console logging for the backend-chain tests: run with
/// `RUST_LOG=frameio=warn` to see which backend failed and why.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

/// A 16-bit grayscale ramp buffer.
fn gray16_ramp(width: usize, height: usize) -> PixelBuffer {
    let samples: Vec<u16> = (0..width * height).map(|v| (v * 7) as u16).collect();
    PixelBuffer::new(width, height, 1, PixelData::U16(samples)).unwrap()
}

/// Encode a single-frame TIFF through the crate's own writer.
fn tiff_bytes(buffer: &PixelBuffer, header: &TagDictionary) -> Bytes {
    let mut out = Cursor::new(Vec::new());
    write_frame_to(&mut out, buffer, header).unwrap();
    Bytes::from(out.into_inner())
}

/// Encode a multi-frame TIFF directly through the primary codec.
fn multi_frame_tiff(frames: usize, width: u32, height: u32) -> Bytes {
    use tiff::encoder::{colortype, TiffEncoder};

    let mut out = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut out).unwrap();
        for frame in 0..frames {
            let samples: Vec<u16> = (0..width * height).map(|v| v as u16 + frame as u16).collect();
            encoder
                .write_image::<colortype::Gray16>(width, height, &samples)
                .unwrap();
        }
    }
    Bytes::from(out.into_inner())
}

/// Encode a grayscale PNG: parses with the fallback codec, not the
/// primary one.
#[cfg(feature = "fallback")]
fn png_bytes(width: u32, height: u32) -> Bytes {
    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, ImageEncoder};

    let pixels: Vec<u8> = (0..width * height).map(|v| (v % 251) as u8).collect();
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(&pixels, width, height, ExtendedColorType::L8)
        .unwrap();
    Bytes::from(out)
}

// =============================================================================
// Round Trip
// =============================================================================

#[test]
fn test_round_trip_preserves_dims_and_samples() {
    let buffer = gray16_ramp(17, 9);
    let mut header = TagDictionary::new();
    header.insert("exposureTime".into(), TagValue::Float(0.25));

    let mut container = ImageContainer::decode(tiff_bytes(&buffer, &header)).unwrap();
    assert_eq!(container.backend_kind(), Some(BackendKind::Primary));
    assert_eq!(container.dim1(), 17);
    assert_eq!(container.dim2(), 9);
    assert_eq!(container.data().unwrap().data(), buffer.data());
    container.close();
}

#[test]
fn test_round_trip_embeds_software_and_date_tags() {
    let container = ImageContainer::decode(tiff_bytes(&gray16_ramp(4, 4), &TagDictionary::new()))
        .unwrap();
    assert_eq!(
        container.header().get("software").and_then(TagValue::as_text),
        Some(SOFTWARE_TAG)
    );
    // Tag 306 translates to `date` and holds the generation timestamp.
    let date = container
        .header()
        .get("date")
        .and_then(TagValue::as_text)
        .unwrap();
    assert_eq!(date.len(), "YYYY:MM:DD HH:MM:SS".len());
}

#[test]
fn test_write_then_open_file_round_trip() {
    let path = std::env::temp_dir().join(format!("frameio-roundtrip-{}.tif", std::process::id()));
    let buffer = gray16_ramp(5, 5);
    frameio::write_frame(&path, &buffer, &TagDictionary::new()).unwrap();

    let container = ImageContainer::open(&path).unwrap();
    assert_eq!(container.backend_kind(), Some(BackendKind::Primary));
    assert_eq!(container.dim1(), 5);
    assert_eq!(container.dim2(), 5);
    assert_eq!(container.data().unwrap().data(), buffer.data());

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_round_trip_f32_buffer() {
    let samples: Vec<f32> = (0..12).map(|v| v as f32 * 0.5).collect();
    let buffer = PixelBuffer::new(4, 3, 1, PixelData::F32(samples)).unwrap();
    let container = ImageContainer::decode(tiff_bytes(&buffer, &TagDictionary::new())).unwrap();
    assert_eq!(container.data().unwrap().data(), buffer.data());
}

// =============================================================================
// Fallback Activation
// =============================================================================

#[cfg(feature = "fallback")]
#[test]
fn test_fallback_activates_on_non_tiff_raster() {
    init_tracing();
    let mut container = ImageContainer::decode(png_bytes(12, 7)).unwrap();
    assert_eq!(container.backend_kind(), Some(BackendKind::Fallback));
    assert_eq!(container.frame_count(), 1);
    assert_eq!(container.dim1(), 12);
    assert_eq!(container.dim2(), 7);
    assert!(container.data().is_some());
    container.close();
}

#[cfg(feature = "fallback")]
#[test]
fn test_fallback_container_rejects_frame_indexing() {
    let mut container = ImageContainer::decode(png_bytes(4, 4)).unwrap();
    assert!(matches!(
        container.frame(0),
        Err(DecodeError::Unsupported { .. })
    ));
}

// =============================================================================
// Total Failure
// =============================================================================

#[test]
fn test_total_failure_raises_and_populates_nothing() {
    init_tracing();
    let garbage = Bytes::from(vec![0x5Au8; 512]);
    let err = ImageContainer::decode(garbage).unwrap_err();
    assert!(matches!(err, DecodeError::AllBackendsFailed { .. }));
}

#[test]
fn test_probe_truncation_does_not_short_circuit_the_chain() {
    // Too short for the probe, and garbage for both backends: the error
    // must come from backend exhaustion, not from the probe.
    let garbage = Bytes::from(vec![0x5Au8; 16]);
    let err = ImageContainer::decode(garbage).unwrap_err();
    assert!(matches!(err, DecodeError::AllBackendsFailed { .. }));
}

#[test]
fn test_probe_hint_populated_for_long_inputs() {
    let container = ImageContainer::decode(tiff_bytes(&gray16_ramp(8, 8), &TagDictionary::new()))
        .unwrap();
    // The hint words are meaningless for an arbitrary TIFF, but the probe
    // ran and seeded them; the decode trusted the codec's dims instead.
    assert!(container.bit_depth_hint().is_some());
    assert_eq!(container.dim1(), 8);
}

// =============================================================================
// Frame Indexing
// =============================================================================

#[test]
fn test_multi_frame_count_and_bounds() {
    let mut container = ImageContainer::decode(multi_frame_tiff(3, 6, 4)).unwrap();
    assert_eq!(container.backend_kind(), Some(BackendKind::Primary));
    assert_eq!(container.frame_count(), 3);

    for index in 0..3 {
        let frame = container.frame(index).unwrap();
        assert_eq!(frame.data().width(), 6);
        assert_eq!(frame.data().height(), 4);
    }

    assert!(matches!(
        container.frame(3),
        Err(DecodeError::FrameOutOfRange { index: 3, count: 3 })
    ));
}

#[test]
fn test_frames_differ_across_indices() {
    let mut container = ImageContainer::decode(multi_frame_tiff(2, 3, 3)).unwrap();
    let first = container.frame(0).unwrap();
    let second = container.frame(1).unwrap();
    assert_ne!(first.data().data(), second.data().data());
}

#[test]
fn test_frame_lookup_after_close_is_unsupported() {
    let mut container = ImageContainer::decode(multi_frame_tiff(2, 3, 3)).unwrap();
    container.close();
    assert!(matches!(
        container.frame(0),
        Err(DecodeError::Unsupported { .. })
    ));
}

// =============================================================================
// Idempotent Close
// =============================================================================

#[test]
fn test_close_is_idempotent_on_primary() {
    let mut container =
        ImageContainer::decode(tiff_bytes(&gray16_ramp(4, 4), &TagDictionary::new())).unwrap();
    container.close();
    assert_eq!(container.backend_kind(), None);
    container.close();
    assert_eq!(container.backend_kind(), None);
}

#[cfg(feature = "fallback")]
#[test]
fn test_close_is_idempotent_on_fallback() {
    let mut container = ImageContainer::decode(png_bytes(4, 4)).unwrap();
    container.close();
    container.close();
    assert_eq!(container.backend_kind(), None);
}

// =============================================================================
// Tag Normalization Parity
// =============================================================================

#[cfg(feature = "fallback")]
#[test]
fn test_geometry_tags_identical_across_backends() {
    // Same geometry decoded once per backend: the commonly-understood
    // tags must come out with identical keys and value shapes.
    let via_primary =
        ImageContainer::decode(tiff_bytes(&gray16_ramp(10, 6), &TagDictionary::new())).unwrap();
    let via_fallback = ImageContainer::decode(png_bytes(10, 6)).unwrap();
    assert_eq!(via_primary.backend_kind(), Some(BackendKind::Primary));
    assert_eq!(via_fallback.backend_kind(), Some(BackendKind::Fallback));

    for key in ["numberOfColumns", "numberOfRows"] {
        assert_eq!(
            via_primary.header().get(key).and_then(TagValue::as_unsigned),
            via_fallback.header().get(key).and_then(TagValue::as_unsigned),
            "mismatch for {key}"
        );
    }

    // Single-element bits-per-sample collapses to a bare scalar on both
    // paths; the depths differ (16-bit TIFF vs 8-bit PNG) but the shape
    // must not.
    assert_eq!(
        via_primary
            .header()
            .get("bitsPerSample")
            .and_then(TagValue::as_unsigned),
        Some(16)
    );
    assert_eq!(
        via_fallback
            .header()
            .get("bitsPerSample")
            .and_then(TagValue::as_unsigned),
        Some(8)
    );
}
