//! Fixed-prefix header probe.
//!
//! Detector files in this TIFF-family layout carry coarse geometry in the
//! first 64 bytes: viewed as 32 unsigned 16-bit words, word 9 is the image
//! width, word 15 the height and word 21 the sample bit depth.
//!
//! The probe is a quick-reject heuristic, not a decode: the orchestrator
//! uses its result only to seed dimension and bit-depth hints and never
//! trusts it for final geometry. Both decoder backends re-read the input
//! from offset 0 afterwards, which is why the probe takes a byte slice
//! rather than consuming a stream.

use crate::error::ProbeError;

/// Number of bytes inspected by the probe.
pub const PROBE_PREFIX_LEN: usize = 64;

/// Word index of the image width within the probe prefix.
const WIDTH_WORD: usize = 9;

/// Word index of the image height within the probe prefix.
const HEIGHT_WORD: usize = 15;

/// Word index of the sample bit depth within the probe prefix.
const BIT_DEPTH_WORD: usize = 21;

// =============================================================================
// ProbeHint
// =============================================================================

/// Advisory geometry extracted from the fixed 64-byte prefix.
///
/// Valid for the common word layout of this format family; files that
/// deviate simply produce meaningless hints, which is acceptable because
/// nothing downstream relies on them for correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeHint {
    /// Image width in pixels (word 9).
    pub width: u16,

    /// Image height in pixels (word 15).
    pub height: u16,

    /// Bits per sample (word 21).
    pub bit_depth: u16,
}

/// Probe the first 64 bytes of a file for coarse geometry.
///
/// The prefix is decoded as little-endian 16-bit words. The source format
/// leaves endianness platform-native; little-endian is the layout of every
/// file observed in practice and is fixed here deliberately rather than
/// guessed from the host.
///
/// # Errors
///
/// [`ProbeError::Truncated`] if `data` holds fewer than
/// [`PROBE_PREFIX_LEN`] bytes.
pub fn probe_header(data: &[u8]) -> Result<ProbeHint, ProbeError> {
    if data.len() < PROBE_PREFIX_LEN {
        return Err(ProbeError::Truncated {
            needed: PROBE_PREFIX_LEN,
            got: data.len(),
        });
    }

    let word = |index: usize| {
        let offset = index * 2;
        u16::from_le_bytes([data[offset], data[offset + 1]])
    };

    Ok(ProbeHint {
        width: word(WIDTH_WORD),
        height: word(HEIGHT_WORD),
        bit_depth: word(BIT_DEPTH_WORD),
    })
}

// =============================================================================
// Tests
// =============================================================================
