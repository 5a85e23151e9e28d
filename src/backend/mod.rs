//! Decoder backend strategy interface.
//!
//! The orchestrator decodes through an ordered chain of two concrete
//! backends behind one trait:
//!
//! - [`PrimaryDecoder`] wraps the full-featured multi-frame TIFF codec
//! - [`FallbackDecoder`] wraps a generic single-frame raster codec
//!
//! The chain is fixed (primary first, fallback second); backend selection
//! happens exactly once per successful open and is never re-probed.

use crate::error::DecodeError;
use crate::frame::{Frame, PixelBuffer, TagDictionary};

pub mod primary;
pub use primary::PrimaryDecoder;

#[cfg(feature = "fallback")]
pub mod fallback;
#[cfg(feature = "fallback")]
pub use fallback::FallbackDecoder;

// =============================================================================
// Backend identity
// =============================================================================

/// Identity of the decoder that produced a container's frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Full-featured multi-frame TIFF codec.
    Primary,

    /// Generic single-frame raster codec.
    Fallback,
}

impl BackendKind {
    /// Short name used in logs and error messages.
    pub const fn name(&self) -> &'static str {
        match self {
            BackendKind::Primary => "primary",
            BackendKind::Fallback => "fallback",
        }
    }
}

// =============================================================================
// DecodeBackend trait
// =============================================================================

/// Uniform contract over the two codec adapters.
///
/// A backend is created by a successful structural open; afterwards the
/// orchestrator only asks it for frames and eventually closes it. Methods
/// take `&mut self` because the primary codec seeks its underlying stream
/// to the requested frame's directory.
pub trait DecodeBackend {
    /// Which concrete backend this is.
    fn kind(&self) -> BackendKind;

    /// Number of frames the open exposed (always 1 for the fallback).
    fn frame_count(&self) -> usize;

    /// Translated tag dictionary for one frame.
    ///
    /// `index` must be in `0..frame_count`; the fallback additionally
    /// rejects any index other than 0 as unsupported.
    fn frame_header(&mut self, index: usize) -> Result<TagDictionary, DecodeError>;

    /// Decoded pixel buffer for one frame. Same index contract as
    /// [`frame_header`](Self::frame_header).
    fn frame_data(&mut self, index: usize) -> Result<PixelBuffer, DecodeError>;

    /// Release codec-internal buffers and handles. Idempotent; frame
    /// accessors fail after close.
    fn close(&mut self);

    /// Produce a fresh frame (header plus data) for one index.
    fn frame(&mut self, index: usize) -> Result<Frame, DecodeError> {
        let header = self.frame_header(index)?;
        let data = self.frame_data(index)?;
        Ok(Frame::new(header, data))
    }
}
