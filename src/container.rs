//! Decode orchestrator and multi-frame image container.
//!
//! [`ImageContainer::open`] drives the decode state machine:
//!
//! ```text
//! INIT -> PROBING -> PRIMARY_ATTEMPT -> PRIMARY_OK ............. READY
//!                          |
//!                          v
//!                    FALLBACK_ATTEMPT -> FALLBACK_OK ........... READY
//!                          |
//!                          v
//!                    FALLBACK_FAILED ........................... ERROR
//! ```
//!
//! The probe only seeds advisory hints and its failures are ignored. Each
//! backend failure is logged at warning severity and the next backend in
//! the chain is attempted from offset 0; exhausting the chain is a hard
//! error returned to the caller. Backend identity is set exactly once per
//! successful open and never re-probed.

use std::path::Path;

use bytes::Bytes;
use tracing::{debug, error, warn};

use crate::backend::{BackendKind, DecodeBackend, PrimaryDecoder};
use crate::error::{BackendError, DecodeError};
use crate::frame::{Frame, PixelBuffer, TagDictionary};
use crate::probe::{probe_header, ProbeHint};
use crate::tags::TagTable;

#[cfg(feature = "fallback")]
use crate::backend::FallbackDecoder;

// =============================================================================
// ImageState
// =============================================================================

/// Mutable image-object state the orchestrator populates during a decode:
/// the current header dictionary, pixel data slot, and dimension fields.
///
/// `dim1` is the width (second axis extent), `dim2` the height (first axis
/// extent); after a successful decode they always equal the current
/// buffer's shape.
#[derive(Debug, Default)]
pub struct ImageState {
    header: TagDictionary,
    data: Option<PixelBuffer>,
    dim1: usize,
    dim2: usize,
    bit_depth_hint: Option<u16>,
}

impl ImageState {
    /// Clear header, data and dimensions ahead of a decode attempt.
    fn reset(&mut self) {
        self.header.clear();
        self.data = None;
        self.dim1 = 0;
        self.dim2 = 0;
    }

    /// Install a decoded frame and update the dimension fields from the
    /// buffer's shape.
    fn install(&mut self, frame: Frame) {
        let (header, buffer) = frame.into_parts();
        if buffer.channels() > 1 {
            warn!(
                channels = buffer.channels(),
                "third buffer axis is treated as color"
            );
        }
        self.dim1 = buffer.width();
        self.dim2 = buffer.height();
        self.header = header;
        self.data = Some(buffer);
    }
}

// =============================================================================
// ImageContainer
// =============================================================================

/// Multi-frame image decoded through the backend chain.
///
/// Owns at most one active backend handle (primary or fallback, never
/// both). Not designed for concurrent mutation; treat a container as owned
/// by a single logical caller at a time.
pub struct ImageContainer {
    state: ImageState,
    backend: Option<Box<dyn DecodeBackend>>,
    frame_count: usize,
    table: TagTable,
}

impl std::fmt::Debug for ImageContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageContainer")
            .field("state", &self.state)
            .field(
                "backend",
                &self.backend.as_ref().map(|backend| backend.kind()),
            )
            .field("frame_count", &self.frame_count)
            .field("table", &self.table)
            .finish()
    }
}

impl ImageContainer {
    /// Open and decode a file with the canonical tag table.
    ///
    /// # Errors
    ///
    /// An unreadable file propagates as [`DecodeError::Io`]; a file neither
    /// backend can parse returns [`DecodeError::AllBackendsFailed`]. A
    /// failed open never leaves partially populated dimensions or data.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DecodeError> {
        Self::open_with_table(path, TagTable::baseline())
    }

    /// Open and decode a file with an injected tag table.
    pub fn open_with_table(path: impl AsRef<Path>, table: TagTable) -> Result<Self, DecodeError> {
        let path = path.as_ref();
        let data = Bytes::from(std::fs::read(path)?);
        Self::decode_named(data, table, &path.display().to_string())
    }

    /// Decode an in-memory byte stream with the canonical tag table.
    pub fn decode(data: Bytes) -> Result<Self, DecodeError> {
        Self::decode_named(data, TagTable::baseline(), "<memory>")
    }

    /// Decode an in-memory byte stream with an injected tag table.
    pub fn decode_with_table(data: Bytes, table: TagTable) -> Result<Self, DecodeError> {
        Self::decode_named(data, table, "<memory>")
    }

    fn decode_named(data: Bytes, table: TagTable, source_name: &str) -> Result<Self, DecodeError> {
        let mut container = Self {
            state: ImageState::default(),
            backend: None,
            frame_count: 0,
            table,
        };
        container.state.reset();

        // PROBING: advisory only. A short prefix is not an error here; it
        // merely leaves the hint empty while the adapters still get their
        // full attempt from offset 0.
        match probe_header(&data) {
            Ok(ProbeHint { bit_depth, .. }) => {
                container.state.bit_depth_hint = Some(bit_depth);
            }
            Err(err) => debug!(%err, source_name, "header probe failed; continuing without hints"),
        }

        let (backend, frame) = container.run_chain(data, source_name)?;
        container.frame_count = backend.frame_count();
        container.state.install(frame);
        container.backend = Some(backend);
        Ok(container)
    }

    /// Ordered chain-of-responsibility over the two backends.
    ///
    /// An attempt covers the structural open and the eager read of frame 0:
    /// a backend that opens but cannot produce its first frame counts as
    /// failed, and the next backend gets the input from offset 0.
    fn run_chain(
        &self,
        data: Bytes,
        source_name: &str,
    ) -> Result<(Box<dyn DecodeBackend>, Frame), DecodeError> {
        // PRIMARY_ATTEMPT: the adapter views the bytes from offset 0.
        match self.attempt_primary(data.clone()) {
            Ok(decoded) => return Ok(decoded),
            Err(err) => {
                warn!(%err, source_name, "primary TIFF backend failed; trying fallback");
            }
        }

        // FALLBACK_ATTEMPT: again from offset 0.
        match self.attempt_fallback(data) {
            Ok(decoded) => Ok(decoded),
            Err(err) => {
                match err {
                    DecodeError::Backend(BackendError::Unavailable(_)) => {
                        warn!(%err, source_name, "fallback backend unavailable in this build")
                    }
                    _ => warn!(%err, source_name, "fallback raster backend failed"),
                }
                error!(source_name, "no backend could decode the input");
                Err(DecodeError::AllBackendsFailed {
                    source_name: source_name.to_string(),
                })
            }
        }
    }

    fn attempt_primary(&self, data: Bytes) -> Result<(Box<dyn DecodeBackend>, Frame), DecodeError> {
        let mut backend = PrimaryDecoder::open(data, self.table.clone()).map_err(DecodeError::Backend)?;
        let frame = backend.frame(0)?;
        Ok((Box::new(backend), frame))
    }

    #[cfg(feature = "fallback")]
    fn attempt_fallback(
        &self,
        data: Bytes,
    ) -> Result<(Box<dyn DecodeBackend>, Frame), DecodeError> {
        let mut backend =
            FallbackDecoder::open(data, &self.table).map_err(DecodeError::Backend)?;
        let frame = backend.frame(0)?;
        Ok((Box::new(backend), frame))
    }

    #[cfg(not(feature = "fallback"))]
    fn attempt_fallback(
        &self,
        _data: Bytes,
    ) -> Result<(Box<dyn DecodeBackend>, Frame), DecodeError> {
        Err(DecodeError::Backend(BackendError::Unavailable(
            "generic raster codec not compiled in (enable the `fallback` feature)",
        )))
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Identity of the backend that decoded this container, or `None`
    /// after close.
    pub fn backend_kind(&self) -> Option<BackendKind> {
        self.backend.as_ref().map(|b| b.kind())
    }

    /// Number of frames the decode exposed (1 on the fallback backend).
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Tag dictionary of the current (first) frame.
    pub fn header(&self) -> &TagDictionary {
        &self.state.header
    }

    /// Pixel buffer of the current (first) frame.
    pub fn data(&self) -> Option<&PixelBuffer> {
        self.state.data.as_ref()
    }

    /// Width of the current frame (second axis extent).
    pub fn dim1(&self) -> usize {
        self.state.dim1
    }

    /// Height of the current frame (first axis extent).
    pub fn dim2(&self) -> usize {
        self.state.dim2
    }

    /// Bit-depth word extracted by the header probe, if the input was long
    /// enough to probe. Advisory only.
    pub fn bit_depth_hint(&self) -> Option<u16> {
        self.state.bit_depth_hint
    }

    /// Fetch a frame by index from the primary backend.
    ///
    /// Returns a fresh, independent [`Frame`]; nothing is cached on the
    /// container.
    ///
    /// # Errors
    ///
    /// [`DecodeError::Unsupported`] unless the active backend is the
    /// primary one; [`DecodeError::FrameOutOfRange`] outside
    /// `0..frame_count`.
    pub fn frame(&mut self, index: usize) -> Result<Frame, DecodeError> {
        let backend = self.backend.as_mut().ok_or(DecodeError::Unsupported {
            backend: "none",
            operation: "frame lookup on a closed container",
        })?;
        if backend.kind() != BackendKind::Primary {
            return Err(DecodeError::Unsupported {
                backend: backend.kind().name(),
                operation: "multi-frame indexing",
            });
        }
        if index >= self.frame_count {
            return Err(DecodeError::FrameOutOfRange {
                index,
                count: self.frame_count,
            });
        }
        backend.frame(index)
    }

    /// Release the active backend handle. Safe to call multiple times; the
    /// backend identity is `None` afterwards.
    pub fn close(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            backend.close();
        }
    }
}

impl Drop for ImageContainer {
    fn drop(&mut self) {
        self.close();
    }
}

// =============================================================================
// Tests
// =============================================================================
