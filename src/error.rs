use thiserror::Error;

/// Errors raised by the fixed-prefix header probe.
///
/// Probe results are advisory, so the orchestrator ignores these during a
/// normal open; they only become visible when the probe is called directly.
#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    /// The input holds fewer bytes than the fixed probe prefix.
    #[error("truncated header: need {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },
}

/// A single backend failed to structurally parse the input.
///
/// These are recoverable: the orchestrator logs them at warning severity
/// and moves on to the next backend in the chain.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The primary TIFF codec rejected the byte stream.
    #[error("TIFF codec error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// The fallback raster codec rejected the byte stream.
    #[cfg(feature = "fallback")]
    #[error("raster codec error: {0}")]
    Raster(#[from] image::ImageError),

    /// The decoded sample count disagrees with the declared geometry.
    #[error("decoded buffer length {len} does not match {width}x{height} geometry")]
    Shape {
        len: usize,
        width: usize,
        height: usize,
    },

    /// No implementation of this backend exists in the current build.
    ///
    /// Distinct from a format error: the file may well be decodable, the
    /// runtime environment just lacks the codec.
    #[error("backend unavailable: {0}")]
    Unavailable(&'static str),
}

/// Errors surfaced to callers of the decode orchestrator.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Every backend in the chain failed to decode the input.
    ///
    /// This is the terminal error state of the decode state machine; the
    /// individual backend failures have already been logged.
    #[error("no backend could decode {source_name}")]
    AllBackendsFailed { source_name: String },

    /// The active backend does not provide the requested capability
    /// (e.g. frame indexing on the single-frame fallback backend).
    #[error("unsupported operation on {backend} backend: {operation}")]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },

    /// Frame index outside `0..frame_count`.
    #[error("frame index {index} out of range (frame count {count})")]
    FrameOutOfRange { index: usize, count: usize },

    /// The input could not be read at all. Propagated unmodified; there is
    /// no retry policy anywhere in the decode path.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Structural failure reported by the active backend after a
    /// successful open (e.g. a corrupt frame body).
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors raised while writing a frame through the primary codec.
///
/// Writing never falls back: any failure propagates directly after the
/// write session has been released.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Encoder-side TIFF error.
    #[error("TIFF codec error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// The buffer's element type / channel combination has no TIFF
    /// encoding supported by the primary codec.
    #[error("cannot encode {element} buffer with {channels} channel(s)")]
    UnsupportedBuffer {
        element: &'static str,
        channels: usize,
    },

    /// I/O error on the output stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the whitespace-delimited spreadsheet reader.
#[derive(Debug, Error)]
pub enum SpreadsheetError {
    /// The dimension line is missing or unparseable.
    #[error("invalid dimension line: {0}")]
    InvalidDimensions(String),

    /// The row data does not match the declared dimensions.
    #[error(
        "data shape mismatch: declared {declared_width}x{declared_height}, parsed {rows} row(s)"
    )]
    ShapeMismatch {
        declared_width: usize,
        declared_height: usize,
        rows: usize,
    },

    /// I/O error while reading the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
