//! # frameio
//!
//! Reader and writer for scientific detector images stored in TIFF-family
//! containers, with instrument metadata exposed as translated tag
//! dictionaries.
//!
//! Decoding goes through an ordered two-backend chain: a full-featured
//! multi-frame TIFF codec first, then a generic single-frame raster codec
//! when the primary codec cannot parse the file. Both paths normalize
//! their divergent metadata shapes into one header model, so callers see
//! the same dictionary keys and value shapes regardless of which backend
//! decoded the file. Writing always goes through the primary codec.
//!
//! ## Architecture
//!
//! - [`probe`] - fast, advisory 64-byte header probe
//! - [`backend`] - decoder strategy trait and its two adapters
//! - [`container`] - decode orchestrator and multi-frame container
//! - [`frame`] - tag dictionary and pixel buffer model
//! - [`tags`] - injectable tag-id to name translation table
//! - [`writer`] - primary-codec-only frame writer
//! - [`spreadsheet`] - whitespace-delimited ASCII exposure reader
//!
//! ## Example
//!
//! ```rust,no_run
//! use frameio::ImageContainer;
//!
//! let mut container = ImageContainer::open("exposure.tif")?;
//! println!(
//!     "{}x{} via {:?}, {} frame(s)",
//!     container.dim1(),
//!     container.dim2(),
//!     container.backend_kind(),
//!     container.frame_count(),
//! );
//! let _frame = container.frame(0)?;
//! container.close();
//! # Ok::<(), frameio::DecodeError>(())
//! ```

pub mod backend;
pub mod container;
pub mod error;
pub mod frame;
pub mod probe;
pub mod spreadsheet;
pub mod tags;
pub mod writer;

// Re-export commonly used types
pub use backend::{BackendKind, DecodeBackend, PrimaryDecoder};
pub use container::ImageContainer;
pub use error::{BackendError, DecodeError, ProbeError, SpreadsheetError, WriteError};
pub use frame::{Frame, PixelBuffer, PixelData, TagDictionary, TagValue};
pub use probe::{probe_header, ProbeHint, PROBE_PREFIX_LEN};
pub use spreadsheet::{parse_spreadsheet, read_spreadsheet};
pub use tags::{lowercase_first, TagTable};
pub use writer::{write_frame, write_frame_to, SOFTWARE_TAG};

#[cfg(feature = "fallback")]
pub use backend::FallbackDecoder;
