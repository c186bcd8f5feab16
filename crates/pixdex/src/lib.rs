//! # pixdex
//!
//! Turns RGBA images into indexed frame streams for small display hardware.
//!
//! ## Features
//!
//! - **Palette**: order-stable palette extraction with bounded quantization (quantette Wu)
//! - **Indexer**: exact lookup with nearest-color fallback, 0 reserved for transparency
//! - **Sequences**: single images, PNG folders and animated GIFs as one frame stream
//! - **RGB565**: static image export and the device frame protocol
//!
//! ## Quick Start
//!
//! ```ignore
//! use pixdex::{build_palette, FrameIndexer};
//!
//! let colormap = image::open("colormap.png")?.to_rgba8();
//! let palette = build_palette(&colormap, 255)?;
//! let indexer = FrameIndexer::new(&palette)?;
//!
//! let frame = image::open("sprite.png")?.to_rgba8();
//! let (indices, used) = indexer.index_frame(&frame);
//! assert_eq!(indices.len(), (frame.width() * frame.height()) as usize);
//! ```

use std::path::PathBuf;

use thiserror::Error;

pub mod color;
pub mod colormap;
pub mod device;
pub mod indexer;
pub mod metadata;
pub mod palette;
pub mod quantize;
pub mod rgb565;
pub mod sequence;
pub mod source;

pub use color::{enumerate_colors, Color};
pub use colormap::{
    colormap_image, extract_colormap, read_colormap, write_colormap, ColormapExtraction,
};
pub use device::{DeviceFrame, DeviceFrameHeader, DeviceFrameReader, FRAME_MAGIC};
pub use indexer::FrameIndexer;
pub use palette::{build_palette, extract_palette, Palette};
pub use quantize::quantize_if_needed;
pub use sequence::{
    index_sequence, index_sequence_with, IndexOptions, SequenceProcessor, SequenceStats,
};
pub use source::{Canvas, FrameSource, SourceKind};

/// Index written for fully transparent pixels.
pub const TRANSPARENT_INDEX: u8 = 0;

/// Largest palette that still fits into one index byte next to [`TRANSPARENT_INDEX`].
pub const MAX_PALETTE_COLORS: u16 = u8::MAX as u16;

/// Fixed description of the index byte values, shared by all metadata files.
pub const INDEX_MEANING: &str =
    "0=transparent; 1..n = position in colormap image from left to right";

/// Errors that can occur while building palettes or indexing frames.
#[derive(Debug, Error)]
pub enum PixdexError {
    /// The colormap has no pixel with a non-zero alpha
    #[error("colormap contains no opaque colors")]
    EmptyPalette,

    /// A folder without PNG images, or an animation without frames
    #[error("no frames found in '{}'", .path.display())]
    EmptyInput { path: PathBuf },

    /// A frame differs in size from the first frame of its sequence
    #[error(
        "frame {frame} is {}x{} but the sequence is {}x{}",
        .actual.0, .actual.1, .expected.0, .expected.1
    )]
    FrameSizeMismatch {
        frame: usize,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// Input is neither a still image, an animation nor a folder
    #[error("unsupported input '{}'", .path.display())]
    UnsupportedInput { path: PathBuf },

    /// Palette budget outside of 1..=255
    #[error("max colors must be between 1 and 255, got {0}")]
    InvalidMaxColors(u16),

    /// Image dimensions can't be represented in the output format
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Color quantization failed
    #[error("quantization error: {0}")]
    Quantization(String),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for pixdex operations.
pub type Result<T> = core::result::Result<T, PixdexError>;

/// Checks a palette budget against what an index byte can address.
pub fn validate_max_colors(max_colors: u16) -> Result<u16> {
    if max_colors == 0 || max_colors > MAX_PALETTE_COLORS {
        return Err(PixdexError::InvalidMaxColors(max_colors));
    }
    Ok(max_colors)
}
