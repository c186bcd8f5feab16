//! Indexes a whole frame sequence into one byte stream.

use std::collections::BTreeSet;
use std::io::Write;

use image::RgbaImage;

use crate::indexer::FrameIndexer;
use crate::{PixdexError, Result, MAX_PALETTE_COLORS};

/// Options for building palettes and indexing sequences.
#[derive(Clone, Debug)]
pub struct IndexOptions {
    /// Maximum number of opaque palette colors (1-255).
    /// Index 0 is reserved for transparent pixels.
    pub max_colors: u16,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            max_colors: MAX_PALETTE_COLORS,
        }
    }
}

/// Summary of an indexed sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SequenceStats {
    pub frames: usize,
    pub width: u32,
    pub height: u32,
    /// Bytes written to the index stream.
    pub total_indices: usize,
    /// Non-zero indices that appear anywhere in the sequence.
    pub used_indices: BTreeSet<u8>,
}

impl SequenceStats {
    /// Pixels (and therefore index bytes) per frame.
    pub fn frame_stride(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Indexes frames one at a time and keeps the running statistics.
///
/// The first frame fixes the sequence size. Any later frame with another size
/// is rejected with [`PixdexError::FrameSizeMismatch`].
pub struct SequenceProcessor<'a> {
    indexer: &'a FrameIndexer,
    stats: SequenceStats,
}

impl<'a> SequenceProcessor<'a> {
    pub fn new(indexer: &'a FrameIndexer) -> Self {
        Self {
            indexer,
            stats: SequenceStats::default(),
        }
    }

    /// Indexes the next frame and returns its index array.
    pub fn push_frame(&mut self, frame: &RgbaImage) -> Result<Vec<u8>> {
        let frame_no = self.stats.frames;
        if frame_no == 0 {
            (self.stats.width, self.stats.height) = frame.dimensions();
        } else if frame.dimensions() != (self.stats.width, self.stats.height) {
            return Err(PixdexError::FrameSizeMismatch {
                frame: frame_no,
                expected: (self.stats.width, self.stats.height),
                actual: frame.dimensions(),
            });
        }

        let (indices, used) = self.indexer.index_frame(frame);
        self.stats.used_indices.extend(used);
        self.stats.total_indices += indices.len();
        self.stats.frames += 1;
        Ok(indices)
    }

    pub fn finish(self) -> SequenceStats {
        self.stats
    }
}

/// Indexes `frames` in order and writes their index arrays to `out`.
pub fn index_sequence<I, W>(
    frames: I,
    indexer: &FrameIndexer,
    out: &mut W,
) -> Result<SequenceStats>
where
    I: IntoIterator<Item = Result<RgbaImage>>,
    W: Write,
{
    index_sequence_with(frames, indexer, out, |_, _, _| {})
}

/// Like [`index_sequence`], calling `inspect` with every frame and its indices
/// after they were written.
pub fn index_sequence_with<I, W, F>(
    frames: I,
    indexer: &FrameIndexer,
    out: &mut W,
    mut inspect: F,
) -> Result<SequenceStats>
where
    I: IntoIterator<Item = Result<RgbaImage>>,
    W: Write,
    F: FnMut(usize, &RgbaImage, &[u8]),
{
    let mut processor = SequenceProcessor::new(indexer);
    for (frame_no, frame) in frames.into_iter().enumerate() {
        let frame = frame?;
        let indices = processor.push_frame(&frame)?;
        out.write_all(&indices)?;
        log::debug!(
            "frame {}: {}x{}, {} bytes",
            frame_no,
            frame.width(),
            frame.height(),
            indices.len()
        );
        inspect(frame_no, &frame, &indices);
    }
    out.flush()?;
    Ok(processor.finish())
}
