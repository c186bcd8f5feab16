//! Maps RGBA frames to palette indices.
//!
//! Lookup happens in two tiers. Exact RGBA matches come from a hash map; any
//! other opaque color is resolved to the palette entry with the smallest
//! squared RGB distance. Unmatched colors are deduplicated per frame so the
//! fallback scan runs once per distinct RGB value, not once per pixel.

use std::collections::{BTreeSet, HashMap};

use image::RgbaImage;

use crate::color::Color;
use crate::palette::Palette;
use crate::{PixdexError, Result, TRANSPARENT_INDEX};

/// Index lookup tables for one palette. Cheap to reuse across frames.
#[derive(Clone, Debug)]
pub struct FrameIndexer {
    exact: HashMap<Color, u8>,
    /// Palette RGB widened to i16 so differences can't overflow.
    rgb: Vec<[i16; 3]>,
}

impl FrameIndexer {
    /// Builds the lookup tables.
    ///
    /// An empty palette can't resolve opaque pixels and is rejected with
    /// [`PixdexError::EmptyPalette`]. Entries past index 255 are unreachable
    /// and ignored.
    pub fn new(palette: &Palette) -> Result<Self> {
        if palette.is_empty() {
            return Err(PixdexError::EmptyPalette);
        }
        let addressable = &palette.colors()[..palette.len().min(u8::MAX as usize)];
        if addressable.len() < palette.len() {
            log::warn!(
                "palette has {} colors, only the first {} can be indexed",
                palette.len(),
                addressable.len()
            );
        }

        let mut exact = HashMap::with_capacity(addressable.len());
        for (pos, color) in addressable.iter().enumerate() {
            // palette entries are unique, keep the first one regardless
            exact.entry(*color).or_insert(pos as u8 + 1);
        }
        let rgb = addressable
            .iter()
            .map(|c| [c.r as i16, c.g as i16, c.b as i16])
            .collect();

        Ok(Self { exact, rgb })
    }

    /// Number of palette entries the indexer can emit, at most 255.
    pub fn len(&self) -> usize {
        self.rgb.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rgb.is_empty()
    }

    /// 1-based index of the palette entry closest to `rgb`, first entry wins ties.
    pub fn nearest(&self, rgb: [u8; 3]) -> u8 {
        let px = rgb.map(i16::from);
        let mut best = 0usize;
        let mut best_dist = i32::MAX;
        for (pos, entry) in self.rgb.iter().enumerate() {
            let dist: i32 = (0..3)
                .map(|ch| {
                    let d = i32::from(px[ch] - entry[ch]);
                    d * d
                })
                .sum();
            if dist < best_dist {
                best = pos;
                best_dist = dist;
            }
        }
        best as u8 + 1
    }

    /// Index for a single pixel.
    pub fn index_of(&self, color: Color) -> u8 {
        if color.is_transparent() {
            return TRANSPARENT_INDEX;
        }
        match self.exact.get(&color) {
            Some(&index) => index,
            None => self.nearest(color.rgb()),
        }
    }

    /// Maps every pixel of `frame` in row-major order.
    ///
    /// Returns the index array (one byte per pixel) and the set of non-zero
    /// indices that appear in it.
    pub fn index_frame(&self, frame: &RgbaImage) -> (Vec<u8>, BTreeSet<u8>) {
        let mut out = vec![TRANSPARENT_INDEX; frame.width() as usize * frame.height() as usize];
        let mut unmatched: HashMap<[u8; 3], Vec<usize>> = HashMap::new();

        for (pos, color) in frame.pixels().map(Color::from).enumerate() {
            if color.is_transparent() {
                continue;
            }
            match self.exact.get(&color) {
                Some(&index) => out[pos] = index,
                None => unmatched.entry(color.rgb()).or_default().push(pos),
            }
        }

        if !unmatched.is_empty() {
            log::trace!("{} colors need a nearest-color lookup", unmatched.len());
        }
        for (rgb, positions) in unmatched {
            let index = self.nearest(rgb);
            for pos in positions {
                out[pos] = index;
            }
        }

        let used = out
            .iter()
            .copied()
            .filter(|&i| i != TRANSPARENT_INDEX)
            .collect();
        (out, used)
    }
}
