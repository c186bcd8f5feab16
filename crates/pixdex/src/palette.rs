use image::{Rgba, RgbaImage};

use crate::color::{enumerate_colors, Color};
use crate::quantize::quantize_if_needed;
use crate::{PixdexError, Result};

/// Ordered list of unique colors. Position `n` (0-based) is index `n + 1`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    /// Builds a palette from colors that are already unique and ordered.
    pub fn from_colors(colors: Vec<Color>) -> Self {
        Self { colors }
    }

    /// Reads the palette back from a colormap strip (or any image).
    pub fn from_image(image: &RgbaImage) -> Self {
        Self::from_colors(enumerate_colors(image))
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Color stored at a 1-based index. Index 0 and out of range give `None`.
    pub fn get(&self, index: u8) -> Option<Color> {
        usize::from(index)
            .checked_sub(1)
            .and_then(|i| self.colors.get(i))
            .copied()
    }

    /// Turns an index array back into pixels, 0 becomes fully transparent.
    ///
    /// Used for previews of what the device will show. Indices past the end of
    /// the palette are drawn transparent as well.
    pub fn render(&self, indices: &[u8], width: u32, height: u32) -> Option<RgbaImage> {
        // slot 0 stays transparent
        let mut lut = vec![Rgba([0, 0, 0, 0]); 256];
        for (slot, color) in lut.iter_mut().skip(1).zip(&self.colors) {
            *slot = Rgba::from(*color);
        }

        let raw: Vec<u8> = indices
            .iter()
            .flat_map(|&i| lut[usize::from(i)].0)
            .collect();
        RgbaImage::from_raw(width, height, raw)
    }
}

/// Quantizes then enumerates, with one extra pass if the first one is over budget.
fn bounded_palette(colormap: &RgbaImage, max_colors: u16) -> Result<(RgbaImage, Vec<Color>)> {
    let mut image = quantize_if_needed(colormap, max_colors)?;
    let mut colors = enumerate_colors(&image);

    if colors.len() > max_colors as usize {
        image = quantize_if_needed(&image, max_colors)?;
        colors = enumerate_colors(&image);
        if colors.len() > max_colors as usize {
            log::warn!(
                "palette still has {} colors after requantizing, budget is {}",
                colors.len(),
                max_colors
            );
        }
    }

    Ok((image, colors))
}

/// Builds the palette used for indexing from a colormap image.
///
/// Fails with [`PixdexError::EmptyPalette`] if no pixel of the colormap is
/// opaque.
pub fn build_palette(colormap: &RgbaImage, max_colors: u16) -> Result<Palette> {
    let (_, colors) = bounded_palette(colormap, max_colors)?;
    if colors.is_empty() {
        return Err(PixdexError::EmptyPalette);
    }
    Ok(Palette::from_colors(colors))
}

/// Like [`build_palette`] but an empty palette is not an error.
///
/// Also hands back the quantized image the palette was read from, so it can
/// be indexed without any nearest-color fallback.
pub fn extract_palette(image: &RgbaImage, max_colors: u16) -> Result<(RgbaImage, Palette)> {
    let (image, colors) = bounded_palette(image, max_colors)?;
    Ok((image, Palette::from_colors(colors)))
}
