//! Colormap strips: a palette stored as a 1×N image, entry `n` at `x = n - 1`.

use std::path::Path;

use image::{Rgba, RgbaImage};

use crate::indexer::FrameIndexer;
use crate::palette::{extract_palette, Palette};
use crate::{Result, TRANSPARENT_INDEX};

/// Renders `palette` as a horizontal strip.
///
/// An empty palette gives a single transparent pixel, so there is always an
/// image to write.
pub fn colormap_image(palette: &Palette) -> RgbaImage {
    if palette.is_empty() {
        return RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0]));
    }
    let colors = palette.colors();
    RgbaImage::from_fn(colors.len() as u32, 1, |x, _| colors[x as usize].into())
}

/// Saves the colormap strip of `palette`, format picked from the extension.
pub fn write_colormap(palette: &Palette, path: &Path) -> Result<()> {
    colormap_image(palette).save(path)?;
    Ok(())
}

/// Reads a colormap image back into a palette.
pub fn read_colormap(path: &Path) -> Result<Palette> {
    Ok(Palette::from_image(&image::open(path)?.to_rgba8()))
}

/// Palette and indices taken from a single image.
#[derive(Clone, Debug)]
pub struct ColormapExtraction {
    pub width: u32,
    pub height: u32,
    pub palette: Palette,
    /// One index per pixel of the (quantized) image, row-major.
    pub indices: Vec<u8>,
}

impl ColormapExtraction {
    pub fn colormap(&self) -> RgbaImage {
        colormap_image(&self.palette)
    }
}

/// Extracts a bounded palette from `image` and indexes the image against it.
///
/// Unlike [`crate::build_palette`], a fully transparent image is accepted: the
/// palette is empty and every index is 0.
pub fn extract_colormap(image: &RgbaImage, max_colors: u16) -> Result<ColormapExtraction> {
    let (quantized, palette) = extract_palette(image, max_colors)?;
    let (width, height) = quantized.dimensions();

    let indices = if palette.is_empty() {
        vec![TRANSPARENT_INDEX; width as usize * height as usize]
    } else {
        FrameIndexer::new(&palette)?.index_frame(&quantized).0
    };

    log::debug!(
        "extracted {} colors from {}x{} image",
        palette.len(),
        width,
        height
    );

    Ok(ColormapExtraction {
        width,
        height,
        palette,
        indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strip_layout() {
        let palette = Palette::from_colors(vec![
            Color::new(1, 1, 1, 255),
            Color::new(2, 2, 2, 200),
            Color::new(3, 3, 3, 100),
        ]);
        let strip = colormap_image(&palette);
        assert_eq!(strip.dimensions(), (3, 1));
        assert_eq!(strip.get_pixel(1, 0), &Rgba([2, 2, 2, 200]));
        assert_eq!(Palette::from_image(&strip), palette);
    }

    #[test]
    fn test_empty_palette_placeholder() {
        let strip = colormap_image(&Palette::default());
        assert_eq!(strip.dimensions(), (1, 1));
        assert_eq!(strip.get_pixel(0, 0), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_extract_indexes_every_pixel() {
        let img = RgbaImage::from_fn(3, 2, |x, y| match (x + y) % 3 {
            0 => Rgba([10, 0, 0, 255]),
            1 => Rgba([0, 10, 0, 255]),
            _ => Rgba([0, 0, 0, 0]),
        });
        let extraction = extract_colormap(&img, 255).unwrap();
        assert_eq!(extraction.palette.len(), 2);
        assert_eq!(extraction.indices, vec![1, 2, 0, 2, 0, 1]);
    }

    #[test]
    fn test_extract_transparent_image() {
        let img = RgbaImage::new(4, 2);
        let extraction = extract_colormap(&img, 255).unwrap();
        assert!(extraction.palette.is_empty());
        assert_eq!(extraction.indices, vec![0; 8]);
        assert_eq!(extraction.colormap().dimensions(), (1, 1));
    }
}
