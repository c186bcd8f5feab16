//! Bounded palette reduction using quantette.
//!
//! Only the RGB channels of opaque pixels are reduced. Alpha is copied back
//! from the source untouched, so transparency never changes.

use std::collections::HashSet;

use image::RgbaImage;
use quantette::{deps::palette::Srgb, ImageRef, PaletteSize, Pipeline, QuantizeMethod};

use crate::{validate_max_colors, PixdexError, Result};

/// Number of distinct RGB triples among pixels with a non-zero alpha.
pub fn count_opaque_rgb(image: &RgbaImage) -> usize {
    image
        .pixels()
        .filter(|px| px.0[3] != 0)
        .map(|px| [px.0[0], px.0[1], px.0[2]])
        .collect::<HashSet<_>>()
        .len()
}

/// Reduces `image` to at most `max_colors` opaque RGB values.
///
/// Images already within budget are returned unchanged. Otherwise the opaque
/// pixels are run through quantette's Wu quantizer and the original alpha
/// channel is reattached. The result is deterministic for identical input.
///
/// Note that the budget applies to RGB only: the same reduced RGB value paired
/// with different alpha values still counts as several RGBA colors.
pub fn quantize_if_needed(image: &RgbaImage, max_colors: u16) -> Result<RgbaImage> {
    let max_colors = validate_max_colors(max_colors)?;

    let unique = count_opaque_rgb(image);
    if unique <= max_colors as usize {
        return Ok(image.clone());
    }

    log::debug!(
        "quantizing {}x{} image from {} to at most {} colors",
        image.width(),
        image.height(),
        unique,
        max_colors
    );

    // Transparent pixels don't take part, their RGB never reaches a palette.
    let opaque: Vec<Srgb<u8>> = image
        .pixels()
        .filter(|px| px.0[3] != 0)
        .map(|px| Srgb::new(px.0[0], px.0[1], px.0[2]))
        .collect();

    let strip_len = u32::try_from(opaque.len()).map_err(|_| PixdexError::InvalidDimensions {
        width: image.width(),
        height: image.height(),
    })?;
    let strip = ImageRef::new(strip_len, 1, &opaque)
        .map_err(|e| PixdexError::Quantization(e.to_string()))?;

    // validate_max_colors keeps the budget inside u8 range
    let palette_size = PaletteSize::try_from(max_colors as u8).unwrap_or(PaletteSize::MAX);

    let indexed = Pipeline::new()
        .palette_size(palette_size)
        .quantize_method(QuantizeMethod::Wu)
        .input_image(strip)
        .output_srgb8_indexed_image();

    let palette = indexed.palette();
    let mut reduced = indexed
        .indices()
        .iter()
        .map(|&i| palette[usize::from(i)]);

    let mut out = image.clone();
    for px in out.pixels_mut().filter(|px| px.0[3] != 0) {
        // one index per opaque pixel, in the same order they were collected
        if let Some(c) = reduced.next() {
            px.0[0] = c.red;
            px.0[1] = c.green;
            px.0[2] = c.blue;
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            let alpha = if (x + y) % 5 == 0 { 0 } else { 40 + ((x * 3 + y) % 200) as u8 };
            Rgba([(x * 8) as u8, (y * 8) as u8, ((x + y) * 4) as u8, alpha])
        })
    }

    #[test]
    fn test_within_budget_is_identity() {
        let img = RgbaImage::from_fn(4, 4, |x, _| Rgba([x as u8, 0, 0, 255]));
        let out = quantize_if_needed(&img, 4).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn test_transparent_rgb_does_not_count() {
        // eight RGB values, but only two of them are visible
        let img = RgbaImage::from_fn(8, 1, |x, _| {
            Rgba([x as u8 * 10, 0, 0, if x < 2 { 255 } else { 0 }])
        });
        assert_eq!(count_opaque_rgb(&img), 2);
        assert_eq!(quantize_if_needed(&img, 2).unwrap(), img);
    }

    #[test]
    fn test_cardinality_bound_and_alpha_preserved() {
        let img = gradient(32, 32);
        assert!(count_opaque_rgb(&img) > 16);

        let out = quantize_if_needed(&img, 16).unwrap();
        assert!(count_opaque_rgb(&out) <= 16);
        assert_eq!(out.dimensions(), img.dimensions());
        for (a, b) in img.pixels().zip(out.pixels()) {
            assert_eq!(a.0[3], b.0[3]);
        }
    }

    #[test]
    fn test_quantization_is_deterministic() {
        let img = gradient(24, 24);
        let first = quantize_if_needed(&img, 8).unwrap();
        let second = quantize_if_needed(&img, 8).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_budget() {
        let img = gradient(2, 2);
        assert!(quantize_if_needed(&img, 0).is_err());
        assert!(quantize_if_needed(&img, 256).is_err());
    }
}
