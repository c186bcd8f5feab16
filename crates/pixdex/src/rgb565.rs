//! RGB565 packing and the static `.bin` image format.
//!
//! A static image is `[u16 width][u16 height]` followed by one `u16` sample per
//! pixel, everything little-endian.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use image::RgbImage;

use crate::{PixdexError, Result};

/// Size of the width/height header of a static image.
pub const STATIC_HEADER_SIZE: usize = 4;

/// Packs an RGB888 pixel by dropping the low bits of each channel.
#[inline]
pub const fn rgb888_to_rgb565([r, g, b]: [u8; 3]) -> u16 {
    ((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3)
}

/// Expands an RGB565 pixel by shifting each channel back to 8 bits.
#[inline]
pub const fn rgb565_to_rgb888(pixel: u16) -> [u8; 3] {
    let r = ((pixel >> 11) & 0x1f) << 3;
    let g = ((pixel >> 5) & 0x3f) << 2;
    let b = (pixel & 0x1f) << 3;
    [r as u8, g as u8, b as u8]
}

/// Writes `image` in the static RGB565 format.
///
/// Fails with [`PixdexError::InvalidDimensions`] if a side doesn't fit in 16 bits.
pub fn write_rgb565_image<W: Write>(image: &RgbImage, out: &mut W) -> Result<()> {
    let (width, height) = image.dimensions();
    let (Ok(w), Ok(h)) = (u16::try_from(width), u16::try_from(height)) else {
        return Err(PixdexError::InvalidDimensions { width, height });
    };

    out.write_u16::<LittleEndian>(w)?;
    out.write_u16::<LittleEndian>(h)?;
    for px in image.pixels() {
        out.write_u16::<LittleEndian>(rgb888_to_rgb565(px.0))?;
    }
    Ok(())
}

/// Encodes `image` in the static RGB565 format into a new buffer.
pub fn encode_rgb565_image(image: &RgbImage) -> Result<Vec<u8>> {
    let len = STATIC_HEADER_SIZE + image.width() as usize * image.height() as usize * 2;
    let mut out = Vec::with_capacity(len);
    write_rgb565_image(image, &mut out)?;
    Ok(out)
}
