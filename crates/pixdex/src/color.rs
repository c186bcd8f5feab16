use std::collections::HashSet;

use image::{Rgba, RgbaImage};

/// A single RGBA color. Two colors are the same only if all four channels match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn is_transparent(&self) -> bool {
        self.a == 0
    }

    #[inline]
    pub const fn rgb(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<Rgba<u8>> for Color {
    #[inline]
    fn from(Rgba([r, g, b, a]): Rgba<u8>) -> Self {
        Self { r, g, b, a }
    }
}

impl From<&Rgba<u8>> for Color {
    #[inline]
    fn from(px: &Rgba<u8>) -> Self {
        Self::from(*px)
    }
}

impl From<Color> for Rgba<u8> {
    #[inline]
    fn from(c: Color) -> Self {
        Rgba([c.r, c.g, c.b, c.a])
    }
}

/// Lists the unique opaque colors of `image` in row-major first-occurrence order.
///
/// Pixels with alpha 0 are skipped whatever their RGB value is. A fully
/// transparent image yields an empty list.
pub fn enumerate_colors(image: &RgbaImage) -> Vec<Color> {
    let mut seen = HashSet::new();
    let mut colors = Vec::new();
    for color in image.pixels().map(Color::from) {
        if !color.is_transparent() && seen.insert(color) {
            colors.push(color);
        }
    }
    colors
}
