#![no_main]

use arbitrary::Arbitrary;
use image::RgbaImage;
use libfuzzer_sys::fuzz_target;
use pixdex::{Color, FrameIndexer, Palette};

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    palette: Vec<[u8; 3]>,
    width: u8,
    height: u8,
    pixels: Vec<u8>,
}

fuzz_target!(|input: FuzzInput| {
    let width = u32::from(input.width).clamp(1, 64);
    let height = u32::from(input.height).clamp(1, 64);

    let expected_size = (width * height * 4) as usize;
    if input.pixels.len() < expected_size {
        return;
    }
    let Some(frame) = RgbaImage::from_raw(width, height, input.pixels[..expected_size].to_vec())
    else {
        return;
    };

    let mut colors: Vec<Color> = Vec::new();
    for [r, g, b] in input.palette.into_iter().take(255) {
        let color = Color::new(r, g, b, 255);
        if !colors.contains(&color) {
            colors.push(color);
        }
    }
    let palette = Palette::from_colors(colors);
    let Ok(indexer) = FrameIndexer::new(&palette) else {
        return;
    };

    let (indices, used) = indexer.index_frame(&frame);
    assert_eq!(indices.len(), expected_size / 4);
    for (px, &index) in frame.pixels().zip(&indices) {
        // only transparent pixels map to 0
        assert_eq!(px.0[3] == 0, index == 0);
        assert!(usize::from(index) <= palette.len());
    }
    assert!(!used.contains(&0));
});
