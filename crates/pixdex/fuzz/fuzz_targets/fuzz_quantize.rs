#![no_main]

use arbitrary::Arbitrary;
use image::RgbaImage;
use libfuzzer_sys::fuzz_target;
use pixdex::quantize::count_opaque_rgb;
use pixdex::quantize_if_needed;

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    width: u8,
    height: u8,
    pixels: Vec<u8>,
    max_colors: u8,
}

fuzz_target!(|input: FuzzInput| {
    let width = u32::from(input.width).clamp(1, 48);
    let height = u32::from(input.height).clamp(1, 48);

    let expected_size = (width * height * 4) as usize;
    if input.pixels.len() < expected_size {
        return;
    }
    let Some(img) = RgbaImage::from_raw(width, height, input.pixels[..expected_size].to_vec())
    else {
        return;
    };

    let max_colors = u16::from(input.max_colors);
    let Ok(quantized) = quantize_if_needed(&img, max_colors) else {
        // only an out of range budget may be refused
        assert_eq!(max_colors, 0);
        return;
    };

    assert_eq!(quantized.dimensions(), img.dimensions());
    // alpha is never touched
    for (a, b) in img.pixels().zip(quantized.pixels()) {
        assert_eq!(a.0[3], b.0[3]);
    }
    assert!(count_opaque_rgb(&quantized) <= count_opaque_rgb(&img));
});
