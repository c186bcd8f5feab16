use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use pixdex::extract_colormap;
use pixdex::metadata::extraction_metadata;
use pixdex::source::load_rgba;

pub fn run(input: &Path, outdir: &Path, basename: &str, max_colors: u16) -> Result<()> {
    let img = load_rgba(input).with_context(|| format!("Failed to open '{}'", input.display()))?;
    let extraction = extract_colormap(&img, max_colors)?;
    if extraction.palette.is_empty() {
        log::warn!(
            "'{}' has no opaque pixels, writing a transparent placeholder colormap",
            input.display()
        );
    }

    fs::create_dir_all(outdir)
        .with_context(|| format!("Failed to create '{}'", outdir.display()))?;

    let cmap_path = outdir.join(format!("{basename}.colormap.png"));
    extraction
        .colormap()
        .save(&cmap_path)
        .with_context(|| format!("Failed to write '{}'", cmap_path.display()))?;

    let idx_path = outdir.join(format!("{basename}.index.u8.bin"));
    fs::write(&idx_path, &extraction.indices)
        .with_context(|| format!("Failed to write '{}'", idx_path.display()))?;

    let meta_path = outdir.join(format!("{basename}.meta.txt"));
    let meta = extraction_metadata(
        extraction.width,
        extraction.height,
        extraction.palette.len(),
        &cmap_path,
        &idx_path,
    );
    fs::write(&meta_path, meta.to_string())
        .with_context(|| format!("Failed to write '{}'", meta_path.display()))?;

    log::info!("Color map: {}", cmap_path.display());
    log::info!("Index bin: {}", idx_path.display());
    log::info!("Meta: {}", meta_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_transparent_image_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("ghost.png");
        RgbaImage::from_pixel(3, 2, Rgba([90, 80, 70, 0]))
            .save(&input)
            .unwrap();

        run(&input, dir.path(), "ghost", 255).unwrap();

        let cmap = image::open(dir.path().join("ghost.colormap.png"))
            .unwrap()
            .to_rgba8();
        assert_eq!(cmap.dimensions(), (1, 1));
        assert_eq!(cmap.get_pixel(0, 0).0[3], 0);

        let indices = fs::read(dir.path().join("ghost.index.u8.bin")).unwrap();
        assert_eq!(indices, vec![0; 6]);

        let meta = fs::read_to_string(dir.path().join("ghost.meta.txt")).unwrap();
        assert!(meta.contains("num_colors: 0\n"));
        assert!(meta.contains("colormap_png: ghost.colormap.png\n"));
    }

    #[test]
    fn test_extract_writes_all_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("flag.png");
        RgbaImage::from_fn(3, 1, |x, _| match x {
            0 => Rgba([0, 0, 255, 255]),
            1 => Rgba([255, 255, 255, 255]),
            _ => Rgba([0, 0, 255, 255]),
        })
        .save(&input)
        .unwrap();

        let outdir = dir.path().join("out");
        run(&input, &outdir, "flag", 255).unwrap();

        let cmap = image::open(outdir.join("flag.colormap.png"))
            .unwrap()
            .to_rgba8();
        assert_eq!(cmap.dimensions(), (2, 1));
        assert_eq!(cmap.get_pixel(0, 0), &Rgba([0, 0, 255, 255]));
        assert_eq!(
            fs::read(outdir.join("flag.index.u8.bin")).unwrap(),
            vec![1, 2, 1]
        );
        let meta = fs::read_to_string(outdir.join("flag.meta.txt")).unwrap();
        assert!(meta.starts_with("width: 3\nheight: 1\nnum_colors: 2\n"));
    }
}
