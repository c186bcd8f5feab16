use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use image::{DynamicImage, RgbImage};
use pixdex::rgb565::encode_rgb565_image;
use pixdex::source::{list_png_files, open_animation};

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string())
}

fn write_bin(img: &RgbImage, out_file: &Path) -> Result<()> {
    let data = encode_rgb565_image(img)?;
    fs::write(out_file, &data)
        .with_context(|| format!("Failed to write '{}'", out_file.display()))?;
    Ok(())
}

/// Converts one still image. `out` is either a folder or the target file.
fn convert_still(png: &Path, out: &Path) -> Result<()> {
    let img = image::open(png)
        .with_context(|| format!("Failed to open '{}'", png.display()))?
        .to_rgb8();

    let out_file = if out.is_dir() {
        out.join(format!("{}.bin", file_stem(png)))
    } else {
        if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        out.to_path_buf()
    };

    write_bin(&img, &out_file)?;
    log::info!("[OK] {} -> {}", png.display(), out_file.display());
    Ok(())
}

fn convert_folder(folder: &Path, out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir)?;
    let pngs = list_png_files(folder)?;
    if pngs.is_empty() {
        log::warn!("No PNG found in folder: {}", folder.display());
        return Ok(());
    }
    for png in pngs {
        convert_still(&png, out_dir)?;
    }
    Ok(())
}

fn convert_gif(gif: &Path, out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir)?;
    let (_, _, frames) =
        open_animation(gif).with_context(|| format!("Failed to open '{}'", gif.display()))?;

    let stem = file_stem(gif);
    let mut count = 0usize;
    for (frame_no, frame) in frames.enumerate() {
        let rgb = DynamicImage::ImageRgba8(frame?.into_buffer()).to_rgb8();
        let out_file = out_dir.join(format!("{stem}_{frame_no:03}.bin"));
        write_bin(&rgb, &out_file)?;
        log::info!(
            "[OK] {} [frame {}] -> {}",
            gif.display(),
            frame_no,
            out_file.display()
        );
        count += 1;
    }

    if count == 0 {
        log::warn!("{} contains no frames", gif.display());
    }
    Ok(())
}

pub fn run(input: &Path, output: &Path) -> Result<()> {
    if !input.exists() {
        bail!("Input path does not exist: {}", input.display());
    }

    if input.is_dir() {
        if output.exists() && !output.is_dir() {
            bail!(
                "Output must be a directory when input is a folder: {}",
                output.display()
            );
        }
        return convert_folder(input, output);
    }

    if !input.is_file() {
        bail!("Unsupported input path type: {}", input.display());
    }

    if has_extension(input, "png") {
        if !output.is_dir() && !has_extension(output, "bin") {
            // neither an existing folder nor a .bin file: treat as folder
            fs::create_dir_all(output)?;
        }
        convert_still(input, output)
    } else if has_extension(input, "gif") {
        if output.exists() && !output.is_dir() {
            bail!(
                "Output must be a directory when input is a GIF: {}",
                output.display()
            );
        }
        convert_gif(input, output)
    } else {
        bail!(
            "Unsupported input type: {}. Only .png, .gif, or folder.",
            input.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_single_png_to_bin_file() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("red.png");
        RgbImage::from_pixel(2, 1, Rgb([255, 0, 0])).save(&png).unwrap();

        let bin = dir.path().join("nested/red.bin");
        run(&png, &bin).unwrap();
        assert_eq!(fs::read(&bin).unwrap(), vec![2, 0, 1, 0, 0x00, 0xf8, 0x00, 0xf8]);
    }

    #[test]
    fn test_folder_to_folder() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        fs::create_dir(&input).unwrap();
        for name in ["a.png", "b.PNG"] {
            RgbImage::new(1, 1)
                .save_with_format(input.join(name), image::ImageFormat::Png)
                .unwrap();
        }
        fs::write(input.join("notes.txt"), "skip me").unwrap();

        let output = dir.path().join("out");
        run(&input, &output).unwrap();
        assert!(output.join("a.bin").is_file());
        assert!(output.join("b.bin").is_file());
        assert!(!output.join("notes.bin").exists());
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("notes.txt");
        fs::write(&txt, "x").unwrap();
        assert!(run(&txt, dir.path()).is_err());
    }
}
