//! Frame sources: one still image, a folder of PNGs or an animated GIF.
//!
//! Frames are decoded lazily, one per call to [`Iterator::next`], so only the
//! current frame (and the animation canvas) live in memory.

use std::fmt;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::codecs::gif::GifDecoder;
use image::{imageops, AnimationDecoder, ImageDecoder, ImageFormat, RgbaImage};

use crate::{PixdexError, Result};

/// What kind of input a path designates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// A single PNG, JPEG or WebP image
    SingleImage,
    /// A folder of PNG images, taken in file name order
    ImageFolder,
    /// An animated GIF
    Animation,
}

impl SourceKind {
    /// Classifies `path` by whether it is a folder, then by file extension.
    pub fn detect(path: &Path) -> Result<Self> {
        if path.is_dir() {
            return Ok(Self::ImageFolder);
        }
        // only the codecs this crate is built with
        match ImageFormat::from_path(path) {
            Ok(ImageFormat::Gif) => Ok(Self::Animation),
            Ok(ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP) => Ok(Self::SingleImage),
            _ => Err(PixdexError::UnsupportedInput {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Name used in metadata files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleImage => "single_png",
            Self::ImageFolder => "png_folder",
            Self::Animation => "gif",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accumulated animation state.
///
/// Every frame is alpha-blended over the previous result, starting from a
/// fully transparent canvas the size of the animation. This approximates GIF
/// accumulation without emulating each disposal method.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    /// Blends `layer` over the canvas at (`left`, `top`) and returns the new state.
    pub fn compose(mut self, layer: &RgbaImage, left: u32, top: u32) -> Self {
        imageops::overlay(&mut self.image, layer, i64::from(left), i64::from(top));
        self
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

/// Opens a GIF and returns its logical screen size with its raw frames.
pub fn open_animation(path: &Path) -> Result<(u32, u32, image::Frames<'static>)> {
    let decoder = GifDecoder::new(BufReader::new(File::open(path)?))?;
    let (width, height) = decoder.dimensions();
    Ok((width, height, decoder.into_frames()))
}

/// Lists the PNG files directly inside `dir`, sorted by name.
pub fn list_png_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_png = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if is_png && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Loads any still image as RGBA.
pub fn load_rgba(path: &Path) -> Result<RgbaImage> {
    Ok(image::open(path)?.to_rgba8())
}

enum Frames {
    Single(Option<PathBuf>),
    Folder(std::vec::IntoIter<PathBuf>),
    Animation {
        frames: image::Frames<'static>,
        canvas: Canvas,
    },
}

/// Ordered RGBA frames of one input.
pub struct FrameSource {
    kind: SourceKind,
    path: PathBuf,
    frames: Frames,
}

impl FrameSource {
    /// Opens `path` without decoding any pixels yet.
    ///
    /// Folders are listed right away, so an empty folder fails here with
    /// [`PixdexError::EmptyInput`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let kind = SourceKind::detect(&path)?;

        let frames = match kind {
            SourceKind::SingleImage => Frames::Single(Some(path.clone())),
            SourceKind::ImageFolder => {
                let files = list_png_files(&path)?;
                if files.is_empty() {
                    return Err(PixdexError::EmptyInput { path });
                }
                log::debug!("found {} PNG files in '{}'", files.len(), path.display());
                Frames::Folder(files.into_iter())
            }
            SourceKind::Animation => {
                let (width, height, frames) = open_animation(&path)?;
                Frames::Animation {
                    frames,
                    canvas: Canvas::new(width, height),
                }
            }
        };

        Ok(Self { kind, path, frames })
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for FrameSource {
    type Item = Result<RgbaImage>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.frames {
            Frames::Single(path) => path.take().map(|p| load_rgba(&p)),
            Frames::Folder(files) => files.next().map(|p| load_rgba(&p)),
            Frames::Animation { frames, canvas } => {
                let frame = match frames.next()? {
                    Ok(frame) => frame,
                    Err(e) => return Some(Err(e.into())),
                };
                let composed =
                    std::mem::take(canvas).compose(frame.buffer(), frame.left(), frame.top());
                let out = composed.image().clone();
                *canvas = composed;
                Some(Ok(out))
            }
        }
    }
}
