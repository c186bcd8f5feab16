use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use image::RgbaImage;
use pixdex::metadata::sequence_metadata;
use pixdex::sequence::index_sequence_with;
use pixdex::source::load_rgba;
use pixdex::{build_palette, FrameIndexer, FrameSource, IndexOptions, Palette, PixdexError};

pub struct IndexArgs {
    pub input: PathBuf,
    pub colormap: PathBuf,
    pub outdir: PathBuf,
    pub basename: String,
    pub options: IndexOptions,
    pub preview: bool,
}

pub fn run(args: IndexArgs) -> Result<()> {
    // Opening lists folders, so empty input fails before any file is created.
    let source = FrameSource::open(&args.input)
        .with_context(|| format!("Failed to open '{}'", args.input.display()))?;
    let kind = source.kind();
    log::debug!("reading {} '{}'", kind, source.path().display());

    // An animation can still turn out to be empty, check before creating files.
    let mut frames = source.peekable();
    if frames.peek().is_none() {
        return Err(PixdexError::EmptyInput {
            path: args.input.clone(),
        }
        .into());
    }

    let colormap = load_rgba(&args.colormap)
        .with_context(|| format!("Failed to open colormap '{}'", args.colormap.display()))?;
    let palette = build_palette(&colormap, args.options.max_colors)?;
    let indexer = FrameIndexer::new(&palette)?;
    log::info!(
        "Indexing {} '{}' against {} colormap colors",
        kind,
        args.input.display(),
        indexer.len()
    );

    fs::create_dir_all(&args.outdir)
        .with_context(|| format!("Failed to create '{}'", args.outdir.display()))?;
    let bin_path = args.outdir.join(format!("{}.bin", args.basename));
    let mut out = BufWriter::new(
        File::create(&bin_path)
            .with_context(|| format!("Failed to create '{}'", bin_path.display()))?,
    );

    let mut first_frame: Option<(RgbaImage, Vec<u8>)> = None;
    let stats = index_sequence_with(frames, &indexer, &mut out, |frame_no, frame, indices| {
        if args.preview && frame_no == 0 {
            first_frame = Some((frame.clone(), indices.to_vec()));
        }
    })
    .with_context(|| {
        format!(
            "Indexing failed, '{}' is incomplete and must not be used",
            bin_path.display()
        )
    })?;

    if let Some((frame, indices)) = first_frame {
        save_preview(&args, &palette, &frame, &indices)?;
    }

    let meta_path = args.outdir.join(format!("{}.meta.txt", args.basename));
    let meta = sequence_metadata(kind, &args.input, &stats, indexer.len(), &bin_path);
    fs::write(&meta_path, meta.to_string())
        .with_context(|| format!("Failed to write '{}'", meta_path.display()))?;

    log::info!(
        "Frames: {}  Size: {}x{}  Indices used: {}",
        stats.frames,
        stats.width,
        stats.height,
        stats.used_indices.len()
    );
    log::info!("Index bin: {}", bin_path.display());
    log::info!("Meta: {}", meta_path.display());
    Ok(())
}

fn save_preview(
    args: &IndexArgs,
    palette: &Palette,
    frame: &RgbaImage,
    indices: &[u8],
) -> Result<()> {
    let src_path = args.outdir.join(format!("{}.preview_src.png", args.basename));
    let mapped_path = args
        .outdir
        .join(format!("{}.preview_mapped.png", args.basename));

    let mapped = palette
        .render(indices, frame.width(), frame.height())
        .context("Preview indices don't match the frame size")?;

    frame.save(&src_path)?;
    mapped.save(&mapped_path)?;
    log::info!("Preview saved: {}", src_path.display());
    log::info!("Preview saved: {}", mapped_path.display());
    Ok(())
}
