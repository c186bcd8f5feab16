//! pixdex - Turn images into indexed frame streams
//!
//! A command-line tool for building colormaps, indexing frame sequences,
//! exporting RGB565 images and watching frames coming back from a device.

mod convert;
mod extract;
mod index;
mod monitor;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pixdex")]
#[command(version)]
#[command(about = "Indexed frame streams for small displays", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a PNG, a folder of PNGs or a GIF against a colormap image
    Index {
        /// Input: single image, GIF, or folder containing PNGs
        input: PathBuf,

        /// Colormap image (1xN strip) defining indices 1..N
        colormap: PathBuf,

        /// Output directory (default: next to the input)
        #[arg(short, long)]
        outdir: Option<PathBuf>,

        /// Base name of the output files (default: input name)
        #[arg(long)]
        basename: Option<String>,

        /// Maximum number of opaque colormap colors (1-255)
        #[arg(long, default_value = "255")]
        max_colors: u16,

        /// Save the first frame next to its nearest-color mapping
        #[arg(long)]
        preview: bool,
    },

    /// Extract a colormap strip and index file from a single image
    Extract {
        /// Input image (transparency is kept)
        input: PathBuf,

        /// Output directory (default: next to the input)
        #[arg(short, long)]
        outdir: Option<PathBuf>,

        /// Base name of the output files (default: input file stem)
        #[arg(long)]
        basename: Option<String>,

        /// Maximum number of opaque colors (1-255)
        #[arg(long, default_value = "255")]
        max_colors: u16,
    },

    /// Convert a PNG, a folder of PNGs or a GIF to RGB565 .bin files
    Convert {
        /// Input path (PNG/GIF file or folder)
        #[arg(short, long)]
        input: PathBuf,

        /// Output path (file for a single PNG, otherwise a folder)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Read device frames from a serial device or capture file and report timings
    Monitor {
        /// Device node or capture file to read from
        port: PathBuf,

        /// Write every decoded frame as PNG into this folder
        #[arg(long)]
        snapshots: Option<PathBuf>,

        /// Scale factor for snapshots (nearest neighbour)
        #[arg(short, long, default_value = "5")]
        scale: u32,

        /// Stop after this many frames
        #[arg(long)]
        frames: Option<u64>,
    },
}

/// Output folder and base name shared by `index` and `extract`.
fn output_location(
    input: &Path,
    outdir: Option<PathBuf>,
    basename: Option<String>,
) -> (PathBuf, String) {
    let outdir = outdir.unwrap_or_else(|| match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    });
    let basename = basename.unwrap_or_else(|| {
        let name = if input.is_file() {
            input.file_stem()
        } else {
            input.file_name()
        };
        name.map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string())
    });
    (outdir, basename)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Index {
            input,
            colormap,
            outdir,
            basename,
            max_colors,
            preview,
        } => {
            let (outdir, basename) = output_location(&input, outdir, basename);
            index::run(index::IndexArgs {
                input,
                colormap,
                outdir,
                basename,
                options: pixdex::IndexOptions { max_colors },
                preview,
            })
        }

        Commands::Extract {
            input,
            outdir,
            basename,
            max_colors,
        } => {
            let (outdir, basename) = output_location(&input, outdir, basename);
            extract::run(&input, &outdir, &basename, max_colors)
        }

        Commands::Convert { input, output } => convert::run(&input, &output),

        Commands::Monitor {
            port,
            snapshots,
            scale,
            frames,
        } => monitor::run(
            &port,
            &monitor::MonitorOptions {
                scale: scale.max(1),
                snapshot_dir: snapshots,
                max_frames: frames,
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_location_defaults() {
        let (outdir, basename) = output_location(Path::new("sprites/hero.png"), None, None);
        assert_eq!(outdir, PathBuf::from("sprites"));
        // not an existing file, so the whole name is used
        assert_eq!(basename, "hero.png");

        let (outdir, basename) = output_location(Path::new("walk"), None, None);
        assert_eq!(outdir, PathBuf::from("."));
        assert_eq!(basename, "walk");
    }

    #[test]
    fn test_output_location_overrides() {
        let (outdir, basename) = output_location(
            Path::new("walk"),
            Some(PathBuf::from("out")),
            Some("anim".to_string()),
        );
        assert_eq!(outdir, PathBuf::from("out"));
        assert_eq!(basename, "anim");
    }

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
