//! `key: value` text files written next to index streams.

use std::fmt;
use std::path::Path;

use crate::sequence::SequenceStats;
use crate::source::SourceKind;
use crate::INDEX_MEANING;

/// Ordered `key: value` lines.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(&'static str, String)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &'static str, value: impl fmt::Display) -> &mut Self {
        self.entries.push((key, value.to_string()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{key}: {value}")?;
        }
        Ok(())
    }
}

/// Formats indices like `[1, 4, 7]`.
fn index_list<'a>(indices: impl IntoIterator<Item = &'a u8>) -> String {
    let items: Vec<String> = indices.into_iter().map(u8::to_string).collect();
    format!("[{}]", items.join(", "))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Metadata for an indexed sequence.
pub fn sequence_metadata(
    kind: SourceKind,
    source: &Path,
    stats: &SequenceStats,
    palette_colors: usize,
    index_bin: &Path,
) -> Metadata {
    let mut meta = Metadata::new();
    meta.push("input_kind", kind)
        .push("source", source.display())
        .push("width", stats.width)
        .push("height", stats.height)
        .push("frames", stats.frames)
        .push("frame_stride", stats.frame_stride())
        .push("total_indices_written", stats.total_indices)
        .push("colormap_nontransparent_colors", palette_colors)
        .push("indices_used_count", stats.used_indices.len())
        .push("indices_used_sorted", index_list(&stats.used_indices))
        .push("index_meaning", INDEX_MEANING)
        .push("index_bin", file_name(index_bin));
    meta
}

/// Metadata for a standalone colormap extraction.
pub fn extraction_metadata(
    width: u32,
    height: u32,
    num_colors: usize,
    colormap_png: &Path,
    index_bin: &Path,
) -> Metadata {
    let mut meta = Metadata::new();
    meta.push("width", width)
        .push("height", height)
        .push("num_colors", num_colors)
        .push("index_meaning", INDEX_MEANING)
        .push("colormap_png", file_name(colormap_png))
        .push("index_bin", file_name(index_bin));
    meta
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    #[test]
    fn test_sequence_metadata() {
        let stats = SequenceStats {
            frames: 2,
            width: 4,
            height: 3,
            total_indices: 24,
            used_indices: BTreeSet::from([7, 1, 3]),
        };
        let meta = sequence_metadata(
            SourceKind::ImageFolder,
            Path::new("frames"),
            &stats,
            9,
            Path::new("out/frames.bin"),
        );

        assert_eq!(
            meta.to_string(),
            "input_kind: png_folder\n\
             source: frames\n\
             width: 4\n\
             height: 3\n\
             frames: 2\n\
             frame_stride: 12\n\
             total_indices_written: 24\n\
             colormap_nontransparent_colors: 9\n\
             indices_used_count: 3\n\
             indices_used_sorted: [1, 3, 7]\n\
             index_meaning: 0=transparent; 1..n = position in colormap image from left to right\n\
             index_bin: frames.bin"
        );
    }

    #[test]
    fn test_extraction_metadata() {
        let meta = extraction_metadata(
            16,
            8,
            5,
            Path::new("/tmp/x/hero.colormap.png"),
            Path::new("/tmp/x/hero.index.u8.bin"),
        );
        assert_eq!(meta.get("num_colors"), Some("5"));
        assert_eq!(meta.get("colormap_png"), Some("hero.colormap.png"));
        assert_eq!(
            meta.keys().collect::<Vec<_>>(),
            vec!["width", "height", "num_colors", "index_meaning", "colormap_png", "index_bin"]
        );
    }

    #[test]
    fn test_empty_index_list() {
        assert_eq!(index_list(&BTreeSet::new()), "[]");
    }
}
