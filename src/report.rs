//! Reporting on a segmented book: warnings, dry-run listing and the JSON manifest.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use book_narrator::text::{Chunk, ChunkWarning};

/// Counts of chunks by warning kind.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WarningCounts {
    pub oversized: usize,
    pub overshoot: usize,
}

/// Log every flagged chunk and return how many there were of each kind.
pub fn log_warnings(chunks: &[Chunk]) -> WarningCounts {
    let mut counts = WarningCounts::default();
    for chunk in chunks {
        match chunk.warning {
            Some(warning @ ChunkWarning::OversizedAtomicUnit { .. }) => {
                counts.oversized += 1;
                warn!("⚠️  Chunk {}: {}: \"{}\"", chunk.index, warning, preview(&chunk.text));
            }
            Some(warning @ ChunkWarning::Overshoot { .. }) => {
                counts.overshoot += 1;
                info!("Chunk {}: {}", chunk.index, warning);
            }
            None => {}
        }
    }
    counts
}

/// Print the chunk sequence for `--dry-run`.
pub fn print_chunks(chunks: &[Chunk]) {
    print_chunks_to(&mut std::io::stdout().lock(), chunks).ok();
}

fn print_chunks_to<W: Write>(out: &mut W, chunks: &[Chunk]) -> std::io::Result<()> {
    writeln!(out, "{:>6}  {:>5}  {:<10}  {:<28}  Text", "Index", "Chars", "Boundary", "Warning")?;
    writeln!(out, "{}", "-".repeat(80))?;
    for chunk in chunks {
        let warning = chunk.warning.map(|w| w.to_string()).unwrap_or_default();
        writeln!(out, "{:>6}  {:>5}  {:<10}  {:<28}  {}", chunk.index, chunk.char_len(), chunk.boundary, warning, chunk.text)?;
    }
    writeln!(out, "\nTotal: {} chunks", chunks.len())
}

/// Chunk manifest written by `--chunks-json`.
#[derive(Debug, Serialize)]
struct Manifest<'a> {
    source: String,
    max_length: usize,
    chunk_count: usize,
    chunks: &'a [Chunk],
}

/// Write the chunk sequence of `source` as pretty-printed JSON.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_manifest(path: &Path, source: &Path, max_length: usize, chunks: &[Chunk]) -> Result<()> {
    let manifest =
        Manifest { source: source.display().to_string(), max_length, chunk_count: chunks.len(), chunks };

    let file = File::create(path).with_context(|| format!("Failed to create chunk manifest {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &manifest).context("Failed to serialize chunk manifest")?;
    writer.flush().context("Failed to write chunk manifest")?;

    info!("📝 Wrote chunk manifest to {}", path.display());
    Ok(())
}

/// First few characters of a chunk for log lines.
fn preview(text: &str) -> String {
    const PREVIEW_CHARS: usize = 40;
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((end, _)) => format!("{}…", &text[..end]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use book_narrator::text::{Segmenter, SegmenterConfig, segment};

    #[test]
    fn test_log_warnings_counts_by_kind() {
        let text = "Supercalifragilistic word. Then a short tail.";
        let chunks = segment(text, 10).unwrap();
        let counts = log_warnings(&chunks);
        assert_eq!(counts.oversized, 1);
        assert_eq!(counts.overshoot, 0);
    }

    #[test]
    fn test_overshoot_chunks_are_counted() {
        let segmenter = Segmenter::new(SegmenterConfig::new(20).with_overshoot(10)).unwrap();
        let chunks = segmenter.segment("The quick brown fox jumps. Over the lazy dog.");
        assert_eq!(chunks[0].text, "The quick brown fox jumps.");
        let counts = log_warnings(&chunks);
        assert_eq!(counts, WarningCounts { oversized: 0, overshoot: 1 });
    }

    #[test]
    fn test_print_chunks_lists_every_chunk() {
        let chunks = segment("One sentence here. Another one there.", 20).unwrap();
        let mut out = Vec::new();
        print_chunks_to(&mut out, &chunks).unwrap();
        let listing = String::from_utf8(out).unwrap();
        assert!(listing.contains("One sentence here."));
        assert!(listing.contains("Another one there."));
        assert!(listing.contains(&format!("Total: {} chunks", chunks.len())));
    }

    #[test]
    fn test_write_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunks.json");
        let chunks = segment("Hello world. Goodbye world.", 15).unwrap();

        write_manifest(&path, Path::new("book.txt"), 15, &chunks).unwrap();

        let json: serde_json::Value = serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        assert_eq!(json["source"], "book.txt");
        assert_eq!(json["max_length"], 15);
        assert_eq!(json["chunk_count"], chunks.len());
        assert_eq!(json["chunks"][0]["text"], "Hello world.");
        assert_eq!(json["chunks"][0]["boundary"], "sentence");
        assert_eq!(json["chunks"][0]["span"]["start"], 0);
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "字".repeat(50);
        let short = preview(&long);
        assert_eq!(short.chars().count(), 41);
        assert!(short.ends_with('…'));
        assert_eq!(preview("short"), "short");
    }
}
