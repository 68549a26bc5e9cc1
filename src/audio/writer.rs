//! WAV output for the narrated book.
//!
//! Waveforms arrive one chunk at a time, in order, and are appended to a single
//! mono 16-bit PCM file.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::info;

use super::util::{duration_secs, f32_to_i16, samples_for_ms};

/// Summary of a finished output file.
#[derive(Debug, Clone, PartialEq)]
pub struct WavSummary {
    pub path: PathBuf,
    pub samples: usize,
    pub sample_rate: u32,
    pub segments: usize,
}

impl WavSummary {
    pub fn duration_secs(&self) -> f64 {
        duration_secs(self.samples, self.sample_rate)
    }
}

/// Appends waveforms to a WAV file.
pub struct AudioWriter {
    writer: WavWriter<BufWriter<File>>,
    path: PathBuf,
    sample_rate: u32,
    samples: usize,
    segments: usize,
}

impl AudioWriter {
    /// Create the output file, replacing any existing one.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create(path: &Path, sample_rate: u32) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| format!("Failed to create output directory {}", parent.display()))?;
        }

        let spec = WavSpec { channels: 1, sample_rate, bits_per_sample: 16, sample_format: SampleFormat::Int };
        let writer = WavWriter::create(path, spec).with_context(|| format!("Failed to create WAV file {}", path.display()))?;

        Ok(Self { writer, path: path.to_path_buf(), sample_rate, samples: 0, segments: 0 })
    }

    /// Append one chunk's waveform, preceded by `gap_ms` of silence unless it is the first.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn append_segment(&mut self, samples: &[f32], gap_ms: u64) -> Result<()> {
        if self.segments > 0 {
            self.write_silence(samples_for_ms(gap_ms, self.sample_rate))?;
        }
        for &sample in samples {
            self.writer.write_sample(f32_to_i16(sample)).context("Failed to write WAV sample")?;
        }
        self.samples += samples.len();
        self.segments += 1;
        Ok(())
    }

    fn write_silence(&mut self, count: usize) -> Result<()> {
        for _ in 0..count {
            self.writer.write_sample(0i16).context("Failed to write WAV sample")?;
        }
        self.samples += count;
        Ok(())
    }

    /// Samples written so far, gaps included.
    pub fn samples_written(&self) -> usize {
        self.samples
    }

    /// Flush the WAV header and close the file.
    ///
    /// # Errors
    /// Returns an error if the header cannot be written.
    pub fn finalize(self) -> Result<WavSummary> {
        self.writer.finalize().with_context(|| format!("Failed to finalize WAV file {}", self.path.display()))?;

        let summary = WavSummary { path: self.path, samples: self.samples, sample_rate: self.sample_rate, segments: self.segments };
        info!(
            "💾 Wrote {} ({} segments, {:.1}s of audio)",
            summary.path.display(),
            summary.segments,
            summary.duration_secs()
        );
        Ok(summary)
    }
}
