//! Audio output module for the narrated book.
//!
//! Waveforms from the synthesizer are resampled with rubato when the output
//! rate differs from the model's, then appended to a WAV file with hound.

pub mod resampler;
mod util;
mod writer;

pub use writer::{AudioWriter, WavSummary};
