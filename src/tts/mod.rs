//! Text-to-speech module using sherpa-rs.
//!
//! Turns one text chunk at a time into a waveform with Kokoro models.

mod synthesizer;

pub use synthesizer::{SynthesisConfig, Synthesizer};
