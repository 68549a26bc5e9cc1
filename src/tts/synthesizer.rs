//! Text-to-speech synthesizer using Kokoro models.

use std::path::PathBuf;

use anyhow::Result;
use sherpa_rs::OnnxConfig;
use sherpa_rs::tts::{CommonTtsConfig, KokoroTts, KokoroTtsConfig};
use tracing::{debug, info};

use crate::config::Provider;

/// Kokoro output sample rate.
pub const KOKORO_SAMPLE_RATE: u32 = 24000;

/// Everything the synthesizer needs, resolved for one book.
///
/// Built by `AppConfig::synthesis_config` and passed explicitly; the synthesis
/// layer keeps no process-wide voice or model state.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisConfig {
    pub model: PathBuf,
    pub voices: PathBuf,
    pub tokens: PathBuf,
    pub data_dir: PathBuf,
    pub dict_dir: PathBuf,
    /// Comma-separated lexicon files (English/Chinese voices)
    pub lexicon: String,
    /// espeak-ng language code (voices without a lexicon)
    pub lang: String,
    pub voice_name: String,
    pub speaker_id: i32,
    /// Speech speed multiplier
    pub speed: f32,
    pub provider: Provider,
    pub num_threads: usize,
    pub debug: bool,
}

/// Text-to-speech synthesizer using Kokoro models.
pub struct Synthesizer {
    tts: KokoroTts,   // Kokoro TTS engine
    sample_rate: u32, // Output sample rate (24kHz for Kokoro)
    speaker_id: i32,  // Speaker/voice identifier
    speed: f32,       // Speech speed multiplier
}

impl Synthesizer {
    /// Create a new TTS synthesizer.
    ///
    /// # Errors
    /// Returns an error if TTS initialization fails (e.g., missing model files).
    pub fn new(config: &SynthesisConfig) -> Result<Self> {
        info!("Initializing Kokoro TTS synthesizer with {} provider", config.provider);
        info!("TTS voice: {} (speaker ID: {})", config.voice_name, config.speaker_id);

        let path = |p: &PathBuf| p.to_string_lossy().to_string();
        let tts_config = KokoroTtsConfig {
            model: path(&config.model),
            voices: path(&config.voices),
            tokens: path(&config.tokens),
            data_dir: path(&config.data_dir),
            dict_dir: path(&config.dict_dir),
            lexicon: config.lexicon.clone(),
            lang: config.lang.clone(),
            length_scale: 1.0 / config.speed, // length_scale is inverse of speed
            onnx_config: OnnxConfig {
                provider: config.provider.as_sherpa_provider().to_string(),
                num_threads: config.num_threads.try_into().unwrap_or(2),
                debug: config.debug,
            },
            common_config: CommonTtsConfig { max_num_sentences: 1, ..Default::default() }, // Kokoro only supports 1
        };

        let tts = KokoroTts::new(tts_config);
        info!("TTS sample rate: {} Hz", KOKORO_SAMPLE_RATE);

        Ok(Self { tts, sample_rate: KOKORO_SAMPLE_RATE, speaker_id: config.speaker_id, speed: config.speed })
    }

    /// Synthesize one chunk of text into a waveform.
    ///
    /// Blank text yields an empty waveform.
    ///
    /// # Errors
    /// Returns an error if TTS generation fails.
    pub fn synthesize_chunk(&mut self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        debug!("Synthesizing chunk: \"{}\"", text);

        let audio = self.tts.create(text, self.speaker_id, self.speed).map_err(|e| anyhow::anyhow!("TTS generation failed: {}", e))?;

        debug!("🎵 Generated speech ({} samples)", audio.samples.len());
        Ok(audio.samples)
    }

    /// Get the sample rate of the synthesized audio.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
