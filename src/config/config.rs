//! Application configuration and CLI argument parsing.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::info;

use book_narrator::book::CjkScript;
use book_narrator::text::{DEFAULT_MAX_LENGTH, OversizePolicy, SegmenterConfig};

use super::voices;
use crate::tts::SynthesisConfig;

/// Name of the Kokoro model bundle directory under `<model_dir>/tts`.
pub const KOKORO_BUNDLE: &str = "kokoro-multi-lang-v1_0";

/// Hardware acceleration provider for ONNX models.
/// Auto-detected based on platform if not specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// CPU inference (default fallback, always available)
    #[default]
    Cpu,
    /// NVIDIA CUDA acceleration (Linux only, requires CUDA toolkit)
    Cuda,
    /// Apple CoreML acceleration (macOS only, uses Neural Engine)
    #[value(name = "coreml")]
    CoreMl,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sherpa_provider())
    }
}

impl Provider {
    /// Convert to sherpa-rs provider string.
    pub fn as_sherpa_provider(&self) -> &'static str {
        match self {
            Provider::Cpu => "cpu",
            Provider::Cuda => "cuda",
            Provider::CoreMl => "coreml",
        }
    }
}

/// Book narrator configuration.
#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(name = "book-narrator")]
#[command(author, version, about = "Narrate EPUB books with a local text-to-speech model", long_about = None)]
pub struct AppConfig {
    /// Book to narrate (.epub, or UTF-8 text for anything else)
    #[arg(required_unless_present_any = ["list_voices", "voice_info"])]
    pub input: Option<PathBuf>,

    /// Output WAV file (defaults to the input path with a .wav extension)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// List all available TTS voices and exit
    #[arg(long)]
    pub list_voices: bool,

    /// Show detailed information about a specific voice and exit
    #[arg(long)]
    pub voice_info: Option<String>,

    /// Directory containing model files
    #[arg(long, short = 'd', env = "MODEL_DIR", default_value_os_t = default_model_dir())]
    pub model_dir: PathBuf,

    /// Download the Kokoro model bundle into the model directory if it is missing
    #[arg(long)]
    pub download_models: bool,

    /// Maximum chunk length in characters handed to the TTS model per call
    #[arg(long, short = 'l', default_value_t = DEFAULT_MAX_LENGTH)]
    pub max_length: usize,

    /// Characters before the overflow point searched first for each boundary kind
    /// (default: the whole chunk)
    #[arg(long)]
    pub lookback: Option<usize>,

    /// Characters a chunk may run past --max-length to end on a sentence boundary
    #[arg(long, default_value = "0")]
    pub overshoot: usize,

    /// Cut unbreakable runs at --max-length instead of keeping them whole
    #[arg(long)]
    pub split_oversized: bool,

    /// Do not synthesize chunks longer than --max-length that could not be split
    #[arg(long)]
    pub skip_oversized: bool,

    /// Print the chunk sequence and exit without loading the model
    #[arg(long)]
    pub dry_run: bool,

    /// Write the chunk sequence as JSON to this path
    #[arg(long)]
    pub chunks_json: Option<PathBuf>,

    /// TTS voice name for Kokoro, or "auto" to pick by book language
    /// (zf_xiaobei for Chinese books, jf_alpha for Japanese books, af_bella otherwise)
    #[arg(long, default_value = voices::AUTO_VOICE)]
    pub tts_voice: String,

    /// TTS speaker ID override (defaults to the voice's ID)
    #[arg(long)]
    pub tts_speaker_id: Option<i32>,

    /// Text-to-speech speed multiplier
    #[arg(long, default_value = "1.0", value_parser = parse_speed)]
    pub tts_speed: f32,

    /// Hardware acceleration provider (auto-detected if not specified)
    #[arg(long, value_enum)]
    pub provider: Option<Provider>,

    /// TTS threads (0 = auto-detect based on CPU cores)
    #[arg(long, default_value = "0")]
    pub tts_threads: usize,

    /// Sample rate of the output file (defaults to the model's rate)
    #[arg(long, value_parser = clap::value_parser!(u32).range(8000..=192000))]
    pub output_sample_rate: Option<u32>,

    /// Silence inserted between chunks in milliseconds
    #[arg(long, default_value = "250")]
    pub chunk_gap_ms: u64,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl AppConfig {
    /// Parse configuration from command line arguments.
    pub fn from_args() -> Self {
        let mut config = Self::parse();

        // Handle voice listing commands
        if config.list_voices {
            voices::print_voices();
            std::process::exit(0);
        }

        if let Some(ref voice_name) = config.voice_info {
            match voices::print_voice_info(voice_name) {
                Ok(_) => std::process::exit(0),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }

        config.normalize_thread_counts();
        config
    }

    /// Auto-detect the TTS thread count based on CPU cores and provider.
    ///
    /// With CUDA the GPU handles parallelism, so one thread avoids contention.
    /// On CPU half the cores go to Kokoro; the rest stay free for extraction
    /// and WAV writing.
    fn normalize_thread_counts(&mut self) {
        if self.tts_threads == 0 {
            self.tts_threads = if self.effective_tts_provider() == Provider::Cuda { 1 } else { (num_cpus::get() / 2).max(1) };
        }
    }

    /// Get the effective TTS provider.
    pub fn effective_tts_provider(&self) -> Provider {
        self.provider.unwrap_or_else(detect_provider)
    }

    /// Book path given on the command line.
    pub fn input_path(&self) -> Result<&PathBuf> {
        self.input.as_ref().ok_or_else(|| anyhow::anyhow!("No input book given"))
    }

    /// Output WAV path: `--output`, or the input path with a `.wav` extension.
    pub fn output_path(&self) -> Result<PathBuf> {
        match &self.output {
            Some(path) => Ok(path.clone()),
            None => Ok(self.input_path()?.with_extension("wav")),
        }
    }

    /// Segmenter settings from the CLI.
    pub fn segmenter_config(&self) -> SegmenterConfig {
        let oversize = if self.split_oversized { OversizePolicy::Split } else { OversizePolicy::Keep };
        let config = SegmenterConfig::new(self.max_length).with_overshoot(self.overshoot).with_oversize(oversize);
        match self.lookback {
            Some(lookback) => config.with_lookback(lookback),
            None => config,
        }
    }

    /// Directory of the Kokoro model bundle.
    pub fn tts_dir(&self) -> PathBuf {
        self.model_dir.join("tts").join(KOKORO_BUNDLE)
    }

    /// Get the path to the Kokoro TTS model (multi-lang v1.0 - supports CoreML).
    pub fn tts_model_path(&self) -> PathBuf {
        self.tts_dir().join("model.onnx")
    }

    /// Get the path to the Kokoro TTS voices.bin file.
    pub fn tts_voices_path(&self) -> PathBuf {
        self.tts_dir().join("voices.bin")
    }

    /// Get the path to the TTS tokens file.
    pub fn tts_tokens_path(&self) -> PathBuf {
        self.tts_dir().join("tokens.txt")
    }

    /// Get the path to the TTS data directory.
    pub fn tts_data_dir(&self) -> PathBuf {
        self.tts_dir().join("espeak-ng-data")
    }

    /// Get the path to the TTS dict directory (for Chinese segmentation).
    pub fn tts_dict_dir(&self) -> PathBuf {
        self.tts_dir().join("dict")
    }

    /// Get the lexicon file list for a Kokoro voice.
    /// The model includes lexicon-us-en.txt (American), lexicon-gb-en.txt (British), lexicon-zh.txt (Chinese).
    /// Other languages return empty and rely on the espeak-ng language code instead.
    pub fn tts_lexicon(&self, voice_name: &str) -> String {
        let tts_dir = self.tts_dir();
        let lexicon = |name: &str| tts_dir.join(name).to_string_lossy().to_string();
        match voice_name.get(..2) {
            Some("af" | "am") => lexicon("lexicon-us-en.txt"),
            Some("bf" | "bm") => lexicon("lexicon-gb-en.txt"),
            // Chinese with English fallback for embedded Latin text
            Some("zf" | "zm") => format!("{},{}", lexicon("lexicon-us-en.txt"), lexicon("lexicon-zh.txt")),
            Some(_) => String::new(),
            None => lexicon("lexicon-us-en.txt"),
        }
    }

    /// Get the language code for voices that need espeak-ng.
    /// Reference: <https://github.com/k2-fsa/sherpa-onnx/blob/master/sherpa-onnx/csrc/offline-tts-kokoro-model-config.cc>
    pub fn tts_language(voice_name: &str) -> &'static str {
        match voice_name.get(..2) {
            Some("ef" | "em") => "es",
            Some("ff") => "fr",
            Some("hf" | "hm") => "hi",
            Some("if" | "im") => "it",
            Some("jf" | "jm") => "ja",
            Some("pf" | "pm") => "pt-br",
            _ => "", // English/Chinese use lexicon files
        }
    }

    /// Build the synthesis configuration for a book.
    ///
    /// Resolves `auto` to a voice matching the book's language.
    pub fn synthesis_config(&self, script: Option<CjkScript>) -> Result<SynthesisConfig> {
        let (voice_name, voice) = voices::resolve_voice(&self.tts_voice, script)?;
        let provider = self.effective_tts_provider();

        Ok(SynthesisConfig {
            model: self.tts_model_path(),
            voices: self.tts_voices_path(),
            tokens: self.tts_tokens_path(),
            data_dir: self.tts_data_dir(),
            dict_dir: self.tts_dict_dir(),
            lexicon: self.tts_lexicon(voice_name),
            lang: Self::tts_language(voice_name).to_string(),
            voice_name: voice_name.to_string(),
            speaker_id: self.tts_speaker_id.unwrap_or(voice.speaker_id),
            speed: self.tts_speed,
            provider,
            num_threads: self.tts_threads,
            debug: self.verbose,
        })
    }

    /// Validate the command-line options that do not depend on model files.
    pub fn validate(&self) -> Result<()> {
        let input = self.input_path()?;
        if !input.is_file() {
            anyhow::bail!("Input book does not exist: {}", input.display());
        }

        if !self.tts_voice.eq_ignore_ascii_case(voices::AUTO_VOICE) && voices::get_voice(&self.tts_voice).is_none() {
            anyhow::bail!("Unknown voice '{}'. Run with --list-voices to see available voices", self.tts_voice);
        }

        if self.split_oversized && self.skip_oversized {
            anyhow::bail!("--split-oversized and --skip-oversized cannot be combined");
        }

        Ok(())
    }

    /// Check that the Kokoro model files are present.
    pub fn validate_models(&self) -> Result<()> {
        if !self.model_dir.exists() {
            anyhow::bail!("Model directory does not exist: {}", self.model_dir.display());
        }

        let required_files = [self.tts_model_path(), self.tts_voices_path(), self.tts_tokens_path()];
        for path in &required_files {
            if !path.exists() {
                anyhow::bail!("Required model file not found: {}", path.display());
            }
        }

        Ok(())
    }

    /// Log the current configuration.
    pub fn log_config(&self) {
        info!("Configuration:");
        if let Some(ref input) = self.input {
            info!("  Input: {}", input.display());
        }
        if let Ok(output) = self.output_path() {
            info!("  Output: {}", output.display());
        }
        info!("  Model directory: {}", self.model_dir.display());
        info!("  Max chunk length: {} chars", self.max_length);
        match self.lookback {
            Some(lookback) => info!("  Lookback: {} chars", lookback),
            None => info!("  Lookback: whole chunk"),
        }
        if self.overshoot > 0 {
            info!("  Overshoot: {} chars", self.overshoot);
        }
        info!("  Oversized runs: {}", if self.split_oversized { "split" } else if self.skip_oversized { "skipped" } else { "kept" });
        info!("  TTS voice: {}", self.tts_voice);
        info!("  TTS speed: {}", self.tts_speed);
        info!("  TTS provider: {} ({} threads)", self.effective_tts_provider(), self.tts_threads);
        if let Some(rate) = self.output_sample_rate {
            info!("  Output sample rate: {} Hz", rate);
        }
        info!("  Chunk gap: {}ms", self.chunk_gap_ms);
    }
}

/// Get the default model directory (~/.book-narrator/models).
fn default_model_dir() -> PathBuf {
    if let Some(home_dir) = dirs::home_dir() {
        home_dir.join(".book-narrator").join("models")
    } else {
        PathBuf::from("models")
    }
}

/// Auto-detect the best hardware acceleration provider.
fn detect_provider() -> Provider {
    #[cfg(target_os = "macos")]
    {
        Provider::CoreMl
    }

    #[cfg(target_os = "linux")]
    {
        if has_nvidia_gpu() { Provider::Cuda } else { Provider::Cpu }
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        Provider::Cpu
    }
}

/// Check if an NVIDIA GPU is available (Linux only).
#[cfg(target_os = "linux")]
fn has_nvidia_gpu() -> bool {
    use std::path::Path;

    let nvidia_paths = [
        "/dev/nvidia0",
        "/dev/nvidiactl",
        "/dev/nvidia-uvm",
        // Jetson devices
        "/dev/nvhost-ctrl",
        "/dev/nvhost-ctrl-gpu",
        "/etc/nv_tegra_release",
    ];

    nvidia_paths.iter().any(|path| Path::new(path).exists())
}

/// Parse and validate the speed multiplier (0.5-2.0).
fn parse_speed(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|_| format!("'{}' is not a valid float", s))?;
    if (0.5..=2.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("speed must be between 0.5 and 2.0, got {}", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> AppConfig {
        AppConfig::try_parse_from(std::iter::once("book-narrator").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["book.epub"]);
        assert_eq!(config.max_length, DEFAULT_MAX_LENGTH);
        assert_eq!(config.tts_voice, voices::AUTO_VOICE);
        assert_eq!(config.output_path().unwrap(), PathBuf::from("book.wav"));
        assert_eq!(config.segmenter_config(), SegmenterConfig::new(DEFAULT_MAX_LENGTH));
    }

    #[test]
    fn test_input_required_unless_listing_voices() {
        assert!(AppConfig::try_parse_from(["book-narrator"]).is_err());
        assert!(AppConfig::try_parse_from(["book-narrator", "--list-voices"]).is_ok());
    }

    #[test]
    fn test_segmenter_options() {
        let config = parse(&["book.epub", "-l", "120", "--lookback", "40", "--overshoot", "15", "--split-oversized"]);
        let segmenter = config.segmenter_config();
        assert_eq!(segmenter.max_length, 120);
        assert_eq!(segmenter.lookback, Some(40));
        assert_eq!(segmenter.overshoot, 15);
        assert_eq!(segmenter.oversize, OversizePolicy::Split);
    }

    #[test]
    fn test_zero_max_length_reaches_the_segmenter() {
        // The CLI accepts it; the segmenter reports the invalid configuration
        let config = parse(&["book.epub", "--max-length", "0"]);
        assert!(config.segmenter_config().validate().is_err());
    }

    #[test]
    fn test_speed_range() {
        assert!(parse_speed("1.2").is_ok());
        assert!(parse_speed("0.1").is_err());
        assert!(parse_speed("fast").is_err());
    }

    #[test]
    fn test_voice_dependent_model_settings() {
        let config = parse(&["book.epub", "-d", "/models"]);
        assert!(config.tts_lexicon("af_bella").ends_with("lexicon-us-en.txt"));
        assert!(config.tts_lexicon("bf_emma").ends_with("lexicon-gb-en.txt"));
        assert!(config.tts_lexicon("zf_xiaobei").contains("lexicon-zh.txt"));
        assert_eq!(config.tts_lexicon("ff_siwis"), "");
        assert_eq!(AppConfig::tts_language("ff_siwis"), "fr");
        assert_eq!(AppConfig::tts_language("af_bella"), "");
    }

    #[test]
    fn test_synthesis_config_resolves_auto_voice() {
        let config = parse(&["book.epub", "-d", "/models", "--provider", "cpu", "--tts-threads", "2"]);

        let chinese = config.synthesis_config(Some(CjkScript::Chinese)).unwrap();
        assert_eq!(chinese.voice_name, voices::DEFAULT_CJK_VOICE);
        assert_eq!(chinese.speaker_id, 45);

        let japanese = config.synthesis_config(Some(CjkScript::Japanese)).unwrap();
        assert_eq!(japanese.voice_name, voices::DEFAULT_JA_VOICE);
        assert_eq!(japanese.speaker_id, 37);
        assert_eq!(japanese.lang, "ja");
        assert_eq!(japanese.lexicon, "");

        let english = config.synthesis_config(None).unwrap();
        assert_eq!(english.voice_name, voices::DEFAULT_VOICE);
        assert_eq!(english.speaker_id, 2);
        assert_eq!(english.model, PathBuf::from("/models/tts/kokoro-multi-lang-v1_0/model.onnx"));
        assert_eq!(english.provider, Provider::Cpu);
        assert_eq!(english.num_threads, 2);
    }

    #[test]
    fn test_conflicting_oversize_flags_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_string_lossy().to_string();
        let config = parse(&[&path, "--split-oversized", "--skip-oversized"]);
        assert!(config.validate().is_err());

        let config = parse(&[&path]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_voice_names_validated() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_string_lossy().to_string();

        assert!(parse(&[&path, "--tts-voice", "AUTO"]).validate().is_ok());
        assert!(parse(&[&path, "--tts-voice", "Auto"]).synthesis_config(None).is_ok());
        assert!(parse(&[&path, "--tts-voice", "jf_alpha"]).validate().is_ok());
        assert!(parse(&[&path, "--tts-voice", "xx_nobody"]).validate().is_err());
    }
}
