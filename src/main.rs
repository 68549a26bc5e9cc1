//! Book Narrator - turns EPUB books into a WAV audiobook with a local TTS model.
//!
//! The book text is extracted and normalized, split into chunks the Kokoro
//! model can take in one call, synthesized chunk by chunk and written in order
//! to a single WAV file.

mod audio;
mod config;
mod models;
mod report;
mod tts;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::LocalTime;

use audio::{AudioWriter, WavSummary, resampler};
use book_narrator::book;
use book_narrator::text::{Chunk, Segmenter};
use config::AppConfig;
use tts::Synthesizer;

/// Waveforms buffered between synthesis and the WAV writer.
const WAVEFORM_QUEUE: usize = 8;

/// One synthesized chunk on its way to the writer.
struct Waveform {
    index: usize,      // Chunk index in the book
    samples: Vec<f32>, // Mono samples at the model rate
}

/// Outcome of the synthesis task.
#[derive(Debug, Default)]
struct SynthesisSummary {
    synthesized: usize,
    skipped: usize,
    failed: usize,
}

/// Configuration for the WAV writer task.
struct WriterTaskConfig {
    writer: AudioWriter,
    model_rate: u32,  // Rate of incoming waveforms
    output_rate: u32, // Rate of the output file
    gap_ms: u64,      // Silence between chunks (ms)
}

/// Spawn the synthesis task.
///
/// Runs Kokoro on the blocking pool, one chunk at a time in book order, and
/// sends each waveform to the writer. The shutdown flag is checked between
/// chunks so an interrupted run still ends on a complete chunk.
///
/// # Arguments
/// * `synthesizer` - TTS synthesizer, owned by the task
/// * `chunks` - Chunk sequence of the book
/// * `waveform_tx` - Channel to the writer task
/// * `skip_oversized` - Drop chunks flagged as oversized instead of synthesizing them
/// * `shutdown` - Shutdown flag
///
/// # Returns
/// Join handle resolving to the synthesis summary
fn spawn_synthesis_task(
    mut synthesizer: Synthesizer,
    chunks: Vec<Chunk>,
    waveform_tx: mpsc::Sender<Waveform>,
    skip_oversized: bool,
    shutdown: Arc<AtomicBool>,
) -> JoinHandle<SynthesisSummary> {
    tokio::task::spawn_blocking(move || {
        let mut summary = SynthesisSummary::default();
        let total = chunks.len();

        for chunk in chunks {
            if shutdown.load(Ordering::Relaxed) {
                info!("⏹️  Synthesis stopped before chunk {}/{}", chunk.index + 1, total);
                break;
            }

            if skip_oversized && chunk.is_oversized() {
                warn!("⏭️  Skipping oversized chunk {} ({} chars)", chunk.index, chunk.char_len());
                summary.skipped += 1;
                continue;
            }

            info!("🗣️  Synthesizing chunk {}/{} ({} chars)", chunk.index + 1, total, chunk.char_len());
            let samples = match synthesizer.synthesize_chunk(&chunk.text) {
                Ok(samples) => samples,
                Err(e) => {
                    error!("❌ TTS error for chunk {}: {}", chunk.index, e);
                    summary.failed += 1;
                    continue; // Skip failed chunk
                }
            };

            if samples.is_empty() {
                debug!("Chunk {} produced no audio", chunk.index);
                continue;
            }

            if waveform_tx.blocking_send(Waveform { index: chunk.index, samples }).is_err() {
                debug!("Waveform channel closed");
                break;
            }
            summary.synthesized += 1;
        }

        summary
    })
}

/// Spawn the WAV writer task.
///
/// Receives waveforms in chunk order, resamples them to the output rate and
/// appends them to the file. The file is finalized once the synthesis task
/// drops its sender.
fn spawn_writer_task(mut waveform_rx: mpsc::Receiver<Waveform>, config: WriterTaskConfig) -> JoinHandle<Result<WavSummary>> {
    let WriterTaskConfig { mut writer, model_rate, output_rate, gap_ms } = config;

    tokio::task::spawn_blocking(move || {
        while let Some(waveform) = waveform_rx.blocking_recv() {
            let samples = resampler::resample(&waveform.samples, model_rate, output_rate)?;
            writer.append_segment(&samples, gap_ms)?;
            debug!("Wrote chunk {} ({} samples so far)", waveform.index, writer.samples_written());
        }
        writer.finalize()
    })
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn wait_for_shutdown(shutdown: Arc<AtomicBool>) {
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("🛑 Received Ctrl+C, finishing the current chunk...");
        }
        _ = async {
            #[cfg(unix)]
            {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                    }
                    Err(e) => {
                        warn!("Failed to register SIGTERM handler: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
            }
        } => {
            info!("🛑 Received SIGTERM, finishing the current chunk...");
        }
    }

    shutdown.store(true, Ordering::SeqCst);
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let config = AppConfig::from_args();

    // Respect RUST_LOG env var, fallback to verbose flag, default to info
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if config.verbose { "debug" } else { "info" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(LocalTime::new(time::macros::format_description!("[hour]:[minute]:[second]")))
        .init();

    info!("📖 Book Narrator v{}", env!("CARGO_PKG_VERSION"));

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("❌ Configuration error: {}", e);
        std::process::exit(1);
    }
    config.log_config();

    if config.download_models {
        let model_dir = config.model_dir.clone();
        tokio::task::spawn_blocking(move || models::ensure_kokoro_model(&model_dir)).await??;
    }

    // Extract and segment the book
    let input = config.input_path()?.clone();
    let text = book::load_text(&input)?;

    let segmenter = Segmenter::new(config.segmenter_config())?;
    let chunks = segmenter.segment(&text);
    if chunks.is_empty() {
        warn!("No readable text found in {}", input.display());
        return Ok(());
    }
    info!("✂️  Split book into {} chunks", chunks.len());

    let counts = report::log_warnings(&chunks);
    if counts.oversized > 0 {
        let action = if config.skip_oversized { "will be skipped" } else { "will be synthesized whole" };
        warn!("{} chunks have no break point within {} chars and {}", counts.oversized, config.max_length, action);
    }
    if counts.overshoot > 0 {
        info!("{} chunks run past {} chars to end on a sentence", counts.overshoot, config.max_length);
    }

    if let Some(ref path) = config.chunks_json {
        report::write_manifest(path, &input, config.max_length, &chunks)?;
    }

    if config.dry_run {
        report::print_chunks(&chunks);
        return Ok(());
    }

    if let Err(e) = config.validate_models() {
        error!("❌ Model error: {}", e);
        error!("Run with --download-models to fetch the Kokoro model bundle.");
        std::process::exit(1);
    }

    // Create components
    let synthesis_config = config.synthesis_config(book::detect_cjk_script(&text))?;
    let synthesizer = Synthesizer::new(&synthesis_config)?;
    let model_rate = synthesizer.sample_rate();
    let output_rate = config.output_sample_rate.unwrap_or(model_rate);
    let writer = AudioWriter::create(&config.output_path()?, output_rate)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let (waveform_tx, waveform_rx) = mpsc::channel::<Waveform>(WAVEFORM_QUEUE);

    let writer_handle =
        spawn_writer_task(waveform_rx, WriterTaskConfig { writer, model_rate, output_rate, gap_ms: config.chunk_gap_ms });
    let mut synthesis_handle =
        spawn_synthesis_task(synthesizer, chunks, waveform_tx, config.skip_oversized, shutdown.clone());

    // Run until synthesis ends or a shutdown signal arrives
    let summary = tokio::select! {
        result = &mut synthesis_handle => result?,
        _ = wait_for_shutdown(shutdown) => synthesis_handle.await?,
    };

    // The writer finishes once the synthesis task drops its sender
    let wav = writer_handle.await??;

    info!(
        "✅ Narration finished: {} chunks synthesized, {} skipped, {} failed",
        summary.synthesized, summary.skipped, summary.failed
    );
    info!("🎧 {} ({:.1}s of audio)", wav.path.display(), wav.duration_secs());
    Ok(())
}
