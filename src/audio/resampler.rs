//! Audio resampling using rubato's FFT-based resampler.
//!
//! Converts Kokoro's 24kHz waveforms to the sample rate requested for the
//! output file.

use anyhow::{Context, Result};
use audioadapter_buffers::direct::InterleavedSlice;
use rubato::{Fft, FixedSync, Resampler};

/// Chunk size for FFT-based resampling (provides good quality and performance).
const CHUNK_SIZE: usize = 1024;

/// Number of sub-chunks for FFT processing (higher = better quality but more CPU).
const SUB_CHUNKS: usize = 2;

/// Number of output frames expected for `input_len` frames.
fn expected_output_len(input_len: usize, from_rate: u32, to_rate: u32) -> usize {
    (input_len as f64 * to_rate as f64 / from_rate as f64).round() as usize
}

/// Resample a mono waveform from one sample rate to another.
///
/// The waveform is processed in fixed-size blocks, the last one zero-padded.
/// The resampler's output delay is dropped from the front and zero blocks are
/// fed until the tail has come through, so the result lines up with the input
/// and has exactly its duration.
///
/// # Errors
/// Returns an error if the resampler cannot be created for the given rates.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    // No resampling needed if rates match
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let mut resampler = Fft::<f32>::new(
        from_rate as usize,
        to_rate as usize,
        CHUNK_SIZE,
        SUB_CHUNKS,
        1, // mono
        FixedSync::Input,
    )
    .context("Failed to create resampler")?;

    let output_frames_max = resampler.output_frames_max();
    let mut output_buffer = vec![0.0f32; output_frames_max];

    let delay = resampler.output_delay();
    let expected_len = expected_output_len(samples.len(), from_rate, to_rate);
    let mut output = Vec::with_capacity(delay + expected_len + output_frames_max);

    let mut blocks = samples.chunks(CHUNK_SIZE);
    let mut input_block = vec![0.0f32; CHUNK_SIZE];

    while output.len() < delay + expected_len {
        // Pad the last block, then flush with silence
        input_block.fill(0.0);
        if let Some(block) = blocks.next() {
            input_block[..block.len()].copy_from_slice(block);
        }

        let input_adapter = InterleavedSlice::new(&input_block, 1, CHUNK_SIZE).context("Failed to create input adapter")?;
        let mut output_adapter =
            InterleavedSlice::new_mut(&mut output_buffer, 1, output_frames_max).context("Failed to create output adapter")?;

        let (_, frames_written) = resampler
            .process_into_buffer(&input_adapter, &mut output_adapter, None)
            .map_err(|e| anyhow::anyhow!("Resampling error: {}", e))?;
        if frames_written == 0 {
            anyhow::bail!("Resampler produced no output");
        }
        output.extend_from_slice(&output_buffer[..frames_written]);
    }

    output.drain(..delay);
    output.truncate(expected_len);
    Ok(output)
}
