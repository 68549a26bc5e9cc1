//! Shared sample conversions.

/// Convert a float sample in `[-1.0, 1.0]` to 16-bit PCM, clamping out-of-range values.
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

/// Number of samples in `ms` milliseconds at `sample_rate`.
pub fn samples_for_ms(ms: u64, sample_rate: u32) -> usize {
    (ms * sample_rate as u64 / 1000) as usize
}

/// Duration in seconds of `samples` mono samples.
pub fn duration_secs(samples: usize, sample_rate: u32) -> f64 {
    samples as f64 / sample_rate as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f32_to_i16() {
        assert_eq!(f32_to_i16(0.0), 0);
        assert_eq!(f32_to_i16(1.0), i16::MAX);
        assert_eq!(f32_to_i16(-1.0), -i16::MAX);
        // Out-of-range samples are clamped
        assert_eq!(f32_to_i16(1.7), i16::MAX);
        assert_eq!(f32_to_i16(-3.0), -i16::MAX);
    }

    #[test]
    fn test_samples_for_ms() {
        assert_eq!(samples_for_ms(250, 24000), 6000);
        assert_eq!(samples_for_ms(0, 24000), 0);
    }

    #[test]
    fn test_duration_secs() {
        assert_eq!(duration_secs(48000, 24000), 2.0);
    }
}
