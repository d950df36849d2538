//! Float to 16-bit PCM conversion.
//!
//! The encoder always emits interleaved stereo. Mono input is duplicated to
//! both channels; wider input keeps the first two channels of each frame.

/// Full-scale multiplier used for float -> int16 conversion.
pub const RESCALE_FACTOR: f32 = 32767.0;

/// Handling of samples outside [-1.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipPolicy {
    /// Clamp to full scale before rounding.
    #[default]
    Clamp,
    /// Round without clamping and wrap into the int16 range, matching
    /// the behaviour of earlier capture tooling.
    Wrap,
}

/// Convert one float sample to int16: `round(sample * 32767)`.
#[inline]
pub fn sample_to_i16(sample: f32, policy: ClipPolicy) -> i16 {
    match policy {
        ClipPolicy::Clamp => (sample.clamp(-1.0, 1.0) * RESCALE_FACTOR).round() as i16,
        // `as i32` saturates for non-finite or huge values; `as i16` then truncates.
        ClipPolicy::Wrap => ((sample * RESCALE_FACTOR).round() as i32) as i16,
    }
}

#[inline]
fn is_over_full_scale(sample: f32) -> bool {
    !(-1.0..=1.0).contains(&sample)
}

/// Append interleaved `samples` with `channels` channels to `out` as
/// little-endian stereo int16.
///
/// Returns the number of input samples that were outside [-1, 1].
/// Callers pass whole frames; a trailing partial frame is not encoded.
/// `out` is not cleared.
pub fn encode_stereo_i16(samples: &[f32], channels: u16, policy: ClipPolicy, out: &mut Vec<u8>) -> u64 {
    let mut clipped = 0u64;
    match channels {
        0 => {}
        1 => {
            out.reserve(samples.len() * 4);
            for &sample in samples {
                if is_over_full_scale(sample) {
                    clipped += 1;
                }
                let bytes = sample_to_i16(sample, policy).to_le_bytes();
                out.extend_from_slice(&bytes);
                out.extend_from_slice(&bytes);
            }
        }
        2 => {
            out.reserve(samples.len() * 2);
            for &sample in samples.chunks_exact(2).flatten() {
                if is_over_full_scale(sample) {
                    clipped += 1;
                }
                out.extend_from_slice(&sample_to_i16(sample, policy).to_le_bytes());
            }
        }
        n => {
            let n = n as usize;
            out.reserve(samples.len() / n * 4);
            for frame in samples.chunks_exact(n) {
                for &sample in &frame[..2] {
                    if is_over_full_scale(sample) {
                        clipped += 1;
                    }
                    out.extend_from_slice(&sample_to_i16(sample, policy).to_le_bytes());
                }
            }
        }
    }
    clipped
}

/// Decode little-endian int16 PCM back to floats in [-1, 1].
pub fn decode_i16_le(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / RESCALE_FACTOR)
        .collect()
}

/// Peak absolute amplitude of a buffer.
pub fn peak_level(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn full_scale_values() {
        assert_eq!(sample_to_i16(1.0, ClipPolicy::Clamp), 32767);
        assert_eq!(sample_to_i16(-1.0, ClipPolicy::Clamp), -32767);
        assert_eq!(sample_to_i16(0.0, ClipPolicy::Clamp), 0);
    }

    #[test]
    fn rounds_to_nearest() {
        // 0.5 * 32767 = 16383.5 -> rounds away from zero
        assert_eq!(sample_to_i16(0.5, ClipPolicy::Clamp), 16384);
        assert_eq!(sample_to_i16(-0.5, ClipPolicy::Clamp), -16384);
    }

    #[test]
    fn clamp_limits_overshoot() {
        assert_eq!(sample_to_i16(1.5, ClipPolicy::Clamp), 32767);
        assert_eq!(sample_to_i16(-3.0, ClipPolicy::Clamp), -32767);
    }

    #[test]
    fn wrap_overflows_without_clamping() {
        // round(1.5 * 32767) = 49151 -> wraps to 49151 - 65536
        assert_eq!(sample_to_i16(1.5, ClipPolicy::Wrap), (49151i32 - 65536) as i16);
        assert_eq!(sample_to_i16(0.25, ClipPolicy::Wrap), sample_to_i16(0.25, ClipPolicy::Clamp));
    }

    #[test]
    fn stereo_passthrough_is_little_endian() {
        let mut out = Vec::new();
        let clipped = encode_stereo_i16(&[1.0, -1.0], 2, ClipPolicy::Clamp, &mut out);
        assert_eq!(clipped, 0);
        assert_eq!(out, vec![0xFF, 0x7F, 0x01, 0x80]);
    }

    #[test]
    fn mono_is_duplicated() {
        let mut out = Vec::new();
        encode_stereo_i16(&[0.25, -0.25], 1, ClipPolicy::Clamp, &mut out);
        let decoded = decode_i16_le(&out);
        assert_eq!(decoded.len(), 4);
        assert_eq!(decoded[0], decoded[1]);
        assert_eq!(decoded[2], decoded[3]);
        assert_abs_diff_eq!(decoded[0], 0.25, epsilon = 1.0 / 32767.0);
    }

    #[test]
    fn wide_input_keeps_first_two_channels() {
        let mut out = Vec::new();
        let samples = [0.1, 0.2, 0.9, 0.9, 0.3, 0.4, 0.9, 0.9];
        encode_stereo_i16(&samples, 4, ClipPolicy::Clamp, &mut out);
        let decoded = decode_i16_le(&out);
        assert_eq!(decoded.len(), 4);
        assert_abs_diff_eq!(decoded[1], 0.2, epsilon = 1.0 / 32767.0);
        assert_abs_diff_eq!(decoded[2], 0.3, epsilon = 1.0 / 32767.0);
    }

    #[test]
    fn counts_out_of_range_samples() {
        let mut out = Vec::new();
        let clipped = encode_stereo_i16(&[1.2, 0.0, -1.01, 0.5], 2, ClipPolicy::Clamp, &mut out);
        assert_eq!(clipped, 2);
    }

    #[test]
    fn zero_channels_writes_nothing() {
        let mut out = Vec::new();
        encode_stereo_i16(&[0.5; 8], 0, ClipPolicy::Clamp, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn peak_of_buffer() {
        assert_eq!(peak_level(&[0.1, -0.7, 0.3]), 0.7);
        assert_eq!(peak_level(&[]), 0.0);
    }
}
