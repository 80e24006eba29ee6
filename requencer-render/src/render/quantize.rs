//! Float-to-16-bit quantization
//!
//! Each sample is multiplied by the full scale and truncated toward zero.
//! Values that land outside the `i16` range after overlapping clips are summed
//! are handled according to [`ClipPolicy`].

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Overflow handling for samples outside the 16-bit range
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ClipPolicy {
    /// Keep the low 16 bits, like a native fixed-point narrowing conversion.
    /// Loud overlaps wrap around to the opposite sign.
    #[default]
    Wrap,

    /// Clamp to `i16::MIN..=i16::MAX`
    Saturate,
}

impl ClipPolicy {
    /// Convert one already-scaled value
    #[inline]
    pub fn convert(self, scaled: f32) -> i16 {
        match self {
            // f32 -> i64 truncates toward zero (NaN -> 0), i64 -> i16 keeps the low bits
            ClipPolicy::Wrap => scaled as i64 as i16,
            // f32 -> i16 saturates (NaN -> 0)
            ClipPolicy::Saturate => scaled as i16,
        }
    }
}

/// Quantization result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantized {
    /// Interleaved 16-bit samples, same length as the input buffer
    pub pcm: Vec<i16>,

    /// Number of samples whose scaled value was outside the 16-bit range
    pub overflowed: usize,
}

/// Quantize a float buffer to 16-bit PCM.
///
/// # Arguments
/// * `samples` - Mixed float samples
/// * `full_scale` - Multiplier applied before truncation (32767 by default)
/// * `policy` - Overflow handling
pub fn quantize(samples: &[f32], full_scale: f32, policy: ClipPolicy) -> Quantized {
    let min = i16::MIN as f32;
    let max = i16::MAX as f32;
    let mut overflowed = 0usize;

    let pcm = samples
        .iter()
        .map(|&sample| {
            let scaled = sample * full_scale;
            if scaled.trunc() < min || scaled.trunc() > max {
                overflowed += 1;
            }
            policy.convert(scaled)
        })
        .collect();

    if overflowed > 0 {
        warn!(
            "{} of {} samples exceeded 16-bit range ({:?} policy)",
            overflowed,
            samples.len(),
            policy
        );
    }

    Quantized { pcm, overflowed }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_SCALE: f32 = 32767.0;

    #[test]
    fn test_in_range_truncates_toward_zero() {
        let q = quantize(&[0.0, 1.0, -1.0, 0.5, -0.5], FULL_SCALE, ClipPolicy::Wrap);
        assert_eq!(q.pcm, vec![0, 32767, -32767, 16383, -16383]);
        assert_eq!(q.overflowed, 0);
    }

    #[test]
    fn test_wrap_policy_wraps_overflow() {
        // 2.0 * 32767 = 65534 -> 0xFFFE -> -2
        let q = quantize(&[2.0, -2.0], FULL_SCALE, ClipPolicy::Wrap);
        assert_eq!(q.pcm, vec![-2, 2]);
        assert_eq!(q.overflowed, 2);
    }

    #[test]
    fn test_wrap_just_past_max() {
        // 32768 wraps to i16::MIN
        let q = quantize(&[32768.0 / FULL_SCALE], FULL_SCALE, ClipPolicy::Wrap);
        assert_eq!(q.pcm, vec![i16::MIN]);
    }

    #[test]
    fn test_saturate_policy_clamps() {
        let q = quantize(&[2.0, -2.0, 1.5], FULL_SCALE, ClipPolicy::Saturate);
        assert_eq!(q.pcm, vec![i16::MAX, i16::MIN, i16::MAX]);
        assert_eq!(q.overflowed, 3);
    }

    #[test]
    fn test_minimum_sample_not_counted_as_overflow() {
        // i16::MIN decodes to slightly below -1.0 and quantizes back in range
        let decoded = i16::MIN as f32 / FULL_SCALE;
        let q = quantize(&[decoded], FULL_SCALE, ClipPolicy::Saturate);
        assert_eq!(q.pcm, vec![i16::MIN]);
        assert_eq!(q.overflowed, 0);
    }

    #[test]
    fn test_nan_becomes_zero() {
        for policy in [ClipPolicy::Wrap, ClipPolicy::Saturate] {
            let q = quantize(&[f32::NAN], FULL_SCALE, policy);
            assert_eq!(q.pcm, vec![0]);
        }
    }

    #[test]
    fn test_empty_buffer() {
        let q = quantize(&[], FULL_SCALE, ClipPolicy::Wrap);
        assert!(q.pcm.is_empty());
        assert_eq!(q.overflowed, 0);
    }

    #[test]
    fn test_policy_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Holder {
            policy: ClipPolicy,
        }
        let h: Holder = toml::from_str("policy = \"saturate\"").unwrap();
        assert_eq!(h.policy, ClipPolicy::Saturate);
    }
}
