//! Decoded clip data
//!
//! **Format:**
//! - Samples are f32, normalized by the configured full scale
//! - Interleaved: [L, R, L, R, ...]
//! - `sample_count` counts individual interleaved values, not frames, so a
//!   start offset and a clip length share the same unit

/// A clip decoded into memory, ready to be placed on the timeline
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedClip {
    /// Interleaved float samples
    pub samples: Vec<f32>,

    /// Channel count of the source file
    pub channels: u16,

    /// Sample rate of the source file
    pub sample_rate: u32,
}

impl DecodedClip {
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        Self {
            samples,
            channels,
            sample_rate,
        }
    }

    /// Number of interleaved samples (all channels combined)
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Number of whole frames
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f64 / self.sample_rate as f64
    }
}
