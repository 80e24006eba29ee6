//! Shared accumulation buffer
//!
//! The buffer length is fixed when it is created, before any clip is mixed.
//! Each placement is summed into its own span with no clipping or
//! normalization; the result may exceed `[-1.0, 1.0]` where clips overlap.
//!
//! Clip samples are f32 but the accumulator is f64. At the default full scale
//! every decoded sample is a multiple of 2^-38 below 2^1, so sums of up to
//! 2^14 overlapping clips are exact in f64 and the mix does not depend on
//! placement order. The sum is rounded to f32 once, in [`MixBuffer::into_f32`].

use crate::error::{RenderError, Result};
use crate::render::schedule::Placement;

/// Zero-initialized mix accumulator
#[derive(Debug, Clone, PartialEq)]
pub struct MixBuffer {
    samples: Vec<f64>,
}

/// Buffer length needed to hold every placement
pub fn required_length(placements: &[Placement]) -> usize {
    placements.iter().map(Placement::end).max().unwrap_or(0)
}

impl MixBuffer {
    /// Create a silent buffer of `length` samples.
    ///
    /// # Errors
    /// `RenderError::Allocation` if the buffer cannot be allocated.
    pub fn with_length(length: usize) -> Result<Self> {
        let mut samples = Vec::new();
        samples
            .try_reserve_exact(length)
            .map_err(|_| RenderError::Allocation { samples: length })?;
        samples.resize(length, 0.0);
        Ok(Self { samples })
    }

    /// Create a silent buffer sized for `placements`
    pub fn for_placements(placements: &[Placement]) -> Result<Self> {
        Self::with_length(required_length(placements))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Round the exact sums to f32 for quantization
    pub fn into_f32(self) -> Vec<f32> {
        self.samples.into_iter().map(|s| s as f32).collect()
    }

    /// Add a placement's samples into `[aligned_start, aligned_start + sample_count)`.
    ///
    /// # Errors
    /// `RenderError::Internal` if the span does not fit in the buffer. This
    /// cannot happen for a buffer built with [`MixBuffer::for_placements`].
    pub fn accumulate(&mut self, placement: &Placement) -> Result<()> {
        let start = placement.aligned_start;
        let end = placement.end();
        let len = self.samples.len();

        let span = self.samples.get_mut(start..end).ok_or_else(|| {
            RenderError::Internal(format!(
                "placement span {}..{} exceeds mix buffer length {}",
                start, end, len
            ))
        })?;

        for (dst, &src) in span.iter_mut().zip(&placement.clip.samples) {
            *dst += f64::from(src);
        }

        Ok(())
    }
}
