//! Clip descriptors, placements, and schedule construction
//!
//! Descriptors arrive as JSON objects `{ "filename": string, "start": integer }`.
//! Each one is validated, its clip decoded, and its start offset rounded down
//! to a 4-sample boundary so every placement begins on a stereo frame pair.
//!
//! Start offsets and clip lengths are both counted in interleaved samples.

use crate::audio::{ClipDecoder, DecodedClip};
use crate::error::{RenderError, Result};
use crate::render::mix::required_length;
use rayon::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

/// Placement start offsets are multiples of this many samples
pub const START_ALIGNMENT: usize = 4;

/// Largest accepted start offset, the range of a signed 32-bit integer
pub const MAX_START: usize = i32::MAX as usize;

/// Descriptor key holding the clip path
pub const FIELD_FILENAME: &str = "filename";

/// Descriptor key holding the start offset
pub const FIELD_START: &str = "start";

/// Round `start` down to the nearest multiple of [`START_ALIGNMENT`]
#[inline]
pub fn align_start(start: usize) -> usize {
    start & !(START_ALIGNMENT - 1)
}

/// One requested clip on the timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipDescriptor {
    pub path: PathBuf,
    /// Requested start offset in interleaved samples
    pub start: usize,
}

impl ClipDescriptor {
    pub fn new(path: impl Into<PathBuf>, start: usize) -> Self {
        Self {
            path: path.into(),
            start,
        }
    }

    /// JSON form accepted by [`parse_descriptors`]
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            FIELD_FILENAME: self.path.to_string_lossy(),
            FIELD_START: self.start,
        })
    }
}

/// Validate a JSON array of descriptor objects.
///
/// Descriptors are checked in order and the first problem is reported.
///
/// # Errors
/// `RenderError::Validation` naming the offending field and index.
pub fn parse_descriptors(value: &Value) -> Result<Vec<ClipDescriptor>> {
    let items = value
        .as_array()
        .ok_or_else(|| RenderError::validation(None, "clips", "must be an array of objects"))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_descriptor(index, item))
        .collect()
}

/// Validate a single descriptor object at position `index`
pub fn parse_descriptor(index: usize, value: &Value) -> Result<ClipDescriptor> {
    let object = value.as_object().ok_or_else(|| {
        RenderError::validation(Some(index), "descriptor", "is not an object")
    })?;

    let filename = match object.get(FIELD_FILENAME) {
        None | Some(Value::Null) => {
            return Err(RenderError::validation(Some(index), FIELD_FILENAME, "is missing"))
        }
        Some(Value::String(s)) if s.is_empty() => {
            return Err(RenderError::validation(Some(index), FIELD_FILENAME, "is empty"))
        }
        Some(Value::String(s)) => s,
        Some(_) => {
            return Err(RenderError::validation(
                Some(index),
                FIELD_FILENAME,
                "is of wrong type (expected string)",
            ))
        }
    };

    let start = match object.get(FIELD_START) {
        None | Some(Value::Null) => {
            return Err(RenderError::validation(Some(index), FIELD_START, "is missing"))
        }
        Some(Value::Number(n)) => {
            if let Some(v) = n.as_u64() {
                let start = usize::try_from(v).unwrap_or(usize::MAX);
                check_start(index, start)?
            } else if n.is_i64() {
                return Err(RenderError::validation(
                    Some(index),
                    FIELD_START,
                    format!("{} is negative", n),
                ));
            } else {
                return Err(RenderError::validation(
                    Some(index),
                    FIELD_START,
                    format!("{} is not an integer", n),
                ));
            }
        }
        Some(_) => {
            return Err(RenderError::validation(
                Some(index),
                FIELD_START,
                "is of wrong type (expected integer)",
            ))
        }
    };

    Ok(ClipDescriptor::new(filename, start))
}

/// Reject start offsets beyond [`MAX_START`]
fn check_start(index: usize, start: usize) -> Result<usize> {
    if start > MAX_START {
        return Err(RenderError::validation(
            Some(index),
            FIELD_START,
            format!("{} exceeds the maximum of {}", start, MAX_START),
        ));
    }
    Ok(start)
}

/// A decoded clip pinned to its aligned start offset
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// File the clip was read from
    pub source: PathBuf,
    pub clip: DecodedClip,
    /// Start offset rounded down to a 4-sample boundary
    pub aligned_start: usize,
}

impl Placement {
    /// Place `clip` at `requested_start`, rounded down to the alignment boundary
    pub fn new(source: PathBuf, clip: DecodedClip, requested_start: usize) -> Self {
        Self {
            source,
            clip,
            aligned_start: align_start(requested_start),
        }
    }

    /// One past the last buffer index this placement writes
    pub fn end(&self) -> usize {
        self.aligned_start + self.clip.sample_count()
    }
}

/// All placements of one render call
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    placements: Vec<Placement>,
    total_length: usize,
}

impl Schedule {
    /// Decode every descriptor's clip and place it.
    ///
    /// With `parallel` set, clips are decoded on the rayon pool; all decodes
    /// finish before the schedule is returned, and the first failure in input
    /// order is reported either way.
    ///
    /// # Errors
    /// Any decode error for the first failing descriptor.
    pub fn build(
        descriptors: &[ClipDescriptor],
        decoder: &ClipDecoder,
        parallel: bool,
    ) -> Result<Self> {
        let placements: Vec<Placement> = if parallel {
            let results: Vec<Result<Placement>> = descriptors
                .par_iter()
                .enumerate()
                .map(|(index, descriptor)| Self::load(index, descriptor, decoder))
                .collect();
            results.into_iter().collect::<Result<_>>()?
        } else {
            descriptors
                .iter()
                .enumerate()
                .map(|(index, descriptor)| Self::load(index, descriptor, decoder))
                .collect::<Result<_>>()?
        };

        Ok(Self::from_placements(placements))
    }

    fn load(index: usize, descriptor: &ClipDescriptor, decoder: &ClipDecoder) -> Result<Placement> {
        let aligned = align_start(check_start(index, descriptor.start)?);
        info!("Reading {} starting at {}", descriptor.path.display(), aligned);

        let clip = decoder.decode(&descriptor.path)?;
        if aligned.checked_add(clip.sample_count()).is_none() {
            return Err(RenderError::validation(
                Some(index),
                FIELD_START,
                format!("{} places the clip past the end of the timeline", descriptor.start),
            ));
        }

        Ok(Placement::new(descriptor.path.clone(), clip, descriptor.start))
    }

    /// Build a schedule from already-decoded placements
    pub fn from_placements(placements: Vec<Placement>) -> Self {
        let total_length = required_length(&placements);
        Self {
            placements,
            total_length,
        }
    }

    /// Latest placement end, the mix buffer length
    pub fn total_length(&self) -> usize {
        self.total_length
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn into_placements(self) -> Vec<Placement> {
        self.placements
    }

    /// Source files in placement order
    pub fn sources(&self) -> impl Iterator<Item = &Path> {
        self.placements.iter().map(|p| p.source.as_path())
    }
}
