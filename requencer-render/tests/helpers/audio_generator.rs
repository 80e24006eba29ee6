//! WAV clip generation for integration tests
//!
//! All clips default to the render format (44.1 kHz, stereo, 16-bit PCM) and
//! are written by hound, which emits the canonical 44-byte header for this
//! format.

use hound::{SampleFormat, WavSpec, WavWriter};
use std::f32::consts::PI;
use std::path::Path;

/// Render format clip spec
pub const CLIP_SPEC: WavSpec = WavSpec {
    channels: 2,
    sample_rate: 44100,
    bits_per_sample: 16,
    sample_format: SampleFormat::Int,
};

/// Write interleaved `samples` as a stereo 16-bit clip
pub fn write_pattern_wav<P: AsRef<Path>>(path: P, samples: &[i16]) -> Result<(), hound::Error> {
    let mut writer = WavWriter::create(path, CLIP_SPEC)?;
    for &s in samples {
        writer.write_sample(s)?;
    }
    writer.finalize()
}

/// Write `sample_count` interleaved samples all equal to `value`
pub fn write_constant_wav<P: AsRef<Path>>(
    path: P,
    sample_count: usize,
    value: i16,
) -> Result<(), hound::Error> {
    write_pattern_wav(path, &vec![value; sample_count])
}

/// Write a stereo sine tone
///
/// # Arguments
/// * `frames` - Number of stereo frames
/// * `frequency_hz` - Tone frequency
/// * `amplitude` - Peak level, 0.0-1.0
pub fn write_sine_wav<P: AsRef<Path>>(
    path: P,
    frames: usize,
    frequency_hz: f32,
    amplitude: f32,
) -> Result<(), hound::Error> {
    let mut writer = WavWriter::create(path, CLIP_SPEC)?;
    let peak = amplitude * i16::MAX as f32;

    for frame in 0..frames {
        let t = frame as f32 / CLIP_SPEC.sample_rate as f32;
        let s = ((2.0 * PI * frequency_hz * t).sin() * peak) as i16;
        writer.write_sample(s)?;
        writer.write_sample(s)?;
    }
    writer.finalize()
}

/// Write a clip in an arbitrary integer format (8- or 16-bit)
pub fn write_wav_with_spec<P: AsRef<Path>>(
    path: P,
    spec: WavSpec,
    sample_count: usize,
) -> Result<(), hound::Error> {
    let mut writer = WavWriter::create(path, spec)?;
    for i in 0..sample_count {
        match spec.bits_per_sample {
            8 => writer.write_sample((i % 100) as i8)?,
            _ => writer.write_sample((i % 1000) as i16)?,
        }
    }
    writer.finalize()
}

/// Write a 44-byte header whose RIFF tag is wrong, followed by a short payload
pub fn write_bad_magic<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
    let mut bytes = Vec::with_capacity(52);
    bytes.extend_from_slice(b"RIFX");
    bytes.extend_from_slice(&44u32.to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&44100u32.to_le_bytes());
    bytes.extend_from_slice(&176_400u32.to_le_bytes());
    bytes.extend_from_slice(&4u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&8u32.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 8]);
    std::fs::write(path, bytes)
}
