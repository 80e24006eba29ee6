//! Clip decoder for uncompressed RIFF/WAVE files
//!
//! Reads the whole file, validates the canonical header against the
//! configured format, and converts the 16-bit payload to normalized floats.
//!
//! The payload length comes from the header's declared `data` size, not from
//! the file size. Trailing bytes after the payload (e.g. LIST chunks) are
//! ignored; a file shorter than the declared payload is a short read.

use crate::audio::types::DecodedClip;
use crate::audio::wav::{WavHeader, HEADER_LEN};
use crate::config::{AudioFormat, RenderConfig};
use crate::error::{RenderError, Result};
use std::path::Path;
use tracing::debug;

/// Decoder for 16-bit PCM clip files.
///
/// Each sample is divided by the positive full scale (32767 by default), so
/// `i16::MIN` decodes slightly below -1.0.
#[derive(Debug, Clone)]
pub struct ClipDecoder {
    format: AudioFormat,
    full_scale: f32,
}

impl ClipDecoder {
    /// Create a decoder that accepts only `format`
    pub fn new(format: AudioFormat, full_scale: f32) -> Self {
        Self { format, full_scale }
    }

    /// Create a decoder from the render configuration
    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(config.format(), config.full_scale)
    }

    /// Format this decoder accepts
    pub fn format(&self) -> &AudioFormat {
        &self.format
    }

    /// Decode a clip file.
    ///
    /// # Errors
    /// - `RenderError::Io` if the file cannot be opened or read
    /// - `RenderError::ShortRead` if the file is shorter than its header declares
    /// - `RenderError::Format` if the header or audio format is not accepted,
    ///   including a payload that is not a whole number of frames
    pub fn decode(&self, path: &Path) -> Result<DecodedClip> {
        let bytes = std::fs::read(path).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        self.decode_bytes(path, &bytes)
    }

    /// Decode clip contents already in memory.
    ///
    /// `path` is only used for error messages.
    pub fn decode_bytes(&self, path: &Path, bytes: &[u8]) -> Result<DecodedClip> {
        let header = WavHeader::parse(bytes).ok_or_else(|| RenderError::ShortRead {
            path: path.to_path_buf(),
            expected: HEADER_LEN,
            actual: bytes.len(),
        })?;

        header
            .validate(&self.format)
            .map_err(|constraint| RenderError::format(path, constraint))?;

        let data_size = header.data_size as usize;
        let payload = &bytes[HEADER_LEN..];
        if payload.len() < data_size {
            return Err(RenderError::ShortRead {
                path: path.to_path_buf(),
                expected: HEADER_LEN + data_size,
                actual: bytes.len(),
            });
        }

        let samples: Vec<f32> = payload[..data_size]
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / self.full_scale)
            .collect();

        debug!(
            "Decoded {}: {} samples ({} frames)",
            path.display(),
            samples.len(),
            samples.len() / header.num_channels as usize
        );

        Ok(DecodedClip::new(
            samples,
            header.num_channels,
            header.sample_rate,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn decoder() -> ClipDecoder {
        ClipDecoder::from_config(&RenderConfig::default())
    }

    fn wav_bytes(samples: &[i16]) -> Vec<u8> {
        let format = RenderConfig::default().format();
        let data_size = (samples.len() * 2) as u32;
        let mut bytes = WavHeader::canonical(&format, data_size).to_bytes().to_vec();
        for s in samples {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_decode_bytes_normalizes() {
        let bytes = wav_bytes(&[0, 32767, -32767, 16384]);
        let clip = decoder()
            .decode_bytes(&PathBuf::from("mem.wav"), &bytes)
            .unwrap();

        assert_eq!(clip.sample_count(), 4);
        assert_eq!(clip.channels, 2);
        assert_eq!(clip.samples[0], 0.0);
        assert_eq!(clip.samples[1], 1.0);
        assert_eq!(clip.samples[2], -1.0);
        assert!((clip.samples[3] - 0.5).abs() < 1.0 / 32767.0);
    }

    #[test]
    fn test_min_value_exceeds_negative_one() {
        let bytes = wav_bytes(&[i16::MIN, 0]);
        let clip = decoder()
            .decode_bytes(&PathBuf::from("mem.wav"), &bytes)
            .unwrap();

        assert!(clip.samples[0] < -1.0);
    }

    #[test]
    fn test_payload_length_from_header_not_file() {
        let mut bytes = wav_bytes(&[1, 2, 3, 4]);
        // Trailing chunk after the declared payload is ignored
        bytes.extend_from_slice(b"LIST\x04\x00\x00\x00abcd");

        let clip = decoder()
            .decode_bytes(&PathBuf::from("mem.wav"), &bytes)
            .unwrap();
        assert_eq!(clip.sample_count(), 4);
    }

    #[test]
    fn test_truncated_payload_is_short_read() {
        let mut bytes = wav_bytes(&[1, 2, 3, 4]);
        bytes.truncate(bytes.len() - 3);

        let err = decoder()
            .decode_bytes(&PathBuf::from("mem.wav"), &bytes)
            .unwrap_err();
        match err {
            RenderError::ShortRead {
                expected, actual, ..
            } => {
                assert_eq!(expected, HEADER_LEN + 8);
                assert_eq!(actual, HEADER_LEN + 5);
            }
            other => panic!("Expected ShortRead, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_header_is_short_read() {
        let err = decoder()
            .decode_bytes(&PathBuf::from("mem.wav"), b"RIFF")
            .unwrap_err();
        assert!(matches!(err, RenderError::ShortRead { expected: HEADER_LEN, actual: 4, .. }));
    }

    #[test]
    fn test_odd_data_size_is_format_error() {
        let mut bytes = wav_bytes(&[1, 2]);
        // Declare 5 payload bytes and supply them
        bytes[40..44].copy_from_slice(&5u32.to_le_bytes());
        bytes.push(0x7F);

        let err = decoder()
            .decode_bytes(&PathBuf::from("odd.wav"), &bytes)
            .unwrap_err();
        match err {
            RenderError::Format { constraint, .. } => {
                assert!(constraint.contains("block align"), "{}", constraint)
            }
            other => panic!("Expected Format, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_payload() {
        let bytes = wav_bytes(&[]);
        let clip = decoder()
            .decode_bytes(&PathBuf::from("mem.wav"), &bytes)
            .unwrap();
        assert!(clip.is_empty());
    }
}
