//! Canonical 44-byte RIFF/WAVE PCM header
//!
//! Only the canonical layout is accepted: `fmt ` immediately after `WAVE`,
//! a 16-byte format chunk, and `data` immediately after it. Every field is
//! little-endian regardless of host byte order.

use crate::config::AudioFormat;

/// Size of the canonical PCM header in bytes
pub const HEADER_LEN: usize = 44;

/// "RIFF"
pub const RIFF_TAG: [u8; 4] = *b"RIFF";
/// "WAVE"
pub const WAVE_TAG: [u8; 4] = *b"WAVE";
/// "fmt "
pub const FMT_TAG: [u8; 4] = *b"fmt ";
/// "data"
pub const DATA_TAG: [u8; 4] = *b"data";

/// Linear PCM format code
pub const FORMAT_PCM: u16 = 1;

/// Parsed header fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub riff_tag: [u8; 4],
    /// File size minus 8
    pub chunk_size: u32,
    pub wave_tag: [u8; 4],
    pub fmt_tag: [u8; 4],
    /// 16 for PCM
    pub fmt_size: u32,
    pub audio_format: u16,
    pub num_channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_tag: [u8; 4],
    /// Payload length in bytes
    pub data_size: u32,
}

fn tag_at(bytes: &[u8], offset: usize) -> [u8; 4] {
    [
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ]
}

fn u16_at(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(tag_at(bytes, offset))
}

impl WavHeader {
    /// Read header fields from the start of `bytes`.
    ///
    /// Returns `None` if fewer than [`HEADER_LEN`] bytes are available.
    /// No validation happens here; see [`WavHeader::validate`].
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_LEN {
            return None;
        }

        Some(Self {
            riff_tag: tag_at(bytes, 0),
            chunk_size: u32_at(bytes, 4),
            wave_tag: tag_at(bytes, 8),
            fmt_tag: tag_at(bytes, 12),
            fmt_size: u32_at(bytes, 16),
            audio_format: u16_at(bytes, 20),
            num_channels: u16_at(bytes, 22),
            sample_rate: u32_at(bytes, 24),
            byte_rate: u32_at(bytes, 28),
            block_align: u16_at(bytes, 32),
            bits_per_sample: u16_at(bytes, 34),
            data_tag: tag_at(bytes, 36),
            data_size: u32_at(bytes, 40),
        })
    }

    /// Check container tags and audio format against `expected`.
    ///
    /// Returns a description of the first violated constraint.
    pub fn validate(&self, expected: &AudioFormat) -> Result<(), String> {
        for (name, found, wanted) in [
            ("RIFF", self.riff_tag, RIFF_TAG),
            ("WAVE", self.wave_tag, WAVE_TAG),
            ("fmt ", self.fmt_tag, FMT_TAG),
            ("data", self.data_tag, DATA_TAG),
        ] {
            if found != wanted {
                return Err(format!(
                    "bad RIFF header: expected '{}' tag, found {:?}",
                    name,
                    String::from_utf8_lossy(&found)
                ));
            }
        }

        if self.audio_format != FORMAT_PCM {
            return Err(format!(
                "format code {} is not uncompressed linear PCM",
                self.audio_format
            ));
        }
        if self.num_channels != expected.channels {
            return Err(format!(
                "{} channels (expected {})",
                self.num_channels, expected.channels
            ));
        }
        if self.sample_rate != expected.sample_rate {
            return Err(format!(
                "sample rate {} Hz (expected {} Hz)",
                self.sample_rate, expected.sample_rate
            ));
        }
        if self.bits_per_sample != expected.bits_per_sample {
            return Err(format!(
                "{}-bit samples (expected {}-bit)",
                self.bits_per_sample, expected.bits_per_sample
            ));
        }

        // Derived fields must agree with the declared layout
        let bytes_per_sample = (self.bits_per_sample / 8) as u32;
        let byte_rate = self.sample_rate as u64 * self.num_channels as u64 * bytes_per_sample as u64;
        if self.byte_rate as u64 != byte_rate {
            return Err(format!(
                "byte rate {} inconsistent with format (expected {})",
                self.byte_rate, byte_rate
            ));
        }
        let block_align = self.num_channels as u32 * bytes_per_sample;
        if self.block_align as u32 != block_align {
            return Err(format!(
                "block align {} inconsistent with format (expected {})",
                self.block_align, block_align
            ));
        }
        if self.data_size % block_align != 0 {
            return Err(format!(
                "data size {} is not a multiple of block align {}",
                self.data_size, block_align
            ));
        }

        Ok(())
    }

    /// Serialize back into the canonical 44-byte layout
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..4].copy_from_slice(&self.riff_tag);
        out[4..8].copy_from_slice(&self.chunk_size.to_le_bytes());
        out[8..12].copy_from_slice(&self.wave_tag);
        out[12..16].copy_from_slice(&self.fmt_tag);
        out[16..20].copy_from_slice(&self.fmt_size.to_le_bytes());
        out[20..22].copy_from_slice(&self.audio_format.to_le_bytes());
        out[22..24].copy_from_slice(&self.num_channels.to_le_bytes());
        out[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        out[28..32].copy_from_slice(&self.byte_rate.to_le_bytes());
        out[32..34].copy_from_slice(&self.block_align.to_le_bytes());
        out[34..36].copy_from_slice(&self.bits_per_sample.to_le_bytes());
        out[36..40].copy_from_slice(&self.data_tag);
        out[40..44].copy_from_slice(&self.data_size.to_le_bytes());
        out
    }

    /// Canonical PCM header for `format` with `data_size` payload bytes
    pub fn canonical(format: &AudioFormat, data_size: u32) -> Self {
        Self {
            riff_tag: RIFF_TAG,
            chunk_size: 36 + data_size,
            wave_tag: WAVE_TAG,
            fmt_tag: FMT_TAG,
            fmt_size: 16,
            audio_format: FORMAT_PCM,
            num_channels: format.channels,
            sample_rate: format.sample_rate,
            byte_rate: format.byte_rate(),
            block_align: format.block_align(),
            bits_per_sample: format.bits_per_sample,
            data_tag: DATA_TAG,
            data_size,
        }
    }
}
