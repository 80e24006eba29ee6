//! MP3 encoder backed by LAME (via the `mp3lame-encoder` crate)

use crate::error::{RenderError, Result};
use crate::render::encode::{AudioEncoder, EncoderSession, EncoderSettings};
use mp3lame_encoder::{Bitrate, Builder, DualPcm, Encoder, FlushNoGap, Quality, VbrMode};
use tracing::debug;

/// Bytes reserved for the final flush
const FLUSH_RESERVE: usize = 7200;

/// LAME-backed [`AudioEncoder`]
#[derive(Debug, Clone, Copy, Default)]
pub struct LameEncoder;

impl LameEncoder {
    pub fn new() -> Self {
        Self
    }
}

/// Map algorithm quality 0-9 onto LAME's quality presets
fn lame_quality(quality: u8) -> Quality {
    match quality {
        0 => Quality::Best,
        1 => Quality::SecondBest,
        2 => Quality::NearBest,
        3 => Quality::VeryNice,
        4 => Quality::Nice,
        5 => Quality::Good,
        6 => Quality::Decent,
        7 => Quality::Ok,
        8 => Quality::SecondWorst,
        _ => Quality::Worst,
    }
}

/// Round a requested bitrate to the nearest supported step at or below it
fn lame_bitrate(kbps: u32) -> Bitrate {
    match kbps {
        0..=111 => Bitrate::Kbps96,
        112..=127 => Bitrate::Kbps112,
        128..=159 => Bitrate::Kbps128,
        160..=191 => Bitrate::Kbps160,
        192..=223 => Bitrate::Kbps192,
        224..=255 => Bitrate::Kbps224,
        256..=319 => Bitrate::Kbps256,
        _ => Bitrate::Kbps320,
    }
}

fn encode_err(what: &str, e: impl std::fmt::Debug) -> RenderError {
    RenderError::Encode(format!("LAME {} failed: {:?}", what, e))
}

impl AudioEncoder for LameEncoder {
    type Session = LameSession;

    fn open(&self, settings: &EncoderSettings) -> Result<LameSession> {
        let channels = u8::try_from(settings.channels)
            .ok()
            .filter(|c| (1..=2).contains(c))
            .ok_or_else(|| {
                RenderError::Encode(format!(
                    "LAME supports 1 or 2 channels, got {}",
                    settings.channels
                ))
            })?;

        let mut builder = Builder::new()
            .ok_or_else(|| RenderError::Encode("LAME encoder init failed".to_string()))?;

        builder
            .set_num_channels(channels)
            .map_err(|e| encode_err("set channels", e))?;
        builder
            .set_sample_rate(settings.sample_rate)
            .map_err(|e| encode_err("set sample rate", e))?;

        if settings.vbr {
            builder
                .set_vbr_mode(VbrMode::Mtrh)
                .map_err(|e| encode_err("set VBR mode", e))?;
        } else {
            builder
                .set_brate(lame_bitrate(settings.bitrate_kbps))
                .map_err(|e| encode_err("set bitrate", e))?;
        }

        builder
            .set_quality(lame_quality(settings.quality))
            .map_err(|e| encode_err("set quality", e))?;

        let encoder = builder.build().map_err(|e| encode_err("build", e))?;

        debug!(
            "LAME session opened: {} Hz, {} ch, {}, quality {}",
            settings.sample_rate,
            channels,
            if settings.vbr {
                "VBR".to_string()
            } else {
                format!("CBR {} kbps", settings.bitrate_kbps)
            },
            settings.quality
        );

        Ok(LameSession {
            encoder,
            channels: channels as usize,
            left: Vec::with_capacity(settings.chunk_frames),
            right: Vec::with_capacity(settings.chunk_frames),
        })
    }

    fn extension(&self) -> &'static str {
        "mp3"
    }
}

/// One LAME encode. The native context is freed when the session drops.
pub struct LameSession {
    encoder: Encoder,
    channels: usize,
    left: Vec<i16>,
    right: Vec<i16>,
}

impl LameSession {
    /// Split interleaved PCM into the per-channel scratch buffers.
    /// A dangling sample of an incomplete stereo frame is paired with silence.
    fn deinterleave(&mut self, pcm: &[i16]) {
        self.left.clear();
        self.right.clear();

        if self.channels == 1 {
            self.left.extend_from_slice(pcm);
            self.right.extend_from_slice(pcm);
            return;
        }

        for frame in pcm.chunks(2) {
            self.left.push(frame[0]);
            self.right.push(frame.get(1).copied().unwrap_or(0));
        }
    }
}

impl EncoderSession for LameSession {
    fn feed(&mut self, pcm: &[i16]) -> Result<Vec<u8>> {
        self.deinterleave(pcm);

        let frames = self.left.len();
        let mut output: Vec<u8> =
            Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(frames));

        let input = DualPcm {
            left: &self.left,
            right: &self.right,
        };
        let encoded = self
            .encoder
            .encode(input, output.spare_capacity_mut())
            .map_err(|e| encode_err("encode", e))?;

        // SAFETY: the encoder initialized `encoded` bytes of spare capacity
        unsafe {
            output.set_len(encoded);
        }
        Ok(output)
    }

    fn flush(&mut self) -> Result<Vec<u8>> {
        let mut output: Vec<u8> = Vec::with_capacity(FLUSH_RESERVE);
        let flushed = self
            .encoder
            .flush::<FlushNoGap>(output.spare_capacity_mut())
            .map_err(|e| encode_err("flush", e))?;

        // SAFETY: the encoder initialized `flushed` bytes of spare capacity
        unsafe {
            output.set_len(flushed);
        }
        Ok(output)
    }
}
