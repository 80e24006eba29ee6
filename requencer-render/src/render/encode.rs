//! Encoder capability interface and the chunked encode pump
//!
//! The rendering core only knows the narrow streaming contract below, so any
//! codec (or a test double) can sit behind it:
//!
//! ```text
//! open(settings) -> session
//! session.feed(pcm chunk) -> encoded bytes
//! session.flush() -> remaining bytes
//! session.close()
//! ```
//!
//! The pump opens one session, submits the PCM in fixed-size chunks (the last
//! one may be short), flushes, and writes every byte to the sink. The session
//! is released on both the success and the failure path.

use crate::config::RenderConfig;
use crate::error::{RenderError, Result};
use std::io::{ErrorKind, Write};
use tracing::{debug, trace};

/// Parameters for one encoder session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderSettings {
    /// Input sample rate in Hz
    pub sample_rate: u32,
    /// Interleaved channel count
    pub channels: u16,
    /// Variable bitrate mode
    pub vbr: bool,
    /// Algorithm quality, 0 (best) to 9 (fastest)
    pub quality: u8,
    /// Constant bitrate when `vbr` is false
    pub bitrate_kbps: u32,
    /// Frames per `feed` call
    pub chunk_frames: usize,
}

impl EncoderSettings {
    /// Interleaved samples per `feed` call
    pub fn chunk_len(&self) -> usize {
        self.chunk_frames * self.channels as usize
    }
}

impl From<&RenderConfig> for EncoderSettings {
    fn from(config: &RenderConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            channels: config.channels,
            vbr: config.encoder.vbr,
            quality: config.encoder.quality,
            bitrate_kbps: config.encoder.bitrate_kbps,
            chunk_frames: config.encoder.chunk_frames,
        }
    }
}

/// Factory for encoder sessions
pub trait AudioEncoder {
    type Session: EncoderSession;

    /// Start a new session.
    ///
    /// # Errors
    /// `RenderError::Encode` if the encoder rejects the settings.
    fn open(&self, settings: &EncoderSettings) -> Result<Self::Session>;

    /// File extension of the produced stream
    fn extension(&self) -> &'static str;
}

/// One streaming encode
pub trait EncoderSession {
    /// Encode one chunk of interleaved PCM and return whatever output is ready.
    /// The output may be empty while the encoder buffers input.
    fn feed(&mut self, pcm: &[i16]) -> Result<Vec<u8>>;

    /// Drain buffered encoder state
    fn flush(&mut self) -> Result<Vec<u8>>;

    /// Release the session. Dropping a session must also release it.
    fn close(self) -> Result<()>
    where
        Self: Sized,
    {
        drop(self);
        Ok(())
    }
}

/// Summary of one encode run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeStats {
    /// Number of `feed` calls
    pub chunks: usize,
    /// Interleaved PCM samples submitted
    pub pcm_samples: usize,
    /// Bytes written to the sink, including the flush
    pub bytes_written: usize,
}

/// Streams quantized PCM through an encoder into a sink
pub struct EncodePump<'a, E: AudioEncoder> {
    encoder: &'a E,
    settings: EncoderSettings,
}

impl<'a, E: AudioEncoder> EncodePump<'a, E> {
    pub fn new(encoder: &'a E, settings: EncoderSettings) -> Self {
        Self { encoder, settings }
    }

    pub fn settings(&self) -> &EncoderSettings {
        &self.settings
    }

    /// Encode `pcm` and write the compressed stream to `sink`.
    ///
    /// # Errors
    /// - `RenderError::Encode` if the encoder rejects a chunk or the flush
    /// - `RenderError::ShortWrite` / `RenderError::Sink` if the sink fails
    pub fn encode<W: Write>(&self, pcm: &[i16], sink: &mut W) -> Result<EncodeStats> {
        if self.settings.chunk_len() == 0 {
            return Err(RenderError::Config(
                "encoder chunk size must be positive".to_string(),
            ));
        }

        let mut session = self.encoder.open(&self.settings)?;

        match self.pump(&mut session, pcm, sink) {
            Ok(stats) => {
                session.close()?;
                Ok(stats)
            }
            Err(e) => {
                drop(session);
                Err(e)
            }
        }
    }

    fn pump<W: Write>(
        &self,
        session: &mut E::Session,
        pcm: &[i16],
        sink: &mut W,
    ) -> Result<EncodeStats> {
        let mut stats = EncodeStats::default();

        for chunk in pcm.chunks(self.settings.chunk_len()) {
            let encoded = session.feed(chunk)?;
            write_fully(sink, &encoded)?;

            stats.chunks += 1;
            stats.pcm_samples += chunk.len();
            stats.bytes_written += encoded.len();
            trace!(
                "Chunk {}: {} samples -> {} bytes",
                stats.chunks,
                chunk.len(),
                encoded.len()
            );
        }

        let tail = session.flush()?;
        write_fully(sink, &tail)?;
        stats.bytes_written += tail.len();
        sink.flush()?;

        debug!(
            "Encoded {} samples in {} chunks, {} bytes",
            stats.pcm_samples, stats.chunks, stats.bytes_written
        );
        Ok(stats)
    }
}

/// Write all of `bytes`, reporting how far a short write got
fn write_fully<W: Write>(sink: &mut W, bytes: &[u8]) -> Result<()> {
    let mut written = 0;
    while written < bytes.len() {
        match sink.write(&bytes[written..]) {
            Ok(0) => {
                return Err(RenderError::ShortWrite {
                    expected: bytes.len(),
                    written,
                })
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(RenderError::Sink(e)),
        }
    }
    Ok(())
}
