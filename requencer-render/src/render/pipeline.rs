//! Render orchestration
//!
//! One render call moves through these stages:
//!
//! ```text
//! Idle -> ClipsLoading -> BufferSized -> Mixing -> Quantizing -> Encoding -> Done
//!              \______________\______________\__________\___________\-> Failed
//! ```
//!
//! Every clip is decoded before the mix buffer is sized, so the buffer is
//! allocated exactly once. The compressed stream is written to a temporary
//! file next to the destination and moved into place only when encoding
//! succeeds; a failed render never leaves a partial output behind.

use crate::audio::ClipDecoder;
use crate::config::RenderConfig;
use crate::error::{RenderError, Result};
use crate::render::encode::{AudioEncoder, EncodePump, EncodeStats, EncoderSettings};
use crate::render::mix::MixBuffer;
use crate::render::quantize::{quantize, Quantized};
use crate::render::schedule::{ClipDescriptor, Schedule};
use requencer_common::human_time::format_samples;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Render lifecycle stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// No render started yet
    Idle,
    /// Decoding clip files
    ClipsLoading,
    /// Mix buffer allocated at its final length
    BufferSized,
    /// Summing placements into the buffer
    Mixing,
    /// Converting floats to 16-bit PCM
    Quantizing,
    /// Streaming PCM through the encoder
    Encoding,
    /// Output written
    Done,
    /// Last render stopped on an error
    Failed,
}

impl fmt::Display for RenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderState::Idle => write!(f, "Idle"),
            RenderState::ClipsLoading => write!(f, "ClipsLoading"),
            RenderState::BufferSized => write!(f, "BufferSized"),
            RenderState::Mixing => write!(f, "Mixing"),
            RenderState::Quantizing => write!(f, "Quantizing"),
            RenderState::Encoding => write!(f, "Encoding"),
            RenderState::Done => write!(f, "Done"),
            RenderState::Failed => write!(f, "Failed"),
        }
    }
}

/// Outcome of a successful render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderReport {
    /// Number of clips mixed
    pub clips: usize,
    /// Output length in interleaved samples
    pub total_samples: usize,
    /// Samples outside the 16-bit range before the clip policy was applied
    pub overflowed: usize,
    pub encode: EncodeStats,
}

/// Logs elapsed time per stage at debug level
struct StageTimer {
    started: Instant,
    last: Instant,
}

impl StageTimer {
    fn new() -> Self {
        let now = Instant::now();
        Self {
            started: now,
            last: now,
        }
    }

    fn mark(&mut self, stage: RenderState) {
        let now = Instant::now();
        debug!(
            "{} reached after {:.2}ms (total {:.2}ms)",
            stage,
            now.duration_since(self.last).as_secs_f64() * 1000.0,
            now.duration_since(self.started).as_secs_f64() * 1000.0
        );
        self.last = now;
    }
}

/// Mix-and-encode pipeline with an injected encoder
pub struct RenderPipeline<E: AudioEncoder> {
    config: RenderConfig,
    encoder: E,
    state: RenderState,
}

impl<E: AudioEncoder> RenderPipeline<E> {
    /// Create a pipeline.
    ///
    /// # Errors
    /// `RenderError::Config` if `config` fails validation.
    pub fn new(config: RenderConfig, encoder: E) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            encoder,
            state: RenderState::Idle,
        })
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Render `clips` into the file at `dest`.
    ///
    /// An existing file at `dest` is replaced only if the whole render
    /// succeeds.
    ///
    /// # Errors
    /// The first error from any stage. The destination is left untouched.
    pub fn render(&mut self, dest: &Path, clips: &[ClipDescriptor]) -> Result<RenderReport> {
        let result = self.render_file(dest, clips);
        self.finish(result)
    }

    /// Render `clips` into an arbitrary sink.
    ///
    /// Bytes already written before a failure stay in the sink.
    pub fn render_to_writer<W: Write>(
        &mut self,
        sink: &mut W,
        clips: &[ClipDescriptor],
    ) -> Result<RenderReport> {
        let mut timer = StageTimer::new();
        let result = self
            .prepare(clips, &mut timer)
            .and_then(|prepared| self.encode(prepared, sink, &mut timer));
        self.finish(result)
    }

    fn finish(&mut self, result: Result<RenderReport>) -> Result<RenderReport> {
        match &result {
            Ok(report) => {
                self.state = RenderState::Done;
                info!(
                    "Render complete: {} clips, {} samples, {} bytes",
                    report.clips, report.total_samples, report.encode.bytes_written
                );
            }
            Err(e) => {
                warn!("Render failed during {}: {}", self.state, e);
                self.state = RenderState::Failed;
            }
        }
        result
    }

    fn render_file(&mut self, dest: &Path, clips: &[ClipDescriptor]) -> Result<RenderReport> {
        let mut timer = StageTimer::new();
        let prepared = self.prepare(clips, &mut timer)?;

        let dir = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut builder = tempfile::Builder::new();
        builder.prefix(".requencer-").suffix(".part");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            // Subject to the process umask, like a freshly created file
            builder.permissions(std::fs::Permissions::from_mode(0o666));
        }
        let mut staging = builder
            .tempfile_in(&dir)
            .map_err(|source| RenderError::Io { path: dir, source })?;

        let report = {
            let mut writer = BufWriter::new(staging.as_file_mut());
            self.encode(prepared, &mut writer, &mut timer)?
        };

        let io_err = |source: std::io::Error| RenderError::Io {
            path: staging.path().to_path_buf(),
            source,
        };
        inherit_attributes(staging.as_file(), dest).map_err(io_err)?;
        staging.as_file().sync_all().map_err(io_err)?;

        staging.persist(dest).map_err(|e| RenderError::Io {
            path: dest.to_path_buf(),
            source: e.error,
        })?;
        debug!("Output moved into place at {}", dest.display());

        Ok(report)
    }

    /// Decode, mix, and quantize
    fn prepare(&mut self, clips: &[ClipDescriptor], timer: &mut StageTimer) -> Result<Prepared> {
        info!("Rendering {} clips", clips.len());

        self.state = RenderState::ClipsLoading;
        let decoder = ClipDecoder::from_config(&self.config);
        let schedule = Schedule::build(clips, &decoder, self.config.parallel_decode)?;
        timer.mark(self.state);

        self.state = RenderState::BufferSized;
        let total_samples = schedule.total_length();
        let mut buffer = MixBuffer::with_length(total_samples)?;
        info!(
            "File length {} samples ({})",
            total_samples,
            format_samples(total_samples, self.config.sample_rate, self.config.channels)
        );
        timer.mark(self.state);

        self.state = RenderState::Mixing;
        let clip_count = schedule.len();
        for placement in schedule.into_placements() {
            buffer.accumulate(&placement)?;
        }
        timer.mark(self.state);

        self.state = RenderState::Quantizing;
        let mixed = buffer.into_f32();
        let quantized = quantize(&mixed, self.config.full_scale, self.config.clip_policy);
        drop(mixed);
        timer.mark(self.state);

        Ok(Prepared {
            clips: clip_count,
            quantized,
        })
    }

    fn encode<W: Write>(
        &mut self,
        prepared: Prepared,
        sink: &mut W,
        timer: &mut StageTimer,
    ) -> Result<RenderReport> {
        self.state = RenderState::Encoding;
        let settings = EncoderSettings::from(&self.config);
        let pump = EncodePump::new(&self.encoder, settings);
        let stats = pump.encode(&prepared.quantized.pcm, sink)?;
        timer.mark(self.state);

        Ok(RenderReport {
            clips: prepared.clips,
            total_samples: prepared.quantized.pcm.len(),
            overflowed: prepared.quantized.overflowed,
            encode: stats,
        })
    }
}

/// Give the staged output the mode and owner of the file it replaces.
///
/// Nothing to do when `dest` does not exist yet. Changing the owner needs
/// privileges the process may lack; that failure is logged and ignored.
fn inherit_attributes(staged: &File, dest: &Path) -> std::io::Result<()> {
    let existing = match std::fs::metadata(dest) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    staged.set_permissions(existing.permissions())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        let (uid, gid) = (existing.uid(), existing.gid());
        if let Err(e) = std::os::unix::fs::fchown(staged, Some(uid), Some(gid)) {
            debug!("Keeping default owner for {}: {}", dest.display(), e);
        }
    }

    Ok(())
}

/// Quantized mix waiting for the encoder
struct Prepared {
    clips: usize,
    quantized: Quantized,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::encode::EncoderSession;

    /// Writes the raw little-endian PCM back out
    struct PassthroughEncoder;

    struct PassthroughSession;

    impl AudioEncoder for PassthroughEncoder {
        type Session = PassthroughSession;

        fn open(&self, _settings: &EncoderSettings) -> Result<PassthroughSession> {
            Ok(PassthroughSession)
        }

        fn extension(&self) -> &'static str {
            "pcm"
        }
    }

    impl EncoderSession for PassthroughSession {
        fn feed(&mut self, pcm: &[i16]) -> Result<Vec<u8>> {
            Ok(pcm.iter().flat_map(|s| s.to_le_bytes()).collect())
        }

        fn flush(&mut self) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_new_validates_config() {
        let config = RenderConfig {
            channels: 0,
            ..Default::default()
        };
        assert!(RenderPipeline::new(config, PassthroughEncoder).is_err());
    }

    #[test]
    fn test_empty_render_reaches_done() {
        let mut pipeline = RenderPipeline::new(RenderConfig::default(), PassthroughEncoder).unwrap();
        assert_eq!(pipeline.state(), RenderState::Idle);

        let mut out = Vec::new();
        let report = pipeline.render_to_writer(&mut out, &[]).unwrap();

        assert_eq!(pipeline.state(), RenderState::Done);
        assert_eq!(report.total_samples, 0);
        assert_eq!(report.encode.chunks, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_missing_clip_fails_while_loading() {
        let mut pipeline = RenderPipeline::new(RenderConfig::default(), PassthroughEncoder).unwrap();
        let clips = vec![ClipDescriptor::new("/nonexistent/requencer/clip.wav", 0)];

        let err = pipeline.render_to_writer(&mut Vec::new(), &clips).unwrap_err();

        assert!(matches!(err, RenderError::Io { .. }));
        assert_eq!(pipeline.state(), RenderState::Failed);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(RenderState::BufferSized.to_string(), "BufferSized");
        assert_eq!(RenderState::Failed.to_string(), "Failed");
    }
}
