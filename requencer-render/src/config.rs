//! Configuration management for the rendering engine
//!
//! Format constants that used to be compiled in (sample rate, channel count,
//! quantization full scale, encoder quality) live in an explicit
//! [`RenderConfig`] that is passed into the pipeline.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments ([`ConfigOverrides`])
//! 2. Environment variable `REQUENCER_CONFIG` (path to a TOML file)
//! 3. TOML configuration file in the user or system config directory
//! 4. Built-in defaults (code constants)
//!
//! # TOML layout
//!
//! ```toml
//! [render]
//! sample_rate = 44100
//! channels = 2
//! bits_per_sample = 16
//! full_scale = 32767.0
//! clip_policy = "wrap"        # or "saturate"
//! parallel_decode = false
//!
//! [render.encoder]
//! vbr = true
//! quality = 7
//! bitrate_kbps = 128          # used when vbr = false
//! chunk_frames = 4096
//!
//! [logging]
//! level = "info"
//! ```

use crate::error::{RenderError, Result};
use crate::render::quantize::ClipPolicy;
use requencer_common::config::{load_toml, resolve_config_file};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable naming a config file
pub const CONFIG_ENV_VAR: &str = "REQUENCER_CONFIG";

/// Standard input sample rate
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Standard channel count (interleaved stereo)
pub const DEFAULT_CHANNELS: u16 = 2;

/// Only 16-bit PCM is supported
pub const DEFAULT_BITS_PER_SAMPLE: u16 = 16;

/// Positive 16-bit full scale, used for both decode and quantization
pub const DEFAULT_FULL_SCALE: f32 = 32767.0;

/// LAME algorithm quality, 0 = best, 9 = worst
pub const DEFAULT_ENCODER_QUALITY: u8 = 7;

/// Frames per encoder call. LAME buffers internally in 1152-frame granules,
/// so any positive size works; 4096 keeps the output buffer small.
pub const DEFAULT_CHUNK_FRAMES: usize = 4096;

/// PCM layout of clip files and of the rendered stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl AudioFormat {
    /// Bytes per single-channel sample
    pub fn bytes_per_sample(&self) -> u16 {
        self.bits_per_sample / 8
    }

    /// Expected RIFF byte-rate field
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.channels as u32 * self.bytes_per_sample() as u32
    }

    /// Expected RIFF block-align field
    pub fn block_align(&self) -> u16 {
        self.channels * self.bytes_per_sample()
    }
}

/// Encoder settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Variable bitrate mode
    pub vbr: bool,
    /// Algorithm quality, 0 (best) to 9 (fastest)
    pub quality: u8,
    /// Constant bitrate, only used when `vbr` is false
    pub bitrate_kbps: u32,
    /// Frames submitted to the encoder per call
    pub chunk_frames: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            vbr: true,
            quality: DEFAULT_ENCODER_QUALITY,
            bitrate_kbps: 128,
            chunk_frames: DEFAULT_CHUNK_FRAMES,
        }
    }
}

/// Rendering configuration passed into the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    /// Float-to-integer conversion factor
    pub full_scale: f32,
    /// Overflow handling during quantization
    pub clip_policy: ClipPolicy,
    /// Decode clips on the rayon thread pool
    pub parallel_decode: bool,
    pub encoder: EncoderConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            bits_per_sample: DEFAULT_BITS_PER_SAMPLE,
            full_scale: DEFAULT_FULL_SCALE,
            clip_policy: ClipPolicy::default(),
            parallel_decode: false,
            encoder: EncoderConfig::default(),
        }
    }
}

impl RenderConfig {
    /// PCM format every clip must match
    pub fn format(&self) -> AudioFormat {
        AudioFormat {
            sample_rate: self.sample_rate,
            channels: self.channels,
            bits_per_sample: self.bits_per_sample,
        }
    }

    /// Check that the configuration is usable.
    ///
    /// # Errors
    /// Returns `RenderError::Config` naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(RenderError::Config("sample_rate must be positive".to_string()));
        }
        if !(1..=2).contains(&self.channels) {
            return Err(RenderError::Config(format!(
                "channels must be 1 or 2, got {}",
                self.channels
            )));
        }
        if self.bits_per_sample != 16 {
            return Err(RenderError::Config(format!(
                "only 16-bit PCM is supported, got {} bits",
                self.bits_per_sample
            )));
        }
        if !self.full_scale.is_finite() || self.full_scale <= 0.0 {
            return Err(RenderError::Config(format!(
                "full_scale must be a positive number, got {}",
                self.full_scale
            )));
        }
        if self.encoder.quality > 9 {
            return Err(RenderError::Config(format!(
                "encoder quality must be 0-9, got {}",
                self.encoder.quality
            )));
        }
        if self.encoder.chunk_frames == 0 {
            return Err(RenderError::Config("chunk_frames must be positive".to_string()));
        }
        Ok(())
    }

    /// Apply command-line overrides on top of file/default values
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(quality) = overrides.quality {
            self.encoder.quality = quality;
        }
        if let Some(vbr) = overrides.vbr {
            self.encoder.vbr = vbr;
        }
        if let Some(bitrate) = overrides.bitrate_kbps {
            self.encoder.bitrate_kbps = bitrate;
        }
        if let Some(policy) = overrides.clip_policy {
            self.clip_policy = policy;
        }
        if let Some(parallel) = overrides.parallel_decode {
            self.parallel_decode = parallel;
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration file contents
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub render: RenderConfig,
    pub logging: LoggingConfig,
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub quality: Option<u8>,
    pub vbr: Option<bool>,
    pub bitrate_kbps: Option<u32>,
    pub clip_policy: Option<ClipPolicy>,
    pub parallel_decode: Option<bool>,
    pub log_level: Option<String>,
}

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub render: RenderConfig,
    pub logging: LoggingConfig,
    /// File the settings were read from, if any
    pub source: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file (if any) and apply CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The selected TOML file cannot be read or parsed
    /// - The merged configuration fails [`RenderConfig::validate`]
    pub fn load(cli_path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let source = resolve_config_file(cli_path, CONFIG_ENV_VAR);

        let toml_config = match &source {
            Some(path) => load_toml::<TomlConfig>(path)?,
            None => TomlConfig::default(),
        };

        let mut render = toml_config.render;
        render.apply_overrides(overrides);
        render.validate()?;

        let mut logging = toml_config.logging;
        if let Some(level) = &overrides.log_level {
            logging.level = level.clone();
        }

        Ok(Config {
            render,
            logging,
            source,
        })
    }

    /// Log where settings came from
    pub fn log_summary(&self) {
        match &self.source {
            Some(path) => info!("Loaded configuration from {:?}", path),
            None => info!("No configuration file found, using built-in defaults"),
        }
        info!(
            "Render format: {} Hz, {} channels, {}-bit, clip policy {:?}, encoder {} quality {}",
            self.render.sample_rate,
            self.render.channels,
            self.render.bits_per_sample,
            self.render.clip_policy,
            if self.render.encoder.vbr { "VBR" } else { "CBR" },
            self.render.encoder.quality
        );
    }
}
