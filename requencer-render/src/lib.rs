//! # Requencer rendering engine
//!
//! Mixes a list of 16-bit stereo WAV clips onto one timeline and encodes the
//! result as an MP3 file.
//!
//! **Pipeline:** validate descriptors → decode clips → size the mix buffer →
//! sum placements → quantize to 16-bit → stream through the encoder.
//!
//! ```no_run
//! use requencer_render::config::RenderConfig;
//! use requencer_render::render::{ClipDescriptor, LameEncoder, RenderPipeline};
//! use std::path::Path;
//!
//! # fn main() -> requencer_render::Result<()> {
//! let mut pipeline = RenderPipeline::new(RenderConfig::default(), LameEncoder::new())?;
//! pipeline.render(
//!     Path::new("out.mp3"),
//!     &[
//!         ClipDescriptor::new("kick.wav", 0),
//!         ClipDescriptor::new("snare.wav", 22_050),
//!     ],
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod render;

pub use error::{ErrorKind, RenderError, Result};
