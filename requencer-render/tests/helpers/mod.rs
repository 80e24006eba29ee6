//! Shared fixtures for requencer-render integration tests
//!
//! - `audio_generator`: WAV clip files written with hound
//! - `fake_encoder`: recording `AudioEncoder` with failure injection

#![allow(dead_code)]

pub mod audio_generator;
pub mod fake_encoder;

pub use audio_generator::{
    write_bad_magic, write_constant_wav, write_pattern_wav, write_sine_wav, write_wav_with_spec,
    CLIP_SPEC,
};
pub use fake_encoder::{EncoderEvent, FakeEncoder};
