//! Clip loading: RIFF/WAVE parsing and PCM-to-float conversion

pub mod decoder;
pub mod types;
pub mod wav;

pub use decoder::ClipDecoder;
pub use types::DecodedClip;
pub use wav::WavHeader;
