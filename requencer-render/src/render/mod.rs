//! Mixing, quantization, and encoding

pub mod encode;
pub mod lame;
pub mod mix;
pub mod pipeline;
pub mod quantize;
pub mod schedule;

pub use encode::{AudioEncoder, EncodePump, EncodeStats, EncoderSession, EncoderSettings};
pub use lame::LameEncoder;
pub use mix::MixBuffer;
pub use pipeline::{RenderPipeline, RenderReport, RenderState};
pub use quantize::{quantize, ClipPolicy, Quantized};
pub use schedule::{parse_descriptors, ClipDescriptor, Placement, Schedule};
