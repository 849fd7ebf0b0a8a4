//! Audio I/O modules
//!
//! Audio decoding using Symphonia and fixed-length windowing.

pub mod decoder;
pub mod sample_buffer;

pub use decoder::{decode_audio, decode_bytes, DecodedAudio};
pub use sample_buffer::{SampleWindow, SampleWindows};
