//! Chroma extraction modules
//!
//! Extract pitch-class distribution (12 semitones) from audio:
//! - Tuning-aware chroma vector computation
//! - Normalization strategies

pub mod extractor;
pub mod normalization;

pub use extractor::{ChromaExtractor, ChromaParams};
