//! Feature extraction modules
//!
//! This module contains all feature extraction algorithms:
//! - STFT / inverse STFT
//! - Tuning estimation
//! - Chroma extraction and per-window segmentation
//! - Key-profile correlation
//! - Tempo estimation

pub mod chroma;
pub mod key;
pub mod segments;
pub mod spectrum;
pub mod tempo;
pub mod tuning;
