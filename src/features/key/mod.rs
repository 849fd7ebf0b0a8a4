//! Key detection modules
//!
//! Detect the local key of an analysis window using:
//! - Krumhansl-Kessler (or Temperley) templates (24 keys)
//! - Pearson correlation against every rotation

pub mod detector;
pub mod templates;

pub use detector::{detect_window_key, pearson_correlation, score_all_keys, KeyScore};
pub use templates::{KeyTemplates, TemplateSet};
