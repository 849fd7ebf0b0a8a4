//! Key-profile correlation
//!
//! Scores a window's chroma vector against the 24 rotated key profiles with
//! Pearson correlation and picks the best match.
//!
//! Candidates are scanned mode-outer (major first), tonic-inner (C to B).
//! Only a strictly greater score replaces the current best, so on exact ties
//! the earlier candidate in that order wins.
//!
//! # Reference
//!
//! Krumhansl, C. L. (1990). *Cognitive Foundations of Musical Pitch*.
//! Oxford University Press. (Krumhansl-Schmuckler key-finding algorithm)

use super::templates::KeyTemplates;
use crate::analysis::result::{KeyLabel, Mode};

const EPSILON: f64 = 1e-12;

/// Correlation of one candidate key
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyScore {
    /// Candidate key
    pub key: KeyLabel,

    /// Pearson correlation in [-1.0, 1.0]
    pub score: f32,
}

/// Pearson correlation coefficient of two 12-bin vectors
///
/// Returns `None` if either vector has zero variance.
///
/// ```
/// use tonic_dsp::features::key::detector::pearson_correlation;
///
/// let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
/// let r = pearson_correlation(&a, &a).unwrap();
/// assert!((r - 1.0).abs() < 1e-6);
/// assert!(pearson_correlation(&a, &[1.0; 12]).is_none());
/// ```
pub fn pearson_correlation(a: &[f32; 12], b: &[f32; 12]) -> Option<f32> {
    let mean_a = a.iter().map(|&v| v as f64).sum::<f64>() / 12.0;
    let mean_b = b.iter().map(|&v| v as f64).sum::<f64>() / 12.0;

    let mut cov = 0.0f64;
    let mut var_a = 0.0f64;
    let mut var_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let dx = x as f64 - mean_a;
        let dy = y as f64 - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a < EPSILON || var_b < EPSILON {
        return None;
    }
    Some((cov / (var_a.sqrt() * var_b.sqrt())).clamp(-1.0, 1.0) as f32)
}

/// Correlate a chroma vector against all 24 keys, in scan order
///
/// Returns an empty vector for a flat (zero-variance) chroma.
pub fn score_all_keys(chroma: &[f32; 12], templates: &KeyTemplates) -> Vec<KeyScore> {
    let mut scores = Vec::with_capacity(24);
    for (mode, profiles) in [(Mode::Major, &templates.major), (Mode::Minor, &templates.minor)] {
        for (tonic, profile) in profiles.iter().enumerate() {
            match pearson_correlation(chroma, profile) {
                Some(score) => scores.push(KeyScore {
                    key: KeyLabel::new(tonic as u32, mode),
                    score,
                }),
                None => return Vec::new(),
            }
        }
    }
    scores
}

/// First maximum of a score list
fn first_best(scores: &[KeyScore]) -> Option<KeyScore> {
    let mut best: Option<KeyScore> = None;
    for s in scores {
        match best {
            Some(b) if s.score <= b.score => {}
            _ => best = Some(*s),
        }
    }
    best
}

/// Best-correlating key for one chroma vector
///
/// Returns `None` when the chroma carries no tonal information (flat vector).
pub fn detect_window_key(chroma: &[f32; 12], templates: &KeyTemplates) -> Option<KeyScore> {
    first_best(&score_all_keys(chroma, templates))
}
