//! Key profile templates
//!
//! Defines tonal profiles for 24 keys (12 major + 12 minor). Each base
//! profile is indexed by scale degree from the tonic; the profile for tonic
//! `n` is the base profile rotated right by `n` semitones.
//!
//! # References
//!
//! Krumhansl, C. L., & Kessler, E. J. (1982). Tracing the Dynamic Changes in Perceived
//! Tonal Organization in a Spatial Representation of Musical Keys. *Psychological Review*,
//! 89(4), 334-368.
//!
//! Temperley, D. (1999). What's Key for Key? The Krumhansl-Schmuckler Key-Finding
//! Algorithm Reconsidered. *Music Perception*, 17(1), 65-100.

use serde::{Deserialize, Serialize};

/// Krumhansl-Kessler major profile (probe-tone ratings)
pub const KK_MAJOR: [f32; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// Krumhansl-Kessler minor profile (probe-tone ratings)
pub const KK_MINOR: [f32; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

/// Temperley major profile
pub const TEMPERLEY_MAJOR: [f32; 12] = [
    5.0, 2.0, 3.5, 2.0, 4.5, 4.0, 2.0, 4.5, 2.0, 3.5, 1.5, 4.0,
];

/// Temperley minor profile
pub const TEMPERLEY_MINOR: [f32; 12] = [
    5.0, 2.0, 3.5, 4.5, 2.0, 4.0, 2.0, 4.5, 3.5, 2.0, 1.5, 4.0,
];

/// Which pair of reference profiles to correlate against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateSet {
    /// Krumhansl-Kessler (1982)
    KrumhanslKessler,
    /// Temperley (1999)
    Temperley,
}

/// Rotate a profile so that scale degree 0 lands on pitch class `tonic`
///
/// `rolled[i] = profile[(i - tonic) mod 12]`
pub fn rotate_profile(profile: &[f32; 12], tonic: usize) -> [f32; 12] {
    std::array::from_fn(|i| profile[(i + 12 - tonic % 12) % 12])
}

/// Key templates for all 24 keys
#[derive(Debug, Clone, PartialEq)]
pub struct KeyTemplates {
    /// Major key templates (12 keys: C, C#, D, ..., B)
    pub major: [[f32; 12]; 12],

    /// Minor key templates (12 keys: C, C#, D, ..., B)
    pub minor: [[f32; 12]; 12],
}

impl KeyTemplates {
    /// Create new key templates with Krumhansl-Kessler profiles
    pub fn new() -> Self {
        Self::from_set(TemplateSet::KrumhanslKessler)
    }

    /// Create templates from a profile set
    pub fn from_set(set: TemplateSet) -> Self {
        let (major, minor) = match set {
            TemplateSet::KrumhanslKessler => (KK_MAJOR, KK_MINOR),
            TemplateSet::Temperley => (TEMPERLEY_MAJOR, TEMPERLEY_MINOR),
        };
        Self::from_profiles(&major, &minor)
    }

    /// Create templates from arbitrary base profiles
    pub fn from_profiles(major: &[f32; 12], minor: &[f32; 12]) -> Self {
        Self {
            major: std::array::from_fn(|tonic| rotate_profile(major, tonic)),
            minor: std::array::from_fn(|tonic| rotate_profile(minor, tonic)),
        }
    }
}

impl Default for KeyTemplates {
    fn default() -> Self {
        Self::new()
    }
}
