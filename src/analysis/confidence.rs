//! Confidence scoring module
//!
//! Turns the resolved vote into a single 0-100 musical score and maps it to a
//! qualitative tier.
//!
//! # Score
//!
//! `score = clamp(purity * w_purity + mean_confidence * w_confidence + bonus, 0, 100)`
//!
//! where purity is the percentage of windows labelled with the recommended
//! key, mean confidence is that key's mean correlation percentage, and bonus
//! is the sum of music-theory bonuses that applied. The result is truncated to
//! an integer.

use super::result::ConfidenceTier;
use crate::config::AnalysisConfig;

/// Final musical score (0-100)
///
/// # Example
///
/// ```
/// use tonic_dsp::analysis::confidence::musical_score;
/// use tonic_dsp::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(musical_score(100.0, 87.5, 0.0, &config), 92);
/// assert_eq!(musical_score(100.0, 95.0, 35.0, &config), 100);
/// ```
pub fn musical_score(purity: f32, mean_confidence: f32, bonus: f32, config: &AnalysisConfig) -> u8 {
    let raw = purity * config.purity_weight + mean_confidence * config.confidence_weight + bonus;
    if !raw.is_finite() {
        return 0;
    }
    raw.clamp(0.0, 100.0) as u8
}

/// Tier for a musical score
///
/// Scores strictly above `tier_high_threshold` are [`ConfidenceTier::Indisputable`],
/// strictly above `tier_medium_threshold` are [`ConfidenceTier::VeryReliable`],
/// anything else is [`ConfidenceTier::Complex`].
pub fn confidence_tier(score: u8, config: &AnalysisConfig) -> ConfidenceTier {
    let score = score as f32;
    if score > config.tier_high_threshold {
        ConfidenceTier::Indisputable
    } else if score > config.tier_medium_threshold {
        ConfidenceTier::VeryReliable
    } else {
        ConfidenceTier::Complex
    }
}

/// Energy proxy (1-10) derived from the musical score
pub fn energy_level(score: u8) -> u8 {
    (score / 10).clamp(1, 10)
}
