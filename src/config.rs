//! Configuration parameters for key and tempo analysis

use crate::error::AnalysisError;
use crate::features::key::templates::TemplateSet;
use serde::{Deserialize, Serialize};

/// Which side wins when the top-2 candidates are relative keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelativePreference {
    /// Prefer the minor key (Camelot side A)
    Minor,
    /// Prefer the major key (Camelot side B)
    Major,
}

/// Analysis configuration parameters
///
/// Every threshold and weight of the pipeline lives here with its reference
/// value as default. Deserializing a partial document fills the rest from
/// [`Default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // Segmentation
    /// Analysis window length in seconds (default: 10.0)
    /// Windows are consecutive and non-overlapping
    pub window_seconds: f32,

    /// Minimum length of a trailing partial window, as a fraction of
    /// `window_seconds` (default: 1.0, so partial tails are dropped)
    pub min_tail_fraction: f32,

    /// RMS energy gate (default: 0.01)
    /// Windows with RMS below this value contribute no observation
    pub min_window_rms: f32,

    // Band-pass
    /// Band-pass each window before chroma extraction (default: true)
    pub band_pass_enabled: bool,

    /// Band-pass lower edge in Hz (default: 60.0)
    pub band_pass_low_hz: f32,

    /// Band-pass upper edge in Hz (default: 1000.0)
    pub band_pass_high_hz: f32,

    // Harmonic/percussive separation
    /// Run HPSS and analyze only the harmonic part (default: true)
    pub hpss_enabled: bool,

    /// STFT frame size for HPSS (default: 2048)
    pub hpss_frame_size: usize,

    /// STFT hop size for HPSS (default: 512)
    pub hpss_hop_size: usize,

    /// Median filter length across time, in frames (default: 17)
    pub hpss_harmonic_kernel: usize,

    /// Median filter length across frequency, in bins (default: 17)
    pub hpss_percussive_kernel: usize,

    /// Soft mask exponent (default: 2.0)
    pub hpss_power: f32,

    // Tuning
    /// Estimate and compensate global tuning (default: true)
    pub tuning_enabled: bool,

    /// Tuning histogram resolution in semitones (default: 0.01)
    pub tuning_resolution: f32,

    /// Lowest frequency considered for tuning peaks (default: 150.0 Hz)
    pub tuning_fmin: f32,

    /// Highest frequency considered for tuning peaks (default: 4000.0 Hz)
    pub tuning_fmax: f32,

    // Chroma
    /// STFT frame size for chroma (default: 4096)
    pub chroma_frame_size: usize,

    /// STFT hop size for chroma (default: 2048)
    pub chroma_hop_size: usize,

    /// Lowest frequency mapped to chroma (default: 50.0 Hz)
    pub chroma_fmin: f32,

    /// Highest frequency mapped to chroma (default: 2000.0 Hz)
    pub chroma_fmax: f32,

    /// Enable soft chroma mapping (default: true)
    /// Soft mapping spreads frequency bins to neighboring semitones for robustness
    pub soft_chroma_mapping: bool,

    /// Soft mapping standard deviation in semitones (default: 0.35)
    /// Lower values = sharper mapping, higher values = more spread
    pub soft_mapping_sigma: f32,

    /// Chroma sharpening power (default: 1.0 = no sharpening)
    /// Power > 1.0 emphasizes prominent semitones
    pub chroma_sharpening_power: f32,

    // Key profiles
    /// Reference profiles used by the correlator (default: Krumhansl-Kessler)
    pub template_set: TemplateSet,

    // Voting and resolution
    /// Weight each window's vote by its RMS energy (default: true)
    /// When false every accepted window counts once
    pub weighted_votes: bool,

    /// Move dominant (V) major votes onto their minor tonic (default: true)
    pub dominant_redirect_enabled: bool,

    /// Multiplier applied to redirected vote weight (default: 1.5)
    pub dominant_redirect_weight: f32,

    /// Bonus when the top-2 candidates are relative keys (default: 20.0)
    pub relative_bonus: f32,

    /// Side preferred for a relative pair (default: Minor)
    pub relative_preference: RelativePreference,

    /// Bonus when the top-2 candidates form a V-I pair (default: 15.0)
    pub cadence_bonus: f32,

    /// Resolve a V-I pair to its tonic side (default: true)
    pub cadence_redirect: bool,

    /// Bonus when the top-2 candidates sit diagonally on the wheel (default: 20.0)
    pub diagonal_bonus: f32,

    /// Weight of purity in the musical score (default: 0.4)
    pub purity_weight: f32,

    /// Weight of the winner's mean confidence in the musical score (default: 0.6)
    pub confidence_weight: f32,

    /// Stability: weight per occurrence (default: 1.0)
    pub stability_count_weight: f32,

    /// Stability: weight per point of mean confidence percentage (default: 0.05)
    pub stability_confidence_weight: f32,

    /// Stability: weight per consecutive repeat (default: 2.0)
    pub stability_repeat_weight: f32,

    /// Stability: bonus for the label of the last window (default: 1.0)
    pub stability_last_window_bonus: f32,

    /// Mean confidence (0-100) at which the resting key overrides the vote (default: 70.0)
    pub resting_override_confidence: f32,

    /// Scores strictly above this are the highest tier (default: 85.0)
    pub tier_high_threshold: f32,

    /// Scores strictly above this are the middle tier (default: 65.0)
    pub tier_medium_threshold: f32,

    // Tempo
    /// STFT frame size for the novelty curve (default: 1024)
    pub tempo_frame_size: usize,

    /// STFT hop size for the novelty curve (default: 512)
    pub tempo_hop_size: usize,

    /// Minimum BPM to consider (default: 60.0)
    pub min_bpm: f32,

    /// Maximum BPM to consider (default: 200.0)
    pub max_bpm: f32,

    /// BPM resolution of the tempogram (default: 0.5)
    pub bpm_resolution: f32,

    /// Centre of the log-normal tempo prior (default: 120.0 BPM)
    pub tempo_prior_center: f32,

    /// Width of the tempo prior in octaves (default: 1.0)
    pub tempo_prior_width_octaves: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_seconds: 10.0,
            min_tail_fraction: 1.0,
            min_window_rms: 0.01,
            band_pass_enabled: true,
            band_pass_low_hz: 60.0,
            band_pass_high_hz: 1000.0,
            hpss_enabled: true,
            hpss_frame_size: 2048,
            hpss_hop_size: 512,
            hpss_harmonic_kernel: 17,
            hpss_percussive_kernel: 17,
            hpss_power: 2.0,
            tuning_enabled: true,
            tuning_resolution: 0.01,
            tuning_fmin: 150.0,
            tuning_fmax: 4000.0,
            chroma_frame_size: 4096,
            chroma_hop_size: 2048,
            chroma_fmin: 50.0,
            chroma_fmax: 2000.0,
            soft_chroma_mapping: true,
            soft_mapping_sigma: 0.35,
            chroma_sharpening_power: 1.0,
            template_set: TemplateSet::KrumhanslKessler,
            weighted_votes: true,
            dominant_redirect_enabled: true,
            dominant_redirect_weight: 1.5,
            relative_bonus: 20.0,
            relative_preference: RelativePreference::Minor,
            cadence_bonus: 15.0,
            cadence_redirect: true,
            diagonal_bonus: 20.0,
            purity_weight: 0.4,
            confidence_weight: 0.6,
            stability_count_weight: 1.0,
            stability_confidence_weight: 0.05,
            stability_repeat_weight: 2.0,
            stability_last_window_bonus: 1.0,
            resting_override_confidence: 70.0,
            tier_high_threshold: 85.0,
            tier_medium_threshold: 65.0,
            tempo_frame_size: 1024,
            tempo_hop_size: 512,
            min_bpm: 60.0,
            max_bpm: 200.0,
            bpm_resolution: 0.5,
            tempo_prior_center: 120.0,
            tempo_prior_width_octaves: 1.0,
        }
    }
}

impl AnalysisConfig {
    /// Check that parameters are usable
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` naming the first offending field.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        fn invalid(msg: String) -> Result<(), AnalysisError> {
            Err(AnalysisError::InvalidInput(msg))
        }
        // NaN fails both helpers
        fn positive(x: f32) -> bool {
            x > 0.0
        }
        fn ordered(low: f32, high: f32) -> bool {
            low > 0.0 && low < high
        }

        if !positive(self.window_seconds) {
            return invalid(format!("window_seconds must be > 0, got {}", self.window_seconds));
        }
        if !(0.0..=1.0).contains(&self.min_tail_fraction) {
            return invalid(format!(
                "min_tail_fraction must be in [0, 1], got {}",
                self.min_tail_fraction
            ));
        }
        if self.min_window_rms.is_nan() || self.min_window_rms < 0.0 {
            return invalid(format!("min_window_rms must be >= 0, got {}", self.min_window_rms));
        }
        if self.band_pass_enabled
            && !ordered(self.band_pass_low_hz, self.band_pass_high_hz)
        {
            return invalid(format!(
                "band-pass range must satisfy 0 < low < high, got {}..{} Hz",
                self.band_pass_low_hz, self.band_pass_high_hz
            ));
        }

        for (name, frame, hop) in [
            ("hpss", self.hpss_frame_size, self.hpss_hop_size),
            ("chroma", self.chroma_frame_size, self.chroma_hop_size),
            ("tempo", self.tempo_frame_size, self.tempo_hop_size),
        ] {
            if frame < 2 || hop == 0 || hop > frame {
                return invalid(format!(
                    "{} frame/hop sizes must satisfy frame >= 2 and 0 < hop <= frame, got {}/{}",
                    name, frame, hop
                ));
            }
        }

        if self.hpss_harmonic_kernel == 0 || self.hpss_percussive_kernel == 0 {
            return invalid("HPSS kernel sizes must be > 0".to_string());
        }
        if !positive(self.hpss_power) {
            return invalid(format!("hpss_power must be > 0, got {}", self.hpss_power));
        }
        if !ordered(self.tuning_resolution, 1.0) {
            return invalid(format!(
                "tuning_resolution must be in (0, 1), got {}",
                self.tuning_resolution
            ));
        }
        if !ordered(self.tuning_fmin, self.tuning_fmax) {
            return invalid(format!(
                "tuning range must satisfy 0 < fmin < fmax, got {}..{} Hz",
                self.tuning_fmin, self.tuning_fmax
            ));
        }
        if !ordered(self.chroma_fmin, self.chroma_fmax) {
            return invalid(format!(
                "chroma range must satisfy 0 < fmin < fmax, got {}..{} Hz",
                self.chroma_fmin, self.chroma_fmax
            ));
        }
        if !positive(self.soft_mapping_sigma) || !positive(self.chroma_sharpening_power) {
            return invalid("chroma sigma and sharpening power must be > 0".to_string());
        }
        if self.dominant_redirect_weight < 0.0 {
            return invalid(format!(
                "dominant_redirect_weight must be >= 0, got {}",
                self.dominant_redirect_weight
            ));
        }
        if self.purity_weight < 0.0
            || self.confidence_weight < 0.0
            || (self.purity_weight + self.confidence_weight - 1.0).abs() > 1e-3
        {
            return invalid(format!(
                "purity_weight + confidence_weight must equal 1, got {} + {}",
                self.purity_weight, self.confidence_weight
            ));
        }
        if self.tier_medium_threshold > self.tier_high_threshold {
            return invalid(format!(
                "tier thresholds inverted: medium {} > high {}",
                self.tier_medium_threshold, self.tier_high_threshold
            ));
        }
        if !ordered(self.min_bpm, self.max_bpm) {
            return invalid(format!(
                "BPM range must satisfy 0 < min < max, got {}..{}",
                self.min_bpm, self.max_bpm
            ));
        }
        if !positive(self.bpm_resolution) {
            return invalid(format!("bpm_resolution must be > 0, got {}", self.bpm_resolution));
        }
        if !positive(self.tempo_prior_center) || !positive(self.tempo_prior_width_octaves) {
            return invalid("tempo prior centre and width must be > 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.diagonal_bonus, 20.0);
        assert_eq!(config.min_tail_fraction, 1.0);
    }

    #[test]
    fn test_rejects_nan_parameters() {
        let cases = [
            AnalysisConfig {
                window_seconds: f32::NAN,
                ..AnalysisConfig::default()
            },
            AnalysisConfig {
                hpss_power: f32::NAN,
                ..AnalysisConfig::default()
            },
            AnalysisConfig {
                soft_mapping_sigma: f32::NAN,
                ..AnalysisConfig::default()
            },
            AnalysisConfig {
                band_pass_low_hz: f32::NAN,
                ..AnalysisConfig::default()
            },
            AnalysisConfig {
                min_window_rms: f32::NAN,
                ..AnalysisConfig::default()
            },
            AnalysisConfig {
                bpm_resolution: f32::NAN,
                ..AnalysisConfig::default()
            },
        ];
        for config in &cases {
            assert!(matches!(config.validate(), Err(AnalysisError::InvalidInput(_))));
        }

        let config = AnalysisConfig {
            window_seconds: -1.0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_weights() {
        let config = AnalysisConfig {
            purity_weight: 0.5,
            confidence_weight: 0.6,
            ..AnalysisConfig::default()
        };
        assert!(matches!(config.validate(), Err(AnalysisError::InvalidInput(_))));
    }

    #[test]
    fn test_rejects_inverted_ranges() {
        let config = AnalysisConfig {
            band_pass_low_hz: 1000.0,
            band_pass_high_hz: 60.0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AnalysisConfig {
            min_bpm: 180.0,
            max_bpm: 90.0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AnalysisConfig {
            tempo_hop_size: 0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_disabled_band_pass_skips_range_check() {
        let config = AnalysisConfig {
            band_pass_enabled: false,
            band_pass_low_hz: 0.0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_overrides() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"window_seconds": 5.0, "relative_preference": "Major"}"#)
                .unwrap();
        assert_eq!(config.window_seconds, 5.0);
        assert_eq!(config.relative_preference, RelativePreference::Major);
        assert_eq!(config.min_window_rms, 0.01);
        assert_eq!(config.template_set, TemplateSet::KrumhanslKessler);
    }
}
