//! Global tempo estimation
//!
//! Spectral-flux novelty curve, autocorrelation tempogram, and a log-Gaussian
//! tempo prior to choose between metrical levels. Runs on the original
//! waveform (not the harmonic component) since percussion carries the pulse.

pub mod novelty;
pub mod tempogram;

use crate::error::AnalysisError;
use crate::features::spectrum::stft;
use serde::{Deserialize, Serialize};

/// Minimum periodicity (strength relative to zero-lag energy) for a tempo to be reported
const MIN_PERIODICITY: f32 = 0.1;

/// Local mean window for the novelty curve, in seconds
const LOCAL_MEAN_SECONDS: f32 = 0.5;

/// Tempo estimation parameters
#[derive(Debug, Clone, Copy)]
pub struct TempoParams {
    /// STFT frame size
    pub frame_size: usize,
    /// STFT hop size
    pub hop_size: usize,
    /// Minimum BPM
    pub min_bpm: f32,
    /// Maximum BPM
    pub max_bpm: f32,
    /// BPM step
    pub bpm_resolution: f32,
    /// Prior centre (BPM)
    pub prior_center: f32,
    /// Prior width (octaves)
    pub prior_width_octaves: f32,
}

impl Default for TempoParams {
    fn default() -> Self {
        Self {
            frame_size: 1024,
            hop_size: 512,
            min_bpm: 60.0,
            max_bpm: 200.0,
            bpm_resolution: 0.5,
            prior_center: 120.0,
            prior_width_octaves: 1.0,
        }
    }
}

/// Tempo estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoEstimate {
    /// Beats per minute (0.0 when no pulse was found)
    pub bpm: f32,

    /// Periodicity of the novelty curve at `bpm` (0.0-1.0)
    pub confidence: f32,
}

impl TempoEstimate {
    /// Estimate for signals without a detectable pulse
    pub fn none() -> Self {
        Self {
            bpm: 0.0,
            confidence: 0.0,
        }
    }

    /// BPM rounded to the nearest integer
    pub fn rounded_bpm(&self) -> u32 {
        self.bpm.max(0.0).round() as u32
    }
}

/// Estimate the global tempo of a waveform
///
/// # Arguments
///
/// * `samples` - Mono waveform
/// * `sample_rate` - Sample rate in Hz
/// * `params` - Novelty and tempogram parameters
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for a zero sample rate or invalid
/// parameters.
pub fn estimate_tempo(
    samples: &[f32],
    sample_rate: u32,
    params: &TempoParams,
) -> Result<TempoEstimate, AnalysisError> {
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput("Invalid sample rate".to_string()));
    }
    if samples.is_empty() {
        return Ok(TempoEstimate::none());
    }

    let spectrogram = stft(samples, params.frame_size, params.hop_size)?;
    let frame_rate = sample_rate as f32 / params.hop_size as f32;
    let local_mean = (LOCAL_MEAN_SECONDS * frame_rate).round() as usize;
    let curve = novelty::spectral_flux_novelty(&spectrogram.magnitudes(), local_mean)?;

    let tempogram = tempogram::autocorrelation_tempogram(
        &curve,
        sample_rate,
        params.hop_size,
        params.min_bpm,
        params.max_bpm,
        params.bpm_resolution,
    )?;

    let estimate = match tempogram::find_best_bpm(
        &tempogram,
        tempogram::novelty_energy(&curve),
        params.prior_center,
        params.prior_width_octaves,
    ) {
        Some((bpm, periodicity)) if periodicity >= MIN_PERIODICITY => TempoEstimate {
            bpm,
            confidence: periodicity,
        },
        Some((bpm, periodicity)) => {
            log::debug!(
                "Tempo {:.1} BPM rejected: periodicity {:.3} below {}",
                bpm,
                periodicity,
                MIN_PERIODICITY
            );
            TempoEstimate::none()
        }
        None => TempoEstimate::none(),
    };

    log::debug!(
        "Tempo: {:.1} BPM (confidence {:.3}) from {} novelty frames",
        estimate.bpm,
        estimate.confidence,
        curve.len()
    );
    Ok(estimate)
}
