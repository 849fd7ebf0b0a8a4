//! Harmonic-percussive source separation (HPSS)
//!
//! Median-filtering separation (Fitzgerald 2010): harmonic energy is smooth
//! across time, percussive energy is smooth across frequency. A soft mask built
//! from the two median-filtered magnitude spectrograms is applied to the complex
//! STFT and inverted back to a waveform of the same length.
//!
//! # Reference
//!
//! Fitzgerald, D. (2010). Harmonic/Percussive Separation using Median Filtering.
//! *Proceedings of the 13th International Conference on Digital Audio Effects (DAFx-10)*.

use crate::error::AnalysisError;
use crate::features::spectrum::{istft, stft};

const EPSILON: f32 = 1e-10;

/// HPSS parameters
#[derive(Debug, Clone, Copy)]
pub struct HpssParams {
    /// STFT frame size
    pub frame_size: usize,
    /// STFT hop size
    pub hop_size: usize,
    /// Median length across time (frames)
    pub harmonic_kernel: usize,
    /// Median length across frequency (bins)
    pub percussive_kernel: usize,
    /// Soft mask exponent
    pub power: f32,
}

impl Default for HpssParams {
    fn default() -> Self {
        Self {
            frame_size: 2048,
            hop_size: 512,
            harmonic_kernel: 17,
            percussive_kernel: 17,
            power: 2.0,
        }
    }
}

/// Median of `values`, reordering them in place
fn median_in_place(values: &mut [f32]) -> f32 {
    let mid = values.len() / 2;
    let (_, median, _) = values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
    *median
}

/// Median filter along time for each frequency bin
fn median_across_time(mags: &[Vec<f32>], kernel: usize) -> Vec<Vec<f32>> {
    let num_frames = mags.len();
    let num_bins = mags.first().map_or(0, |f| f.len());
    let half = kernel / 2;
    let mut out = vec![vec![0.0f32; num_bins]; num_frames];
    let mut scratch = Vec::with_capacity(kernel);

    for k in 0..num_bins {
        for t in 0..num_frames {
            let lo = t.saturating_sub(half);
            let hi = (t + half + 1).min(num_frames);
            scratch.clear();
            scratch.extend(mags[lo..hi].iter().map(|frame| frame[k]));
            out[t][k] = median_in_place(&mut scratch);
        }
    }
    out
}

/// Median filter along frequency within each frame
fn median_across_frequency(mags: &[Vec<f32>], kernel: usize) -> Vec<Vec<f32>> {
    let half = kernel / 2;
    let mut scratch = Vec::with_capacity(kernel);

    mags.iter()
        .map(|frame| {
            let n = frame.len();
            (0..n)
                .map(|k| {
                    let lo = k.saturating_sub(half);
                    let hi = (k + half + 1).min(n);
                    scratch.clear();
                    scratch.extend_from_slice(&frame[lo..hi]);
                    median_in_place(&mut scratch)
                })
                .collect()
        })
        .collect()
}

/// Extract the harmonic component of a waveform
///
/// # Arguments
///
/// * `samples` - Mono waveform
/// * `params` - STFT and median filter parameters
///
/// # Returns
///
/// Harmonic waveform with exactly `samples.len()` samples. Inputs shorter
/// than one frame are returned unchanged.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for zero kernel sizes or invalid
/// STFT parameters.
pub fn harmonic_component(samples: &[f32], params: &HpssParams) -> Result<Vec<f32>, AnalysisError> {
    if params.harmonic_kernel == 0 || params.percussive_kernel == 0 {
        return Err(AnalysisError::InvalidInput(
            "HPSS kernel sizes must be > 0".to_string(),
        ));
    }
    if samples.len() < params.frame_size {
        log::debug!(
            "HPSS skipped: {} samples shorter than frame size {}",
            samples.len(),
            params.frame_size
        );
        return Ok(samples.to_vec());
    }

    let mut spectrogram = stft(samples, params.frame_size, params.hop_size)?;
    let mags = spectrogram.magnitudes();

    let harmonic = median_across_time(&mags, params.harmonic_kernel);
    let percussive = median_across_frequency(&mags, params.percussive_kernel);

    let mut mask_sum = 0.0f64;
    for (t, frame) in spectrogram.frames.iter_mut().enumerate() {
        for (k, bin) in frame.iter_mut().enumerate() {
            let h = harmonic[t][k].powf(params.power);
            let p = percussive[t][k].powf(params.power);
            let mask = if h + p > EPSILON { h / (h + p) } else { 0.0 };
            mask_sum += mask as f64;
            *bin *= mask;
        }
    }

    let total_bins = (spectrogram.frames.len() * spectrogram.num_bins()).max(1);
    log::debug!(
        "HPSS: {} frames, mean harmonic mask {:.3}",
        spectrogram.frames.len(),
        mask_sum / total_bins as f64
    );

    istft(&spectrogram)
}
