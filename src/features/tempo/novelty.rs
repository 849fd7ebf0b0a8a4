//! Novelty curve extraction for tempogram analysis
//!
//! Log-compressed spectral flux with local-mean removal: each value measures
//! how much spectral energy appeared since the previous frame, with the slowly
//! varying baseline subtracted so only onsets remain.
//!
//! # Reference
//!
//! Grosche, P., & Müller, M. (2011). Extracting Predominant Local Pulse Information
//! from Music Recordings. *IEEE Transactions on Audio, Speech, and Language Processing*,
//! 19(6), 1688-1701.

use crate::error::AnalysisError;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// Log compression factor applied to magnitudes
const LOG_COMPRESSION: f32 = 100.0;

/// Extract spectral flux novelty curve from magnitude spectrogram
///
/// # Arguments
///
/// * `magnitude_spec_frames` - FFT magnitude spectrogram (n_frames × n_bins)
/// * `local_mean_frames` - Length of the moving average subtracted from the
///   flux (0 disables it)
///
/// # Returns
///
/// Novelty curve with length `n_frames - 1`, normalized to [0, 1]. All-zero
/// when the spectrum never changes.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if frames have inconsistent lengths.
pub fn spectral_flux_novelty(
    magnitude_spec_frames: &[Vec<f32>],
    local_mean_frames: usize,
) -> Result<Vec<f32>, AnalysisError> {
    if magnitude_spec_frames.len() < 2 {
        return Ok(Vec::new());
    }

    let n_bins = magnitude_spec_frames[0].len();
    if n_bins == 0 {
        return Err(AnalysisError::InvalidInput("Empty magnitude frames".to_string()));
    }
    for (i, frame) in magnitude_spec_frames.iter().enumerate() {
        if frame.len() != n_bins {
            return Err(AnalysisError::InvalidInput(format!(
                "Inconsistent frame lengths: frame 0 has {} bins, frame {} has {} bins",
                n_bins,
                i,
                frame.len()
            )));
        }
    }

    let compressed: Vec<Vec<f32>> = magnitude_spec_frames
        .iter()
        .map(|frame| frame.iter().map(|&m| (1.0 + LOG_COMPRESSION * m).ln()).collect())
        .collect();

    let mut flux: Vec<f32> = compressed
        .windows(2)
        .map(|pair| {
            pair[0]
                .iter()
                .zip(&pair[1])
                .map(|(&prev, &curr)| (curr - prev).max(0.0))
                .sum()
        })
        .collect();

    if local_mean_frames > 1 {
        let half = local_mean_frames / 2;
        let n = flux.len();
        let mut prefix = vec![0.0f64; n + 1];
        for (i, &v) in flux.iter().enumerate() {
            prefix[i + 1] = prefix[i] + v as f64;
        }
        flux = (0..n)
            .map(|i| {
                let lo = i.saturating_sub(half);
                let hi = (i + half + 1).min(n);
                let mean = (prefix[hi] - prefix[lo]) / (hi - lo) as f64;
                (flux[i] - mean as f32).max(0.0)
            })
            .collect();
    }

    let max_flux = flux.iter().copied().fold(0.0f32, f32::max);
    if max_flux > EPSILON {
        for val in &mut flux {
            *val /= max_flux;
        }
    } else {
        flux.iter_mut().for_each(|v| *v = 0.0);
    }

    log::debug!(
        "Spectral flux novelty: {} values, max={:.6}",
        flux.len(),
        max_flux
    );

    Ok(flux)
}
