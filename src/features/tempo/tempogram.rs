//! Autocorrelation-based tempogram for BPM detection
//!
//! Tests each BPM hypothesis by computing the autocorrelation of the novelty
//! curve at the corresponding (fractional) tempo lag.
//!
//! # Algorithm
//!
//! For each BPM candidate in `[min_bpm, max_bpm]`:
//! 1. Convert BPM to period in frames: `frames_per_beat = frame_rate * 60 / BPM`
//! 2. Autocorrelate at that lag, linearly interpolating between integer lags
//! 3. Normalize by the number of overlapping frames
//!
//! # Reference
//!
//! Grosche, P., Müller, M., & Serrà, J. (2012). Robust Local Features for Remote Folk Music Identification.
//! *IEEE Transactions on Audio, Speech, and Language Processing*.

use crate::error::AnalysisError;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// Autocorrelation of `curve` at integer `lag`, averaged over overlapping frames
fn autocorr_at(curve: &[f32], lag: usize) -> f32 {
    if lag >= curve.len() {
        return 0.0;
    }
    let count = curve.len() - lag;
    let sum: f32 = curve[..count]
        .iter()
        .zip(&curve[lag..])
        .map(|(a, b)| a * b)
        .sum();
    sum / count as f32
}

/// Autocorrelation at a fractional lag (linear interpolation)
fn autocorr_fractional(curve: &[f32], lag: f32) -> f32 {
    let lo = lag.floor() as usize;
    let frac = lag - lo as f32;
    let a = autocorr_at(curve, lo);
    if frac <= f32::EPSILON {
        return a;
    }
    a * (1.0 - frac) + autocorr_at(curve, lo + 1) * frac
}

/// Compute autocorrelation tempogram
///
/// # Arguments
///
/// * `novelty_curve` - Novelty curve (one value per frame transition)
/// * `sample_rate` - Sample rate in Hz
/// * `hop_size` - Hop size used for STFT (samples per frame)
/// * `min_bpm` - Minimum BPM to consider
/// * `max_bpm` - Maximum BPM to consider
/// * `bpm_resolution` - BPM step
///
/// # Returns
///
/// Tempogram as `(BPM, strength)` pairs in ascending BPM order
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for invalid parameters.
pub fn autocorrelation_tempogram(
    novelty_curve: &[f32],
    sample_rate: u32,
    hop_size: usize,
    min_bpm: f32,
    max_bpm: f32,
    bpm_resolution: f32,
) -> Result<Vec<(f32, f32)>, AnalysisError> {
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput(
            "Sample rate must be > 0".to_string(),
        ));
    }
    if hop_size == 0 {
        return Err(AnalysisError::InvalidInput("Hop size must be > 0".to_string()));
    }
    if min_bpm <= 0.0 || max_bpm <= min_bpm {
        return Err(AnalysisError::InvalidInput(format!(
            "Invalid BPM range: min={}, max={}",
            min_bpm, max_bpm
        )));
    }
    if bpm_resolution <= 0.0 {
        return Err(AnalysisError::InvalidInput(format!(
            "BPM resolution must be > 0, got {}",
            bpm_resolution
        )));
    }

    let frame_rate = sample_rate as f32 / hop_size as f32;
    let steps = ((max_bpm - min_bpm) / bpm_resolution).floor() as usize;

    let tempogram: Vec<(f32, f32)> = (0..=steps)
        .map(|i| {
            let bpm = min_bpm + i as f32 * bpm_resolution;
            let lag = frame_rate * 60.0 / bpm;
            (bpm, autocorr_fractional(novelty_curve, lag))
        })
        .collect();

    log::debug!(
        "Autocorrelation tempogram: {} novelty values, frame_rate={:.2} Hz, {} BPM candidates",
        novelty_curve.len(),
        frame_rate,
        tempogram.len()
    );

    Ok(tempogram)
}

/// Log-Gaussian tempo prior, 1.0 at `center`
pub fn tempo_prior(bpm: f32, center: f32, width_octaves: f32) -> f32 {
    let octaves = (bpm / center).log2() / width_octaves;
    (-0.5 * octaves * octaves).exp()
}

/// Best BPM of a tempogram under a tempo prior
///
/// Returns `(bpm, periodicity)` where periodicity is the winning strength
/// relative to the zero-lag autocorrelation `energy`. `None` when the
/// tempogram is empty or `energy` is zero.
pub fn find_best_bpm(
    tempogram: &[(f32, f32)],
    energy: f32,
    prior_center: f32,
    prior_width_octaves: f32,
) -> Option<(f32, f32)> {
    if energy <= EPSILON {
        return None;
    }

    let mut best: Option<(f32, f32, f32)> = None;
    for &(bpm, strength) in tempogram {
        let weighted = strength * tempo_prior(bpm, prior_center, prior_width_octaves);
        match best {
            Some((_, _, w)) if weighted <= w => {}
            _ => best = Some((bpm, strength, weighted)),
        }
    }

    best.map(|(bpm, strength, _)| (bpm, (strength / energy).clamp(0.0, 1.0)))
}

/// Zero-lag autocorrelation (mean power) of a novelty curve
pub fn novelty_energy(novelty_curve: &[f32]) -> f32 {
    autocorr_at(novelty_curve, 0)
}
