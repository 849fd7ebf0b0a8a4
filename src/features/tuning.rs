//! Global tuning estimation
//!
//! Finds spectral peaks frame by frame, refines them by parabolic
//! interpolation, and takes the most common deviation from the equal-tempered
//! grid (A4 = 440 Hz) as the recording's tuning offset.

use crate::error::AnalysisError;
use crate::features::spectrum::stft;

const EPSILON: f32 = 1e-10;

/// Relative peak threshold (fraction of the frame maximum)
const PEAK_THRESHOLD: f32 = 0.1;

/// Tuning estimation parameters
#[derive(Debug, Clone, Copy)]
pub struct TuningParams {
    /// STFT frame size
    pub frame_size: usize,
    /// STFT hop size
    pub hop_size: usize,
    /// Histogram resolution in semitones
    pub resolution: f32,
    /// Lowest peak frequency considered (Hz)
    pub fmin: f32,
    /// Highest peak frequency considered (Hz)
    pub fmax: f32,
}

impl Default for TuningParams {
    fn default() -> Self {
        Self {
            frame_size: 4096,
            hop_size: 2048,
            resolution: 0.01,
            fmin: 150.0,
            fmax: 4000.0,
        }
    }
}

/// A refined spectral peak
#[derive(Debug, Clone, Copy, PartialEq)]
struct Peak {
    frequency: f32,
    magnitude: f32,
}

/// Interpolated peaks of one magnitude frame within `[fmin, fmax)`
fn frame_peaks(frame: &[f32], sample_rate: u32, frame_size: usize, fmin: f32, fmax: f32) -> Vec<Peak> {
    let max = frame.iter().copied().fold(0.0f32, f32::max);
    if max < EPSILON {
        return Vec::new();
    }
    let threshold = PEAK_THRESHOLD * max;
    let bin_hz = sample_rate as f32 / frame_size as f32;

    let mut peaks = Vec::new();
    for k in 1..frame.len().saturating_sub(1) {
        let (left, centre, right) = (frame[k - 1], frame[k], frame[k + 1]);
        if centre <= threshold || centre <= left || centre < right {
            continue;
        }
        let freq = k as f32 * bin_hz;
        if freq < fmin || freq >= fmax {
            continue;
        }

        let avg = 0.5 * (right - left);
        let curvature = 2.0 * centre - left - right;
        let shift = if curvature.abs() > EPSILON { avg / curvature } else { 0.0 };
        peaks.push(Peak {
            frequency: (k as f32 + shift) * bin_hz,
            magnitude: centre + 0.5 * avg * shift,
        });
    }
    peaks
}

/// Most common deviation (semitones, in `[-0.5, 0.5)`) of `frequencies` from
/// the equal-tempered grid
///
/// Returns 0.0 when no positive frequency is given.
pub fn pitch_tuning(frequencies: &[f32], resolution: f32) -> f32 {
    let residuals: Vec<f32> = frequencies
        .iter()
        .filter(|&&f| f > 0.0)
        .map(|&f| {
            let semitones = 12.0 * (f / 440.0).log2();
            let frac = semitones - semitones.floor();
            if frac >= 0.5 {
                frac - 1.0
            } else {
                frac
            }
        })
        .collect();

    if residuals.is_empty() || resolution <= 0.0 {
        return 0.0;
    }

    let num_bins = (1.0 / resolution).ceil() as usize;
    let mut counts = vec![0usize; num_bins];
    for r in residuals {
        let idx = (((r + 0.5) / resolution) as usize).min(num_bins - 1);
        counts[idx] += 1;
    }

    // First maximum wins
    let mut best = 0;
    for (i, &c) in counts.iter().enumerate() {
        if c > counts[best] {
            best = i;
        }
    }
    -0.5 + best as f32 * resolution
}

/// Estimate the global tuning offset of a waveform
///
/// # Arguments
///
/// * `samples` - Mono waveform (ideally the harmonic component)
/// * `sample_rate` - Sample rate in Hz
/// * `params` - STFT and histogram parameters
///
/// # Returns
///
/// Offset in fractions of a semitone, in `[-0.5, 0.5)`; 0.0 for signals
/// without usable peaks.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for a zero sample rate or invalid
/// STFT parameters.
pub fn estimate_tuning(samples: &[f32], sample_rate: u32, params: &TuningParams) -> Result<f32, AnalysisError> {
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput("Invalid sample rate".to_string()));
    }
    if samples.is_empty() {
        return Ok(0.0);
    }

    let fmax = params.fmax.min(sample_rate as f32 / 2.0);
    let spectrogram = stft(samples, params.frame_size, params.hop_size)?;

    let mut peaks: Vec<Peak> = spectrogram
        .magnitudes()
        .iter()
        .flat_map(|frame| frame_peaks(frame, sample_rate, params.frame_size, params.fmin, fmax))
        .collect();

    if peaks.is_empty() {
        log::debug!("Tuning: no spectral peaks, assuming 0.0");
        return Ok(0.0);
    }

    // Keep the stronger half
    let mut mags: Vec<f32> = peaks.iter().map(|p| p.magnitude).collect();
    let mid = mags.len() / 2;
    let (_, median, _) = mags.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
    let median = *median;
    peaks.retain(|p| p.magnitude >= median);

    let freqs: Vec<f32> = peaks.iter().map(|p| p.frequency).collect();
    let tuning = pitch_tuning(&freqs, params.resolution);
    log::debug!("Tuning: {:.3} semitones from {} peaks", tuning, freqs.len());
    Ok(tuning)
}
