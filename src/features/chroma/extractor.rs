//! Chroma vector extraction
//!
//! Converts an STFT power spectrogram to 12-element chroma vectors
//! (index 0 = C). Each FFT bin is mapped to a fractional pitch class using
//! the global tuning offset, then spread onto the 12 classes either hard
//! (nearest class) or soft (Gaussian in semitone distance).

use super::normalization::{normalize_max, sharpen_chroma};
use crate::error::AnalysisError;
use crate::features::spectrum::{bin_frequency, stft};

/// Chroma extraction parameters
#[derive(Debug, Clone, Copy)]
pub struct ChromaParams {
    /// STFT frame size
    pub frame_size: usize,
    /// STFT hop size
    pub hop_size: usize,
    /// Lowest mapped frequency (Hz)
    pub fmin: f32,
    /// Highest mapped frequency (Hz)
    pub fmax: f32,
    /// Gaussian spreading onto neighbouring classes
    pub soft_mapping: bool,
    /// Gaussian width in semitones
    pub sigma: f32,
    /// Global tuning offset in semitones
    pub tuning: f32,
    /// Sharpening power applied to window averages (1.0 = none)
    pub sharpening_power: f32,
}

impl Default for ChromaParams {
    fn default() -> Self {
        Self {
            frame_size: 4096,
            hop_size: 2048,
            fmin: 50.0,
            fmax: 2000.0,
            soft_mapping: true,
            sigma: 0.35,
            tuning: 0.0,
            sharpening_power: 1.0,
        }
    }
}

/// Fractional pitch class (0.0 = C, 9.0 = A) of a frequency after removing `tuning`
pub fn pitch_class_of(frequency: f32, tuning: f32) -> f32 {
    let midi = 69.0 + 12.0 * (frequency / 440.0).log2() - tuning;
    midi.rem_euclid(12.0)
}

/// Chroma extractor with a precomputed bin-to-class filterbank
#[derive(Debug, Clone)]
pub struct ChromaExtractor {
    params: ChromaParams,
    sample_rate: u32,
    filterbank: Vec<(usize, [f32; 12])>,
}

impl ChromaExtractor {
    /// Build the filterbank for a sample rate
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` for a zero sample rate, invalid
    /// STFT sizes, or a frequency range with no FFT bins.
    pub fn new(sample_rate: u32, params: ChromaParams) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidInput("Invalid sample rate".to_string()));
        }
        if params.frame_size < 2 || params.hop_size == 0 {
            return Err(AnalysisError::InvalidInput(format!(
                "Invalid chroma STFT parameters: frame_size={}, hop_size={}",
                params.frame_size, params.hop_size
            )));
        }

        let nyquist = sample_rate as f32 / 2.0;
        let fmax = params.fmax.min(nyquist);
        let num_bins = params.frame_size / 2 + 1;

        let mut filterbank = Vec::new();
        for k in 1..num_bins {
            let freq = bin_frequency(k, params.frame_size, sample_rate);
            if freq < params.fmin || freq > fmax {
                continue;
            }

            let pc = pitch_class_of(freq, params.tuning);
            let mut weights = [0.0f32; 12];
            if params.soft_mapping {
                for (class, w) in weights.iter_mut().enumerate() {
                    let mut d = (pc - class as f32).abs();
                    d = d.min(12.0 - d);
                    *w = (-0.5 * (d / params.sigma).powi(2)).exp();
                }
            } else {
                weights[(pc.round() as usize) % 12] = 1.0;
            }
            filterbank.push((k, weights));
        }

        if filterbank.is_empty() {
            return Err(AnalysisError::InvalidInput(format!(
                "No FFT bins between {} and {} Hz at {} Hz",
                params.fmin, fmax, sample_rate
            )));
        }

        Ok(Self {
            params,
            sample_rate,
            filterbank,
        })
    }

    /// Sample rate the filterbank was built for
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Per-frame chroma, each frame scaled to a maximum of 1.0
    ///
    /// Silent frames are all-zero.
    ///
    /// # Errors
    ///
    /// Propagates STFT errors (empty input).
    pub fn extract_frames(&self, samples: &[f32]) -> Result<Vec<[f32; 12]>, AnalysisError> {
        let spectrogram = stft(samples, self.params.frame_size, self.params.hop_size)?;

        Ok(spectrogram
            .frames
            .iter()
            .map(|frame| {
                let mut chroma = [0.0f32; 12];
                for (k, weights) in &self.filterbank {
                    let power = frame[*k].norm_sqr();
                    for (c, w) in chroma.iter_mut().zip(weights) {
                        *c += w * power;
                    }
                }
                normalize_max(&mut chroma);
                chroma
            })
            .collect())
    }

    /// Average chroma of a whole window
    ///
    /// Frames are averaged, then sharpened (L2-normalized) when
    /// `sharpening_power != 1.0`.
    ///
    /// # Errors
    ///
    /// Propagates STFT errors (empty input).
    pub fn window_chroma(&self, samples: &[f32]) -> Result<[f32; 12], AnalysisError> {
        let frames = self.extract_frames(samples)?;
        let mut mean = [0.0f32; 12];
        for frame in &frames {
            for (m, v) in mean.iter_mut().zip(frame) {
                *m += v;
            }
        }
        let n = frames.len().max(1) as f32;
        for m in mean.iter_mut() {
            *m /= n;
        }

        if (self.params.sharpening_power - 1.0).abs() > f32::EPSILON {
            Ok(sharpen_chroma(&mean, self.params.sharpening_power))
        } else {
            Ok(mean)
        }
    }
}
