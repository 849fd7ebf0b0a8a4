//! Short-time Fourier transform
//!
//! Centered, Hann-windowed STFT and its overlap-add inverse, shared by the
//! harmonic/percussive separator, the tuning estimator, chroma extraction and
//! the tempo novelty curve.

use crate::error::AnalysisError;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

const EPSILON: f32 = 1e-10;

/// Complex spectrogram: `frames[t][k]`, `k` in `0..=frame_size / 2`
#[derive(Debug, Clone)]
pub struct Spectrogram {
    /// One half-spectrum per frame
    pub frames: Vec<Vec<Complex<f32>>>,

    /// FFT frame size in samples
    pub frame_size: usize,

    /// Hop size in samples
    pub hop_size: usize,

    /// Length of the signal the spectrogram was computed from
    pub signal_len: usize,
}

impl Spectrogram {
    /// Number of frequency bins per frame
    pub fn num_bins(&self) -> usize {
        self.frame_size / 2 + 1
    }

    /// Magnitude spectrogram `[frame][bin]`
    pub fn magnitudes(&self) -> Vec<Vec<f32>> {
        self.frames
            .iter()
            .map(|frame| frame.iter().map(|c| c.norm()).collect())
            .collect()
    }
}

/// Periodic Hann window
pub fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / size as f32).cos())
        .collect()
}

/// Centre frequency of an FFT bin in Hz
pub fn bin_frequency(bin: usize, frame_size: usize, sample_rate: u32) -> f32 {
    bin as f32 * sample_rate as f32 / frame_size as f32
}

fn check_params(frame_size: usize, hop_size: usize) -> Result<(), AnalysisError> {
    if frame_size < 2 || hop_size == 0 {
        return Err(AnalysisError::InvalidInput(format!(
            "Invalid STFT parameters: frame_size={}, hop_size={}",
            frame_size, hop_size
        )));
    }
    Ok(())
}

/// Compute a centered STFT
///
/// The signal is zero-padded by `frame_size / 2` on both sides so frame `t`
/// is centred on sample `t * hop_size`.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for an empty signal or invalid sizes.
pub fn stft(samples: &[f32], frame_size: usize, hop_size: usize) -> Result<Spectrogram, AnalysisError> {
    check_params(frame_size, hop_size)?;
    if samples.is_empty() {
        return Err(AnalysisError::InvalidInput("Empty signal for STFT".to_string()));
    }

    let pad = frame_size / 2;
    let mut padded = vec![0.0f32; samples.len() + 2 * pad];
    padded[pad..pad + samples.len()].copy_from_slice(samples);

    let num_frames = 1 + samples.len() / hop_size;
    let num_bins = frame_size / 2 + 1;
    let window = hann_window(frame_size);

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(frame_size);

    let mut buffer = vec![Complex::new(0.0f32, 0.0); frame_size];
    let mut frames = Vec::with_capacity(num_frames);
    for t in 0..num_frames {
        let start = t * hop_size;
        for (i, slot) in buffer.iter_mut().enumerate() {
            let sample = padded.get(start + i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * window[i], 0.0);
        }
        fft.process(&mut buffer);
        frames.push(buffer[..num_bins].to_vec());
    }

    log::debug!(
        "STFT: {} samples -> {} frames x {} bins (frame={}, hop={})",
        samples.len(),
        num_frames,
        num_bins,
        frame_size,
        hop_size
    );

    Ok(Spectrogram {
        frames,
        frame_size,
        hop_size,
        signal_len: samples.len(),
    })
}

/// Inverse of [`stft`] by weighted overlap-add
///
/// Returns exactly `spectrogram.signal_len` samples.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if a frame does not have
/// `frame_size / 2 + 1` bins.
pub fn istft(spectrogram: &Spectrogram) -> Result<Vec<f32>, AnalysisError> {
    let frame_size = spectrogram.frame_size;
    let hop_size = spectrogram.hop_size;
    check_params(frame_size, hop_size)?;

    let num_bins = spectrogram.num_bins();
    let pad = frame_size / 2;
    let padded_len = spectrogram.signal_len + 2 * pad;
    let window = hann_window(frame_size);

    let mut planner = FftPlanner::<f32>::new();
    let ifft = planner.plan_fft_inverse(frame_size);

    let mut output = vec![0.0f32; padded_len];
    let mut norm = vec![0.0f32; padded_len];
    let mut buffer = vec![Complex::new(0.0f32, 0.0); frame_size];
    let scale = 1.0 / frame_size as f32;

    for (t, frame) in spectrogram.frames.iter().enumerate() {
        if frame.len() != num_bins {
            return Err(AnalysisError::InvalidInput(format!(
                "Frame {} has {} bins, expected {}",
                t,
                frame.len(),
                num_bins
            )));
        }

        // Rebuild the full Hermitian spectrum
        buffer[..num_bins].copy_from_slice(frame);
        for k in num_bins..frame_size {
            buffer[k] = frame[frame_size - k].conj();
        }
        ifft.process(&mut buffer);

        let start = t * hop_size;
        for i in 0..frame_size {
            let idx = start + i;
            if idx >= padded_len {
                break;
            }
            output[idx] += buffer[i].re * scale * window[i];
            norm[idx] += window[i] * window[i];
        }
    }

    Ok(output[pad..pad + spectrogram.signal_len]
        .iter()
        .zip(&norm[pad..pad + spectrogram.signal_len])
        .map(|(&y, &w)| if w > EPSILON { y / w } else { 0.0 })
        .collect())
}
