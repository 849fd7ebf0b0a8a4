//! Band-pass filtering
//!
//! A second-order Butterworth high-pass followed by a second-order Butterworth
//! low-pass (RBJ cookbook biquads), used to keep the musically relevant range
//! before chroma extraction.

use crate::error::AnalysisError;

const BUTTERWORTH_Q: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Second-order IIR section, Direct Form II transposed
#[derive(Debug, Clone)]
struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    z1: f32,
    z2: f32,
}

impl Biquad {
    fn from_coefficients(b: [f32; 3], a: [f32; 3]) -> Self {
        Self {
            b0: b[0] / a[0],
            b1: b[1] / a[0],
            b2: b[2] / a[0],
            a1: a[1] / a[0],
            a2: a[2] / a[0],
            z1: 0.0,
            z2: 0.0,
        }
    }

    fn high_pass(cutoff: f32, sample_rate: f32) -> Self {
        let w0 = 2.0 * std::f32::consts::PI * cutoff / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * BUTTERWORTH_Q);

        Self::from_coefficients(
            [(1.0 + cos_w0) / 2.0, -(1.0 + cos_w0), (1.0 + cos_w0) / 2.0],
            [1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha],
        )
    }

    fn low_pass(cutoff: f32, sample_rate: f32) -> Self {
        let w0 = 2.0 * std::f32::consts::PI * cutoff / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * BUTTERWORTH_Q);

        Self::from_coefficients(
            [(1.0 - cos_w0) / 2.0, 1.0 - cos_w0, (1.0 - cos_w0) / 2.0],
            [1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha],
        )
    }

    fn process(&mut self, sample: f32) -> f32 {
        let output = self.b0 * sample + self.z1;
        self.z1 = self.b1 * sample + self.z2 - self.a1 * output;
        self.z2 = self.b2 * sample - self.a2 * output;
        output
    }
}

/// Band-pass filter between `low_hz` and `high_hz`
#[derive(Debug, Clone)]
pub struct BandPass {
    high_pass: Biquad,
    low_pass: Biquad,
}

impl BandPass {
    /// Design a band-pass filter
    ///
    /// The upper edge is clamped just below Nyquist, so low sample rates
    /// degrade to a high-pass.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if `sample_rate` is 0 or the
    /// range is not `0 < low_hz < high_hz`, or `low_hz` is at or above Nyquist.
    pub fn new(low_hz: f32, high_hz: f32, sample_rate: u32) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidInput("Invalid sample rate".to_string()));
        }
        let nyquist = sample_rate as f32 / 2.0;
        if !(low_hz > 0.0 && low_hz < high_hz && low_hz < nyquist) {
            return Err(AnalysisError::InvalidInput(format!(
                "Invalid band-pass range {}..{} Hz at {} Hz",
                low_hz, high_hz, sample_rate
            )));
        }

        let high_hz = high_hz.min(nyquist * 0.95);
        Ok(Self {
            high_pass: Biquad::high_pass(low_hz, sample_rate as f32),
            low_pass: Biquad::low_pass(high_hz, sample_rate as f32),
        })
    }

    /// Filter a block of samples, starting from rest
    pub fn apply(&self, samples: &[f32]) -> Vec<f32> {
        let mut hp = self.high_pass.clone();
        let mut lp = self.low_pass.clone();
        samples
            .iter()
            .map(|&x| lp.process(hp.process(x)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    fn steady_rms(x: &[f32]) -> f32 {
        let tail = &x[x.len() / 2..];
        (tail.iter().map(|v| v * v).sum::<f32>() / tail.len() as f32).sqrt()
    }

    #[test]
    fn test_passband_preserved() {
        let filter = BandPass::new(60.0, 1000.0, 8000).unwrap();
        let input = sine(300.0, 8000, 8000);
        let ratio = steady_rms(&filter.apply(&input)) / steady_rms(&input);
        assert!(ratio > 0.9, "300 Hz should pass, ratio {:.3}", ratio);
    }

    #[test]
    fn test_stopbands_attenuated() {
        let filter = BandPass::new(60.0, 1000.0, 16000).unwrap();

        let rumble = sine(15.0, 16000, 32000);
        let low_ratio = steady_rms(&filter.apply(&rumble)) / steady_rms(&rumble);
        assert!(low_ratio < 0.1, "15 Hz should be cut, ratio {:.3}", low_ratio);

        let hiss = sine(5000.0, 16000, 16000);
        let high_ratio = steady_rms(&filter.apply(&hiss)) / steady_rms(&hiss);
        assert!(high_ratio < 0.1, "5 kHz should be cut, ratio {:.3}", high_ratio);
    }

    #[test]
    fn test_apply_is_stateless() {
        let filter = BandPass::new(60.0, 1000.0, 8000).unwrap();
        let input = sine(440.0, 8000, 1000);
        assert_eq!(filter.apply(&input), filter.apply(&input));
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(BandPass::new(1000.0, 60.0, 8000).is_err());
        assert!(BandPass::new(60.0, 1000.0, 0).is_err());
        assert!(BandPass::new(5000.0, 6000.0, 8000).is_err());
    }
}
