//! Segment feature extraction
//!
//! Partitions the harmonic waveform into fixed, non-overlapping windows and
//! produces one chroma vector per window that survives the energy gate.

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::chroma::ChromaExtractor;
use crate::io::sample_buffer::SampleWindows;
use crate::preprocessing::bandpass::BandPass;
use crate::preprocessing::silence::EnergyGate;

/// Features of one accepted window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentFeatures {
    /// Window position in the full partition (rejected windows leave gaps)
    pub index: usize,

    /// Window start in whole seconds
    pub start_time: u32,

    /// Average chroma of the window
    pub chroma: [f32; 12],

    /// RMS energy of the (band-passed) window
    pub rms: f32,
}

/// Output of segment extraction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentExtraction {
    /// Accepted windows in chronological order
    pub segments: Vec<SegmentFeatures>,

    /// Number of windows the waveform was partitioned into
    pub windows_total: usize,

    /// Windows dropped by the energy gate
    pub windows_gated: usize,
}

/// Extract per-window chroma features
///
/// # Arguments
///
/// * `samples` - Harmonic mono waveform
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Window length, gate, and band-pass settings
/// * `extractor` - Chroma extractor built with the global tuning offset
/// * `on_window` - Called with `(windows_processed, windows_total)` after every window
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for a zero sample rate or an
/// unusable band-pass range.
pub fn extract_segments(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
    extractor: &ChromaExtractor,
    on_window: &mut dyn FnMut(usize, usize),
) -> Result<SegmentExtraction, AnalysisError> {
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput("Invalid sample rate".to_string()));
    }

    let window_size = (config.window_seconds * sample_rate as f32).round() as usize;
    let windows = SampleWindows::new(samples, window_size, config.min_tail_fraction);
    let windows_total = windows.total();

    let band_pass = if config.band_pass_enabled {
        Some(BandPass::new(config.band_pass_low_hz, config.band_pass_high_hz, sample_rate)?)
    } else {
        None
    };
    let gate = EnergyGate {
        min_rms: config.min_window_rms,
    };

    log::debug!(
        "Segmenting {} samples into {} windows of {} samples (band-pass: {})",
        samples.len(),
        windows_total,
        window_size,
        band_pass.is_some()
    );

    let mut extraction = SegmentExtraction {
        windows_total,
        ..SegmentExtraction::default()
    };

    for (processed, window) in windows.enumerate() {
        let filtered;
        let segment = match &band_pass {
            Some(filter) => {
                filtered = filter.apply(window.samples);
                &filtered[..]
            }
            None => window.samples,
        };

        let start_time = (window.start_sample / sample_rate as usize) as u32;
        match gate.admit(segment) {
            Some(rms) => {
                let chroma = extractor.window_chroma(segment)?;
                extraction.segments.push(SegmentFeatures {
                    index: window.index,
                    start_time,
                    chroma,
                    rms,
                });
            }
            None => {
                log::debug!("Window {} at {}s below energy gate", window.index, start_time);
                extraction.windows_gated += 1;
            }
        }

        on_window(processed + 1, windows_total);
    }

    Ok(extraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::chroma::ChromaParams;

    const SR: u32 = 8000;

    fn triad(freqs: [f32; 3], seconds: f32) -> Vec<f32> {
        let len = (seconds * SR as f32) as usize;
        (0..len)
            .map(|i| {
                let t = i as f32 / SR as f32;
                freqs
                    .iter()
                    .map(|f| 0.2 * (2.0 * std::f32::consts::PI * f * t).sin())
                    .sum()
            })
            .collect()
    }

    fn test_config() -> AnalysisConfig {
        AnalysisConfig {
            window_seconds: 2.0,
            ..AnalysisConfig::default()
        }
    }

    fn extractor() -> ChromaExtractor {
        ChromaExtractor::new(SR, ChromaParams::default()).unwrap()
    }

    #[test]
    fn test_gated_windows_are_omitted() {
        let mut samples = triad([220.0, 261.63, 329.63], 2.0);
        samples.extend(vec![0.0f32; 2 * SR as usize]);
        samples.extend(triad([220.0, 261.63, 329.63], 2.0));

        let mut calls = Vec::new();
        let extraction = extract_segments(&samples, SR, &test_config(), &extractor(), &mut |done, total| {
            calls.push((done, total))
        })
        .unwrap();

        assert_eq!(extraction.windows_total, 3);
        assert_eq!(extraction.windows_gated, 1);
        assert_eq!(extraction.segments.len(), 2);
        assert_eq!(extraction.segments[0].start_time, 0);
        assert_eq!(extraction.segments[1].start_time, 4);
        assert_eq!(extraction.segments[1].index, 2);
        assert_eq!(calls, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_all_silent() {
        let samples = vec![0.0f32; 6 * SR as usize];
        let extraction = extract_segments(&samples, SR, &test_config(), &extractor(), &mut |_, _| {}).unwrap();
        assert!(extraction.segments.is_empty());
        assert_eq!(extraction.windows_gated, extraction.windows_total);
    }

    #[test]
    fn test_chroma_follows_content() {
        let samples = triad([220.0, 261.63, 329.63], 2.0);
        let extraction = extract_segments(&samples, SR, &test_config(), &extractor(), &mut |_, _| {}).unwrap();
        let chroma = extraction.segments[0].chroma;
        for class in [9, 0, 4] {
            assert!(chroma[class] > 0.5, "class {} weak: {:?}", class, chroma);
        }
        assert!(chroma[6] < 0.1);
    }

    #[test]
    fn test_band_pass_rejects_rumble() {
        // 20 Hz rumble passes the gate unfiltered but not band-passed
        let samples: Vec<f32> = (0..2 * SR as usize)
            .map(|i| 0.05 * (2.0 * std::f32::consts::PI * 20.0 * i as f32 / SR as f32).sin())
            .collect();

        let filtered = extract_segments(&samples, SR, &test_config(), &extractor(), &mut |_, _| {}).unwrap();
        assert_eq!(filtered.windows_gated, 1);

        let config = AnalysisConfig {
            band_pass_enabled: false,
            ..test_config()
        };
        let raw = extract_segments(&samples, SR, &config, &extractor(), &mut |_, _| {}).unwrap();
        assert_eq!(raw.windows_gated, 0);
    }
}
