//! # Tonic DSP
//!
//! Musical key and tempo estimation for DJ and music-library tooling.
//!
//! ## Features
//!
//! - **Key Detection**: Harmonic/percussive separation, tuning-compensated
//!   chroma, and Krumhansl-Kessler correlation over fixed 10 s windows
//! - **Music-Theory Resolver**: RMS-weighted voting with dominant redirection,
//!   relative/cadence/diagonal rules, and a "resting key" stability metric
//! - **Tempo Detection**: Spectral-flux novelty with an autocorrelation tempogram
//! - **Batch Processing**: Independent per-file analysis on a rayon pool
//!
//! ## Quick Start
//!
//! ```no_run
//! use tonic_dsp::{analyze, AnalysisConfig, AnalysisOutcome};
//!
//! let bytes = std::fs::read("track.mp3").unwrap();
//! match analyze(&bytes, "track.mp3", &AnalysisConfig::default())? {
//!     AnalysisOutcome::Analyzed(result) => {
//!         println!("Key: {} ({})", result.recommended, result.recommended.camelot());
//!         println!("Confidence: {}% ({})", result.confidence, result.tier.label());
//!         println!("BPM: {}", result.tempo_bpm);
//!     }
//!     AnalysisOutcome::NoUsableSignal(_) => println!("No usable signal"),
//! }
//! # Ok::<(), tonic_dsp::AnalysisError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Bytes → Decode → HPSS → Tuning → Windows (band-pass, gate, chroma)
//!       → Key correlation → Resolver ─┐
//!       → Tempo (original waveform) ──┴→ AnalysisOutcome
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod cache;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod preprocessing;

use rayon::prelude::*;
use std::borrow::Cow;

use analysis::assembler::{assemble_outcome, ALGORITHM_VERSION};
use analysis::result::WindowObservation;
use features::chroma::{ChromaExtractor, ChromaParams};
use features::key::{detect_window_key, KeyTemplates};
use features::segments::extract_segments;
use features::tempo::{estimate_tempo, TempoParams};
use features::tuning::{estimate_tuning, TuningParams};
use io::decoder::{decode_bytes, extension_hint};
use preprocessing::hpss::{harmonic_component, HpssParams};

// Re-export main types
pub use analysis::result::{
    AnalysisMetadata, AnalysisOutcome, AnalysisResult, CamelotCode, ConfidenceTier, KeyLabel, Mode,
    NoSignalResult, RuleFlags, Timeline,
};
pub use cache::AnalysisCache;
pub use config::{AnalysisConfig, RelativePreference};
pub use error::AnalysisError;

/// Progress of the window scan of one analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisProgress {
    /// Windows processed so far (accepted or gated)
    pub windows_processed: usize,

    /// Windows the waveform was partitioned into
    pub windows_total: usize,
}

impl AnalysisProgress {
    /// Completed fraction (0.0-1.0)
    pub fn fraction(&self) -> f32 {
        if self.windows_total == 0 {
            return 1.0;
        }
        self.windows_processed as f32 / self.windows_total as f32
    }
}

/// Receives progress notifications
///
/// Notifications never influence the analysis. Any `Fn(AnalysisProgress) + Sync`
/// closure is an observer.
pub trait ProgressObserver: Sync {
    /// Called after every window
    fn on_progress(&self, progress: AnalysisProgress);
}

impl<F> ProgressObserver for F
where
    F: Fn(AnalysisProgress) + Sync,
{
    fn on_progress(&self, progress: AnalysisProgress) {
        self(progress)
    }
}

/// Analyze an encoded audio file
///
/// # Arguments
///
/// * `bytes` - Encoded audio (WAV, MP3, FLAC, ...)
/// * `display_name` - Name used for labelling and as the format hint
/// * `config` - Analysis configuration parameters
///
/// # Returns
///
/// [`AnalysisOutcome::Analyzed`] with key, confidence, tempo and timeline, or
/// [`AnalysisOutcome::NoUsableSignal`] when every window was rejected
///
/// # Errors
///
/// Returns `AnalysisError::DecodingError` for malformed or unsupported audio
/// and `AnalysisError::InvalidInput` for an invalid configuration.
pub fn analyze(
    bytes: &[u8],
    display_name: &str,
    config: &AnalysisConfig,
) -> Result<AnalysisOutcome, AnalysisError> {
    let audio = decode_bytes(bytes, extension_hint(display_name))?;
    log::debug!(
        "{}: decoded {:.1}s at {} Hz ({} channels)",
        display_name,
        audio.duration_seconds(),
        audio.sample_rate,
        audio.channels
    );
    analyze_samples(&audio.samples, audio.sample_rate, display_name, config)
}

/// Analyze an already-decoded mono waveform
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for empty samples, a zero sample
/// rate, or an invalid configuration.
///
/// # Example
///
/// ```
/// use tonic_dsp::{analyze_samples, AnalysisConfig};
///
/// let silence = vec![0.0f32; 8000 * 12];
/// let outcome = analyze_samples(&silence, 8000, "silence", &AnalysisConfig::default())?;
/// assert!(outcome.is_no_signal());
/// # Ok::<(), tonic_dsp::AnalysisError>(())
/// ```
pub fn analyze_samples(
    samples: &[f32],
    sample_rate: u32,
    display_name: &str,
    config: &AnalysisConfig,
) -> Result<AnalysisOutcome, AnalysisError> {
    run_pipeline(samples, sample_rate, display_name, config, None)
}

/// Analyze a mono waveform, reporting progress after every window
///
/// # Errors
///
/// Same as [`analyze_samples`].
pub fn analyze_with_progress(
    samples: &[f32],
    sample_rate: u32,
    display_name: &str,
    config: &AnalysisConfig,
    observer: &dyn ProgressObserver,
) -> Result<AnalysisOutcome, AnalysisError> {
    run_pipeline(samples, sample_rate, display_name, config, Some(observer))
}

/// One encoded file of a batch
#[derive(Debug, Clone)]
pub struct BatchInput {
    /// Display name (also the format hint)
    pub name: String,

    /// Encoded audio
    pub bytes: Vec<u8>,
}

/// Result of one batch entry
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// Display name of the input
    pub name: String,

    /// Outcome, or the error that stopped this file
    pub outcome: Result<AnalysisOutcome, AnalysisError>,
}

/// Analyze several files independently
///
/// Files run in parallel on the rayon pool. Output order equals input order
/// and a failing file never affects the others.
pub fn analyze_batch(inputs: &[BatchInput], config: &AnalysisConfig) -> Vec<BatchItem> {
    log::info!("Analyzing batch of {} files", inputs.len());
    inputs
        .par_iter()
        .map(|input| {
            let outcome = analyze(&input.bytes, &input.name, config);
            if let Err(e) = &outcome {
                log::warn!("{}: {}", input.name, e);
            }
            BatchItem {
                name: input.name.clone(),
                outcome,
            }
        })
        .collect()
}

/// Output of the key path
struct KeyPath {
    timeline: Timeline,
    tuning_offset: f32,
    windows_total: usize,
    windows_rejected: usize,
}

fn hpss_params(config: &AnalysisConfig) -> HpssParams {
    HpssParams {
        frame_size: config.hpss_frame_size,
        hop_size: config.hpss_hop_size,
        harmonic_kernel: config.hpss_harmonic_kernel,
        percussive_kernel: config.hpss_percussive_kernel,
        power: config.hpss_power,
    }
}

fn tuning_params(config: &AnalysisConfig) -> TuningParams {
    TuningParams {
        frame_size: config.chroma_frame_size,
        hop_size: config.chroma_hop_size,
        resolution: config.tuning_resolution,
        fmin: config.tuning_fmin,
        fmax: config.tuning_fmax,
    }
}

fn chroma_params(config: &AnalysisConfig, tuning: f32) -> ChromaParams {
    ChromaParams {
        frame_size: config.chroma_frame_size,
        hop_size: config.chroma_hop_size,
        fmin: config.chroma_fmin,
        fmax: config.chroma_fmax,
        soft_mapping: config.soft_chroma_mapping,
        sigma: config.soft_mapping_sigma,
        tuning,
        sharpening_power: config.chroma_sharpening_power,
    }
}

fn tempo_params(config: &AnalysisConfig) -> TempoParams {
    TempoParams {
        frame_size: config.tempo_frame_size,
        hop_size: config.tempo_hop_size,
        min_bpm: config.min_bpm,
        max_bpm: config.max_bpm,
        bpm_resolution: config.bpm_resolution,
        prior_center: config.tempo_prior_center,
        prior_width_octaves: config.tempo_prior_width_octaves,
    }
}

/// Separation, tuning, windowing, and per-window key correlation
fn key_path(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
    observer: Option<&dyn ProgressObserver>,
) -> Result<KeyPath, AnalysisError> {
    let harmonic: Cow<[f32]> = if config.hpss_enabled {
        Cow::Owned(harmonic_component(samples, &hpss_params(config))?)
    } else {
        Cow::Borrowed(samples)
    };

    let tuning_offset = if config.tuning_enabled {
        estimate_tuning(&harmonic, sample_rate, &tuning_params(config))?
    } else {
        0.0
    };
    log::debug!("Tuning offset: {:.3} semitones", tuning_offset);

    let extractor = ChromaExtractor::new(sample_rate, chroma_params(config, tuning_offset))?;
    let mut report = |windows_processed: usize, windows_total: usize| {
        if let Some(observer) = observer {
            observer.on_progress(AnalysisProgress {
                windows_processed,
                windows_total,
            });
        }
    };
    let extraction = extract_segments(&harmonic, sample_rate, config, &extractor, &mut report)?;

    let templates = KeyTemplates::from_set(config.template_set);
    let scored: Vec<Option<WindowObservation>> = extraction
        .segments
        .par_iter()
        .map(|segment| {
            detect_window_key(&segment.chroma, &templates).map(|best| WindowObservation {
                start_time: segment.start_time,
                key: best.key,
                score: best.score,
                energy: segment.rms,
            })
        })
        .collect();

    let atonal = scored.iter().filter(|s| s.is_none()).count();
    if atonal > 0 {
        log::warn!("{} windows carried no tonal information", atonal);
    }

    let timeline = Timeline::new(scored.into_iter().flatten().collect());
    Ok(KeyPath {
        timeline,
        tuning_offset,
        windows_total: extraction.windows_total,
        windows_rejected: extraction.windows_gated + atonal,
    })
}

fn run_pipeline(
    samples: &[f32],
    sample_rate: u32,
    display_name: &str,
    config: &AnalysisConfig,
    observer: Option<&dyn ProgressObserver>,
) -> Result<AnalysisOutcome, AnalysisError> {
    log::debug!(
        "Starting analysis of {}: {} samples at {} Hz",
        display_name,
        samples.len(),
        sample_rate
    );

    config.validate()?;
    if samples.is_empty() {
        return Err(AnalysisError::InvalidInput("Empty audio samples".to_string()));
    }
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput("Invalid sample rate".to_string()));
    }

    let (key, tempo) = rayon::join(
        || key_path(samples, sample_rate, config, observer),
        || estimate_tempo(samples, sample_rate, &tempo_params(config)),
    );
    let key = key?;
    let tempo = tempo?;

    let metadata = AnalysisMetadata {
        duration_seconds: samples.len() as f32 / sample_rate as f32,
        sample_rate,
        tuning_offset: key.tuning_offset,
        windows_examined: key.windows_total,
        windows_rejected: key.windows_rejected,
        algorithm_version: ALGORITHM_VERSION.to_string(),
    };

    let outcome = assemble_outcome(display_name, key.timeline, tempo, metadata, config);
    match &outcome {
        AnalysisOutcome::Analyzed(result) => log::info!(
            "{}: {} ({}) confidence {}% [{}], {} BPM",
            display_name,
            result.recommended,
            result.recommended.camelot(),
            result.confidence,
            result.tier.label(),
            result.tempo_bpm
        ),
        AnalysisOutcome::NoUsableSignal(_) => {
            log::warn!("{}: no usable window", display_name)
        }
    }
    Ok(outcome)
}
