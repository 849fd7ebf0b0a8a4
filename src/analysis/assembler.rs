//! Result assembly
//!
//! Pure packaging of the resolver, tempo, and timeline outputs into the
//! records consumers see.

use super::resolver::{resolve, Resolution};
use super::result::{
    AnalysisMetadata, AnalysisOutcome, AnalysisResult, ConfidenceTier, NoSignalResult, Timeline,
};
use crate::config::AnalysisConfig;
use crate::features::tempo::TempoEstimate;

/// Algorithm version recorded in every result
pub const ALGORITHM_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build the full result from a resolution
pub fn assemble(
    source: &str,
    resolution: Resolution,
    timeline: Timeline,
    tempo: TempoEstimate,
    metadata: AnalysisMetadata,
) -> AnalysisResult {
    let key_changes = timeline.key_changes();
    AnalysisResult {
        source: source.to_string(),
        recommended: resolution.recommended,
        confidence: resolution.confidence,
        tier: resolution.tier,
        majority: resolution.majority,
        top_candidates: resolution.top_candidates,
        resting: resolution.resting,
        tempo_bpm: tempo.rounded_bpm(),
        energy: resolution.energy,
        timeline,
        key_changes,
        rules: resolution.rules,
        metadata,
    }
}

/// Result for a recording without any usable window
pub fn no_signal(source: &str, metadata: AnalysisMetadata) -> NoSignalResult {
    NoSignalResult {
        source: source.to_string(),
        confidence: 0,
        tier: ConfidenceTier::NoSignal,
        metadata,
    }
}

/// Resolve the timeline and package the outcome
///
/// An empty timeline yields [`AnalysisOutcome::NoUsableSignal`]; the tempo
/// estimate is dropped in that case.
pub fn assemble_outcome(
    source: &str,
    timeline: Timeline,
    tempo: TempoEstimate,
    metadata: AnalysisMetadata,
    config: &AnalysisConfig,
) -> AnalysisOutcome {
    match resolve(&timeline, config) {
        Some(resolution) => {
            AnalysisOutcome::Analyzed(assemble(source, resolution, timeline, tempo, metadata))
        }
        None => AnalysisOutcome::NoUsableSignal(no_signal(source, metadata)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::result::{KeyLabel, WindowObservation};

    fn metadata() -> AnalysisMetadata {
        AnalysisMetadata {
            duration_seconds: 30.0,
            sample_rate: 8000,
            tuning_offset: 0.0,
            windows_examined: 3,
            windows_rejected: 0,
            algorithm_version: ALGORITHM_VERSION.to_string(),
        }
    }

    #[test]
    fn test_empty_timeline_is_no_signal() {
        let outcome = assemble_outcome(
            "silence.wav",
            Timeline::default(),
            TempoEstimate::none(),
            metadata(),
            &AnalysisConfig::default(),
        );
        assert!(outcome.is_no_signal());
        assert_eq!(outcome.confidence(), 0);
        assert_eq!(outcome.tier(), ConfidenceTier::NoSignal);
        assert_eq!(outcome.source(), "silence.wav");
        assert!(outcome.result().is_none());
    }

    #[test]
    fn test_assembled_fields() {
        let am = KeyLabel::minor(9);
        let c = KeyLabel::major(0);
        let timeline = Timeline::new(vec![
            WindowObservation { start_time: 0, key: am, score: 0.9, energy: 0.2 },
            WindowObservation { start_time: 10, key: am, score: 0.9, energy: 0.2 },
            WindowObservation { start_time: 20, key: c, score: 0.5, energy: 0.05 },
        ]);
        let tempo = TempoEstimate { bpm: 119.6, confidence: 0.4 };
        let outcome = assemble_outcome("song.mp3", timeline, tempo, metadata(), &AnalysisConfig::default());

        let result = outcome.result().unwrap();
        assert_eq!(result.recommended, am);
        assert_eq!(result.tempo_bpm, 120);
        assert_eq!(result.timeline.len(), 3);
        assert_eq!(result.key_changes.len(), 1);
        assert_eq!(result.key_changes[0].timestamp, 20);
        assert_eq!(result.top1().map(|c| c.key), Some(am));
        assert_eq!(result.top2().map(|c| c.key), Some(c));
        assert!((1..=10).contains(&result.energy));
        assert!(result.caption().contains("A minor (8A)"));
        assert!(result.caption().contains("BPM: 120"));
    }
}
