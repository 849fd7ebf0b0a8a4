//! Integration tests for the key and tempo analysis engine

use std::f32::consts::PI;
use std::io::Cursor;
use std::sync::Mutex;

use tonic_dsp::{
    analyze, analyze_batch, analyze_samples, analyze_with_progress, AnalysisCache, AnalysisConfig,
    AnalysisError, AnalysisOutcome, AnalysisProgress, AnalysisResult, BatchInput, ConfidenceTier,
    KeyLabel,
};

const SR: u32 = 8000;

/// Root-position triad in octave 4, 0.2 amplitude per partial
fn triad(key: KeyLabel, seconds: f32, sample_rate: u32) -> Vec<f32> {
    let freqs = key.triad_frequencies(4);
    let len = (seconds * sample_rate as f32) as usize;
    (0..len)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            freqs.iter().map(|f| 0.2 * (2.0 * PI * f * t).sin()).sum()
        })
        .collect()
}

fn add_clicks(samples: &mut [f32], bpm: f32, sample_rate: u32) {
    let period = (60.0 / bpm * sample_rate as f32) as usize;
    let click_len = (sample_rate / 200) as usize;
    for start in (0..samples.len()).step_by(period) {
        for i in 0..click_len.min(samples.len() - start) {
            let decay = 1.0 - i as f32 / click_len as f32;
            samples[start + i] += if i % 2 == 0 { 0.8 } else { -0.8 } * decay;
        }
    }
}

fn wav_bytes(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer
                .write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                .unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn analyzed(outcome: AnalysisOutcome) -> AnalysisResult {
    match outcome {
        AnalysisOutcome::Analyzed(result) => result,
        AnalysisOutcome::NoUsableSignal(r) => panic!("expected a key for {}", r.source),
    }
}

#[test]
fn test_silence_is_no_usable_signal() {
    let samples = vec![0.0f32; 30 * SR as usize];
    let outcome = analyze_samples(&samples, SR, "silence", &AnalysisConfig::default()).unwrap();

    assert!(outcome.is_no_signal());
    assert_eq!(outcome.confidence(), 0);
    assert_eq!(outcome.tier(), ConfidenceTier::NoSignal);
    match outcome {
        AnalysisOutcome::NoUsableSignal(r) => {
            assert_eq!(r.metadata.windows_examined, 3);
            assert_eq!(r.metadata.windows_rejected, 3);
        }
        AnalysisOutcome::Analyzed(_) => unreachable!(),
    }
}

#[test]
fn test_a_minor_triad_is_indisputable() {
    let _ = env_logger::builder().is_test(true).try_init();
    let am = KeyLabel::minor(9);
    let samples = triad(am, 30.0, SR);

    let result = analyzed(analyze_samples(&samples, SR, "a_minor", &AnalysisConfig::default()).unwrap());

    assert_eq!(result.timeline.len(), 3);
    assert!(result.timeline.iter().all(|o| o.key == am));
    assert_eq!(result.top1().map(|c| c.key), Some(am));
    assert!((result.majority.presence - 100.0).abs() < 1e-3);
    assert_eq!(result.recommended, am);
    assert_eq!(result.tier, ConfidenceTier::Indisputable);
    assert!(result.confidence > 85, "confidence {}", result.confidence);
    assert!(result.top2().is_none());
    assert!(result.key_changes.is_empty());
    assert_eq!(result.metadata.windows_rejected, 0);
    assert!(result.metadata.tuning_offset.abs() < 0.1);
    assert!(result.timeline.iter().all(|o| o.confidence_pct() <= 100.0));
}

#[test]
fn test_alternating_relative_keys() {
    let c = KeyLabel::major(0);
    let am = KeyLabel::minor(9);
    let mut samples = Vec::new();
    for key in [c, am, c, am] {
        samples.extend(triad(key, 10.0, SR));
    }

    let config = AnalysisConfig::default();
    let result = analyzed(analyze_samples(&samples, SR, "c_am", &config).unwrap());

    assert_eq!(result.timeline.len(), 4);
    assert!(result.rules.is_relative);
    assert_eq!(result.recommended, am, "minor side wins a relative pair");
    assert_eq!(result.key_changes.len(), 3);

    let no_bonus = AnalysisConfig {
        relative_bonus: 0.0,
        ..AnalysisConfig::default()
    };
    let without = analyzed(analyze_samples(&samples, SR, "c_am", &no_bonus).unwrap());
    let diff = result.confidence as i32 - without.confidence as i32;
    assert!((19..=20).contains(&diff), "bonus added {}", diff);
}

#[test]
fn test_analysis_is_idempotent() {
    let mut samples = triad(KeyLabel::major(7), 12.0, SR);
    samples.extend(triad(KeyLabel::major(0), 12.0, SR));

    let config = AnalysisConfig::default();
    let first = analyze_samples(&samples, SR, "g_c", &config).unwrap();
    let second = analyze_samples(&samples, SR, "g_c", &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_trailing_window_rules() {
    let am = KeyLabel::minor(9);
    let config = AnalysisConfig::default();

    let dropped = analyzed(analyze_samples(&triad(am, 25.0, SR), SR, "25s", &config).unwrap());
    assert_eq!(dropped.metadata.windows_examined, 2);
    assert_eq!(dropped.timeline.len(), 2);
    assert_eq!(dropped.timeline.observations()[1].start_time, 10);

    let short = analyze_samples(&triad(am, 8.0, SR), SR, "8s", &config).unwrap();
    assert!(short.is_no_signal(), "a clip shorter than one window has no full window");

    let lenient = AnalysisConfig {
        min_tail_fraction: 0.5,
        ..AnalysisConfig::default()
    };
    let kept = analyzed(analyze_samples(&triad(am, 25.0, SR), SR, "25s", &lenient).unwrap());
    assert_eq!(kept.metadata.windows_examined, 3);
    assert_eq!(kept.timeline.observations()[2].start_time, 20);

    let too_short = analyzed(analyze_samples(&triad(am, 24.0, SR), SR, "24s", &lenient).unwrap());
    assert_eq!(too_short.metadata.windows_examined, 2);
}

#[test]
fn test_wav_bytes_through_decoder() {
    let am = KeyLabel::minor(9);
    let bytes = wav_bytes(&triad(am, 20.0, SR), SR);

    let result = analyzed(analyze(&bytes, "am.wav", &AnalysisConfig::default()).unwrap());
    assert_eq!(result.source, "am.wav");
    assert_eq!(result.recommended, am);
    assert_eq!(result.metadata.sample_rate, SR);
    assert!((result.metadata.duration_seconds - 20.0).abs() < 0.01);
    assert!(result.caption().starts_with("FILE: am.wav\nKEY: A minor (8A)"));

    let json = serde_json::to_string(&result).unwrap();
    assert!(json.contains("\"A minor\""));
    let back: AnalysisResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result);
}

#[test]
fn test_cache_reuses_outcomes() {
    let bytes = wav_bytes(&triad(KeyLabel::minor(9), 10.0, SR), SR);
    let cache = AnalysisCache::default();

    let first = cache.get_or_analyze(&bytes, "am.wav").unwrap();
    assert_eq!(cache.len(), 1);
    let second = cache.get_or_analyze(&bytes, "am.wav").unwrap();
    assert_eq!(first, second);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("am.wav", bytes.len()), Some(first));

    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn test_batch_isolates_failures() {
    let inputs = vec![
        BatchInput {
            name: "am.wav".to_string(),
            bytes: wav_bytes(&triad(KeyLabel::minor(9), 10.0, SR), SR),
        },
        BatchInput {
            name: "broken.mp3".to_string(),
            bytes: b"this is not an mp3 file at all".to_vec(),
        },
        BatchInput {
            name: "silent.wav".to_string(),
            bytes: wav_bytes(&vec![0.0; 10 * SR as usize], SR),
        },
    ];

    let items = analyze_batch(&inputs, &AnalysisConfig::default());
    assert_eq!(items.len(), 3);
    let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["am.wav", "broken.mp3", "silent.wav"]);

    match &items[0].outcome {
        Ok(AnalysisOutcome::Analyzed(result)) => assert_eq!(result.recommended, KeyLabel::minor(9)),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(matches!(items[1].outcome, Err(AnalysisError::DecodingError(_))));
    assert!(matches!(&items[2].outcome, Ok(o) if o.is_no_signal()));
}

#[test]
fn test_progress_reports_every_window() {
    let samples = triad(KeyLabel::major(2), 30.0, SR);
    let seen = Mutex::new(Vec::new());
    let observer = |p: AnalysisProgress| seen.lock().unwrap().push(p);

    analyze_with_progress(&samples, SR, "d", &AnalysisConfig::default(), &observer).unwrap();

    let seen = seen.into_inner().unwrap();
    let processed: Vec<usize> = seen.iter().map(|p| p.windows_processed).collect();
    assert_eq!(processed, vec![1, 2, 3]);
    assert!(seen.iter().all(|p| p.windows_total == 3));
    assert_eq!(seen.last().map(|p| p.fraction()), Some(1.0));
}

#[test]
fn test_tempo_from_original_waveform() {
    let sample_rate = 22050;
    let mut samples = triad(KeyLabel::minor(9), 20.0, sample_rate);
    add_clicks(&mut samples, 120.0, sample_rate);

    let result = analyzed(
        analyze_samples(&samples, sample_rate, "clicks", &AnalysisConfig::default()).unwrap(),
    );
    assert!(
        (result.tempo_bpm as i32 - 120).abs() <= 5,
        "expected ~120 BPM, got {}",
        result.tempo_bpm
    );
    assert_eq!(result.recommended, KeyLabel::minor(9));
}

#[test]
fn test_steady_tones_have_no_tempo() {
    let result = analyzed(
        analyze_samples(&triad(KeyLabel::minor(9), 20.0, SR), SR, "drone", &AnalysisConfig::default())
            .unwrap(),
    );
    assert_eq!(result.tempo_bpm, 0);
}
