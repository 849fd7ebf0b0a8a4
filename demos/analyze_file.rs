//! Example: Analyze a single audio file
//!
//! Usage:
//!   cargo run --release --example analyze_file -- [--json] [--config cfg.json] <file>

use std::env;
use tonic_dsp::{analyze, AnalysisConfig, AnalysisOutcome};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut json = false;
    let mut config = AnalysisConfig::default();
    let mut path: Option<String> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--config" => {
                let cfg_path = args.next().ok_or("--config requires a path")?;
                config = serde_json::from_str(&std::fs::read_to_string(cfg_path)?)?;
            }
            _ => path = Some(arg),
        }
    }

    let path = path.ok_or("Usage: analyze_file [--json] [--config cfg.json] <file>")?;
    let bytes = std::fs::read(&path)?;
    let outcome = analyze(&bytes, &path, &config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match outcome {
        AnalysisOutcome::Analyzed(result) => {
            println!("Analysis Results:");
            println!("  Key: {} ({})", result.recommended, result.recommended.camelot());
            println!("  Confidence: {}% ({})", result.confidence, result.tier.label());
            println!(
                "  Resting key: {} ({}%)",
                result.resting.key, result.resting.confidence
            );
            for (rank, candidate) in result.top_candidates.iter().enumerate() {
                println!(
                    "  Top-{}: {} ({:.1}% of windows)",
                    rank + 1,
                    candidate.key,
                    candidate.presence
                );
            }
            println!("  BPM: {}", result.tempo_bpm);
            println!("  Energy: {}/10", result.energy);
            println!("  Rules: {:?}", result.rules);
            println!("  Timeline:");
            for obs in &result.timeline {
                println!(
                    "    {:>4}s  {:<10} {:>5.1}%",
                    obs.start_time,
                    obs.key.short_name(),
                    obs.confidence_pct()
                );
            }
        }
        AnalysisOutcome::NoUsableSignal(r) => {
            println!(
                "{}: no usable signal ({} of {} windows rejected)",
                r.source, r.metadata.windows_rejected, r.metadata.windows_examined
            );
        }
    }

    Ok(())
}
