//! Example: Analyze multiple audio files in parallel
//!
//! Usage:
//!   cargo run --release --example analyze_batch -- [--jobs N] [--json] <file1> <file2> ...
//!
//! Notes:
//! - Parallelism is across files (batch-level); each file's tempo and key paths
//!   also run side by side.
//! - Default workers: (available CPU threads - 1), keeping one core free for the system.
//! - A file that fails to decode is reported and does not stop the batch.

use std::env;
use std::time::Instant;
use tonic_dsp::{analyze_batch, AnalysisConfig, AnalysisOutcome, BatchInput};

fn default_jobs() -> usize {
    let n = std::thread::available_parallelism().map(|v| v.get()).unwrap_or(1);
    std::cmp::max(1, n.saturating_sub(1))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();

    let mut json = false;
    let mut jobs: Option<usize> = None;
    let mut paths: Vec<String> = Vec::new();

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--jobs" => {
                let v = args
                    .first()
                    .ok_or("--jobs requires a value")?
                    .parse::<usize>()?;
                args.remove(0);
                jobs = Some(std::cmp::max(1, v));
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: analyze_batch [--jobs N] [--json] <file1> <file2> ...\n\
                     \n\
                     --jobs N   Parallel workers (default: CPU-1)\n\
                     --json     Emit one JSON object per line (JSONL)\n"
                );
                return Ok(());
            }
            _ => paths.push(a),
        }
    }

    if paths.is_empty() {
        eprintln!("ERROR: Provide at least one audio file path. Use --help for usage.");
        std::process::exit(2);
    }

    let jobs = jobs.unwrap_or_else(default_jobs);
    eprintln!("Batch: {} files, jobs={}", paths.len(), jobs);

    let mut inputs = Vec::with_capacity(paths.len());
    for path in &paths {
        match std::fs::read(path) {
            Ok(bytes) => inputs.push(BatchInput {
                name: path.clone(),
                bytes,
            }),
            Err(e) => eprintln!("{}: ERROR: {}", path, e),
        }
    }

    let config = AnalysisConfig::default();
    let t0 = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
    let items = pool.install(|| analyze_batch(&inputs, &config));

    let mut ok = 0usize;
    for (idx, item) in items.iter().enumerate() {
        if json {
            let line = match &item.outcome {
                Ok(outcome) => serde_json::json!({ "file": item.name, "outcome": outcome }),
                Err(e) => serde_json::json!({ "file": item.name, "error": e.to_string() }),
            };
            println!("{}", line);
        }

        match &item.outcome {
            Ok(AnalysisOutcome::Analyzed(result)) => {
                ok += 1;
                if !json {
                    println!(
                        "[{}/{}] {}: Key={} ({}) conf={}% [{}] BPM={}",
                        idx + 1,
                        items.len(),
                        item.name,
                        result.recommended,
                        result.recommended.camelot(),
                        result.confidence,
                        result.tier.label(),
                        result.tempo_bpm
                    );
                }
            }
            Ok(AnalysisOutcome::NoUsableSignal(_)) => {
                ok += 1;
                if !json {
                    println!("[{}/{}] {}: no usable signal", idx + 1, items.len(), item.name);
                }
            }
            Err(e) => {
                if !json {
                    println!("[{}/{}] {}: ERROR: {}", idx + 1, items.len(), item.name, e);
                }
            }
        }
    }

    eprintln!(
        "Done: ok={}/{} wall={:.0}ms",
        ok,
        paths.len(),
        t0.elapsed().as_secs_f64() * 1000.0
    );

    Ok(())
}
