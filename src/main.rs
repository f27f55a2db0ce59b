use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use tonalyzer::audio::decoder::decode_audio;
use tonalyzer::scoring::{CompareOptions, Comparator, ScoreResult};

/// Tonalyzer - musical performance scoring tool
///
/// Compares a candidate recording against a reference rendition and reports
/// an overall score, pitch and rhythm sub-scores, a segment breakdown, and
/// practice suggestions.
#[derive(Parser, Debug)]
#[command(name = "tonalyzer")]
#[command(version = "0.1.0")]
#[command(about = "Score a recorded performance against a reference rendition", long_about = None)]
struct Args {
    /// Reference audio file (supports MP3, OGG, FLAC, WAV, etc.)
    #[arg(value_name = "REFERENCE")]
    reference: PathBuf,

    /// Candidate (performed) audio file
    #[arg(value_name = "CANDIDATE")]
    candidate: PathBuf,

    /// Directory for the segment-score chart artifact
    #[arg(long, value_name = "DIR", default_value = "data/charts")]
    chart_dir: PathBuf,

    /// Skip chart rendering entirely
    #[arg(long)]
    no_chart: bool,

    /// Unique identifier used to name the chart artifact
    #[arg(long, value_name = "ID")]
    id: Option<String>,

    /// Drop leading silence from both recordings before scoring
    #[arg(long)]
    trim_silence: bool,

    /// Print the result record as JSON instead of the text report
    #[arg(long)]
    json: bool,
}

impl Args {
    fn validate(&self) -> Result<()> {
        for (label, path) in [("Reference", &self.reference), ("Candidate", &self.candidate)] {
            if !path.exists() {
                anyhow::bail!("{} file does not exist: {:?}", label, path);
            }
            if !path.is_file() {
                anyhow::bail!("{} path is not a file: {:?}", label, path);
            }
        }
        Ok(())
    }

    fn compare_options(&self) -> CompareOptions {
        CompareOptions {
            chart_dir: (!self.no_chart).then(|| self.chart_dir.clone()),
            unique_id: self.id.clone(),
            trim_silence: self.trim_silence,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    args.validate()
        .context("Failed to validate command-line arguments")?;

    let reference = decode_audio(&args.reference)
        .with_context(|| format!("Failed to decode reference audio {:?}", args.reference))?;
    let candidate = decode_audio(&args.candidate)
        .with_context(|| format!("Failed to decode candidate audio {:?}", args.candidate))?;

    let comparator = Comparator::new(args.compare_options());
    let result = comparator
        .compare(&reference, &candidate)
        .context("Comparison failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_report(&result);
    }
    Ok(())
}

fn print_report(result: &ScoreResult) {
    println!(
        "Overall score: {} (0-100, pitch 80% + rhythm 20%)",
        result.score
    );
    println!("\nPitch");
    println!(
        "  error: {} Hz (mean fundamental difference, lower is better)",
        result.pitch_error
    );
    println!("  score: {} (0-100)", result.pitch_score);
    println!("\nRhythm");
    println!(
        "  tempo error: {} (interval-ratio deviation, lower is better)",
        result.rhythm_error
    );
    println!(
        "  stability error: {} (ratio spread, lower is better)",
        result.rhythm_stability_error
    );
    println!(
        "  score: {} (0-100, tempo 40% + stability 60%)",
        result.rhythm_score
    );
    if !result.suggestions.is_empty() {
        println!("\nSuggestions");
        for suggestion in &result.suggestions {
            println!("  - {suggestion}");
        }
    }
    match &result.chart {
        Some(chart) => println!("\nSegment chart written to {:?}", chart),
        None => println!("\nNo segment chart was written"),
    }
}
