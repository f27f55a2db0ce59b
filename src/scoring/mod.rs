//! Performance-comparison pipeline: features → alignment → metrics → report.
//!
//! The engine is stateless; every comparison runs start-to-finish on its own
//! buffers with no shared state between calls.

pub mod alignment;
pub mod chart;
pub mod features;
pub mod metrics;
pub mod onset;

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::audio::{resample, trim};
use crate::types::AudioData;

/// Convenient alias for results returned by scoring modules.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Fixed analysis rate; every signal is resampled here so frame-to-time
/// conversion is uniform across comparisons.
pub const ANALYSIS_SAMPLE_RATE: u32 = 16_000;
/// STFT frame length in samples at the analysis rate.
pub const FRAME_LEN: usize = 2048;
/// STFT hop length in samples at the analysis rate.
pub const HOP_LEN: usize = 512;
/// Cepstral coefficients per timbral frame.
pub const MFCC_COUNT: usize = 20;
/// Alignment-path entries per scoring segment.
pub const SEGMENT_CHUNK: usize = 10;
/// Hard per-recording ceiling; longer inputs are rejected, never truncated.
pub const MAX_ANALYSIS_SECS: f64 = 600.0;

const TRIM_ENERGY_THRESHOLD: f32 = 0.02;

/// Error taxonomy for the scoring engine. Musically-ambiguous inputs (silence,
/// sparse onsets, degenerate segments) degrade to documented defaults instead
/// of erroring; only resource and artifact failures surface here.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("recording is {actual:.1}s long, over the {limit:.0}s scoring limit")]
    RecordingTooLong { actual: f64, limit: f64 },
    #[error("alignment needs {cells} matrix cells, over the {limit} cell budget")]
    AlignmentTooLarge { cells: usize, limit: usize },
    #[error("alignment failed: {0}")]
    Alignment(String),
    #[error("feature extraction failed: {0}")]
    Feature(String),
    #[error("failed to write chart artifact at {path:?}")]
    ChartWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A (pitch, rhythm) score pair for one contiguous slice of the alignment path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentScore {
    pub pitch: f64,
    pub rhythm: f64,
}

/// The engine's output record. Immutable once built; ownership passes to the
/// caller.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreResult {
    pub score: u32,
    pub pitch_error: f64,
    pub rhythm_error: f64,
    pub rhythm_stability_error: f64,
    pub rhythm_score: u32,
    pub pitch_score: u32,
    pub suggestions: Vec<String>,
    pub segment_scores_pitch: Vec<f64>,
    pub segment_scores_rhythm: Vec<f64>,
    pub chart: Option<PathBuf>,
}

/// Request-scoped comparison parameters. The engine holds no state beyond
/// these.
#[derive(Debug, Clone, Default)]
pub struct CompareOptions {
    /// Where to write the segment-score chart; `None` skips rendering.
    pub chart_dir: Option<PathBuf>,
    /// Names the chart artifact; a timestamp is used when absent.
    pub unique_id: Option<String>,
    /// Drop leading silence from both recordings before analysis.
    pub trim_silence: bool,
}

/// Compares a candidate performance against a reference rendition.
#[derive(Debug, Default)]
pub struct Comparator {
    options: CompareOptions,
}

impl Comparator {
    pub fn new(options: CompareOptions) -> Self {
        Self { options }
    }

    /// Run the full pipeline and produce a [`ScoreResult`].
    ///
    /// A chart-write failure is reported as a warning and leaves
    /// `chart: None`; the numeric scores are never invalidated by it.
    pub fn compare(&self, reference: &AudioData, candidate: &AudioData) -> Result<ScoreResult> {
        ensure_duration(reference)?;
        ensure_duration(candidate)?;

        let (reference, candidate) = if self.options.trim_silence {
            (
                trim::trim_leading_silence(reference, TRIM_ENERGY_THRESHOLD),
                trim::trim_leading_silence(candidate, TRIM_ENERGY_THRESHOLD),
            )
        } else {
            (reference.clone(), candidate.clone())
        };

        let extractor = features::FeatureExtractor::new();
        let ref_features = extractor.extract(&reference)?;
        let cand_features = extractor.extract(&candidate)?;
        debug!(
            reference_frames = ref_features.frame_count,
            candidate_frames = cand_features.frame_count,
            "timbral features extracted"
        );

        let detector = onset::OnsetDetector::new();
        let ref_onsets = detector.detect(&reference)?;
        let cand_onsets = detector.detect(&candidate)?;
        debug!(
            reference_onsets = ref_onsets.len(),
            candidate_onsets = cand_onsets.len(),
            "onset timelines extracted"
        );

        let aligned = alignment::align(&ref_features.mfcc, &cand_features.mfcc)?;
        debug!(
            path_len = aligned.path.len(),
            cost = aligned.cost,
            "sequences aligned"
        );

        let pitch = metrics::score_pitch(&aligned.path, &ref_features.pitch, &cand_features.pitch);
        let rhythm = metrics::score_rhythm(&ref_onsets, &cand_onsets);
        let segments =
            metrics::score_segments(&aligned.path, &ref_features.pitch, &cand_features.pitch);

        let chart = self.render_chart(&segments);
        let result = metrics::aggregate(&pitch, &rhythm, &segments, chart);
        info!(
            score = result.score,
            pitch_score = result.pitch_score,
            rhythm_score = result.rhythm_score,
            "comparison complete"
        );
        Ok(result)
    }

    fn render_chart(&self, segments: &[SegmentScore]) -> Option<PathBuf> {
        let dir = self.options.chart_dir.as_ref()?;
        let pitch: Vec<f64> = segments.iter().map(|s| s.pitch).collect();
        let rhythm: Vec<f64> = segments.iter().map(|s| s.rhythm).collect();
        let renderer = chart::ChartRenderer::new(dir.clone());
        match renderer.render(&pitch, &rhythm, self.options.unique_id.as_deref()) {
            Ok(path) => Some(path),
            Err(err) => {
                warn!(error = %err, "chart rendering failed; returning scores without artifact");
                None
            }
        }
    }
}

fn ensure_duration(audio: &AudioData) -> Result<()> {
    let actual = audio.duration_secs();
    if actual > MAX_ANALYSIS_SECS {
        return Err(EngineError::RecordingTooLong {
            actual,
            limit: MAX_ANALYSIS_SECS,
        });
    }
    Ok(())
}

/// Bring a signal to the fixed analysis rate.
pub(crate) fn to_analysis_rate(audio: &AudioData) -> Result<Vec<f32>> {
    if audio.sample_rate == ANALYSIS_SAMPLE_RATE {
        return Ok(audio.samples.clone());
    }
    resample::linear_resample(&audio.samples, audio.sample_rate, ANALYSIS_SAMPLE_RATE)
        .map_err(|err| EngineError::Feature(err.to_string()))
}
