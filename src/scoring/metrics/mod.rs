mod pitch;
mod rhythm;

pub use pitch::{score_pitch, PitchSummary};
pub use rhythm::{score_rhythm, RhythmSummary};

use std::path::PathBuf;

use crate::scoring::{ScoreResult, SegmentScore, SEGMENT_CHUNK};

// Pitch accuracy dominates the composite judgment.
const PITCH_WEIGHT: f64 = 0.8;
const RHYTHM_WEIGHT: f64 = 0.2;

const PITCH_HINT_BELOW: f64 = 85.0;
const RHYTHM_HINT_BELOW: f64 = 85.0;
const OVERALL_HINT_BELOW: u32 = 80;

/// Partition the alignment path into fixed-count chunks and score each for
/// pitch and rhythm. Chunks are alignment-path slices, not fixed time
/// windows.
pub fn score_segments(
    path: &[(usize, usize)],
    reference_pitch: &[Option<f64>],
    candidate_pitch: &[Option<f64>],
) -> Vec<SegmentScore> {
    path.chunks(SEGMENT_CHUNK)
        .map(|chunk| SegmentScore {
            pitch: pitch::segment_score(chunk, reference_pitch, candidate_pitch),
            rhythm: rhythm::segment_span_score(chunk),
        })
        .collect()
}

/// Fold the sub-scores into the final record. The overall score is computed
/// from the unrounded sub-scores, then rounded once.
pub fn aggregate(
    pitch: &PitchSummary,
    rhythm: &RhythmSummary,
    segments: &[SegmentScore],
    chart: Option<PathBuf>,
) -> ScoreResult {
    let overall = (pitch.score * PITCH_WEIGHT + rhythm.score * RHYTHM_WEIGHT).round() as u32;
    ScoreResult {
        score: overall,
        pitch_error: round_to(pitch.error_hz, 2),
        rhythm_error: round_to(rhythm.tempo_error, 4),
        rhythm_stability_error: round_to(rhythm.stability_error, 4),
        rhythm_score: rhythm.score.round() as u32,
        pitch_score: pitch.score.round() as u32,
        suggestions: suggestions(pitch.score, rhythm.score, overall),
        segment_scores_pitch: segments.iter().map(|s| s.pitch).collect(),
        segment_scores_rhythm: segments.iter().map(|s| s.rhythm).collect(),
        chart,
    }
}

/// Rule-based, order-stable: pitch hint, then rhythm hint, then the general
/// one. Zero to three may fire.
fn suggestions(pitch_score: f64, rhythm_score: f64, overall: u32) -> Vec<String> {
    let mut hints = Vec::new();
    if pitch_score < PITCH_HINT_BELOW {
        hints.push("Work on pitch accuracy: match the reference notes more closely.".to_string());
    }
    if rhythm_score < RHYTHM_HINT_BELOW {
        hints.push("Tighten up the rhythm: keep note timing consistent with the reference.".to_string());
    }
    if overall < OVERALL_HINT_BELOW {
        hints.push("More practice will improve both accuracy and sense of rhythm.".to_string());
    }
    hints
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
