use crate::scoring::{ANALYSIS_SAMPLE_RATE, HOP_LEN};

/// Two-term rhythm judgment from onset-interval ratios. Deliberately
/// independent of the DTW path: warping stretches sequences and would mask
/// genuine tempo differences.
#[derive(Debug, Clone, Copy)]
pub struct RhythmSummary {
    pub score: f64,
    /// |median interval ratio − 1|: overall speed deviation.
    pub tempo_error: f64,
    /// Standard deviation of the interval ratios: timing consistency.
    pub stability_error: f64,
}

// Documented thresholds, not defaults of convenience: fewer than 3 onsets on
// either side means rhythm judgment is meaningless, so the neutral 50 is
// returned with zero errors rather than a penalty or a failure.
const MIN_ONSETS: usize = 3;
const NEUTRAL_SCORE: f64 = 50.0;
const INTERVAL_EPSILON: f64 = 1e-10;
const ERROR_SLOPE: f64 = 200.0;
const TEMPO_WEIGHT: f64 = 0.4;
const STABILITY_WEIGHT: f64 = 0.6;

pub fn score_rhythm(reference_onsets: &[f64], candidate_onsets: &[f64]) -> RhythmSummary {
    if reference_onsets.len() < MIN_ONSETS || candidate_onsets.len() < MIN_ONSETS {
        return RhythmSummary {
            score: NEUTRAL_SCORE,
            tempo_error: 0.0,
            stability_error: 0.0,
        };
    }

    let reference_intervals = intervals(reference_onsets);
    let candidate_intervals = intervals(candidate_onsets);
    let paired = reference_intervals.len().min(candidate_intervals.len());
    let ratios: Vec<f64> = (0..paired)
        .map(|k| candidate_intervals[k] / (reference_intervals[k] + INTERVAL_EPSILON))
        .collect();

    let tempo_error = (median(&ratios) - 1.0).abs();
    let stability_error = std_dev(&ratios);
    let tempo_score = (100.0 - tempo_error * ERROR_SLOPE).clamp(0.0, 100.0);
    let stability_score = (100.0 - stability_error * ERROR_SLOPE).clamp(0.0, 100.0);

    RhythmSummary {
        // A consistently fast or slow performer reads better than an erratic
        // one, so stability carries the larger weight.
        score: tempo_score * TEMPO_WEIGHT + stability_score * STABILITY_WEIGHT,
        tempo_error,
        stability_error,
    }
}

/// Approximate per-chunk rhythm score: the time span the reference frames
/// cover against the span the candidate frames cover. Neutral when either
/// span is degenerate.
pub(super) fn segment_span_score(chunk: &[(usize, usize)]) -> f64 {
    let (Some(first), Some(last)) = (chunk.first(), chunk.last()) else {
        return NEUTRAL_SCORE;
    };
    let reference_span = frame_to_secs(last.0) - frame_to_secs(first.0);
    let candidate_span = frame_to_secs(last.1) - frame_to_secs(first.1);
    if reference_span <= 0.0 || candidate_span <= 0.0 {
        return NEUTRAL_SCORE;
    }
    let ratio = candidate_span / reference_span;
    (100.0 - (ratio - 1.0).abs() * 100.0).max(0.0)
}

fn intervals(onsets: &[f64]) -> Vec<f64> {
    onsets.windows(2).map(|pair| pair[1] - pair[0]).collect()
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

fn frame_to_secs(frame: usize) -> f64 {
    frame as f64 * HOP_LEN as f64 / ANALYSIS_SAMPLE_RATE as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn identical_timelines_score_full_marks() {
        let onsets: Vec<f64> = (0..8).map(|i| i as f64 * 0.5).collect();
        let summary = score_rhythm(&onsets, &onsets);
        assert_abs_diff_eq!(summary.tempo_error, 0.0, epsilon = 1e-8);
        assert_abs_diff_eq!(summary.stability_error, 0.0, epsilon = 1e-8);
        assert_relative_eq!(summary.score, 100.0, epsilon = 1e-6);
    }

    #[test]
    fn uniformly_faster_candidate_keeps_full_stability() {
        // Reference at 0.5s spacing, candidate scaled by 0.8: the worked
        // example. Tempo 60, stability 100, rhythm 84.
        let reference: Vec<f64> = (0..9).map(|i| i as f64 * 0.5).collect();
        let candidate: Vec<f64> = (0..9).map(|i| i as f64 * 0.4).collect();
        let summary = score_rhythm(&reference, &candidate);
        assert_abs_diff_eq!(summary.tempo_error, 0.2, epsilon = 1e-6);
        assert_abs_diff_eq!(summary.stability_error, 0.0, epsilon = 1e-6);
        assert_relative_eq!(summary.score, 84.0, epsilon = 1e-4);
    }

    #[test]
    fn interval_scaling_is_scale_invariant() {
        for k in [0.5, 0.9, 1.1, 1.5] {
            let reference: Vec<f64> = (0..12).map(|i| i as f64 * 0.25).collect();
            let candidate: Vec<f64> = reference.iter().map(|t| t * k).collect();
            let summary = score_rhythm(&reference, &candidate);
            assert_abs_diff_eq!(summary.tempo_error, (k - 1.0_f64).abs(), epsilon = 1e-6);
            assert_abs_diff_eq!(summary.stability_error, 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn erratic_candidate_scores_below_uniformly_fast_one() {
        let reference: Vec<f64> = (0..9).map(|i| i as f64 * 0.5).collect();
        let fast: Vec<f64> = (0..9).map(|i| i as f64 * 0.4).collect();
        let erratic: Vec<f64> = vec![0.0, 0.2, 0.9, 1.1, 1.9, 2.2, 3.1, 3.3, 4.2];
        let fast_summary = score_rhythm(&reference, &fast);
        let erratic_summary = score_rhythm(&reference, &erratic);
        assert!(fast_summary.score > erratic_summary.score);
    }

    #[test]
    fn sparse_onsets_return_the_neutral_default() {
        let reference: Vec<f64> = (0..5).map(|i| i as f64 * 0.5).collect();
        let candidate = vec![1.0];
        let summary = score_rhythm(&reference, &candidate);
        assert_relative_eq!(summary.score, 50.0);
        assert_relative_eq!(summary.tempo_error, 0.0);
        assert_relative_eq!(summary.stability_error, 0.0);
    }

    #[test]
    fn empty_timelines_return_the_neutral_default() {
        let summary = score_rhythm(&[], &[]);
        assert_relative_eq!(summary.score, 50.0);
    }

    #[test]
    fn uniform_warp_segment_scores_by_span_ratio() {
        // Candidate frames advance at half the reference rate.
        let chunk: Vec<(usize, usize)> = (0..10).map(|i| (i * 2, i)).collect();
        let score = segment_span_score(&chunk);
        assert_relative_eq!(score, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn degenerate_segment_span_is_neutral() {
        // Reference frozen on one frame.
        let chunk: Vec<(usize, usize)> = (0..5).map(|i| (3, i)).collect();
        assert_relative_eq!(segment_span_score(&chunk), 50.0);
        assert_relative_eq!(segment_span_score(&[]), 50.0);
        // Candidate frozen on one frame.
        let chunk: Vec<(usize, usize)> = (0..5).map(|i| (i, 3)).collect();
        assert_relative_eq!(segment_span_score(&chunk), 50.0);
    }
}
