/// Overall pitch judgment across the aligned frames.
#[derive(Debug, Clone, Copy)]
pub struct PitchSummary {
    /// Mean absolute Hz difference over voiced-voiced pairs; 0 when no pair
    /// qualifies.
    pub error_hz: f64,
    pub score: f64,
}

/// Mean |ΔHz| over aligned pairs where both sides are voiced; pairs with an
/// undefined side are excluded entirely, not counted as zero error.
pub fn score_pitch(
    path: &[(usize, usize)],
    reference: &[Option<f64>],
    candidate: &[Option<f64>],
) -> PitchSummary {
    let error_hz = mean_abs_difference(path, reference, candidate).unwrap_or(0.0);
    PitchSummary {
        error_hz,
        score: score_from_error(error_hz),
    }
}

/// Pitch score for one alignment-path chunk. A chunk with no qualifying pair
/// scores the explicit 0 floor, unlike the overall error which defaults
/// to 0 error (a perfect 100).
pub(super) fn segment_score(
    chunk: &[(usize, usize)],
    reference: &[Option<f64>],
    candidate: &[Option<f64>],
) -> f64 {
    match mean_abs_difference(chunk, reference, candidate) {
        Some(error_hz) => score_from_error(error_hz),
        None => 0.0,
    }
}

fn mean_abs_difference(
    pairs: &[(usize, usize)],
    reference: &[Option<f64>],
    candidate: &[Option<f64>],
) -> Option<f64> {
    let mut total = 0.0;
    let mut count = 0usize;
    for &(ref_idx, cand_idx) in pairs {
        let ref_hz = reference.get(ref_idx).copied().flatten();
        let cand_hz = candidate.get(cand_idx).copied().flatten();
        if let (Some(ref_hz), Some(cand_hz)) = (ref_hz, cand_hz) {
            total += (ref_hz - cand_hz).abs();
            count += 1;
        }
    }
    (count > 0).then(|| total / count as f64)
}

// Linear falloff: 200 Hz of mean error exhausts the score.
fn score_from_error(error_hz: f64) -> f64 {
    (100.0 - error_hz / 2.0).max(0.0)
}
