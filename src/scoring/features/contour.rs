use aus::analysis;

use crate::scoring::{ANALYSIS_SAMPLE_RATE, FRAME_LEN};

// Musically plausible range for monophonic material, C2 through C7.
const FREQ_MIN: f64 = 65.406;
const FREQ_MAX: f64 = 2093.005;

/// Extract a per-frame fundamental-frequency contour aligned 1:1 with the
/// timbral frames. Frames without a confident voiced estimate stay `None`;
/// they are excluded from scoring, never zero-filled.
pub(super) fn extract_pitch_contour(samples: &[f32], frame_count: usize) -> Vec<Option<f64>> {
    if frame_count == 0 {
        return Vec::new();
    }
    let audio: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
    let (_timestamps, pitches, voiced_flags, _confidence) = analysis::pyin_pitch_estimator(
        &audio,
        ANALYSIS_SAMPLE_RATE,
        FREQ_MIN,
        FREQ_MAX,
        FRAME_LEN,
    );
    let contour: Vec<Option<f64>> = pitches
        .iter()
        .zip(voiced_flags.iter())
        .map(|(&pitch, &voiced)| (voiced && pitch.is_finite() && pitch > 0.0).then_some(pitch))
        .collect();
    spread_to_frames(&contour, frame_count)
}

/// Map a contour onto `frame_count` frames by nearest-index sampling. Unlike
/// interpolation this preserves the voiced/unvoiced distinction.
fn spread_to_frames(series: &[Option<f64>], frame_count: usize) -> Vec<Option<f64>> {
    match (frame_count, series.len()) {
        (0, _) => Vec::new(),
        (_, 0) => vec![None; frame_count],
        (count, len) if count == len => series.to_vec(),
        (count, len) => (0..count)
            .map(|frame| {
                let denom = (count - 1).max(1);
                let position = (frame as f64 * (len - 1) as f64 / denom as f64).round() as usize;
                series[position.min(len - 1)]
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::spread_to_frames;

    #[test]
    fn equal_lengths_pass_through() {
        let series = vec![Some(440.0), None, Some(880.0)];
        assert_eq!(spread_to_frames(&series, 3), series);
    }

    #[test]
    fn stretching_preserves_unvoiced_frames() {
        let series = vec![Some(440.0), None];
        let spread = spread_to_frames(&series, 4);
        assert_eq!(spread.len(), 4);
        assert_eq!(spread[0], Some(440.0));
        assert_eq!(spread[3], None);
    }

    #[test]
    fn empty_series_maps_to_all_unvoiced() {
        let spread = spread_to_frames(&[], 5);
        assert_eq!(spread, vec![None; 5]);
    }

    #[test]
    fn zero_frames_yields_empty() {
        assert!(spread_to_frames(&[Some(100.0)], 0).is_empty());
    }
}
