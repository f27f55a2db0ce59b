use aus::spectrum;
use aus::WindowType;

use crate::scoring::{to_analysis_rate, Result, ANALYSIS_SAMPLE_RATE, FRAME_LEN, HOP_LEN};
use crate::types::AudioData;

// Peak picking runs over the max-normalized flux curve: a frame is an onset
// when it is a strict local maximum, clears the local median by PEAK_DELTA,
// and sits at least MIN_GAP_FRAMES after the previous onset.
const MEDIAN_HALF_WINDOW: usize = 8;
const PEAK_DELTA: f64 = 0.1;
const MIN_GAP_FRAMES: usize = 2;

/// Extracts note-attack timestamps via rectified spectral flux.
#[derive(Debug, Default)]
pub struct OnsetDetector {}

impl OnsetDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure transform: returns a strictly increasing timeline in seconds.
    /// No minimum count is enforced; sparse or empty timelines are the
    /// caller's concern.
    pub fn detect(&self, audio: &AudioData) -> Result<Vec<f64>> {
        let samples = to_analysis_rate(audio)?;
        if samples.len() < FRAME_LEN {
            return Ok(Vec::new());
        }
        let audio_f64: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
        let stft = spectrum::rstft(&audio_f64, FRAME_LEN, HOP_LEN, WindowType::Hanning);
        let (magnitude, _) = spectrum::complex_to_polar_rstft(&stft);

        let flux = spectral_flux(&magnitude);
        Ok(pick_peaks(&flux)
            .into_iter()
            .map(frame_to_secs)
            .collect())
    }
}

/// Sum of rectified bin-wise magnitude increases between adjacent frames.
fn spectral_flux(magnitude: &[Vec<f64>]) -> Vec<f64> {
    if magnitude.is_empty() {
        return Vec::new();
    }
    let mut flux = Vec::with_capacity(magnitude.len());
    flux.push(0.0);
    for t in 1..magnitude.len() {
        let rise: f64 = magnitude[t]
            .iter()
            .zip(magnitude[t - 1].iter())
            .map(|(curr, prev)| (curr - prev).max(0.0))
            .sum();
        flux.push(rise);
    }
    flux
}

fn pick_peaks(flux: &[f64]) -> Vec<usize> {
    let peak = flux.iter().copied().fold(0.0_f64, f64::max);
    if peak <= 0.0 || flux.len() < 3 {
        return Vec::new();
    }
    let normalized: Vec<f64> = flux.iter().map(|&f| f / peak).collect();

    let mut onsets = Vec::new();
    let mut last_peak: Option<usize> = None;
    for t in 1..normalized.len() - 1 {
        if normalized[t] <= normalized[t - 1] || normalized[t] <= normalized[t + 1] {
            continue;
        }
        if let Some(last) = last_peak {
            if t - last <= MIN_GAP_FRAMES {
                continue;
            }
        }
        let start = t.saturating_sub(MEDIAN_HALF_WINDOW);
        let end = (t + MEDIAN_HALF_WINDOW + 1).min(normalized.len());
        if normalized[t] > median(&normalized[start..end]) + PEAK_DELTA {
            onsets.push(t);
            last_peak = Some(t);
        }
    }
    onsets
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

fn frame_to_secs(frame: usize) -> f64 {
    frame as f64 * HOP_LEN as f64 / ANALYSIS_SAMPLE_RATE as f64
}
