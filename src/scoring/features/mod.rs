mod cepstrum;
mod contour;

use ndarray::Array2;

use crate::scoring::{to_analysis_rate, Result, FRAME_LEN, MFCC_COUNT};
use crate::types::AudioData;

/// Root-mean-square floor under which a signal is treated as silence.
const SILENCE_RMS: f32 = 1e-5;

/// Per-frame timbral features plus the paired pitch contour.
///
/// `mfcc` has one row per analysis frame; `pitch` has exactly one entry per
/// frame, `None` where no confident voiced estimate exists.
#[derive(Debug, Clone)]
pub struct PerformanceFeatures {
    pub frame_count: usize,
    pub mfcc: Array2<f32>,
    pub pitch: Vec<Option<f64>>,
}

impl PerformanceFeatures {
    fn empty() -> Self {
        Self {
            frame_count: 0,
            mfcc: Array2::zeros((0, MFCC_COUNT)),
            pitch: Vec::new(),
        }
    }
}

/// Responsible for preparing timbral and pitch features from raw audio.
#[derive(Debug, Default)]
pub struct FeatureExtractor {}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure transform: silence or sub-frame input yields empty features
    /// rather than an error; downstream scoring handles zero-length
    /// sequences.
    pub fn extract(&self, audio: &AudioData) -> Result<PerformanceFeatures> {
        let samples = to_analysis_rate(audio)?;
        if samples.len() < FRAME_LEN || rms(&samples) < SILENCE_RMS {
            return Ok(PerformanceFeatures::empty());
        }

        let mfcc = cepstrum::compute_mfcc(&samples)?;
        let frame_count = mfcc.nrows();
        let pitch = contour::extract_pitch_contour(&samples, frame_count);
        debug_assert_eq!(pitch.len(), frame_count);

        Ok(PerformanceFeatures {
            frame_count,
            mfcc,
            pitch,
        })
    }
}

fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let energy: f32 = samples.iter().map(|s| s * s).sum();
    (energy / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::ANALYSIS_SAMPLE_RATE;

    fn sine(frequency: f32, duration_secs: f32) -> AudioData {
        let total = (ANALYSIS_SAMPLE_RATE as f32 * duration_secs) as usize;
        let samples = (0..total)
            .map(|i| {
                let t = i as f32 / ANALYSIS_SAMPLE_RATE as f32;
                (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.5
            })
            .collect();
        AudioData {
            samples,
            sample_rate: ANALYSIS_SAMPLE_RATE,
        }
    }

    #[test]
    fn tone_produces_frames_with_paired_contour() {
        let features = FeatureExtractor::new().extract(&sine(440.0, 1.0)).unwrap();
        assert!(features.frame_count > 0);
        assert_eq!(features.mfcc.nrows(), features.frame_count);
        assert_eq!(features.mfcc.ncols(), MFCC_COUNT);
        assert_eq!(features.pitch.len(), features.frame_count);
    }

    #[test]
    fn silence_yields_empty_features() {
        let audio = AudioData {
            samples: vec![0.0; ANALYSIS_SAMPLE_RATE as usize],
            sample_rate: ANALYSIS_SAMPLE_RATE,
        };
        let features = FeatureExtractor::new().extract(&audio).unwrap();
        assert_eq!(features.frame_count, 0);
        assert!(features.pitch.is_empty());
    }

    #[test]
    fn sub_frame_input_yields_empty_features() {
        let audio = AudioData {
            samples: vec![0.3; FRAME_LEN / 2],
            sample_rate: ANALYSIS_SAMPLE_RATE,
        };
        let features = FeatureExtractor::new().extract(&audio).unwrap();
        assert_eq!(features.frame_count, 0);
    }
}
