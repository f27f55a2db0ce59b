use aus::analysis;
use aus::analysis::mel::MelFilterbank;
use aus::spectrum;
use aus::WindowType;
use ndarray::Array2;

use crate::scoring::{Result, ANALYSIS_SAMPLE_RATE, FRAME_LEN, HOP_LEN, MFCC_COUNT};

const MEL_BANDS: usize = 80;
const MIN_FREQ: f64 = 20.0;

/// Compute one row of cepstral coefficients per analysis frame.
pub(super) fn compute_mfcc(samples: &[f32]) -> Result<Array2<f32>> {
    let audio: Vec<f64> = samples.iter().map(|&s| s as f64).collect();

    let stft = spectrum::rstft(&audio, FRAME_LEN, HOP_LEN, WindowType::Hanning);
    let (magnitude, _) = spectrum::complex_to_polar_rstft(&stft);
    let power = analysis::make_power_spectrogram(&magnitude);

    let freqs = spectrum::rfftfreq(FRAME_LEN, ANALYSIS_SAMPLE_RATE);
    let filterbank = MelFilterbank::new(
        MIN_FREQ,
        (ANALYSIS_SAMPLE_RATE as f64) / 2.0,
        MEL_BANDS,
        &freqs,
        true,
    );
    let mel = analysis::mel::make_mel_spectrogram(&power, &filterbank);
    let mfcc = analysis::mel::mfcc_spectrogram(&mel, MFCC_COUNT, None);

    Ok(matrix_from_rows(&mfcc))
}

fn matrix_from_rows(rows: &[Vec<f64>]) -> Array2<f32> {
    if rows.is_empty() {
        return Array2::zeros((0, MFCC_COUNT));
    }
    let cols = rows[0].len();
    let mut flat = Vec::with_capacity(rows.len() * cols);
    for row in rows {
        flat.extend(row.iter().map(|v| *v as f32));
    }
    Array2::from_shape_vec((rows.len(), cols), flat).expect("rectangular mfcc rows")
}
