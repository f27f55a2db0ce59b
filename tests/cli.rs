use std::f32::consts::PI;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn write_melody_wav(path: &Path, note_secs: f64) {
    let sample_rate = 16_000u32;
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let frequencies = [440.0f32, 493.88, 523.25, 587.33, 659.25, 523.25];
    let note_len = (note_secs * sample_rate as f64) as usize;
    for frequency in frequencies {
        for i in 0..note_len {
            let t = i as f32 / sample_rate as f32;
            let sample = (2.0 * PI * frequency * t).sin() * 0.6;
            writer
                .write_sample((sample * i16::MAX as f32) as i16)
                .unwrap();
        }
        for _ in 0..note_len / 2 {
            writer.write_sample(0i16).unwrap();
        }
    }
    writer.finalize().unwrap();
}

#[test]
fn scores_identical_recordings_and_writes_the_chart() {
    let dir = tempfile::tempdir().unwrap();
    let reference = dir.path().join("reference.wav");
    let charts = dir.path().join("charts");
    write_melody_wav(&reference, 0.4);

    Command::cargo_bin("tonalyzer")
        .unwrap()
        .arg(&reference)
        .arg(&reference)
        .arg("--chart-dir")
        .arg(&charts)
        .arg("--id")
        .arg("cli")
        .assert()
        .success()
        .stdout(predicate::str::contains("Overall score: 100"));

    assert!(charts.join("segment_scores_cli.svg").exists());
}

#[test]
fn json_output_is_a_parseable_record() {
    let dir = tempfile::tempdir().unwrap();
    let reference = dir.path().join("reference.wav");
    write_melody_wav(&reference, 0.4);

    let output = Command::cargo_bin("tonalyzer")
        .unwrap()
        .arg(&reference)
        .arg(&reference)
        .arg("--no-chart")
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let record: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(record["score"], 100);
    assert_eq!(record["pitch_score"], 100);
    assert!(record["suggestions"].as_array().unwrap().is_empty());
    assert!(record["chart"].is_null());
    assert_eq!(
        record["segment_scores_pitch"].as_array().unwrap().len(),
        record["segment_scores_rhythm"].as_array().unwrap().len()
    );
}

#[test]
fn missing_input_fails_with_a_clear_message() {
    Command::cargo_bin("tonalyzer")
        .unwrap()
        .arg("missing-reference.wav")
        .arg("missing-candidate.wav")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}
