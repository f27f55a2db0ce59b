use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::scoring::{EngineError, Result};

// Stacked bars: pitch below, rhythm above, y capped at 200 for the stack.
const Y_MAX: f64 = 200.0;
const PLOT_WIDTH: f64 = 1200.0;
const PLOT_HEIGHT: f64 = 360.0;
const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 50.0;
const PITCH_COLOR: &str = "#1f77b4";
const RHYTHM_COLOR: &str = "#ff7f0e";
const GRID_COLOR: &str = "#cccccc";

/// Renders the per-segment score chart and persists it as a uniquely named
/// SVG artifact. External collaborator boundary: the engine only needs the
/// returned locator.
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    output_dir: PathBuf,
}

impl ChartRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Write the chart and return its path. `unique_id` names the file;
    /// without one, a millisecond timestamp keeps artifacts from colliding.
    pub fn render(
        &self,
        pitch_scores: &[f64],
        rhythm_scores: &[f64],
        unique_id: Option<&str>,
    ) -> Result<PathBuf> {
        let name = match unique_id {
            Some(id) => format!("segment_scores_{id}.svg"),
            None => format!("segment_scores_{}.svg", unix_millis()),
        };
        let path = self.output_dir.join(name);
        let svg = render_svg(pitch_scores, rhythm_scores);
        fs::create_dir_all(&self.output_dir).map_err(|source| chart_error(&path, source))?;
        fs::write(&path, svg).map_err(|source| chart_error(&path, source))?;
        Ok(path)
    }
}

fn chart_error(path: &Path, source: std::io::Error) -> EngineError {
    EngineError::ChartWrite {
        path: path.to_path_buf(),
        source,
    }
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

fn render_svg(pitch_scores: &[f64], rhythm_scores: &[f64]) -> String {
    let segments = pitch_scores.len().max(rhythm_scores.len());
    let inner_width = PLOT_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let inner_height = PLOT_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let slot = if segments > 0 {
        inner_width / segments as f64
    } else {
        inner_width
    };
    let bar_width = slot * 0.6;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{PLOT_WIDTH}" height="{PLOT_HEIGHT}" viewBox="0 0 {PLOT_WIDTH} {PLOT_HEIGHT}">"#
    );
    let _ = writeln!(
        svg,
        r#"<rect width="{PLOT_WIDTH}" height="{PLOT_HEIGHT}" fill="white"/>"#
    );
    let _ = writeln!(
        svg,
        r#"<text x="{x}" y="24" text-anchor="middle" font-family="sans-serif" font-size="16">Segment Scores: Pitch and Rhythm</text>"#,
        x = PLOT_WIDTH / 2.0
    );

    // Horizontal gridlines every 50 points.
    for level in (0..=(Y_MAX as usize)).step_by(50) {
        let y = MARGIN_TOP + inner_height * (1.0 - level as f64 / Y_MAX);
        let _ = writeln!(
            svg,
            r#"<line x1="{x1}" y1="{y:.1}" x2="{x2}" y2="{y:.1}" stroke="{GRID_COLOR}" stroke-dasharray="4 3"/>"#,
            x1 = MARGIN_LEFT,
            x2 = PLOT_WIDTH - MARGIN_RIGHT
        );
        let _ = writeln!(
            svg,
            r#"<text x="{x}" y="{ty:.1}" text-anchor="end" font-family="sans-serif" font-size="11">{level}</text>"#,
            x = MARGIN_LEFT - 8.0,
            ty = y + 4.0
        );
    }

    for index in 0..segments {
        let pitch = pitch_scores.get(index).copied().unwrap_or(0.0).clamp(0.0, Y_MAX);
        let rhythm = rhythm_scores.get(index).copied().unwrap_or(0.0).clamp(0.0, Y_MAX);
        let x = MARGIN_LEFT + index as f64 * slot + (slot - bar_width) / 2.0;

        let pitch_height = inner_height * pitch / Y_MAX;
        let pitch_y = MARGIN_TOP + inner_height - pitch_height;
        let _ = writeln!(
            svg,
            r#"<rect x="{x:.1}" y="{pitch_y:.1}" width="{bar_width:.1}" height="{pitch_height:.1}" fill="{PITCH_COLOR}"/>"#
        );

        let rhythm_height = (inner_height * rhythm / Y_MAX).min(pitch_y - MARGIN_TOP);
        let rhythm_y = pitch_y - rhythm_height;
        let _ = writeln!(
            svg,
            r#"<rect x="{x:.1}" y="{rhythm_y:.1}" width="{bar_width:.1}" height="{rhythm_height:.1}" fill="{RHYTHM_COLOR}"/>"#
        );

        let _ = writeln!(
            svg,
            r#"<text x="{cx:.1}" y="{ty:.1}" text-anchor="middle" font-family="sans-serif" font-size="11">{index}</text>"#,
            cx = x + bar_width / 2.0,
            ty = PLOT_HEIGHT - MARGIN_BOTTOM + 16.0
        );
    }

    // Axis labels and legend.
    let _ = writeln!(
        svg,
        r#"<text x="{x}" y="{y}" text-anchor="middle" font-family="sans-serif" font-size="13">Time Segment</text>"#,
        x = PLOT_WIDTH / 2.0,
        y = PLOT_HEIGHT - 12.0
    );
    let _ = writeln!(
        svg,
        r#"<text x="16" y="{y}" text-anchor="middle" font-family="sans-serif" font-size="13" transform="rotate(-90 16 {y})">Score (0~100)</text>"#,
        y = PLOT_HEIGHT / 2.0
    );
    let legend_x = PLOT_WIDTH - MARGIN_RIGHT - 150.0;
    let _ = writeln!(
        svg,
        r#"<rect x="{legend_x}" y="{y}" width="12" height="12" fill="{PITCH_COLOR}"/><text x="{tx}" y="{ty}" font-family="sans-serif" font-size="12">Pitch Score</text>"#,
        y = MARGIN_TOP,
        tx = legend_x + 18.0,
        ty = MARGIN_TOP + 10.0
    );
    let _ = writeln!(
        svg,
        r#"<rect x="{legend_x}" y="{y}" width="12" height="12" fill="{RHYTHM_COLOR}"/><text x="{tx}" y="{ty}" font-family="sans-serif" font-size="12">Rhythm Score</text>"#,
        y = MARGIN_TOP + 18.0,
        tx = legend_x + 18.0,
        ty = MARGIN_TOP + 28.0
    );
    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_writes_a_named_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = ChartRenderer::new(dir.path());
        let path = renderer
            .render(&[80.0, 95.5], &[50.0, 100.0], Some("unit"))
            .unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "segment_scores_unit.svg"
        );
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("<svg"));
        assert!(contents.contains("Pitch Score"));
    }

    #[test]
    fn timestamped_names_are_used_without_an_id() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = ChartRenderer::new(dir.path());
        let path = renderer.render(&[70.0], &[80.0], None).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("segment_scores_"));
        assert!(name.ends_with(".svg"));
    }

    #[test]
    fn one_stacked_pair_of_bars_per_segment() {
        let svg = render_svg(&[100.0, 40.0, 0.0], &[50.0, 50.0, 50.0]);
        let bars = svg
            .matches(&format!(r#"fill="{PITCH_COLOR}""#))
            .count()
            + svg.matches(&format!(r#"fill="{RHYTHM_COLOR}""#)).count();
        // One legend swatch per series on top of the per-segment bars.
        assert_eq!(bars, 3 * 2 + 2);
    }

    #[test]
    fn empty_segments_still_produce_valid_svg() {
        let svg = render_svg(&[], &[]);
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn unwritable_directory_surfaces_a_chart_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocking_file = dir.path().join("blocked");
        fs::write(&blocking_file, b"not a directory").unwrap();
        let renderer = ChartRenderer::new(&blocking_file);
        let err = renderer.render(&[10.0], &[10.0], Some("x")).unwrap_err();
        assert!(matches!(err, EngineError::ChartWrite { .. }));
    }
}
