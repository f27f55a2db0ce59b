use ndarray::{Array2, ArrayView1};

use crate::scoring::{EngineError, Result};

/// Ordered (referenceFrame, candidateFrame) pairs; monotonically
/// non-decreasing in both coordinates, from (0,0) to the last frames.
pub type AlignmentPath = Vec<(usize, usize)>;

/// Alignment outcome produced by the DTW solver.
#[derive(Debug, Clone)]
pub struct Alignment {
    pub path: AlignmentPath,
    pub cost: f32,
}

// The dp matrix is evaluated inside a Sakoe-Chiba style band around the
// scaled diagonal; cells outside the band stay unreachable. The band keeps
// memory at O(n * radius) instead of O(n * m).
const BAND_RADIUS_MIN: usize = 64;
const BAND_FRACTION: f64 = 0.1;
const MAX_BAND_CELLS: usize = 80_000_000;

const DIR_NONE: u8 = 0;
const DIR_START: u8 = 1;
const DIR_DIAG: u8 = 2;
const DIR_UP: u8 = 3;
const DIR_LEFT: u8 = 4;

/// Compute the minimum-cost monotonic warp between two feature sequences,
/// using Euclidean distance between matched frames. Deterministic for fixed
/// inputs; either sequence being empty yields an empty path.
pub fn align(reference: &Array2<f32>, candidate: &Array2<f32>) -> Result<Alignment> {
    let n = reference.nrows();
    let m = candidate.nrows();
    if n == 0 || m == 0 {
        return Ok(Alignment {
            path: Vec::new(),
            cost: 0.0,
        });
    }

    let radius = band_radius(n, m);
    let windows: Vec<(usize, usize)> = (0..n).map(|i| band_window(i, n, m, radius)).collect();
    let cells: usize = windows.iter().map(|(lo, hi)| hi - lo + 1).sum();
    if cells > MAX_BAND_CELLS {
        return Err(EngineError::AlignmentTooLarge {
            cells,
            limit: MAX_BAND_CELLS,
        });
    }

    let mut offsets = Vec::with_capacity(n);
    let mut acc = 0usize;
    for (lo, hi) in &windows {
        offsets.push(acc);
        acc += hi - lo + 1;
    }
    let mut directions = vec![DIR_NONE; cells];

    let mut prev_row: Vec<f32> = Vec::new();
    let mut prev_lo = 0usize;
    let mut prev_hi = 0usize;
    for i in 0..n {
        let (lo, hi) = windows[i];
        let mut row = vec![f32::INFINITY; hi - lo + 1];
        for j in lo..=hi {
            let idx = j - lo;
            let distance = frame_distance(reference.row(i), candidate.row(j));
            if i == 0 && j == 0 {
                row[idx] = distance;
                directions[offsets[i] + idx] = DIR_START;
                continue;
            }

            let mut best = f32::INFINITY;
            let mut dir = DIR_NONE;
            if i > 0 {
                if j > 0 && j - 1 >= prev_lo && j - 1 <= prev_hi {
                    let cost = prev_row[j - 1 - prev_lo];
                    if cost < best {
                        best = cost;
                        dir = DIR_DIAG;
                    }
                }
                if j >= prev_lo && j <= prev_hi {
                    let cost = prev_row[j - prev_lo];
                    if cost < best {
                        best = cost;
                        dir = DIR_UP;
                    }
                }
            }
            if j > lo {
                let cost = row[idx - 1];
                if cost < best {
                    best = cost;
                    dir = DIR_LEFT;
                }
            }
            if dir != DIR_NONE {
                row[idx] = best + distance;
                directions[offsets[i] + idx] = dir;
            }
        }
        prev_row = row;
        prev_lo = lo;
        prev_hi = hi;
    }

    let cost = prev_row[m - 1 - prev_lo];
    if !cost.is_finite() {
        return Err(EngineError::Alignment(
            "failed to compute a finite alignment cost".to_string(),
        ));
    }

    let path = backtrack(&directions, &offsets, &windows, n, m)?;
    Ok(Alignment { path, cost })
}

fn backtrack(
    directions: &[u8],
    offsets: &[usize],
    windows: &[(usize, usize)],
    n: usize,
    m: usize,
) -> Result<AlignmentPath> {
    let mut path = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (n - 1, m - 1);
    loop {
        path.push((i, j));
        let (lo, _) = windows[i];
        match directions[offsets[i] + (j - lo)] {
            DIR_DIAG => {
                i -= 1;
                j -= 1;
            }
            DIR_UP => i -= 1,
            DIR_LEFT => j -= 1,
            DIR_START => break,
            _ => {
                return Err(EngineError::Alignment(
                    "invalid backtrack cell encountered".to_string(),
                ))
            }
        }
    }
    path.reverse();
    Ok(path)
}

fn band_radius(n: usize, m: usize) -> usize {
    let longest = n.max(m);
    let fraction = (BAND_FRACTION * longest as f64).ceil() as usize;
    fraction.max(n.abs_diff(m)).max(BAND_RADIUS_MIN)
}

fn band_window(i: usize, n: usize, m: usize, radius: usize) -> (usize, usize) {
    let center = if n <= 1 { 0 } else { i * (m - 1) / (n - 1) };
    let lo = center.saturating_sub(radius);
    let hi = (center + radius).min(m - 1);
    (lo, hi)
}

fn frame_distance(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum::<f32>()
        .sqrt()
}
