//! Fixed-resolution spatial histogram over relative map coordinates.

use serde::Serialize;

use crate::geo::{round_to, RelativePoint};

/// Cells per axis.
pub const GRID_SIZE: usize = 50;

/// Cell edge length in percent of the map span.
pub const CELL_PCT: f64 = 100.0 / GRID_SIZE as f64;

/// One non-empty heatmap cell, positioned at its centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatmapCell {
    pub x: f64,
    pub y: f64,
    pub intensity: f64,
}

/// Sample counts binned into a `GRID_SIZE` x `GRID_SIZE` grid.
#[derive(Debug, Clone)]
pub struct HeatmapGrid {
    counts: Vec<u32>,
}

impl Default for HeatmapGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl HeatmapGrid {
    pub fn new() -> Self {
        Self {
            counts: vec![0; GRID_SIZE * GRID_SIZE],
        }
    }

    /// Bin one sample. Positions are clamped into `[0, 100)` first;
    /// non-finite positions are ignored. Returns whether the sample was counted.
    pub fn add(&mut self, position: RelativePoint) -> bool {
        let (Some(col), Some(row)) = (cell_index(position.x), cell_index(position.y)) else {
            return false;
        };
        self.counts[row * GRID_SIZE + col] += 1;
        true
    }

    /// Samples in cell `(col, row)`, or `None` outside the grid.
    pub fn count_at(&self, col: usize, row: usize) -> Option<u32> {
        if col >= GRID_SIZE || row >= GRID_SIZE {
            return None;
        }
        self.counts.get(row * GRID_SIZE + col).copied()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    /// Non-empty cells normalized by the busiest one, row-major order.
    pub fn cells(&self) -> Vec<HeatmapCell> {
        let max = self.counts.iter().copied().max().unwrap_or(0).max(1);

        self.counts
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count > 0)
            .map(|(idx, &count)| {
                let (row, col) = (idx / GRID_SIZE, idx % GRID_SIZE);
                HeatmapCell {
                    x: round_to(col as f64 * CELL_PCT + CELL_PCT / 2.0, 2),
                    y: round_to(row as f64 * CELL_PCT + CELL_PCT / 2.0, 2),
                    intensity: round_to(f64::from(count) / f64::from(max), 3),
                }
            })
            .collect()
    }
}

fn cell_index(value: f64) -> Option<usize> {
    if !value.is_finite() {
        return None;
    }
    let clamped = value.clamp(0.0, 100.0);
    Some(((clamped / CELL_PCT).floor() as usize).min(GRID_SIZE - 1))
}
