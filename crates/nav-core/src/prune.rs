//! Path simplification.
//!
//! Both strategies select a subsequence of the dense search path and keep
//! its endpoints untouched.

use crate::grid::OccupancyGrid;
use crate::models::GridIndex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const COLLINEARITY_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PruneMode {
    /// Drop interior points lying on a straight line with their neighbors.
    Collinearity,
    /// Skip every point the grid allows a straight shot past.
    #[default]
    LineOfSight,
    /// Keep the dense path.
    None,
}

impl FromStr for PruneMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "collinearity" => Ok(PruneMode::Collinearity),
            "line_of_sight" | "bresenham" => Ok(PruneMode::LineOfSight),
            "none" => Ok(PruneMode::None),
            other => Err(format!("unknown prune mode '{other}'")),
        }
    }
}

/// Apply the selected strategy. `grid` is only consulted for line of sight.
pub fn prune(path: &[GridIndex], mode: PruneMode, grid: &OccupancyGrid) -> Vec<GridIndex> {
    match mode {
        PruneMode::Collinearity => collinearity_prune(path),
        PruneMode::LineOfSight => line_of_sight_prune(path, grid),
        PruneMode::None => path.to_vec(),
    }
}

fn is_collinear(p1: GridIndex, p2: GridIndex, p3: GridIndex) -> bool {
    let (x1, y1) = (p1.row as f64, p1.col as f64);
    let (x2, y2) = (p2.row as f64, p2.col as f64);
    let (x3, y3) = (p3.row as f64, p3.col as f64);
    let det = (x2 - x1) * (y3 - y1) - (y2 - y1) * (x3 - x1);
    det.abs() < COLLINEARITY_EPSILON
}

/// Remove middle points of collinear triples until none remain.
pub fn collinearity_prune(path: &[GridIndex]) -> Vec<GridIndex> {
    let mut pruned: Vec<GridIndex> = Vec::with_capacity(path.len());
    for &point in path {
        // After a removal the new last pair is re-checked against `point`,
        // so one pass reaches the fixed point.
        while let [.., p1, p2] = pruned[..] {
            if !is_collinear(p1, p2, point) {
                break;
            }
            pruned.pop();
        }
        pruned.push(point);
    }
    pruned
}

/// Greedy shortcutting: from each kept point jump to the furthest later point
/// reachable by a clear Bresenham line.
pub fn line_of_sight_prune(path: &[GridIndex], grid: &OccupancyGrid) -> Vec<GridIndex> {
    if path.len() <= 2 {
        return path.to_vec();
    }

    let mut pruned = vec![path[0]];
    let mut current_idx = 0usize;

    while current_idx < path.len() - 1 {
        let mut furthest_valid = current_idx + 1;
        for target_idx in (current_idx + 2)..path.len() {
            if grid.line_is_clear(path[current_idx], path[target_idx]) {
                furthest_valid = target_idx;
            }
        }
        pruned.push(path[furthest_valid]);
        current_idx = furthest_valid;
    }

    pruned
}
