//! Topological skeleton of free space.
//!
//! Zhang-Suen thinning over the free cells of an [`OccupancyGrid`], giving a
//! one-cell-wide "road network" that stays as far from obstacles as the
//! raster allows. Cells outside the grid are treated as obstructed.

use crate::error::SkeletonError;
use crate::geometry::euclidean;
use crate::grid::OccupancyGrid;
use crate::models::GridIndex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skeleton {
    rows: usize,
    cols: usize,
    mask: Vec<bool>,
}

// P2..P9, clockwise from the cell above.
const RING: [(isize, isize); 8] = [
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
];

impl Skeleton {
    /// Thin the free-space mask of `grid` until no cell can be removed
    /// without breaking connectivity.
    pub fn from_grid(grid: &OccupancyGrid) -> Self {
        let rows = grid.rows();
        let cols = grid.cols();
        let mut mask = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                mask.push(grid.is_free(GridIndex::new(row, col)));
            }
        }
        let mut skeleton = Self { rows, cols, mask };
        skeleton.thin();
        skeleton
    }

    fn thin(&mut self) {
        let mut passes = 0usize;
        let mut removals = Vec::new();
        loop {
            let mut changed = false;
            for sub_pass in 0..2 {
                removals.clear();
                for row in 0..self.rows {
                    for col in 0..self.cols {
                        if self.mask[row * self.cols + col] && self.removable(row, col, sub_pass) {
                            removals.push(row * self.cols + col);
                        }
                    }
                }
                for &cell in &removals {
                    self.mask[cell] = false;
                }
                changed |= !removals.is_empty();
            }
            passes += 1;
            if !changed {
                break;
            }
        }
        tracing::trace!(passes, cells = self.len(), "skeleton thinning converged");
    }

    fn removable(&self, row: usize, col: usize, sub_pass: usize) -> bool {
        let mut p = [false; 8];
        for (slot, (d_row, d_col)) in p.iter_mut().zip(RING) {
            *slot = GridIndex::new(row, col)
                .offset(d_row, d_col)
                .is_some_and(|n| self.contains(n));
        }

        let neighbors = p.iter().filter(|v| **v).count();
        if !(2..=6).contains(&neighbors) {
            return false;
        }

        let transitions = (0..8).filter(|&i| !p[i] && p[(i + 1) % 8]).count();
        if transitions != 1 {
            return false;
        }

        let [p2, _, p4, _, p6, _, p8, _] = p;
        if sub_pass == 0 {
            !(p2 && p4 && p6) && !(p4 && p6 && p8)
        } else {
            !(p2 && p4 && p8) && !(p2 && p6 && p8)
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Whether `index` is a spine cell.
    pub fn contains(&self, index: GridIndex) -> bool {
        index.row < self.rows
            && index.col < self.cols
            && self.mask[index.row * self.cols + index.col]
    }

    pub fn len(&self) -> usize {
        self.mask.iter().filter(|cell| **cell).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.mask.iter().any(|cell| *cell)
    }

    /// Spine cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = GridIndex> + '_ {
        self.mask
            .iter()
            .enumerate()
            .filter(|(_, cell)| **cell)
            .map(move |(i, _)| GridIndex::new(i / self.cols, i % self.cols))
    }

    /// Spine cell closest to `query`; ties go to the first in row-major order.
    pub fn nearest_skeleton_point(&self, query: GridIndex) -> Result<GridIndex, SkeletonError> {
        let mut best: Option<(GridIndex, f64)> = None;
        for cell in self.cells() {
            let distance = euclidean(cell, query);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((cell, distance));
            }
        }
        best.map(|(cell, _)| cell).ok_or(SkeletonError::Empty)
    }
}
