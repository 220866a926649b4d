//! 2.5D occupancy grid at a fixed altitude slice.
//!
//! Cells are one meter square. Row `r` covers north values
//! `[north_offset + r, north_offset + r + 1)`, and likewise for columns/east.

use crate::error::MapError;
use crate::models::{validate_obstacles, GridIndex, Obstacle};

/// Upper bound on `rows * cols`; a 10 km square at one meter per cell.
pub const MAX_GRID_CELLS: usize = 100_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
    north_offset: i64,
    east_offset: i64,
}

impl OccupancyGrid {
    /// Rasterize every obstacle that reaches `target_altitude`, inflating its
    /// footprint by `safety_distance` on each side.
    pub fn build(
        obstacles: &[Obstacle],
        target_altitude: f64,
        safety_distance: f64,
    ) -> Result<Self, MapError> {
        validate_obstacles(obstacles)?;
        if !target_altitude.is_finite() {
            return Err(MapError::InvalidParameter {
                name: "target_altitude",
                value: target_altitude,
            });
        }
        if !safety_distance.is_finite() || safety_distance < 0.0 {
            return Err(MapError::InvalidParameter {
                name: "safety_distance",
                value: safety_distance,
            });
        }

        let mut north_min = f64::INFINITY;
        let mut north_max = f64::NEG_INFINITY;
        let mut east_min = f64::INFINITY;
        let mut east_max = f64::NEG_INFINITY;
        for obstacle in obstacles {
            north_min = north_min.min(obstacle.north - obstacle.half_north);
            north_max = north_max.max(obstacle.north + obstacle.half_north);
            east_min = east_min.min(obstacle.east - obstacle.half_east);
            east_max = east_max.max(obstacle.east + obstacle.half_east);
        }

        let north_offset = north_min.floor();
        let east_offset = east_min.floor();
        let rows = (north_max - north_offset).ceil() + 1.0;
        let cols = (east_max - east_offset).ceil() + 1.0;
        // Float casts saturate, so oversized extents still report sensibly.
        if rows * cols > MAX_GRID_CELLS as f64 {
            return Err(MapError::GridTooLarge {
                rows: rows as usize,
                cols: cols as usize,
                max_cells: MAX_GRID_CELLS,
            });
        }
        let rows = rows as usize;
        let cols = cols as usize;

        let mut grid = Self {
            rows,
            cols,
            cells: vec![false; rows * cols],
            north_offset: north_offset as i64,
            east_offset: east_offset as i64,
        };

        for obstacle in obstacles.iter().filter(|o| o.reaches(target_altitude)) {
            let reach_north = obstacle.half_north + safety_distance;
            let reach_east = obstacle.half_east + safety_distance;
            let (row_lo, row_hi) = clamp_span(
                obstacle.north - reach_north - north_offset,
                obstacle.north + reach_north - north_offset,
                rows,
            );
            let (col_lo, col_hi) = clamp_span(
                obstacle.east - reach_east - east_offset,
                obstacle.east + reach_east - east_offset,
                cols,
            );
            for row in row_lo..=row_hi {
                let start = row * cols;
                grid.cells[start + col_lo..=start + col_hi].fill(true);
            }
        }

        Ok(grid)
    }

    /// Build directly from a cell matrix, `true` = obstructed. Offsets are zero.
    pub fn from_cells(cells: Vec<Vec<bool>>) -> Self {
        let rows = cells.len();
        let cols = cells.first().map(|row| row.len()).unwrap_or(0);
        let mut flat = Vec::with_capacity(rows * cols);
        for row in &cells {
            let mut padded = row.clone();
            padded.resize(cols, true);
            flat.extend(padded);
        }
        Self {
            rows,
            cols,
            cells: flat,
            north_offset: 0,
            east_offset: 0,
        }
    }

    /// Obstacle-free grid of the given size. Offsets are zero.
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![false; rows * cols],
            north_offset: 0,
            east_offset: 0,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn north_offset(&self) -> i64 {
        self.north_offset
    }

    pub fn east_offset(&self) -> i64 {
        self.east_offset
    }

    pub fn in_bounds(&self, index: GridIndex) -> bool {
        index.row < self.rows && index.col < self.cols
    }

    /// Out-of-bounds cells count as obstructed.
    pub fn is_obstructed(&self, index: GridIndex) -> bool {
        !self.in_bounds(index) || self.cells[index.row * self.cols + index.col]
    }

    pub fn is_free(&self, index: GridIndex) -> bool {
        !self.is_obstructed(index)
    }

    pub fn set_obstructed(&mut self, index: GridIndex, obstructed: bool) {
        if self.in_bounds(index) {
            self.cells[index.row * self.cols + index.col] = obstructed;
        }
    }

    /// Cell containing the local (north, east) point, if inside the grid.
    pub fn index_of(&self, north: f64, east: f64) -> Option<GridIndex> {
        if !north.is_finite() || !east.is_finite() {
            return None;
        }
        let row = north.floor() as i64 - self.north_offset;
        let col = east.floor() as i64 - self.east_offset;
        if row < 0 || col < 0 {
            return None;
        }
        let index = GridIndex::new(row as usize, col as usize);
        self.in_bounds(index).then_some(index)
    }

    /// Local (north, east) of a cell's lower corner.
    pub fn to_local(&self, index: GridIndex) -> (f64, f64) {
        (
            (index.row as i64 + self.north_offset) as f64,
            (index.col as i64 + self.east_offset) as f64,
        )
    }

    pub fn free_count(&self) -> usize {
        self.cells.iter().filter(|cell| !**cell).count()
    }

    /// True when every cell on the Bresenham line from `from` to `to` is free.
    pub fn line_is_clear(&self, from: GridIndex, to: GridIndex) -> bool {
        bresenham(from, to).into_iter().all(|cell| self.is_free(cell))
    }
}

fn clamp_span(lo: f64, hi: f64, len: usize) -> (usize, usize) {
    let max = (len - 1) as f64;
    let lo = lo.floor().clamp(0.0, max) as usize;
    let hi = hi.floor().clamp(0.0, max) as usize;
    (lo, hi.max(lo))
}

/// Cells traversed by the discrete line between two cells, endpoints included.
pub fn bresenham(from: GridIndex, to: GridIndex) -> Vec<GridIndex> {
    let mut x0 = from.row as i64;
    let mut y0 = from.col as i64;
    let x1 = to.row as i64;
    let y1 = to.col as i64;

    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx - dy;

    let mut cells = Vec::with_capacity((dx.max(dy) + 1) as usize);
    loop {
        cells.push(GridIndex::new(x0 as usize, y0 as usize));
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x0 += sx;
        }
        if e2 < dx {
            err += dx;
            y0 += sy;
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tower(north: f64, east: f64, half: f64, height: f64) -> Obstacle {
        Obstacle::new(north, east, height / 2.0, half, half, height / 2.0)
    }

    #[test]
    fn build_rejects_empty_obstacle_list() {
        assert_eq!(OccupancyGrid::build(&[], 5.0, 5.0), Err(MapError::Empty));
    }

    #[test]
    fn build_rejects_negative_safety_distance() {
        let obstacles = [tower(0.0, 0.0, 1.0, 10.0)];
        let err = OccupancyGrid::build(&obstacles, 5.0, -1.0).unwrap_err();
        assert!(matches!(err, MapError::InvalidParameter { name: "safety_distance", .. }));
    }

    #[test]
    fn build_rejects_extents_beyond_cell_limit() {
        for far in [1e6, 1e10, 1e300] {
            let obstacles = [tower(0.0, 0.0, 1.0, 10.0), tower(far, far, 1.0, 10.0)];
            let err = OccupancyGrid::build(&obstacles, 5.0, 0.0).unwrap_err();
            assert!(
                matches!(err, MapError::GridTooLarge { max_cells: MAX_GRID_CELLS, .. }),
                "{far}: {err}"
            );
        }
    }

    #[test]
    fn long_thin_map_fits_under_limit() {
        // 20 km by 3 m is long but small.
        let obstacles = [tower(0.0, 0.0, 1.0, 10.0), tower(20_000.0, 0.0, 1.0, 10.0)];
        let grid = OccupancyGrid::build(&obstacles, 5.0, 0.0).unwrap();
        assert_eq!(grid.rows(), 20_003);
        assert_eq!(grid.cols(), 3);
    }

    #[test]
    fn offsets_and_dimensions_follow_extent() {
        let obstacles = [tower(-10.5, 20.0, 2.0, 10.0), tower(10.0, 40.0, 2.0, 10.0)];
        let grid = OccupancyGrid::build(&obstacles, 5.0, 0.0).unwrap();
        assert_eq!(grid.north_offset(), -13);
        assert_eq!(grid.east_offset(), 18);
        // north extent -12.5..12.0, east 18..42
        assert_eq!(grid.rows(), 26);
        assert_eq!(grid.cols(), 25);
    }

    #[test]
    fn safety_margin_inflates_footprint() {
        let obstacles = [tower(0.0, 0.0, 1.0, 10.0), tower(20.0, 20.0, 1.0, 10.0)];
        let grid = OccupancyGrid::build(&obstacles, 5.0, 3.0).unwrap();
        let inside_margin = grid.index_of(3.5, 0.0).unwrap();
        let outside_margin = grid.index_of(5.5, 0.0).unwrap();
        assert!(grid.is_obstructed(inside_margin));
        assert!(grid.is_free(outside_margin));
    }

    #[test]
    fn low_obstacles_are_ignored() {
        let obstacles = [tower(0.0, 0.0, 2.0, 3.0), tower(20.0, 20.0, 2.0, 10.0)];
        let grid = OccupancyGrid::build(&obstacles, 5.0, 0.0).unwrap();
        assert!(grid.is_free(grid.index_of(0.0, 0.0).unwrap()));
        assert!(grid.is_obstructed(grid.index_of(20.0, 20.0).unwrap()));
    }

    #[test]
    fn index_of_rejects_points_outside() {
        let obstacles = [tower(0.0, 0.0, 1.0, 10.0), tower(10.0, 10.0, 1.0, 10.0)];
        let grid = OccupancyGrid::build(&obstacles, 5.0, 0.0).unwrap();
        assert_eq!(grid.index_of(-5.0, 0.0), None);
        assert_eq!(grid.index_of(0.0, 500.0), None);
        let index = grid.index_of(4.2, 6.9).unwrap();
        assert_eq!(grid.to_local(index), (4.0, 6.0));
    }

    #[test]
    fn bresenham_includes_endpoints() {
        let cells = bresenham(GridIndex::new(0, 0), GridIndex::new(3, 1));
        assert_eq!(cells.first(), Some(&GridIndex::new(0, 0)));
        assert_eq!(cells.last(), Some(&GridIndex::new(3, 1)));
        assert_eq!(cells.len(), 4);
    }

    #[test]
    fn line_is_blocked_by_wall() {
        let mut grid = OccupancyGrid::empty(5, 5);
        for row in 0..5 {
            grid.set_obstructed(GridIndex::new(row, 2), true);
        }
        assert!(!grid.line_is_clear(GridIndex::new(0, 0), GridIndex::new(4, 4)));
        assert!(grid.line_is_clear(GridIndex::new(0, 0), GridIndex::new(4, 1)));
    }
}
