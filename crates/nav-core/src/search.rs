//! A* search shared by the raster grid and the skeleton graph.

use crate::error::SearchError;
use crate::geometry::euclidean;
use crate::grid::OccupancyGrid;
use crate::models::GridIndex;
use crate::skeleton::Skeleton;
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::hash::Hash;

/// Graph the search runs over.
///
/// `heuristic` must be admissible and consistent for the returned path to be
/// optimal.
pub trait SearchGraph {
    type Node: Copy + Eq + Hash;

    /// Push `(neighbor, step_cost)` pairs for `node` into `out`.
    fn neighbors(&self, node: Self::Node, out: &mut Vec<(Self::Node, f64)>);

    fn heuristic(&self, node: Self::Node, goal: Self::Node) -> f64;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult<N> {
    /// Start to goal inclusive.
    pub path: Vec<N>,
    pub total_cost: f64,
    pub nodes_expanded: usize,
}

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Frontier entry. Ordered by f, then h, then discovery order.
#[derive(Debug, Clone, Copy)]
struct OpenNode<N> {
    node: N,
    g_score: f64,
    h_score: FloatOrd,
    f_score: FloatOrd,
    seq: u64,
}

impl<N> PartialEq for OpenNode<N> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<N> Eq for OpenNode<N> {}

impl<N> PartialOrd for OpenNode<N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<N> Ord for OpenNode<N> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_score
            .cmp(&other.f_score)
            .then_with(|| self.h_score.cmp(&other.h_score))
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Best-first search from `start` to `goal`.
///
/// Goal validity (bounds, obstruction) is the caller's concern; an
/// unreachable goal ends with an exhausted frontier.
pub fn a_star<G: SearchGraph>(
    graph: &G,
    start: G::Node,
    goal: G::Node,
) -> Result<SearchResult<G::Node>, SearchError> {
    let mut open_set: BinaryHeap<Reverse<OpenNode<G::Node>>> = BinaryHeap::new();
    let mut closed_set: HashSet<G::Node> = HashSet::new();
    let mut g_score: HashMap<G::Node, f64> = HashMap::new();
    let mut came_from: HashMap<G::Node, G::Node> = HashMap::new();
    let mut seq = 0u64;

    let start_h = graph.heuristic(start, goal);
    open_set.push(Reverse(OpenNode {
        node: start,
        g_score: 0.0,
        h_score: FloatOrd(start_h),
        f_score: FloatOrd(start_h),
        seq,
    }));
    g_score.insert(start, 0.0);

    let mut nodes_expanded = 0usize;
    let mut neighbors = Vec::with_capacity(8);

    while let Some(Reverse(current)) = open_set.pop() {
        if closed_set.contains(&current.node) {
            continue;
        }
        let best_g = g_score.get(&current.node).copied().unwrap_or(f64::INFINITY);
        if current.g_score > best_g {
            continue;
        }

        nodes_expanded += 1;

        if current.node == goal {
            let mut path = vec![goal];
            let mut cursor = goal;
            while let Some(&parent) = came_from.get(&cursor) {
                path.push(parent);
                cursor = parent;
            }
            path.reverse();
            return Ok(SearchResult {
                path,
                total_cost: best_g,
                nodes_expanded,
            });
        }

        closed_set.insert(current.node);

        neighbors.clear();
        graph.neighbors(current.node, &mut neighbors);
        for &(next, step_cost) in &neighbors {
            if closed_set.contains(&next) {
                continue;
            }
            let tentative_g = best_g + step_cost;
            if tentative_g < g_score.get(&next).copied().unwrap_or(f64::INFINITY) {
                came_from.insert(next, current.node);
                g_score.insert(next, tentative_g);

                let h_score = graph.heuristic(next, goal);
                seq += 1;
                open_set.push(Reverse(OpenNode {
                    node: next,
                    g_score: tentative_g,
                    h_score: FloatOrd(h_score),
                    f_score: FloatOrd(tentative_g + h_score),
                    seq,
                }));
            }
        }
    }

    Err(SearchError::NoPathFound { nodes_expanded })
}

const SQRT_2: f64 = std::f64::consts::SQRT_2;

const MOVES: [(isize, isize, f64); 8] = [
    (-1, 0, 1.0),
    (1, 0, 1.0),
    (0, -1, 1.0),
    (0, 1, 1.0),
    (-1, -1, SQRT_2),
    (-1, 1, SQRT_2),
    (1, -1, SQRT_2),
    (1, 1, SQRT_2),
];

/// 8-connected free cells of an occupancy grid.
pub struct GridGraph<'a> {
    grid: &'a OccupancyGrid,
}

impl<'a> GridGraph<'a> {
    pub fn new(grid: &'a OccupancyGrid) -> Self {
        Self { grid }
    }
}

impl SearchGraph for GridGraph<'_> {
    type Node = GridIndex;

    fn neighbors(&self, node: GridIndex, out: &mut Vec<(GridIndex, f64)>) {
        for (d_row, d_col, cost) in MOVES {
            if let Some(next) = node.offset(d_row, d_col) {
                if self.grid.is_free(next) {
                    out.push((next, cost));
                }
            }
        }
    }

    fn heuristic(&self, node: GridIndex, goal: GridIndex) -> f64 {
        euclidean(node, goal)
    }
}

/// 8-connected spine cells of a skeleton.
pub struct SkeletonGraph<'a> {
    skeleton: &'a Skeleton,
}

impl<'a> SkeletonGraph<'a> {
    pub fn new(skeleton: &'a Skeleton) -> Self {
        Self { skeleton }
    }
}

impl SearchGraph for SkeletonGraph<'_> {
    type Node = GridIndex;

    fn neighbors(&self, node: GridIndex, out: &mut Vec<(GridIndex, f64)>) {
        for (d_row, d_col, cost) in MOVES {
            if let Some(next) = node.offset(d_row, d_col) {
                if self.skeleton.contains(next) {
                    out.push((next, cost));
                }
            }
        }
    }

    fn heuristic(&self, node: GridIndex, goal: GridIndex) -> f64 {
        euclidean(node, goal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_line_on_empty_grid() {
        let grid = OccupancyGrid::empty(5, 5);
        let result = a_star(
            &GridGraph::new(&grid),
            GridIndex::new(0, 0),
            GridIndex::new(0, 4),
        )
        .unwrap();
        assert_eq!(result.path.len(), 5);
        assert!((result.total_cost - 4.0).abs() < 1e-9);
    }

    #[test]
    fn diagonal_costs_sqrt_two() {
        let grid = OccupancyGrid::empty(4, 4);
        let result = a_star(
            &GridGraph::new(&grid),
            GridIndex::new(0, 0),
            GridIndex::new(3, 3),
        )
        .unwrap();
        assert_eq!(result.path.len(), 4);
        assert!((result.total_cost - 3.0 * SQRT_2).abs() < 1e-9);
    }

    #[test]
    fn routes_around_wall() {
        let mut grid = OccupancyGrid::empty(5, 5);
        for row in 0..4 {
            grid.set_obstructed(GridIndex::new(row, 2), true);
        }
        let result = a_star(
            &GridGraph::new(&grid),
            GridIndex::new(0, 0),
            GridIndex::new(0, 4),
        )
        .unwrap();
        assert!(result.path.iter().all(|cell| grid.is_free(*cell)));
        assert!(result.path.contains(&GridIndex::new(4, 2)));
    }

    #[test]
    fn sealed_goal_reports_no_path() {
        let mut grid = OccupancyGrid::empty(5, 5);
        for col in 0..5 {
            grid.set_obstructed(GridIndex::new(2, col), true);
        }
        let err = a_star(
            &GridGraph::new(&grid),
            GridIndex::new(0, 0),
            GridIndex::new(4, 4),
        )
        .unwrap_err();
        // Two free rows of five cells above the wall.
        assert_eq!(err, SearchError::NoPathFound { nodes_expanded: 10 });
    }

    #[test]
    fn start_equals_goal() {
        let grid = OccupancyGrid::empty(3, 3);
        let result = a_star(
            &GridGraph::new(&grid),
            GridIndex::new(1, 1),
            GridIndex::new(1, 1),
        )
        .unwrap();
        assert_eq!(result.path, vec![GridIndex::new(1, 1)]);
        assert_eq!(result.total_cost, 0.0);
    }

    #[test]
    fn equal_cost_routes_resolve_by_discovery_order() {
        // Blocked centre leaves two mirror routes of cost 2√2 around it.
        let mut grid = OccupancyGrid::empty(3, 3);
        grid.set_obstructed(GridIndex::new(1, 1), true);
        let start = GridIndex::new(1, 0);
        let goal = GridIndex::new(1, 2);

        let result = a_star(&GridGraph::new(&grid), start, goal).unwrap();
        // (0, 1) and (2, 1) tie on f and h; (0, 1) was discovered first.
        assert_eq!(result.path, vec![start, GridIndex::new(0, 1), goal]);
        assert!((result.total_cost - 2.0 * SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn frontier_pops_by_f_then_h_then_seq() {
        let entry = |node: u32, f: f64, h: f64, seq: u64| {
            Reverse(OpenNode {
                node,
                g_score: f - h,
                h_score: FloatOrd(h),
                f_score: FloatOrd(f),
                seq,
            })
        };
        let mut open_set = BinaryHeap::new();
        open_set.push(entry(0, 5.0, 1.0, 0));
        open_set.push(entry(1, 4.0, 3.0, 1));
        open_set.push(entry(2, 4.0, 2.0, 3));
        open_set.push(entry(3, 4.0, 2.0, 2));
        open_set.push(entry(4, 3.0, 3.0, 4));

        let order: Vec<u32> =
            std::iter::from_fn(|| open_set.pop().map(|Reverse(n)| n.node)).collect();
        assert_eq!(order, vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn skeleton_graph_stays_on_spine() {
        let mut cells = vec![vec![false; 12]; 7];
        cells[0] = vec![true; 12];
        cells[6] = vec![true; 12];
        let grid = OccupancyGrid::from_cells(cells);
        let skeleton = Skeleton::from_grid(&grid);
        let start = skeleton.nearest_skeleton_point(GridIndex::new(3, 1)).unwrap();
        let goal = skeleton.nearest_skeleton_point(GridIndex::new(3, 10)).unwrap();
        let result = a_star(&SkeletonGraph::new(&skeleton), start, goal).unwrap();
        assert!(result.path.iter().all(|cell| skeleton.contains(*cell)));
    }
}
