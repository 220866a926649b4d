//! Planning pipeline: grid or skeleton search, pruning, and heading assignment.

use crate::error::{Infeasible, PlanError};
use crate::geometry::heading_to;
use crate::grid::OccupancyGrid;
use crate::models::{GridIndex, NedPosition, Obstacle, Waypoint};
use crate::prune::{prune, PruneMode};
use crate::search::{a_star, GridGraph, SearchResult, SkeletonGraph};
use crate::skeleton::Skeleton;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanMode {
    /// A* over every free grid cell.
    #[default]
    Grid,
    /// A* over the free-space skeleton.
    Skeleton,
}

impl FromStr for PlanMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "grid" => Ok(PlanMode::Grid),
            "skeleton" | "medial_axis" => Ok(PlanMode::Skeleton),
            other => Err(format!("unknown plan mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanConfig {
    pub target_altitude: f64,
    pub safety_distance: f64,
    pub mode: PlanMode,
    pub prune: PruneMode,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            target_altitude: 5.0,
            safety_distance: 5.0,
            mode: PlanMode::Grid,
            prune: PruneMode::LineOfSight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStats {
    pub north_offset: i64,
    pub east_offset: i64,
    pub grid_start: GridIndex,
    pub grid_goal: GridIndex,
    /// Cells in the path before pruning.
    pub dense_points: usize,
    pub nodes_expanded: usize,
    pub path_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedPath {
    pub waypoints: Vec<Waypoint>,
    pub stats: PlanStats,
}

/// Plan from `local_start` to `local_goal` at `config.target_altitude`.
///
/// Only north/east of the start and goal are used. An obstructed or
/// unreachable goal is reported as [`PlanError::Infeasible`] in both modes.
pub fn plan(
    obstacles: &[Obstacle],
    local_start: NedPosition,
    local_goal: NedPosition,
    config: &PlanConfig,
) -> Result<PlannedPath, PlanError> {
    let grid = OccupancyGrid::build(obstacles, config.target_altitude, config.safety_distance)?;
    tracing::debug!(
        rows = grid.rows(),
        cols = grid.cols(),
        north_offset = grid.north_offset(),
        east_offset = grid.east_offset(),
        "occupancy grid built"
    );
    plan_on_grid(&grid, local_start, local_goal, config)
}

/// Same as [`plan`] with a prebuilt grid.
pub fn plan_on_grid(
    grid: &OccupancyGrid,
    local_start: NedPosition,
    local_goal: NedPosition,
    config: &PlanConfig,
) -> Result<PlannedPath, PlanError> {
    let grid_start = grid
        .index_of(local_start.north, local_start.east)
        .ok_or(Infeasible::StartOutOfBounds {
            north: local_start.north,
            east: local_start.east,
        })?;
    let grid_goal = grid
        .index_of(local_goal.north, local_goal.east)
        .ok_or(Infeasible::GoalOutOfBounds {
            north: local_goal.north,
            east: local_goal.east,
        })?;

    if grid.is_obstructed(grid_goal) {
        return Err(Infeasible::GoalObstructed { goal: grid_goal }.into());
    }

    let no_path = |_| Infeasible::NoPathFound {
        start: grid_start,
        goal: grid_goal,
    };

    let search = match config.mode {
        PlanMode::Grid => a_star(&GridGraph::new(grid), grid_start, grid_goal).map_err(no_path)?,
        PlanMode::Skeleton => {
            let skeleton = Skeleton::from_grid(grid);
            let skel_start = skeleton
                .nearest_skeleton_point(grid_start)
                .map_err(|_| Infeasible::SkeletonUnreachable)?;
            let skel_goal = skeleton
                .nearest_skeleton_point(grid_goal)
                .map_err(|_| Infeasible::SkeletonUnreachable)?;
            tracing::debug!(
                spine_cells = skeleton.len(),
                %skel_start,
                %skel_goal,
                "snapped start and goal onto skeleton"
            );
            let on_spine =
                a_star(&SkeletonGraph::new(&skeleton), skel_start, skel_goal).map_err(no_path)?;
            join_endpoints(grid, on_spine, grid_start, grid_goal)
        }
    };

    let pruned = prune(&search.path, config.prune, grid);
    tracing::debug!(
        mode = ?config.mode,
        prune = ?config.prune,
        dense = search.path.len(),
        pruned = pruned.len(),
        nodes_expanded = search.nodes_expanded,
        cost = search.total_cost,
        "path found"
    );

    let mut waypoints: Vec<Waypoint> = pruned
        .iter()
        .map(|index| {
            let (north, east) = grid.to_local(*index);
            Waypoint::new(north, east, config.target_altitude, 0.0)
        })
        .collect();
    assign_headings(&mut waypoints);

    Ok(PlannedPath {
        waypoints,
        stats: PlanStats {
            north_offset: grid.north_offset(),
            east_offset: grid.east_offset(),
            grid_start,
            grid_goal,
            dense_points: search.path.len(),
            nodes_expanded: search.nodes_expanded,
            path_cost: search.total_cost,
        },
    })
}

/// Extend a skeleton path to the true start and goal cells when a straight,
/// obstacle-free line connects them to the snapped ends.
fn join_endpoints(
    grid: &OccupancyGrid,
    mut search: SearchResult<GridIndex>,
    start: GridIndex,
    goal: GridIndex,
) -> SearchResult<GridIndex> {
    if let Some(&first) = search.path.first() {
        if first != start {
            if grid.line_is_clear(start, first) {
                search.total_cost += crate::geometry::euclidean(start, first);
                search.path.insert(0, start);
            } else {
                tracing::warn!(
                    %start,
                    spine = %first,
                    "no clear line from start to skeleton; route begins on the skeleton"
                );
            }
        }
    }
    if let Some(&last) = search.path.last() {
        if last != goal {
            if grid.line_is_clear(last, goal) {
                search.total_cost += crate::geometry::euclidean(last, goal);
                search.path.push(goal);
            } else {
                tracing::warn!(
                    %goal,
                    spine = %last,
                    "no clear line from skeleton to goal; route ends short of the goal cell"
                );
            }
        }
    }
    search
}

/// Point every waypoint after the first along the leg that reaches it.
pub fn assign_headings(waypoints: &mut [Waypoint]) {
    for i in 1..waypoints.len() {
        let prev = waypoints[i - 1];
        let curr = &mut waypoints[i];
        curr.heading = heading_to((prev.north, prev.east), (curr.north, curr.east));
    }
}
