//! Core planning logic: frames, occupancy grid, free-space skeleton, A* and
//! path pruning.

pub mod error;
pub mod geometry;
pub mod grid;
pub mod models;
pub mod planner;
pub mod prune;
pub mod search;
pub mod skeleton;

pub use error::{Infeasible, MapError, PlanError, SearchError, SkeletonError};
pub use geometry::{global_to_local, heading_to, local_to_global};
pub use grid::{bresenham, OccupancyGrid};
pub use models::{
    GeodeticPosition, GridIndex, NedPosition, NedVelocity, Obstacle, ObstacleMap, Waypoint,
};
pub use planner::{
    assign_headings, plan, plan_on_grid, PlanConfig, PlanMode, PlanStats, PlannedPath,
};
pub use prune::{collinearity_prune, line_of_sight_prune, prune, PruneMode};
pub use search::{a_star, GridGraph, SearchGraph, SearchResult, SkeletonGraph};
pub use skeleton::Skeleton;
