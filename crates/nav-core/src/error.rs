//! Error types for grid construction, search and planning.

use crate::models::GridIndex;
use thiserror::Error;

/// Obstacle input that cannot produce a grid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    #[error("obstacle list is empty")]
    Empty,
    #[error("obstacle {index} has a non-finite coordinate")]
    NonFinite { index: usize },
    #[error("home position is not finite")]
    NonFiniteHome,
    #[error("{name} must be finite and non-negative, got {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("obstacle extents need a {rows}x{cols} grid, over the {max_cells} cell limit")]
    GridTooLarge {
        rows: usize,
        cols: usize,
        max_cells: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkeletonError {
    #[error("skeleton is empty, no free-space graph to snap onto")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("no path found after expanding {nodes_expanded} nodes")]
    NoPathFound { nodes_expanded: usize },
}

/// Goal or start that the pipeline cannot connect.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Infeasible {
    #[error("start ({north:.1}, {east:.1}) lies outside the grid")]
    StartOutOfBounds { north: f64, east: f64 },
    #[error("goal ({north:.1}, {east:.1}) lies outside the grid")]
    GoalOutOfBounds { north: f64, east: f64 },
    #[error("goal cell {goal} is inside an obstacle or its safety margin")]
    GoalObstructed { goal: GridIndex },
    #[error("free-space skeleton is empty")]
    SkeletonUnreachable,
    #[error("no path from {start} to {goal}")]
    NoPathFound { start: GridIndex, goal: GridIndex },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("invalid obstacle map: {0}")]
    InvalidMap(#[from] MapError),
    #[error("infeasible goal: {0}")]
    Infeasible(#[from] Infeasible),
}

impl PlanError {
    pub fn is_infeasible(&self) -> bool {
        matches!(self, PlanError::Infeasible(_))
    }
}
