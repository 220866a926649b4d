//! Command line tools for planning and flying missions.
//!
//! - `plan_route`: plan once over a colliders file and print the route as JSON
//! - `fly_mission`: fly a full mission against the built-in simulator

pub mod colliders;
pub mod sim;
pub mod sink;

pub use colliders::{load_colliders, parse_colliders};
pub use sink::HttpWaypointSink;
