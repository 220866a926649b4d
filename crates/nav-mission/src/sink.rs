//! Best-effort consumers of a freshly planned route.

use nav_core::Waypoint;

/// Receives every route the controller plans.
///
/// Errors are logged by the controller and otherwise ignored.
pub trait WaypointSink: Send {
    fn publish(&mut self, waypoints: &[Waypoint]) -> anyhow::Result<()>;
}

impl<F> WaypointSink for F
where
    F: FnMut(&[Waypoint]) -> anyhow::Result<()> + Send,
{
    fn publish(&mut self, waypoints: &[Waypoint]) -> anyhow::Result<()> {
        self(waypoints)
    }
}
