//! Single-consumer loop feeding telemetry into a [`MissionController`].

use crate::controller::MissionController;
use crate::events::TelemetryEvent;
use crate::vehicle::VehicleLink;
use tokio::sync::{broadcast, mpsc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The controller returned to manual control.
    MissionComplete,
    /// Every event sender was dropped.
    ChannelClosed,
    Shutdown,
}

/// Drive `controller` until the mission ends, the telemetry channel closes, or
/// a shutdown signal arrives.
pub async fn run_event_loop<V: VehicleLink>(
    controller: &mut MissionController<V>,
    mut events: mpsc::Receiver<TelemetryEvent>,
    mut shutdown: broadcast::Receiver<()>,
) -> LoopExit {
    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!(
                    mission = %controller.mission_id(),
                    "Mission event loop shutting down"
                );
                return LoopExit::Shutdown;
            }
            event = events.recv() => {
                let Some(event) = event else {
                    tracing::warn!(
                        mission = %controller.mission_id(),
                        state = ?controller.state(),
                        "telemetry channel closed"
                    );
                    return LoopExit::ChannelClosed;
                };
                controller.handle_event(event);
                if !controller.is_active() {
                    return LoopExit::MissionComplete;
                }
            }
        }
    }
}
