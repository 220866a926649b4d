//! Mission execution: configuration, the vehicle command channel, telemetry
//! events and the state machine that ties them to the planner.

pub mod config;
pub mod controller;
pub mod error;
pub mod event_loop;
pub mod events;
pub mod sink;
pub mod vehicle;

pub use config::MissionConfig;
pub use controller::{MissionContext, MissionController, MissionState, TelemetrySnapshot};
pub use error::{ConfigError, LinkError, MissionError};
pub use event_loop::{run_event_loop, LoopExit};
pub use events::TelemetryEvent;
pub use sink::WaypointSink;
pub use vehicle::{RecordingLink, VehicleCommand, VehicleLink};
