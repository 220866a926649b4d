//! Mission state machine.
//!
//! Each telemetry event updates the [`TelemetrySnapshot`] and then runs the
//! handler for its kind. Handlers only act when the current state's exit
//! condition holds, so repeated events are harmless.

use crate::config::MissionConfig;
use crate::error::MissionError;
use crate::events::TelemetryEvent;
use crate::sink::WaypointSink;
use crate::vehicle::{VehicleCommand, VehicleLink};
use nav_core::geometry::horizontal_distance;
use nav_core::{
    global_to_local, plan_on_grid, GeodeticPosition, NedPosition, NedVelocity, ObstacleMap,
    OccupancyGrid, PlanError, PlanStats, Waypoint,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// Fraction of the target altitude that completes takeoff.
const TAKEOFF_ALTITUDE_FRACTION: f64 = 0.95;
/// Horizontal distance at which a waypoint counts as reached.
const WAYPOINT_RADIUS_M: f64 = 1.0;
/// Horizontal speed below which the final waypoint may be left for landing.
const LANDING_SPEED_LIMIT_MPS: f64 = 1.0;
const LANDED_ALTITUDE_TOLERANCE_M: f64 = 0.1;
const LANDED_DOWN_TOLERANCE_M: f64 = 0.01;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionState {
    #[default]
    Manual,
    Arming,
    Takeoff,
    Planning,
    Waypoint,
    Landing,
    Disarming,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissionContext {
    pub target_position: Waypoint,
    pub pending_waypoints: VecDeque<Waypoint>,
    pub in_mission: bool,
}

/// Latest values reported by the vehicle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub local_position: NedPosition,
    pub local_velocity: NedVelocity,
    pub global_position: Option<GeodeticPosition>,
    /// Recorded when the controller sets home during planning.
    pub global_home: Option<GeodeticPosition>,
    pub armed: bool,
    pub guided: bool,
}

impl TelemetrySnapshot {
    fn altitude_above_home(&self) -> f64 {
        match (self.global_position, self.global_home) {
            (Some(position), Some(home)) => position.alt - home.alt,
            _ => self.local_position.altitude(),
        }
    }
}

pub struct MissionController<V: VehicleLink> {
    mission_id: Uuid,
    span: tracing::Span,
    config: MissionConfig,
    map: ObstacleMap,
    grid: OccupancyGrid,
    vehicle: V,
    sink: Option<Box<dyn WaypointSink>>,
    state: MissionState,
    context: MissionContext,
    telemetry: TelemetrySnapshot,
    last_plan: Option<PlanStats>,
    abort_reason: Option<PlanError>,
}

impl<V: VehicleLink> MissionController<V> {
    /// Validate `config` and rasterize `map` once for the whole mission.
    pub fn new(config: MissionConfig, map: ObstacleMap, vehicle: V) -> Result<Self, MissionError> {
        config.validate()?;
        let grid = OccupancyGrid::build(
            map.obstacles(),
            config.target_altitude,
            config.safety_distance,
        )?;
        let mission_id = Uuid::new_v4();
        let span = tracing::info_span!("mission", id = %mission_id);

        span.in_scope(|| {
            tracing::info!(
                obstacles = map.obstacles().len(),
                rows = grid.rows(),
                cols = grid.cols(),
                free_cells = grid.free_count(),
                plan_mode = ?config.plan_mode,
                prune_mode = ?config.prune_mode,
                "Mission controller ready"
            );
        });

        Ok(Self {
            mission_id,
            span,
            config,
            map,
            grid,
            vehicle,
            sink: None,
            state: MissionState::Manual,
            context: MissionContext {
                in_mission: true,
                ..MissionContext::default()
            },
            telemetry: TelemetrySnapshot::default(),
            last_plan: None,
            abort_reason: None,
        })
    }

    pub fn with_sink(mut self, sink: impl WaypointSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn mission_id(&self) -> Uuid {
        self.mission_id
    }

    pub fn state(&self) -> MissionState {
        self.state
    }

    pub fn context(&self) -> &MissionContext {
        &self.context
    }

    pub fn telemetry(&self) -> &TelemetrySnapshot {
        &self.telemetry
    }

    pub fn config(&self) -> &MissionConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.context.in_mission
    }

    /// Statistics of the most recent successful plan.
    pub fn last_plan(&self) -> Option<&PlanStats> {
        self.last_plan.as_ref()
    }

    /// Why planning sent the vehicle straight to landing, if it did.
    pub fn abort_reason(&self) -> Option<&PlanError> {
        self.abort_reason.as_ref()
    }

    pub fn vehicle(&self) -> &V {
        &self.vehicle
    }

    pub fn vehicle_mut(&mut self) -> &mut V {
        &mut self.vehicle
    }

    pub fn into_vehicle(self) -> V {
        self.vehicle
    }

    pub fn handle_event(&mut self, event: TelemetryEvent) {
        let span = self.span.clone();
        let _entered = span.enter();

        match event {
            TelemetryEvent::LocalPosition { position, .. } => {
                self.telemetry.local_position = position;
                self.on_local_position();
            }
            TelemetryEvent::LocalVelocity { velocity, .. } => {
                self.telemetry.local_velocity = velocity;
                self.on_velocity();
            }
            TelemetryEvent::GlobalPosition { position, .. } => {
                self.telemetry.global_position = Some(position);
            }
            TelemetryEvent::State { armed, guided, .. } => {
                self.telemetry.armed = armed;
                self.telemetry.guided = guided;
                self.on_state();
            }
        }
    }

    fn on_local_position(&mut self) {
        match self.state {
            MissionState::Takeoff => {
                let threshold = TAKEOFF_ALTITUDE_FRACTION * self.context.target_position.altitude;
                if self.telemetry.local_position.altitude() > threshold {
                    self.waypoint_transition();
                }
            }
            MissionState::Waypoint => {
                let position = self.telemetry.local_position;
                let target = self.context.target_position;
                let distance = horizontal_distance(
                    (target.north, target.east),
                    (position.north, position.east),
                );
                let speed = self.telemetry.local_velocity.horizontal_speed();
                if distance < WAYPOINT_RADIUS_M {
                    if !self.context.pending_waypoints.is_empty() {
                        self.waypoint_transition();
                    } else if speed < LANDING_SPEED_LIMIT_MPS {
                        self.landing_transition();
                    }
                }
            }
            _ => {}
        }
    }

    fn on_velocity(&mut self) {
        if self.state != MissionState::Landing {
            return;
        }
        if self.telemetry.altitude_above_home() < LANDED_ALTITUDE_TOLERANCE_M
            && self.telemetry.local_position.down.abs() < LANDED_DOWN_TOLERANCE_M
        {
            self.disarming_transition();
        }
    }

    fn on_state(&mut self) {
        if !self.context.in_mission {
            return;
        }
        match self.state {
            MissionState::Manual => self.arming_transition(),
            MissionState::Arming => {
                if self.telemetry.armed {
                    self.plan_path();
                }
            }
            MissionState::Planning => {
                if self.telemetry.armed {
                    self.takeoff_transition();
                }
            }
            MissionState::Disarming => {
                if !self.telemetry.armed && !self.telemetry.guided {
                    self.manual_transition();
                }
            }
            _ => {}
        }
    }

    fn arming_transition(&mut self) {
        tracing::info!("arming transition");
        self.command(VehicleCommand::Arm);
        self.command(VehicleCommand::TakeControl);
        self.state = MissionState::Arming;
    }

    fn plan_path(&mut self) {
        let Some(global_position) = self.telemetry.global_position else {
            tracing::warn!("armed without a global position fix; waiting to plan");
            return;
        };

        self.state = MissionState::Planning;
        tracing::info!("searching for a path");

        let home = self.map.home();
        let home = GeodeticPosition::new(home.lon, home.lat, 0.0);
        self.command(VehicleCommand::SetHome {
            lon: home.lon,
            lat: home.lat,
            alt: home.alt,
        });
        self.telemetry.global_home = Some(home);

        let local_start = global_to_local(global_position, home);
        let local_goal = global_to_local(self.config.goal, home);
        tracing::info!(
            start_north = local_start.north,
            start_east = local_start.east,
            goal_north = local_goal.north,
            goal_east = local_goal.east,
            "local start and goal"
        );

        self.context.target_position.altitude = self.config.target_altitude;

        match plan_on_grid(&self.grid, local_start, local_goal, &self.config.plan_config()) {
            Ok(planned) => {
                tracing::info!(
                    waypoints = planned.waypoints.len(),
                    dense_points = planned.stats.dense_points,
                    nodes_expanded = planned.stats.nodes_expanded,
                    cost = planned.stats.path_cost,
                    "path planned"
                );
                if let Some(sink) = self.sink.as_mut() {
                    if let Err(err) = sink.publish(&planned.waypoints) {
                        tracing::warn!(error = %err, "failed to publish waypoints");
                    }
                }
                self.context.pending_waypoints = planned.waypoints.into();
                self.last_plan = Some(planned.stats);
            }
            Err(err) => {
                tracing::warn!(error = %err, "goal is infeasible; landing");
                self.abort_reason = Some(err);
                self.landing_transition();
            }
        }
    }

    fn takeoff_transition(&mut self) {
        tracing::info!(altitude = self.context.target_position.altitude, "takeoff transition");
        self.command(VehicleCommand::Takeoff {
            altitude: self.context.target_position.altitude,
        });
        self.state = MissionState::Takeoff;
    }

    fn waypoint_transition(&mut self) {
        let Some(next) = self.context.pending_waypoints.pop_front() else {
            return;
        };
        self.context.target_position = next;
        tracing::info!(
            north = next.north,
            east = next.east,
            altitude = next.altitude,
            heading = next.heading,
            remaining = self.context.pending_waypoints.len(),
            "waypoint transition"
        );
        self.command(VehicleCommand::Position {
            north: next.north,
            east: next.east,
            altitude: next.altitude,
            heading: next.heading,
        });
        self.state = MissionState::Waypoint;
    }

    fn landing_transition(&mut self) {
        tracing::info!("landing transition");
        self.command(VehicleCommand::Land);
        self.state = MissionState::Landing;
    }

    fn disarming_transition(&mut self) {
        tracing::info!("disarm transition");
        self.command(VehicleCommand::Disarm);
        self.command(VehicleCommand::ReleaseControl);
        self.state = MissionState::Disarming;
    }

    fn manual_transition(&mut self) {
        tracing::info!("manual transition; mission complete");
        self.context = MissionContext::default();
        self.state = MissionState::Manual;
    }

    fn command(&mut self, command: VehicleCommand) {
        if let Err(err) = self.vehicle.send(command) {
            tracing::warn!(%command, error = %err, "vehicle command failed");
        }
    }
}
