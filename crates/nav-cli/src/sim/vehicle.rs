//! Point-mass multirotor that answers [`VehicleLink`] commands and streams
//! telemetry back over a channel.

use nav_core::{global_to_local, local_to_global, GeodeticPosition, NedPosition, NedVelocity};
use nav_mission::{LinkError, TelemetryEvent, VehicleCommand, VehicleLink};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, MissedTickBehavior};

/// Below this distance to the setpoint the vehicle snaps onto it.
const SNAP_DISTANCE_M: f64 = 0.02;

#[derive(Debug, Clone, Copy)]
pub struct SimConfig {
    /// Geodetic origin of the simulated world.
    pub origin: GeodeticPosition,
    /// Where the vehicle sits at start, relative to `origin`.
    pub start: NedPosition,
    pub tick: Duration,
    pub max_speed: f64,
    pub max_climb_rate: f64,
    /// Speed per meter of remaining distance, 1/s.
    pub approach_gain: f64,
    pub min_speed: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            origin: GeodeticPosition::default(),
            start: NedPosition::default(),
            tick: Duration::from_millis(100),
            max_speed: 5.0,
            max_climb_rate: 2.0,
            approach_gain: 1.0,
            min_speed: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Setpoint {
    Hold,
    Climb { altitude: f64 },
    Position { north: f64, east: f64, altitude: f64 },
    Land,
}

/// Vehicle state as seen from outside the simulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimSnapshot {
    /// Relative to the simulator origin.
    pub position: NedPosition,
    pub velocity: NedVelocity,
    pub armed: bool,
    pub guided: bool,
    pub home: GeodeticPosition,
}

#[derive(Debug)]
struct SimState {
    position: NedPosition,
    velocity: NedVelocity,
    armed: bool,
    guided: bool,
    origin: GeodeticPosition,
    home: GeodeticPosition,
    setpoint: Setpoint,
}

fn lock(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Command side handed to the mission controller.
#[derive(Debug, Clone)]
pub struct SimLink {
    state: Arc<Mutex<SimState>>,
}

impl VehicleLink for SimLink {
    fn send(&mut self, command: VehicleCommand) -> Result<(), LinkError> {
        let mut state = lock(&self.state);
        let needs_armed = matches!(
            command,
            VehicleCommand::Takeoff { .. } | VehicleCommand::Position { .. }
        );
        if needs_armed && !state.armed {
            return Err(LinkError::Rejected {
                command: command.to_string(),
                reason: "vehicle is disarmed".to_string(),
            });
        }

        tracing::debug!(%command, "sim vehicle command");
        match command {
            VehicleCommand::Arm => state.armed = true,
            VehicleCommand::Disarm => {
                state.armed = false;
                state.setpoint = Setpoint::Hold;
            }
            VehicleCommand::TakeControl => state.guided = true,
            VehicleCommand::ReleaseControl => state.guided = false,
            VehicleCommand::Takeoff { altitude } => state.setpoint = Setpoint::Climb { altitude },
            VehicleCommand::Position {
                north,
                east,
                altitude,
                ..
            } => {
                // Setpoints arrive in the home frame; the simulator integrates
                // in its origin frame.
                let home_frame = NedPosition::new(north, east, -altitude);
                let origin_frame = to_origin_frame(&state, home_frame);
                state.setpoint = Setpoint::Position {
                    north: origin_frame.north,
                    east: origin_frame.east,
                    altitude: origin_frame.altitude(),
                };
            }
            VehicleCommand::Land => state.setpoint = Setpoint::Land,
            VehicleCommand::SetHome { lon, lat, alt } => {
                state.home = GeodeticPosition::new(lon, lat, alt);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Simulator {
    config: SimConfig,
    state: Arc<Mutex<SimState>>,
}

impl Simulator {
    pub fn new(config: SimConfig) -> (Self, SimLink) {
        let state = Arc::new(Mutex::new(SimState {
            position: config.start,
            velocity: NedVelocity::default(),
            armed: false,
            guided: false,
            origin: config.origin,
            home: config.origin,
            setpoint: Setpoint::Hold,
        }));
        let link = SimLink {
            state: Arc::clone(&state),
        };
        (Self { config, state }, link)
    }

    pub fn snapshot(&self) -> SimSnapshot {
        let state = lock(&self.state);
        SimSnapshot {
            position: state.position,
            velocity: state.velocity,
            armed: state.armed,
            guided: state.guided,
            home: state.home,
        }
    }

    /// Advance by `dt` and return the telemetry for the new state.
    pub fn step(&self, dt: Duration) -> Vec<TelemetryEvent> {
        let dt_s = dt.as_secs_f64();
        let mut state = lock(&self.state);

        let before = state.position;
        let (north, east, altitude) = match state.setpoint {
            Setpoint::Hold => (before.north, before.east, before.altitude()),
            Setpoint::Climb { altitude } => (before.north, before.east, altitude),
            Setpoint::Position {
                north,
                east,
                altitude,
            } => (north, east, altitude),
            Setpoint::Land => (before.north, before.east, 0.0),
        };

        let (north, east) = self.approach(
            (before.north, before.east),
            (north, east),
            self.config.max_speed,
            dt_s,
        );
        let (altitude, _) = self.approach(
            (before.altitude(), 0.0),
            (altitude, 0.0),
            self.config.max_climb_rate,
            dt_s,
        );
        let after = NedPosition::new(north, east, -altitude);

        state.position = after;
        state.velocity = if dt_s > 0.0 {
            NedVelocity::new(
                (after.north - before.north) / dt_s,
                (after.east - before.east) / dt_s,
                (after.down - before.down) / dt_s,
            )
        } else {
            NedVelocity::default()
        };

        let global = local_to_global(after, self.config.origin);
        let local = global_to_local(global, state.home);
        vec![
            TelemetryEvent::global_position(global),
            TelemetryEvent::local_position(local),
            TelemetryEvent::local_velocity(state.velocity),
            TelemetryEvent::state(state.armed, state.guided),
        ]
    }

    /// Move from `from` towards `to` at a speed proportional to the remaining
    /// distance, bounded by `[min_speed, max_speed]`.
    fn approach(&self, from: (f64, f64), to: (f64, f64), max_speed: f64, dt_s: f64) -> (f64, f64) {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let distance = dx.hypot(dy);
        let speed = (self.config.approach_gain * distance).clamp(self.config.min_speed, max_speed);
        let step = speed * dt_s;
        if distance <= step.max(SNAP_DISTANCE_M) {
            return to;
        }
        let scale = step / distance;
        (from.0 + dx * scale, from.1 + dy * scale)
    }

    /// Tick until shutdown or until the telemetry receiver goes away.
    pub async fn run(
        self,
        events: mpsc::Sender<TelemetryEvent>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let mut ticker = interval(self.config.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Simulator shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    for event in self.step(self.config.tick) {
                        if events.send(event).await.is_err() {
                            tracing::debug!("telemetry receiver dropped; simulator stopping");
                            return;
                        }
                    }
                }
            }
        }
    }
}

fn to_origin_frame(state: &SimState, home_frame: NedPosition) -> NedPosition {
    global_to_local(local_to_global(home_frame, state.home), state.origin)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim() -> (Simulator, SimLink) {
        Simulator::new(SimConfig {
            origin: GeodeticPosition::new(-122.3974533, 37.7924804, 0.0),
            ..SimConfig::default()
        })
    }

    fn run_for(sim: &Simulator, seconds: f64) {
        let ticks = (seconds / sim.config.tick.as_secs_f64()).ceil() as usize;
        for _ in 0..ticks {
            sim.step(sim.config.tick);
        }
    }

    #[test]
    fn takeoff_requires_arming() {
        let (_sim, mut link) = sim();
        assert!(matches!(link.takeoff(5.0), Err(LinkError::Rejected { .. })));
        link.arm().unwrap();
        assert!(link.takeoff(5.0).is_ok());
    }

    #[test]
    fn climbs_and_lands_exactly() {
        let (sim, mut link) = sim();
        link.arm().unwrap();
        link.takeoff(5.0).unwrap();
        run_for(&sim, 20.0);
        assert_eq!(sim.snapshot().position.altitude(), 5.0);

        link.land().unwrap();
        run_for(&sim, 30.0);
        let snapshot = sim.snapshot();
        assert_eq!(snapshot.position.down, 0.0);
        assert!(snapshot.velocity.vd.abs() < 1.0);
    }

    #[test]
    fn flies_to_position_and_slows_down() {
        let (sim, mut link) = sim();
        link.arm().unwrap();
        link.command_position(10.0, -4.0, 5.0, 0.0).unwrap();
        run_for(&sim, 1.0);
        assert!(sim.snapshot().velocity.vn > 0.0);

        run_for(&sim, 60.0);
        let snapshot = sim.snapshot();
        assert!((snapshot.position.north - 10.0).abs() < 1e-6);
        assert!((snapshot.position.east + 4.0).abs() < 1e-6);
        assert_eq!(snapshot.velocity.horizontal_speed(), 0.0);
    }

    #[test]
    fn step_reports_state_flags() {
        let (sim, mut link) = sim();
        link.arm().unwrap();
        link.take_control().unwrap();
        let events = sim.step(Duration::from_millis(100));
        assert_eq!(events.len(), 4);
        assert!(matches!(
            events[3],
            TelemetryEvent::State {
                armed: true,
                guided: true,
                ..
            }
        ));
    }
}
