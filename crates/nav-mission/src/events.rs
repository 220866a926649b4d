//! Telemetry events delivered by the vehicle.

use chrono::{DateTime, Utc};
use nav_core::{GeodeticPosition, NedPosition, NedVelocity};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    LocalPosition {
        position: NedPosition,
        timestamp: DateTime<Utc>,
    },
    LocalVelocity {
        velocity: NedVelocity,
        timestamp: DateTime<Utc>,
    },
    GlobalPosition {
        position: GeodeticPosition,
        timestamp: DateTime<Utc>,
    },
    State {
        armed: bool,
        guided: bool,
        timestamp: DateTime<Utc>,
    },
}

impl TelemetryEvent {
    pub fn local_position(position: NedPosition) -> Self {
        Self::LocalPosition {
            position,
            timestamp: Utc::now(),
        }
    }

    pub fn local_velocity(velocity: NedVelocity) -> Self {
        Self::LocalVelocity {
            velocity,
            timestamp: Utc::now(),
        }
    }

    pub fn global_position(position: GeodeticPosition) -> Self {
        Self::GlobalPosition {
            position,
            timestamp: Utc::now(),
        }
    }

    pub fn state(armed: bool, guided: bool) -> Self {
        Self::State {
            armed,
            guided,
            timestamp: Utc::now(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::LocalPosition { timestamp, .. }
            | Self::LocalVelocity { timestamp, .. }
            | Self::GlobalPosition { timestamp, .. }
            | Self::State { timestamp, .. } => *timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let event = TelemetryEvent::state(true, false);
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(json["type"], "state");
        assert_eq!(json["armed"], true);
        let back: TelemetryEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
