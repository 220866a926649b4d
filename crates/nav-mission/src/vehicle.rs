//! Command channel to the vehicle.

use crate::error::LinkError;
use serde::{Deserialize, Serialize};

/// Commands the controller issues.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VehicleCommand {
    Arm,
    Disarm,
    TakeControl,
    ReleaseControl,
    Takeoff {
        altitude: f64,
    },
    Position {
        north: f64,
        east: f64,
        altitude: f64,
        heading: f64,
    },
    Land,
    SetHome {
        lon: f64,
        lat: f64,
        alt: f64,
    },
}

impl std::fmt::Display for VehicleCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Arm => write!(f, "arm"),
            Self::Disarm => write!(f, "disarm"),
            Self::TakeControl => write!(f, "take_control"),
            Self::ReleaseControl => write!(f, "release_control"),
            Self::Takeoff { altitude } => write!(f, "takeoff({altitude:.1})"),
            Self::Position {
                north,
                east,
                altitude,
                heading,
            } => write!(f, "position({north:.1}, {east:.1}, {altitude:.1}, {heading:.2})"),
            Self::Land => write!(f, "land"),
            Self::SetHome { lon, lat, alt } => write!(f, "set_home({lon:.6}, {lat:.6}, {alt:.1})"),
        }
    }
}

/// Outbound half of a vehicle connection.
///
/// Implementors provide [`VehicleLink::send`]; the named helpers wrap it.
pub trait VehicleLink {
    fn send(&mut self, command: VehicleCommand) -> Result<(), LinkError>;

    fn arm(&mut self) -> Result<(), LinkError> {
        self.send(VehicleCommand::Arm)
    }

    fn disarm(&mut self) -> Result<(), LinkError> {
        self.send(VehicleCommand::Disarm)
    }

    fn take_control(&mut self) -> Result<(), LinkError> {
        self.send(VehicleCommand::TakeControl)
    }

    fn release_control(&mut self) -> Result<(), LinkError> {
        self.send(VehicleCommand::ReleaseControl)
    }

    fn takeoff(&mut self, altitude: f64) -> Result<(), LinkError> {
        self.send(VehicleCommand::Takeoff { altitude })
    }

    fn command_position(
        &mut self,
        north: f64,
        east: f64,
        altitude: f64,
        heading: f64,
    ) -> Result<(), LinkError> {
        self.send(VehicleCommand::Position {
            north,
            east,
            altitude,
            heading,
        })
    }

    fn land(&mut self) -> Result<(), LinkError> {
        self.send(VehicleCommand::Land)
    }

    fn set_home(&mut self, lon: f64, lat: f64, alt: f64) -> Result<(), LinkError> {
        self.send(VehicleCommand::SetHome { lon, lat, alt })
    }
}

impl<V: VehicleLink + ?Sized> VehicleLink for Box<V> {
    fn send(&mut self, command: VehicleCommand) -> Result<(), LinkError> {
        (**self).send(command)
    }
}

/// Link that keeps every command it is given. Used for dry runs.
#[derive(Debug, Default, Clone)]
pub struct RecordingLink {
    commands: Vec<VehicleCommand>,
    fail_with: Option<LinkError>,
}

impl RecordingLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link whose every send fails with `err`; nothing is recorded.
    pub fn failing(err: LinkError) -> Self {
        Self {
            commands: Vec::new(),
            fail_with: Some(err),
        }
    }

    pub fn commands(&self) -> &[VehicleCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<VehicleCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl VehicleLink for RecordingLink {
    fn send(&mut self, command: VehicleCommand) -> Result<(), LinkError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        self.commands.push(command);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_forward_to_send() {
        let mut link = RecordingLink::new();
        link.arm().unwrap();
        link.command_position(1.0, 2.0, 5.0, 0.5).unwrap();
        assert_eq!(
            link.commands(),
            &[
                VehicleCommand::Arm,
                VehicleCommand::Position {
                    north: 1.0,
                    east: 2.0,
                    altitude: 5.0,
                    heading: 0.5
                }
            ]
        );
    }

    #[test]
    fn failing_link_records_nothing() {
        let mut link = RecordingLink::failing(LinkError::Disconnected);
        assert_eq!(link.land(), Err(LinkError::Disconnected));
        assert!(link.commands().is_empty());
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(VehicleCommand::Takeoff { altitude: 5.0 }.to_string(), "takeoff(5.0)");
    }
}
