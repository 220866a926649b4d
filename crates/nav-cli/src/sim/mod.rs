//! Kinematic vehicle simulator for exercising missions without hardware.

mod vehicle;

pub use vehicle::{SimConfig, SimLink, SimSnapshot, Simulator};
