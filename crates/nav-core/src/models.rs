//! Core data models for mission planning.

use crate::error::MapError;
use serde::{Deserialize, Serialize};

/// Geodetic position in decimal degrees and meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeodeticPosition {
    pub lon: f64,
    pub lat: f64,
    pub alt: f64,
}

impl GeodeticPosition {
    pub fn new(lon: f64, lat: f64, alt: f64) -> Self {
        Self { lon, lat, alt }
    }

    pub fn is_finite(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite() && self.alt.is_finite()
    }
}

/// Local tangent-plane position (north/east/down) relative to a home point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NedPosition {
    pub north: f64,
    pub east: f64,
    pub down: f64,
}

impl NedPosition {
    pub fn new(north: f64, east: f64, down: f64) -> Self {
        Self { north, east, down }
    }

    /// Height above home (positive up).
    pub fn altitude(&self) -> f64 {
        -self.down
    }
}

/// Local tangent-plane velocity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NedVelocity {
    pub vn: f64,
    pub ve: f64,
    pub vd: f64,
}

impl NedVelocity {
    pub fn new(vn: f64, ve: f64, vd: f64) -> Self {
        Self { vn, ve, vd }
    }

    pub fn horizontal_speed(&self) -> f64 {
        self.vn.hypot(self.ve)
    }
}

/// Cell index in an occupancy grid or skeleton mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridIndex {
    pub row: usize,
    pub col: usize,
}

impl GridIndex {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Offset by a signed step; `None` when the result would be negative.
    pub fn offset(&self, d_row: isize, d_col: isize) -> Option<Self> {
        Some(Self {
            row: self.row.checked_add_signed(d_row)?,
            col: self.col.checked_add_signed(d_col)?,
        })
    }
}

impl From<(usize, usize)> for GridIndex {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl std::fmt::Display for GridIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Axis-aligned obstacle box, centered at (north, east, alt) with half extents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub north: f64,
    pub east: f64,
    pub alt: f64,
    pub half_north: f64,
    pub half_east: f64,
    pub half_alt: f64,
}

impl Obstacle {
    pub fn new(
        north: f64,
        east: f64,
        alt: f64,
        half_north: f64,
        half_east: f64,
        half_alt: f64,
    ) -> Self {
        Self {
            north,
            east,
            alt,
            half_north,
            half_east,
            half_alt,
        }
    }

    pub fn is_finite(&self) -> bool {
        [
            self.north,
            self.east,
            self.alt,
            self.half_north,
            self.half_east,
            self.half_alt,
        ]
        .iter()
        .all(|value| value.is_finite())
    }

    /// Whether the top of the box reaches the given altitude.
    pub fn reaches(&self, altitude: f64) -> bool {
        self.alt + self.half_alt >= altitude
    }
}

/// Obstacle list together with the geodetic reference it is expressed in.
///
/// Deserialization goes through [`ObstacleMap::new`], so every instance is
/// validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawObstacleMap")]
pub struct ObstacleMap {
    home: GeodeticPosition,
    obstacles: Vec<Obstacle>,
}

#[derive(Deserialize)]
struct RawObstacleMap {
    home: GeodeticPosition,
    obstacles: Vec<Obstacle>,
}

impl TryFrom<RawObstacleMap> for ObstacleMap {
    type Error = MapError;

    fn try_from(raw: RawObstacleMap) -> Result<Self, Self::Error> {
        Self::new(raw.home, raw.obstacles)
    }
}

impl ObstacleMap {
    /// Validate and wrap an obstacle list.
    pub fn new(home: GeodeticPosition, obstacles: Vec<Obstacle>) -> Result<Self, MapError> {
        if !home.is_finite() {
            return Err(MapError::NonFiniteHome);
        }
        validate_obstacles(&obstacles)?;
        Ok(Self { home, obstacles })
    }

    pub fn home(&self) -> GeodeticPosition {
        self.home
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }
}

pub(crate) fn validate_obstacles(obstacles: &[Obstacle]) -> Result<(), MapError> {
    if obstacles.is_empty() {
        return Err(MapError::Empty);
    }
    if let Some(index) = obstacles.iter().position(|obstacle| !obstacle.is_finite()) {
        return Err(MapError::NonFinite { index });
    }
    Ok(())
}

/// Position setpoint produced by the planner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Waypoint {
    pub north: f64,
    pub east: f64,
    pub altitude: f64,
    /// Heading in radians, 0 = north, π/2 = east.
    pub heading: f64,
}

impl Waypoint {
    pub fn new(north: f64, east: f64, altitude: f64, heading: f64) -> Self {
        Self {
            north,
            east,
            altitude,
            heading,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obstacle_map_rejects_empty_list() {
        let result = ObstacleMap::new(GeodeticPosition::default(), Vec::new());
        assert_eq!(result.unwrap_err(), MapError::Empty);
    }

    #[test]
    fn obstacle_map_reports_first_non_finite_row() {
        let obstacles = vec![
            Obstacle::new(0.0, 0.0, 5.0, 1.0, 1.0, 5.0),
            Obstacle::new(f64::NAN, 0.0, 5.0, 1.0, 1.0, 5.0),
        ];
        let result = ObstacleMap::new(GeodeticPosition::default(), obstacles);
        assert_eq!(result.unwrap_err(), MapError::NonFinite { index: 1 });
    }

    #[test]
    fn deserialized_map_is_validated() {
        let empty = serde_json::json!({
            "home": {"lon": 0.0, "lat": 0.0, "alt": 0.0},
            "obstacles": []
        });
        let err = serde_json::from_value::<ObstacleMap>(empty).unwrap_err();
        assert!(err.to_string().contains("obstacle list is empty"), "{err}");

        let valid = serde_json::json!({
            "home": {"lon": 1.0, "lat": 2.0, "alt": 0.0},
            "obstacles": [{
                "north": 0.0, "east": 0.0, "alt": 5.0,
                "half_north": 1.0, "half_east": 1.0, "half_alt": 5.0
            }]
        });
        let map: ObstacleMap = serde_json::from_value(valid).unwrap();
        assert_eq!(map.obstacles().len(), 1);
        assert_eq!(map.home(), GeodeticPosition::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn grid_index_offset_stops_at_zero() {
        let index = GridIndex::new(0, 3);
        assert_eq!(index.offset(-1, 0), None);
        assert_eq!(index.offset(1, -1), Some(GridIndex::new(1, 2)));
    }

    #[test]
    fn waypoint_serializes_with_field_names() {
        let json = serde_json::to_value(Waypoint::new(1.0, 2.0, 5.0, 0.5)).unwrap();
        assert_eq!(json["north"], 1.0);
        assert_eq!(json["altitude"], 5.0);
    }
}
