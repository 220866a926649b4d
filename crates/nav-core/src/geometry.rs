//! Frame conversions and distance/angle primitives.

use crate::models::{GeodeticPosition, GridIndex, NedPosition};

// ==== Local tangent-plane conversion ====
// Latitude-aware meters/degree scaling around the home point.

/// Meters per degree of latitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lat(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_132.954 - 559.822 * (2.0 * lat_rad).cos() + 1.175 * (4.0 * lat_rad).cos()
        - 0.0023 * (6.0 * lat_rad).cos()
}

/// Meters per degree of longitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lon(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_412.84 * lat_rad.cos() - 93.5 * (3.0 * lat_rad).cos() + 0.118 * (5.0 * lat_rad).cos()
}

/// Normalize a longitude difference into [-180, 180).
pub fn wrap_lon_delta(delta_deg: f64) -> f64 {
    (delta_deg + 180.0).rem_euclid(360.0) - 180.0
}

/// Convert a geodetic position to north/east/down meters relative to `home`.
///
/// The longitude delta is taken the short way round, so points either side
/// of the antimeridian end up a few meters apart rather than 360° apart.
pub fn global_to_local(global: GeodeticPosition, home: GeodeticPosition) -> NedPosition {
    let north = (global.lat - home.lat) * meters_per_deg_lat(home.lat);
    let east = wrap_lon_delta(global.lon - home.lon) * meters_per_deg_lon(home.lat);
    NedPosition {
        north,
        east,
        down: -(global.alt - home.alt),
    }
}

/// Inverse of [`global_to_local`].
pub fn local_to_global(local: NedPosition, home: GeodeticPosition) -> GeodeticPosition {
    let lat = home.lat + local.north / meters_per_deg_lat(home.lat).max(1e-9);
    let lon = home.lon + local.east / meters_per_deg_lon(home.lat).max(1e-9);
    GeodeticPosition {
        lon: wrap_lon_delta(lon),
        lat,
        alt: home.alt - local.down,
    }
}

/// Heading from `p1` to `p2` in radians, 0 = north, π/2 = east.
pub fn heading_to(p1: (f64, f64), p2: (f64, f64)) -> f64 {
    let d_north = p2.0 - p1.0;
    let d_east = p2.1 - p1.1;
    if d_north == 0.0 && d_east == 0.0 {
        return 0.0;
    }
    d_east.atan2(d_north)
}

/// Horizontal distance between two (north, east) pairs.
pub fn horizontal_distance(p1: (f64, f64), p2: (f64, f64)) -> f64 {
    (p2.0 - p1.0).hypot(p2.1 - p1.1)
}

/// Euclidean distance between two grid cells in cell units.
pub fn euclidean(a: GridIndex, b: GridIndex) -> f64 {
    let d_row = a.row as f64 - b.row as f64;
    let d_col = a.col as f64 - b.col as f64;
    d_row.hypot(d_col)
}
