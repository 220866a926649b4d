//! Obstacle map ingestion from a colliders CSV.
//!
//! Layout:
//!
//! ```text
//! lat0 37.792480, lon0 -122.397450
//! posX,posY,posZ,halfSizeX,halfSizeY,halfSizeZ
//! -310.2389,-439.2315,85.5,5,5,85.5
//! ```
//!
//! `posX` is north and `posY` east of the home point, in meters.

use anyhow::{bail, Context, Result};
use nav_core::{GeodeticPosition, Obstacle, ObstacleMap};
use std::path::Path;

pub fn load_colliders(path: impl AsRef<Path>) -> Result<ObstacleMap> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read colliders file {}", path.display()))?;
    parse_colliders(&text).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn parse_colliders(text: &str) -> Result<ObstacleMap> {
    let mut lines = text.lines().enumerate();

    let (_, header) = lines.next().context("colliders file is empty")?;
    let home = parse_home(header).context("line 1: bad home header")?;

    let mut obstacles = Vec::new();
    for (index, line) in lines {
        let line_no = index + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let values: Result<Vec<f64>, _> = fields.iter().map(|field| field.parse::<f64>()).collect();
        let values = match values {
            Ok(values) => values,
            // Column header.
            Err(_) if line_no == 2 => continue,
            Err(err) => bail!("line {line_no}: {err}: '{line}'"),
        };
        let [north, east, alt, half_north, half_east, half_alt] = values[..] else {
            bail!("line {line_no}: expected 6 columns, found {}", values.len());
        };
        obstacles.push(Obstacle::new(north, east, alt, half_north, half_east, half_alt));
    }

    tracing::debug!(count = obstacles.len(), lon = home.lon, lat = home.lat, "parsed colliders");
    Ok(ObstacleMap::new(home, obstacles)?)
}

/// `lat0 <lat>, lon0 <lon>` in either order.
fn parse_home(line: &str) -> Result<GeodeticPosition> {
    let mut lat = None;
    let mut lon = None;
    for part in line.split(',') {
        let mut tokens = part.split_whitespace();
        let (Some(key), Some(value)) = (tokens.next(), tokens.next()) else {
            bail!("expected '<key> <value>', found '{}'", part.trim());
        };
        let value: f64 = value
            .parse()
            .with_context(|| format!("{key} is not a number: '{value}'"))?;
        match key {
            "lat0" => lat = Some(value),
            "lon0" => lon = Some(value),
            other => bail!("unexpected key '{other}'"),
        }
    }
    match (lat, lon) {
        (Some(lat), Some(lon)) => Ok(GeodeticPosition::new(lon, lat, 0.0)),
        _ => bail!("header must name both lat0 and lon0"),
    }
}
