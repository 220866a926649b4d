//! Mission configuration from defaults and environment.

use crate::error::ConfigError;
use nav_core::{GeodeticPosition, PlanConfig, PlanMode, PruneMode};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionConfig {
    /// Geodetic goal; only longitude and latitude are used for planning.
    pub goal: GeodeticPosition,
    /// Cruise altitude above home, meters.
    pub target_altitude: f64,
    /// Horizontal margin added around every obstacle footprint, meters.
    pub safety_distance: f64,
    pub plan_mode: PlanMode,
    pub prune_mode: PruneMode,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            goal: GeodeticPosition::new(-122.398244, 37.796092, 0.0),
            target_altitude: 5.0,
            safety_distance: 5.0,
            plan_mode: PlanMode::Grid,
            prune_mode: PruneMode::LineOfSight,
        }
    }
}

impl MissionConfig {
    /// Defaults overlaid with any `NAV_*` variables that are set.
    ///
    /// A value that does not parse is logged and the default kept.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            goal: GeodeticPosition::new(
                env_or("NAV_GOAL_LON", defaults.goal.lon),
                env_or("NAV_GOAL_LAT", defaults.goal.lat),
                env_or("NAV_GOAL_ALT", defaults.goal.alt),
            ),
            target_altitude: env_or("NAV_TARGET_ALTITUDE", defaults.target_altitude),
            safety_distance: env_or("NAV_SAFETY_DISTANCE", defaults.safety_distance),
            plan_mode: env_or("NAV_PLAN_MODE", defaults.plan_mode),
            prune_mode: env_or("NAV_PRUNE_MODE", defaults.prune_mode),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("goal.lon", self.goal.lon),
            ("goal.lat", self.goal.lat),
            ("goal.alt", self.goal.alt),
            ("target_altitude", self.target_altitude),
            ("safety_distance", self.safety_distance),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { name, value });
            }
        }
        if self.target_altitude <= 0.0 {
            return Err(ConfigError::NotPositive {
                name: "target_altitude",
                value: self.target_altitude,
            });
        }
        if self.safety_distance < 0.0 {
            return Err(ConfigError::Negative {
                name: "safety_distance",
                value: self.safety_distance,
            });
        }
        Ok(())
    }

    pub fn plan_config(&self) -> PlanConfig {
        PlanConfig {
            target_altitude: self.target_altitude,
            safety_distance: self.safety_distance,
            mode: self.plan_mode,
            prune: self.prune_mode,
        }
    }
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(key, value = %raw, %err, "ignoring unparsable setting");
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = MissionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.plan_config(), PlanConfig::default());
    }

    #[test]
    fn rejects_non_positive_altitude() {
        let config = MissionConfig {
            target_altitude: 0.0,
            ..MissionConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive {
                name: "target_altitude",
                value: 0.0
            })
        );
    }

    #[test]
    fn rejects_nan_goal() {
        let config = MissionConfig {
            goal: GeodeticPosition::new(f64::NAN, 37.0, 0.0),
            ..MissionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFinite { name: "goal.lon", .. })
        ));
    }

    #[test]
    fn rejects_negative_margin() {
        let config = MissionConfig {
            safety_distance: -1.0,
            ..MissionConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Negative { .. })));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: MissionConfig =
            serde_json::from_str(r#"{"target_altitude": 12.0, "plan_mode": "skeleton"}"#).unwrap();
        assert_eq!(config.target_altitude, 12.0);
        assert_eq!(config.plan_mode, PlanMode::Skeleton);
        assert_eq!(config.safety_distance, 5.0);
        assert_eq!(config.prune_mode, PruneMode::LineOfSight);
    }

    #[test]
    fn env_or_keeps_default_on_garbage() {
        // Unique key so parallel tests never race on it.
        std::env::set_var("NAV_TEST_ENV_OR_GARBAGE", "not-a-number");
        assert_eq!(env_or("NAV_TEST_ENV_OR_GARBAGE", 7.5_f64), 7.5);
        std::env::set_var("NAV_TEST_ENV_OR_GARBAGE", "3.25");
        assert_eq!(env_or("NAV_TEST_ENV_OR_GARBAGE", 7.5_f64), 3.25);
        std::env::remove_var("NAV_TEST_ENV_OR_GARBAGE");
    }
}
