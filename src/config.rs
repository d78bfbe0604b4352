//! Engine configuration.
//!
//! Every algorithm choice and threshold lives in [`EngineConfig`], which is
//! passed into the tour explicitly. Values can be loaded from a TOML file and
//! overridden with `TOUR_*` environment variables.

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::breaks::BreakTimeMethod;
use crate::elevation::ElevationAlgorithm;
use crate::smoothing::SmoothingParams;
use crate::units::UnitSystem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingAlgorithm {
    /// Speed, gradient and altimeter are computed from raw deltas with
    /// windows which depend on the device time interval.
    Off,
    /// All distance dependent values are computed from double exponential
    /// smoothed series.
    #[default]
    DoubleExponential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub algorithm: SmoothingAlgorithm,
    pub is_altitude_smoothed: bool,
    pub is_pulse_smoothed: bool,
    pub gradient_tau: f64,
    pub speed_tau: f64,
    pub pulse_tau: f64,
    pub repeated_smoothing: u32,
    pub repeated_tau: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        SmoothingConfig {
            algorithm: SmoothingAlgorithm::DoubleExponential,
            is_altitude_smoothed: true,
            is_pulse_smoothed: true,
            gradient_tau: 10.0,
            speed_tau: 10.0,
            pulse_tau: 10.0,
            repeated_smoothing: 1,
            repeated_tau: 1.0,
        }
    }
}

impl SmoothingConfig {
    pub fn gradient_params(&self) -> SmoothingParams {
        self.params(self.gradient_tau)
    }

    pub fn speed_params(&self) -> SmoothingParams {
        self.params(self.speed_tau)
    }

    pub fn pulse_params(&self) -> SmoothingParams {
        self.params(self.pulse_tau)
    }

    fn params(&self, tau: f64) -> SmoothingParams {
        SmoothingParams {
            tau,
            repeat_count: self.repeated_smoothing,
            repeat_tau: self.repeated_tau,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedConfig {
    /// Minimum time window in seconds for variable interval speed, also used
    /// as minimum distance in meters for the variable interval gradient.
    pub min_time_slice: i64,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        SpeedConfig { min_time_slice: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakTimeConfig {
    pub method: BreakTimeMethod,
    /// Seconds without distance change before a fixed interval slice is a break.
    pub min_break_time: i64,
    /// Shortest break in seconds for the time/distance method.
    pub shortest_time: i64,
    /// Maximum distance in meters covered during a time/distance break.
    pub max_distance: f64,
    /// Maximum distance in meters between two slices inside a time/distance break.
    pub max_slice_distance: f64,
    /// km/h
    pub min_slice_speed: f64,
    /// km/h
    pub min_avg_speed: f64,
    /// km/h
    pub min_avg_speed_as: f64,
    /// km/h
    pub min_slice_speed_as: f64,
    /// seconds
    pub min_slice_time_as: i64,
}

impl Default for BreakTimeConfig {
    fn default() -> Self {
        BreakTimeConfig {
            method: BreakTimeMethod::AvgSliceSpeed,
            min_break_time: 20,
            shortest_time: 60,
            max_distance: 20.0,
            max_slice_distance: 5.0,
            min_slice_speed: 1.0,
            min_avg_speed: 1.0,
            min_avg_speed_as: 2.0,
            min_slice_speed_as: 2.0,
            min_slice_time_as: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevationConfig {
    pub algorithm: ElevationAlgorithm,
    /// Douglas-Peucker tolerance in meters.
    pub dp_tolerance: f64,
    /// Minimum altitude change in meters before a direction change is accepted
    /// by the threshold algorithm.
    pub min_altitude_diff: f64,
}

impl Default for ElevationConfig {
    fn default() -> Self {
        ElevationConfig {
            algorithm: ElevationAlgorithm::LineSimplification,
            dp_tolerance: 7.0,
            min_altitude_diff: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub unit_system: UnitSystem,
    pub smoothing: SmoothingConfig,
    pub speed: SpeedConfig,
    pub break_time: BreakTimeConfig,
    pub elevation: ElevationConfig,
}

impl EngineConfig {
    /// Loads the configuration: built-in defaults, then the optional file,
    /// then `TOUR_*` environment variables, e.g.
    /// `TOUR_BREAK_TIME__METHOD=slice_speed`.
    pub fn load(path: Option<&Path>) -> Result<EngineConfig, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&EngineConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder
            .add_source(
                Environment::with_prefix("TOUR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_select_preferred_algorithms() {
        let config = EngineConfig::default();
        assert_eq!(config.elevation.algorithm, ElevationAlgorithm::LineSimplification);
        assert_eq!(config.smoothing.algorithm, SmoothingAlgorithm::DoubleExponential);
        assert_eq!(config.unit_system, UnitSystem::Metric);
    }

    #[test]
    fn test_smoothing_params_use_repeat_settings() {
        let smoothing = SmoothingConfig {
            speed_tau: 4.0,
            repeated_smoothing: 3,
            repeated_tau: 2.0,
            ..Default::default()
        };
        let params = smoothing.speed_params();
        assert_eq!(params.tau, 4.0);
        assert_eq!(params.repeat_count, 3);
        assert_eq!(params.repeat_tau, 2.0);
    }

    #[test]
    fn test_load_without_file_returns_defaults() {
        let config = EngineConfig::load(None).unwrap();
        assert_eq!(config.break_time.min_break_time, 20);
        assert_eq!(config.elevation.dp_tolerance, 7.0);
    }
}
