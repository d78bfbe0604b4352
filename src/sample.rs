use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reserved value for "not available" inside a field array.
pub const MISSING: f64 = f64::NAN;

pub fn is_missing(value: f64) -> bool {
    value.is_nan()
}

/// Device time interval value for devices which record with a variable interval.
pub const VARIABLE_TIME_INTERVAL: i32 = -1;

/// One recorded time slice as handed over by an importer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds since the tour start.
    pub time: i64,
    /// Absolute distance in meters.
    #[serde(default)]
    pub distance: Option<f64>,
    /// Absolute altitude in meters.
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub pulse: Option<f64>,
    #[serde(default)]
    pub cadence: Option<f64>,
    #[serde(default)]
    pub power: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Speed measured by the device in km/h.
    #[serde(default)]
    pub speed: Option<f64>,
}

impl Sample {
    pub fn at(time: i64) -> Self {
        Sample {
            time,
            ..Default::default()
        }
    }

    pub fn has_position(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// Tour level values supplied by the producer together with the samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourMeta {
    pub start_time: Option<DateTime<Utc>>,
    /// `> 0` fixed interval in seconds, `-1` variable interval, `0` unknown.
    pub device_time_interval: i32,
    /// Distance is measured with a wheel/foot sensor and not derived from gps.
    pub is_distance_from_sensor: bool,
    /// Douglas-Peucker tolerance imported with the tour, in 1/10 meter.
    pub imported_dp_tolerance: Option<i32>,
    /// Start index of each tour when several tours are merged into one.
    pub multiple_tour_start_indices: Vec<usize>,
}

impl Default for TourMeta {
    fn default() -> Self {
        TourMeta {
            start_time: None,
            device_time_interval: VARIABLE_TIME_INTERVAL,
            is_distance_from_sensor: false,
            imported_dp_tolerance: None,
            multiple_tour_start_indices: Vec::new(),
        }
    }
}

impl TourMeta {
    pub fn with_fixed_interval(seconds: i32) -> Self {
        TourMeta {
            device_time_interval: seconds,
            ..Default::default()
        }
    }

    /// An unknown interval (`0`) is handled like a variable interval.
    pub fn is_variable_interval(&self) -> bool {
        self.device_time_interval == VARIABLE_TIME_INTERVAL || self.device_time_interval == 0
    }

    pub fn is_multiple_tours(&self) -> bool {
        self.multiple_tour_start_indices.len() > 1
    }
}
