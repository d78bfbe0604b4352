use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::hr_zones::HrZoneTimes;
use crate::units::UnitSystem;

/// Scalar values of a tour, speed, distance and altitude are scaled to
/// `unit_system`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TourSummary {
    pub unit_system: UnitSystem,
    pub start_time: Option<DateTime<Utc>>,
    pub samples: usize,

    pub recording_time: i64,
    pub moving_time: i64,
    pub break_time: i64,

    /// km or mi
    pub distance: f64,
    pub avg_speed: f64,
    pub max_speed: Option<f64>,
    /// Seconds per km or mile.
    pub avg_pace: f64,

    /// m or ft
    pub altitude_up: Option<f64>,
    pub altitude_down: Option<f64>,
    pub max_altitude: Option<f64>,

    pub avg_pulse: Option<f64>,
    pub max_pulse: Option<f64>,
    pub avg_cadence: Option<f64>,
    pub avg_temperature: Option<f64>,

    pub hr_zones: Option<HrZoneTimes>,
}

/// Formats seconds as `h:mm:ss`.
pub fn format_duration(seconds: i64) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let seconds = seconds.abs();
    format!("{}{}:{:02}:{:02}", sign, seconds / 3600, (seconds % 3600) / 60, seconds % 60)
}
