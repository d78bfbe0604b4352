use serde::{Deserialize, Serialize};

/// Kilometers per mile.
pub const UNIT_MILE: f64 = 1.609344;

/// Meters per foot.
pub const UNIT_FOOT: f64 = 0.3048;

/// Measurement system used for output scaling. The algorithms always run on
/// metric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    /// Divisor applied to a metric distance (km) to get the display distance.
    pub fn distance_divisor(self) -> f64 {
        match self {
            UnitSystem::Metric => 1.0,
            UnitSystem::Imperial => UNIT_MILE,
        }
    }

    /// Divisor applied to a metric altitude (m) to get the display altitude.
    pub fn altitude_divisor(self) -> f64 {
        match self {
            UnitSystem::Metric => 1.0,
            UnitSystem::Imperial => UNIT_FOOT,
        }
    }

    pub fn speed_from_kmh(self, kmh: f64) -> f64 {
        kmh / self.distance_divisor()
    }

    pub fn altitude_from_meters(self, meters: f64) -> f64 {
        meters / self.altitude_divisor()
    }

    /// Pace in seconds per display unit (km or mile) from moving seconds and meters.
    pub fn pace_seconds(self, moving_seconds: f64, meters: f64) -> f64 {
        if meters == 0.0 {
            return 0.0;
        }
        moving_seconds * 1000.0 / (meters / self.distance_divisor())
    }

    pub fn label_distance(self) -> &'static str {
        match self {
            UnitSystem::Metric => "km",
            UnitSystem::Imperial => "mi",
        }
    }

    pub fn label_speed(self) -> &'static str {
        match self {
            UnitSystem::Metric => "km/h",
            UnitSystem::Imperial => "mph",
        }
    }

    pub fn label_altitude(self) -> &'static str {
        match self {
            UnitSystem::Metric => "m",
            UnitSystem::Imperial => "ft",
        }
    }
}

pub fn to_imperial_speed(kmh: &[f64]) -> Vec<f64> {
    kmh.iter().map(|v| v / UNIT_MILE).collect()
}

pub fn to_metric_speed(mph: &[f64]) -> Vec<f64> {
    mph.iter().map(|v| v * UNIT_MILE).collect()
}

pub fn to_imperial_altitude(meters: &[f64]) -> Vec<f64> {
    meters.iter().map(|v| v / UNIT_FOOT).collect()
}

pub fn to_metric_altitude(feet: &[f64]) -> Vec<f64> {
    feet.iter().map(|v| v * UNIT_FOOT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_round_trip() {
        let speed = vec![0.0, 3.6, 12.75, 27.3, 51.0, 0.4];
        let back = to_metric_speed(&to_imperial_speed(&speed));
        for (a, b) in speed.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
        }
    }

    #[test]
    fn test_altitude_round_trip() {
        let altitude = vec![-12.0, 0.0, 412.5, 2962.0];
        let back = to_metric_altitude(&to_imperial_altitude(&altitude));
        for (a, b) in altitude.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_pace_is_zero_without_distance() {
        assert_eq!(UnitSystem::Metric.pace_seconds(600.0, 0.0), 0.0);
        // 10 minutes for 2 km is 5 min/km
        assert!((UnitSystem::Metric.pace_seconds(600.0, 2000.0) - 300.0).abs() < 1e-9);
        assert!(UnitSystem::Imperial.pace_seconds(600.0, 2000.0) > 300.0);
    }
}
