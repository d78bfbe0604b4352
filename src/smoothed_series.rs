//! Speed, gradient and altimeter from double exponential smoothed series.
//!
//! Altitude is smoothed with the gradient time constant, distance with the
//! speed time constant. Horizontal and vertical speed are computed from the
//! smoothed values and smoothed once more.

use crate::config::SmoothingConfig;
use crate::gradient::AltimeterSeries;
use crate::smoothing::smooth;
use crate::speed::SpeedSeries;
use crate::units::UNIT_FOOT;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AltitudeSmoothed {
    /// m
    pub metric: Vec<f64>,
    /// ft
    pub imperial: Vec<f64>,
}

impl AltitudeSmoothed {
    pub fn from_metric(metric: Vec<f64>) -> Self {
        let imperial = metric.iter().map(|v| v / UNIT_FOOT).collect();
        AltitudeSmoothed { metric, imperial }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SmoothedSeries {
    pub altitude: Option<AltitudeSmoothed>,
    pub speed: Option<SpeedSeries>,
    pub gradient: Option<Vec<f64>>,
    pub altimeter: Option<AltimeterSeries>,
}

/// Per slice velocity `Δvalue/Δtime`, a zero time delta repeats the previous
/// velocity and the last sample repeats the one before.
fn velocity(time: &[i64], values: &[f64]) -> Vec<f64> {
    let size = values.len();
    let mut result = vec![0.0; size];

    for i in 0..size - 1 {
        let time_diff = time[i + 1] - time[i];
        result[i] = if time_diff == 0 {
            if i == 0 {
                0.0
            } else {
                result[i - 1]
            }
        } else {
            (values[i + 1] - values[i]) / time_diff as f64
        };
    }
    result[size - 1] = result[size - 2];

    result
}

/// Derives all distance/altitude dependent series with smoothing.
///
/// `distance` is the metric distance, already computed from positions when the
/// device did not record a distance.
pub fn derive(time: &[i64], distance: Option<&[f64]>, altitude: Option<&[f64]>, config: &SmoothingConfig) -> SmoothedSeries {
    let size = time.len();
    let mut result = SmoothedSeries::default();

    if size < 2 {
        tracing::debug!("{} samples are not enough for smoothing", size);
        return result;
    }

    let gradient_params = config.gradient_params();
    let speed_params = config.speed_params();

    // altitude must be smoothed because the smoothed values are used for the vertical speed
    let altitude_sc = altitude.map(|altitude| smooth(time, altitude, &gradient_params));

    if let (Some(altitude), Some(altitude_sc)) = (altitude, altitude_sc.as_ref()) {
        let metric = if config.is_altitude_smoothed {
            altitude_sc.clone()
        } else {
            altitude.to_vec()
        };
        result.altitude = Some(AltitudeSmoothed::from_metric(metric));
    }

    let distance = match distance {
        Some(distance) => distance,
        None => {
            tracing::debug!("no distance, speed and gradient are not computed");
            return result;
        }
    };

    let distance_sc = smooth(time, distance, &speed_params);

    let vh = velocity(time, &distance_sc);
    let vh_sc = smooth(time, &vh, &speed_params);

    let mut speed = SpeedSeries::with_len(size);
    for (index, value) in vh.iter().enumerate() {
        speed.set(index, value * 3.6);
    }
    result.speed = Some(speed);

    if let Some(altitude_sc) = altitude_sc {
        let vv = velocity(time, &altitude_sc);
        let vv_sc = smooth(time, &vv, &gradient_params);

        let gradient = vh_sc
            .iter()
            .zip(vv_sc.iter())
            .map(|(vh, vv)| if *vh == 0.0 { 0.0 } else { vv / vh * 100.0 })
            .collect();

        let altimeter = vv_sc.iter().map(|vv| vv * 3600.0).collect();

        result.gradient = Some(gradient);
        result.altimeter = Some(AltimeterSeries::from_metric(altimeter));
    }

    result
}

/// Smoothed pulse, or a copy of the raw pulse when pulse smoothing is disabled.
pub fn smooth_pulse(time: &[i64], pulse: &[f64], config: &SmoothingConfig) -> Vec<f64> {
    if config.is_pulse_smoothed && time.len() >= 2 {
        smooth(time, pulse, &config.pulse_params())
    } else {
        pulse.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn climb(size: usize) -> (Vec<i64>, Vec<f64>, Vec<f64>) {
        let time: Vec<i64> = (0..size as i64).collect();
        let distance: Vec<f64> = time.iter().map(|t| *t as f64 * 5.0).collect();
        let altitude = distance.iter().map(|d| 100.0 + d * 0.1).collect();
        (time, distance, altitude)
    }

    #[test]
    fn test_constant_climb() {
        let (time, distance, altitude) = climb(200);
        let series = derive(&time, Some(&distance), Some(&altitude), &SmoothingConfig::default());

        let speed = series.speed.unwrap();
        let gradient = series.gradient.unwrap();
        let altimeter = series.altimeter.unwrap();

        // the smoothing filters are settled in the middle of the tour
        for index in 80..120 {
            assert!((speed.metric[index] - 18.0).abs() < 0.1, "{}", speed.metric[index]);
            assert!((gradient[index] - 10.0).abs() < 0.1, "{}", gradient[index]);
            assert!((altimeter.metric[index] - 1800.0).abs() < 10.0, "{}", altimeter.metric[index]);
        }
    }

    #[test]
    fn test_altitude_not_smoothed_is_raw_copy() {
        let (time, distance, altitude) = climb(20);
        let config = SmoothingConfig {
            is_altitude_smoothed: false,
            ..Default::default()
        };
        let series = derive(&time, Some(&distance), Some(&altitude), &config);
        assert_eq!(series.altitude.unwrap().metric, altitude);
        assert!(series.gradient.is_some());
    }

    #[test]
    fn test_missing_inputs() {
        let (time, distance, altitude) = climb(20);

        let series = derive(&time, None, Some(&altitude), &SmoothingConfig::default());
        assert!(series.altitude.is_some());
        assert!(series.speed.is_none());
        assert!(series.gradient.is_none());

        let series = derive(&time, Some(&distance), None, &SmoothingConfig::default());
        assert!(series.speed.is_some());
        assert!(series.gradient.is_none());
        assert!(series.altimeter.is_none());

        let series = derive(&time[..1], Some(&distance[..1]), Some(&altitude[..1]), &SmoothingConfig::default());
        assert_eq!(series, SmoothedSeries::default());
    }

    #[test]
    fn test_duplicate_timestamps_stay_finite() {
        let time = vec![0, 0, 1, 1, 1, 2, 3, 3];
        let distance = vec![0.0, 1.0, 5.0, 6.0, 7.0, 12.0, 15.0, 15.0];
        let altitude = vec![10.0, 10.0, 11.0, 11.0, 12.0, 12.0, 13.0, 13.0];
        let series = derive(&time, Some(&distance), Some(&altitude), &SmoothingConfig::default());

        assert!(series.speed.unwrap().metric.iter().all(|v| v.is_finite()));
        assert!(series.gradient.unwrap().iter().all(|v| v.is_finite()));
        assert!(series.altimeter.unwrap().metric.iter().all(|v| v.is_finite()));
    }
}
