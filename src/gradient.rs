//! Gradient (%) and altimeter (vertical speed) without smoothing.

use crate::speed::Positions;
use crate::units::UNIT_FOOT;

/// Vertical speed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AltimeterSeries {
    /// m/h
    pub metric: Vec<f64>,
    /// ft/h
    pub imperial: Vec<f64>,
}

impl AltimeterSeries {
    pub fn from_metric(metric: Vec<f64>) -> Self {
        let imperial = metric.iter().map(|v| v / UNIT_FOOT).collect();
        AltimeterSeries { metric, imperial }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GradientSeries {
    /// %
    pub gradient: Vec<f64>,
    pub altimeter: AltimeterSeries,
}

fn clamp_index(index: isize, last: usize) -> usize {
    index.clamp(0, last as isize) as usize
}

/// Gradient and altimeter for devices which record with a fixed time interval,
/// the time difference is derived from the interval and the window size.
pub fn fixed_interval(distance: &[f64], altitude: &[f64], device_time_interval: i32) -> GradientSeries {
    let size = distance.len().min(altitude.len());
    if size == 0 {
        return GradientSeries::default();
    }

    let (adjust_low, adjust_high): (isize, isize) = if device_time_interval <= 2 {
        (15, 15)
    } else if device_time_interval <= 5 {
        (4, 4)
    } else if device_time_interval <= 10 {
        (2, 3)
    } else {
        (1, 2)
    };

    let last = size - 1;
    let mut altimeter = vec![0.0; size];
    let mut gradient = vec![0.0; size];

    for serie_index in 0..size {
        let index = serie_index as isize;
        let low = clamp_index(index - adjust_low, last);
        let high = clamp_index(index + adjust_high, last);

        let distance_diff = distance[high] - distance[low];
        let altitude_diff = altitude[high] - altitude[low];
        let time_diff = device_time_interval as f64 * (high - low) as f64;

        altimeter[serie_index] = if time_diff == 0.0 {
            0.0
        } else {
            3600.0 * altitude_diff / time_diff
        };

        gradient[serie_index] = if distance_diff == 0.0 {
            0.0
        } else {
            altitude_diff * 100.0 / distance_diff
        };
    }

    GradientSeries {
        gradient,
        altimeter: AltimeterSeries::from_metric(altimeter),
    }
}

/// Gradient and altimeter for devices which record with a variable time
/// interval.
///
/// The window around a sample grows until it spans `min_time_slice` seconds
/// and the same number of meters. Samples without speed, sensor stalls and
/// genuine recording gaps keep `0`.
pub fn variable_interval(
    time: &[i64],
    distance: &[f64],
    altitude: &[f64],
    speed: &[f64],
    positions: Option<Positions>,
    min_time_slice: i64,
) -> GradientSeries {
    let size = time.len().min(distance.len()).min(altitude.len()).min(speed.len());
    if size == 0 {
        return GradientSeries::default();
    }

    let last = size - 1;
    let min_time_diff = min_time_slice;
    let min_distance_diff = min_time_slice as f64;

    let mut altimeter = vec![0.0; size];
    let mut gradient = vec![0.0; size];

    for serie_index in 1..size {
        if speed[serie_index] == 0.0 {
            continue;
        }

        let slice_time_diff = time[serie_index] - time[serie_index - 1];

        // a gps sensor which stopped updating repeats the previous fix, this is
        // only detectable with positions and not at the end of the tour
        if let Some(positions) = positions {
            let prev = serie_index - 1;
            if slice_time_diff > 10
                && serie_index + 1 < last
                && (positions.is_equal(serie_index, prev)
                    || distance[serie_index] == distance[prev]
                    || altitude[serie_index] == altitude[prev])
            {
                continue;
            }
        }

        let mut low_index = serie_index as isize - 1;
        let mut high_index = serie_index as isize;

        let mut time_diff = time[serie_index] - time[serie_index - 1];
        let mut distance_diff = distance[serie_index] - distance[serie_index - 1];
        let mut altitude_diff = altitude[serie_index] - altitude[serie_index - 1];

        let mut toggle_index = true;
        while time_diff < min_time_diff || distance_diff < min_distance_diff {
            if toggle_index {
                low_index -= 1;
            } else {
                high_index += 1;
            }
            toggle_index = !toggle_index;

            if low_index < 0 || high_index > last as isize {
                break;
            }

            let (low, high) = (low_index as usize, high_index as usize);
            time_diff = time[high] - time[low];
            distance_diff = distance[high] - distance[low];
            altitude_diff = altitude[high] - altitude[low];
        }

        let low = clamp_index(low_index, last);
        let high = clamp_index(high_index, last);

        if time[low..=high].windows(2).any(|w| w[0] == w[1]) {
            continue;
        }

        // a genuine gap in the recording
        if time_diff > 50 {
            continue;
        }

        if let Some(positions) = positions {
            if slice_time_diff > 10
                && low > 0
                && high + 1 < last
                && (positions.is_equal(low, low - 1) || positions.is_equal(high, high + 1))
            {
                continue;
            }
        }

        if time_diff > 0 {
            altimeter[serie_index] = 3600.0 * altitude_diff / time_diff as f64;
        }

        if distance_diff > 0.0 {
            gradient[serie_index] = altitude_diff * 100.0 / distance_diff;
        }
    }

    GradientSeries {
        gradient,
        altimeter: AltimeterSeries::from_metric(altimeter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn climb(size: usize) -> (Vec<i64>, Vec<f64>, Vec<f64>) {
        // 10 m/s with a 5% slope
        let time: Vec<i64> = (0..size as i64).collect();
        let distance: Vec<f64> = time.iter().map(|t| *t as f64 * 10.0).collect();
        let altitude = distance.iter().map(|d| d * 0.05).collect();
        (time, distance, altitude)
    }

    #[test]
    fn test_fixed_interval_constant_slope() {
        let (_, distance, altitude) = climb(60);
        let series = fixed_interval(&distance, &altitude, 1);
        for (gradient, altimeter) in series.gradient.iter().zip(series.altimeter.metric.iter()) {
            assert!((gradient - 5.0).abs() < 1e-9);
            assert!((altimeter - 1800.0).abs() < 1e-9);
        }
        assert!((series.altimeter.imperial[0] - 1800.0 / UNIT_FOOT).abs() < 1e-6);
    }

    #[test]
    fn test_fixed_interval_without_movement() {
        let distance = vec![100.0; 10];
        let altitude = vec![200.0; 10];
        let series = fixed_interval(&distance, &altitude, 0);
        assert!(series.gradient.iter().all(|v| *v == 0.0));
        assert!(series.altimeter.metric.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_variable_interval_constant_slope() {
        let (time, distance, altitude) = climb(60);
        let speed = vec![36.0; 60];
        let series = variable_interval(&time, &distance, &altitude, &speed, None, 10);

        assert_eq!(series.gradient[0], 0.0);
        for index in 1..60 {
            assert!((series.gradient[index] - 5.0).abs() < 1e-9);
            assert!((series.altimeter.metric[index] - 1800.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_variable_interval_skips_samples_without_speed() {
        let (time, distance, altitude) = climb(20);
        let mut speed = vec![36.0; 20];
        speed[7] = 0.0;
        let series = variable_interval(&time, &distance, &altitude, &speed, None, 10);
        assert_eq!(series.gradient[7], 0.0);
        assert!(series.gradient[8] > 0.0);
    }

    #[test]
    fn test_variable_interval_unchanged_distance_without_positions() {
        // 20 s slices, 1 m climb per slice, sample 5 repeats the distance of sample 4
        let time: Vec<i64> = (0..10).map(|i| i * 20).collect();
        let mut distance: Vec<f64> = (0..10).map(|i| i as f64 * 200.0).collect();
        distance[5] = distance[4];
        let altitude: Vec<f64> = (0..10).map(|i| 500.0 + i as f64).collect();
        let speed = vec![36.0; 10];

        let series = variable_interval(&time, &distance, &altitude, &speed, None, 10);

        // the window grows to samples 3..=5: 2 m in 40 s over 200 m
        assert!((series.altimeter.metric[5] - 180.0).abs() < 1e-9);
        assert!((series.gradient[5] - 1.0).abs() < 1e-9);
        assert!((series.altimeter.metric[9] - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_variable_interval_skips_stalled_fix_with_positions() {
        let time: Vec<i64> = (0..10).map(|i| i * 20).collect();
        let distance: Vec<f64> = (0..10).map(|i| i as f64 * 200.0).collect();
        let altitude: Vec<f64> = (0..10).map(|i| 500.0 + i as f64).collect();
        let speed = vec![36.0; 10];
        let mut latitude: Vec<f64> = (0..10).map(|i| 47.0 + i as f64 * 0.002).collect();
        let longitude = vec![8.0; 10];
        // samples 4 and 9 repeat the previous fix
        latitude[4] = latitude[3];
        latitude[9] = latitude[8];

        let positions = Positions {
            latitude: &latitude,
            longitude: &longitude,
        };
        let series = variable_interval(&time, &distance, &altitude, &speed, Some(positions), 10);

        // every window touching the stalled fix is skipped
        assert_eq!(series.altimeter.metric[3], 0.0);
        assert_eq!(series.altimeter.metric[4], 0.0);
        assert_eq!(series.altimeter.metric[5], 0.0);
        assert!((series.altimeter.metric[6] - 180.0).abs() < 1e-9);
        // the end of the tour is not checked
        assert!((series.altimeter.metric[9] - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_variable_interval_duplicate_time() {
        let time = vec![0, 1, 1, 2, 3];
        let distance = vec![0.0, 10.0, 20.0, 30.0, 40.0];
        let altitude = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        let speed = vec![36.0; 5];
        let series = variable_interval(&time, &distance, &altitude, &speed, None, 1);
        assert_eq!(series.gradient[2], 0.0);
        assert!(series.gradient.iter().all(|v| v.is_finite()));
        assert!(series.altimeter.metric.iter().all(|v| v.is_finite()));
    }
}
