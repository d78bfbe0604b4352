//! Speed and pace series.
//!
//! Without smoothing the speed is computed from raw distance/time deltas over
//! a window around each sample. The window depends on the device interval:
//! fixed interval devices use index windows, variable interval devices grow
//! the window until it spans a minimum time.

use crate::units::UNIT_MILE;

/// Metric pace is not computed below this speed (km/h).
const MIN_PACE_SPEED_METRIC: f64 = 1.0;

/// Imperial pace is not computed below this speed (mph).
const MIN_PACE_SPEED_IMPERIAL: f64 = 0.6;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeedSeries {
    /// km/h
    pub metric: Vec<f64>,
    /// mph
    pub imperial: Vec<f64>,
    /// seconds per km
    pub pace_seconds: Vec<f64>,
    /// seconds per mile
    pub pace_seconds_imperial: Vec<f64>,
    pub pace_minutes: Vec<f64>,
    pub pace_minutes_imperial: Vec<f64>,
    /// km/h
    pub max_speed: f64,
}

impl SpeedSeries {
    pub fn with_len(size: usize) -> Self {
        SpeedSeries {
            metric: vec![0.0; size],
            imperial: vec![0.0; size],
            pace_seconds: vec![0.0; size],
            pace_seconds_imperial: vec![0.0; size],
            pace_minutes: vec![0.0; size],
            pace_minutes_imperial: vec![0.0; size],
            max_speed: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.metric.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metric.is_empty()
    }

    /// Sets the metric speed of one sample and derives the other units from it.
    pub fn set(&mut self, index: usize, speed_metric: f64) {
        let speed_imperial = speed_metric / UNIT_MILE;

        self.metric[index] = speed_metric;
        self.imperial[index] = speed_imperial;

        self.max_speed = self.max_speed.max(speed_metric);

        let pace_metric = if speed_metric < MIN_PACE_SPEED_METRIC {
            0.0
        } else {
            3600.0 / speed_metric
        };
        let pace_imperial = if speed_imperial < MIN_PACE_SPEED_IMPERIAL {
            0.0
        } else {
            3600.0 / speed_imperial
        };

        self.pace_seconds[index] = pace_metric;
        self.pace_seconds_imperial[index] = pace_imperial;
        self.pace_minutes[index] = pace_metric / 60.0;
        self.pace_minutes_imperial[index] = pace_imperial / 60.0;
    }
}

/// Speed recorded by the device (km/h) is used as it is.
pub fn from_device(speed: &[f64]) -> SpeedSeries {
    let mut series = SpeedSeries::with_len(speed.len());
    for (index, value) in speed.iter().enumerate() {
        series.set(index, *value);
    }
    series
}

fn clamp_index(index: isize, last: usize) -> usize {
    index.clamp(0, last as isize) as usize
}

/// Speed for devices which record with a fixed time interval.
pub fn fixed_interval(time: &[i64], distance: &[f64], device_time_interval: i32) -> SpeedSeries {
    let size = time.len().min(distance.len());
    let mut series = SpeedSeries::with_len(size);
    if size == 0 {
        return series;
    }

    let (low_default, high_default): (isize, isize) = if device_time_interval <= 2 {
        (3, 3)
    } else if device_time_interval <= 5 {
        (1, 1)
    } else {
        (0, 1)
    };

    let last = size - 1;

    for serie_index in 0..size {
        let index = serie_index as isize;

        let low = clamp_index(index - low_default, last);
        let high = clamp_index(index + high_default, last);
        let distance_default = distance[high] - distance[low];

        // short distances are inaccurate, widen the window
        let widen = if distance_default < 30.0 {
            3
        } else if distance_default < 50.0 {
            2
        } else if distance_default < 100.0 {
            1
        } else {
            0
        };

        let low = clamp_index(index - low_default - widen, last);
        let high = clamp_index(index + high_default + widen, last);

        let dist_diff = distance[high] - distance[low];
        let time_diff = time[high] - time[low];

        let speed = if time_diff == 0 {
            0.0
        } else {
            dist_diff * 3.6 / time_diff as f64
        };

        series.set(serie_index, speed);
    }

    series
}

/// Position serie which is used to detect a device which stopped recording
/// new positions while the time is running.
#[derive(Debug, Clone, Copy)]
pub struct Positions<'a> {
    pub latitude: &'a [f64],
    pub longitude: &'a [f64],
}

impl Positions<'_> {
    pub fn is_equal(&self, a: usize, b: usize) -> bool {
        self.latitude[a] == self.latitude[b] && self.longitude[a] == self.longitude[b]
    }
}

fn has_duplicate_time(time: &[i64], low: usize, high: usize) -> bool {
    time[low..=high].windows(2).any(|w| w[0] == w[1])
}

/// Speed for devices which record with a variable time interval.
///
/// `positions` must only be set when the distance is computed from gps and
/// not measured with a sensor. Runs of identical positions then get their
/// distance redistributed over time, this is done on a copy of `distance`.
pub fn variable_interval(
    time: &[i64],
    distance: &[f64],
    positions: Option<Positions>,
    min_time_slice: i64,
) -> SpeedSeries {
    let size = time.len().min(distance.len());
    let mut series = SpeedSeries::with_len(size);
    if size == 0 {
        return series;
    }

    let mut distance = distance[..size].to_vec();
    let last = size - 1;

    let mut is_position_equal = false;
    let mut equal_start_index = 0;

    for serie_index in 0..size {
        if let Some(positions) = positions {
            if serie_index > 0 && serie_index + 1 < last {
                if positions.is_equal(serie_index, serie_index - 1) {
                    if !is_position_equal {
                        equal_start_index = serie_index - 1;
                        is_position_equal = true;
                    }
                    continue;
                }

                if is_position_equal {
                    is_position_equal = false;
                    redistribute_equal_positions(time, &mut distance, equal_start_index, serie_index, &mut series);
                }
            }
        }

        let mut low_index = serie_index.saturating_sub(1) as isize;
        let mut high_index = serie_index as isize;

        let mut time_diff = time[high_index as usize] - time[low_index as usize];
        let mut dist_diff = distance[high_index as usize] - distance[low_index as usize];

        let mut swap_direction = true;
        while time_diff < min_time_slice {
            if swap_direction {
                high_index += 1;
            } else {
                low_index -= 1;
            }
            swap_direction = !swap_direction;

            if low_index < 0 || high_index > last as isize {
                break;
            }

            time_diff = time[high_index as usize] - time[low_index as usize];
            dist_diff = distance[high_index as usize] - distance[low_index as usize];
        }

        let low = clamp_index(low_index, last);
        let high = clamp_index(high_index, last);

        let mut speed = 0.0;

        // gps data can contain positions without a time change
        if !has_duplicate_time(time, low, high) && serie_index > 0 && time_diff != 0 {
            if let Some(positions) = positions {
                if low > 0 && high + 1 < last {
                    let is_stalled = positions.is_equal(low, low - 1) || positions.is_equal(high, high + 1);
                    if is_stalled && dist_diff == 0.0 {
                        continue;
                    }
                }
            }

            // speed must be greater than 1.8 km/h
            if !(time_diff > 20 && dist_diff < 10.0) {
                speed = (dist_diff * 3.6 / time_diff as f64).max(0.0);
            }
        }

        series.set(serie_index, speed);
    }

    series
}

/// The device repeated the same position from `start` until `end`, the
/// distance it reported at `end` is spread over the run proportional to time.
fn redistribute_equal_positions(
    time: &[i64],
    distance: &mut [f64],
    start: usize,
    end: usize,
    series: &mut SpeedSeries,
) {
    let equal_time_diff = time[end] - time[start];
    let equal_dist_diff = distance[end] - distance[start];

    // a real stop, speed would be below 1.8 km/h
    if equal_time_diff > 20 && equal_dist_diff < 10.0 {
        return;
    }

    for index in start + 1..end {
        let segment_time_diff = time[index] - time[index - 1];
        let segment_dist_diff = if equal_time_diff == 0 {
            0.0
        } else {
            segment_time_diff as f64 / equal_time_diff as f64 * equal_dist_diff
        };

        distance[index] = distance[index - 1] + segment_dist_diff;

        let speed = if segment_time_diff == 0 || segment_dist_diff == 0.0 {
            0.0
        } else {
            (segment_dist_diff * 3.6 / segment_time_diff as f64).max(0.0)
        };

        series.set(index, speed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_speed(size: usize, interval: i64, meters_per_second: f64) -> (Vec<i64>, Vec<f64>) {
        let time: Vec<i64> = (0..size as i64).map(|i| i * interval).collect();
        let distance = time.iter().map(|t| *t as f64 * meters_per_second).collect();
        (time, distance)
    }

    #[test]
    fn test_fixed_interval_constant_speed() {
        let (time, distance) = constant_speed(50, 1, 10.0);
        let speed = fixed_interval(&time, &distance, 1);
        for v in &speed.metric {
            assert!((v - 36.0).abs() < 1e-9, "{}", v);
        }
        assert!((speed.max_speed - 36.0).abs() < 1e-9);
        assert!((speed.pace_seconds[10] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_fixed_interval_duplicate_time_is_zero() {
        let time = vec![5; 10];
        let distance: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let speed = fixed_interval(&time, &distance, 1);
        assert!(speed.metric.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_variable_interval_constant_speed() {
        let (time, distance) = constant_speed(40, 1, 5.0);
        let speed = variable_interval(&time, &distance, None, 10);
        assert_eq!(speed.metric[0], 0.0);
        for v in &speed.metric[1..] {
            assert!((v - 18.0).abs() < 1e-9, "{}", v);
        }
    }

    #[test]
    fn test_variable_interval_duplicate_time_is_zero() {
        let time = vec![0, 1, 2, 2, 3, 4];
        let distance = vec![0.0, 5.0, 10.0, 10.0, 15.0, 20.0];
        let speed = variable_interval(&time, &distance, None, 1);
        assert_eq!(speed.metric[3], 0.0);
        assert!(speed.metric.iter().all(|v| v.is_finite()));
        assert!((speed.metric[1] - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_variable_interval_slow_gap_is_zero() {
        let time = vec![0, 30, 60];
        let distance = vec![0.0, 5.0, 10.0];
        let speed = variable_interval(&time, &distance, None, 10);
        assert!(speed.metric.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_equal_positions_are_redistributed() {
        let time: Vec<i64> = (0..10).map(|i| i * 10).collect();
        let distance = vec![0.0, 100.0, 200.0, 200.0, 200.0, 200.0, 600.0, 700.0, 800.0, 900.0];
        let latitude = vec![47.0, 47.001, 47.002, 47.002, 47.002, 47.002, 47.006, 47.007, 47.008, 47.009];
        let longitude = vec![8.0; 10];
        let positions = Positions {
            latitude: &latitude,
            longitude: &longitude,
        };

        let speed = variable_interval(&time, &distance, Some(positions), 10);

        for index in 3..=6 {
            assert!((speed.metric[index] - 36.0).abs() < 1e-9, "{} {}", index, speed.metric[index]);
        }
        // the caller's distance is untouched
        assert_eq!(distance[4], 200.0);
    }

    #[test]
    fn test_pace_limits() {
        let speed = from_device(&[0.5, 0.98, 1.2, 36.0]);
        assert_eq!(speed.pace_seconds[0], 0.0);
        assert_eq!(speed.pace_seconds_imperial[0], 0.0);
        assert!(speed.pace_seconds_imperial[1] > 0.0);
        assert_eq!(speed.pace_seconds[1], 0.0);
        assert!(speed.pace_seconds[2] > 0.0);
        assert_eq!(speed.max_speed, 36.0);
    }
}
