//! Per segment aggregates between consecutive breakpoints.

use serde::Serialize;

use crate::averages;
use crate::breaks::break_time;
use crate::elevation::AltitudeUpDown;
use crate::error::SeriesError;
use crate::units::UnitSystem;

/// Aggregated values of one segment. Distances are in meters, altitudes in
/// meters, times in seconds, speed and pace in the selected unit system.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TourSegment {
    /// The synthetic last segment with the tour totals.
    pub is_total: bool,

    pub serie_index_start: usize,
    pub serie_index_end: usize,

    pub time_recording: i64,
    pub time_moving: i64,
    pub time_break: i64,
    /// Running recording time up to the end of this segment.
    pub time_total: i64,

    pub distance_diff: f64,
    /// Running distance up to the end of this segment.
    pub distance_total: f64,

    /// Altitude difference between the segment borders.
    pub altitude_border_diff: f64,
    pub altitude_summarized_border_up: f64,
    pub altitude_summarized_border_down: f64,

    /// Altitude difference found by the threshold algorithm.
    pub altitude_computed_diff: Option<f64>,
    pub altitude_summarized_computed_up: f64,
    pub altitude_summarized_computed_down: f64,

    pub altitude_segment_up: f64,
    pub altitude_segment_down: f64,
    /// Altitude change per moving hour.
    pub altitude_up_down_hour: f64,

    pub speed: f64,
    /// Seconds per km or mile.
    pub pace: f64,
    pub pace_diff: f64,

    pub cadence: Option<f64>,
    pub pulse: Option<f64>,
    pub pulse_diff: Option<f64>,
    pub power: Option<f64>,
    /// %
    pub gradient: f64,
}

/// Series which are aggregated into segments.
#[derive(Debug, Clone, Copy)]
pub struct SegmentInput<'a> {
    pub time: &'a [i64],
    /// Metric distance.
    pub distance: Option<&'a [f64]>,
    pub altitude_smoothed: Option<&'a [f64]>,
    pub pulse_smoothed: Option<&'a [f64]>,
    pub cadence: Option<&'a [f64]>,
    pub power: Option<&'a [f64]>,
    /// Break mask computed with the caller's break configuration.
    pub break_mask: Option<&'a [bool]>,
}

/// Tour level values which are used for the total segment and the
/// differences to the tour average.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TourTotals {
    pub recording_time: i64,
    pub break_time: i64,
    /// meters
    pub distance: f64,
    pub avg_pulse: Option<f64>,
    pub avg_cadence: Option<f64>,
    pub altitude_up_down: Option<AltitudeUpDown>,
}

impl TourTotals {
    pub fn moving_time(&self) -> i64 {
        self.recording_time - self.break_time
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentOptions<'a> {
    pub unit_system: UnitSystem,
    /// Altitude differences from the threshold algorithm, one entry per breakpoint.
    pub computed_altitude_diffs: Option<&'a [f64]>,
}

fn validate_breakpoints(breakpoints: &[usize], size: usize) -> Result<(), SeriesError> {
    if breakpoints.len() < 2 {
        return Err(SeriesError::InvalidBreakpoints(format!(
            "at least 2 breakpoints are required, got {}",
            breakpoints.len()
        )));
    }

    if let Some(w) = breakpoints.windows(2).find(|w| w[1] <= w[0]) {
        return Err(SeriesError::InvalidBreakpoints(format!(
            "breakpoints are not strictly increasing: {} -> {}",
            w[0], w[1]
        )));
    }

    let last = breakpoints[breakpoints.len() - 1];
    if last >= size {
        return Err(SeriesError::InvalidBreakpoints(format!(
            "breakpoint {} is outside of the {} samples",
            last, size
        )));
    }

    Ok(())
}

fn speed(unit_system: UnitSystem, distance: f64, moving_time: i64) -> f64 {
    if moving_time == 0 {
        0.0
    } else {
        distance / moving_time as f64 * 3.6 / unit_system.distance_divisor()
    }
}

/// Creates one segment for each pair of consecutive breakpoints and appends
/// a total segment.
pub fn build_segments(
    input: &SegmentInput,
    breakpoints: &[usize],
    totals: &TourTotals,
    options: &SegmentOptions,
) -> Result<Vec<TourSegment>, SeriesError> {
    validate_breakpoints(breakpoints, input.time.len())?;

    let unit_system = options.unit_system;
    let time = input.time;
    let tour_pace = unit_system.pace_seconds(totals.moving_time() as f64, totals.distance);

    let mut segments = Vec::with_capacity(breakpoints.len());

    let mut time_total = 0;
    let mut distance_total = 0.0;
    let mut border_up = 0.0;
    let mut border_down = 0.0;
    let mut computed_up = 0.0;
    let mut computed_down = 0.0;

    let mut sum_segment_up = 0.0;
    let mut sum_segment_down = 0.0;

    for (segment_index, w) in breakpoints.windows(2).enumerate() {
        let (start, end) = (w[0], w[1]);

        let mut segment = TourSegment {
            serie_index_start: start,
            serie_index_end: end,
            ..Default::default()
        };

        // time
        let recording = time[end] - time[start];
        let breaks = input.break_mask.map_or(0, |mask| break_time(time, mask, start, end));
        let moving = recording - breaks;

        time_total += recording;
        segment.time_recording = recording;
        segment.time_break = breaks;
        segment.time_moving = moving;
        segment.time_total = time_total;

        // distance
        let mut distance_diff = 0.0;
        if let Some(distance) = input.distance {
            distance_diff = distance[end] - distance[start];
            distance_total += distance_diff;

            segment.distance_diff = distance_diff;
            segment.distance_total = distance_total;

            if distance_diff != 0.0 {
                segment.speed = speed(unit_system, distance_diff, moving);
                segment.pace = unit_system.pace_seconds(moving as f64, distance_diff);
                segment.pace_diff = segment.pace - tour_pace;
            }
        }

        // altitude
        if let Some(altitude) = input.altitude_smoothed {
            let altitude_diff = altitude[end] - altitude[start];

            segment.altitude_border_diff = altitude_diff;
            segment.altitude_up_down_hour = if moving == 0 {
                0.0
            } else {
                unit_system.altitude_from_meters(altitude_diff) / moving as f64 * 3600.0
            };

            if altitude_diff > 0.0 {
                border_up += altitude_diff;
                segment.altitude_segment_up = altitude_diff;
            } else {
                border_down -= altitude_diff;
                segment.altitude_segment_down = -altitude_diff;
            }
            segment.altitude_summarized_border_up = border_up;
            segment.altitude_summarized_border_down = border_down;

            sum_segment_up += segment.altitude_segment_up;
            sum_segment_down += segment.altitude_segment_down;

            // the computed diff of a segment is stored at its end breakpoint
            if let Some(computed) = options.computed_altitude_diffs.and_then(|c| c.get(segment_index + 1)) {
                segment.altitude_computed_diff = Some(*computed);
                if *computed > 0.0 {
                    computed_up += computed;
                } else {
                    computed_down -= computed;
                }
                segment.altitude_summarized_computed_up = computed_up;
                segment.altitude_summarized_computed_down = computed_down;
            }

            if distance_diff != 0.0 {
                segment.gradient = altitude_diff * 100.0 / distance_diff;
            }
        }

        segment.power = input.power.map(|power| averages::power(power, start, end));

        if let Some(pulse) = input.pulse_smoothed {
            let avg_pulse = averages::time_weighted(time, pulse, input.break_mask, start, end);
            segment.pulse = Some(avg_pulse);
            segment.pulse_diff = totals.avg_pulse.map(|tour_avg| avg_pulse - tour_avg);
        }

        segment.cadence = input
            .cadence
            .map(|cadence| averages::time_weighted(time, cadence, input.break_mask, start, end));

        segments.push(segment);
    }

    let total_moving = totals.moving_time();
    let (total_up, total_down) = match totals.altitude_up_down {
        Some(up_down) => (up_down.up, up_down.down),
        None => (sum_segment_up, sum_segment_down),
    };

    segments.push(TourSegment {
        is_total: true,
        serie_index_start: breakpoints[0],
        serie_index_end: breakpoints[breakpoints.len() - 1],
        time_recording: totals.recording_time,
        time_moving: total_moving,
        time_break: totals.break_time,
        time_total: totals.recording_time,
        distance_diff: totals.distance,
        distance_total: totals.distance,
        altitude_segment_up: total_up,
        altitude_segment_down: total_down,
        speed: speed(unit_system, totals.distance, total_moving),
        pace: tour_pace,
        cadence: totals.avg_cadence,
        pulse: totals.avg_pulse,
        ..Default::default()
    });

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        time: Vec<i64>,
        distance: Vec<f64>,
        altitude: Vec<f64>,
        pulse: Vec<f64>,
        mask: Vec<bool>,
    }

    /// 10 s samples at 5 m/s climbing 1 m per sample, a stop from sample 20 to 25
    fn fixture() -> Fixture {
        let time: Vec<i64> = (0..=40).map(|i| i * 10).collect();
        let mut distance = Vec::new();
        let mut d = 0.0;
        for i in 0..=40 {
            if i > 0 && !(21..=25).contains(&i) {
                d += 50.0;
            }
            distance.push(d);
        }
        let altitude = (0..=40).map(|i| 500.0 + i as f64).collect();
        let pulse = (0..=40).map(|i| 120.0 + (i % 5) as f64).collect();
        let mask = (0..=40).map(|i| (21..=25).contains(&i)).collect();
        Fixture {
            time,
            distance,
            altitude,
            pulse,
            mask,
        }
    }

    fn input(f: &Fixture) -> SegmentInput {
        SegmentInput {
            time: &f.time,
            distance: Some(&f.distance),
            altitude_smoothed: Some(&f.altitude),
            pulse_smoothed: Some(&f.pulse),
            cadence: None,
            power: None,
            break_mask: Some(&f.mask),
        }
    }

    fn totals(f: &Fixture) -> TourTotals {
        TourTotals {
            recording_time: f.time[40] - f.time[0],
            break_time: break_time(&f.time, &f.mask, 0, 40),
            distance: f.distance[40] - f.distance[0],
            avg_pulse: Some(averages::time_weighted(&f.time, &f.pulse, Some(&f.mask), 0, 40)),
            avg_cadence: None,
            altitude_up_down: None,
        }
    }

    #[test]
    fn test_invalid_breakpoints() {
        let f = fixture();
        let input = input(&f);
        let totals = totals(&f);
        let options = SegmentOptions::default();

        for breakpoints in [vec![0], vec![0, 10, 10], vec![0, 20, 5], vec![0, 41]] {
            let result = build_segments(&input, &breakpoints, &totals, &options);
            assert!(
                matches!(result, Err(SeriesError::InvalidBreakpoints(_))),
                "{:?}",
                breakpoints
            );
        }
    }

    #[test]
    fn test_segment_values() {
        let f = fixture();
        let segments = build_segments(&input(&f), &[0, 20, 40], &totals(&f), &SegmentOptions::default()).unwrap();

        assert_eq!(segments.len(), 3);

        let first = &segments[0];
        assert_eq!(first.time_recording, 200);
        assert_eq!(first.time_break, 0);
        assert_eq!(first.distance_diff, 1000.0);
        assert!((first.speed - 18.0).abs() < 1e-9);
        assert!((first.pace - 200.0).abs() < 1e-9);
        assert!((first.gradient - 2.0).abs() < 1e-9);
        assert!((first.altitude_up_down_hour - 360.0).abs() < 1e-9);

        let second = &segments[1];
        assert_eq!(second.time_break, 50);
        assert_eq!(second.time_moving, 150);
        assert_eq!(second.time_total, 400);
        assert_eq!(second.distance_total, 1750.0);
        assert_eq!(second.altitude_summarized_border_up, 40.0);
        assert!(second.pulse_diff.is_some());
    }

    #[test]
    fn test_total_segment_is_independent_of_breakpoints() {
        let f = fixture();
        let totals = totals(&f);
        let options = SegmentOptions::default();

        let coarse = build_segments(&input(&f), &[0, 40], &totals, &options).unwrap();
        let fine = build_segments(&input(&f), &[0, 3, 7, 21, 22, 30, 40], &totals, &options).unwrap();

        let coarse_total = coarse.last().unwrap();
        let fine_total = fine.last().unwrap();
        assert!(coarse_total.is_total && fine_total.is_total);
        assert_eq!(coarse_total.distance_diff, fine_total.distance_diff);
        assert_eq!(coarse_total.time_moving, fine_total.time_moving);

        // segments which span the whole tour add up to the total
        let moving: i64 = fine[..fine.len() - 1].iter().map(|s| s.time_moving).sum();
        let distance: f64 = fine[..fine.len() - 1].iter().map(|s| s.distance_diff).sum();
        assert_eq!(moving, fine_total.time_moving);
        assert_eq!(distance, fine_total.distance_diff);
    }

    #[test]
    fn test_computed_altitude_diffs() {
        let f = fixture();
        let options = SegmentOptions {
            unit_system: UnitSystem::Metric,
            computed_altitude_diffs: Some(&[0.0, 20.0, -5.0]),
        };
        let segments = build_segments(&input(&f), &[0, 20, 40], &totals(&f), &options).unwrap();
        assert_eq!(segments[0].altitude_computed_diff, Some(20.0));
        assert_eq!(segments[1].altitude_computed_diff, Some(-5.0));
        assert_eq!(segments[1].altitude_summarized_computed_up, 20.0);
        assert_eq!(segments[1].altitude_summarized_computed_down, 5.0);
    }

    #[test]
    fn test_imperial_speed() {
        let f = fixture();
        let options = SegmentOptions {
            unit_system: UnitSystem::Imperial,
            computed_altitude_diffs: None,
        };
        let segments = build_segments(&input(&f), &[0, 20], &totals(&f), &options).unwrap();
        assert!((segments[0].speed - 18.0 / crate::units::UNIT_MILE).abs() < 1e-9);
    }
}
