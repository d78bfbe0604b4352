//! Rest detection.
//!
//! A break mask marks every time slice which is a rest, `mask[i]` is the slice
//! from sample `i - 1` to sample `i`. Break time is the sum of the durations
//! of all marked slices.

use serde::{Deserialize, Serialize};

use crate::config::BreakTimeConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakTimeMethod {
    /// The distance did not change within a number of slices, used for fixed
    /// interval devices.
    FixedDistance,
    /// A minimum time was spent within a small distance.
    TimeDistance,
    /// Raw slice speed below a minimum.
    SliceSpeed,
    /// Windowed speed below a minimum.
    AvgSpeed,
    /// Windowed speed or a long enough slice below a minimum.
    #[default]
    AvgSliceSpeed,
}

/// Input series for the break detection.
#[derive(Debug, Clone, Copy)]
pub struct BreakInput<'a> {
    pub time: &'a [i64],
    /// Metric distance in meters.
    pub distance: &'a [f64],
    /// Windowed speed in km/h.
    pub speed: &'a [f64],
    pub device_time_interval: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BreakTimeResult {
    pub mask: Vec<bool>,
    /// Break time of the whole tour in seconds.
    pub break_time: i64,
}

impl BreakTimeResult {
    /// Break time in seconds within `(start, end]`.
    pub fn break_time(&self, time: &[i64], start: usize, end: usize) -> i64 {
        break_time(time, &self.mask, start, end)
    }
}

/// Sums the durations of all break slices in `(start, end]`, `end` is clamped
/// to the serie length.
pub fn break_time(time: &[i64], mask: &[bool], start: usize, end: usize) -> i64 {
    let size = time.len().min(mask.len());
    if size == 0 || start >= size {
        return 0;
    }
    let end = end.min(size - 1);

    (start + 1..=end)
        .filter(|i| mask[*i])
        .map(|i| time[i] - time[i - 1])
        .sum()
}

fn slice_speed(input: &BreakInput, index: usize) -> Option<f64> {
    let time_diff = input.time[index] - input.time[index - 1];
    if time_diff == 0 {
        return None;
    }
    Some((input.distance[index] - input.distance[index - 1]) * 3.6 / time_diff as f64)
}

/// Computes the break mask with `config.method`.
pub fn compute(input: &BreakInput, config: &BreakTimeConfig) -> BreakTimeResult {
    let size = input.time.len().min(input.distance.len());
    if size == 0 {
        return BreakTimeResult::default();
    }

    let mask = match config.method {
        BreakTimeMethod::FixedDistance => by_fixed_distance(input, size, config),
        BreakTimeMethod::TimeDistance => by_time_distance(input, size, config),
        BreakTimeMethod::SliceSpeed => by_slice_speed(input, size, config),
        BreakTimeMethod::AvgSpeed => by_avg_speed(input, size, config),
        BreakTimeMethod::AvgSliceSpeed => by_avg_slice_speed(input, size, config),
    };

    let break_time = break_time(input.time, &mask, 0, size - 1);

    tracing::debug!("{:?}: {} s break time", config.method, break_time);

    BreakTimeResult { mask, break_time }
}

/// A slice is a break when the distance equals the distance one slice before
/// the minimum break window, i.e. `distance[i - 1 - min_slices]`.
fn by_fixed_distance(input: &BreakInput, size: usize, config: &BreakTimeConfig) -> Vec<bool> {
    let interval = if input.device_time_interval > 0 {
        input.device_time_interval as i64
    } else {
        1
    };
    let min_slices = (config.min_break_time / interval).max(1) as usize;

    let mut mask = vec![false; size];
    for i in 1..size {
        mask[i] = input.distance[i] == input.distance[(i - 1).saturating_sub(min_slices)];
    }
    mask
}

fn by_time_distance(input: &BreakInput, size: usize, config: &BreakTimeConfig) -> Vec<bool> {
    let mut mask = vec![false; size];

    let mut i = 1;
    while i < size {
        if input.distance[i] - input.distance[i - 1] > config.max_slice_distance {
            i += 1;
            continue;
        }

        // collect the still run which starts with slice i
        let run_start = i;
        while i < size && input.distance[i] - input.distance[i - 1] <= config.max_slice_distance {
            i += 1;
        }
        let run_end = i - 1;

        let duration = input.time[run_end] - input.time[run_start - 1];
        let distance = input.distance[run_end] - input.distance[run_start - 1];

        if duration >= config.shortest_time && distance <= config.max_distance {
            mask[run_start..=run_end].iter_mut().for_each(|m| *m = true);
        }
    }

    mask
}

fn by_slice_speed(input: &BreakInput, size: usize, config: &BreakTimeConfig) -> Vec<bool> {
    let mut mask = vec![false; size];
    for i in 1..size {
        // a slice without duration has no weight
        mask[i] = match slice_speed(input, i) {
            Some(speed) => speed < config.min_slice_speed,
            None => true,
        };
    }
    mask
}

fn by_avg_speed(input: &BreakInput, size: usize, config: &BreakTimeConfig) -> Vec<bool> {
    let mut mask = vec![false; size];
    for i in 1..size.min(input.speed.len()) {
        mask[i] = input.speed[i] < config.min_avg_speed;
    }
    mask
}

fn by_avg_slice_speed(input: &BreakInput, size: usize, config: &BreakTimeConfig) -> Vec<bool> {
    let mut mask = vec![false; size];
    for i in 1..size {
        let is_avg_break = input.speed.get(i).map_or(false, |speed| *speed < config.min_avg_speed_as);

        let time_diff = input.time[i] - input.time[i - 1];
        let is_slice_break = time_diff >= config.min_slice_time_as
            && slice_speed(input, i).map_or(false, |speed| speed < config.min_slice_speed_as);

        mask[i] = is_avg_break || is_slice_break;
    }
    mask
}
