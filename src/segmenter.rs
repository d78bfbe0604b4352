//! Breakpoint generators for the segment builder.
//!
//! Every generator returns a strictly increasing list which starts at `0` and
//! ends at the last sample, or an empty list when the tour has fewer than 2
//! samples.

use crate::douglas_peucker::{to_points, DouglasPeucker};
use crate::elevation::{self, AltitudeUpDownSegment};

/// Breakpoints of the threshold algorithm with the altitude difference of the
/// segment which ends at each breakpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputedBreakpoints {
    pub indices: Vec<usize>,
    pub computed_altitude_diffs: Vec<f64>,
}

fn finish(mut indices: Vec<usize>, size: usize) -> Vec<usize> {
    if size < 2 {
        return Vec::new();
    }
    let last = size - 1;

    indices.retain(|index| *index <= last);
    indices.push(0);
    indices.push(last);
    indices.sort_unstable();
    indices.dedup();

    indices
}

/// Douglas-Peucker over (distance, smoothed altitude), tour starts of a
/// multi tour are always retained.
pub fn by_altitude_dp(distance: &[f64], altitude: &[f64], tolerance: f64, forced_indices: &[usize]) -> Vec<usize> {
    let size = distance.len().min(altitude.len());
    finish(
        elevation::dp_indices(&distance[..size], &altitude[..size], tolerance, forced_indices),
        size,
    )
}

/// Breakpoints at every direction change which is accepted by the threshold
/// algorithm.
pub fn by_computed_alti_up_down(altitude: &[f64], min_alti_diff: f64) -> ComputedBreakpoints {
    let mut segments: Vec<AltitudeUpDownSegment> = Vec::new();
    if elevation::compute_threshold(altitude, min_alti_diff, Some(&mut segments)).is_none() {
        return ComputedBreakpoints::default();
    }

    let mut result = ComputedBreakpoints::default();
    for segment in segments {
        if result.indices.last().map_or(false, |prev| segment.serie_index <= *prev) {
            continue;
        }
        result.indices.push(segment.serie_index);
        result.computed_altitude_diffs.push(segment.computed_altitude_diff);
    }

    // a flat tour has no closing segment
    let last = altitude.len() - 1;
    if result.indices.last() != Some(&last) {
        result.indices.push(last);
        result.computed_altitude_diffs.push(0.0);
    }

    result
}

/// A breakpoint at the first sample which reaches each multiple of
/// `segment_distance` meters.
pub fn by_distance(distance: &[f64], segment_distance: f64) -> Vec<usize> {
    let mut indices = Vec::new();

    if segment_distance > 0.0 {
        let mut next_distance = segment_distance;
        for (index, value) in distance.iter().enumerate() {
            if *value >= next_distance {
                indices.push(index);
                while next_distance <= *value {
                    next_distance += segment_distance;
                }
            }
        }
    }

    finish(indices, distance.len())
}

/// A breakpoint wherever the break mask toggles, break and moving parts of the
/// tour become separate segments.
pub fn by_break_time(break_mask: &[bool]) -> Vec<usize> {
    let mut indices = Vec::new();
    let mut prev_is_break = false;

    for (index, is_break) in break_mask.iter().enumerate().skip(1) {
        if *is_break != prev_is_break {
            indices.push(index - 1);
        }
        prev_is_break = *is_break;
    }

    finish(indices, break_mask.len())
}

/// Marker positions merged with the tour boundaries, markers can be unsorted.
pub fn by_markers(marker_indices: &[usize], tour_start_indices: &[usize], size: usize) -> Vec<usize> {
    let indices = marker_indices.iter().chain(tour_start_indices.iter()).copied().collect();
    finish(indices, size)
}

/// Douglas-Peucker over (time, value), used for pulse and power.
pub fn by_value_dp(time: &[i64], values: &[f64], tolerance: f64, forced_indices: &[usize]) -> Vec<usize> {
    let size = time.len().min(values.len());
    let x: Vec<f64> = time[..size].iter().map(|t| *t as f64).collect();
    let points = to_points(&x, &values[..size]);

    finish(DouglasPeucker::new(tolerance, &points, forced_indices).simplify(), size)
}
