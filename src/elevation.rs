//! Total ascent and descent of a tour.
//!
//! Two algorithms are available: Douglas-Peucker over (distance, altitude),
//! which is the preferred one, and the older threshold/angle algorithm which
//! only needs the altitude serie and can emit breakpoints at every accepted
//! direction change.

use serde::{Deserialize, Serialize};

use crate::douglas_peucker::{to_points, DouglasPeucker};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElevationAlgorithm {
    #[default]
    LineSimplification,
    ThresholdAngle,
}

/// Ascent and descent in meters, both positive.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AltitudeUpDown {
    pub up: f64,
    pub down: f64,
}

/// Breakpoint created by the threshold algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AltitudeUpDownSegment {
    pub serie_index: usize,
    /// Altitude difference of the segment which ends at `serie_index`,
    /// negative for a descent.
    pub computed_altitude_diff: f64,
}

/// Indices which are retained by Douglas-Peucker over (distance, altitude).
pub fn dp_indices(distance: &[f64], altitude: &[f64], tolerance: f64, forced_indices: &[usize]) -> Vec<usize> {
    let points = to_points(distance, altitude);
    DouglasPeucker::new(tolerance, &points, forced_indices).simplify()
}

/// Ascent/descent from the altitude values at the Douglas-Peucker points.
pub fn compute_dp(distance: &[f64], altitude: &[f64], tolerance: f64, forced_indices: &[usize]) -> Option<AltitudeUpDown> {
    if altitude.len() < 2 || distance.len() != altitude.len() {
        return None;
    }

    let mut result = AltitudeUpDown::default();
    let indices = dp_indices(distance, altitude, tolerance, forced_indices);

    for w in indices.windows(2) {
        let diff = altitude[w[1]] - altitude[w[0]];
        if diff > 0.0 {
            result.up += diff;
        } else {
            result.down -= diff;
        }
    }

    Some(result)
}

/// Ascent/descent with the threshold/angle algorithm.
///
/// A direction change is accepted when the altitude changed at least
/// `min_alti_diff` in the previous direction. When `segments` is set, a
/// breakpoint is appended for every accepted direction change, the first one
/// is `(0, 0.0)` and the last one ends at the last sample.
pub fn compute_threshold(
    altitude: &[f64],
    min_alti_diff: f64,
    mut segments: Option<&mut Vec<AltitudeUpDownSegment>>,
) -> Option<AltitudeUpDown> {
    let size = altitude.len();
    if size < 2 {
        return None;
    }

    let mut prev_altitude = altitude[0];
    let mut prev_segment_altitude = altitude[0];
    let mut prev_alti_diff = 0.0;

    let mut angle_alti_up = 0.0;
    let mut angle_alti_down = 0.0;

    let mut segment_min = altitude[0];
    let mut segment_max = altitude[0];

    let mut up_total = 0.0;
    let mut down_total = 0.0;

    let mut current_segment_index = 0;

    if let Some(segments) = segments.as_deref_mut() {
        segments.push(AltitudeUpDownSegment {
            serie_index: 0,
            computed_altitude_diff: 0.0,
        });
    }

    for serie_index in 1..size {
        let current = altitude[serie_index];

        if serie_index == size - 1 {
            // close the last segment
            if serie_index != current_segment_index {
                segment_min = segment_min.min(current);
                segment_max = segment_max.max(current);

                let min_max_diff = segment_max - segment_min;
                let segment_diff = if current > prev_segment_altitude {
                    min_max_diff
                } else {
                    -min_max_diff
                };

                if let Some(segments) = segments.as_deref_mut() {
                    segments.push(AltitudeUpDownSegment {
                        serie_index,
                        computed_altitude_diff: segment_diff,
                    });
                }

                if segment_diff > 0.0 {
                    up_total += segment_diff;
                } else {
                    down_total -= segment_diff;
                }
            }
            break;
        }

        let alti_diff = current - prev_altitude;

        if alti_diff > 0.0 {
            if prev_alti_diff >= 0.0 {
                // still ascending
                angle_alti_up += alti_diff;
                segment_max = segment_max.max(current);
            } else {
                // was descending
                if angle_alti_down <= -min_alti_diff {
                    let segment_diff = segment_min - segment_max;
                    down_total -= segment_diff;

                    current_segment_index = serie_index - 1;
                    if let Some(segments) = segments.as_deref_mut() {
                        segments.push(AltitudeUpDownSegment {
                            serie_index: current_segment_index,
                            computed_altitude_diff: segment_diff,
                        });
                    }

                    segment_min = prev_altitude;
                    segment_max = current;
                    prev_segment_altitude = prev_altitude;
                }

                angle_alti_up = alti_diff;
                angle_alti_down = 0.0;
            }
        } else if alti_diff < 0.0 {
            if prev_alti_diff <= 0.0 {
                // still descending
                angle_alti_down += alti_diff;
                segment_min = segment_min.min(current);
            } else {
                // was ascending
                if angle_alti_up >= min_alti_diff {
                    let segment_diff = segment_max - segment_min;
                    up_total += segment_diff;

                    current_segment_index = serie_index - 1;
                    if let Some(segments) = segments.as_deref_mut() {
                        segments.push(AltitudeUpDownSegment {
                            serie_index: current_segment_index,
                            computed_altitude_diff: segment_diff,
                        });
                    }

                    segment_min = current;
                    segment_max = prev_altitude;
                    prev_segment_altitude = prev_altitude;
                }

                angle_alti_up = 0.0;
                angle_alti_down = alti_diff;
            }
        }

        // a flat slice keeps the previous direction
        if alti_diff != 0.0 {
            prev_alti_diff = alti_diff;
        }

        prev_altitude = current;
    }

    Some(AltitudeUpDown {
        up: up_total,
        down: down_total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 0 m -> 100 m -> 0 m over 2 km
    fn hill() -> (Vec<f64>, Vec<f64>) {
        let distance: Vec<f64> = (0..=20).map(|i| i as f64 * 100.0).collect();
        let altitude = (0..=20)
            .map(|i| if i <= 10 { i as f64 * 10.0 } else { (20 - i) as f64 * 10.0 })
            .collect();
        (distance, altitude)
    }

    #[test]
    fn test_hill_with_douglas_peucker() {
        let (distance, altitude) = hill();
        let result = compute_dp(&distance, &altitude, 7.0, &[]).unwrap();
        assert!((result.up - 100.0).abs() < 1e-9);
        assert!((result.down - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_hill_with_threshold() {
        let (_, altitude) = hill();
        let mut segments = Vec::new();
        let result = compute_threshold(&altitude, 5.0, Some(&mut segments)).unwrap();

        assert!((result.up - 100.0).abs() < 1e-9);
        assert!((result.down - 100.0).abs() < 1e-9);

        assert_eq!(
            segments,
            vec![
                AltitudeUpDownSegment {
                    serie_index: 0,
                    computed_altitude_diff: 0.0
                },
                AltitudeUpDownSegment {
                    serie_index: 10,
                    computed_altitude_diff: 100.0
                },
                AltitudeUpDownSegment {
                    serie_index: 20,
                    computed_altitude_diff: -100.0
                },
            ]
        );
    }

    #[test]
    fn test_flat_tour() {
        let altitude = vec![420.0; 30];
        let distance: Vec<f64> = (0..30).map(|i| i as f64 * 10.0).collect();
        assert_eq!(compute_dp(&distance, &altitude, 7.0, &[]), Some(AltitudeUpDown::default()));
        assert_eq!(compute_threshold(&altitude, 5.0, None), Some(AltitudeUpDown::default()));
    }

    #[test]
    fn test_not_enough_altitude() {
        assert_eq!(compute_dp(&[0.0], &[5.0], 7.0, &[]), None);
        assert_eq!(compute_threshold(&[5.0], 5.0, None), None);
    }

    #[test]
    fn test_dp_ignores_noise_below_tolerance() {
        let distance: Vec<f64> = (0..100).map(|i| i as f64 * 20.0).collect();
        let altitude: Vec<f64> = (0..100).map(|i| if i % 2 == 0 { 500.0 } else { 502.0 }).collect();
        let result = compute_dp(&distance, &altitude, 7.0, &[]).unwrap();
        assert!(result.up < 3.0);
        assert!(result.down < 3.0);
    }

    #[test]
    fn test_forced_index_is_counted() {
        let distance: Vec<f64> = (0..10).map(|i| i as f64 * 100.0).collect();
        let altitude = vec![0.0, 1.0, 2.0, 3.0, 4.0, 0.0, 1.0, 2.0, 3.0, 4.0];
        // the drop at the tour boundary is kept even below the tolerance
        let result = compute_dp(&distance, &altitude, 7.0, &[4, 5]).unwrap();
        assert!((result.up - 8.0).abs() < 1e-9);
        assert!((result.down - 4.0).abs() < 1e-9);
    }
}
