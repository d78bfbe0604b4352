/// Douglas-Peucker line simplification over (distance, value) points.
///
/// Ranges are processed with an explicit stack so that long tours cannot
/// overflow the call stack. Forced indices split the line before the
/// simplification starts and are always part of the result.
use geo::Coord;

pub struct DouglasPeucker<'a> {
    tolerance: f64,
    points: &'a [Coord<f64>],
    forced_indices: &'a [usize],
}

/// Euclidean distance of `point` to the line segment `start`-`end`.
fn segment_distance(point: Coord<f64>, start: Coord<f64>, end: Coord<f64>) -> f64 {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length_squared = dx * dx + dy * dy;

    if length_squared == 0.0 {
        return (point.x - start.x).hypot(point.y - start.y);
    }

    let r = ((point.x - start.x) * dx + (point.y - start.y) * dy) / length_squared;
    if r <= 0.0 {
        (point.x - start.x).hypot(point.y - start.y)
    } else if r >= 1.0 {
        (point.x - end.x).hypot(point.y - end.y)
    } else {
        let s = ((start.y - point.y) * dx - (start.x - point.x) * dy) / length_squared;
        s.abs() * dx.hypot(dy)
    }
}

impl<'a> DouglasPeucker<'a> {
    pub fn new(tolerance: f64, points: &'a [Coord<f64>], forced_indices: &'a [usize]) -> Self {
        DouglasPeucker {
            tolerance,
            points,
            forced_indices,
        }
    }

    /// Returns the sorted indices of the retained points.
    pub fn simplify(&self) -> Vec<usize> {
        let size = self.points.len();
        if size <= 2 {
            return (0..size).collect();
        }

        let last = size - 1;
        let mut keep = vec![false; size];
        keep[0] = true;
        keep[last] = true;

        for &index in self.forced_indices {
            if index < size {
                keep[index] = true;
            }
        }

        let anchors: Vec<usize> = (0..size).filter(|i| keep[*i]).collect();
        let mut stack: Vec<(usize, usize)> = anchors.windows(2).map(|w| (w[0], w[1])).collect();

        while let Some((start, end)) = stack.pop() {
            if end <= start + 1 {
                continue;
            }

            let first = self.points[start];
            let second = self.points[end];

            let mut max_distance = 0.0;
            let mut max_index = start;

            for index in start + 1..end {
                let distance = segment_distance(self.points[index], first, second);
                if distance > max_distance {
                    max_distance = distance;
                    max_index = index;
                }
            }

            if max_distance > self.tolerance {
                keep[max_index] = true;
                stack.push((start, max_index));
                stack.push((max_index, end));
            }
        }

        (0..size).filter(|i| keep[*i]).collect()
    }
}

/// Points of a value serie over the distance (or time) serie.
pub fn to_points(x: &[f64], y: &[f64]) -> Vec<Coord<f64>> {
    x.iter().zip(y.iter()).map(|(x, y)| Coord { x: *x, y: *y }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, SimplifyIdx};

    #[test]
    fn test_straight_line_keeps_ends() {
        let x: Vec<f64> = (0..100).map(|i| i as f64 * 10.0).collect();
        let y: Vec<f64> = x.iter().map(|v| v * 0.1).collect();
        let points = to_points(&x, &y);
        assert_eq!(DouglasPeucker::new(1.0, &points, &[]).simplify(), vec![0, 99]);
    }

    #[test]
    fn test_peak_is_retained() {
        let x = vec![0.0, 500.0, 1000.0, 1500.0, 2000.0];
        let y = vec![0.0, 50.0, 100.0, 50.0, 0.0];
        let points = to_points(&x, &y);
        assert_eq!(DouglasPeucker::new(7.0, &points, &[]).simplify(), vec![0, 2, 4]);
    }

    #[test]
    fn test_forced_indices_are_retained() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y = vec![0.0; 10];
        let points = to_points(&x, &y);
        assert_eq!(DouglasPeucker::new(5.0, &points, &[4, 7, 42]).simplify(), vec![0, 4, 7, 9]);
    }

    #[test]
    fn test_matches_geo_simplify() {
        let x: Vec<f64> = (0..40).map(|i| i as f64 * 25.0).collect();
        let y: Vec<f64> = (0..40)
            .map(|i| {
                let i = i as f64;
                20.0 * (i / 5.0).sin() + 3.0 * (i * 1.7).cos() + i * 0.8
            })
            .collect();
        let points = to_points(&x, &y);

        let ours = DouglasPeucker::new(4.0, &points, &[]).simplify();
        let line = LineString::from(points.clone());
        assert_eq!(ours, line.simplify_idx(&4.0));
    }

    #[test]
    fn test_short_lines() {
        let points = to_points(&[0.0, 1.0], &[5.0, 6.0]);
        assert_eq!(DouglasPeucker::new(1.0, &points, &[]).simplify(), vec![0, 1]);
        assert!(DouglasPeucker::new(1.0, &[], &[]).simplify().is_empty());
    }
}
