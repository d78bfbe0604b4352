use geo::{point, HaversineDistance};

/// Cumulative great circle distance in meters between consecutive fixes.
///
/// Used when a tour has positions but no distance field.
pub fn distance_from_positions(latitude: &[f64], longitude: &[f64]) -> Vec<f64> {
    let size = latitude.len().min(longitude.len());
    if size == 0 {
        return Vec::new();
    }

    let mut distances = Vec::with_capacity(size);
    distances.push(0.0);

    for i in 1..size {
        let point_a = point!(x: longitude[i - 1], y: latitude[i - 1]);
        let point_b = point!(x: longitude[i], y: latitude[i]);

        let segment_distance = point_a.haversine_distance(&point_b);
        distances.push(distances[i - 1] + segment_distance);
    }

    distances
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_is_cumulative() {
        // 0.001° latitude is about 111 m
        let latitude = vec![47.0, 47.001, 47.002, 47.002];
        let longitude = vec![8.0, 8.0, 8.0, 8.0];
        let distance = distance_from_positions(&latitude, &longitude);

        assert_eq!(distance[0], 0.0);
        assert!((distance[1] - 111.2).abs() < 1.0, "{}", distance[1]);
        assert!((distance[2] - 2.0 * distance[1]).abs() < 0.01);
        assert_eq!(distance[3], distance[2]);
    }

    #[test]
    fn test_empty_positions() {
        assert!(distance_from_positions(&[], &[]).is_empty());
    }
}
