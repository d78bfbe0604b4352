//! Time weighted averages which exclude break slices.
//!
//! Each sample is weighted with half of the previous and half of the next
//! time slice. Break slices carry no weight and values `<= 0` (sensor not
//! connected) are ignored.

/// Average of `values` within `[first, last]`.
pub fn time_weighted(time: &[i64], values: &[f64], break_mask: Option<&[bool]>, first: usize, last: usize) -> f64 {
    let size = time.len().min(values.len());
    if size == 0 || first > last || last >= size {
        return 0.0;
    }

    if first == last {
        return values[first];
    }

    if last - first == 1 {
        return (values[first] + values[last]) / 2.0;
    }

    let is_break = |index: usize| break_mask.and_then(|mask| mask.get(index).copied()).unwrap_or(false);

    let mut value_sum = 0.0;
    let mut time_sum = 0.0;

    for index in first..=last {
        if is_break(index) {
            continue;
        }

        let value = values[index];
        if value <= 0.0 {
            continue;
        }

        let mut weight = 0.0;

        if index > first {
            weight += (time[index] - time[index - 1]) as f64 / 2.0;
        }

        if index < last && !is_break(index + 1) {
            weight += (time[index + 1] - time[index]) as f64 / 2.0;
        }

        value_sum += value * weight;
        time_sum += weight;
    }

    if time_sum == 0.0 {
        0.0
    } else {
        value_sum / time_sum
    }
}

/// Average power over `(start, end]`.
pub fn power(power: &[f64], start: usize, end: usize) -> f64 {
    if end <= start || end >= power.len() {
        return 0.0;
    }
    power[start + 1..=end].iter().sum::<f64>() / (end - start) as f64
}

/// Arithmetic mean of all values.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_value() {
        let time = vec![0, 3, 10, 11, 30];
        let values = vec![140.0; 5];
        assert!((time_weighted(&time, &values, None, 0, 4) - 140.0).abs() < 1e-9);
    }

    #[test]
    fn test_weights_follow_time() {
        // 10 s at 100 bpm and 30 s at 200 bpm
        let time = vec![0, 10, 20, 50, 60];
        let values = vec![100.0, 100.0, 200.0, 200.0, 200.0];
        let avg = time_weighted(&time, &values, None, 0, 4);
        // weights: 5, 10, 20, 20, 5
        let expected = (100.0 * 15.0 + 200.0 * 45.0) / 60.0;
        assert!((avg - expected).abs() < 1e-9, "{}", avg);
    }

    #[test]
    fn test_breaks_and_zero_values_are_ignored() {
        let time = vec![0, 10, 20, 30, 40];
        let values = vec![120.0, 0.0, 500.0, 120.0, 120.0];
        let mask = vec![false, false, true, false, false];
        let avg = time_weighted(&time, &values, Some(&mask), 0, 4);
        assert!((avg - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_one_and_two_points() {
        let time = vec![0, 10, 20];
        let values = vec![90.0, 110.0, 130.0];
        assert_eq!(time_weighted(&time, &values, None, 1, 1), 110.0);
        assert_eq!(time_weighted(&time, &values, None, 1, 2), 120.0);
    }

    #[test]
    fn test_power_over_range() {
        let values = vec![1000.0, 100.0, 200.0, 300.0];
        assert_eq!(power(&values, 0, 3), 200.0);
        assert_eq!(power(&values, 2, 2), 0.0);
    }
}
