/// Double exponential smoothing against an irregular time axis.
///
/// One "double pass" is a forward exponential low-pass followed by a backward
/// pass over the forward result, which removes the phase lag of a single pass.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothingParams {
    /// Time constant in seconds of the first double pass.
    pub tau: f64,
    /// Number of additional double passes.
    pub repeat_count: u32,
    /// Time constant of the additional passes.
    pub repeat_tau: f64,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        SmoothingParams {
            tau: 10.0,
            repeat_count: 1,
            repeat_tau: 1.0,
        }
    }
}

/// Blend factor between two samples which are `time_diff` seconds apart.
///
/// A zero time delta carries the previous value forward, a non positive `tau`
/// takes the new value unchanged.
fn blend_factor(time_diff: i64, tau: f64) -> f64 {
    if time_diff <= 0 {
        return 0.0;
    }
    if tau <= 0.0 {
        return 1.0;
    }
    1.0 - (-(time_diff as f64) / tau).exp()
}

fn double_pass(time: &[i64], values: &[f64], tau: f64) -> Vec<f64> {
    let size = values.len();
    let mut forward = Vec::with_capacity(size);

    forward.push(values[0]);
    for i in 1..size {
        let alpha = blend_factor(time[i] - time[i - 1], tau);
        let prev = forward[i - 1];
        forward.push(prev + alpha * (values[i] - prev));
    }

    let mut result = forward.clone();
    for i in (0..size - 1).rev() {
        let alpha = blend_factor(time[i + 1] - time[i], tau);
        let next = result[i + 1];
        result[i] = next + alpha * (forward[i] - next);
    }

    result
}

/// Returns a smoothed copy of `values`, the input is never modified.
pub fn smooth(time: &[i64], values: &[f64], params: &SmoothingParams) -> Vec<f64> {
    let size = values.len().min(time.len());
    if size < 2 {
        return values.to_vec();
    }

    let mut result = double_pass(&time[..size], &values[..size], params.tau);

    for _ in 0..params.repeat_count {
        result = double_pass(&time[..size], &result, params.repeat_tau);
    }

    // values beyond the time axis are kept as they are
    result.extend_from_slice(&values[size..]);

    result
}
