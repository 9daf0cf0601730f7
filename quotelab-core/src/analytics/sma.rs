//! Simple moving average over a close-price series.
//!
//! Lookback: period - 1 (first defined value at index period-1).

/// Short window used for trend detection.
pub const SHORT_WINDOW: usize = 7;
/// Long window used for trend detection.
pub const LONG_WINDOW: usize = 21;

/// Rolling mean of `values` over `period` points.
///
/// Positions before the first full window are `None`, as is any window that
/// contains a non-finite value.
pub fn rolling_sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];
    if period == 0 || n < period {
        return result;
    }

    let mut sum: f64 = values[..period].iter().sum();
    result[period - 1] = window_mean(sum, &values[..period]);

    for i in period..n {
        sum = sum - values[i - period] + values[i];
        let window = &values[(i + 1 - period)..=i];
        if !sum.is_finite() {
            // A NaN left the window; start the running sum over.
            sum = window.iter().sum();
        }
        result[i] = window_mean(sum, window);
    }

    result
}

/// Mean of the last `period` values, or `None` when fewer are available.
pub fn trailing_sma(values: &[f64], period: usize) -> Option<f64> {
    rolling_sma(values, period).last().copied().flatten()
}

fn window_mean(sum: f64, window: &[f64]) -> Option<f64> {
    if window.iter().all(|v| v.is_finite()) {
        Some(sum / window.len() as f64)
    } else {
        None
    }
}
