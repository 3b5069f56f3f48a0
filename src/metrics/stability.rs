//! Stability metrics: rolling-return consistency.

use chrono::{Duration, NaiveDate};

/// Fraction of rolling `window_years` windows with a positive return.
///
/// The sparse series is forward-filled onto a daily calendar grid so the
/// window shift is uniform; the window length is `window_years * 365`
/// calendar days. `None` when the grid is not longer than one window or
/// no window survives the zero-denominator guard.
pub fn rolling_consistency(series: &[(NaiveDate, f64)], window_years: i64) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }

    let window = (window_years * 365) as usize;
    let grid = forward_fill_daily(series);
    if grid.len() <= window {
        return None;
    }

    let mut positive = 0u64;
    let mut total = 0u64;
    for t in window..grid.len() {
        let base = grid[t - window];
        if base == 0.0 {
            continue;
        }
        let rolling_return = grid[t] / base - 1.0;
        if !rolling_return.is_finite() {
            continue;
        }
        total += 1;
        if rolling_return > 0.0 {
            positive += 1;
        }
    }

    if total == 0 {
        return None;
    }
    Some(positive as f64 / total as f64)
}

/// Resamples a sparse, ascending series to one value per calendar day,
/// carrying the last observation forward.
fn forward_fill_daily(series: &[(NaiveDate, f64)]) -> Vec<f64> {
    let first = series[0].0;
    let last = series[series.len() - 1].0;
    let days = last.signed_duration_since(first).num_days() as usize + 1;

    let mut grid = Vec::with_capacity(days);
    let mut idx = 0;
    let mut current = series[0].1;
    let mut day = first;
    while day <= last {
        while idx < series.len() && series[idx].0 <= day {
            current = series[idx].1;
            idx += 1;
        }
        grid.push(current);
        day += Duration::days(1);
    }
    grid
}
