//! Risk metrics: return volatility and maximum drawdown.

use super::sample_std;
use chrono::NaiveDate;

/// Percent change between consecutive observations, with non-finite
/// values discarded.
pub fn daily_returns(series: &[(NaiveDate, f64)]) -> Vec<f64> {
    series
        .windows(2)
        .map(|pair| (pair[1].1 - pair[0].1) / pair[0].1)
        .filter(|r| r.is_finite())
        .collect()
}

/// Sample standard deviation of the return series.
pub fn volatility(returns: &[f64]) -> Option<f64> {
    sample_std(returns)
}

/// Worst peak-to-trough decline relative to the running maximum:
/// `min((nav - running_max) / running_max)`. Always <= 0; exactly 0 for a
/// monotonically non-decreasing series. Points observed before any
/// positive running maximum are skipped, so a zero peak never divides.
pub fn max_drawdown(series: &[(NaiveDate, f64)]) -> Option<f64> {
    let mut running_max = f64::NEG_INFINITY;
    let mut worst: Option<f64> = None;
    for &(_, nav) in series {
        running_max = running_max.max(nav);
        if running_max <= 0.0 {
            continue;
        }
        let drawdown = (nav - running_max) / running_max;
        worst = Some(worst.map_or(drawdown, |w: f64| w.min(drawdown)));
    }
    worst
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn series(values: &[f64]) -> Vec<(NaiveDate, f64)> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| (date(i as u32 + 1), v))
            .collect()
    }

    #[test]
    fn test_daily_returns_pct_change() {
        let returns = daily_returns(&series(&[100.0, 110.0, 99.0]));
        assert_eq!(returns.len(), 2);
        assert!((returns[0] - 0.1).abs() < 1e-12);
        assert!((returns[1] - (99.0 / 110.0 - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_daily_returns_discard_non_finite() {
        // A zero NAV would produce an infinite pct change.
        let returns = daily_returns(&series(&[100.0, 0.0, 50.0]));
        assert_eq!(returns, vec![-1.0]);
    }

    #[test]
    fn test_volatility_needs_two_returns() {
        assert_eq!(volatility(&[]), None);
        assert_eq!(volatility(&[0.01]), None);
        assert!(volatility(&[0.01, -0.02, 0.005]).is_some());
    }

    #[test]
    fn test_max_drawdown_is_non_positive() {
        let dd = max_drawdown(&series(&[100.0, 120.0, 90.0, 130.0])).unwrap();
        assert!((dd - (90.0 - 120.0) / 120.0).abs() < 1e-12);
        assert!(dd <= 0.0);
    }

    #[test]
    fn test_max_drawdown_zero_iff_monotone() {
        assert_eq!(max_drawdown(&series(&[100.0, 100.0, 110.0, 120.0])), Some(0.0));
        let dd = max_drawdown(&series(&[100.0, 99.9, 120.0])).unwrap();
        assert!(dd < 0.0);
    }

    #[test]
    fn test_max_drawdown_empty_is_none() {
        assert_eq!(max_drawdown(&[]), None);
    }
}
