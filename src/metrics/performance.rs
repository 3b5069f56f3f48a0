//! Performance metrics: compound annual growth over fixed windows.

use crate::core::nav::years_before;
use chrono::NaiveDate;

/// CAGR over a `years`-long window: `(nav_end / nav_start)^(1/years) - 1`.
///
/// The window start is the nearest available point to the date `years`
/// calendar years before the latest observation — a nearest-neighbor
/// lookup, never an interpolation; on equidistant candidates the earlier
/// point wins. `None` if the series has fewer than two points, if the
/// nearest start leaves the actual span more than 0.1 year short of the
/// window, or if either endpoint is non-positive or non-finite.
pub fn cagr(series: &[(NaiveDate, f64)], years: i32) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }

    let &(end_date, nav_end) = series.last()?;
    let target = years_before(end_date, years);
    let &(start_date, nav_start) = series
        .iter()
        .min_by_key(|(date, _)| date.signed_duration_since(target).num_days().abs())?;

    let actual_years = end_date.signed_duration_since(start_date).num_days() as f64 / 365.25;
    if actual_years < years as f64 - 0.1 {
        return None;
    }
    if !nav_start.is_finite() || !nav_end.is_finite() || nav_start <= 0.0 || nav_end <= 0.0 {
        return None;
    }

    Some((nav_end / nav_start).powf(1.0 / years as f64) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_cagr_exact_formula() {
        let series = vec![
            (date(2021, 6, 1), 100.0),
            (date(2023, 1, 1), 130.0),
            (date(2024, 6, 1), 150.0),
        ];
        let expected = (150.0_f64 / 100.0).powf(1.0 / 3.0) - 1.0;
        let got = cagr(&series, 3).unwrap();
        assert!((got - expected).abs() < 1e-12);
    }

    #[test]
    fn test_cagr_nearest_start_point() {
        // Target start is 2021-06-01; 2021-05-20 is closer than 2021-07-01.
        let series = vec![
            (date(2021, 5, 20), 98.0),
            (date(2021, 7, 1), 102.0),
            (date(2024, 6, 1), 150.0),
        ];
        let expected = (150.0_f64 / 98.0).powf(1.0 / 3.0) - 1.0;
        assert!((cagr(&series, 3).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_cagr_short_series_is_none() {
        assert_eq!(cagr(&[], 3), None);
        assert_eq!(cagr(&[(date(2024, 1, 1), 100.0)], 3), None);

        // Two points only 1.5 years apart cannot carry a 3y window.
        let series = vec![(date(2023, 1, 1), 100.0), (date(2024, 6, 1), 120.0)];
        assert_eq!(cagr(&series, 3), None);
    }

    #[test]
    fn test_cagr_tolerates_small_shortfall() {
        // Start 0.05 years short of the window is within the 0.1y buffer.
        let end = date(2024, 6, 1);
        let start = end - Duration::days((3.0 * 365.25 - 18.0) as i64);
        let series = vec![(start, 100.0), (end, 140.0)];
        assert!(cagr(&series, 3).is_some());
    }

    #[test]
    fn test_cagr_rejects_larger_shortfall() {
        let end = date(2024, 6, 1);
        let start = end - Duration::days((3.0 * 365.25 - 60.0) as i64);
        let series = vec![(start, 100.0), (end, 140.0)];
        assert_eq!(cagr(&series, 3), None);
    }

    #[test]
    fn test_cagr_non_positive_endpoint_is_none() {
        let series = vec![(date(2021, 6, 1), 0.0), (date(2024, 6, 1), 150.0)];
        assert_eq!(cagr(&series, 3), None);
    }
}
