//! NAV time-series primitives.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Numeric scheme code identifying a fund.
pub type FundId = u32;

/// A single (fund, date, value) observation. Unique per (fund_id, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavPoint {
    pub fund_id: FundId,
    pub date: NaiveDate,
    pub value: f64,
}

/// Per-fund coverage statistics derived from the NAV store, consumed by
/// the fund validation job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavCoverage {
    pub record_count: u64,
    pub latest_date: NaiveDate,
}

/// Calendar-year subtraction. Feb 29 has no counterpart in a non-leap
/// year and clamps to Feb 28.
pub fn years_before(date: NaiveDate, years: i32) -> NaiveDate {
    date.with_year(date.year() - years)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(date.year() - years, 2, 28).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_years_before_plain_date() {
        let d = NaiveDate::from_ymd_opt(2024, 8, 15).unwrap();
        assert_eq!(years_before(d, 3), NaiveDate::from_ymd_opt(2021, 8, 15).unwrap());
    }

    #[test]
    fn test_years_before_leap_day_clamps() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(years_before(d, 3), NaiveDate::from_ymd_opt(2021, 2, 28).unwrap());
    }
}
