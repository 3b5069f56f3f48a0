//! Cross-sectional normalization of raw metrics within peer groups.
//!
//! Z-scores are recomputed over the whole batch every run: a fund's
//! normalized value can move even when its raw value did not, because its
//! peer group changed.

use super::sample_std;
use crate::core::metrics::FundMetrics;
use std::collections::BTreeMap;

type Getter = fn(&FundMetrics) -> Option<f64>;
type Setter = fn(&mut FundMetrics, f64);

fn accessors() -> [(Getter, Setter); 6] {
    [
        (|m| m.cagr_3y, |m, v| m.norm_cagr_3y = v),
        (|m| m.cagr_5y, |m, v| m.norm_cagr_5y = v),
        (|m| m.volatility, |m, v| m.norm_volatility = v),
        (|m| m.max_drawdown, |m, v| m.norm_max_drawdown = v),
        (|m| m.rolling_3y_consistency, |m, v| m.norm_consistency = v),
        (|m| m.expense_ratio, |m, v| m.norm_expense_ratio = v),
    ]
}

/// Fills every `norm_*` field with the metric's z-score against its
/// category group: `(x - mean) / std` using the group's sample standard
/// deviation. Groups with zero or undefined deviation (single member or
/// all-equal values) normalize to 0, as do funds whose raw metric is
/// absent.
pub fn normalize_by_category(records: &mut [FundMetrics]) {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, record) in records.iter().enumerate() {
        groups.entry(record.category.clone()).or_default().push(i);
    }

    for indices in groups.values() {
        for (get, set) in accessors() {
            let values: Vec<f64> = indices
                .iter()
                .filter_map(|&i| get(&records[i]))
                .filter(|v| v.is_finite())
                .collect();
            let mean = values.iter().sum::<f64>() / values.len().max(1) as f64;
            let std = sample_std(&values);

            for &i in indices {
                let norm = match (get(&records[i]), std) {
                    (Some(x), Some(s)) if s > 0.0 && x.is_finite() => (x - mean) / s,
                    _ => 0.0,
                };
                set(&mut records[i], norm);
            }
        }
    }
}
