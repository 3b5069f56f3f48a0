//! Per-fund metric derivation.
//!
//! `compute_fund_metrics` is a pure function over self-contained value
//! inputs so a batch can fan it out across blocking workers with no
//! shared state. Every metric degrades to `None` independently when the
//! history cannot support it.

pub mod cost;
pub mod normalize;
pub mod performance;
pub mod risk;
pub mod stability;

use crate::core::fund::ExpenseSnapshot;
use crate::core::metrics::FundMetrics;
use crate::core::nav::{FundId, NavPoint};
use chrono::NaiveDate;

/// Owned inputs for one fund's computation.
#[derive(Debug, Clone)]
pub struct FundComputeInput {
    pub fund_id: FundId,
    pub category: String,
    /// NAV history, ascending by date.
    pub nav: Vec<NavPoint>,
    pub expense: Option<ExpenseSnapshot>,
}

/// Derives the raw metrics for a single fund. Returns `None` when the
/// fund has no NAV history at all; normalization happens later, across
/// the whole batch.
pub fn compute_fund_metrics(input: FundComputeInput) -> Option<FundMetrics> {
    if input.nav.is_empty() {
        return None;
    }

    let mut series: Vec<(NaiveDate, f64)> =
        input.nav.iter().map(|p| (p.date, p.value)).collect();
    series.sort_by_key(|(date, _)| *date);

    let returns = risk::daily_returns(&series);

    let mut metrics = FundMetrics::new(input.fund_id, input.category);
    metrics.cagr_3y = performance::cagr(&series, 3);
    metrics.cagr_5y = performance::cagr(&series, 5);
    metrics.volatility = risk::volatility(&returns);
    metrics.max_drawdown = risk::max_drawdown(&series);
    metrics.rolling_3y_consistency = stability::rolling_consistency(&series, 3);
    metrics.expense_ratio = cost::expense_ratio(input.expense.as_ref());
    Some(metrics)
}

/// Sample standard deviation; `None` with fewer than two values.
pub(crate) fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}
