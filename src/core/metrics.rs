//! Persisted per-fund metrics record.

use super::nav::FundId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row per fund, fully overwritten on each metrics run. Raw metrics
/// are `None` when the underlying history cannot support them; normalized
/// fields default to 0 and are only comparable within a category group
/// produced by the same run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundMetrics {
    pub fund_id: FundId,
    pub category: String,
    pub cagr_3y: Option<f64>,
    pub cagr_5y: Option<f64>,
    pub volatility: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub rolling_3y_consistency: Option<f64>,
    pub expense_ratio: Option<f64>,
    #[serde(default)]
    pub norm_cagr_3y: f64,
    #[serde(default)]
    pub norm_cagr_5y: f64,
    #[serde(default)]
    pub norm_volatility: f64,
    #[serde(default)]
    pub norm_max_drawdown: f64,
    #[serde(default)]
    pub norm_consistency: f64,
    #[serde(default)]
    pub norm_expense_ratio: f64,
    pub last_updated: DateTime<Utc>,
}

impl FundMetrics {
    pub fn new(fund_id: FundId, category: impl Into<String>) -> Self {
        FundMetrics {
            fund_id,
            category: category.into(),
            cagr_3y: None,
            cagr_5y: None,
            volatility: None,
            max_drawdown: None,
            rolling_3y_consistency: None,
            expense_ratio: None,
            norm_cagr_3y: 0.0,
            norm_cagr_5y: 0.0,
            norm_volatility: 0.0,
            norm_max_drawdown: 0.0,
            norm_consistency: 0.0,
            norm_expense_ratio: 0.0,
            last_updated: Utc::now(),
        }
    }
}
