//! Fund identity, eligibility and expense data.

use super::nav::FundId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Master directory entry for a fund. Identity fields are written by
/// ingestion; activity/eligibility flags are owned by the validation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundRecord {
    pub fund_id: FundId,
    pub display_name: String,
    pub category: String,
    pub plan_type: String,
    pub is_active: bool,
    pub eligible_for_reco: bool,
    #[serde(default)]
    pub last_nav_date: Option<NaiveDate>,
    #[serde(default)]
    pub nav_record_count: u64,
    #[serde(default)]
    pub validated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status_note: Option<String>,
}

impl FundRecord {
    pub fn new(fund_id: FundId, display_name: impl Into<String>, category: impl Into<String>) -> Self {
        FundRecord {
            fund_id,
            display_name: display_name.into(),
            category: category.into(),
            plan_type: "Regular".to_string(),
            is_active: true,
            eligible_for_reco: true,
            last_nav_date: None,
            nav_record_count: 0,
            validated_at: None,
            status_note: None,
        }
    }
}

/// Monthly total expense ratio snapshot. One per (fund, plan, month).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseSnapshot {
    pub fund_id: FundId,
    pub plan_type: String,
    /// Month key in `YYYY-MM` form; lexicographic order is chronological.
    pub as_of_month: String,
    pub ter: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
        }
    }

    /// Fund categories used when the user never named any explicitly.
    pub fn fallback_categories(&self) -> Vec<String> {
        let categories: &[&str] = match self {
            RiskLevel::Low => &["debt"],
            RiskLevel::Moderate => &["equity", "hybrid"],
            RiskLevel::High => &["equity"],
        };
        categories.iter().map(|c| c.to_string()).collect()
    }
}

impl Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "moderate" => Ok(RiskLevel::Moderate),
            "high" => Ok(RiskLevel::High),
            _ => Err(anyhow::anyhow!("Invalid risk level: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_categories_mapping() {
        assert_eq!(RiskLevel::Low.fallback_categories(), vec!["debt"]);
        assert_eq!(
            RiskLevel::Moderate.fallback_categories(),
            vec!["equity", "hybrid"]
        );
        assert_eq!(RiskLevel::High.fallback_categories(), vec!["equity"]);
    }

    #[test]
    fn test_risk_level_from_str() {
        assert_eq!("High".parse::<RiskLevel>().unwrap(), RiskLevel::High);
        assert!("extreme".parse::<RiskLevel>().is_err());
    }
}
