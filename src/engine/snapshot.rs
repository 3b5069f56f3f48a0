//! Per-session preference state and the clarification ladder.

use crate::core::fund::RiskLevel;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Preferences extracted from a single utterance. Every field is
/// optional; merging into the session snapshot happens separately.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialPreferences {
    pub risk_level: Option<RiskLevel>,
    pub horizon_years: Option<u32>,
    pub category: Option<String>,
}

impl PartialPreferences {
    pub fn is_empty(&self) -> bool {
        self.risk_level.is_none() && self.horizon_years.is_none() && self.category.is_none()
    }

    /// Fills this set's empty fields from `other`, leaving populated
    /// fields alone.
    pub fn fill_missing_from(&mut self, other: PartialPreferences) {
        if self.risk_level.is_none() {
            self.risk_level = other.risk_level;
        }
        if self.horizon_years.is_none() {
            self.horizon_years = other.horizon_years;
        }
        if self.category.is_none() {
            self.category = other.category;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotState {
    Empty,
    Partial,
    Complete,
}

/// Accumulated preferences for one session. `preferred_categories`
/// holds only what the user named explicitly; risk-derived categories
/// come out of [`UserSnapshot::effective_categories`] so a later
/// explicit choice is never shadowed by a derivation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub risk_level: Option<RiskLevel>,
    pub horizon_years: Option<u32>,
    pub preferred_categories: Vec<String>,
}

impl UserSnapshot {
    /// Merges one utterance's extraction. An extracted value overwrites
    /// the stored one; an absent value never erases anything.
    pub fn apply(&mut self, preferences: &PartialPreferences) {
        if let Some(risk) = preferences.risk_level {
            self.risk_level = Some(risk);
            debug!(risk = %risk, "Snapshot risk level updated");
        }
        if let Some(horizon) = preferences.horizon_years {
            self.horizon_years = Some(horizon);
            debug!(horizon, "Snapshot horizon updated");
        }
        if let Some(category) = &preferences.category {
            if !self.preferred_categories.contains(category) {
                self.preferred_categories.push(category.clone());
                debug!(%category, "Snapshot category added");
            }
        }
    }

    pub fn state(&self) -> SnapshotState {
        match (self.risk_level, self.horizon_years) {
            (Some(_), Some(_)) => SnapshotState::Complete,
            (None, None) if self.preferred_categories.is_empty() => SnapshotState::Empty,
            _ => SnapshotState::Partial,
        }
    }

    /// Categories to rank over: the explicit ones, else the risk level's
    /// fallback set, else none.
    pub fn effective_categories(&self) -> Vec<String> {
        if !self.preferred_categories.is_empty() {
            return self.preferred_categories.clone();
        }
        self.risk_level
            .map(|risk| risk.fallback_categories())
            .unwrap_or_default()
    }

    /// Next clarification to ask, in priority order: risk, then horizon,
    /// then category. Category is derivable from risk, so by the time
    /// the first two are answered it is effectively never asked.
    pub fn next_question(&self) -> Option<QuestionIntent> {
        if self.risk_level.is_none() {
            return Some(QuestionIntent::AskRiskPreference);
        }
        if self.horizon_years.is_none() {
            return Some(QuestionIntent::AskTimeHorizon);
        }
        if self.effective_categories().is_empty() {
            return Some(QuestionIntent::AskCategoryPreference);
        }
        None
    }
}

/// Stable identifiers for the clarification questions, with their fixed
/// prompt texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionIntent {
    AskRiskPreference,
    AskTimeHorizon,
    AskCategoryPreference,
}

impl QuestionIntent {
    pub fn id(&self) -> &'static str {
        match self {
            QuestionIntent::AskRiskPreference => "ASK_RISK_PREFERENCE",
            QuestionIntent::AskTimeHorizon => "ASK_TIME_HORIZON",
            QuestionIntent::AskCategoryPreference => "ASK_CATEGORY_PREFERENCE",
        }
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            QuestionIntent::AskRiskPreference => {
                "What level of risk are you comfortable with? (low / moderate / high)"
            }
            QuestionIntent::AskTimeHorizon => "How long do you plan to invest for? (in years)",
            QuestionIntent::AskCategoryPreference => {
                "Which category do you prefer Equity / Debt / Hybrid?"
            }
        }
    }
}
