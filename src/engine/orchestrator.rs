//! Per-turn coordinator: intent -> extraction -> session state -> either
//! a clarification question or recommendations, with compare/explain
//! follow-ups served from the last ranked list.

use crate::engine::PreferenceEnricher;
use crate::engine::extract::extract_preferences;
use crate::engine::intent::{Intent, detect_intent};
use crate::engine::recommender::{
    Recommender, ScoredFund, WEIGHT_CAGR_5Y, WEIGHT_CONSISTENCY, WEIGHT_EXPENSE_RATIO,
    WEIGHT_MAX_DRAWDOWN,
};
use crate::engine::session::{Session, SessionStore};
use crate::engine::snapshot::{QuestionIntent, SnapshotState};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

const FALLBACK_PROMPT: &str = "Could you please provide more details about your investment goals?";
const COMPARE_NEEDS_LIST: &str =
    "Ask for recommendations first, then pick two funds from the list to compare.";
const EXPLAIN_NEEDS_LIST: &str = "There is nothing to explain yet. Ask for a recommendation first.";

#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// A clarification question; the prompt text is fixed per intent id.
    Question(QuestionIntent),
    Recommendations(Vec<ScoredFund>),
    Comparison {
        left: Box<ScoredFund>,
        right: Box<ScoredFund>,
    },
    Explanation(String),
    /// A plain conversational message (fallbacks and redirects).
    Message(String),
}

pub struct Orchestrator {
    recommender: Recommender,
    sessions: Arc<dyn SessionStore>,
    enricher: Option<Arc<dyn PreferenceEnricher>>,
}

impl Orchestrator {
    pub fn new(recommender: Recommender, sessions: Arc<dyn SessionStore>) -> Self {
        Orchestrator {
            recommender,
            sessions,
            enricher: None,
        }
    }

    pub fn with_enricher(mut self, enricher: Arc<dyn PreferenceEnricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    /// Processes one utterance for the session. Malformed input never
    /// errors: it leaves the snapshot unchanged and re-asks.
    pub async fn handle_turn(&self, session_id: &str, text: &str) -> Result<TurnOutcome> {
        let mut session = self.sessions.load(session_id).await?;
        let intent = detect_intent(text);
        info!(session_id, ?intent, "Handling turn");

        let outcome = match intent {
            Intent::CompareFunds => compare(&session, text),
            Intent::AskExplanation => explain(&session, text),
            Intent::StartRecommendation | Intent::ProvidePreference => {
                self.advance(&mut session, text, intent).await?
            }
            Intent::Unknown => match session.snapshot.next_question() {
                Some(question) => TurnOutcome::Question(question),
                None => TurnOutcome::Message(FALLBACK_PROMPT.to_string()),
            },
        };

        self.sessions.save(session_id, &session).await?;
        Ok(outcome)
    }

    pub async fn end_session(&self, session_id: &str) -> Result<()> {
        self.sessions.end(session_id).await
    }

    async fn advance(
        &self,
        session: &mut Session,
        text: &str,
        intent: Intent,
    ) -> Result<TurnOutcome> {
        let mut preferences = extract_preferences(text);
        if let Some(enricher) = &self.enricher {
            if preferences.risk_level.is_none()
                || preferences.horizon_years.is_none()
                || preferences.category.is_none()
            {
                match enricher.enrich(text, &preferences).await {
                    Ok(extra) => preferences.fill_missing_from(extra),
                    Err(e) => {
                        debug!(error = %e, "Preference enrichment failed, rules stand alone")
                    }
                }
            }
        }
        let had_new_input = !preferences.is_empty();
        session.snapshot.apply(&preferences);

        if session.snapshot.state() != SnapshotState::Complete {
            if let Some(question) = session.snapshot.next_question() {
                return Ok(TurnOutcome::Question(question));
            }
        }

        // Re-rank on any fresh preference value or an explicit restart;
        // otherwise serve the stored list.
        if had_new_input
            || session.last_recommendations.is_empty()
            || intent == Intent::StartRecommendation
        {
            let categories = session.snapshot.effective_categories();
            session.last_recommendations = self.recommender.rank(&categories).await?;
        }
        Ok(TurnOutcome::Recommendations(
            session.last_recommendations.clone(),
        ))
    }
}

fn compare(session: &Session, text: &str) -> TurnOutcome {
    if session.last_recommendations.len() < 2 {
        return TurnOutcome::Message(COMPARE_NEEDS_LIST.to_string());
    }
    let (left, right) = pick_pair(text, session.last_recommendations.len());
    TurnOutcome::Comparison {
        left: Box::new(session.last_recommendations[left - 1].clone()),
        right: Box::new(session.last_recommendations[right - 1].clone()),
    }
}

fn explain(session: &Session, text: &str) -> TurnOutcome {
    if session.last_recommendations.is_empty() {
        return TurnOutcome::Message(EXPLAIN_NEEDS_LIST.to_string());
    }
    let index = numbers_in(text, session.last_recommendations.len())
        .into_iter()
        .next()
        .unwrap_or(1);
    let fund = &session.last_recommendations[index - 1];
    TurnOutcome::Explanation(render_explanation(index, fund))
}

/// Score breakdown assembled from the stored metrics; fixed wording, no
/// generation involved.
fn render_explanation(position: usize, fund: &ScoredFund) -> String {
    let m = &fund.metrics;
    format!(
        "#{position} {} scores {:.3} against its {} peers: \
         5y growth z {:+.2} (weight {WEIGHT_CAGR_5Y}), \
         consistency z {:+.2} (weight {WEIGHT_CONSISTENCY}), \
         drawdown z {:+.2} (weight {WEIGHT_MAX_DRAWDOWN}), \
         expense z {:+.2} (weight {WEIGHT_EXPENSE_RATIO}).",
        fund.display_name,
        fund.score,
        fund.category,
        m.norm_cagr_5y,
        m.norm_consistency,
        m.norm_max_drawdown,
        m.norm_expense_ratio,
    )
}

/// Two distinct 1-based positions mentioned in the text, defaulting to
/// the top two.
fn pick_pair(text: &str, len: usize) -> (usize, usize) {
    let numbers = numbers_in(text, len);
    match (numbers.first(), numbers.get(1)) {
        (Some(&a), Some(&b)) => (a, b),
        _ => (1, 2),
    }
}

/// Distinct digit runs in the text that parse to a valid 1-based index.
fn numbers_in(text: &str, len: usize) -> Vec<usize> {
    let mut numbers = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if let Ok(n) = text[start..i].parse::<usize>() {
                if (1..=len).contains(&n) && !numbers.contains(&n) {
                    numbers.push(n);
                }
            }
        } else {
            i += 1;
        }
    }
    numbers
}
