//! Keyword-based intent detection.
//!
//! Rules run in a fixed priority order so multi-keyword phrases resolve
//! deterministically: "compare low risk funds" is a comparison, not a
//! preference.

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    CompareFunds,
    AskExplanation,
    StartRecommendation,
    ProvidePreference,
    Unknown,
}

const COMPARISON_KEYWORDS: &[&str] = &[
    "compare",
    "vs",
    "versus",
    "difference between",
    "better than",
    "which one is better",
    "contrast",
    "alternatives",
];

const EXPLANATION_KEYWORDS: &[&str] = &[
    "why",
    "reason",
    "explain",
    "basis",
    "justify",
    "details",
    "elaborate",
    "tell me more",
    "how did you",
];

const START_KEYWORDS: &[&str] = &[
    "start",
    "invest",
    "recommend",
    "suggest",
    "find",
    "get advice",
    "begin",
    "setup",
    "new portfolio",
    "advice",
];

const PREFERENCE_KEYWORDS: &[&str] = &[
    "risk",
    "return",
    "equity",
    "debt",
    "conservative",
    "aggressive",
    "moderate",
    "horizon",
    "duration",
    "years",
    "months",
    "timeframe",
    "volatility",
    "growth",
    "low",
    "medium",
    "high",
    "tax saving",
];

/// Priority order: comparison > explanation > start > preference.
pub fn detect_intent(text: &str) -> Intent {
    let clean = text.to_lowercase();
    let clean = clean.trim();
    if clean.is_empty() {
        return Intent::Unknown;
    }
    debug!("Processing text for intent detection: '{clean}'");

    let matches = |keywords: &[&str]| keywords.iter().any(|kw| clean.contains(kw));
    if matches(COMPARISON_KEYWORDS) {
        Intent::CompareFunds
    } else if matches(EXPLANATION_KEYWORDS) {
        Intent::AskExplanation
    } else if matches(START_KEYWORDS) {
        Intent::StartRecommendation
    } else if matches(PREFERENCE_KEYWORDS) {
        Intent::ProvidePreference
    } else {
        Intent::Unknown
    }
}
