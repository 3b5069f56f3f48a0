//! Rule-based preference extraction from raw user text.
//!
//! Keyword maps and a digit scan, no language model involved. Maps are
//! checked in declaration order and the first matching entry wins, so
//! ambiguous words resolve the same way every time ("balanced" is
//! moderate risk and a hybrid category).

use crate::core::fund::RiskLevel;
use crate::engine::snapshot::PartialPreferences;
use tracing::debug;

const RISK_MAP: &[(RiskLevel, &[&str])] = &[
    (
        RiskLevel::Low,
        &["low", "conservative", "safe", "stable", "minimum risk"],
    ),
    (
        RiskLevel::Moderate,
        &["moderate", "medium", "balanced", "stable growth"],
    ),
    (
        RiskLevel::High,
        &["high", "aggressive", "risky", "maximum returns"],
    ),
];

const CATEGORY_MAP: &[(&str, &[&str])] = &[
    ("equity", &["equity", "stock", "shares", "growth"]),
    ("debt", &["debt", "bond", "fixed income", "safe"]),
    ("hybrid", &["hybrid", "balanced", "mixed"]),
];

pub fn extract_preferences(text: &str) -> PartialPreferences {
    let clean = text.to_lowercase();
    let clean = clean.trim();
    if clean.is_empty() {
        return PartialPreferences::default();
    }

    let preferences = PartialPreferences {
        risk_level: extract_risk(clean),
        horizon_years: extract_horizon(clean),
        category: extract_category(clean),
    };
    debug!(?preferences, "Extracted preferences");
    preferences
}

fn extract_risk(text: &str) -> Option<RiskLevel> {
    RISK_MAP
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| text.contains(kw)))
        .map(|(level, _)| *level)
}

fn extract_category(text: &str) -> Option<String> {
    CATEGORY_MAP
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| text.contains(kw)))
        .map(|(category, _)| category.to_string())
}

/// Duration in years: "5 years", "3 yr", "10yr", "for 5", "horizon of 3".
fn extract_horizon(text: &str) -> Option<u32> {
    number_before_unit(text)
        .or_else(|| number_after_keyword(text, "for"))
        .or_else(|| horizon_number(text))
}

/// First digit run followed (after optional whitespace) by a year unit.
fn number_before_unit(text: &str) -> Option<u32> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            let rest = text[i..].trim_start();
            if rest.starts_with("year") || rest.starts_with("yr") {
                if let Ok(n) = text[start..i].parse() {
                    return Some(n);
                }
            }
        } else {
            i += 1;
        }
    }
    None
}

/// First digit run following `keyword` (after optional whitespace).
fn number_after_keyword(text: &str, keyword: &str) -> Option<u32> {
    let mut search = text;
    let mut offset = 0;
    while let Some(pos) = search.find(keyword) {
        let after = text[offset + pos + keyword.len()..].trim_start();
        let digits: String = after.chars().take_while(|c| c.is_ascii_digit()).collect();
        if let Ok(n) = digits.parse() {
            return Some(n);
        }
        offset += pos + keyword.len();
        search = &text[offset..];
    }
    None
}

/// "horizon [of] N".
fn horizon_number(text: &str) -> Option<u32> {
    let pos = text.find("horizon")?;
    let mut after = text[pos + "horizon".len()..].trim_start();
    if let Some(stripped) = after.strip_prefix("of") {
        after = stripped.trim_start();
    }
    let digits: String = after.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}
