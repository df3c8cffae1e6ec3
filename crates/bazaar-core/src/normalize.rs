//! Field normalizers shared by every entity scraper.
//!
//! Three kinds of field come off a reference page:
//! - category labels, mapped onto a closed enum with a documented default
//! - numbers embedded in free text (cooldowns, days)
//! - free text, which is only trimmed
//!
//! Category misses never fail a record. Each one is tallied in a
//! [`FallbackCounter`] so the run report can show how much data was defaulted.

use crate::types::Category;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::debug;

/// Glyphs used upstream to mean "no value" in a numeric column.
const PLACEHOLDERS: [&str; 3] = ["-", "\u{2013}", "\u{2014}"];

fn number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("number regex is valid"))
}

/// Extract the first decimal number from free text.
///
/// An empty cell or a lone dash is "absent", never zero.
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() || PLACEHOLDERS.contains(&text) {
        return None;
    }
    number_regex()
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Parse a day number ("Day 3", "3") from free text.
pub fn parse_day(text: &str) -> Option<u32> {
    parse_number(text)
        .filter(|n| n.is_finite() && *n >= 0.0 && *n <= u32::MAX as f64)
        .map(|n| n as u32)
}

/// Free text passes through with surrounding whitespace removed.
pub fn clean_text(text: &str) -> String {
    text.trim().to_string()
}

/// Like [`clean_text`], but an empty result is `None`.
pub fn optional_text(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Map a raw label onto `T`, falling back to `T::default()` and counting the miss.
pub fn category<T: Category>(raw: &str, fallbacks: &mut FallbackCounter) -> T {
    match T::from_label(raw) {
        Some(value) => value,
        None => {
            let fallback = T::default();
            debug!(
                field = T::FIELD,
                raw,
                default = fallback.as_str(),
                "unrecognized category label"
            );
            fallbacks.record(T::FIELD);
            fallback
        }
    }
}

/// Tally of category values that fell back to their default, keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FallbackCounter {
    counts: BTreeMap<String, u64>,
}

impl FallbackCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one fallback for `field`.
    pub fn record(&mut self, field: &str) {
        *self.counts.entry(field.to_string()).or_insert(0) += 1;
    }

    /// Fallbacks counted for `field`.
    pub fn get(&self, field: &str) -> u64 {
        self.counts.get(field).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Fold another counter into this one.
    pub fn merge(&mut self, other: &FallbackCounter) {
        for (field, n) in &other.counts {
            *self.counts.entry(field.clone()).or_insert(0) += n;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
