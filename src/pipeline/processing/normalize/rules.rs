//! Ordered metadata removal rules for canonical titles.
//!
//! Rules run against text that has already been lowercased and reduced to
//! `[a-z0-9 ]`. Each rule removes its whole match; the match is replaced by a
//! single space so neighbouring tokens never fuse.

use once_cell::sync::Lazy;
use regex::Regex;

/// A named pattern whose matches are dropped from a title.
#[derive(Debug)]
pub struct MetadataRule {
    pub name: &'static str,
    pattern: Regex,
}

impl MetadataRule {
    pub fn new(name: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    pub fn apply(&self, text: &str) -> String {
        self.pattern.replace_all(text, " ").into_owned()
    }
}

/// Bracketed catalogue descriptors. These need their brackets to be
/// recognised, so they run before punctuation is stripped.
pub static BRACKETED_DESCRIPTORS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(?:microform|illustrated|a novel|plates)\]")
        .expect("bracketed descriptor regex")
});

/// Non-empty roman numeral from `i` to `xcix`; `{roman}` in [`RULE_TABLE`]
/// expands to this.
const ROMAN_NUMERAL: &str = r"(?:(?:xc|xl|l?x{1,3}|l)(?:ix|iv|v?i{0,3})|ix|iv|v?i{1,3}|v)";

// (pattern name, regex) in application order
static RULE_TABLE: [(&str, &str); 5] = [
    ("volume", r"\b(?:vols?|volumes?)\b(?:\s+(?:\d+|{roman})\b)*"),
    ("part", r"\b(?:pts?|parts?)(?:\s+(?:\d+|{roman})\b)+"),
    ("edition", r"\b(?:\d+(?:st|nd|rd|th)\s+)?(?:ed|edn|edition)\b"),
    ("number", r"\bn\b|\bnos?\s+\d+\b"),
    ("numeral", r"\b\d+(?:st|nd|rd|th)?\b"),
];

/// Default metadata rules.
pub static METADATA_RULES: Lazy<Vec<MetadataRule>> = Lazy::new(|| {
    RULE_TABLE
        .iter()
        .map(|&(name, pattern)| {
            MetadataRule::new(name, &pattern.replace("{roman}", ROMAN_NUMERAL))
                .expect("metadata rule regex")
        })
        .collect()
});

/// Apply `rules` in order, repeating until the text stops changing.
///
/// Every rule removes at least one non-space character per match, so this
/// terminates.
pub fn strip_metadata(text: &str, rules: &[MetadataRule]) -> String {
    let mut current = text.to_string();
    loop {
        let mut next = current.clone();
        for rule in rules {
            if rule.is_match(&next) {
                next = rule.apply(&next);
            }
        }
        if next == current {
            return current;
        }
        current = next;
    }
}
