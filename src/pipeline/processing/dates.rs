//! Free-text catalogue date parsing and register year windows.
//!
//! Catalogue date fields mix full dates with annotated years such as
//! `c1863`, `ca. 1863`, `1863?`, `186-?` or `[1862] 1863`. Parsing keeps
//! the earliest and latest plausible year mentioned; a field with no
//! plausible year is undated.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::config::RegisterSpec;

pub const MIN_PLAUSIBLE_YEAR: i32 = 1450;
pub const MAX_PLAUSIBLE_YEAR: i32 = 2099;

/// Whole-field formats tried before year scanning, in order.
pub const FULL_DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d %B %Y", "%B %d, %Y", "%d/%m/%Y"];

static YEAR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"c(?:a\.?|irca|) ?(?P<circa>\d{4})",
        r"|(?P<question>\d{4})\?",
        r"|\b(?P<decade>\d{3})-\??",
        r"|(?P<plain>\d{4})",
    ))
    .expect("year pattern regex")
});

/// How a year was written in the source field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateKind {
    FullDate,
    Circa,
    Questioned,
    Decade,
    Plain,
}

impl DateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateKind::FullDate => "full_date",
            DateKind::Circa => "circa",
            DateKind::Questioned => "questioned",
            DateKind::Decade => "decade",
            DateKind::Plain => "plain",
        }
    }
}

/// Earliest and latest year mentioned by a date field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearSpan {
    pub earliest: i32,
    pub latest: i32,
}

impl YearSpan {
    pub fn single(year: i32) -> Self {
        Self {
            earliest: year,
            latest: year,
        }
    }

    fn widen(self, other: YearSpan) -> Self {
        Self {
            earliest: self.earliest.min(other.earliest),
            latest: self.latest.max(other.latest),
        }
    }
}

/// Dated/undated classification of a date field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum DateClass {
    Dated(YearSpan),
    Undated,
}

impl DateClass {
    /// Reported year of a dated record (the earliest one mentioned).
    pub fn year(&self) -> Option<i32> {
        match self {
            DateClass::Dated(span) => Some(span.earliest),
            DateClass::Undated => None,
        }
    }

    pub fn span(&self) -> Option<YearSpan> {
        match self {
            DateClass::Dated(span) => Some(*span),
            DateClass::Undated => None,
        }
    }

    pub fn is_dated(&self) -> bool {
        matches!(self, DateClass::Dated(_))
    }
}

/// Result of parsing one date field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedDate {
    pub class: DateClass,
    pub kinds: Vec<DateKind>,
}

/// Closed interval of accepted years for a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearWindow {
    pub low: i32,
    pub high: i32,
}

impl YearWindow {
    pub fn around(year: i32, tolerance: i32) -> Self {
        Self {
            low: year.saturating_sub(tolerance),
            high: year.saturating_add(tolerance),
        }
    }

    /// A span is accepted when any of its years falls in the window.
    pub fn accepts(&self, span: YearSpan) -> bool {
        span.earliest <= self.high && span.latest >= self.low
    }
}

fn is_plausible(year: i32) -> bool {
    (MIN_PLAUSIBLE_YEAR..=MAX_PLAUSIBLE_YEAR).contains(&year)
}

fn parse_full_date(text: &str) -> Option<i32> {
    FULL_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .map(|date| date.year())
}

/// Parse a free-text date field. Never fails: anything without a plausible
/// year is [`DateClass::Undated`].
pub fn parse_date(raw: &str) -> ParsedDate {
    let text = raw.trim();

    if let Some(year) = parse_full_date(text).filter(|y| is_plausible(*y)) {
        return ParsedDate {
            class: DateClass::Dated(YearSpan::single(year)),
            kinds: vec![DateKind::FullDate],
        };
    }

    let mut span: Option<YearSpan> = None;
    let mut kinds = Vec::new();

    for caps in YEAR_PATTERN.captures_iter(text) {
        let found = if let Some(m) = caps.name("circa") {
            m.as_str().parse().ok().map(|y| (YearSpan::single(y), DateKind::Circa))
        } else if let Some(m) = caps.name("question") {
            m.as_str().parse().ok().map(|y| (YearSpan::single(y), DateKind::Questioned))
        } else if let Some(m) = caps.name("decade") {
            m.as_str().parse::<i32>().ok().map(|d| {
                (
                    YearSpan {
                        earliest: d * 10,
                        latest: d * 10 + 9,
                    },
                    DateKind::Decade,
                )
            })
        } else {
            caps.name("plain")
                .and_then(|m| m.as_str().parse().ok())
                .map(|y| (YearSpan::single(y), DateKind::Plain))
        };

        let Some((found, kind)) = found else { continue };
        if !is_plausible(found.earliest) || !is_plausible(found.latest) {
            continue;
        }
        span = Some(match span {
            Some(current) => current.widen(found),
            None => found,
        });
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }

    kinds.sort();
    ParsedDate {
        class: span.map_or(DateClass::Undated, DateClass::Dated),
        kinds,
    }
}

/// Classify a raw date field against one register. The classification does
/// not depend on the register; acceptance does (see [`register_accepts`]).
pub fn classify_date(raw: &str, register: &RegisterSpec) -> (DateClass, bool) {
    let class = parse_date(raw).class;
    let accepted = register_accepts(register, &class);
    (class, accepted)
}

/// The undated register takes only undated records; every other register
/// takes dated records whose span meets its year window.
pub fn register_accepts(register: &RegisterSpec, class: &DateClass) -> bool {
    match (register.window(), class) {
        (None, DateClass::Undated) => true,
        (Some(window), DateClass::Dated(span)) => window.accepts(*span),
        _ => false,
    }
}

/// Registers that accept a record, in the order given.
pub fn route<'a>(registers: &'a [RegisterSpec], class: &DateClass) -> Vec<&'a RegisterSpec> {
    registers
        .iter()
        .filter(|register| register_accepts(register, class))
        .collect()
}
