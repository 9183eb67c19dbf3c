//! Canonical title normalization.
//!
//! A canonical title is a comparison key, not a display string: ASCII-folded,
//! lowercase, `[a-z0-9]` words separated by single spaces, with volume,
//! edition and numbering metadata removed.

pub mod rules;

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use rules::{strip_metadata, MetadataRule, BRACKETED_DESCRIPTORS, METADATA_RULES};

static AMPERSAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&amp;|&").expect("ampersand regex"));

/// Maps raw titles to canonical titles using an ordered list of metadata rules.
#[derive(Debug, Clone, Copy)]
pub struct TitleNormalizer<'r> {
    rules: &'r [MetadataRule],
}

impl Default for TitleNormalizer<'static> {
    fn default() -> Self {
        Self {
            rules: METADATA_RULES.as_slice(),
        }
    }
}

impl<'r> TitleNormalizer<'r> {
    pub fn with_rules(rules: &'r [MetadataRule]) -> Self {
        Self { rules }
    }

    /// Normalize a raw title. Empty or whitespace-only input yields `""`.
    /// The result is a fixed point: normalizing it again changes nothing.
    pub fn normalize(&self, raw: &str) -> String {
        let folded = ascii_fold(raw).to_lowercase();
        let joined = AMPERSAND.replace_all(&folded, " and ");
        let described = BRACKETED_DESCRIPTORS.replace_all(&joined, " ");
        let alphanumeric: String = described
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
            .collect();
        let stripped = strip_metadata(&alphanumeric, self.rules);
        collapse_whitespace(&stripped)
    }
}

/// Normalize with the default metadata rules.
pub fn normalize_title(raw: &str) -> String {
    TitleNormalizer::default().normalize(raw)
}

/// Decompose and drop combining marks (`é` -> `e`). Characters with no ASCII
/// decomposition are kept and later become separators.
pub fn ascii_fold(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

fn collapse_whitespace(text: &str) -> String {
    let mut collapsed = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !collapsed.is_empty() {
            collapsed.push(' ');
        }
        collapsed.push_str(word);
    }
    collapsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pilgrims_progress() {
        assert_eq!(
            normalize_title("The Pilgrim's Progress, Vol. 2, 3rd ed."),
            "the pilgrim s progress"
        );
    }

    #[test]
    fn test_lower_cases() {
        assert_eq!(normalize_title("FRIENDS TO LOVERS"), "friends to lovers");
    }

    #[test]
    fn test_strips_outer_whitespace() {
        assert_eq!(
            normalize_title("\t\nkiller in shellview county \r"),
            "killer in shellview county"
        );
    }

    #[test]
    fn test_replaces_other_chars_with_single_space() {
        assert_eq!(
            normalize_title("aÆ[date]/with/''\"\"£$%^*()-+_={}@~#!<>,?.death"),
            "a date with death"
        );
    }

    #[test]
    fn test_ampersands() {
        assert_eq!(normalize_title("mills &amp; boon"), "mills and boon");
        assert_eq!(normalize_title("mills & boon"), "mills and boon");
        assert_eq!(normalize_title("mills&boon"), "mills and boon");
    }

    #[test]
    fn test_folds_diacritics() {
        assert_eq!(normalize_title("Les Misérables"), "les miserables");
        assert_eq!(normalize_title("Naïve Fables"), "naive fables");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize_title(""), "");
        assert_eq!(normalize_title(" \t \n"), "");
        assert_eq!(normalize_title("vol. 3"), "");
    }

    #[test]
    fn test_removes_volume_edition_metadata() {
        for input in [
            "just my luck n 23",
            "just my luck ed 34",
            "just my luck vol 93",
            "just my luck vols 190-321",
            "just my luck volume 38",
            "just my luck volumes 23 - 34",
            "just my luck, part III",
            "Just My Luck. 2nd edition",
            "just my luck [microform]",
        ] {
            assert_eq!(normalize_title(input), "just my luck", "input: {}", input);
        }
    }

    #[test]
    fn test_custom_rules() {
        let rules = vec![MetadataRule::new("series", r"\bseries\b").unwrap()];
        let normalizer = TitleNormalizer::with_rules(&rules);
        assert_eq!(normalizer.normalize("Gospel Herald, New Series 4"), "gospel herald new 4");
    }

    #[test]
    fn test_idempotent() {
        for input in [
            "The Pilgrim's Progress, Vol. 2, 3rd ed.",
            "Essays, part 2nd ed. II",
            "The Gospel Herald; New Series",
            "A Tale of Two Cities [illustrated] & other stories",
            "No. 4 of the Tracts",
        ] {
            let once = normalize_title(input);
            assert_eq!(normalize_title(&once), once, "input: {}", input);
        }
    }
}
