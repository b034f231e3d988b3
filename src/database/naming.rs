//! Header to identifier normalization.
//!
//! Spreadsheet headers are arbitrary text; destination identifiers are bounded, restricted to
//! `[A-Za-z0-9_]`, and unique per table. [`NameSanitizer`] bridges the two without ever touching
//! the caller's [`UsedNames`]; the caller records each accepted name itself.
use crate::spreadsheet::cell::column_letters;
use regex::Regex;
use std::collections::BTreeSet;
use std::str::FromStr;
use thiserror::Error;

/// Placeholder for headers with no usable character.
const PLACEHOLDER: &str = "col";

#[derive(Error, Debug)]
pub enum NamingError {
    #[error("Invalid naming mode '{0}', expected 'short' or 'letters'")]
    ModeError(String),
}

/// How identifiers are derived from headers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NamingMode {
    /// Cleaned, truncated header text with `_N` suffixes on collision
    Short,
    /// Spreadsheet column codes `A`, `B`, …, `AA`, regardless of header text
    Letters,
}

impl FromStr for NamingMode {
    type Err = NamingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "short" => Ok(NamingMode::Short),
            "letters" => Ok(NamingMode::Letters),
            _ => Err(NamingError::ModeError(s.to_owned())),
        }
    }
}

/// How the destination compares identifiers for equality.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NameComparison {
    CaseSensitive,
    CaseInsensitive,
}

impl NameComparison {
    /// Canonical key under this comparison.
    pub fn fold(&self, name: &str) -> String {
        match self {
            NameComparison::CaseSensitive => name.to_owned(),
            NameComparison::CaseInsensitive => name.to_ascii_lowercase(),
        }
    }
}

/// Identifiers already taken within one scope (a table's columns, or the workbook's tables).
#[derive(Clone, Debug)]
pub struct UsedNames {
    comparison: NameComparison,
    keys: BTreeSet<String>,
}

impl UsedNames {
    pub fn new(comparison: NameComparison) -> Self {
        Self {
            comparison,
            keys: BTreeSet::new(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.keys.contains(&self.comparison.fold(name))
    }

    /// Records a name; returns false if it was already taken.
    pub fn insert(&mut self, name: &str) -> bool {
        self.keys.insert(self.comparison.fold(name))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Maps raw headers to legal, unique identifiers.
#[derive(Clone, Debug)]
pub struct NameSanitizer {
    max_len: usize,
    mode: NamingMode,
    invalid: Regex,
}

impl NameSanitizer {
    pub fn new(max_len: usize, mode: NamingMode) -> Self {
        Self {
            max_len,
            mode,
            // Underscores are folded in so mixed runs like " _!" become a single `_`.
            invalid: Regex::new(r"[^A-Za-z0-9]+").expect("Hardcode regex pattern"),
        }
    }

    /// Returns an identifier for `raw` that is legal, at most `max_len` long and not in `used`.
    pub fn sanitize(&self, raw: &str, used: &UsedNames) -> String {
        match self.mode {
            NamingMode::Short => self.disambiguate(&self.shorten(raw), used),
            NamingMode::Letters => Self::next_letters(used),
        }
    }

    /// Cleans and truncates a header, without looking at other names.
    ///
    /// Non-ASCII characters are replaced like any other illegal character.
    pub fn shorten(&self, raw: &str) -> String {
        let cleaned = self.invalid.replace_all(raw.trim(), "_");
        let cleaned = cleaned.trim_matches('_');
        let mut name = match cleaned.chars().next() {
            None => PLACEHOLDER.to_owned(),
            Some(first) if first.is_ascii_digit() => format!("_{cleaned}"),
            Some(_) => cleaned.to_owned(),
        };
        // Only ASCII remains, so byte and char lengths agree.
        name.truncate(self.max_len);
        name
    }

    /// Appends `_2`, `_3`, … until the name is free, shortening the base to stay within the ceiling.
    ///
    /// Once the suffix alone no longer fits, falls back to the first free column code.
    fn disambiguate(&self, base: &str, used: &UsedNames) -> String {
        if !used.contains(base) {
            return base.to_owned();
        }
        let mut counter = 2usize;
        loop {
            let suffix = format!("_{counter}");
            if suffix.len() > self.max_len {
                return Self::next_letters(used);
            }
            let keep = (self.max_len - suffix.len()).min(base.len());
            let candidate = format!("{}{suffix}", &base[..keep]);
            if !used.contains(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }

    /// First spreadsheet column code not yet taken.
    fn next_letters(used: &UsedNames) -> String {
        let mut index = 0usize;
        loop {
            let candidate = column_letters(index);
            if !used.contains(&candidate) {
                return candidate;
            }
            index += 1;
        }
    }
}

/// Legality predicate for destination identifiers.
pub fn is_legal_identifier(name: &str, max_len: usize) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            name.len() <= max_len && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitize_all(sanitizer: &NameSanitizer, headers: &[&str], comparison: NameComparison) -> Vec<String> {
        let mut used = UsedNames::new(comparison);
        headers
            .iter()
            .map(|header| {
                let name = sanitizer.sanitize(header, &used);
                used.insert(&name);
                name
            })
            .collect()
    }

    #[test]
    fn short_names() {
        let sanitizer = NameSanitizer::new(30, NamingMode::Short);
        assert_eq!(sanitizer.shorten("Q1 Score"), "Q1_Score");
        assert_eq!(sanitizer.shorten("Full Name!!"), "Full_Name");
        assert_eq!(sanitizer.shorten("  a -- b__c  "), "a_b_c");
        assert_eq!(sanitizer.shorten("2024 total"), "_2024_total");
        assert_eq!(sanitizer.shorten("!!!"), "col");
        assert_eq!(sanitizer.shorten(""), "col");
        assert_eq!(sanitizer.shorten("Café crème"), "Caf_cr_me");
        assert_eq!(sanitizer.shorten(&"x".repeat(50)).len(), 30);
    }

    #[test]
    fn duplicates_are_disambiguated() {
        let sanitizer = NameSanitizer::new(30, NamingMode::Short);
        let names = sanitize_all(
            &sanitizer,
            &["Q1 Score", "Q1 Score", "Q1_Score"],
            NameComparison::CaseSensitive,
        );
        assert_eq!(names, vec!["Q1_Score", "Q1_Score_2", "Q1_Score_3"]);
    }

    #[test]
    fn suffix_respects_ceiling() {
        let sanitizer = NameSanitizer::new(10, NamingMode::Short);
        let names = sanitize_all(
            &sanitizer,
            &["abcdefghijKLM", "abcdefghijXYZ"],
            NameComparison::CaseSensitive,
        );
        assert_eq!(names, vec!["abcdefghij", "abcdefgh_2"]);
    }

    #[test]
    fn case_policy_is_configurable() {
        let sanitizer = NameSanitizer::new(30, NamingMode::Short);
        let insensitive = sanitize_all(&sanitizer, &["Name", "NAME"], NameComparison::CaseInsensitive);
        assert_eq!(insensitive, vec!["Name", "NAME_2"]);
        let sensitive = sanitize_all(&sanitizer, &["Name", "NAME"], NameComparison::CaseSensitive);
        assert_eq!(sensitive, vec!["Name", "NAME"]);
    }

    #[test]
    fn letters_ignore_headers() {
        let sanitizer = NameSanitizer::new(30, NamingMode::Letters);
        let headers: Vec<String> = (0..28).map(|i| format!("same header {}", i % 2)).collect();
        let headers: Vec<&str> = headers.iter().map(String::as_str).collect();
        let names = sanitize_all(&sanitizer, &headers, NameComparison::CaseInsensitive);
        assert_eq!(names[0], "A");
        assert_eq!(names[25], "Z");
        assert_eq!(names[26], "AA");
        assert_eq!(names[27], "AB");
    }

    #[test]
    fn sanitize_never_mutates_used() {
        let sanitizer = NameSanitizer::new(30, NamingMode::Short);
        let mut used = UsedNames::new(NameComparison::CaseInsensitive);
        used.insert("id");
        let first = sanitizer.sanitize("ID", &used);
        let second = sanitizer.sanitize("ID", &used);
        assert_eq!(first, "ID_2");
        assert_eq!(first, second);
        assert_eq!(used.len(), 1);
        assert!(!used.is_empty());
    }

    #[test]
    fn outputs_are_legal_unique_and_bounded() {
        let headers = [
            "", " ", "1", "_", "__x__", "名前", "a b c d e f g h i j k l m n o p", "Q1 Score", "Q1 Score",
            "Q1_Score", "col", "col", "col_2", "9lives", "über", "x", "X", "a!b", "a_b", "a-b",
        ];
        for max_len in [4, 8, 30, 64] {
            let sanitizer = NameSanitizer::new(max_len, NamingMode::Short);
            let mut used = UsedNames::new(NameComparison::CaseInsensitive);
            for header in headers {
                let name = sanitizer.sanitize(header, &used);
                assert!(!used.contains(&name), "{name} reused");
                assert!(is_legal_identifier(&name, max_len), "{name} illegal for {max_len}");
                used.insert(&name);
            }
        }
    }

    #[test]
    fn crowded_scope_stays_within_ceiling() {
        let sanitizer = NameSanitizer::new(4, NamingMode::Short);
        let mut used = UsedNames::new(NameComparison::CaseSensitive);
        let mut names = Vec::new();
        for _ in 0..1001 {
            let name = sanitizer.sanitize("abcd", &used);
            assert!(!used.contains(&name), "{name} reused");
            assert!(is_legal_identifier(&name, 4), "{name} illegal for 4");
            used.insert(&name);
            names.push(name);
        }
        assert_eq!(names[1], "ab_2");
        assert_eq!(names[8], "ab_9");
        assert_eq!(names[9], "a_10");
        assert_eq!(names[998], "_999");
        assert_eq!(names[999], "A");
        assert_eq!(names[1000], "B");
    }

    #[test]
    fn legality_predicate() {
        assert!(is_legal_identifier("_a1", 30));
        assert!(is_legal_identifier("A", 1));
        assert!(!is_legal_identifier("", 30));
        assert!(!is_legal_identifier("1a", 30));
        assert!(!is_legal_identifier("a-b", 30));
        assert!(!is_legal_identifier("abcdef", 5));
    }

    #[test]
    fn parse_mode() {
        assert_eq!("Letters".parse::<NamingMode>().unwrap(), NamingMode::Letters);
        assert!("long".parse::<NamingMode>().is_err());
    }
}
