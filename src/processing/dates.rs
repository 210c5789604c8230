// Role assignment for unlabeled dates found on the card
use crate::models::FieldName;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

lazy_static! {
    /// Day and month order is left unresolved here; parsing decides later.
    pub(crate) static ref DATE_PATTERN: Regex = Regex::new(r"\d{1,2}[/-]\d{1,2}[/-]\d{4}").unwrap();
}

/// Characters inspected on each side of a date.
const CONTEXT_RADIUS: usize = 20;

const BIRTH_KEYWORDS: [&str; 3] = ["birth", "dob", "born"];
const EXPIRY_KEYWORDS: [&str; 3] = ["expiry", "exp", "valid"];
const ISSUE_KEYWORDS: [&str; 2] = ["issue", "issued"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DateRole {
    DateOfBirth,
    ExpiryDate,
    IssueDate,
}

impl DateRole {
    pub fn field(&self) -> FieldName {
        match self {
            DateRole::DateOfBirth => FieldName::DateOfBirth,
            DateRole::ExpiryDate => FieldName::ExpiryDate,
            DateRole::IssueDate => FieldName::IssueDate,
        }
    }
}

pub struct DateDisambiguator;

impl DateDisambiguator {
    /// All date-shaped substrings, in order of appearance.
    pub fn find_dates(text: &str) -> Vec<&str> {
        DATE_PATTERN.find_iter(text).map(|m| m.as_str()).collect()
    }

    /// Lower-cased text from 20 characters before the first occurrence of
    /// `candidate` up to 20 characters after its start.
    pub fn context_window(text: &str, candidate: &str) -> Option<String> {
        let byte_pos = text.find(candidate)?;
        let char_pos = text[..byte_pos].chars().count();
        let start = char_pos.saturating_sub(CONTEXT_RADIUS);
        let window: String = text
            .chars()
            .skip(start)
            .take(char_pos + CONTEXT_RADIUS - start)
            .collect();
        Some(window.to_lowercase())
    }

    /// Keyword groups are checked birth, then expiry, then issue.
    pub fn classify(text: &str, candidate: &str) -> Option<DateRole> {
        let context = Self::context_window(text, candidate)?;
        let mentions = |keywords: &[&str]| keywords.iter().any(|k| context.contains(k));

        if mentions(&BIRTH_KEYWORDS[..]) {
            Some(DateRole::DateOfBirth)
        } else if mentions(&EXPIRY_KEYWORDS[..]) {
            Some(DateRole::ExpiryDate)
        } else if mentions(&ISSUE_KEYWORDS[..]) {
            Some(DateRole::IssueDate)
        } else {
            None
        }
    }

    /// True when an expiry keyword appears in the window around `candidate`,
    /// whatever other keywords are there too.
    pub fn mentions_expiry(text: &str, candidate: &str) -> bool {
        Self::context_window(text, candidate)
            .map_or(false, |context| EXPIRY_KEYWORDS.iter().any(|k| context.contains(k)))
    }

    /// Classifies every candidate by its context. The first candidate given a
    /// role keeps it; candidates without a keyword are left out.
    pub fn disambiguate(text: &str, dates: &[&str]) -> BTreeMap<DateRole, String> {
        let mut roles = BTreeMap::new();
        for date in dates {
            if let Some(role) = Self::classify(text, date) {
                roles.entry(role).or_insert_with(|| date.to_string());
            }
        }
        roles
    }

    /// First candidate is the birth date, second the expiry date. Anything
    /// after the second candidate is dropped.
    pub fn assign_positional(dates: &[&str]) -> BTreeMap<DateRole, String> {
        let mut roles = BTreeMap::new();
        if let Some(first) = dates.first() {
            roles.insert(DateRole::DateOfBirth, first.to_string());
        }
        if let Some(second) = dates.get(1) {
            roles.insert(DateRole::ExpiryDate, second.to_string());
        }
        roles
    }
}
