// Field extraction from recognized Emirates ID text
use crate::models::{DateStrategy, ExtractionRules, FieldMap, FieldName, RecognizedText, Side};
use crate::processing::dates::{DateDisambiguator, DateRole};
use crate::validation::format::normalize_id_number;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::collections::BTreeMap;

lazy_static! {
    // 784 country prefix, then 4, 7 and 1 digits
    static ref ID_NUMBER_PATTERN: Regex = Regex::new(r"784[-\s]?\d{4}[-\s]?\d{7}[-\s]?\d").unwrap();

    // Tried in order, first match wins: labeled name, then the first run of
    // two or more capitalized words.
    static ref NAME_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i:name|اسم)[:\s]+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)+)").unwrap(),
        Regex::new(r"\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+)+)").unwrap(),
    ];

    // Maximal run of Arabic script and whitespace holding at least one Arabic character
    static ref ARABIC_RUN_PATTERN: Regex =
        Regex::new(r"[\s\x{0600}-\x{06FF}]*[\x{0600}-\x{06FF}][\s\x{0600}-\x{06FF}]*").unwrap();

    // Male is checked first
    static ref MALE_PATTERN: Regex = Regex::new(r"(?i)\b(?:male|m|ذكر)\b").unwrap();
    static ref FEMALE_PATTERN: Regex = Regex::new(r"(?i)\b(?:female|f|أنثى)\b").unwrap();

    static ref ISSUE_DATE_PATTERN: Regex =
        Regex::new(r"(?i)(?:issue|issued|تاريخ\s*الإصدار)[:\s]+(\d{1,2}[/-]\d{1,2}[/-]\d{4})").unwrap();

    static ref CARD_NUMBER_PATTERN: Regex = Regex::new(r"\d{9,}").unwrap();
}

/// Minimum trimmed length, in characters, for an Arabic run to count as a name.
const MIN_ARABIC_NAME_CHARS: usize = 3;

/// Turns recognized card text into a [`FieldMap`].
///
/// Front-side rules run in a fixed order and each one runs regardless of
/// whether the others matched:
///
/// 1. ID number
/// 2. unlabeled dates (birth / expiry)
/// 3. English name
/// 4. Arabic name
/// 5. nationality
/// 6. gender
/// 7. labeled issue date
///
/// A field set by an earlier rule is never overwritten by a later one. The
/// back side only looks for the card number and the ID number. Extraction
/// never fails: a rule that does not match leaves its field out.
#[derive(Debug, Clone, Default)]
pub struct FieldExtractor {
    rules: ExtractionRules,
}

impl FieldExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: ExtractionRules) -> Self {
        FieldExtractor { rules }
    }

    pub fn rules(&self) -> &ExtractionRules {
        &self.rules
    }

    pub fn extract(&self, raw_text: &str, side: Side) -> FieldMap {
        let fields = match side {
            Side::Front => self.extract_front(raw_text),
            Side::Back => Self::extract_back(raw_text),
        };
        debug!("Extracted {} field(s) from {} side", fields.len(), side);
        fields
    }

    /// Token scores are carried along but the rules only read the joined text.
    pub fn extract_recognized(&self, text: &RecognizedText, side: Side) -> FieldMap {
        self.extract(&text.raw_text(), side)
    }

    fn extract_front(&self, text: &str) -> FieldMap {
        let mut fields = FieldMap::new();

        if let Some(id_number) = Self::extract_id_number_from_text(text) {
            fields.insert_if_absent(FieldName::IdNumber, id_number);
        }

        for (role, date) in Self::assign_dates(text, self.rules.date_strategy) {
            fields.insert_if_absent(role.field(), date);
        }

        if let Some(name) = Self::extract_name_from_text(text) {
            fields.insert_if_absent(FieldName::Name, name);
        }

        if let Some(name_arabic) = Self::extract_arabic_name_from_text(text) {
            fields.insert_if_absent(FieldName::NameArabic, name_arabic);
        }

        if let Some(nationality) = Self::extract_nationality_from_text(text, &self.rules.nationalities) {
            fields.insert_if_absent(FieldName::Nationality, nationality);
        }

        if let Some(gender) = Self::extract_gender_from_text(text) {
            fields.insert_if_absent(FieldName::Gender, gender);
        }

        if let Some(issue_date) = Self::extract_issue_date_from_text(text) {
            fields.insert_if_absent(FieldName::IssueDate, issue_date);
        }

        fields
    }

    fn extract_back(text: &str) -> FieldMap {
        let mut fields = FieldMap::new();

        if let Some(card_number) = Self::extract_card_number_from_text(text) {
            fields.insert_if_absent(FieldName::CardNumber, card_number);
        }

        if let Some(id_number) = Self::extract_id_number_from_text(text) {
            fields.insert_if_absent(FieldName::IdNumber, id_number);
        }

        fields
    }

    /// First ID-shaped substring, with whitespace separators turned into dashes.
    pub fn extract_id_number_from_text(text: &str) -> Option<String> {
        ID_NUMBER_PATTERN
            .find(text)
            .map(|m| normalize_id_number(m.as_str()))
    }

    /// Gives unlabeled dates a role. With the positional strategy two or more
    /// dates are taken as birth then expiry whatever surrounds them; a lone
    /// date becomes the expiry date only when expiry keywords sit next to it.
    pub fn assign_dates(text: &str, strategy: DateStrategy) -> BTreeMap<DateRole, String> {
        let dates = DateDisambiguator::find_dates(text);

        match (strategy, dates.len()) {
            (_, 0) => BTreeMap::new(),
            (DateStrategy::Positional, 1) => {
                let role = if DateDisambiguator::mentions_expiry(text, dates[0]) {
                    DateRole::ExpiryDate
                } else {
                    DateRole::DateOfBirth
                };
                BTreeMap::from([(role, dates[0].to_string())])
            }
            (DateStrategy::Positional, _) => DateDisambiguator::assign_positional(&dates),
            (DateStrategy::Contextual, _) => {
                let roles = DateDisambiguator::disambiguate(text, &dates);
                if roles.is_empty() {
                    Self::assign_dates(text, DateStrategy::Positional)
                } else {
                    roles
                }
            }
        }
    }

    pub fn extract_name_from_text(text: &str) -> Option<String> {
        for pattern in NAME_PATTERNS.iter() {
            if let Some(captures) = pattern.captures(text) {
                if let Some(matched) = captures.get(1) {
                    return Some(matched.as_str().trim().to_string());
                }
            }
        }
        None
    }

    /// Longest Arabic run (first one on ties), if it is long enough to be a name.
    pub fn extract_arabic_name_from_text(text: &str) -> Option<String> {
        let mut longest: Option<&str> = None;
        let mut longest_len = 0;
        for run in ARABIC_RUN_PATTERN.find_iter(text) {
            let len = run.as_str().chars().count();
            if len > longest_len {
                longest = Some(run.as_str());
                longest_len = len;
            }
        }

        let name = longest?.trim();
        if name.chars().count() > MIN_ARABIC_NAME_CHARS {
            Some(name.to_string())
        } else {
            None
        }
    }

    /// First keyword, in list order, contained in the text ignoring case.
    pub fn extract_nationality_from_text(text: &str, keywords: &[String]) -> Option<String> {
        let lower = text.to_lowercase();
        keywords
            .iter()
            .find(|keyword| lower.contains(&keyword.to_lowercase()))
            .cloned()
    }

    pub fn extract_gender_from_text(text: &str) -> Option<String> {
        if MALE_PATTERN.is_match(text) {
            Some("Male".to_string())
        } else if FEMALE_PATTERN.is_match(text) {
            Some("Female".to_string())
        } else {
            None
        }
    }

    pub fn extract_issue_date_from_text(text: &str) -> Option<String> {
        ISSUE_DATE_PATTERN
            .captures(text)
            .and_then(|captures| captures.get(1))
            .map(|matched| matched.as_str().to_string())
    }

    /// Longest run of nine or more digits; the earliest one wins a tie.
    pub fn extract_card_number_from_text(text: &str) -> Option<String> {
        let mut longest: Option<&str> = None;
        for run in CARD_NUMBER_PATTERN.find_iter(text) {
            if longest.map_or(true, |best| run.as_str().chars().count() > best.chars().count()) {
                longest = Some(run.as_str());
            }
        }
        longest.map(str::to_string)
    }
}
