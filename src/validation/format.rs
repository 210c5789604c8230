use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref STRICT_ID_NUMBER_PATTERN: Regex = Regex::new(r"^784[-\s]?\d{4}[-\s]?\d{7}[-\s]?\d{1}$").unwrap();
}

/// Tried in this order; the first format that parses wins.
pub const DATE_FORMATS: [&str; 5] = ["%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d", "%Y-%m-%d", "%d.%m.%Y"];

/// Replaces whitespace separators with dashes.
pub fn normalize_id_number(id_number: &str) -> String {
    id_number
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect()
}

pub struct FormatValidator;

impl FormatValidator {
    /// `784-XXXX-XXXXXXX-X`: UAE country code, 4 digits, 7 digits, 1 digit.
    ///
    /// Only the shape is checked. The card's check-digit algorithm is not
    /// published, so the last digit is not verified.
    pub fn is_valid_id_number(id_number: &str) -> bool {
        STRICT_ID_NUMBER_PATTERN.is_match(&normalize_id_number(id_number))
    }

    pub fn parse_date(date_str: &str) -> Option<NaiveDate> {
        DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(date_str, format).ok())
    }

    pub fn is_known_date_format(date_str: &str) -> bool {
        Self::parse_date(date_str).is_some()
    }
}
