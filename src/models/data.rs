use crate::utils::IdCardError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Which face of the card the text was recognized from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Front,
    Back,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Front => "front",
            Side::Back => "back",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = IdCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "front" => Ok(Side::Front),
            "back" => Ok(Side::Back),
            other => Err(IdCardError::InvalidSide(format!(
                "Side must be \"front\" or \"back\", got \"{}\"",
                other
            ))),
        }
    }
}

/// Field names double as the JSON keys external layers rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldName {
    IdNumber,
    Name,
    NameArabic,
    Nationality,
    DateOfBirth,
    Gender,
    ExpiryDate,
    IssueDate,
    CardNumber,
}

impl FieldName {
    pub const ALL: [FieldName; 9] = [
        FieldName::IdNumber,
        FieldName::Name,
        FieldName::NameArabic,
        FieldName::Nationality,
        FieldName::DateOfBirth,
        FieldName::Gender,
        FieldName::ExpiryDate,
        FieldName::IssueDate,
        FieldName::CardNumber,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::IdNumber => "idNumber",
            FieldName::Name => "name",
            FieldName::NameArabic => "nameArabic",
            FieldName::Nationality => "nationality",
            FieldName::DateOfBirth => "dateOfBirth",
            FieldName::Gender => "gender",
            FieldName::ExpiryDate => "expiryDate",
            FieldName::IssueDate => "issueDate",
            FieldName::CardNumber => "cardNumber",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extracted fields. A key is present only when the field was found, so an
/// absent key and an empty value are different things.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap {
    fields: BTreeMap<FieldName, String>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: FieldName) -> Option<&str> {
        self.fields.get(&name).map(String::as_str)
    }

    pub fn contains(&self, name: FieldName) -> bool {
        self.fields.contains_key(&name)
    }

    pub fn insert(&mut self, name: FieldName, value: impl Into<String>) -> Option<String> {
        self.fields.insert(name, value.into())
    }

    /// Stores the value only if the field has not been set yet. Returns
    /// whether the value was stored.
    pub fn insert_if_absent(&mut self, name: FieldName, value: impl Into<String>) -> bool {
        if self.fields.contains_key(&name) {
            return false;
        }
        self.fields.insert(name, value.into());
        true
    }

    pub fn remove(&mut self, name: FieldName) -> Option<String> {
        self.fields.remove(&name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &str)> {
        self.fields.iter().map(|(name, value)| (*name, value.as_str()))
    }
}

impl<S: Into<String>> FromIterator<(FieldName, S)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (FieldName, S)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}

/// One recognized text fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub confidence: f32,
}

impl Token {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Token {
            text: text.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// OCR output for one image, in recognition order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognizedText {
    pub tokens: Vec<Token>,
}

impl RecognizedText {
    pub fn new(tokens: Vec<Token>) -> Self {
        RecognizedText { tokens }
    }

    /// Wraps text that did not come from a recognizer, e.g. a transcript
    /// supplied on the command line.
    pub fn from_text(text: &str) -> Self {
        if text.trim().is_empty() {
            return RecognizedText::default();
        }
        RecognizedText {
            tokens: vec![Token::new(text, 1.0)],
        }
    }

    pub fn raw_text(&self) -> String {
        self.tokens
            .iter()
            .map(|token| token.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn mean_confidence(&self) -> f32 {
        if self.tokens.is_empty() {
            return 0.0;
        }
        let total: f32 = self.tokens.iter().map(|token| token.confidence).sum();
        total / self.tokens.len() as f32
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Graded trust decision for one side of a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    #[serde(rename = "isValid")]
    pub is_valid: bool,
    #[serde(rename = "isEmiratesID")]
    pub is_emirates_id: bool,
    pub confidence: f64,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Everything produced for one card image or transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub side: Side,
    pub data: FieldMap,
    pub raw_text: String,
    pub ocr_confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_parsing() {
        assert_eq!("front".parse::<Side>().unwrap(), Side::Front);
        assert_eq!(" BACK ".parse::<Side>().unwrap(), Side::Back);
        assert!(matches!(
            "top".parse::<Side>(),
            Err(IdCardError::InvalidSide(_))
        ));
    }

    #[test]
    fn test_field_map_keeps_first_value() {
        let mut fields = FieldMap::new();
        assert!(fields.insert_if_absent(FieldName::DateOfBirth, "15/01/1990"));
        assert!(!fields.insert_if_absent(FieldName::DateOfBirth, "01/01/2000"));
        assert_eq!(fields.get(FieldName::DateOfBirth), Some("15/01/1990"));
        assert!(!fields.contains(FieldName::ExpiryDate));
    }

    #[test]
    fn test_field_map_json_keys() {
        let fields: FieldMap = vec![
            (FieldName::IdNumber, "784-1234-5678901-2"),
            (FieldName::DateOfBirth, "15/01/1990"),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json["idNumber"], "784-1234-5678901-2");
        assert_eq!(json["dateOfBirth"], "15/01/1990");
        assert!(json.get("expiryDate").is_none());

        let back: FieldMap = serde_json::from_value(json).unwrap();
        assert_eq!(back, fields);
    }

    #[test]
    fn test_recognized_text_joins_tokens() {
        let text = RecognizedText::new(vec![
            Token::new("784-1234-5678901-2", 0.9),
            Token::new("John Smith", 0.7),
        ]);
        assert_eq!(text.raw_text(), "784-1234-5678901-2 John Smith");
        assert!((text.mean_confidence() - 0.8).abs() < 1e-6);
        assert_eq!(RecognizedText::default().mean_confidence(), 0.0);
    }

    #[test]
    fn test_outcome_serializes_transport_names() {
        let outcome = ValidationOutcome {
            is_valid: true,
            is_emirates_id: true,
            confidence: 0.9,
            errors: Vec::new(),
            warnings: vec!["Gender not found".to_string()],
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["isValid"], true);
        assert_eq!(json["isEmiratesID"], true);
        assert_eq!(json["warnings"][0], "Gender not found");
    }
}
