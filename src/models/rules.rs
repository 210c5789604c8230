use crate::utils::IdCardError;
use serde::{Deserialize, Serialize};

/// Nationalities recognized out of the box. Anything else leaves the field absent.
pub const DEFAULT_NATIONALITIES: [&str; 6] = [
    "Filipino",
    "Indian",
    "Pakistani",
    "Bangladeshi",
    "Egyptian",
    "Lebanese",
];

/// How unlabeled dates on the front side are given a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateStrategy {
    /// First date is the birth date, second the expiry date. A single date is
    /// classified by the keywords around it.
    #[default]
    Positional,
    /// Every date is classified by the keywords around it, falling back to
    /// the positional rule when none of them can be classified.
    Contextual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractionRules {
    pub nationalities: Vec<String>,
    pub date_strategy: DateStrategy,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        ExtractionRules {
            nationalities: DEFAULT_NATIONALITIES.iter().map(|n| n.to_string()).collect(),
            date_strategy: DateStrategy::default(),
        }
    }
}

impl ExtractionRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nationality(mut self, nationality: impl Into<String>) -> Self {
        self.nationalities.push(nationality.into());
        self
    }

    pub fn with_date_strategy(mut self, strategy: DateStrategy) -> Self {
        self.date_strategy = strategy;
        self
    }

    /// Blank keywords would match every text.
    pub fn check(&self) -> Result<(), IdCardError> {
        if let Some(index) = self.nationalities.iter().position(|n| n.trim().is_empty()) {
            return Err(IdCardError::Config(format!(
                "Nationality keyword #{} is blank",
                index
            )));
        }
        Ok(())
    }
}
