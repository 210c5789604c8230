use crate::models::{FieldMap, FieldName, Side, ValidationOutcome};
use crate::utils::IdCardError;
use crate::validation::expiry::ExpiryValidator;
use crate::validation::format::FormatValidator;
use crate::validation::verdict::VerdictComposer;
use chrono::{Local, NaiveDate, NaiveDateTime};
use log::info;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Confidence credited per field. The front-side weights add up to 1.0.
pub mod weights {
    pub const ID_NUMBER: f64 = 0.4;
    pub const NAME: f64 = 0.2;
    pub const DATE_OF_BIRTH: f64 = 0.1;
    pub const EXPIRY_DATE: f64 = 0.2;
    pub const NATIONALITY: f64 = 0.05;
    pub const GENDER: f64 = 0.05;

    pub const BACK_NUMBER_PRESENT: f64 = 0.3;
    pub const BACK_ID_NUMBER_FORMAT: f64 = 0.4;

    pub const FRONT_MIN_CONFIDENCE: f64 = 0.5;
    pub const BACK_MIN_CONFIDENCE: f64 = 0.3;
}

/// Raw result of scoring one side, before the verdict is composed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideScore {
    pub confidence: f64,
    pub is_emirates_id: bool,
}

/// Hard errors and warnings collected while scoring, in the order found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Findings {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Scores an extracted [`FieldMap`] and turns it into a [`ValidationOutcome`].
///
/// Validation never fails: a fault while scoring is reported as a single
/// error entry in the outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldValidator;

impl FieldValidator {
    pub fn new() -> Self {
        FieldValidator
    }

    pub fn validate(&self, fields: &FieldMap, side: Side) -> ValidationOutcome {
        self.validate_at(fields, side, Local::now().naive_local())
    }

    /// Same as [`FieldValidator::validate`] with an explicit clock.
    pub fn validate_at(&self, fields: &FieldMap, side: Side, now: NaiveDateTime) -> ValidationOutcome {
        Self::run_guarded(|findings| Ok(Self::score_side(fields, side, now.date(), findings)))
    }

    pub fn score_side(
        fields: &FieldMap,
        side: Side,
        today: NaiveDate,
        findings: &mut Findings,
    ) -> SideScore {
        match side {
            Side::Front => Self::score_front(fields, today, findings),
            Side::Back => Self::score_back(fields, findings),
        }
    }

    /// Runs `scorer` and composes the verdict. A panic inside the scorer is
    /// reported as a validation error; findings gathered before it are kept.
    fn run_guarded<F>(scorer: F) -> ValidationOutcome
    where
        F: FnOnce(&mut Findings) -> Result<SideScore, IdCardError>,
    {
        let mut findings = Findings::default();
        let scored = panic::catch_unwind(AssertUnwindSafe(|| scorer(&mut findings)))
            .unwrap_or_else(|payload| Err(IdCardError::Validation(panic_message(payload.as_ref()))));

        VerdictComposer::compose(scored, findings)
    }

    fn score_front(fields: &FieldMap, today: NaiveDate, findings: &mut Findings) -> SideScore {
        let mut confidence = 0.0;
        let mut is_emirates_id = false;

        // ID number carries the most weight and decides the document type
        match fields.get(FieldName::IdNumber) {
            Some(id_number) if FormatValidator::is_valid_id_number(id_number) => {
                confidence += weights::ID_NUMBER;
                is_emirates_id = true;
                info!("Valid ID number found: {}", id_number);
            }
            Some(id_number) => findings
                .errors
                .push(format!("Invalid ID number format: {}", id_number)),
            None => findings
                .warnings
                .push("ID number not found in extracted text".to_string()),
        }

        if fields.contains(FieldName::Name) {
            confidence += weights::NAME;
        } else {
            findings.warnings.push("Name not found".to_string());
        }

        match fields.get(FieldName::DateOfBirth) {
            Some(dob) => match FormatValidator::parse_date(dob) {
                Some(date) if ExpiryValidator::is_plausible_birth_date(date, today) => {
                    confidence += weights::DATE_OF_BIRTH;
                }
                Some(_) => findings
                    .warnings
                    .push(format!("Date of birth seems invalid: {}", dob)),
                None => findings
                    .warnings
                    .push(format!("Date of birth format unclear: {}", dob)),
            },
            None => findings.warnings.push("Date of birth not found".to_string()),
        }

        match fields.get(FieldName::ExpiryDate) {
            Some(expiry) => match FormatValidator::parse_date(expiry) {
                Some(date) if ExpiryValidator::is_unexpired(date, today) => {
                    confidence += weights::EXPIRY_DATE;
                }
                Some(_) => findings
                    .errors
                    .push(format!("Emirates ID has expired: {}", expiry)),
                None => findings
                    .warnings
                    .push(format!("Expiry date format unclear: {}", expiry)),
            },
            None => findings.warnings.push("Expiry date not found".to_string()),
        }

        if fields.contains(FieldName::Nationality) {
            confidence += weights::NATIONALITY;
        }

        if fields.contains(FieldName::Gender) {
            confidence += weights::GENDER;
        }

        if confidence < weights::FRONT_MIN_CONFIDENCE {
            findings
                .warnings
                .push(format!("Low confidence score: {:.2}", confidence));
        }

        SideScore {
            confidence,
            is_emirates_id,
        }
    }

    // The back side is read leniently: a malformed ID number is only a warning.
    fn score_back(fields: &FieldMap, findings: &mut Findings) -> SideScore {
        let mut confidence = 0.0;
        let mut is_emirates_id = false;

        if fields.contains(FieldName::CardNumber) || fields.contains(FieldName::IdNumber) {
            confidence += weights::BACK_NUMBER_PRESENT;
            is_emirates_id = true;
        }

        if let Some(id_number) = fields.get(FieldName::IdNumber) {
            if FormatValidator::is_valid_id_number(id_number) {
                confidence += weights::BACK_ID_NUMBER_FORMAT;
            } else {
                findings
                    .warnings
                    .push(format!("ID number format unclear: {}", id_number));
            }
        }

        if confidence < weights::BACK_MIN_CONFIDENCE {
            findings
                .warnings
                .push(format!("Low confidence score: {:.2}", confidence));
        }

        SideScore {
            confidence,
            is_emirates_id: is_emirates_id || confidence >= weights::BACK_MIN_CONFIDENCE,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unexpected failure while scoring fields".to_string()
    }
}
