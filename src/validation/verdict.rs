use crate::models::ValidationOutcome;
use crate::utils::IdCardError;
use crate::validation::scoring::{Findings, SideScore};
use log::error;

pub struct VerdictComposer;

impl VerdictComposer {
    /// Folds a side score and its findings into the final outcome.
    ///
    /// `is_valid` requires the document type to be recognized and no hard
    /// errors. A scoring fault becomes one error entry and an invalid,
    /// unrecognized outcome with zero confidence.
    pub fn compose(scored: Result<SideScore, IdCardError>, findings: Findings) -> ValidationOutcome {
        let Findings {
            mut errors,
            warnings,
        } = findings;

        match scored {
            Ok(score) => ValidationOutcome {
                is_valid: score.is_emirates_id && errors.is_empty(),
                is_emirates_id: score.is_emirates_id,
                confidence: score.confidence.clamp(0.0, 1.0),
                errors,
                warnings,
            },
            Err(err) => {
                error!("Error validating Emirates ID: {}", err);
                errors.push(err.to_string());
                ValidationOutcome {
                    is_valid: false,
                    is_emirates_id: false,
                    confidence: 0.0,
                    errors,
                    warnings,
                }
            }
        }
    }
}
