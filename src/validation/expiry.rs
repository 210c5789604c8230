use chrono::NaiveDate;

pub struct ExpiryValidator;

impl ExpiryValidator {
    pub fn earliest_birth_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Dates count from midnight, so a card expiring today has already expired.
    pub fn is_unexpired(expiry: NaiveDate, today: NaiveDate) -> bool {
        expiry > today
    }

    pub fn is_plausible_birth_date(date_of_birth: NaiveDate, today: NaiveDate) -> bool {
        date_of_birth <= today && date_of_birth >= Self::earliest_birth_date()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_expiry_must_be_after_today() {
        let today = date(2026, 10, 19);
        assert!(ExpiryValidator::is_unexpired(date(2026, 10, 20), today));
        assert!(!ExpiryValidator::is_unexpired(today, today));
        assert!(!ExpiryValidator::is_unexpired(date(2000, 1, 1), today));
    }

    #[test]
    fn test_birth_date_bounds() {
        let today = date(2026, 10, 19);
        assert!(ExpiryValidator::is_plausible_birth_date(date(1990, 1, 15), today));
        assert!(ExpiryValidator::is_plausible_birth_date(date(1900, 1, 1), today));
        assert!(ExpiryValidator::is_plausible_birth_date(today, today));
        assert!(!ExpiryValidator::is_plausible_birth_date(date(1899, 12, 31), today));
        assert!(!ExpiryValidator::is_plausible_birth_date(date(2030, 1, 1), today));
    }
}
