//! Request validation

use common::decimal::precision::{fits_precision, AMOUNT_PRECISION};
use common::decimal::Amount;

use crate::error::{ApiError, FieldErrors};

/// Collects field problems across a whole request
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    fn reject(&mut self, field: &str, problem: String) {
        self.errors.entry(field.to_string()).or_default().push(problem);
    }

    /// Non-blank text of at most `max_len` characters
    pub fn required(&mut self, field: &str, value: &str, max_len: usize) -> &mut Self {
        if value.trim().is_empty() {
            self.reject(field, "This field may not be blank.".to_string());
        } else if value.chars().count() > max_len {
            self.reject(
                field,
                format!("Ensure this field has no more than {} characters.", max_len),
            );
        }
        self
    }

    /// Optional email; blank counts as absent
    pub fn email(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(email) = value.map(str::trim).filter(|e| !e.is_empty()) {
            let valid = email
                .split_once('@')
                .map_or(false, |(local, domain)| {
                    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
                });
            if !valid {
                self.reject(field, "Enter a valid email address.".to_string());
            }
        }
        self
    }

    /// Amount representable with two decimals
    pub fn amount(&mut self, field: &str, value: Amount) -> &mut Self {
        if !fits_precision(value) {
            self.reject(
                field,
                format!(
                    "Ensure there are no more than 15 digits in total and {} decimal places.",
                    AMOUNT_PRECISION
                ),
            );
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}
