//! Field validators shared by the request DTOs.
//!
//! Each function follows the `validator` custom-function contract: it takes
//! the field value and returns a `ValidationError` carrying a client-facing
//! message when the value is rejected.

use chrono::{NaiveDate, Utc};
use std::borrow::Cow;
use validator::ValidationError;

const PASSWORD_SYMBOLS: &str = "!@#$%^&*()_+{}[]:;<>,.?";

fn rejected(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// No leading or trailing whitespace
pub fn no_surrounding_whitespace(value: &str) -> Result<(), ValidationError> {
    if value != value.trim() {
        return Err(rejected("no_whitespace", "must not start or end with whitespace"));
    }
    Ok(())
}

pub fn min_two_words(value: &str) -> Result<(), ValidationError> {
    if value.split_whitespace().count() < 2 {
        return Err(rejected("min_words", "must contain at least 2 words"));
    }
    Ok(())
}

/// Letter or underscore first, then at least two more letters, digits or underscores
pub fn valid_username(value: &str) -> Result<(), ValidationError> {
    let mut chars = value.chars();
    let first_ok = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    let rest_ok = chars.clone().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !first_ok || !rest_ok || value.chars().count() < 3 {
        return Err(rejected(
            "username",
            "must start with a letter or underscore and contain at least 3 letters, digits or underscores",
        ));
    }
    Ok(())
}

/// At least 8 characters with a lowercase letter, an uppercase letter, a digit and a symbol
pub fn strong_password(value: &str) -> Result<(), ValidationError> {
    let long_enough = value.chars().count() >= 8;
    let has_lower = value.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = value.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = value.chars().any(|c| c.is_ascii_digit());
    let has_symbol = value.chars().any(|c| PASSWORD_SYMBOLS.contains(c));

    if !(long_enough && has_lower && has_upper && has_digit && has_symbol) {
        return Err(rejected(
            "strong_password",
            "must be at least 8 characters and include lowercase, uppercase, digit and symbol",
        ));
    }
    Ok(())
}

/// Due dates may be today or later
pub fn not_in_past(value: &NaiveDate) -> Result<(), ValidationError> {
    if *value < Utc::now().date_naive() {
        return Err(rejected("future_date", "must not be in the past"));
    }
    Ok(())
}
