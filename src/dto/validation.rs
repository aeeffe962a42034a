//! Validation helpers for DTOs.

use validator::ValidationError;

const PARTY_CODE_MIN: usize = 4;
const PARTY_CODE_MAX: usize = 12;

/// Validates that a party code is 4 to 12 ASCII alphanumeric characters.
///
/// # Examples
///
/// ```ignore
/// validate_party_code("WM40")      // Ok
/// validate_party_code("wm40")      // Ok - case is normalized later
/// validate_party_code("WM")        // Err - too short
/// validate_party_code("WM-40")     // Err - punctuation
/// ```
pub fn validate_party_code(code: &str) -> Result<(), ValidationError> {
    if !(PARTY_CODE_MIN..=PARTY_CODE_MAX).contains(&code.len()) {
        let mut err = ValidationError::new("party_code_length");
        err.message = Some(
            format!(
                "Party code must be {PARTY_CODE_MIN} to {PARTY_CODE_MAX} characters (got {})",
                code.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        let mut err = ValidationError::new("party_code_format");
        err.message = Some("Party code must contain only letters and digits".into());
        return Err(err);
    }

    Ok(())
}

/// Validate `code` and return its canonical upper-case form.
pub fn normalize_party_code(code: &str) -> Result<String, ValidationError> {
    let code = code.trim();
    validate_party_code(code)?;
    Ok(code.to_ascii_uppercase())
}
