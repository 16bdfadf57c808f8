use validator::{ValidateEmail, ValidationError};

/// Hex length of a record identifier.
pub const OBJECT_ID_LEN: usize = 24;

/// Accepts 24 lowercase hexadecimal characters, the canonical identifier form.
///
/// # Errors
/// `object_id` when `value` has another length or a character outside `0-9a-f`.
pub fn validate_object_id(value: &str) -> Result<(), ValidationError> {
    let canonical = |b: u8| b.is_ascii_digit() || (b'a'..=b'f').contains(&b);
    if value.len() == OBJECT_ID_LEN && value.bytes().all(canonical) {
        Ok(())
    } else {
        Err(ValidationError::new("object_id"))
    }
}

/// Accepts an empty string (no change) or a well-formed address.
///
/// # Errors
/// `email` for a non-empty malformed address.
pub fn validate_email_or_empty(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.validate_email() {
        Ok(())
    } else {
        Err(ValidationError::new("email"))
    }
}
