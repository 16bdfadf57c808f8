use thiserror::Error;
use validator::{Validate, ValidationErrors};

/// Checks a request or response before it crosses the pipeline.
pub trait Validator<T>: Send + Sync {
    /// # Errors
    /// The field-level violations found in `value`.
    fn validate(&self, value: &T) -> Result<(), ValidationErrors>;
}

/// Validates through the type's `#[derive(Validate)]` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructValidator;

impl<T: Validate> Validator<T> for StructValidator {
    fn validate(&self, value: &T) -> Result<(), ValidationErrors> {
        value.validate()
    }
}

/// Accepts every value. For responses that carry nothing to check.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl<T> Validator<T> for AcceptAll {
    fn validate(&self, _value: &T) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

/// A handler produced a response that failed validation.
#[derive(Debug, Error)]
#[error("response validation failed: {0}")]
pub struct ResponseValidation(#[from] pub ValidationErrors);
