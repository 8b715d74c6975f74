// Validation traits

use crate::{FieldSpec, FormValidator, Result, ValidationErrors, sanitize};
use serde::Serialize;

/// Escapes a value before it reaches a data store.
///
/// Used by the `prevent_sql_injection` sanitizer. Implementations that talk
/// to a live connection report failures as [`EngineError::Escape`](crate::EngineError::Escape).
pub trait Escaper: Send + Sync {
    /// Escape a single value
    fn escape(&self, value: &str) -> Result<String>;
}

/// Default escaper: trims the value and HTML-escapes special characters
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlEscaper;

impl Escaper for HtmlEscaper {
    fn escape(&self, value: &str) -> Result<String> {
        Ok(sanitize::html_special_chars(sanitize::php_trim(value)))
    }
}

impl<F> Escaper for F
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    fn escape(&self, value: &str) -> Result<String> {
        self(value)
    }
}

/// Types that declare their own form rules
pub trait FormSchema {
    /// Field specifications checked against the serialized value
    fn field_specs() -> Vec<FieldSpec>;
}

/// Trait for validatable types
pub trait Validate {
    /// Validate the value and return errors if any
    fn validate(&self) -> std::result::Result<(), ValidationErrors>;
}

impl<T> Validate for T
where
    T: FormSchema + Serialize,
{
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let data = serde_json::to_value(self).map_err(|e| {
            ValidationErrors::from(vec![
                crate::ValidationError::new("", e.to_string()).with_rule("serialize"),
            ])
        })?;

        let mut validator = FormValidator::new(data);
        validator.add_fields(T::field_specs());
        match validator.validate(None) {
            Ok(true) => Ok(()),
            Ok(false) => Err(validator.errors().clone()),
            Err(e) => Err(ValidationErrors::from(vec![
                crate::ValidationError::new("", e.to_string()).with_rule("engine"),
            ])),
        }
    }
}
