// Validation errors

use std::fmt;
use thiserror::Error;

/// A rendered failure for a single field
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Field path that failed validation
    pub field: String,

    /// Rendered, human-readable message
    pub message: String,

    /// Rule that failed
    pub rule: String,

    /// Candidate value that failed (optional)
    pub value: Option<String>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: "custom".to_string(),
            value: None,
        }
    }

    /// Set the failing rule name
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = rule.into();
        self
    }

    /// Set the failing value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Per-run error map, kept in first-failure order with at most one
/// message per field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if there are any errors
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of failing fields
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Record an error unless the field already has one.
    ///
    /// Returns `true` when the error was stored.
    pub fn add(&mut self, error: ValidationError) -> bool {
        if self.contains(&error.field) {
            return false;
        }
        self.errors.push(error);
        true
    }

    /// Whether `field` has a recorded error
    pub fn contains(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Message recorded for `field`
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// Full error record for `field`
    pub fn get_error(&self, field: &str) -> Option<&ValidationError> {
        self.errors.iter().find(|e| e.field == field)
    }

    /// Iterate over errors in first-failure order
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// Failing field paths in first-failure order
    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.field.as_str()).collect()
    }

    pub(crate) fn clear(&mut self) {
        self.errors.clear();
    }

    /// Convert to JSON representation
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "errors": self.errors.iter().map(|e| {
                serde_json::json!({
                    "field": e.field,
                    "message": e.message,
                    "rule": e.rule,
                    "value": e.value,
                })
            }).collect::<Vec<_>>()
        })
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for error in &self.errors {
            writeln!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        let mut collected = Self::new();
        for error in errors {
            collected.add(error);
        }
        collected
    }
}

/// Fatal engine conditions. Ordinary rule failures never surface here.
#[derive(Debug, Error)]
pub enum EngineError {
    /// `sanitize` was asked for a transform nobody provides
    #[error("Unknown sanitization transform: {0}")]
    UnknownTransform(String),

    /// A rule name matched nothing (strict mode only)
    #[error("Unable to resolve rule '{rule}' for field '{field}'")]
    UnresolvedRule { field: String, rule: String },

    /// The data-store escaper failed
    #[error("Escaping failed: {0}")]
    Escape(String),

    /// Invalid engine or rule configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input was well formed but failed validation
    #[error("Validation failed: {0}")]
    Rejected(ValidationErrors),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML error
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_error_per_field_wins() {
        let mut errors = ValidationErrors::new();
        assert!(errors.add(ValidationError::new("pw", "first").with_rule("required")));
        assert!(!errors.add(ValidationError::new("pw", "second")));
        assert!(errors.add(ValidationError::new("email", "bad")));

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("pw"), Some("first"));
        assert_eq!(errors.fields(), vec!["pw", "email"]);
    }

    #[test]
    fn test_to_json_shape() {
        let errors: ValidationErrors = vec![
            ValidationError::new("age", "The age field is required.")
                .with_rule("required")
                .with_value(""),
        ]
        .into();
        let json = errors.to_json();
        assert_eq!(json["errors"][0]["field"], "age");
        assert_eq!(json["errors"][0]["rule"], "required");
        assert_eq!(json["errors"][0]["value"], "");
    }

    #[test]
    fn test_display_lists_each_error() {
        let errors: ValidationErrors = vec![
            ValidationError::new("a", "one"),
            ValidationError::new("b", "two"),
        ]
        .into();
        assert_eq!(errors.to_string(), "a: one\nb: two\n");
    }
}
