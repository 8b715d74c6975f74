// formguard - rule-based validation and sanitization for form input
//
// This library validates nested key/value input against declarative rules,
// transforms values in place and renders templated error messages.

// Re-export the input value type
pub use serde_json;

// Re-export optional crates
#[cfg(feature = "validation")]
pub use formguard_validation;

#[cfg(feature = "log")]
pub use formguard_log;

#[cfg(feature = "validation")]
pub use formguard_validation::{
    EngineError, EngineOptions, FieldSpec, FormValidator, LanguageLines, RuleConfig, RuleOutcome,
    RuleSpec, ValidationError, ValidationErrors,
};

// Prelude for common imports
pub mod prelude {
    pub use serde_json::{Value, json};

    #[cfg(feature = "validation")]
    pub use formguard_validation::{
        EngineError,
        EngineOptions,
        Escaper,
        FieldSpec,
        FormSchema,
        FormValidator,
        LanguageLines,
        LineSource,
        RuleConfig,
        RuleOutcome,
        RuleSpec,
        Validate,
        ValidationError,
        ValidationErrors,
        ValidationPipe,
        validate,
    };

    #[cfg(feature = "log")]
    pub use formguard_log::{LogConfig, init as init_logging};
}
