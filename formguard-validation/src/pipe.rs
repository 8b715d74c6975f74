// Validation pipe for JSON request bodies

use crate::{EngineError, FormSchema, FormValidator, Result, ValidationErrors};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Validates a body against a type's rules and deserializes the cleaned data
pub struct ValidationPipe;

impl ValidationPipe {
    /// Parse a JSON body, validate it and deserialize the written-back data.
    ///
    /// Transforming rules such as `trim` are applied before deserializing.
    pub fn parse<T>(body: &[u8]) -> Result<T>
    where
        T: DeserializeOwned + FormSchema,
    {
        let data: Value = serde_json::from_slice(body)?;
        Self::parse_value(data)
    }

    /// Same as [`parse`](Self::parse) for an already decoded value
    pub fn parse_value<T>(data: Value) -> Result<T>
    where
        T: DeserializeOwned + FormSchema,
    {
        let mut validator = FormValidator::new(data);
        validator.add_fields(T::field_specs());

        if !validator.validate(None)? {
            return Err(EngineError::Rejected(validator.errors().clone()));
        }

        Ok(serde_json::from_value(validator.into_data())?)
    }

    /// Status code and JSON body describing `errors`
    pub fn error_response(errors: &ValidationErrors) -> (u16, Vec<u8>) {
        (400, errors.to_json().to_string().into_bytes())
    }
}

/// Validate a value implementing [`Validate`](crate::Validate), returning
/// [`EngineError::Rejected`](crate::EngineError::Rejected) from the
/// enclosing function on failure
#[macro_export]
macro_rules! validate {
    ($dto:expr) => {{
        $crate::Validate::validate(&$dto).map_err($crate::EngineError::Rejected)?
    }};
}
