//! Rule-based validation and sanitization of form input
//!
//! Validates nested key/value input (usually a decoded JSON body) against
//! declarative per-field rules, transforms values in place, and renders
//! human-readable error messages.
//!
//! # Examples
//!
//! ## Basic Validation
//!
//! ```
//! use formguard_validation::{FieldSpec, FormValidator};
//! use serde_json::json;
//!
//! let mut validator = FormValidator::new(json!({
//!     "username": "  jane_doe ",
//!     "age": "",
//! }));
//! validator
//!     .add_field(FieldSpec::new("username").label("Username").rules("trim|required|alpha_dash"))
//!     .add_field(FieldSpec::new("age").rules("required|integer|greater_than[17]"));
//!
//! assert!(!validator.validate(None).unwrap());
//! assert_eq!(validator.errors().get("age"), Some("The age field is required."));
//! ```
//!
//! ## Array Fields
//!
//! ```
//! use formguard_validation::{FieldSpec, FormValidator};
//! use serde_json::json;
//!
//! let mut validator = FormValidator::new(json!({"tags": ["ok1", "bad!"]}));
//! validator.add_field(FieldSpec::new("tags[]").rules("alpha_numeric"));
//!
//! // every element is checked, one failure fails the field
//! assert!(!validator.validate(None).unwrap());
//! assert!(validator.errors().contains("tags[]"));
//! ```
//!
//! ## Callbacks
//!
//! ```
//! use formguard_validation::{FieldSpec, FormValidator};
//! use serde_json::{Value, json};
//!
//! let mut validator = FormValidator::new(json!({"email": "taken@example.com"}));
//! validator
//!     .add_field(FieldSpec::new("email").rules("required|valid_email|callback_unique_email"))
//!     .register_callback("unique_email", |value: &Value, _: Option<&str>| {
//!         value.as_str() != Some("taken@example.com")
//!     })
//!     .set_message("unique_email", "That {field} is already registered.");
//!
//! assert!(!validator.validate(None).unwrap());
//! assert_eq!(
//!     validator.error_string(None, None),
//!     "<p>That email is already registered.</p>\n"
//! );
//! ```
//!
//! ## Sanitization
//!
//! ```
//! use formguard_validation::FormValidator;
//! use serde_json::json;
//!
//! let validator = FormValidator::new(json!({"name": " bob "}));
//! assert_eq!(
//!     validator.sanitize("name", "trim|upper", None).unwrap(),
//!     Some("Bob".to_string())
//! );
//! ```

mod config;
mod engine;
mod errors;
mod messages;
mod pipe;
mod rules;
mod schema;
mod traits;

pub mod path;
pub mod sanitize;
pub mod schedule;
pub mod validators;

pub use config::*;
pub use engine::*;
pub use errors::*;
pub use messages::*;
pub use pipe::*;
pub use rules::*;
pub use schema::*;
pub use traits::*;
