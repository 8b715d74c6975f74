//! Error message templates.
//!
//! Templates come from, in order: the field's inline errors, engine-wide
//! messages, then an external [`LineSource`] under `form_validation_<rule>`,
//! then the same source under the bare rule name. Templates may use either
//! `{field}`/`{param}` or positional `%s` placeholders.

use crate::Result;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Namespace prefix for rule message keys
pub const RULE_KEY_PREFIX: &str = "form_validation_";

/// Labels starting with this marker are looked up in the line source
pub const LABEL_MARKER: &str = "lang:";

/// Key of the fallback template used when no message is configured
pub const NOT_SET_KEY: &str = "form_validation_error_message_not_set";

const NOT_SET_FALLBACK: &str = "Unable to access an error message corresponding to your field name.";

/// External key to template lookup
pub trait LineSource: Send + Sync {
    /// Template for `key`, if one exists
    fn line(&self, key: &str) -> Option<String>;
}

/// In-memory line source
#[derive(Debug, Clone, Default)]
pub struct LanguageLines {
    lines: HashMap<String, String>,
}

impl LanguageLines {
    /// Empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in English templates for every catalog rule
    pub fn english() -> Self {
        let mut lines = Self::new();
        for (rule, template) in ENGLISH {
            lines.add(format!("{}{}", RULE_KEY_PREFIX, rule), *template);
        }
        lines.add(NOT_SET_KEY, NOT_SET_FALLBACK);
        lines
    }

    /// Load a flat `{"key": "template"}` JSON object
    pub fn from_json(json: &str) -> Result<Self> {
        let lines: HashMap<String, String> = serde_json::from_str(json)?;
        Ok(Self { lines })
    }

    /// Load lines from a JSON file
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Add or replace a line
    pub fn add(&mut self, key: impl Into<String>, template: impl Into<String>) {
        self.lines.insert(key.into(), template.into());
    }

    /// Builder form of [`add`](Self::add)
    pub fn with(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.add(key, template);
        self
    }

    /// Overlay another source's lines on top of these
    pub fn extend(&mut self, other: LanguageLines) {
        self.lines.extend(other.lines);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl LineSource for LanguageLines {
    fn line(&self, key: &str) -> Option<String> {
        self.lines.get(key).cloned()
    }
}

const ENGLISH: &[(&str, &str)] = &[
    ("required", "The {field} field is required."),
    ("isset", "The {field} field must have a value."),
    ("valid_email", "The {field} field must contain a valid email address."),
    ("valid_emails", "The {field} field must contain all valid email addresses."),
    ("valid_url", "The {field} field must contain a valid URL."),
    ("min_length", "The {field} field must be at least {param} characters in length."),
    ("max_length", "The {field} field cannot exceed {param} characters in length."),
    ("exact_length", "The {field} field must be exactly {param} characters in length."),
    ("alpha", "The {field} field may only contain alphabetical characters."),
    ("alpha_numeric", "The {field} field may only contain alpha-numeric characters."),
    (
        "alpha_numeric_spaces",
        "The {field} field may only contain alpha-numeric characters and spaces.",
    ),
    (
        "alpha_dash",
        "The {field} field may only contain alpha-numeric characters, underscores, and dashes.",
    ),
    ("numeric", "The {field} field must contain only numbers."),
    ("integer", "The {field} field must contain an integer."),
    ("decimal", "The {field} field must contain a decimal number."),
    ("regex_match", "The {field} field is not in the correct format."),
    ("matches", "The {field} field does not match the {param} field."),
    ("is_natural", "The {field} field must only contain digits."),
    (
        "is_natural_no_zero",
        "The {field} field must only contain digits and must be greater than zero.",
    ),
    ("greater_than", "The {field} field must contain a number greater than {param}."),
    (
        "greater_than_equal_to",
        "The {field} field must contain a number greater than or equal to {param}.",
    ),
    ("less_than", "The {field} field must contain a number less than {param}."),
    (
        "less_than_equal_to",
        "The {field} field must contain a number less than or equal to {param}.",
    ),
    ("in_list", "The {field} field must be one of: {param}."),
    ("valid_base64", "The {field} field must contain a valid Base64 string."),
    ("phone", "The {field} field must contain a valid phone number."),
    ("special_chars", "The {field} field may not contain any of: {param}."),
    ("allowed_chars", "The {field} field may only contain: {param}."),
];

/// Pick the template for a failed rule.
///
/// `field_errors` are the field's inline messages, `engine_messages` the
/// engine-wide ones.
pub fn resolve(
    rule: &str,
    field_errors: &HashMap<String, String>,
    engine_messages: &HashMap<String, String>,
    lines: &dyn LineSource,
) -> String {
    if let Some(template) = field_errors.get(rule) {
        return template.clone();
    }
    if let Some(template) = engine_messages.get(rule) {
        return template.clone();
    }
    if let Some(template) = lines.line(&format!("{}{}", RULE_KEY_PREFIX, rule)) {
        return template;
    }
    if let Some(template) = lines.line(rule) {
        return template;
    }

    let not_set = lines
        .line(NOT_SET_KEY)
        .unwrap_or_else(|| NOT_SET_FALLBACK.to_string());
    format!("{}({})", not_set, rule)
}

/// Resolve a `lang:`-prefixed label through `lines`.
///
/// Unknown keys fall back to the label without its marker; unmarked labels
/// are returned unchanged.
pub fn translate_label(label: &str, lines: &dyn LineSource) -> String {
    match label.strip_prefix(LABEL_MARKER) {
        Some(key) if !key.is_empty() => lines.line(key).unwrap_or_else(|| key.to_string()),
        _ => label.to_string(),
    }
}

/// Fill a template with the field label and rule parameter.
///
/// Templates containing `%s` are treated positionally (label, then
/// parameter, `%%` for a literal percent sign); all others use `{field}`
/// and `{param}`.
pub fn render(template: &str, label: &str, param: &str) -> String {
    if !template.contains("%s") {
        return template.replace("{field}", label).replace("{param}", param);
    }

    let mut args = [label, param].into_iter();
    let mut out = String::with_capacity(template.len() + label.len() + param.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('s') => {
                chars.next();
                out.push_str(args.next().unwrap_or_default());
            }
            Some('%') => {
                chars.next();
                out.push('%');
            }
            _ => out.push('%'),
        }
    }
    out
}
