//! The validation engine.
//!
//! [`FormValidator`] owns a copy of the input, the field schema and the
//! per-run results. A run binds every field first, then executes each
//! field's scheduled rules, so cross-field rules such as `matches` see the
//! other field's current value. Transformed values are written back into
//! the owned input only when the whole run passes.

use crate::config::{EngineOptions, RuleConfig};
use crate::messages::{self, LanguageLines, LineSource};
use crate::path::{self, Cycle, FieldPath};
use crate::rules::{CALLBACK_PREFIX, ParamRuleFn, RuleOutcome, RuleSpec, split_param, split_rules};
use crate::schedule::schedule;
use crate::schema::{FieldDescriptor, FieldSpec, Schema};
use crate::traits::{Escaper, HtmlEscaper};
use crate::{EngineError, Result, ValidationError, ValidationErrors, sanitize, validators};
use formguard_log::{debug, error, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

const TARGET: &str = "formguard::engine";

/// Message key used for callables registered without a name
pub const ANONYMOUS_RULE: &str = "callable";

/// Algorithm `do_hash` uses when none is given
pub const DEFAULT_HASH: &str = "sha1";

/// Sanitizers implemented by the engine rather than the transform catalog
pub const ENGINE_SANITIZERS: [&str; 5] = [
    "encode_php_tags",
    "prep_url",
    "prep_for_form",
    "do_hash",
    "prevent_sql_injection",
];

/// Rule-based validator and sanitizer for nested form input
#[derive(Clone)]
pub struct FormValidator {
    data: Value,
    schema: Schema,
    errors: ValidationErrors,
    messages: HashMap<String, String>,
    config: RuleConfig,
    callbacks: HashMap<String, ParamRuleFn>,
    functions: HashMap<String, ParamRuleFn>,
    lines: Arc<dyn LineSource>,
    escaper: Arc<dyn Escaper>,
    options: EngineOptions,
    safe_form_data: bool,
    unresolved: Vec<(String, String)>,
}

impl FormValidator {
    /// Engine over `data` with default options and English messages
    pub fn new(data: Value) -> Self {
        Self {
            data,
            schema: Schema::new(),
            errors: ValidationErrors::new(),
            messages: HashMap::new(),
            config: RuleConfig::default(),
            callbacks: HashMap::new(),
            functions: HashMap::new(),
            lines: Arc::new(LanguageLines::english()),
            escaper: Arc::new(HtmlEscaper),
            options: EngineOptions::default(),
            safe_form_data: false,
            unresolved: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Preloaded rules used by [`validate`](Self::validate) when no field
    /// has been added explicitly
    pub fn with_config(mut self, config: RuleConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the message and label lookup
    pub fn with_lines(mut self, lines: impl LineSource + 'static) -> Self {
        self.lines = Arc::new(lines);
        self
    }

    /// Replace the escaper used by `prevent_sql_injection`
    pub fn with_escaper(mut self, escaper: impl Escaper + 'static) -> Self {
        self.escaper = Arc::new(escaper);
        self
    }

    /// Add or replace the rules for one field
    pub fn add_field(&mut self, spec: FieldSpec) -> &mut Self {
        let field = spec.field.clone();
        if !self.schema.add(spec) {
            debug!(target: TARGET, "Ignoring field '{}' without name or rules", field);
        }
        self
    }

    /// Add several field specs; entries without rules are skipped
    pub fn add_fields(&mut self, specs: impl IntoIterator<Item = FieldSpec>) -> &mut Self {
        for spec in specs {
            self.add_field(spec);
        }
        self
    }

    /// Add a field from a label and a pipe-delimited rule string
    pub fn set_rules(&mut self, field: &str, label: &str, rules: &str) -> &mut Self {
        self.add_field(FieldSpec::new(field).label(label).rules(rules))
    }

    /// Register the handler for `callback_<name>` rules
    pub fn register_callback<F, R>(&mut self, name: impl Into<String>, callback: F) -> &mut Self
    where
        F: Fn(&Value, Option<&str>) -> R + Send + Sync + 'static,
        R: Into<RuleOutcome>,
    {
        self.callbacks.insert(
            name.into(),
            Arc::new(move |value, param| callback(value, param).into()),
        );
        self
    }

    /// Register a named rule outside the built-in catalog
    pub fn register_function<F, R>(&mut self, name: impl Into<String>, function: F) -> &mut Self
    where
        F: Fn(&Value, Option<&str>) -> R + Send + Sync + 'static,
        R: Into<RuleOutcome>,
    {
        self.functions.insert(
            name.into(),
            Arc::new(move |value, param| function(value, param).into()),
        );
        self
    }

    /// Engine-wide message for `rule`
    pub fn set_message(&mut self, rule: impl Into<String>, template: impl Into<String>) -> &mut Self {
        self.messages.insert(rule.into(), template.into());
        self
    }

    pub fn set_messages(&mut self, messages: HashMap<String, String>) -> &mut Self {
        self.messages.extend(messages);
        self
    }

    pub fn set_error_delimiters(
        &mut self,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
    ) -> &mut Self {
        self.options.error_prefix = prefix.into();
        self.options.error_suffix = suffix.into();
        self
    }

    /// Forget fields, errors and engine-wide messages
    pub fn reset(&mut self) -> &mut Self {
        self.schema.clear();
        self.errors.clear();
        self.messages.clear();
        self.unresolved.clear();
        self.safe_form_data = false;
        self
    }

    /// Replace the input
    pub fn set_data(&mut self, data: Value) -> &mut Self {
        self.data = data;
        self
    }

    /// Current input, including any written-back transforms
    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn into_data(self) -> Value {
        self.data
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Whether rules exist for `field`
    pub fn has_rule(&self, field: &str) -> bool {
        self.schema.contains(field)
    }

    /// Value bound to `field` by the last run
    pub fn field_value(&self, field: &str) -> Option<&Value> {
        self.schema.get(field)?.bound_value.as_ref()
    }

    /// Unwrapped error of `field` from the last run
    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.schema.get(field)?.error.as_deref()
    }

    /// Errors of the last run in first-failure order
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Run every field's rules.
    ///
    /// When no field was added, the rules of `group` are taken from the
    /// preloaded [`RuleConfig`]; with no rules at all the run fails.
    /// Returns `Ok(true)` when no field failed. In strict mode a rule name
    /// nothing resolves turns into [`EngineError::UnresolvedRule`] once all
    /// fields have been evaluated.
    pub fn validate(&mut self, group: Option<&str>) -> Result<bool> {
        if self.schema.is_empty() {
            self.schema.add_all(self.config.specs(group));
            if self.schema.is_empty() {
                debug!(target: TARGET, "No validation rules available");
                return Ok(false);
            }
        }

        self.errors.clear();
        self.unresolved.clear();
        self.safe_form_data = false;

        debug!(target: TARGET, { "fields" = self.schema.len() }, "Validation started");

        // Bind everything before executing so cross-field rules see bound values
        let data = &self.data;
        for descriptor in self.schema.iter_mut() {
            descriptor.reset();
            descriptor.bound_value = bind_field(data, descriptor);
        }

        for index in 0..self.schema.len() {
            self.execute(index);
        }

        let passed = self.errors.is_empty();
        if passed {
            self.write_back();
        } else {
            self.safe_form_data = true;
        }

        debug!(
            target: TARGET,
            { "passed" = passed, "errors" = self.errors.len() },
            "Validation finished"
        );

        match self.unresolved.first() {
            Some((field, rule)) => Err(EngineError::UnresolvedRule {
                field: field.clone(),
                rule: rule.clone(),
            }),
            None => Ok(passed),
        }
    }

    fn execute(&mut self, index: usize) {
        let descriptor = self.schema.at(index);
        let rules = schedule(&descriptor.rules);
        let cycles = match &descriptor.bound_value {
            Some(bound) if path::is_filled_container(bound) => Some(path::leaf_cycles(bound)),
            _ => None,
        };

        match cycles {
            Some(cycles) => {
                for cycle in &cycles {
                    self.run_rules(index, &rules, Some(cycle));
                }
            }
            None => self.run_rules(index, &rules, None),
        }
    }

    fn run_rules(&mut self, index: usize, rules: &[RuleSpec], cycle: Option<&[Cycle]>) {
        let empty_slot = self.is_empty_slot(index, cycle);

        for rule in rules {
            let candidate = self.candidate(index, cycle);
            if candidate.is_none() && !rule.is_callback() && !rule.is_presence_check() {
                // empty nested structures never satisfy a content rule
                if empty_slot && !rule.name().is_some_and(is_sanitizer) {
                    self.record_failure(index, rule, None);
                    return;
                }
                continue;
            }

            match self.dispatch(index, rule, candidate.as_ref()) {
                RuleOutcome::Pass => {}
                RuleOutcome::Replace(value) => self.store(index, cycle, value),
                RuleOutcome::Fail => {
                    self.record_failure(index, rule, candidate.as_ref());
                    return;
                }
            }
        }
    }

    /// Array field slot holding an empty array or object
    fn is_empty_slot(&self, index: usize, cycle: Option<&[Cycle]>) -> bool {
        let descriptor = self.schema.at(index);
        if !descriptor.is_array {
            return false;
        }
        let slot = match (descriptor.bound_value.as_ref(), cycle) {
            (Some(bound), Some(cycle)) => path::element(bound, cycle),
            (bound, None) => bound,
            (None, Some(_)) => None,
        };
        matches!(slot, Some(value) if value.is_array() || value.is_object())
    }

    /// Scalar currently bound at `cycle`; blanks and containers read as absent
    fn candidate(&self, index: usize, cycle: Option<&[Cycle]>) -> Option<Value> {
        let bound = self.schema.at(index).bound_value.as_ref()?;
        let value = match cycle {
            Some(cycle) => path::element(bound, cycle)?,
            None => bound,
        };
        match value {
            Value::Array(_) | Value::Object(_) => None,
            other if path::is_blank(Some(other)) => None,
            other => Some(other.clone()),
        }
    }

    fn store(&mut self, index: usize, cycle: Option<&[Cycle]>, value: Value) {
        let descriptor = self.schema.at_mut(index);
        match cycle {
            Some(cycle) => {
                if let Some(slot) = descriptor
                    .bound_value
                    .as_mut()
                    .and_then(|bound| path::element_mut(bound, cycle))
                {
                    *slot = value;
                }
            }
            None => descriptor.bound_value = Some(value),
        }
    }

    fn dispatch(&mut self, index: usize, rule: &RuleSpec, candidate: Option<&Value>) -> RuleOutcome {
        let null = Value::Null;
        let value = candidate.unwrap_or(&null);

        match rule {
            RuleSpec::MethodCallback { name, param } => match self.callbacks.get(name) {
                Some(callback) => callback(value, param.as_deref()),
                None => self.unresolved(index, &format!("{}{}", CALLBACK_PREFIX, name)),
            },
            RuleSpec::Callable { func, .. } => func(value),
            RuleSpec::Named { name, param } => {
                self.dispatch_named(index, name, param.as_deref(), candidate)
            }
        }
    }

    fn dispatch_named(
        &mut self,
        index: usize,
        name: &str,
        param: Option<&str>,
        candidate: Option<&Value>,
    ) -> RuleOutcome {
        let text = candidate.and_then(path::scalar_text);

        match name {
            "required" => validators::required(text.as_deref().unwrap_or_default()).into(),
            "isset" => candidate.is_some().into(),
            "matches" => self.matches(candidate, param).into(),
            "prep_for_form" => match candidate {
                Some(value) => RuleOutcome::Replace(self.prep_for_form(value)),
                None => RuleOutcome::Pass,
            },
            _ => {
                let text = text.unwrap_or_default();
                if let Some(outcome) = validators::evaluate(name, &text, param) {
                    return outcome;
                }
                if let Some(function) = self.functions.get(name) {
                    let null = Value::Null;
                    return function(candidate.unwrap_or(&null), param);
                }
                if let Some(output) = sanitize::transform(name, &text) {
                    return output.into();
                }
                self.unresolved(index, name)
            }
        }
    }

    /// Compare against the other field's bound value, not its raw input
    fn matches(&self, candidate: Option<&Value>, other: Option<&str>) -> bool {
        let Some(other) = other.and_then(|field| self.schema.get(field)) else {
            return false;
        };
        match (candidate, other.bound_value.as_ref()) {
            (Some(value), Some(expected)) => value == expected,
            _ => false,
        }
    }

    fn unresolved(&mut self, index: usize, rule: &str) -> RuleOutcome {
        let field = &self.schema.at(index).field;
        warn!(
            target: TARGET,
            { "field" = field, "rule" = rule },
            "Unable to find validation rule"
        );
        if self.options.strict_rules {
            self.unresolved.push((field.clone(), rule.to_string()));
        }
        RuleOutcome::Fail
    }

    fn record_failure(&mut self, index: usize, rule: &RuleSpec, candidate: Option<&Value>) {
        let lines = self.lines.as_ref();
        let descriptor = self.schema.at(index);
        let rule_name = rule.name().unwrap_or(ANONYMOUS_RULE).to_string();

        let template = messages::resolve(&rule_name, &descriptor.errors, &self.messages, lines);
        let param = match rule.param() {
            Some(param) => match self.schema.get(param) {
                Some(other) => messages::translate_label(&other.label, lines),
                None => param.to_string(),
            },
            None => String::new(),
        };
        let label = messages::translate_label(&descriptor.label, lines);
        let message = messages::render(&template, &label, &param);
        let field = descriptor.field.clone();

        debug!(
            target: TARGET,
            { "field" = field, "rule" = rule_name },
            "Rule failed"
        );

        let descriptor = self.schema.at_mut(index);
        if descriptor.error.is_none() {
            descriptor.error = Some(message.clone());
        }

        let mut error = ValidationError::new(field, message).with_rule(rule_name);
        if let Some(text) = candidate.and_then(path::scalar_text) {
            error = error.with_value(text);
        }
        self.errors.add(error);
    }

    fn write_back(&mut self) {
        for descriptor in self.schema.iter() {
            let Some(value) = &descriptor.bound_value else {
                continue;
            };
            let present = path::lookup(&self.data, &descriptor.key_segments)
                .is_some_and(|v| !v.is_null());
            if descriptor.is_array || present {
                path::write(&mut self.data, &descriptor.key_segments, value.clone());
            }
        }
    }

    /// All messages, each wrapped in the delimiters and ending in a newline.
    ///
    /// `None` delimiters fall back to the configured ones.
    pub fn error_string(&self, prefix: Option<&str>, suffix: Option<&str>) -> String {
        let prefix = prefix.unwrap_or(self.options.error_prefix.as_str());
        let suffix = suffix.unwrap_or(self.options.error_suffix.as_str());

        self.errors
            .iter()
            .filter(|e| !e.message.is_empty())
            .map(|e| format!("{}{}{}\n", prefix, e.message, suffix))
            .collect()
    }

    /// Wrapped message of `field`, or an empty string
    pub fn error_for(&self, field: &str, prefix: Option<&str>, suffix: Option<&str>) -> String {
        match self.field_error(field) {
            Some(message) if !message.is_empty() => format!(
                "{}{}{}",
                prefix.unwrap_or(self.options.error_prefix.as_str()),
                message,
                suffix.unwrap_or(self.options.error_suffix.as_str())
            ),
            _ => String::new(),
        }
    }

    /// Apply pipe-delimited transforms to the input value of `field`.
    ///
    /// Each step may carry a parameter (`do_hash[sha512]`) which takes
    /// precedence over `aux`. Returns `Ok(None)` when there is nothing to
    /// sanitize. A step no sanitizer provides is a configuration error.
    pub fn sanitize(&self, field: &str, transforms: &str, aux: Option<&str>) -> Result<Option<String>> {
        if field.is_empty() || transforms.is_empty() {
            return Ok(None);
        }

        let steps: Vec<(String, Option<String>)> =
            split_rules(transforms).iter().map(|t| split_param(t)).collect();
        if let Some((name, _)) = steps.iter().find(|(name, _)| !is_sanitizer(name)) {
            error!(
                target: TARGET,
                { "field" = field, "transform" = name },
                "Unknown sanitization transform"
            );
            return Err(EngineError::UnknownTransform(name.clone()));
        }

        let path = FieldPath::parse(field);
        let Some(value) = path::lookup(&self.data, &path.segments) else {
            return Ok(None);
        };

        let mut text = path::scalar_text(value).unwrap_or_default();
        for (name, param) in &steps {
            text = self.apply_sanitizer(name, &text, param.as_deref().or(aux))?;
        }
        Ok(Some(text))
    }

    fn apply_sanitizer(&self, name: &str, value: &str, param: Option<&str>) -> Result<String> {
        Ok(match name {
            "encode_php_tags" => sanitize::encode_php_tags(value),
            "prep_url" => sanitize::prep_url(value),
            "prep_for_form" => match self.prep_for_form(&Value::String(value.to_string())) {
                Value::String(s) => s,
                _ => value.to_string(),
            },
            "do_hash" => sanitize::do_hash(value, param.unwrap_or(DEFAULT_HASH)),
            "prevent_sql_injection" => self.prevent_sql_injection(value)?,
            _ => sanitize::transform(name, value)
                .ok_or_else(|| EngineError::UnknownTransform(name.to_string()))?,
        })
    }

    /// Escape a value through the configured [`Escaper`]
    pub fn prevent_sql_injection(&self, value: &str) -> Result<String> {
        self.escaper.escape(value)
    }

    /// Escape values for redisplay in a form.
    ///
    /// Only active after a run that produced errors; otherwise the value is
    /// returned unchanged. Nested structures are escaped element-wise.
    pub fn prep_for_form(&self, value: &Value) -> Value {
        if !self.safe_form_data || path::is_blank(Some(value)) {
            return value.clone();
        }
        match value {
            Value::Array(items) => Value::Array(items.iter().map(|v| self.prep_for_form(v)).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.prep_for_form(v)))
                    .collect(),
            ),
            Value::String(s) => Value::String(sanitize::prep_for_form(s)),
            other => other.clone(),
        }
    }
}

impl fmt::Debug for FormValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut callbacks: Vec<&String> = self.callbacks.keys().collect();
        callbacks.sort();
        let mut functions: Vec<&String> = self.functions.keys().collect();
        functions.sort();

        f.debug_struct("FormValidator")
            .field("data", &self.data)
            .field("schema", &self.schema)
            .field("errors", &self.errors)
            .field("messages", &self.messages)
            .field("callbacks", &callbacks)
            .field("functions", &functions)
            .field("options", &self.options)
            .field("safe_form_data", &self.safe_form_data)
            .finish_non_exhaustive()
    }
}

fn bind_field(data: &Value, descriptor: &FieldDescriptor) -> Option<Value> {
    let bound = path::bind(data, &descriptor.key_segments)?;
    // A plain field posted as an array is treated as empty
    if !descriptor.is_array && matches!(bound, Value::Array(_) | Value::Object(_)) {
        return None;
    }
    Some(bound)
}

/// Whether `name` can be used as a [`FormValidator::sanitize`] step
pub fn is_sanitizer(name: &str) -> bool {
    ENGINE_SANITIZERS.contains(&name) || sanitize::is_transform(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator(data: Value, specs: Vec<FieldSpec>) -> FormValidator {
        let mut v = FormValidator::new(data);
        v.add_fields(specs);
        v
    }

    #[test]
    fn test_empty_optional_field_passes() {
        let mut v = validator(
            json!({"nick": ""}),
            vec![FieldSpec::new("nick").rules("alpha|min_length[3]")],
        );
        assert!(v.validate(None).unwrap());
        assert!(v.errors().is_empty());
    }

    #[test]
    fn test_required_runs_first() {
        let mut v = validator(
            json!({"age": ""}),
            vec![FieldSpec::new("age").rules("integer|greater_than[17]|required")],
        );
        assert!(!v.validate(None).unwrap());
        assert_eq!(v.errors().get_error("age").unwrap().rule, "required");
        assert_eq!(v.field_error("age"), Some("The age field is required."));
    }

    #[test]
    fn test_callbacks_run_before_required() {
        let mut v = validator(
            json!({}),
            vec![FieldSpec::new("code").rules("required|callback_always_fails")],
        );
        v.register_callback("always_fails", |_, _| false);
        v.set_message("always_fails", "{field} rejected by callback");

        assert!(!v.validate(None).unwrap());
        assert_eq!(v.errors().get("code"), Some("code rejected by callback"));
    }

    #[test]
    fn test_missing_callback_fails_closed() {
        let mut v = validator(
            json!({"x": "1"}),
            vec![FieldSpec::new("x").rules("callback_nobody")],
        );
        assert!(!v.validate(None).unwrap());
        assert_eq!(v.errors().get_error("x").unwrap().rule, "nobody");
    }

    #[test]
    fn test_strict_mode_reports_unresolved_rule() {
        let mut v = validator(
            json!({"a": "x", "b": ""}),
            vec![
                FieldSpec::new("a").rules("no_such_rule"),
                FieldSpec::new("b").rules("required"),
            ],
        )
        .with_options(EngineOptions::default().strict(true));

        let err = v.validate(None).unwrap_err();
        assert!(matches!(
            err,
            EngineError::UnresolvedRule { ref field, ref rule } if field == "a" && rule == "no_such_rule"
        ));
        // other fields were still evaluated
        assert!(v.errors().contains("b"));
    }

    #[test]
    fn test_transform_rules_replace_values() {
        let mut v = validator(
            json!({"name": "  ada  "}),
            vec![FieldSpec::new("name").rules("trim|ucfirst|min_length[3]")],
        );
        assert!(v.validate(None).unwrap());
        assert_eq!(v.field_value("name"), Some(&json!("Ada")));
        assert_eq!(v.data()["name"], json!("Ada"));
    }

    #[test]
    fn test_no_write_back_on_failure() {
        let mut v = validator(
            json!({"name": " ada ", "age": "x"}),
            vec![
                FieldSpec::new("name").rules("trim"),
                FieldSpec::new("age").rules("integer"),
            ],
        );
        assert!(!v.validate(None).unwrap());
        assert_eq!(v.data()["name"], json!(" ada "));
    }

    #[test]
    fn test_matches_uses_bound_value() {
        let mut v = validator(
            json!({"pw": " secret ", "pw2": "secret"}),
            vec![
                FieldSpec::new("pw").rules("trim|required"),
                FieldSpec::new("pw2").rules("matches[pw]"),
            ],
        );
        assert!(v.validate(None).unwrap());
    }

    #[test]
    fn test_param_naming_field_uses_its_label() {
        let mut v = validator(
            json!({"pw": "x", "pw2": "y"}),
            vec![
                FieldSpec::new("pw").label("Password").rules("required"),
                FieldSpec::new("pw2").label("Confirm").rules("matches[pw]"),
            ],
        );
        assert!(!v.validate(None).unwrap());
        assert_eq!(
            v.errors().get("pw2"),
            Some("The Confirm field does not match the Password field.")
        );
    }

    #[test]
    fn test_array_field_checks_every_element() {
        let mut v = validator(
            json!({"tags": ["ok1", "bad!", "fine"]}),
            vec![FieldSpec::new("tags[]").rules("alpha_numeric")],
        );
        assert!(!v.validate(None).unwrap());
        assert_eq!(v.errors().len(), 1);
        assert_eq!(v.errors().get_error("tags[]").unwrap().value.as_deref(), Some("bad!"));
    }

    #[test]
    fn test_empty_array_fails_required() {
        let mut v = validator(json!({"tags": []}), vec![FieldSpec::new("tags[]").rules("required")]);
        assert!(!v.validate(None).unwrap());
    }

    #[test]
    fn test_empty_array_fails_content_rules() {
        let mut v = validator(json!({"tags": []}), vec![FieldSpec::new("tags[]").rules("trim|alpha_numeric")]);
        assert!(!v.validate(None).unwrap());
        assert_eq!(v.errors().get_error("tags[]").unwrap().rule, "alpha_numeric");
        assert_eq!(v.data()["tags"], json!([]));

        let mut v = validator(
            json!({"tags": [[], "ok"]}),
            vec![FieldSpec::new("tags[]").rules("alpha_numeric")],
        );
        assert!(!v.validate(None).unwrap());
        assert!(v.errors().contains("tags[]"));
    }

    #[test]
    fn test_empty_string_element_skips_content_rules() {
        let mut v = validator(
            json!({"tags": ["", "ok"]}),
            vec![FieldSpec::new("tags[]").rules("alpha_numeric")],
        );
        assert!(v.validate(None).unwrap());
    }

    #[test]
    fn test_array_elements_transform_in_place() {
        let mut v = validator(
            json!({"user": {"emails": [" A@x.io ", "b@x.io"]}}),
            vec![FieldSpec::new("user[emails][]").rules("trim|lower|valid_email")],
        );
        assert!(v.validate(None).unwrap());
        assert_eq!(v.data()["user"]["emails"], json!(["a@x.io", "b@x.io"]));
    }

    #[test]
    fn test_registered_function_and_anonymous_callable() {
        let mut v = validator(
            json!({"even": "3", "any": "x"}),
            vec![
                FieldSpec::new("even").rules("is_even"),
                FieldSpec::new("any").rule(RuleSpec::callable(|_: &Value| false)),
            ],
        );
        v.register_function("is_even", |value: &Value, _: Option<&str>| {
            path::scalar_text(value)
                .and_then(|t| t.parse::<i64>().ok())
                .is_some_and(|n| n % 2 == 0)
        });

        assert!(!v.validate(None).unwrap());
        assert_eq!(v.errors().get_error("even").unwrap().rule, "is_even");
        assert_eq!(v.errors().get_error("any").unwrap().rule, ANONYMOUS_RULE);
    }

    #[test]
    fn test_named_callable_message() {
        let mut v = validator(
            json!({"n": "5"}),
            vec![FieldSpec::new("n")
                .rule(RuleSpec::named_callable("too_small", |_: &Value| false))
                .error("too_small", "{field} is too small")],
        );
        assert!(!v.validate(None).unwrap());
        assert_eq!(v.errors().get("n"), Some("n is too small"));
    }

    #[test]
    fn test_validate_from_config_group() {
        let config = RuleConfig::group("login", vec![FieldSpec::new("user").rules("required")]);
        let mut v = FormValidator::new(json!({"user": "bob"})).with_config(config);
        assert!(v.validate(Some("login")).unwrap());
        assert!(v.has_rule("user"));

        let mut empty = FormValidator::new(json!({}));
        assert!(!empty.validate(Some("nothing")).unwrap());
    }

    #[test]
    fn test_error_string_and_delimiters() {
        let mut v = validator(
            json!({}),
            vec![
                FieldSpec::new("a").rules("required"),
                FieldSpec::new("b").rules("required"),
            ],
        );
        v.validate(None).unwrap();
        assert_eq!(
            v.error_string(None, None),
            "<p>The a field is required.</p>\n<p>The b field is required.</p>\n"
        );

        v.set_error_delimiters("<li>", "</li>");
        assert_eq!(v.error_for("a", None, None), "<li>The a field is required.</li>");
        assert_eq!(v.error_for("a", Some("["), Some("]")), "[The a field is required.]");
        assert_eq!(v.error_for("zzz", None, None), "");
    }

    #[test]
    fn test_reset_clears_state() {
        let mut v = validator(json!({}), vec![FieldSpec::new("a").rules("required")]);
        v.set_message("required", "x");
        v.validate(None).unwrap();
        v.reset();
        assert!(!v.has_rule("a"));
        assert!(v.errors().is_empty());
        assert_eq!(v.error_string(None, None), "");
    }

    #[test]
    fn test_sanitize_pipeline() {
        let v = FormValidator::new(json!({"name": " bob ", "page": "example.com"}));
        assert_eq!(v.sanitize("name", "trim|upper", None).unwrap(), Some("Bob".into()));
        assert_eq!(
            v.sanitize("page", "prep_url", None).unwrap(),
            Some("http://example.com".into())
        );
        assert_eq!(v.sanitize("missing", "trim", None).unwrap(), None);
        assert_eq!(v.sanitize("name", "", None).unwrap(), None);
    }

    #[test]
    fn test_sanitize_unknown_transform_is_fatal() {
        let v = FormValidator::new(json!({"name": "bob"}));
        let err = v.sanitize("name", "trim|rot13", None).unwrap_err();
        assert!(matches!(err, EngineError::UnknownTransform(ref n) if n == "rot13"));
    }

    #[test]
    fn test_sanitize_hash_param_and_aux() {
        let v = FormValidator::new(json!({"pw": "abc"}));
        let by_param = v.sanitize("pw", "do_hash[sha512]", Some("sha224")).unwrap().unwrap();
        let by_aux = v.sanitize("pw", "do_hash", Some("sha224")).unwrap().unwrap();
        assert_eq!(by_param.len(), 128);
        assert_eq!(by_aux.len(), 56);

        let plain = v.sanitize("pw", "do_hash", None).unwrap().unwrap();
        assert_eq!(plain, "a9993e364706816aba3e25717850c26c9cd0d89d");
        let unknown = v.sanitize("pw", "do_hash[crc99]", None).unwrap().unwrap();
        assert_eq!(unknown, "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn test_prevent_sql_injection_uses_escaper() {
        let v = FormValidator::new(json!({"q": " 'x' "}))
            .with_escaper(|value: &str| -> Result<String> { Ok(value.trim().replace('\'', "''")) });
        assert_eq!(
            v.sanitize("q", "prevent_sql_injection", None).unwrap(),
            Some("''x''".into())
        );
    }

    #[test]
    fn test_prep_for_form_only_after_errors() {
        let mut v = validator(json!({"a": ""}), vec![FieldSpec::new("a").rules("required")]);
        let raw = json!(["<b>", {"k": "\"q\""}]);
        assert_eq!(v.prep_for_form(&raw), raw);

        v.validate(None).unwrap();
        assert_eq!(
            v.prep_for_form(&raw),
            json!(["&lt;b&gt;", {"k": "&quot;q&quot;"}])
        );
    }

    #[test]
    fn test_lang_labels() {
        let lines = LanguageLines::english().with("email_label", "E-mail");
        let mut v = validator(
            json!({"email": "nope"}),
            vec![FieldSpec::new("email").label("lang:email_label").rules("valid_email")],
        )
        .with_lines(lines);
        v.validate(None).unwrap();
        assert_eq!(
            v.errors().get("email"),
            Some("The E-mail field must contain a valid email address.")
        );
    }

    #[test]
    fn test_scalar_field_given_array_counts_as_empty() {
        let mut v = validator(
            json!({"name": ["a", "b"]}),
            vec![FieldSpec::new("name").rules("required")],
        );
        assert!(!v.validate(None).unwrap());
    }
}
