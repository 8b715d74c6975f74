// Field specifications and descriptors

use crate::path::FieldPath;
use crate::rules::{RuleSpec, parse_rules};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;

/// Declarative rules for one field, as written by callers or loaded from
/// rule configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldSpec {
    /// Field path, e.g. `email` or `user[address][city]`
    pub field: String,

    /// Human label; the field path is used when empty
    #[serde(default)]
    pub label: Option<String>,

    /// Rules, from a pipe-delimited string or a list of rule strings
    #[serde(default, deserialize_with = "deserialize_rules")]
    pub rules: Vec<RuleSpec>,

    /// Inline message templates keyed by rule name
    #[serde(default)]
    pub errors: HashMap<String, String>,
}

impl FieldSpec {
    /// Spec for `field` with no rules yet
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ..Self::default()
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Append rules from a pipe-delimited string
    pub fn rules(mut self, rules: &str) -> Self {
        self.rules.extend(parse_rules(rules));
        self
    }

    /// Append a single rule
    pub fn rule(mut self, rule: impl Into<RuleSpec>) -> Self {
        self.rules.push(rule.into());
        self
    }

    /// Inline message for one rule of this field
    pub fn error(mut self, rule: impl Into<String>, template: impl Into<String>) -> Self {
        self.errors.insert(rule.into(), template.into());
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRules {
    Piped(String),
    Listed(Vec<String>),
}

fn deserialize_rules<'de, D>(deserializer: D) -> Result<Vec<RuleSpec>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawRules::deserialize(deserializer)? {
        RawRules::Piped(rules) => parse_rules(&rules),
        RawRules::Listed(rules) => rules
            .iter()
            .filter(|r| !r.is_empty())
            .map(|r| RuleSpec::parse(r))
            .collect(),
    })
}

/// Per-field validation state for one run
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub field: String,
    pub label: String,
    pub rules: Vec<RuleSpec>,
    pub errors: HashMap<String, String>,
    /// Whether the field path used bracket syntax
    pub is_array: bool,
    /// Keys walked to bind the value
    pub key_segments: Vec<String>,
    /// Current value, possibly transformed by earlier rules
    pub bound_value: Option<Value>,
    /// First rendered failure of the current run
    pub error: Option<String>,
}

impl FieldDescriptor {
    fn from_spec(spec: FieldSpec) -> Self {
        let path = FieldPath::parse(&spec.field);
        let label = match spec.label {
            Some(label) if !label.is_empty() => label,
            _ => spec.field.clone(),
        };
        Self {
            field: spec.field,
            label,
            rules: spec.rules,
            errors: spec.errors,
            is_array: path.is_array,
            key_segments: path.segments,
            bound_value: None,
            error: None,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.bound_value = None;
        self.error = None;
    }
}

/// Ordered set of field descriptors, unique by field path
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldDescriptor>,
    index: HashMap<String, usize>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the descriptor for `spec.field`.
    ///
    /// Specs without a field name or without rules are ignored; returns
    /// whether a descriptor was stored.
    pub fn add(&mut self, spec: FieldSpec) -> bool {
        if spec.field.is_empty() || spec.rules.is_empty() {
            return false;
        }

        let descriptor = FieldDescriptor::from_spec(spec);
        match self.index.get(&descriptor.field) {
            Some(&i) => self.fields[i] = descriptor,
            None => {
                self.index.insert(descriptor.field.clone(), self.fields.len());
                self.fields.push(descriptor);
            }
        }
        true
    }

    /// Add every usable spec, returning how many were stored
    pub fn add_all(&mut self, specs: impl IntoIterator<Item = FieldSpec>) -> usize {
        let mut added = 0;
        for spec in specs {
            if self.add(spec) {
                added += 1;
            }
        }
        added
    }

    pub fn get(&self, field: &str) -> Option<&FieldDescriptor> {
        self.index.get(field).map(|&i| &self.fields[i])
    }

    pub fn contains(&self, field: &str) -> bool {
        self.index.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }

    pub fn clear(&mut self) {
        self.fields.clear();
        self.index.clear();
    }

    pub(crate) fn at(&self, i: usize) -> &FieldDescriptor {
        &self.fields[i]
    }

    pub(crate) fn at_mut(&mut self, i: usize) -> &mut FieldDescriptor {
        &mut self.fields[i]
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut FieldDescriptor> {
        self.fields.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_defaults_to_field() {
        let mut schema = Schema::new();
        assert!(schema.add(FieldSpec::new("age").label("").rules("required")));
        assert_eq!(schema.get("age").unwrap().label, "age");
    }

    #[test]
    fn test_empty_rules_or_name_is_noop() {
        let mut schema = Schema::new();
        schema.add(FieldSpec::new("name").rules("required"));

        assert!(!schema.add(FieldSpec::new("name")));
        assert!(!schema.add(FieldSpec::new("").rules("required")));
        assert_eq!(schema.len(), 1);
        assert_eq!(schema.get("name").unwrap().rules.len(), 1);
    }

    #[test]
    fn test_readding_overwrites_in_place() {
        let mut schema = Schema::new();
        schema.add(FieldSpec::new("a").rules("required"));
        schema.add(FieldSpec::new("b").rules("required"));
        schema.add(FieldSpec::new("a").label("A").rules("alpha|min_length[2]"));

        let fields: Vec<&str> = schema.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(fields, vec!["a", "b"]);
        assert_eq!(schema.get("a").unwrap().label, "A");
        assert_eq!(schema.get("a").unwrap().rules.len(), 2);
    }

    #[test]
    fn test_bracketed_field_descriptor() {
        let mut schema = Schema::new();
        schema.add(FieldSpec::new("user[emails][]").rules("valid_email"));
        let descriptor = schema.get("user[emails][]").unwrap();
        assert!(descriptor.is_array);
        assert_eq!(descriptor.key_segments, vec!["user", "emails"]);
    }

    #[test]
    fn test_deserialize_specs() {
        let specs: Vec<FieldSpec> = serde_json::from_str(
            r#"[
                {"field": "pw", "label": "Password", "rules": "required|min_length[8]"},
                {"field": "tags[]", "rules": ["alpha", "in_list[a|b]"], "errors": {"alpha": "Letters only"}},
                {"field": "skipped"}
            ]"#,
        )
        .unwrap();

        assert_eq!(specs[0].rules.len(), 2);
        assert_eq!(specs[1].rules[1].param(), Some("a|b"));
        assert_eq!(specs[1].errors["alpha"], "Letters only");

        let mut schema = Schema::new();
        assert_eq!(schema.add_all(specs), 2);
        assert!(!schema.contains("skipped"));
    }
}
