//! Field paths and nested value access.
//!
//! A field path is either a plain key (`email`) or a leading key with a
//! bracketed suffix (`user[address][city]`, `tags[]`). Values are bound
//! from, and written back into, a nested `serde_json::Value`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;

static BRACKET_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(.*?)\]").unwrap());

/// Parsed form of a field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    /// Whether the path used the bracketed suffix grammar
    pub is_array: bool,
    /// Keys to walk, leading key first; `[]` tokens are dropped
    pub segments: Vec<String>,
}

impl FieldPath {
    /// Parse `parent[child][]` into `["parent", "child"]`.
    pub fn parse(field: &str) -> Self {
        if !BRACKET_REGEX.is_match(field) {
            return Self {
                is_array: false,
                segments: vec![field.to_string()],
            };
        }

        let mut segments = Vec::new();
        let leading = field.split('[').next().unwrap_or_default();
        if !leading.is_empty() {
            segments.push(leading.to_string());
        }
        segments.extend(
            BRACKET_REGEX
                .captures_iter(field)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str())
                .filter(|token| !token.is_empty())
                .map(str::to_string),
        );

        Self {
            is_array: true,
            segments,
        }
    }
}

/// Key of one element visited while recursing over an array-valued field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cycle {
    Index(usize),
    Key(String),
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cycle::Index(i) => write!(f, "{}", i),
            Cycle::Key(k) => write!(f, "{}", k),
        }
    }
}

fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Value stored at `segments`, exactly as it appears in `input`
pub fn lookup<'a>(input: &'a Value, segments: &[String]) -> Option<&'a Value> {
    let mut current = input;
    for segment in segments {
        current = child(current, segment)?;
    }
    Some(current)
}

/// Walk `segments` into `input`.
///
/// Returns `None` when any segment is missing. An empty string at the end
/// of the walk also yields `None`, so blank inputs read as "not provided".
pub fn bind(input: &Value, segments: &[String]) -> Option<Value> {
    match lookup(input, segments)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        other => Some(other.clone()),
    }
}

fn promote_to_object(value: &mut Value) {
    let map = match std::mem::take(value) {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        Value::Object(map) => map,
        _ => Map::new(),
    };
    *value = Value::Object(map);
}

fn child_mut<'a>(value: &'a mut Value, segment: &str) -> &'a mut Value {
    let index = segment.parse::<usize>().ok();
    let fits_array = matches!(
        (&*value, index),
        (Value::Array(items), Some(i)) if i <= items.len()
    );
    if !fits_array {
        promote_to_object(value);
    }

    match value {
        Value::Array(items) => {
            let i = index.unwrap_or_default();
            if i == items.len() {
                items.push(Value::Null);
            }
            &mut items[i]
        }
        Value::Object(map) => map.entry(segment.to_string()).or_insert(Value::Null),
        // promote_to_object leaves nothing else behind
        other => other,
    }
}

/// Store `value` at `segments`, creating intermediate containers and
/// replacing scalars that sit in the way.
pub fn write(input: &mut Value, segments: &[String], value: Value) {
    let mut current = input;
    for segment in segments {
        current = child_mut(current, segment);
    }
    *current = value;
}

/// Owned variant of [`write`].
pub fn written(mut input: Value, segments: &[String], value: Value) -> Value {
    write(&mut input, segments, value);
    input
}

/// Element of a nested bound value
pub fn element<'a>(value: &'a Value, cycles: &[Cycle]) -> Option<&'a Value> {
    let mut current = value;
    for cycle in cycles {
        current = match (current, cycle) {
            (Value::Array(items), Cycle::Index(i)) => items.get(*i)?,
            (Value::Object(map), Cycle::Key(k)) => map.get(k)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Mutable element of a nested bound value
pub fn element_mut<'a>(value: &'a mut Value, cycles: &[Cycle]) -> Option<&'a mut Value> {
    let mut current = value;
    for cycle in cycles {
        current = match (current, cycle) {
            (Value::Array(items), Cycle::Index(i)) => items.get_mut(*i)?,
            (Value::Object(map), Cycle::Key(k)) => map.get_mut(k)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Whether `value` is an array or object with at least one entry
pub fn is_filled_container(value: &Value) -> bool {
    match value {
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => false,
    }
}

/// Leaf element keys of a nested value, depth first.
///
/// Filled containers are descended into; everything else, including empty
/// containers, is a leaf.
pub fn leaf_cycles(value: &Value) -> Vec<Vec<Cycle>> {
    fn walk(value: &Value, prefix: &mut Vec<Cycle>, out: &mut Vec<Vec<Cycle>>) {
        let children: Vec<(Cycle, &Value)> = match value {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (Cycle::Index(i), v))
                .collect(),
            Value::Object(map) => map.iter().map(|(k, v)| (Cycle::Key(k.clone()), v)).collect(),
            _ => Vec::new(),
        };
        for (key, child) in children {
            prefix.push(key);
            if is_filled_container(child) {
                walk(child, prefix, out);
            } else {
                out.push(prefix.clone());
            }
            prefix.pop();
        }
    }

    let mut out = Vec::new();
    walk(value, &mut Vec::new(), &mut out);
    out
}

/// Scalar rendered as rule input text.
///
/// Booleans follow form conventions: `true` is `"1"`, `false` is empty.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) => Some(String::new()),
        _ => None,
    }
}

/// `None`, null and the empty string count as "no input"
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        _ => false,
    }
}
