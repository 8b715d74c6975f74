// Rule specifications and rule-string parsing

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Prefix marking a rule as a named engine callback
pub const CALLBACK_PREFIX: &str = "callback_";

/// Rules evaluated even when the candidate value is empty
pub const PRESENCE_RULES: [&str; 3] = ["required", "isset", "matches"];

/// Result of evaluating one rule
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    /// Passed, value unchanged
    Pass,
    /// Failed, value unchanged
    Fail,
    /// Passed, value replaced by the rule's output
    Replace(Value),
}

impl From<bool> for RuleOutcome {
    fn from(passed: bool) -> Self {
        if passed {
            RuleOutcome::Pass
        } else {
            RuleOutcome::Fail
        }
    }
}

impl From<String> for RuleOutcome {
    fn from(value: String) -> Self {
        RuleOutcome::Replace(Value::String(value))
    }
}

/// Callable rule taking only the candidate value
pub type RuleFn = Arc<dyn Fn(&Value) -> RuleOutcome + Send + Sync>;

/// Callback or external function taking the candidate and the rule parameter
pub type ParamRuleFn = Arc<dyn Fn(&Value, Option<&str>) -> RuleOutcome + Send + Sync>;

/// One entry of a field's rule list
#[derive(Clone)]
pub enum RuleSpec {
    /// Catalog rule or external function, e.g. `max_length[8]`
    Named { name: String, param: Option<String> },
    /// `callback_<name>[param]`, dispatched to a registered engine callback
    MethodCallback { name: String, param: Option<String> },
    /// Ad-hoc callable, optionally named for error message lookup
    Callable { func: RuleFn, name: Option<String> },
}

impl RuleSpec {
    /// Parse one rule token such as `required`, `in_list[a,b]` or
    /// `callback_unique_email`.
    pub fn parse(rule: &str) -> Self {
        let (name, param) = split_param(rule);
        match name.strip_prefix(CALLBACK_PREFIX) {
            Some(callback) => RuleSpec::MethodCallback {
                name: callback.to_string(),
                param,
            },
            None => RuleSpec::Named { name, param },
        }
    }

    /// Anonymous callable rule
    pub fn callable<F, R>(func: F) -> Self
    where
        F: Fn(&Value) -> R + Send + Sync + 'static,
        R: Into<RuleOutcome>,
    {
        RuleSpec::Callable {
            func: Arc::new(move |value| func(value).into()),
            name: None,
        }
    }

    /// Callable rule whose name is used for error message lookup
    pub fn named_callable<F, R>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value) -> R + Send + Sync + 'static,
        R: Into<RuleOutcome>,
    {
        RuleSpec::Callable {
            func: Arc::new(move |value| func(value).into()),
            name: Some(name.into()),
        }
    }

    /// Rule name used for dispatch and message lookup
    pub fn name(&self) -> Option<&str> {
        match self {
            RuleSpec::Named { name, .. } | RuleSpec::MethodCallback { name, .. } => Some(name),
            RuleSpec::Callable { name, .. } => name.as_deref(),
        }
    }

    pub fn param(&self) -> Option<&str> {
        match self {
            RuleSpec::Named { param, .. } | RuleSpec::MethodCallback { param, .. } => {
                param.as_deref()
            }
            RuleSpec::Callable { .. } => None,
        }
    }

    /// Callbacks and callables always run, even against empty input
    pub fn is_callback(&self) -> bool {
        !matches!(self, RuleSpec::Named { .. })
    }

    /// Exactly the bare named rule `name`, without a parameter
    pub fn is_bare(&self, rule: &str) -> bool {
        matches!(self, RuleSpec::Named { name, param: None } if name == rule)
    }

    /// `required`, `isset` and `matches` test presence or equality and
    /// therefore run against empty input
    pub fn is_presence_check(&self) -> bool {
        matches!(self, RuleSpec::Named { name, .. } if PRESENCE_RULES.contains(&name.as_str()))
    }
}

impl fmt::Debug for RuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSpec::Named { name, param } => f
                .debug_struct("Named")
                .field("name", name)
                .field("param", param)
                .finish(),
            RuleSpec::MethodCallback { name, param } => f
                .debug_struct("MethodCallback")
                .field("name", name)
                .field("param", param)
                .finish(),
            RuleSpec::Callable { name, .. } => f
                .debug_struct("Callable")
                .field("name", name)
                .finish_non_exhaustive(),
        }
    }
}

impl fmt::Display for RuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSpec::Named { name, param: None } => write!(f, "{}", name),
            RuleSpec::Named {
                name,
                param: Some(p),
            } => write!(f, "{}[{}]", name, p),
            RuleSpec::MethodCallback { name, param: None } => {
                write!(f, "{}{}", CALLBACK_PREFIX, name)
            }
            RuleSpec::MethodCallback {
                name,
                param: Some(p),
            } => write!(f, "{}{}[{}]", CALLBACK_PREFIX, name, p),
            RuleSpec::Callable { name, .. } => {
                write!(f, "{}", name.as_deref().unwrap_or("<callable>"))
            }
        }
    }
}

impl From<&str> for RuleSpec {
    fn from(rule: &str) -> Self {
        RuleSpec::parse(rule)
    }
}

/// Split `name[param]` into its parts.
///
/// The parameter runs from the first `[` to the last `]`, so parameters may
/// themselves contain brackets.
pub fn split_param(rule: &str) -> (String, Option<String>) {
    if let (Some(open), Some(close)) = (rule.find('['), rule.rfind(']')) {
        if close > open {
            return (
                rule[..open].to_string(),
                Some(rule[open + 1..close].to_string()),
            );
        }
    }
    (rule.to_string(), None)
}

/// Split a pipe-delimited rule string, ignoring pipes inside brackets.
///
/// `"required|in_list[a|b]"` yields `["required", "in_list[a|b]"]`.
pub fn split_rules(rules: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for c in rules.chars() {
        match c {
            '[' => {
                depth += 1;
                current.push(c);
            }
            ']' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            '|' if depth == 0 => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);

    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

/// Parse a pipe-delimited rule string into rule specs
pub fn parse_rules(rules: &str) -> Vec<RuleSpec> {
    split_rules(rules).iter().map(|r| RuleSpec::parse(r)).collect()
}
