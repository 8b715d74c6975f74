// Built-in rule catalog

use crate::RuleOutcome;
use crate::sanitize;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$").unwrap()
});

static SCHEME_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:([^:]*):)?//(.+)$").unwrap());

static ALPHA_NUMERIC_SPACES_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9 ]+$").unwrap());

static ALPHA_DASH_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

static NUMERIC_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-+]?[0-9]*\.?[0-9]+$").unwrap());

static INTEGER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-+]?[0-9]+$").unwrap());

static DECIMAL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-+]?[0-9]+\.[0-9]+$").unwrap());

// Loose number syntax accepted by comparisons: surrounding whitespace,
// sign, fraction and exponent
static NUMBER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[-+]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][-+]?[0-9]+)?\s*$").unwrap()
});

static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9 ]+$").unwrap());

/// Evaluate the catalog rule `name`.
///
/// Returns `None` when the catalog has no such rule. Presence rules and
/// cross-field rules live in the engine, not here.
pub fn evaluate(name: &str, value: &str, param: Option<&str>) -> Option<RuleOutcome> {
    let outcome = match name {
        "regex_match" => regex_match(value, param.unwrap_or_default()).into(),
        "min_length" => min_length(value, param.unwrap_or_default()).into(),
        "max_length" => max_length(value, param.unwrap_or_default()).into(),
        "exact_length" => exact_length(value, param.unwrap_or_default()).into(),
        "valid_url" => valid_url(value).into(),
        "valid_email" => valid_email(value).into(),
        "valid_emails" => valid_emails(value).into(),
        "alpha" => alpha(value).into(),
        "alpha_numeric" => alpha_numeric(value).into(),
        "alpha_numeric_spaces" => ALPHA_NUMERIC_SPACES_REGEX.is_match(value).into(),
        "alpha_dash" => ALPHA_DASH_REGEX.is_match(value).into(),
        "numeric" => NUMERIC_REGEX.is_match(value).into(),
        "integer" => INTEGER_REGEX.is_match(value).into(),
        "decimal" => DECIMAL_REGEX.is_match(value).into(),
        "greater_than" => compare(value, param, |v, p| v > p).into(),
        "greater_than_equal_to" => compare(value, param, |v, p| v >= p).into(),
        "less_than" => compare(value, param, |v, p| v < p).into(),
        "less_than_equal_to" => compare(value, param, |v, p| v <= p).into(),
        "in_list" => in_list(value, param.unwrap_or_default()).into(),
        "is_natural" => is_natural(value).into(),
        "is_natural_no_zero" => is_natural_no_zero(value).into(),
        "valid_base64" => valid_base64(value).into(),
        "phone" => PHONE_REGEX.is_match(value).into(),
        "special_chars" => special_chars(value, param.unwrap_or_default()).into(),
        "allowed_chars" => allowed_chars(value, param.unwrap_or_default()).into(),
        "prep_url" => sanitize::prep_url(value).into(),
        "encode_php_tags" => sanitize::encode_php_tags(value).into(),
        _ => return None,
    };
    Some(outcome)
}

/// Whether `name` is served by the catalog
pub fn contains(name: &str) -> bool {
    evaluate(name, "", Some("")).is_some()
}

/// Non-blank after trimming
pub fn required(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Parse a number the way loose form comparisons do
pub fn parse_number(value: &str) -> Option<f64> {
    if NUMBER_REGEX.is_match(value) {
        value.trim().parse::<f64>().ok()
    } else {
        None
    }
}

fn compare(value: &str, param: Option<&str>, op: fn(f64, f64) -> bool) -> bool {
    match (parse_number(value), param.and_then(parse_number)) {
        (Some(v), Some(p)) => op(v, p),
        _ => false,
    }
}

/// Match against a delimited pattern such as `/^[a-z]+$/i`.
///
/// An undelimited pattern is used as-is. Invalid patterns never match.
pub fn regex_match(value: &str, pattern: &str) -> bool {
    let (body, flags) = split_delimited(pattern);
    let mut builder = RegexBuilder::new(body);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            'U' => builder.swap_greed(true),
            _ => &mut builder,
        };
    }
    builder.build().map(|re| re.is_match(value)).unwrap_or(false)
}

fn split_delimited(pattern: &str) -> (&str, &str) {
    let mut chars = pattern.chars();
    let Some(open) = chars.next() else {
        return (pattern, "");
    };
    if open.is_alphanumeric() || open.is_whitespace() || open == '\\' {
        return (pattern, "");
    }
    let close = match open {
        '(' => ')',
        '{' => '}',
        '[' => ']',
        '<' => '>',
        other => other,
    };
    match pattern.rfind(close) {
        Some(end) if end > 0 => (&pattern[open.len_utf8()..end], &pattern[end + close.len_utf8()..]),
        _ => (pattern, ""),
    }
}

/// At least `min` characters
pub fn min_length(value: &str, min: &str) -> bool {
    match parse_number(min) {
        Some(min) => value.chars().count() as f64 >= min,
        None => false,
    }
}

/// At most `max` characters
pub fn max_length(value: &str, max: &str) -> bool {
    match parse_number(max) {
        Some(max) => value.chars().count() as f64 <= max,
        None => false,
    }
}

/// Exactly `len` characters
pub fn exact_length(value: &str, len: &str) -> bool {
    match parse_number(len) {
        Some(len) => value.chars().count() == len.trunc() as usize,
        None => false,
    }
}

/// `http`/`https` URL, or a bare host with optional path
pub fn valid_url(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }

    let mut rest = value;
    if let Some(caps) = SCHEME_REGEX.captures(value) {
        let scheme = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") {
            return false;
        }
        rest = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
    }

    if rest.is_empty() || rest.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    if rest.chars().any(char::is_whitespace) {
        return false;
    }

    match url::Url::parse(&format!("http://{}", rest)) {
        Ok(url) => url.host_str().is_some_and(|host| !host.is_empty()),
        Err(_) => false,
    }
}

/// Single email address
pub fn valid_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}

/// Comma separated email addresses; blank entries are ignored
pub fn valid_emails(value: &str) -> bool {
    if !value.contains(',') {
        return valid_email(value.trim());
    }
    value
        .split(',')
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .all(valid_email)
}

/// ASCII letters only
pub fn alpha(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphabetic())
}

/// ASCII letters and digits only
pub fn alpha_numeric(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric())
}

/// One of the listed values.
///
/// Entries are separated by `,`; a list without commas may use `|`.
pub fn in_list(value: &str, list: &str) -> bool {
    let separator = if list.contains(',') { ',' } else { '|' };
    list.split(separator).any(|item| item == value)
}

/// 0, 1, 2, ...
pub fn is_natural(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

/// 1, 2, 3, ...
pub fn is_natural_no_zero(value: &str) -> bool {
    is_natural(value) && value.chars().any(|c| c != '0')
}

/// Only characters of the standard Base64 alphabet, correctly padded
pub fn valid_base64(value: &str) -> bool {
    match STANDARD.decode(value) {
        Ok(bytes) => STANDARD.encode(bytes) == value,
        Err(_) => false,
    }
}

/// None of the characters in `forbidden`
pub fn special_chars(value: &str, forbidden: &str) -> bool {
    !value.chars().any(|c| forbidden.contains(c))
}

/// Only characters in `allowed`
pub fn allowed_chars(value: &str, allowed: &str) -> bool {
    value.chars().all(|c| allowed.contains(c))
}
