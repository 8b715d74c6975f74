//! Sanitization transforms.
//!
//! Pure string functions addressed by name, used by
//! [`FormValidator::sanitize`](crate::FormValidator::sanitize) and as
//! value-replacing rules inside rule chains (`trim|required|lower`).

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

/// Names served by [`transform`]
pub const TRANSFORMS: [&str; 18] = [
    "url",
    "int",
    "float",
    "email",
    "string",
    "to_html_entities",
    "to_html_entities_plain",
    "upper",
    "ucfirst",
    "lower",
    "urle",
    "trim_urle",
    "filter_special_chars",
    "magic_quotes",
    "remove_backslashes",
    "remove_html_tags",
    "trim",
    "remove_space",
];

/// Apply the named transform, or `None` if there is no such transform.
pub fn transform(name: &str, value: &str) -> Option<String> {
    let output = match name {
        "url" => retain(value, |c| {
            c.is_ascii_alphanumeric() || "$-_.+!*'(),{}|\\^~[]`<>#%\";/?:@&=".contains(c)
        }),
        "int" => retain(value, |c| c.is_ascii_digit() || c == '+' || c == '-'),
        "float" => retain(value, |c| c.is_ascii_digit() || "+-.,".contains(c)),
        "email" => retain(&value.chars().take(254).collect::<String>(), |c| {
            c.is_ascii_alphanumeric() || "!#$%&'*+-=?^_`{|}~@.[]".contains(c)
        }),
        "string" => strip_tags(value).replace('\0', ""),
        "to_html_entities" => encode_html(php_trim(value), true),
        "to_html_entities_plain" => encode_html(php_trim(value), false),
        "upper" => uc_words(&php_trim(value).to_lowercase()),
        "ucfirst" => uc_first(&php_trim(value).to_lowercase()),
        "lower" => php_trim(value).to_lowercase(),
        "urle" => url_encode(php_trim(value)),
        "trim_urle" => url_decode(php_trim(value)),
        "filter_special_chars" => filter_special_chars(value),
        "magic_quotes" => add_slashes(value),
        "remove_backslashes" => strip_slashes(value),
        "remove_html_tags" => strip_tags(value),
        "trim" => php_trim(value).to_string(),
        "remove_space" => value.replace(' ', ""),
        _ => return None,
    };
    Some(output)
}

/// Whether `name` is a known transform
pub fn is_transform(name: &str) -> bool {
    TRANSFORMS.contains(&name)
}

fn retain(value: &str, keep: impl Fn(char) -> bool) -> String {
    value.chars().filter(|c| keep(*c)).collect()
}

/// Trim spaces, tabs, newlines, NUL and vertical tabs from both ends
pub fn php_trim(value: &str) -> &str {
    value.trim_matches(|c| matches!(c, ' ' | '\t' | '\n' | '\r' | '\0' | '\x0B'))
}

fn encode_html(value: &str, quotes: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if quotes => out.push_str("&quot;"),
            '\'' if quotes => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape `& " ' < >` for HTML output
pub fn html_special_chars(value: &str) -> String {
    encode_html(value, true)
}

fn uc_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn uc_words(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for c in value.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = matches!(c, ' ' | '\t' | '\r' | '\n' | '\x0C' | '\x0B');
    }
    out
}

fn url_encode(value: &str) -> String {
    urlencoding::encode(value).replace("%20", "+")
}

fn url_decode(value: &str) -> String {
    let spaced = value.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned(),
    }
}

fn filter_special_chars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\'' | '"' | '<' | '>' | '&' => out.push_str(&format!("&#{};", c as u32)),
            c if (c as u32) < 32 => out.push_str(&format!("&#{};", c as u32)),
            _ => out.push(c),
        }
    }
    out
}

fn add_slashes(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\'' | '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\0' => out.push_str("\\0"),
            _ => out.push(c),
        }
    }
    out
}

fn strip_slashes(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('\0'),
            Some(escaped) => out.push(escaped),
            None => {}
        }
    }
    out
}

/// Remove anything between `<` and `>`
pub fn strip_tags(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_tag = false;
    for c in value.chars() {
        match (c, in_tag) {
            ('<', _) => in_tag = true,
            ('>', true) => in_tag = false,
            (_, false) => out.push(c),
            _ => {}
        }
    }
    out
}

/// Turn `<?` and `?>` into entities
pub fn encode_php_tags(value: &str) -> String {
    value.replace("<?", "&lt;?").replace("?>", "?&gt;")
}

/// Prefix `http://` unless a scheme is present
pub fn prep_url(value: &str) -> String {
    if value.is_empty() || value == "http://" {
        return String::new();
    }
    if value.starts_with("http://") || value.starts_with("https://") {
        return value.to_string();
    }
    format!("http://{}", value)
}

/// Escape a value for display inside a form field
pub fn prep_for_form(value: &str) -> String {
    strip_slashes(value)
        .replace('\'', "&#39;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Hex digest of `value`.
///
/// Supported algorithms are `md5`, `sha1`, `sha224`, `sha256`, `sha384` and
/// `sha512`; anything else hashes with `md5`.
pub fn do_hash(value: &str, algorithm: &str) -> String {
    let bytes = value.as_bytes();
    match algorithm.to_lowercase().as_str() {
        "sha1" => hex::encode(Sha1::digest(bytes)),
        "sha224" => hex::encode(Sha224::digest(bytes)),
        "sha256" => hex::encode(Sha256::digest(bytes)),
        "sha384" => hex::encode(Sha384::digest(bytes)),
        "sha512" => hex::encode(Sha512::digest(bytes)),
        _ => hex::encode(Md5::digest(bytes)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(name: &str, value: &str) -> String {
        transform(name, value).unwrap()
    }

    #[test]
    fn test_trim_then_upper() {
        let trimmed = apply("trim", " bob ");
        assert_eq!(apply("upper", &trimmed), "Bob");
        assert_eq!(apply("upper", "  hello WORLD "), "Hello World");
    }

    #[test]
    fn test_case_transforms() {
        assert_eq!(apply("ucfirst", " hELLO world"), "Hello world");
        assert_eq!(apply("lower", " MiXeD "), "mixed");
    }

    #[test]
    fn test_unknown_transform() {
        assert_eq!(transform("rot13", "abc"), None);
        assert!(!is_transform("rot13"));
        assert!(is_transform("remove_space"));
    }

    #[test]
    fn test_number_filters() {
        assert_eq!(apply("int", "a1b-2+3.4"), "1-2+34");
        assert_eq!(apply("float", "1,234.5kg"), "1,234.5");
    }

    #[test]
    fn test_html_entities() {
        assert_eq!(
            apply("to_html_entities", r#" <a href="x">O'k</a> "#),
            "&lt;a href=&quot;x&quot;&gt;O&#039;k&lt;/a&gt;"
        );
        assert_eq!(
            apply("to_html_entities_plain", r#"<b>"q"</b>"#),
            r#"&lt;b&gt;"q"&lt;/b&gt;"#
        );
        assert_eq!(apply("filter_special_chars", "<a>\n"), "&#60;a&#62;&#10;");
    }

    #[test]
    fn test_url_encoding() {
        assert_eq!(apply("urle", " a b&c "), "a+b%26c");
        assert_eq!(apply("trim_urle", " a+b%26c "), "a b&c");
    }

    #[test]
    fn test_slashes() {
        assert_eq!(apply("magic_quotes", r#"O'Reilly "x""#), r#"O\'Reilly \"x\""#);
        assert_eq!(apply("remove_backslashes", r"O\'Reilly \\ x"), r"O'Reilly \ x");
    }

    #[test]
    fn test_tags_and_spaces() {
        assert_eq!(apply("remove_html_tags", "<p>Hi <b>there</b></p>"), "Hi there");
        assert_eq!(apply("string", "<i>x</i>'y'"), "x'y'");
        assert_eq!(apply("remove_space", " a b "), "ab");
    }

    #[test]
    fn test_email_and_url_filters() {
        assert_eq!(apply("email", "jo hn(at)@exa mple.com"), "johnat@example.com");
        assert_eq!(apply("url", "http://exa mple.com/ä"), "http://example.com/");
    }

    #[test]
    fn test_helpers() {
        assert_eq!(encode_php_tags("<?php echo 1; ?>"), "&lt;?php echo 1; ?&gt;");
        assert_eq!(prep_url("example.com"), "http://example.com");
        assert_eq!(prep_url("https://example.com"), "https://example.com");
        assert_eq!(prep_url("http://"), "");
        assert_eq!(prep_for_form(r#"<"it\'s">"#), "&lt;&quot;it&#39;s&quot;&gt;");
    }

    #[test]
    fn test_do_hash() {
        assert_eq!(
            do_hash("abc", "sha256"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(do_hash("abc", "SHA1"), "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert_eq!(do_hash("abc", "md5"), "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(do_hash("abc", "whirlpool"), do_hash("abc", "md5"));
        assert_eq!(do_hash("abc", "sha512").len(), 128);
    }
}
