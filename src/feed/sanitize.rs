//! Sanitizers
//!
//! Field-level cleaning applied to every value copied out of the upstream
//! payload. The rules follow the WordPress helpers the feed was designed
//! against (`sanitize_text_field`, `sanitize_email`, `absint`).

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static SCRIPT_STYLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(?:script|style)\b[^>]*>.*?</(?:script|style)\s*>")
        .expect("Invalid SCRIPT_STYLE_RE regex")
});

static OCTET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%[a-fA-F0-9]{2}").expect("Invalid OCTET_RE regex"));

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\r\n\t ]+").expect("Invalid WHITESPACE_RE regex"));

static SPACES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").expect("Invalid SPACES_RE regex"));

static EMAIL_LOCAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^a-zA-Z0-9!#$%&'*+/=?^_`{|}~.\-]").expect("Invalid EMAIL_LOCAL_RE regex")
});

static EMAIL_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[^a-z0-9\-]+").expect("Invalid EMAIL_LABEL_RE regex"));

static DOT_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.{2,}").expect("Invalid DOT_RUN_RE regex"));

/// Characters stripped from both ends by [`trim_ascii_blank`].
const TRIM_CHARS: &str = " \t\n\r\0\x0B";

/// Largest value `absint` can produce.
const MAX_ABSINT: u64 = i64::MAX as u64;

/// Minimum length of anything that could be an email address (`a@b.co`).
const MIN_EMAIL_LENGTH: usize = 6;

// == Text ==
/// Reduces a string to single-line plain text.
///
/// Tags are removed (script/style together with their content), a `<` that
/// does not open a tag is kept as `&lt;`, percent-encoded octets and control
/// characters are dropped, whitespace runs collapse to one space and the
/// result is trimmed.
pub fn sanitize_text_field(input: &str) -> String {
    let mut filtered = if input.contains('<') {
        strip_tags(&SCRIPT_STYLE_RE.replace_all(input, ""))
    } else {
        input.to_string()
    };

    filtered.retain(|c| !c.is_control() || matches!(c, '\r' | '\n' | '\t'));
    let collapsed = WHITESPACE_RE.replace_all(&filtered, " ");
    let mut filtered = trim_ascii_blank(&collapsed).to_string();

    let mut found_octets = false;
    while OCTET_RE.is_match(&filtered) {
        filtered = OCTET_RE.replace_all(&filtered, "").into_owned();
        found_octets = true;
    }

    if found_octets {
        filtered = SPACES_RE
            .replace_all(trim_ascii_blank(&filtered), " ")
            .into_owned();
    }

    filtered
}

/// Trims ASCII blanks only; Unicode spaces such as NBSP are content.
fn trim_ascii_blank(input: &str) -> &str {
    input.trim_matches(|c: char| TRIM_CHARS.contains(c))
}

/// Removes every `<...>` tag; a `<` with no closing `>` before the next `<`
/// is escaped instead.
fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let next_open = after.find('<');

        match after.find('>') {
            Some(end) if next_open.map_or(true, |open| end < open) => {
                rest = &after[end + 1..];
            }
            _ => {
                out.push_str("&lt;");
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

// == Email ==
/// Cleans an email address, returning an empty string when what remains is
/// not a plausible address.
pub fn sanitize_email(input: &str) -> String {
    if input.len() < MIN_EMAIL_LENGTH {
        return String::new();
    }

    let Some((local, domain)) = input.split_once('@') else {
        return String::new();
    };

    let local = EMAIL_LOCAL_RE.replace_all(local, "");
    if local.is_empty() {
        return String::new();
    }

    let domain = DOT_RUN_RE.replace_all(domain, "");
    let domain = domain.trim_matches(|c: char| c == '.' || TRIM_CHARS.contains(c));
    if domain.is_empty() {
        return String::new();
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return String::new();
    }

    let labels: Vec<String> = labels
        .into_iter()
        .map(|label| {
            let label = label.trim_matches(|c: char| c == '-' || TRIM_CHARS.contains(c));
            EMAIL_LABEL_RE.replace_all(label, "").into_owned()
        })
        .filter(|label| !label.is_empty())
        .collect();

    if labels.len() < 2 {
        return String::new();
    }

    format!("{}@{}", local, labels.join("."))
}

// == Integers ==
/// Non-negative integer view of a JSON value.
///
/// Integers and floats are truncated and made absolute, strings contribute
/// their leading integer (`"12abc"` is 12), `true` is 1, anything else is 0.
/// Overlong digit strings saturate at `i64::MAX`.
pub fn absint(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(i64::unsigned_abs)
            .or_else(|| n.as_u64())
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc().abs() as u64)
            })
            .unwrap_or(0),
        Value::String(s) => leading_integer(s),
        Value::Bool(true) => 1,
        _ => 0,
    }
}

fn leading_integer(s: &str) -> u64 {
    let s = s.trim_start();
    let unsigned = s.strip_prefix(|c: char| c == '-' || c == '+').unwrap_or(s);
    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    let digits = &unsigned[..digits_end];

    if digits.is_empty() {
        0
    } else {
        // Only overflow can fail here
        digits
            .parse::<u64>()
            .map_or(MAX_ABSINT, |n| n.min(MAX_ABSINT))
    }
}

// == Scalars ==
/// Text form of a scalar JSON value; `None` for null.
///
/// Arrays and objects have no text form and yield an empty string.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) => Some(String::new()),
        Value::Array(_) | Value::Object(_) => Some(String::new()),
    }
}
