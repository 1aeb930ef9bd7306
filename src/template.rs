//! URI template expansion for path parameters (RFC 6570, levels 1 and 2).
//!
//! `{var}` expands with every non-unreserved character percent-encoded,
//! `{+var}` and `{#var}` keep reserved characters. Undefined variables
//! expand to nothing; the transport reports any resulting bad path.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};

/// Everything except RFC 3986 unreserved characters.
const SIMPLE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Everything except unreserved and reserved characters.
const RESERVED: &AsciiSet = &SIMPLE
    .remove(b':')
    .remove(b'/')
    .remove(b'?')
    .remove(b'#')
    .remove(b'[')
    .remove(b']')
    .remove(b'@')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=')
    .remove(b'%');

/// Expand `template` with `values`.
pub fn expand(template: &str, values: &Map<String, Value>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            // Unterminated expression: keep it literally
            out.push_str(&rest[start..]);
            return out;
        };
        expand_expression(&after[..end], values, &mut out);
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

fn expand_expression(expression: &str, values: &Map<String, Value>, out: &mut String) {
    let (prefix, set, names) = match expression.as_bytes().first() {
        Some(b'+') => ("", RESERVED, &expression[1..]),
        Some(b'#') => ("#", RESERVED, &expression[1..]),
        _ => ("", SIMPLE, expression),
    };

    let parts: Vec<String> = names
        .split(',')
        .filter_map(|name| values.get(name.trim()))
        .filter_map(|value| render(value, set))
        .collect();

    if !parts.is_empty() {
        out.push_str(prefix);
        out.push_str(&parts.join(","));
    }
}

/// Render one variable; `None` when it counts as undefined.
fn render(value: &Value, set: &'static AsciiSet) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Array(items) if items.is_empty() => None,
        Value::Object(map) if map.is_empty() => None,
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| render(item, set))
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(map) => Some(
            map.iter()
                .filter_map(|(k, v)| render(v, set).map(|v| format!("{},{}", encode(k, set), v)))
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::String(s) => Some(encode(s, set)),
        other => Some(encode(&other.to_string(), set)),
    }
}

fn encode(raw: &str, set: &'static AsciiSet) -> String {
    utf8_percent_encode(raw, set).to_string()
}
