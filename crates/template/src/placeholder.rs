//! `{{path}}` placeholder resolution over JSON data

use crate::{Result, TemplateError};
use serde_json::{Map, Value};

/// Deepest nesting accepted by the recursive walkers
///
/// JSON trees cannot be cyclic, so a nesting bound is the guard against
/// self-referential or hostile payloads.
pub const MAX_DEPTH: usize = 64;

/// Replace every `{{ path }}` token in `template`
///
/// Unresolvable tokens become the empty string. Text without tokens is
/// returned unchanged.
///
/// # Example
/// ```ignore
/// let ctx = json!({ "a": { "b": [10, 20] } });
/// assert_eq!(resolve("{{a.b.1}}", &ctx), "20");
/// ```
pub fn resolve(template: &str, context: &Value) -> String {
    replace_tokens(template, |path| {
        lookup(path, context).map(leaf_to_string).unwrap_or_default()
    })
}

/// Resolve placeholders in every string of `value`
///
/// Arrays and objects are walked recursively. Array entries that end up
/// primitive-empty are dropped; null leaves become empty strings.
pub fn resolve_deep(value: &Value, context: &Value) -> Result<Value> {
    resolve_value(value, context, 0)
}

fn resolve_value(value: &Value, context: &Value, depth: usize) -> Result<Value> {
    if depth > MAX_DEPTH {
        return Err(TemplateError::CyclicPayload(MAX_DEPTH));
    }

    Ok(match value {
        Value::String(s) => Value::String(resolve(s, context)),
        Value::Array(items) => {
            let mut resolved = Vec::with_capacity(items.len());
            for item in items {
                let item = resolve_value(item, context, depth + 1)?;
                if !is_primitive_empty(&item) {
                    resolved.push(item);
                }
            }
            Value::Array(resolved)
        }
        Value::Object(map) => {
            let mut resolved = Map::with_capacity(map.len());
            for (key, nested) in map {
                resolved.insert(key.clone(), resolve_value(nested, context, depth + 1)?);
            }
            Value::Object(resolved)
        }
        Value::Null => Value::String(String::new()),
        Value::Number(_) | Value::Bool(_) => value.clone(),
    })
}

/// Walk a dotted path
///
/// A segment addresses an array by index and an object by key; anything
/// else (a primitive, a bad index) ends the walk with `None`.
pub fn lookup<'a>(path: &str, context: &'a Value) -> Option<&'a Value> {
    let mut current = context;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Display text of a resolved leaf
///
/// Strings pass through, numbers and booleans stringify, containers and
/// null become empty.
pub fn leaf_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => number_to_string(n),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// Integral floats print without a fractional part ("20", not "20.0")
fn number_to_string(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

/// Loose text of any value
///
/// Arrays join their non-empty parts with a space.
pub fn coerce_text(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(coerce_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        other => leaf_to_string(other),
    }
}

/// True if every leaf is null or a blank string
pub fn is_primitive_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Number(_) | Value::Bool(_) => false,
        Value::Array(items) => items.iter().all(is_primitive_empty),
        Value::Object(map) => map.values().all(is_primitive_empty),
    }
}

/// Scan `text` for `{{ ... }}` tokens and substitute them
///
/// A token body is a non-empty run without braces; the trimmed body is
/// passed to `substitute`. Braces that do not form a token are copied.
pub(crate) fn replace_tokens<F>(text: &str, mut substitute: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let body_len = after.find(['{', '}']).unwrap_or(after.len());

        if body_len > 0 && after[body_len..].starts_with("}}") {
            out.push_str(&substitute(after[..body_len].trim()));
            rest = &after[body_len + 2..];
        } else {
            // not a token here; retry one character later
            out.push('{');
            rest = &rest[start + 1..];
        }
    }

    out.push_str(rest);
    out
}
