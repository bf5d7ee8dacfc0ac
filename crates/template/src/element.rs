//! Unwrapping of UI element objects embedded in form payloads
//!
//! Some clients serialize rendered view elements (`{"type": "span",
//! "props": {"children": ...}}`, or objects carrying a `$$typeof` marker)
//! where plain text is expected. [`to_plain`] replaces every such object
//! with the text of its children so the resolution and rendering code only
//! ever sees strings, numbers, booleans, arrays and plain objects.

use crate::placeholder::{leaf_to_string, MAX_DEPTH};
use crate::{Result, TemplateError};
use serde_json::{Map, Value};

/// Numeric marker some serializers emit instead of the element symbol
const ELEMENT_MARKER_NUMBER: u64 = 0xead0;

/// True if `value` looks like a serialized view element
pub fn is_element(value: &Value) -> bool {
    let Value::Object(map) = value else {
        return false;
    };

    match map.get("$$typeof") {
        Some(Value::String(marker)) if marker.to_lowercase().contains("react.element") => {
            return true
        }
        Some(Value::Number(n)) if n.as_u64() == Some(ELEMENT_MARKER_NUMBER) => return true,
        _ => {}
    }

    matches!(
        (map.get("type"), map.get("props")),
        (Some(Value::String(_)), Some(Value::Object(_)))
    )
}

/// Concatenated text of an element's children
///
/// Plain objects among the children contribute nothing; their keys are
/// configuration, not content.
pub fn element_text(element: &Value) -> Result<String> {
    children_text(element.pointer("/props/children"), 0)
}

fn children_text(children: Option<&Value>, depth: usize) -> Result<String> {
    if depth > MAX_DEPTH {
        return Err(TemplateError::CyclicPayload(MAX_DEPTH));
    }

    Ok(match children {
        None | Some(Value::Null) => String::new(),
        Some(Value::Array(items)) => {
            let mut text = String::new();
            for child in items {
                text.push_str(&children_text(Some(child), depth + 1)?);
            }
            text
        }
        Some(child) if is_element(child) => {
            children_text(child.pointer("/props/children"), depth + 1)?
        }
        Some(Value::Object(_)) => String::new(),
        Some(leaf) => leaf_to_string(leaf),
    })
}

/// Replace element objects with their text and nulls with empty strings
pub fn to_plain(value: &Value) -> Result<Value> {
    plain_value(value, 0)
}

fn plain_value(value: &Value, depth: usize) -> Result<Value> {
    if depth > MAX_DEPTH {
        return Err(TemplateError::CyclicPayload(MAX_DEPTH));
    }

    Ok(match value {
        Value::Null => Value::String(String::new()),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| plain_value(item, depth + 1))
                .collect::<Result<Vec<_>>>()?,
        ),
        v if is_element(v) => Value::String(element_text(v)?),
        Value::Object(map) => {
            let mut plain = Map::with_capacity(map.len());
            for (key, nested) in map {
                plain.insert(key.clone(), plain_value(nested, depth + 1)?);
            }
            Value::Object(plain)
        }
        other => other.clone(),
    })
}
