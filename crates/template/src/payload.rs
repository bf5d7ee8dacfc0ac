//! Request data to render record: unwrap, validate, resolve, normalize

use crate::element::to_plain;
use crate::normalize::{normalize, sanitize_history, sanitize_qualifications};
use crate::placeholder::{coerce_text, resolve_deep};
use crate::schema::{DocumentType, ResumeFormData, ResumeRecord};
use crate::validate::{validate_form, ValidationIssue};
use crate::{Result, TemplateError};
use serde_json::{Map, Value};

const HISTORY_FIELDS: &[&str] = &["year", "month", "desc", "status"];
const QUALIFICATION_FIELDS: &[&str] = &["year", "month", "desc"];

/// Turn a raw wizard payload into typed form data
///
/// Element objects are unwrapped first, then the payload is validated,
/// its placeholders are resolved against itself, entry fields are coerced
/// to text and blank history/qualification rows are dropped.
pub fn resolve_payload(data: &Value) -> Result<ResumeFormData> {
    let plain = to_plain(data)?;

    let issues = validate_form(&plain);
    if !issues.is_empty() {
        return Err(TemplateError::InvalidPayload(issues));
    }

    let mut resolved = resolve_deep(&plain, &plain)?;
    if let Value::Object(map) = &mut resolved {
        coerce_entries(map, "history", HISTORY_FIELDS);
        coerce_entries(map, "qualifications", QUALIFICATION_FIELDS);
    }

    let mut form: ResumeFormData = serde_json::from_value(resolved)?;
    form.history = sanitize_history(form.history);
    form.qualifications = sanitize_qualifications(form.qualifications);

    log::debug!(
        "payload resolved: {} history rows, {} qualifications",
        form.history.len(),
        form.qualifications.len()
    );
    Ok(form)
}

/// Build the render record for a request's `data` object
///
/// Data that already carries a `sections` array is taken as a finished
/// record; anything else goes through [`resolve_payload`] and
/// [`normalize`].
pub fn record_from_data(data: &Value, doc_type: DocumentType) -> Result<ResumeRecord> {
    if is_record(data) {
        return record_passthrough(data);
    }
    let form = resolve_payload(data)?;
    Ok(normalize(&form, doc_type))
}

fn is_record(data: &Value) -> bool {
    matches!(data.get("sections"), Some(Value::Array(_)))
}

fn record_passthrough(data: &Value) -> Result<ResumeRecord> {
    let mut data = data.clone();
    // a null headline means "no headline", not an empty one
    if let Value::Object(map) = &mut data {
        if map.get("headline").is_some_and(Value::is_null) {
            map.remove("headline");
        }
    }

    let plain = to_plain(&data)?;
    serde_json::from_value(plain).map_err(|e| {
        TemplateError::InvalidPayload(vec![ValidationIssue::new("sections", e.to_string())])
    })
}

/// Stringify every field of each entry object under `key`
fn coerce_entries(map: &mut Map<String, Value>, key: &str, fields: &[&str]) {
    let Some(Value::Array(entries)) = map.get_mut(key) else {
        return;
    };
    for entry in entries.iter_mut() {
        let Value::Object(entry) = entry else {
            continue;
        };
        for &field in fields {
            if let Some(value) = entry.get_mut(field) {
                *value = Value::String(coerce_text(value));
            }
        }
    }
}
