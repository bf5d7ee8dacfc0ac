//! Structural checks on the wizard payload before it is deserialized

use crate::schema::Gender;
use serde::Serialize;
use serde_json::Value;

/// One problem found in a payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Dotted path of the offending field ("history.2.year")
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

const TEXT_FIELDS: &[&str] = &[
    "name",
    "name_furigana",
    "birth_date",
    "address_furigana",
    "address_postal_code",
    "address_main",
    "phone",
    "email",
    "contact_address_furigana",
    "contact_address_postal_code",
    "contact_address_main",
    "contact_phone",
    "contact_email",
    "q1_resume",
    "q2_resume",
    "q3_resume",
    "q4_resume",
    "q5_resume",
    "generated_resume_pr",
    "special_requests",
    "q1_cv",
    "q2_cv",
    "q3_cv",
    "q4_cv",
    "q5_cv",
    "generated_cv_summary",
    "generated_cv_details",
    "generated_cv_skills",
    "generated_cv_pr",
    "generated_cv_speciality",
];

const HISTORY_FIELDS: &[&str] = &["year", "month", "desc", "status"];
const QUALIFICATION_FIELDS: &[&str] = &["year", "month", "desc"];

/// Check field types of a form payload
///
/// Missing fields are fine (they default to empty). Returns every issue
/// found rather than stopping at the first.
pub fn validate_form(data: &Value) -> Vec<ValidationIssue> {
    let Value::Object(map) = data else {
        return vec![ValidationIssue::new("", "expected an object")];
    };

    let mut issues = Vec::new();

    for &field in TEXT_FIELDS {
        match map.get(field) {
            None | Some(Value::String(_)) => {}
            Some(_) => issues.push(ValidationIssue::new(field, "expected a string")),
        }
    }

    match map.get("photo") {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(_) => issues.push(ValidationIssue::new("photo", "expected a string or null")),
    }

    match map.get("gender") {
        None => {}
        Some(Value::String(s)) if Gender::ALLOWED.contains(&s.as_str()) => {}
        Some(_) => issues.push(ValidationIssue::new(
            "gender",
            format!("expected one of {}", Gender::ALLOWED.join(" | ")),
        )),
    }

    match map.get("same_as_current_address") {
        None | Some(Value::Bool(_)) => {}
        Some(_) => issues.push(ValidationIssue::new(
            "same_as_current_address",
            "expected a boolean",
        )),
    }

    check_entries(map.get("history"), "history", HISTORY_FIELDS, &mut issues);
    check_entries(
        map.get("qualifications"),
        "qualifications",
        QUALIFICATION_FIELDS,
        &mut issues,
    );

    issues
}

fn check_entries(
    value: Option<&Value>,
    name: &str,
    fields: &[&str],
    issues: &mut Vec<ValidationIssue>,
) {
    let entries = match value {
        None => return,
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            issues.push(ValidationIssue::new(name, "expected an array"));
            return;
        }
    };

    for (index, entry) in entries.iter().enumerate() {
        let Value::Object(entry) = entry else {
            issues.push(ValidationIssue::new(
                format!("{name}.{index}"),
                "expected an object",
            ));
            continue;
        };
        for &field in fields {
            match entry.get(field) {
                None | Some(Value::String(_)) | Some(Value::Number(_)) => {}
                Some(_) => issues.push(ValidationIssue::new(
                    format!("{name}.{index}.{field}"),
                    "expected a string",
                )),
            }
        }
    }
}
