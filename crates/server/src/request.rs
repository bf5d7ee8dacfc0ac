//! Render request parsing for the POST body and the GET query string

use crate::error::ApiError;
use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde_json::{Map, Value};
use std::collections::HashMap;
use template::{DocumentType, ValidationIssue};

/// A request after type/template normalization
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub doc_type: DocumentType,
    /// Normalized template key; not yet checked against the known kinds
    pub template: String,
    /// Always an object
    pub data: Value,
}

impl RenderRequest {
    /// Build from a parsed JSON body
    ///
    /// `type` and `template` are read leniently. `data` defaults to an empty
    /// object, and a top-level `name` fills in `data.name` when that is
    /// missing or null.
    pub fn from_json(body: &Value) -> Result<Self, ApiError> {
        let Value::Object(body) = body else {
            return Err(ApiError::InvalidPayload(vec![ValidationIssue::new(
                "",
                "expected an object",
            )]));
        };

        let doc_type = DocumentType::from_param(body.get("type").and_then(Value::as_str));
        let template = template::TemplateKind::normalize_key(
            body.get("template").and_then(template_param).as_deref(),
        );

        let mut data = match body.get("data") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(data)) => data.clone(),
            Some(_) => {
                return Err(ApiError::InvalidPayload(vec![ValidationIssue::new(
                    "data",
                    "expected an object",
                )]))
            }
        };

        let has_name = data.get("name").is_some_and(|name| !name.is_null());
        if !has_name {
            if let Some(name) = body.get("name").and_then(Value::as_str) {
                data.insert("name".to_string(), Value::String(name.to_string()));
            }
        }

        Ok(Self {
            doc_type,
            template,
            data: Value::Object(data),
        })
    }

    /// Parse a raw POST body
    pub fn from_body(bytes: &[u8]) -> Result<Self, ApiError> {
        let body: Value =
            serde_json::from_slice(bytes).map_err(|e| ApiError::InvalidJson(e.to_string()))?;
        Self::from_json(&body)
    }

    /// Build from GET query parameters
    ///
    /// A `payload` parameter carries the whole body as base64 JSON. Without
    /// it the request is assembled from `type`, `template`, `name` and
    /// `data.<key>` parameters.
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self, ApiError> {
        if let Some(payload) = params.get("payload") {
            let bytes = decode_base64(payload)?;
            return Self::from_body(&bytes);
        }

        let mut body = Map::new();
        for key in ["type", "template", "name"] {
            if let Some(value) = params.get(key) {
                body.insert(key.to_string(), Value::String(value.clone()));
            }
        }

        let mut data = Map::new();
        for (key, value) in params {
            let Some(field) = key.strip_prefix("data.") else {
                continue;
            };
            if field.is_empty() {
                continue;
            }
            let value = match field {
                "same_as_current_address" => Value::Bool(value.eq_ignore_ascii_case("true")),
                _ => Value::String(value.clone()),
            };
            data.insert(field.to_string(), value);
        }
        body.insert("data".to_string(), Value::Object(data));

        Self::from_json(&Value::Object(body))
    }

    /// Name used for the download filename
    pub fn display_name(&self) -> &str {
        self.data
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

/// Template keys may arrive as strings or as booleans ("template": true)
fn template_param(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn decode_base64(input: &str) -> Result<Vec<u8>, ApiError> {
    let input = input.trim();
    [&STANDARD, &URL_SAFE, &URL_SAFE_NO_PAD]
        .iter()
        .find_map(|engine| engine.decode(input).ok())
        .ok_or_else(|| ApiError::InvalidJson("payload is not valid base64".to_string()))
}
