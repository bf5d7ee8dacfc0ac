//! HTTP error mapping
//!
//! Every failure of a render request becomes one [`ApiError`] with a
//! machine-readable `error` code in a JSON body.

use crate::convert::ConvertError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use template::{TemplateError, ValidationIssue};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Invalid payload: {} issue(s)", .0.len())]
    InvalidPayload(Vec<ValidationIssue>),

    #[error("Unsupported template: {0}")]
    UnsupportedTemplate(String),

    #[error("Font not found: {0}")]
    FontNotFound(String),

    /// Internal failure; the message is logged, never sent to the client
    #[error("PDF generation failed: {0}")]
    Generation(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidPayload(_)
            | ApiError::UnsupportedTemplate(_)
            | ApiError::FontNotFound(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::InvalidPayload(_) => "INVALID_PAYLOAD",
            ApiError::UnsupportedTemplate(_) => "UNSUPPORTED_TEMPLATE",
            ApiError::FontNotFound(_) => "FONT_NOT_FOUND",
            ApiError::Generation(_) => "PDF_GENERATION_FAILED",
        }
    }

    /// Text safe to show the caller
    fn public_message(&self) -> String {
        match self {
            ApiError::Generation(_) => "PDF generation failed".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<TemplateError> for ApiError {
    fn from(e: TemplateError) -> Self {
        match e {
            TemplateError::InvalidPayload(issues) => ApiError::InvalidPayload(issues),
            TemplateError::CyclicPayload(_) | TemplateError::Json(_) => {
                ApiError::InvalidPayload(vec![ValidationIssue::new("", e.to_string())])
            }
            TemplateError::UnsupportedTemplate(key) => ApiError::UnsupportedTemplate(key),
            e if e.is_resource_missing() => ApiError::FontNotFound(e.to_string()),
            e => ApiError::Generation(e.to_string()),
        }
    }
}

impl From<ConvertError> for ApiError {
    fn from(e: ConvertError) -> Self {
        ApiError::Generation(e.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    issues: Vec<ValidationIssue>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let issues = match &self {
            ApiError::InvalidPayload(issues) => issues.clone(),
            _ => Vec::new(),
        };
        let body = ErrorBody {
            error: self.code(),
            message: self.public_message(),
            issues,
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdf_core::PdfError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_and_code() {
        let cases = [
            (ApiError::InvalidJson("x".into()), 400, "INVALID_JSON"),
            (ApiError::InvalidPayload(vec![]), 422, "INVALID_PAYLOAD"),
            (ApiError::UnsupportedTemplate("x".into()), 422, "UNSUPPORTED_TEMPLATE"),
            (ApiError::FontNotFound("x".into()), 422, "FONT_NOT_FOUND"),
            (ApiError::Generation("x".into()), 500, "PDF_GENERATION_FAILED"),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status().as_u16(), status);
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn test_template_error_mapping() {
        let font: ApiError = TemplateError::Pdf(PdfError::UnsupportedText {
            font: "Helvetica".to_string(),
            text: "山".to_string(),
        })
        .into();
        assert_eq!(font.code(), "FONT_NOT_FOUND");

        let missing: ApiError = TemplateError::TemplateNotFound("cv.html".to_string()).into();
        assert_eq!(missing.code(), "FONT_NOT_FOUND");

        let deep: ApiError = TemplateError::CyclicPayload(64).into();
        assert_eq!(deep.code(), "INVALID_PAYLOAD");

        let save: ApiError = TemplateError::Pdf(PdfError::SaveError("disk".to_string())).into();
        assert_eq!(save.code(), "PDF_GENERATION_FAILED");
    }

    #[test]
    fn test_generation_details_not_exposed() {
        let err = ApiError::Generation("lopdf: broken xref at 0x42".to_string());
        assert_eq!(err.public_message(), "PDF generation failed");
    }
}
