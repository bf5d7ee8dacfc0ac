//! Resume templates - from wizard payload to rendered document
//!
//! This crate provides:
//! - The resume data model (wizard form and section-based render record)
//! - `{{path}}` placeholder resolution and element unwrapping
//! - Payload validation and normalization into a [`ResumeRecord`]
//! - Paged and minimal PDF renderers, and the HTML merge for external printing
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::FontRegistry;
//! use template::{record_from_data, record_renderer, DocumentType, RenderFont, TemplateKind};
//!
//! let registry = FontRegistry::new("public/fonts");
//! let record = record_from_data(&data, DocumentType::Resume)?;
//! let font = RenderFont::from_registry(&registry, false)?;
//! let renderer = record_renderer(TemplateKind::Basic, font).unwrap();
//! let pdf_bytes = renderer.render(&record)?;
//! ```

pub mod element;
pub mod html;
pub mod normalize;
pub mod payload;
pub mod placeholder;
mod renderer;
mod schema;
pub mod validate;

pub use payload::{record_from_data, resolve_payload};
pub use renderer::{
    record_renderer, PagedRenderer, RenderFont, Renderer, SimpleRenderer, EMPTY_SENTINEL,
};
pub use schema::*;
pub use validate::ValidationIssue;

use thiserror::Error;

/// Errors that can occur while turning a payload into a document
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Payload nested deeper than {0} levels")]
    CyclicPayload(usize),

    #[error("Invalid payload: {} issue(s)", .0.len())]
    InvalidPayload(Vec<ValidationIssue>),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Unsupported template: {0}")]
    UnsupportedTemplate(String),

    #[error("PDF error: {0}")]
    Pdf(#[from] pdf_core::PdfError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TemplateError {
    /// True when the failure comes from a missing font or template resource
    pub fn is_resource_missing(&self) -> bool {
        match self {
            TemplateError::Pdf(e) => e.is_font_missing(),
            TemplateError::TemplateNotFound(_) => true,
            _ => false,
        }
    }
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pdf_core::PdfError;

    #[test]
    fn test_resource_missing_classification() {
        assert!(TemplateError::TemplateNotFound("cv".to_string()).is_resource_missing());
        assert!(TemplateError::Pdf(PdfError::FontNotFound("jp".to_string())).is_resource_missing());
        assert!(!TemplateError::CyclicPayload(64).is_resource_missing());
        assert!(!TemplateError::UnsupportedTemplate("fancy".to_string()).is_resource_missing());
    }

    #[test]
    fn test_invalid_payload_message() {
        let err = TemplateError::InvalidPayload(vec![ValidationIssue::new("name", "expected a string")]);
        assert_eq!(err.to_string(), "Invalid payload: 1 issue(s)");
    }
}
