//! PDF Core - Low-level PDF assembly
//!
//! This crate provides functionality for:
//! - Resolving an embeddable CJK-capable font from a fixed candidate list
//! - Embedding and subsetting TrueType/OpenType fonts
//! - Emitting a minimal PDF byte-for-byte without a PDF library
//! - Building paginated documents with a vertical cursor
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{FontRegistry, PdfDocument, PageGeometry, Align};
//!
//! let registry = FontRegistry::new("public/fonts");
//! let font = registry.resolve()?;
//! let mut doc = PdfDocument::new(PageGeometry::a4());
//! doc.register_font_family("jp", font.family_builder())?;
//! doc.set_font("jp", 12.0)?;
//! let page = doc.add_page();
//! doc.insert_text("山田太郎", page, 50.0, 60.0, Align::Left)?;
//! let bytes = doc.to_bytes()?;
//! ```

mod document;
mod font;
mod layout;
mod minimal;
mod registry;
mod text;

pub use document::{Color, PdfDocument};
pub use font::{FontData, FontFamily, FontFamilyBuilder, FontWeight, StandardFont};
pub use layout::{PageCursor, PageGeometry};
pub use minimal::{MinimalPdf, TextBlock};
pub use registry::{
    FontCandidate, FontRegistry, ResolvedFont, DEFAULT_CANDIDATES, DEFAULT_COVERAGE,
};
pub use text::{
    encode_win_ansi, escape_pdf_literal, generate_text_operators, unescape_pdf_literal,
    wrap_to_width, TextRenderContext,
};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Font not found: {0}")]
    FontNotFound(String),

    #[error("Font already exists: {0}")]
    FontAlreadyExists(String),

    #[error("Failed to parse font: {0}")]
    FontParseError(String),

    #[error("Font subset error: {0}")]
    FontSubsetError(String),

    #[error("Text cannot be shown with font {font}: {text:?}")]
    UnsupportedText { font: String, text: String },

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

impl PdfError {
    /// True for errors caused by a missing or unusable font resource
    pub fn is_font_missing(&self) -> bool {
        matches!(
            self,
            PdfError::FontNotFound(_) | PdfError::UnsupportedText { .. }
        )
    }
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Text alignment options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}
