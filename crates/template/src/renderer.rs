//! Record renderers
//!
//! Two in-process strategies turn a [`ResumeRecord`] into PDF bytes:
//!
//! - [`PagedRenderer`] lays the record out on A4 pages through
//!   [`PdfDocument`], with bold headings, wrapped items and page breaks.
//! - [`SimpleRenderer`] writes one line per block through the byte-level
//!   [`MinimalPdf`] emitter.

use crate::schema::{ResumeRecord, TemplateKind};
use crate::Result;
use pdf_core::{
    wrap_to_width, Align, FontData, FontRegistry, FontWeight, MinimalPdf, PageCursor,
    PageGeometry, PdfDocument, ResolvedFont, StandardFont, TextBlock,
};

/// Drawn in place of an empty name or headline
pub const EMPTY_SENTINEL: &str = "—";

const FAMILY: &str = "jp";
const BULLET: &str = "•";

const NAME_SIZE: f32 = 24.0;
const NAME_HEIGHT: f64 = 28.0;
const HEADLINE_SIZE: f32 = 14.0;
const HEADLINE_HEIGHT: f64 = 24.0;
const SECTION_GAP: f64 = 12.0;
const TITLE_SIZE: f32 = 16.0;
const TITLE_HEIGHT: f64 = 20.0;
const ITEM_SIZE: f32 = 12.0;
const ITEM_HEIGHT: f64 = 16.0;
const BULLET_INDENT: f64 = 10.0;
const ITEM_INDENT: f64 = 22.0;

/// Turns a record into a complete PDF file
pub trait Renderer {
    fn render(&self, record: &ResumeRecord) -> Result<Vec<u8>>;
}

/// Font a renderer draws with
#[derive(Debug, Clone)]
pub enum RenderFont {
    /// A CJK-capable font resolved from the registry, embedded and subset
    Embedded(ResolvedFont),
    /// Builtin Helvetica; Latin-1 text only
    Builtin,
}

impl RenderFont {
    /// Resolve the embeddable font, optionally degrading to the builtin one
    pub fn from_registry(registry: &FontRegistry, allow_fallback: bool) -> Result<Self> {
        match registry.resolve() {
            Ok(font) => Ok(RenderFont::Embedded(font)),
            Err(e) if e.is_font_missing() && allow_fallback => {
                log::warn!(
                    "no embeddable font under {}, falling back to Helvetica: {e}",
                    registry.font_dir().display()
                );
                Ok(RenderFont::Builtin)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Renderer for an in-process template kind
///
/// `Html` goes through an external converter and has no in-process
/// renderer.
pub fn record_renderer(
    kind: TemplateKind,
    font: RenderFont,
) -> Option<Box<dyn Renderer + Send + Sync>> {
    match kind {
        TemplateKind::Basic => Some(Box::new(PagedRenderer::new(font))),
        TemplateKind::Simple => Some(Box::new(SimpleRenderer::new(font))),
        TemplateKind::Html => None,
    }
}

fn or_sentinel(text: &str) -> &str {
    let text = text.trim();
    if text.is_empty() {
        EMPTY_SENTINEL
    } else {
        text
    }
}

/// Paginating A4 renderer
#[derive(Debug, Clone)]
pub struct PagedRenderer {
    font: RenderFont,
    geometry: PageGeometry,
}

impl PagedRenderer {
    pub fn new(font: RenderFont) -> Self {
        Self {
            font,
            geometry: PageGeometry::a4(),
        }
    }

    fn new_document(&self) -> Result<PdfDocument> {
        let mut doc = PdfDocument::new(self.geometry);
        match &self.font {
            RenderFont::Embedded(font) => {
                doc.register_font_family(FAMILY, font.family_builder())?;
            }
            RenderFont::Builtin => {
                doc.register_standard_font(
                    FAMILY,
                    StandardFont::Helvetica,
                    StandardFont::HelveticaBold,
                )?;
            }
        }
        doc.set_font(FAMILY, ITEM_SIZE)?;
        Ok(doc)
    }
}

/// Document plus the cursor walking down its pages
struct PageWriter {
    doc: PdfDocument,
    cursor: PageCursor,
}

impl PageWriter {
    /// Reserve a line of height `h` and draw `text` at `x`
    fn line(&mut self, text: &str, size: f32, weight: FontWeight, h: f64, x: f64) -> Result<()> {
        let (page, top) = self.cursor.place_line(h);
        self.draw(text, page, top, size, weight, x)
    }

    fn draw(
        &mut self,
        text: &str,
        page: usize,
        top: f64,
        size: f32,
        weight: FontWeight,
        x: f64,
    ) -> Result<()> {
        while self.doc.page_count() < page {
            self.doc.add_page();
        }
        self.doc.set_font_size(size)?;
        self.doc.set_font_weight(weight)?;

        let baseline = self.doc.geometry().height - top + size as f64;
        self.doc.insert_text(text, page, x, baseline, Align::Left)?;
        Ok(())
    }

    /// Split `text` to the width left after the item indent
    fn wrap(&mut self, text: &str, size: f32, max_width: f64) -> Result<Vec<String>> {
        self.doc.set_font_size(size)?;
        self.doc.set_font_weight(FontWeight::Regular)?;
        let doc = &self.doc;
        Ok(wrap_to_width(text, max_width, |s| {
            doc.text_width(s).unwrap_or(0.0)
        }))
    }
}

impl Renderer for PagedRenderer {
    fn render(&self, record: &ResumeRecord) -> Result<Vec<u8>> {
        let mut writer = PageWriter {
            doc: self.new_document()?,
            cursor: PageCursor::new(self.geometry),
        };
        writer.doc.add_page();

        let left = self.geometry.left_margin;
        let item_width = self.geometry.content_width() - ITEM_INDENT;

        writer.line(
            or_sentinel(&record.name),
            NAME_SIZE,
            FontWeight::Bold,
            NAME_HEIGHT,
            left,
        )?;
        if let Some(headline) = &record.headline {
            writer.line(
                or_sentinel(headline),
                HEADLINE_SIZE,
                FontWeight::Regular,
                HEADLINE_HEIGHT,
                left,
            )?;
        }

        for section in &record.sections {
            writer.cursor.move_cursor(SECTION_GAP);
            writer.line(
                &section.title,
                TITLE_SIZE,
                FontWeight::Bold,
                TITLE_HEIGHT,
                left,
            )?;

            for item in &section.items {
                let lines = writer.wrap(item, ITEM_SIZE, item_width)?;
                for (index, line) in lines.iter().enumerate() {
                    let (page, top) = writer.cursor.place_line(ITEM_HEIGHT);
                    if index == 0 {
                        writer.draw(
                            BULLET,
                            page,
                            top,
                            ITEM_SIZE,
                            FontWeight::Regular,
                            left + BULLET_INDENT,
                        )?;
                    }
                    writer.draw(
                        line,
                        page,
                        top,
                        ITEM_SIZE,
                        FontWeight::Regular,
                        left + ITEM_INDENT,
                    )?;
                }
            }
        }

        log::debug!(
            "paged render: {} sections on {} pages",
            record.sections.len(),
            writer.doc.page_count()
        );
        Ok(writer.doc.to_bytes()?)
    }
}

const SIMPLE_NAME_SIZE: f32 = 18.0;
const SIMPLE_HEADLINE_SIZE: f32 = 12.0;
const SIMPLE_TITLE_SIZE: f32 = 14.0;
const SIMPLE_ITEM_SIZE: f32 = 11.0;
const SIMPLE_ITEM_OFFSET: f64 = 10.0;

/// One-line-per-block renderer over the minimal emitter
#[derive(Debug, Clone)]
pub struct SimpleRenderer {
    font: RenderFont,
}

impl SimpleRenderer {
    pub fn new(font: RenderFont) -> Self {
        Self { font }
    }

    /// Flatten the record into emitter blocks
    ///
    /// `measure` gives the width of a string at a size; items are wrapped
    /// to the content width minus their indent.
    fn blocks<F>(&self, record: &ResumeRecord, max_width: f64, measure: F) -> Vec<TextBlock>
    where
        F: Fn(&str, f32) -> f64,
    {
        let mut blocks = vec![TextBlock::new(or_sentinel(&record.name), SIMPLE_NAME_SIZE)];
        if let Some(headline) = &record.headline {
            blocks.push(TextBlock::new(or_sentinel(headline), SIMPLE_HEADLINE_SIZE));
        }

        for section in &record.sections {
            blocks.push(TextBlock::new(section.title.as_str(), SIMPLE_TITLE_SIZE));
            for item in &section.items {
                let text = format!("{BULLET} {item}");
                let lines = wrap_to_width(&text, max_width - SIMPLE_ITEM_OFFSET, |s| {
                    measure(s, SIMPLE_ITEM_SIZE)
                });
                blocks.extend(lines.into_iter().map(|line| {
                    TextBlock::new(line, SIMPLE_ITEM_SIZE).with_offset(SIMPLE_ITEM_OFFSET)
                }));
            }
        }
        blocks
    }
}

impl Renderer for SimpleRenderer {
    fn render(&self, record: &ResumeRecord) -> Result<Vec<u8>> {
        match &self.font {
            RenderFont::Embedded(resolved) => {
                let font = FontData::from_bytes(&resolved.family, resolved.regular.clone(), 0)?;
                let emitter = MinimalPdf::with_font(font.clone());
                let width = emitter.geometry().content_width();
                let blocks =
                    self.blocks(record, width, |s, size| font.text_width_points(s, size));
                Ok(emitter.render(&blocks)?)
            }
            RenderFont::Builtin => {
                let emitter = MinimalPdf::new();
                let width = emitter.geometry().content_width();
                let blocks = self.blocks(record, width, |s, size| {
                    StandardFont::Helvetica.text_width_points(s, size)
                });
                Ok(emitter.render(&blocks)?)
            }
        }
    }
}
