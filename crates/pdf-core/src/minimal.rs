//! Minimal PDF emitter
//!
//! Writes a complete PDF byte-for-byte without going through a PDF library:
//! catalog, page tree, one page + content stream pair per page, and either a
//! builtin Type1 font or an embedded Type0 font. Objects are numbered in the
//! order they are written and the cross-reference table records the exact
//! offset of every `N 0 obj` line.
//!
//! Layout is a single column of text blocks on US Letter. The cursor starts
//! at y = 750 and moves down by `font_size + 6` per block; a block that would
//! end below the bottom margin opens a new page.

use crate::document::Color;
use crate::font::{EmbeddingParts, FontData, StandardFont};
use crate::layout::{PageCursor, PageGeometry};
use crate::text::{generate_text_operators, TextRenderContext};
use crate::{Align, PdfError, Result};
use std::fmt::Write as _;

const FONT_RESOURCE: &str = "F1";
const LEADING: f64 = 6.0;

/// One line of text for the minimal emitter
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub text: String,
    pub font_size: f32,
    /// Extra indent from the left margin, in points
    pub x_offset: f64,
}

impl TextBlock {
    pub fn new(text: impl Into<String>, font_size: f32) -> Self {
        Self {
            text: text.into(),
            font_size,
            x_offset: 0.0,
        }
    }

    pub fn with_offset(mut self, x_offset: f64) -> Self {
        self.x_offset = x_offset;
        self
    }
}

enum EmitterFont {
    Builtin(StandardFont),
    Embedded(FontData),
}

/// Byte-level PDF writer for a list of text blocks
pub struct MinimalPdf {
    geometry: PageGeometry,
    font: EmitterFont,
}

impl MinimalPdf {
    /// Emitter using builtin Helvetica (WinAnsi text only)
    pub fn new() -> Self {
        Self {
            geometry: PageGeometry::letter(),
            font: EmitterFont::Builtin(StandardFont::Helvetica),
        }
    }

    /// Emitter embedding `font` as a Type0/Identity-H font
    pub fn with_font(font: FontData) -> Self {
        Self {
            geometry: PageGeometry::letter(),
            font: EmitterFont::Embedded(font),
        }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// Render blocks into a PDF file
    ///
    /// An empty slice yields one blank page. Text the builtin font cannot
    /// encode fails with [`PdfError::FontNotFound`].
    pub fn render(&self, blocks: &[TextBlock]) -> Result<Vec<u8>> {
        let mut font = match &self.font {
            EmitterFont::Builtin(_) => None,
            EmitterFont::Embedded(data) => Some(data.clone()),
        };

        if let Some(font) = font.as_mut() {
            for block in blocks {
                if !font.covers(&block.text) {
                    return Err(PdfError::FontNotFound(format!(
                        "{} has no glyphs for {:?}",
                        font.name, block.text
                    )));
                }
                font.add_chars(&block.text);
            }
            // a blank page still subsets, down to .notdef
            if let Err(e) = font.create_subset() {
                log::warn!("embedding full font, subsetting failed: {e}");
            }
        }

        let pages = self.layout(blocks, font.as_ref())?;
        let bytes = match (&font, &self.font) {
            (Some(font), _) => serialize(
                &self.geometry,
                &pages,
                FontOutput::Embedded(&font.embedding_parts()),
            ),
            (None, EmitterFont::Builtin(standard)) => {
                serialize(&self.geometry, &pages, FontOutput::Builtin(*standard))
            }
            (None, EmitterFont::Embedded(data)) => {
                return Err(PdfError::FontNotFound(data.name.clone()))
            }
        };

        log::debug!(
            "minimal emitter: {} blocks, {} pages, {} bytes",
            blocks.len(),
            pages.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    /// Build one content stream per page
    fn layout(&self, blocks: &[TextBlock], font: Option<&FontData>) -> Result<Vec<Vec<u8>>> {
        let mut pages: Vec<Vec<u8>> = vec![Vec::new()];
        let mut cursor = PageCursor::new(self.geometry);

        for block in blocks {
            let (page, y) = cursor.place_line(block.font_size as f64 + LEADING);
            while pages.len() < page {
                pages.push(Vec::new());
            }

            let operand = match (font, &self.font) {
                (Some(font), _) => font.encode_text_hex(&block.text),
                (None, EmitterFont::Builtin(standard)) => {
                    standard.encode_literal(&block.text).map_err(|_| {
                        PdfError::FontNotFound(format!(
                            "no CJK-capable font embedded for {:?}",
                            block.text
                        ))
                    })?
                }
                (None, EmitterFont::Embedded(data)) => {
                    return Err(PdfError::FontNotFound(data.name.clone()))
                }
            };

            let ctx = TextRenderContext {
                font_name: FONT_RESOURCE.to_string(),
                font_size: block.font_size,
                text_width: 0.0,
                color: Color::black(),
            };
            let x = self.geometry.left_margin + block.x_offset;
            let ops = generate_text_operators(&operand, x, y, Align::Left, &ctx);
            pages[page - 1].extend_from_slice(&ops);
        }

        Ok(pages)
    }
}

impl Default for MinimalPdf {
    fn default() -> Self {
        Self::new()
    }
}

enum FontOutput<'a> {
    Builtin(StandardFont),
    Embedded(&'a EmbeddingParts),
}

/// Sequential object writer that records byte offsets
struct ObjectWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl ObjectWriter {
    fn new() -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n");
        // binary marker comment so transfer tools keep the file 8-bit clean
        buf.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    fn begin(&mut self, id: usize) {
        debug_assert_eq!(id, self.offsets.len() + 1, "objects must be written in order");
        self.offsets.push(self.buf.len());
        self.buf.extend_from_slice(format!("{id} 0 obj\n").as_bytes());
    }

    fn dict(&mut self, id: usize, dict: &str) {
        self.begin(id);
        self.buf.extend_from_slice(dict.as_bytes());
        self.buf.extend_from_slice(b"\nendobj\n");
    }

    fn stream(&mut self, id: usize, extra_entries: &str, data: &[u8]) {
        self.begin(id);
        self.buf.extend_from_slice(
            format!("<< /Length {}{extra_entries} >>\nstream\n", data.len()).as_bytes(),
        );
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\nendstream\nendobj\n");
    }

    /// Write the cross-reference table and trailer
    fn finish(mut self) -> Vec<u8> {
        let xref_offset = self.buf.len();
        let size = self.offsets.len() + 1;

        let mut xref = format!("xref\n0 {size}\n0000000000 65535 f \n");
        for offset in &self.offsets {
            let _ = writeln!(xref, "{offset:010} 00000 n ");
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {size} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n"
        );
        self.buf.extend_from_slice(xref.as_bytes());
        self.buf
    }
}

fn serialize(geometry: &PageGeometry, pages: &[Vec<u8>], font: FontOutput<'_>) -> Vec<u8> {
    // 1 catalog, 2 pages, then (page, content) pairs, font objects last
    let page_id = |i: usize| 3 + 2 * i;
    let font_id = 3 + 2 * pages.len();

    let mut writer = ObjectWriter::new();
    writer.dict(1, "<< /Type /Catalog /Pages 2 0 R >>");

    let kids: Vec<String> = (0..pages.len()).map(|i| format!("{} 0 R", page_id(i))).collect();
    writer.dict(
        2,
        &format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages.len()
        ),
    );

    for (i, content) in pages.iter().enumerate() {
        let id = page_id(i);
        writer.dict(
            id,
            &format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Contents {} 0 R /Resources << /Font << /{FONT_RESOURCE} {font_id} 0 R >> >> >>",
                geometry.width,
                geometry.height,
                id + 1
            ),
        );
        writer.stream(id + 1, "", content);
    }

    match font {
        FontOutput::Embedded(parts) => write_embedded_font(&mut writer, font_id, parts),
        FontOutput::Builtin(standard) => writer.dict(
            font_id,
            &format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                standard.base_font()
            ),
        ),
    }

    writer.finish()
}

/// Type0 -> CIDFont -> FontDescriptor -> font file, plus ToUnicode
fn write_embedded_font(writer: &mut ObjectWriter, font_id: usize, parts: &EmbeddingParts) {
    let cid_id = font_id + 1;
    let descriptor_id = font_id + 2;
    let file_id = font_id + 3;
    let tounicode_id = font_id + 4;

    writer.dict(
        font_id,
        &format!(
            "<< /Type /Font /Subtype /Type0 /BaseFont /{} /Encoding /Identity-H /DescendantFonts [{cid_id} 0 R] /ToUnicode {tounicode_id} 0 R >>",
            parts.base_font
        ),
    );

    let mut widths = String::new();
    for (cid, width) in &parts.widths {
        let _ = write!(widths, "{cid} [{width}] ");
    }
    let cid_to_gid = if parts.is_cff {
        ""
    } else {
        " /CIDToGIDMap /Identity"
    };
    writer.dict(
        cid_id,
        &format!(
            "<< /Type /Font /Subtype /{} /BaseFont /{} /CIDSystemInfo << /Registry (Adobe) /Ordering (Identity) /Supplement 0 >> /FontDescriptor {descriptor_id} 0 R /DW 1000 /W [{}]{cid_to_gid} >>",
            parts.cid_subtype(),
            parts.base_font,
            widths.trim_end()
        ),
    );

    let file_key = if parts.is_cff { "FontFile3" } else { "FontFile2" };
    let [x0, y0, x1, y1] = parts.bbox;
    writer.dict(
        descriptor_id,
        &format!(
            "<< /Type /FontDescriptor /FontName /{} /Flags 4 /FontBBox [{x0} {y0} {x1} {y1}] /ItalicAngle 0 /Ascent {} /Descent {} /CapHeight {} /StemV 80 /{file_key} {file_id} 0 R >>",
            parts.base_font, parts.ascent, parts.descent, parts.cap_height
        ),
    );

    let file_entries = if parts.is_cff {
        " /Subtype /OpenType".to_string()
    } else {
        format!(" /Length1 {}", parts.font_bytes.len())
    };
    writer.stream(file_id, &file_entries, &parts.font_bytes);
    writer.stream(tounicode_id, "", parts.tounicode.as_bytes());
}
