//! Paginated PDF document builder

use crate::font::{FontData, FontFamily, FontFamilyBuilder, FontWeight, StandardFont};
use crate::layout::PageGeometry;
use crate::text::{generate_text_operators, TextRenderContext};
use crate::{Align, PdfError, Result};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::{BTreeMap, HashMap};
use std::io::Write;

/// A buffered text operation for deferred encoding
///
/// Text is buffered while laying out and encoded during save, after fonts
/// have been subsetted and glyph IDs remapped.
#[derive(Debug, Clone)]
struct BufferedTextOp {
    text: String,
    /// Registered family name
    family: String,
    weight: FontWeight,
    /// Font resource name (e.g., "F1")
    font_resource_name: String,
    /// Page number (1-indexed)
    page: usize,
    /// X coordinate (PDF coordinates, alignment already applied)
    x: f64,
    /// Y coordinate (PDF coordinates)
    y: f64,
    font_size: f32,
}

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub fn black() -> Self {
        Self {
            r: 0.0,
            g: 0.0,
            b: 0.0,
        }
    }
}

/// Where a registered family's glyphs come from
#[derive(Debug, Clone)]
enum FontSource {
    Embedded(FontFamily),
    Standard {
        regular: StandardFont,
        bold: StandardFont,
    },
}

impl FontSource {
    fn standard(&self, weight: FontWeight) -> Option<StandardFont> {
        match self {
            FontSource::Standard { regular, bold } => Some(match weight {
                FontWeight::Regular => *regular,
                FontWeight::Bold => *bold,
            }),
            FontSource::Embedded(_) => None,
        }
    }
}

/// A new PDF document built page by page
///
/// Pages share one [`PageGeometry`]. Text positions passed to
/// [`insert_text`](Self::insert_text) are measured from the top edge of the
/// page, converted to PDF coordinates internally.
pub struct PdfDocument {
    inner: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    geometry: PageGeometry,
    /// Registered font families
    font_families: HashMap<String, FontSource>,
    current_family: Option<String>,
    current_weight: FontWeight,
    current_font_size: f32,
    /// Page font resources (page number -> (family, weight) -> resource name)
    page_font_resources: HashMap<usize, BTreeMap<(String, FontWeight), String>>,
    next_font_resource: u32,
    /// Buffered content operators per page (page number -> operators)
    page_content_buffer: HashMap<usize, Vec<u8>>,
    /// Buffered text operations (encoded during save after font subsetting)
    buffered_text_ops: Vec<BufferedTextOp>,
    compress: bool,
}

impl PdfDocument {
    /// Create an empty document (no pages yet)
    pub fn new(geometry: PageGeometry) -> Self {
        let mut inner = Document::with_version("1.7");
        let pages_id = inner.new_object_id();
        let catalog_id = inner.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        inner.trailer.set("Root", catalog_id);

        Self {
            inner,
            pages_id,
            page_ids: Vec::new(),
            geometry,
            font_families: HashMap::new(),
            current_family: None,
            current_weight: FontWeight::Regular,
            current_font_size: 12.0,
            page_font_resources: HashMap::new(),
            next_font_resource: 1,
            page_content_buffer: HashMap::new(),
            buffered_text_ops: Vec::new(),
            compress: true,
        }
    }

    /// Write content streams without FlateDecode (readable in a text editor)
    pub fn set_compression(&mut self, compress: bool) {
        self.compress = compress;
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Append a blank page and return its number (1-indexed)
    pub fn add_page(&mut self) -> usize {
        let page_id = self.inner.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                Object::Real(self.geometry.width as f32),
                Object::Real(self.geometry.height as f32),
            ],
            "Resources" => Dictionary::new(),
        });
        self.page_ids.push(page_id);
        self.page_ids.len()
    }

    /// Register an embedded font family
    ///
    /// # Example
    /// ```ignore
    /// doc.register_font_family(
    ///     "jp",
    ///     FontFamilyBuilder::new()
    ///         .regular(regular_bytes, 0)
    ///         .bold(bold_bytes, 0),
    /// )?;
    /// ```
    pub fn register_font_family(&mut self, name: &str, builder: FontFamilyBuilder) -> Result<()> {
        if self.font_families.contains_key(name) {
            return Err(PdfError::FontAlreadyExists(name.to_string()));
        }

        let family = builder.build(name)?;
        self.font_families
            .insert(name.to_string(), FontSource::Embedded(family));
        Ok(())
    }

    /// Register a family backed by builtin standard fonts (no embedding)
    pub fn register_standard_font(
        &mut self,
        name: &str,
        regular: StandardFont,
        bold: StandardFont,
    ) -> Result<()> {
        if self.font_families.contains_key(name) {
            return Err(PdfError::FontAlreadyExists(name.to_string()));
        }
        self.font_families
            .insert(name.to_string(), FontSource::Standard { regular, bold });
        Ok(())
    }

    /// Set the current font family and size
    pub fn set_font(&mut self, family: &str, size: f32) -> Result<()> {
        if !self.font_families.contains_key(family) {
            return Err(PdfError::FontNotFound(family.to_string()));
        }

        self.current_family = Some(family.to_string());
        self.current_font_size = size;
        Ok(())
    }

    /// Set only the font size (keeps current family/weight)
    pub fn set_font_size(&mut self, size: f32) -> Result<()> {
        if self.current_family.is_none() {
            return Err(PdfError::FontNotFound("No font family set".to_string()));
        }

        self.current_font_size = size;
        Ok(())
    }

    /// Set the font weight (keeps current family/size)
    ///
    /// Families without a bold face render bold text with the regular face.
    pub fn set_font_weight(&mut self, weight: FontWeight) -> Result<()> {
        if self.current_family.is_none() {
            return Err(PdfError::FontNotFound("No font family set".to_string()));
        }

        self.current_weight = weight;
        Ok(())
    }

    fn current_source(&self) -> Result<(&str, &FontSource)> {
        let family = self
            .current_family
            .as_deref()
            .ok_or_else(|| PdfError::FontNotFound("No font family set".to_string()))?;
        let source = self
            .font_families
            .get(family)
            .ok_or_else(|| PdfError::FontNotFound(family.to_string()))?;
        Ok((family, source))
    }

    /// Width of `text` in points with the current font settings
    pub fn text_width(&self, text: &str) -> Result<f64> {
        let (_, source) = self.current_source()?;
        Ok(match source {
            FontSource::Embedded(family) => family
                .get_variant(self.current_weight)
                .text_width_points(text, self.current_font_size),
            FontSource::Standard { .. } => source
                .standard(self.current_weight)
                .map(|font| font.text_width_points(text, self.current_font_size))
                .unwrap_or(0.0),
        })
    }

    /// Insert text at a specific position
    ///
    /// # Arguments
    /// * `text` - Text to insert
    /// * `page` - Page number (1-indexed)
    /// * `x` - X coordinate in points
    /// * `y` - Baseline Y coordinate in points, measured from the top
    /// * `align` - Text alignment relative to `x`
    ///
    /// Text a standard font cannot encode, or an embedded face has no glyphs
    /// for, fails with [`PdfError::UnsupportedText`]; nothing is buffered in
    /// that case.
    pub fn insert_text(
        &mut self,
        text: &str,
        page: usize,
        x: f64,
        y: f64,
        align: Align,
    ) -> Result<()> {
        let page_count = self.page_count();
        if page == 0 || page > page_count {
            return Err(PdfError::InvalidPage(page, page_count));
        }

        if text.is_empty() {
            return Ok(());
        }

        let (family, source) = self.current_source()?;
        let family = family.to_string();
        if let Some(standard) = source.standard(self.current_weight) {
            standard.encode_literal(text)?;
        }

        let width = self.text_width(text)?;
        let start_x = match align {
            Align::Left => x,
            Align::Center => x - width / 2.0,
            Align::Right => x - width,
        };
        let pdf_y = self.geometry.height - y;

        if let Some(FontSource::Embedded(fonts)) = self.font_families.get_mut(&family) {
            let font = fonts.get_variant_mut(self.current_weight);
            if !font.covers(text) {
                return Err(PdfError::UnsupportedText {
                    font: font.name.clone(),
                    text: text.to_string(),
                });
            }
            font.add_chars(text);
        }

        let font_resource_name = self.get_or_create_font_ref(&family, self.current_weight, page);
        self.buffered_text_ops.push(BufferedTextOp {
            text: text.to_string(),
            family,
            weight: self.current_weight,
            font_resource_name,
            page,
            x: start_x,
            y: pdf_y,
            font_size: self.current_font_size,
        });

        Ok(())
    }

    /// Resource name (e.g., "F1") for a family variant on a page
    fn get_or_create_font_ref(&mut self, family: &str, weight: FontWeight, page: usize) -> String {
        let key = (family.to_string(), effective_weight(&self.font_families, family, weight));
        let page_resources = self.page_font_resources.entry(page).or_default();
        if let Some(resource_name) = page_resources.get(&key) {
            return resource_name.clone();
        }

        let resource_name = format!("F{}", self.next_font_resource);
        self.next_font_resource += 1;
        page_resources.insert(key, resource_name.clone());
        resource_name
    }

    /// Serialize the document
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        if self.page_ids.is_empty() {
            self.add_page();
        }

        // 1. Subset fonts (creates subsets with only used glyphs)
        self.subset_fonts();

        // 2. Encode buffered text with remapped glyph IDs
        self.encode_buffered_text()?;

        // 3. Flush buffered content streams to pages
        self.flush_content_buffers()?;

        // 4. Embed fonts and wire page resources
        self.embed_fonts()?;

        self.finalize_page_tree();

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;

        log::debug!(
            "document saved: {} pages, {} bytes",
            self.page_ids.len(),
            buffer.len()
        );
        Ok(buffer)
    }

    /// Subset every embedded face that has been used
    ///
    /// A face the subsetter rejects is embedded whole.
    fn subset_fonts(&mut self) {
        for source in self.font_families.values_mut() {
            let FontSource::Embedded(family) = source else {
                continue;
            };
            for font in family.variants_mut() {
                if font.used_chars.is_empty() {
                    continue;
                }
                if let Err(e) = font.create_subset() {
                    log::warn!("embedding full font {}: {e}", font.name);
                }
            }
        }
    }

    /// Encode buffered text operations and add them to content buffers
    fn encode_buffered_text(&mut self) -> Result<()> {
        let text_ops = std::mem::take(&mut self.buffered_text_ops);

        for op in text_ops {
            let source = self
                .font_families
                .get(&op.family)
                .ok_or_else(|| PdfError::FontNotFound(op.family.clone()))?;
            let operand = match source {
                FontSource::Embedded(family) => family.get_variant(op.weight).encode_text_hex(&op.text),
                FontSource::Standard { .. } => match source.standard(op.weight) {
                    Some(font) => font.encode_literal(&op.text)?,
                    None => continue,
                },
            };

            let ctx = TextRenderContext {
                font_name: op.font_resource_name,
                font_size: op.font_size,
                text_width: 0.0,
                color: Color::black(),
            };

            // position already aligned in insert_text
            let operators = generate_text_operators(&operand, op.x, op.y, Align::Left, &ctx);
            self.buffer_content(op.page, &operators);
        }

        Ok(())
    }

    fn buffer_content(&mut self, page: usize, content: &[u8]) {
        self.page_content_buffer
            .entry(page)
            .or_default()
            .extend_from_slice(content);
    }

    /// Write one content stream per page
    fn flush_content_buffers(&mut self) -> Result<()> {
        let mut buffers = std::mem::take(&mut self.page_content_buffer);

        for (index, &page_id) in self.page_ids.clone().iter().enumerate() {
            let content = buffers.remove(&(index + 1)).unwrap_or_default();
            let stream = if self.compress && !content.is_empty() {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(&content)?;
                let compressed = encoder.finish()?;
                Stream::new(dictionary! { "Filter" => "FlateDecode" }, compressed)
            } else {
                Stream::new(Dictionary::new(), content)
            };
            let contents_id = self.inner.add_object(stream);
            self.page_dict_mut(page_id)?
                .set("Contents", Object::Reference(contents_id));
        }

        Ok(())
    }

    /// Embed used fonts and add them to the pages that reference them
    fn embed_fonts(&mut self) -> Result<()> {
        let mut embedded: HashMap<(String, FontWeight), ObjectId> = HashMap::new();
        let page_resources = std::mem::take(&mut self.page_font_resources);

        for (page, fonts) in &page_resources {
            let page_id = *self
                .page_ids
                .get(page - 1)
                .ok_or(PdfError::InvalidPage(*page, self.page_ids.len()))?;

            let mut font_dict = Dictionary::new();
            for (key, resource_name) in fonts {
                let font_id = match embedded.get(key) {
                    Some(id) => *id,
                    None => {
                        let id = self.embed_font_object(&key.0, key.1)?;
                        embedded.insert(key.clone(), id);
                        id
                    }
                };
                font_dict.set(resource_name.as_bytes(), Object::Reference(font_id));
            }

            let page_dict = self.page_dict_mut(page_id)?;
            page_dict.set("Resources", dictionary! { "Font" => font_dict });
        }

        self.page_font_resources = page_resources;
        Ok(())
    }

    /// Add the objects for one font variant, returning the font dictionary ID
    fn embed_font_object(&mut self, family: &str, weight: FontWeight) -> Result<ObjectId> {
        let source = self
            .font_families
            .get(family)
            .ok_or_else(|| PdfError::FontNotFound(family.to_string()))?;

        let font_data: &FontData = match source {
            FontSource::Embedded(fonts) => fonts.get_variant(weight),
            FontSource::Standard { .. } => {
                let dict = source
                    .standard(weight)
                    .map(|font| font.to_dictionary())
                    .unwrap_or_else(Dictionary::new);
                return Ok(self.inner.add_object(dict));
            }
        };

        let font_objects = font_data.to_pdf_objects()?;

        let font_file_id = self.inner.add_object(font_objects.font_file_stream);

        let mut font_descriptor = font_objects.font_descriptor;
        font_descriptor.set(font_objects.font_file_key, Object::Reference(font_file_id));
        let font_descriptor_id = self.inner.add_object(font_descriptor);

        let mut cid_font = font_objects.cid_font;
        cid_font.set("FontDescriptor", Object::Reference(font_descriptor_id));
        let cid_font_id = self.inner.add_object(cid_font);

        let tounicode_id = self.inner.add_object(font_objects.tounicode_stream);

        let mut type0_font = font_objects.type0_font;
        type0_font.set(
            "DescendantFonts",
            Object::Array(vec![Object::Reference(cid_font_id)]),
        );
        type0_font.set("ToUnicode", Object::Reference(tounicode_id));

        Ok(self.inner.add_object(type0_font))
    }

    fn finalize_page_tree(&mut self) {
        let kids: Vec<Object> = self.page_ids.iter().map(|&id| id.into()).collect();
        self.inner.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => self.page_ids.len() as i64,
            }),
        );
    }

    fn page_dict_mut(&mut self, page_id: ObjectId) -> Result<&mut Dictionary> {
        self.inner
            .get_object_mut(page_id)?
            .as_dict_mut()
            .map_err(|_| PdfError::SaveError("Page object is not a dictionary".to_string()))
    }
}

/// Bold falls back to regular when an embedded family has no bold face
fn effective_weight(
    families: &HashMap<String, FontSource>,
    family: &str,
    weight: FontWeight,
) -> FontWeight {
    match families.get(family) {
        Some(FontSource::Embedded(fonts)) if fonts.bold.is_none() => FontWeight::Regular,
        _ => weight,
    }
}
