//! Font handling for PDF documents

use crate::text::encode_win_ansi;
use crate::{PdfError, Result};
use lopdf::{Dictionary, Object, Stream};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use subsetter::GlyphRemapper;

/// Font weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

/// Built-in PDF standard 14 fonts usable without embedding (non-CJK)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

/// Helvetica advance widths for ' '..='~' (1000 units/em)
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556,
    556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, 1015, 667, 667, 722,
    722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722,
    667, 944, 667, 667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556, 278, 556,
    556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500,
    500, 334, 260, 334, 584,
];

impl StandardFont {
    /// PostScript name used as /BaseFont
    pub fn base_font(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// The font dictionary (Type1, WinAnsiEncoding)
    pub fn to_dictionary(&self) -> Dictionary {
        Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "Type1".into()),
            ("BaseFont", Object::Name(self.base_font().as_bytes().to_vec())),
            ("Encoding", "WinAnsiEncoding".into()),
        ])
    }

    /// Approximate text width in points
    ///
    /// Bold is measured with the regular metrics widened by 5%.
    pub fn text_width_points(&self, text: &str, font_size: f32) -> f64 {
        let units: u32 = text
            .chars()
            .map(|c| match c {
                ' '..='~' => HELVETICA_WIDTHS[(c as usize) - 0x20] as u32,
                _ => 556,
            })
            .sum();
        let factor = match self {
            StandardFont::Helvetica => 1.0,
            StandardFont::HelveticaBold => 1.05,
        };
        units as f64 / 1000.0 * font_size as f64 * factor
    }

    /// Encode text as an escaped literal operand, or fail if not representable
    pub fn encode_literal(&self, text: &str) -> Result<Vec<u8>> {
        let bytes = encode_win_ansi(text).ok_or_else(|| PdfError::UnsupportedText {
            font: self.base_font().to_string(),
            text: text.to_string(),
        })?;
        Ok(crate::text::literal_operand(&bytes))
    }
}

/// An embeddable TrueType/OpenType font
///
/// The raw bytes are shared; per-document state (used characters and the
/// subset built at save time) lives in each `FontData` value.
#[derive(Debug, Clone)]
pub struct FontData {
    /// Font name/identifier
    pub name: String,
    /// Raw font file bytes
    data: Arc<[u8]>,
    /// Face index inside a collection (.ttc)
    index: u32,
    /// Characters used (for subsetting)
    pub used_chars: BTreeSet<char>,
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    cap_height: i16,
    bbox: [i16; 4],
    /// CFF outlines (no glyf table) embed as FontFile3/OpenType
    is_cff: bool,
    subset: Option<FontSubset>,
}

#[derive(Debug, Clone)]
struct FontSubset {
    /// original glyph ID -> glyph ID inside the subset
    gid_map: BTreeMap<u16, u16>,
    data: Vec<u8>,
}

/// Writer-independent values for the embedded font objects
pub(crate) struct EmbeddingParts {
    pub base_font: String,
    pub is_cff: bool,
    pub font_bytes: Vec<u8>,
    /// `(cid, width)` pairs in 1000 units/em
    pub widths: Vec<(u16, i64)>,
    pub bbox: [i32; 4],
    pub ascent: i32,
    pub descent: i32,
    pub cap_height: i32,
    pub tounicode: String,
}

impl EmbeddingParts {
    pub fn cid_subtype(&self) -> &'static str {
        if self.is_cff {
            "CIDFontType0"
        } else {
            "CIDFontType2"
        }
    }
}

/// PDF objects generated for font embedding
pub struct FontObjects {
    /// Type0 font dictionary
    pub type0_font: Dictionary,
    /// CIDFont dictionary
    pub cid_font: Dictionary,
    /// Font descriptor dictionary
    pub font_descriptor: Dictionary,
    /// Font file stream
    pub font_file_stream: Stream,
    /// Key the font file is stored under in the descriptor
    pub font_file_key: &'static str,
    /// ToUnicode CMap stream
    pub tounicode_stream: Stream,
}

impl FontData {
    /// Create font data from font file bytes
    ///
    /// # Arguments
    /// * `name` - Font identifier
    /// * `data` - TrueType/OpenType file bytes
    /// * `index` - Face index for collections, 0 otherwise
    pub fn from_bytes(name: &str, data: Arc<[u8]>, index: u32) -> Result<Self> {
        let face = ttf_parser::Face::parse(&data, index)
            .map_err(|e| PdfError::FontParseError(format!("{name}: {e:?}")))?;

        let rect = face.global_bounding_box();
        let units_per_em = face.units_per_em();
        let ascender = face.ascender();
        let descender = face.descender();
        let cap_height = face.capital_height().unwrap_or(ascender);
        let is_cff = face.tables().glyf.is_none();

        Ok(Self {
            name: name.to_string(),
            data: data.clone(),
            index,
            used_chars: BTreeSet::new(),
            units_per_em,
            ascender,
            descender,
            cap_height,
            bbox: [rect.x_min, rect.y_min, rect.x_max, rect.y_max],
            is_cff,
            subset: None,
        })
    }

    fn face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, self.index).ok()
    }

    /// Add characters to the used set (for subsetting)
    pub fn add_chars(&mut self, text: &str) {
        self.used_chars.extend(text.chars());
        self.subset = None;
    }

    /// Get glyph ID for a character
    pub fn glyph_id(&self, c: char) -> Option<u16> {
        self.face()
            .and_then(|face| face.glyph_index(c).map(|id| id.0))
    }

    /// Check if font has a glyph for the given character
    pub fn has_glyph(&self, c: char) -> bool {
        self.glyph_id(c).map(|id| id != 0).unwrap_or(false)
    }

    /// True if every non-whitespace character of `text` has a glyph
    pub fn covers(&self, text: &str) -> bool {
        text.chars()
            .filter(|c| !c.is_whitespace())
            .all(|c| self.has_glyph(c))
    }

    /// Font units per em
    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    /// Calculate text width in points for a given font size
    pub fn text_width_points(&self, text: &str, font_size: f32) -> f64 {
        let Some(face) = self.face() else {
            return 0.0;
        };
        let units: u32 = text
            .chars()
            .filter_map(|c| face.glyph_index(c))
            .filter_map(|gid| face.glyph_hor_advance(gid))
            .map(u32::from)
            .sum();
        units as f64 / self.units_per_em as f64 * font_size as f64
    }

    fn to_pdf_units(&self, value: i32) -> i32 {
        (value as f64 * 1000.0 / self.units_per_em as f64).round() as i32
    }

    /// Sorted original glyph IDs of the used characters
    fn used_glyphs(&self) -> Vec<u16> {
        let mut gids: Vec<u16> = self
            .used_chars
            .iter()
            .filter_map(|&c| self.glyph_id(c))
            .collect();
        gids.sort_unstable();
        gids.dedup();
        gids
    }

    /// Create a subset that only contains the used glyphs
    ///
    /// Glyph IDs are renumbered; encoding after this call uses the new IDs.
    pub fn create_subset(&mut self) -> Result<()> {
        let mut remapper = GlyphRemapper::new();
        let gid_map: BTreeMap<u16, u16> = self
            .used_glyphs()
            .into_iter()
            .map(|gid| (gid, remapper.remap(gid)))
            .collect();

        let data = subsetter::subset(&self.data, self.index, &remapper)
            .map_err(|e| PdfError::FontSubsetError(format!("{}: {e:?}", self.name)))?;

        log::debug!(
            "subset font {}: {} -> {} bytes",
            self.name,
            self.data.len(),
            data.len()
        );
        self.subset = Some(FontSubset { gid_map, data });
        Ok(())
    }

    /// CID written to the content stream for a character
    fn cid_for(&self, c: char) -> u16 {
        let gid = self.glyph_id(c).unwrap_or(0);
        match &self.subset {
            Some(subset) => subset.gid_map.get(&gid).copied().unwrap_or(0),
            None => gid,
        }
    }

    /// Encode text as a hex string operand for the Tj operator
    pub fn encode_text_hex(&self, text: &str) -> Vec<u8> {
        let mut result = String::with_capacity(text.len() * 4 + 2);
        result.push('<');
        for c in text.chars() {
            result.push_str(&format!("{:04X}", self.cid_for(c)));
        }
        result.push('>');
        result.into_bytes()
    }

    /// Six-letter subset tag derived from the used glyph set
    fn subset_tag(&self) -> String {
        let mut hasher = DefaultHasher::new();
        self.name.hash(&mut hasher);
        self.used_glyphs().hash(&mut hasher);
        let mut value = hasher.finish();
        (0..6)
            .map(|_| {
                let letter = (b'A' + (value % 26) as u8) as char;
                value /= 26;
                letter
            })
            .collect()
    }

    fn base_font_name(&self) -> String {
        let clean: String = self
            .name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect();
        if self.subset.is_some() {
            format!("{}+{}", self.subset_tag(), clean)
        } else {
            clean
        }
    }

    /// Compute everything the font objects need, independent of the writer
    ///
    /// Uses the subset if [`create_subset`](Self::create_subset) ran.
    pub(crate) fn embedding_parts(&self) -> EmbeddingParts {
        let font_bytes = match &self.subset {
            Some(subset) => subset.data.clone(),
            None => self.data.to_vec(),
        };
        EmbeddingParts {
            base_font: self.base_font_name(),
            is_cff: self.is_cff,
            font_bytes,
            widths: self.cid_widths(),
            bbox: self.bbox.map(|v| self.to_pdf_units(v as i32)),
            ascent: self.to_pdf_units(self.ascender as i32),
            descent: self.to_pdf_units(self.descender as i32),
            cap_height: self.to_pdf_units(self.cap_height as i32),
            tounicode: self.generate_tounicode_cmap(),
        }
    }

    /// Generate all PDF objects needed to embed this font
    ///
    /// Object references between the returned dictionaries are left as
    /// placeholders; the caller wires them once IDs are assigned.
    pub fn to_pdf_objects(&self) -> Result<FontObjects> {
        let parts = self.embedding_parts();
        let cid_subtype = parts.cid_subtype();
        let font_name = Object::Name(parts.base_font.clone().into_bytes());

        let tounicode_stream = Stream::new(Dictionary::new(), parts.tounicode.into_bytes());

        let font_file_dict = if parts.is_cff {
            Dictionary::from_iter(vec![("Subtype", "OpenType".into())])
        } else {
            Dictionary::from_iter(vec![("Length1", (parts.font_bytes.len() as i64).into())])
        };
        let font_file_key = if parts.is_cff { "FontFile3" } else { "FontFile2" };
        let font_file_stream = Stream::new(font_file_dict, parts.font_bytes);

        let font_bbox: Vec<Object> = parts.bbox.iter().map(|&v| v.into()).collect();

        let font_descriptor = Dictionary::from_iter(vec![
            ("Type", "FontDescriptor".into()),
            ("FontName", font_name.clone()),
            ("Flags", 4.into()), // Symbolic font
            ("FontBBox", font_bbox.into()),
            ("ItalicAngle", 0.into()),
            ("Ascent", parts.ascent.into()),
            ("Descent", parts.descent.into()),
            ("CapHeight", parts.cap_height.into()),
            ("StemV", 80.into()),
        ]);

        let cid_system_info = Dictionary::from_iter(vec![
            ("Registry", Object::string_literal("Adobe")),
            ("Ordering", Object::string_literal("Identity")),
            ("Supplement", 0.into()),
        ]);

        let widths: Vec<Object> = parts
            .widths
            .iter()
            .flat_map(|&(cid, width)| {
                [Object::Integer(cid as i64), vec![Object::Integer(width)].into()]
            })
            .collect();

        let mut cid_font = Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", cid_subtype.into()),
            ("BaseFont", font_name.clone()),
            ("CIDSystemInfo", cid_system_info.into()),
            ("FontDescriptor", Object::Reference((0, 0))),
            ("W", widths.into()),
            ("DW", 1000.into()),
        ]);
        if !parts.is_cff {
            cid_font.set("CIDToGIDMap", "Identity");
        }

        let type0_font = Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "Type0".into()),
            ("BaseFont", font_name),
            ("Encoding", "Identity-H".into()),
            ("DescendantFonts", vec![Object::Reference((0, 0))].into()),
            ("ToUnicode", Object::Reference((0, 0))),
        ]);

        Ok(FontObjects {
            type0_font,
            cid_font,
            font_descriptor,
            font_file_stream,
            font_file_key,
            tounicode_stream,
        })
    }

    /// `(cid, width)` pairs for the used glyphs, widths in 1000 units/em
    fn cid_widths(&self) -> Vec<(u16, i64)> {
        let Some(face) = self.face() else {
            return Vec::new();
        };

        let mut entries: Vec<(u16, i64)> = self
            .used_chars
            .iter()
            .filter_map(|&c| {
                let gid = face.glyph_index(c)?;
                let advance = face.glyph_hor_advance(gid).unwrap_or(self.units_per_em);
                Some((self.cid_for(c), self.to_pdf_units(advance as i32) as i64))
            })
            .collect();
        entries.sort_unstable();
        entries.dedup_by_key(|e| e.0);
        entries
    }

    /// Generate ToUnicode CMap stream content
    pub(crate) fn generate_tounicode_cmap(&self) -> String {
        let mut cmap = String::new();

        cmap.push_str("/CIDInit /ProcSet findresource begin\n");
        cmap.push_str("12 dict begin\n");
        cmap.push_str("begincmap\n");
        cmap.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        cmap.push_str("/CMapName /Adobe-Identity-UCS def\n");
        cmap.push_str("/CMapType 2 def\n");
        cmap.push_str("1 begincodespacerange\n");
        cmap.push_str("<0000> <FFFF>\n");
        cmap.push_str("endcodespacerange\n");

        let mut pairs: Vec<(u16, char)> = self
            .used_chars
            .iter()
            .map(|&c| (self.cid_for(c), c))
            .filter(|(cid, _)| *cid != 0)
            .collect();
        pairs.sort_unstable();
        pairs.dedup_by_key(|p| p.0);

        // bfchar sections are limited to 100 entries each
        for chunk in pairs.chunks(100) {
            cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
            for (cid, c) in chunk {
                let mut units = [0u16; 2];
                let utf16: String = c
                    .encode_utf16(&mut units)
                    .iter()
                    .map(|u| format!("{u:04X}"))
                    .collect();
                cmap.push_str(&format!("<{cid:04X}> <{utf16}>\n"));
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\n");
        cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
        cmap.push_str("end\n");
        cmap.push_str("end\n");
        cmap
    }
}

/// Font family with regular and bold variants
#[derive(Debug, Clone)]
pub struct FontFamily {
    pub regular: FontData,
    pub bold: Option<FontData>,
}

impl FontFamily {
    /// Get the font for a weight, falling back to regular
    pub fn get_variant(&self, weight: FontWeight) -> &FontData {
        match weight {
            FontWeight::Bold => self.bold.as_ref().unwrap_or(&self.regular),
            FontWeight::Regular => &self.regular,
        }
    }

    /// Mutable variant lookup with the same fallback as [`get_variant`](Self::get_variant)
    pub fn get_variant_mut(&mut self, weight: FontWeight) -> &mut FontData {
        match weight {
            FontWeight::Bold if self.bold.is_some() => {
                self.bold.as_mut().unwrap_or(&mut self.regular)
            }
            _ => &mut self.regular,
        }
    }

    /// All loaded variants
    pub fn variants_mut(&mut self) -> impl Iterator<Item = &mut FontData> {
        std::iter::once(&mut self.regular).chain(self.bold.as_mut())
    }
}

/// Builder for registering font families
#[derive(Default)]
pub struct FontFamilyBuilder {
    regular: Option<(Arc<[u8]>, u32)>,
    bold: Option<(Arc<[u8]>, u32)>,
}

impl FontFamilyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn regular(mut self, data: Arc<[u8]>, index: u32) -> Self {
        self.regular = Some((data, index));
        self
    }

    pub fn bold(mut self, data: Arc<[u8]>, index: u32) -> Self {
        self.bold = Some((data, index));
        self
    }

    /// Build the FontFamily from the provided font data
    pub fn build(self, family_name: &str) -> Result<FontFamily> {
        let (data, index) = self.regular.ok_or_else(|| {
            PdfError::FontParseError("FontFamily must have at least a regular variant".to_string())
        })?;
        let regular = FontData::from_bytes(&format!("{family_name}-Regular"), data, index)?;

        let bold = self
            .bold
            .map(|(data, index)| FontData::from_bytes(&format!("{family_name}-Bold"), data, index))
            .transpose()?;

        Ok(FontFamily { regular, bold })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font_without_face() -> FontData {
        FontData {
            name: "test".to_string(),
            data: Arc::from(vec![0u8; 100]),
            index: 0,
            used_chars: BTreeSet::new(),
            units_per_em: 1000,
            ascender: 800,
            descender: -200,
            cap_height: 700,
            bbox: [0, -200, 1000, 800],
            is_cff: false,
            subset: None,
        }
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        let result = FontData::from_bytes("bad", Arc::from(vec![0u8; 64]), 0);
        assert!(matches!(result, Err(PdfError::FontParseError(_))));
    }

    #[test]
    fn test_add_chars_dedups() {
        let mut font = font_without_face();
        font.add_chars("Hello");
        assert_eq!(font.used_chars.len(), 4);
        font.add_chars("山田太郎");
        assert!(font.used_chars.contains(&'山'));
        assert_eq!(font.used_chars.len(), 8);
    }

    #[test]
    fn test_encode_text_hex_without_face_maps_to_notdef() {
        let font = font_without_face();
        assert_eq!(font.encode_text_hex(""), b"<>".to_vec());
        assert_eq!(font.encode_text_hex("AB"), b"<00000000>".to_vec());
    }

    #[test]
    fn test_covers_requires_glyphs() {
        let font = font_without_face();
        assert!(font.covers("   "));
        assert!(!font.covers("山"));
    }

    #[test]
    fn test_tounicode_skips_unmapped_chars() {
        let mut font = font_without_face();
        font.add_chars("AB");
        let cmap = font.generate_tounicode_cmap();
        assert!(cmap.contains("begincmap"));
        assert!(cmap.contains("endcmap"));
        assert!(!cmap.contains("beginbfchar"));
    }

    #[test]
    fn test_to_pdf_objects_truetype_layout() {
        let font = font_without_face();
        let objects = font.to_pdf_objects().expect("Failed to generate PDF objects");
        assert_eq!(objects.font_file_key, "FontFile2");
        assert_eq!(
            objects.cid_font.get(b"Subtype").unwrap().as_name().unwrap(),
            b"CIDFontType2"
        );
        assert_eq!(
            objects.type0_font.get(b"Encoding").unwrap().as_name().unwrap(),
            b"Identity-H"
        );
        assert_eq!(objects.font_file_stream.content.len(), 100);
    }

    #[test]
    fn test_to_pdf_units_scales_to_1000() {
        let mut font = font_without_face();
        font.units_per_em = 2048;
        assert_eq!(font.to_pdf_units(2048), 1000);
        assert_eq!(font.to_pdf_units(1024), 500);
    }

    #[test]
    fn test_standard_font_encoding() {
        let op = StandardFont::Helvetica.encode_literal("a(b)").unwrap();
        assert_eq!(op, b"(a\\(b\\))".to_vec());

        let err = StandardFont::Helvetica.encode_literal("山田").unwrap_err();
        assert!(err.is_font_missing());
    }

    #[test]
    fn test_standard_font_width() {
        // "Hi" = 722 + 222 units
        let width = StandardFont::Helvetica.text_width_points("Hi", 10.0);
        assert!((width - 9.44).abs() < 1e-9);
        assert!(StandardFont::HelveticaBold.text_width_points("Hi", 10.0) > width);
    }

    #[test]
    fn test_builder_requires_regular() {
        let result = FontFamilyBuilder::new().build("jp");
        assert!(matches!(result, Err(PdfError::FontParseError(_))));
    }
}
