//! Integration tests for pdf-core
//!
//! These tests verify end-to-end output: the bytes are parsed back with
//! lopdf and the cross-reference table of the minimal emitter is checked
//! against the actual object offsets.

use pdf_core::{
    Align, FontData, FontFamilyBuilder, FontRegistry, FontWeight, MinimalPdf, PageCursor,
    PageGeometry, PdfDocument, PdfError, StandardFont, TextBlock,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

/// Well-known locations of CJK-capable fonts on developer machines and CI images
const SYSTEM_CJK_FONTS: &[&str] = &[
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/noto/NotoSansJP-Regular.ttf",
    "/usr/share/fonts/opentype/ipaexfont-gothic/ipaexg.ttf",
    "/usr/share/fonts/truetype/fonts-japanese-gothic.ttf",
    "/System/Library/Fonts/Hiragino Sans GB.ttc",
];

/// Latin/Cyrillic TrueType face shipped with the tests (no CJK glyphs)
fn fixture_font() -> Arc<[u8]> {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/DejaVuSansMono.ttf");
    Arc::from(std::fs::read(path).expect("Failed to read font fixture"))
}

/// Load the first CJK font found on this machine, if any
fn system_cjk_font() -> Option<Arc<[u8]>> {
    SYSTEM_CJK_FONTS.iter().find_map(|path| {
        let data: Arc<[u8]> = Arc::from(std::fs::read(path).ok()?);
        let font = FontData::from_bytes("probe", data.clone(), 0).ok()?;
        font.covers("山田太郎").then_some(data)
    })
}

/// CIDs of every hex string operand in a content stream, in order
fn hex_operands(content: &str) -> Vec<Vec<u16>> {
    content
        .split('<')
        .skip(1)
        .filter_map(|rest| rest.split_once('>'))
        .map(|(hex, _)| {
            hex.as_bytes()
                .chunks(4)
                .map(|digits| {
                    u16::from_str_radix(std::str::from_utf8(digits).unwrap(), 16).unwrap()
                })
                .collect()
        })
        .collect()
}

/// Font program bytes of the first embedded TrueType font
fn embedded_font_program(doc: &lopdf::Document) -> Vec<u8> {
    doc.objects
        .values()
        .filter_map(|object| object.as_dict().ok())
        .filter_map(|dict| dict.get(b"FontFile2").ok())
        .filter_map(|file| file.as_reference().ok())
        .find_map(|id| doc.get_object(id).ok()?.as_stream().ok())
        .map(|stream| stream.content.clone())
        .expect("no FontFile2 stream")
}

/// Every CID must select, in the subset, the glyph the character had in the
/// full font
fn assert_cids_select_original_glyphs(original: &[u8], subset: &[u8], text: &str, cids: &[u16]) {
    let original = ttf_parser::Face::parse(original, 0).expect("Failed to parse fixture");
    let subset = ttf_parser::Face::parse(subset, 0).expect("Failed to parse subset");
    let chars: Vec<char> = text.chars().collect();
    assert_eq!(chars.len(), cids.len());

    for (&c, &cid) in chars.iter().zip(cids) {
        let gid = original.glyph_index(c).expect("fixture glyph");
        assert_ne!(cid, 0, "{c:?} mapped to .notdef");
        let cid = ttf_parser::GlyphId(cid);
        assert_eq!(
            subset.glyph_hor_advance(cid),
            original.glyph_hor_advance(gid),
            "advance of {c:?}"
        );
        assert_eq!(
            subset.glyph_bounding_box(cid),
            original.glyph_bounding_box(gid),
            "outline of {c:?}"
        );
    }
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

/// Check that every xref entry points at the matching `N 0 obj` header
///
/// Works on raw bytes: embedded font programs are binary, so offsets must
/// not go through a lossy string conversion.
fn assert_xref_consistent(bytes: &[u8]) -> usize {
    let startxref = rfind(bytes, b"startxref\n").expect("missing startxref");
    let tail = String::from_utf8_lossy(&bytes[startxref + b"startxref\n".len()..]);
    let xref_offset: usize = tail
        .lines()
        .next()
        .and_then(|line| line.trim().parse().ok())
        .expect("startxref offset");
    assert!(bytes[xref_offset..].starts_with(b"xref\n"));

    let table = String::from_utf8_lossy(&bytes[xref_offset..startxref]);
    let mut lines = table.lines().skip(1);
    let header = lines.next().expect("xref subsection header");
    let size: usize = header
        .split_whitespace()
        .nth(1)
        .and_then(|n| n.parse().ok())
        .expect("xref size");

    assert_eq!(lines.next(), Some("0000000000 65535 f "));
    for id in 1..size {
        let entry = lines.next().expect("xref entry");
        assert_eq!(entry.len(), 19, "entry {id} must be 20 bytes with EOL");
        let offset: usize = entry[..10].parse().expect("10-digit offset");
        let expected = format!("{id} 0 obj");
        assert!(
            bytes[offset..].starts_with(expected.as_bytes()),
            "xref entry {id} points at {:?}",
            String::from_utf8_lossy(&bytes[offset..(offset + 12).min(bytes.len())])
        );
    }

    assert!(table.contains(&format!("/Size {size}")));
    assert!(String::from_utf8_lossy(&bytes[startxref..]).trim_end().ends_with("%%EOF"));
    size
}

#[test]
fn test_minimal_xref_offsets_single_page() {
    let bytes = MinimalPdf::new()
        .render(&[
            TextBlock::new("Taro Yamada", 18.0),
            TextBlock::new("Backend engineer", 12.0).with_offset(10.0),
        ])
        .expect("Failed to render");

    // catalog, pages, page, content, font
    assert_eq!(assert_xref_consistent(&bytes), 6);

    let doc = lopdf::Document::load_mem(&bytes).expect("Failed to parse minimal PDF");
    assert_eq!(doc.get_pages().len(), 1);
}

#[test]
fn test_minimal_xref_offsets_multi_page() {
    let blocks: Vec<TextBlock> = (1..=80)
        .map(|i| TextBlock::new(format!("entry {i}"), 12.0))
        .collect();
    let bytes = MinimalPdf::new().render(&blocks).expect("Failed to render");

    // 37 lines of 18pt fit on a letter page
    let size = assert_xref_consistent(&bytes);
    assert_eq!(size, 2 + 3 * 2 + 1 + 1);

    let doc = lopdf::Document::load_mem(&bytes).expect("Failed to parse minimal PDF");
    assert_eq!(doc.get_pages().len(), 3);
}

#[test]
fn test_minimal_escapes_delimiters() {
    let bytes = MinimalPdf::new()
        .render(&[TextBlock::new(r"C:\path (draft)", 12.0)])
        .expect("Failed to render");
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains(r"(C:\\path \(draft\)) Tj"));
}

#[test]
fn test_minimal_cjk_without_font_is_font_missing() {
    let err = MinimalPdf::new()
        .render(&[TextBlock::new("山田太郎", 18.0)])
        .unwrap_err();
    assert!(matches!(err, PdfError::FontNotFound(_)));
    assert!(err.is_font_missing());
}

#[test]
fn test_minimal_cjk_with_embedded_font() {
    let Some(data) = system_cjk_font() else {
        eprintln!("no CJK font on this machine, skipping");
        return;
    };
    let font = FontData::from_bytes("NotoSansJP", data, 0).expect("Failed to parse font");

    let bytes = MinimalPdf::with_font(font)
        .render(&[TextBlock::new("山田太郎", 18.0)])
        .expect("Failed to render");

    // catalog, pages, page, content + Type0, CIDFont, descriptor, file, ToUnicode
    assert_eq!(assert_xref_consistent(&bytes), 10);
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/Encoding /Identity-H"));
    assert!(text.contains("<5C71>"));
}

#[test]
fn test_document_pages_follow_cursor() {
    let mut doc = PdfDocument::new(PageGeometry::a4());
    doc.register_standard_font("sans", StandardFont::Helvetica, StandardFont::HelveticaBold)
        .expect("Failed to register font");
    doc.set_font("sans", 12.0).expect("Failed to set font");

    let geometry = *doc.geometry();
    let mut cursor = PageCursor::new(geometry);
    doc.add_page();
    for i in 0..60 {
        let (page, top) = cursor.place_line(16.0);
        while doc.page_count() < page {
            doc.add_page();
        }
        doc.insert_text(
            &format!("line {i}"),
            page,
            geometry.left_margin,
            geometry.height - top + 12.0,
            Align::Left,
        )
        .expect("Failed to insert text");
    }

    let bytes = doc.to_bytes().expect("Failed to save PDF");
    let parsed = lopdf::Document::load_mem(&bytes).expect("Failed to parse PDF");
    assert_eq!(parsed.get_pages().len(), 2);

    let page2 = parsed.get_pages()[&2];
    let content = parsed.get_page_content(page2).expect("Failed to read page 2");
    let content = String::from_utf8_lossy(&content);
    assert!(content.contains("(line 46) Tj"));
    assert!(!content.contains("(line 45) Tj"));
}

#[test]
fn test_minimal_embedded_font_subset_keeps_glyphs() {
    let data = fixture_font();
    let font = FontData::from_bytes("DejaVuSansMono", data.clone(), 0).expect("Failed to parse font");
    let lines = ["Taro Yamada", "Иван • Петров"];

    let bytes = MinimalPdf::with_font(font)
        .render(&lines.map(|line| TextBlock::new(line, 12.0)))
        .expect("Failed to render");

    // catalog, pages, page, content + Type0, CIDFont, descriptor, file, ToUnicode
    assert_eq!(assert_xref_consistent(&bytes), 10);

    let doc = lopdf::Document::load_mem(&bytes).expect("Failed to parse minimal PDF");
    let program = embedded_font_program(&doc);
    assert!(program.len() < data.len() / 4, "font was not subset");

    let content = doc
        .get_page_content(doc.get_pages()[&1])
        .expect("Failed to read content");
    let operands = hex_operands(&String::from_utf8_lossy(&content));
    assert_eq!(operands.len(), 2);
    for (line, cids) in lines.iter().zip(&operands) {
        assert_cids_select_original_glyphs(&data, &program, line, cids);
    }

    let text = String::from_utf8_lossy(&bytes);
    // И in the ToUnicode map
    assert!(text.contains("<0418>"));
    assert!(text.contains("/CIDToGIDMap /Identity"));
}

#[test]
fn test_minimal_blank_page_with_embedded_font_is_subset() {
    let data = fixture_font();
    let font = FontData::from_bytes("DejaVuSansMono", data.clone(), 0).expect("Failed to parse font");

    let bytes = MinimalPdf::with_font(font).render(&[]).expect("Failed to render");
    assert_eq!(assert_xref_consistent(&bytes), 10);
    assert!(bytes.len() < data.len() / 4, "blank page embedded {} bytes", bytes.len());
}

#[test]
fn test_minimal_embedded_font_without_glyphs_is_font_missing() {
    let font = FontData::from_bytes("DejaVuSansMono", fixture_font(), 0).expect("Failed to parse font");
    let err = MinimalPdf::with_font(font)
        .render(&[TextBlock::new("山田太郎", 18.0)])
        .unwrap_err();
    assert!(err.is_font_missing());
}

#[test]
fn test_document_embeds_family_once() {
    let data = fixture_font();

    let mut doc = PdfDocument::new(PageGeometry::a4());
    doc.set_compression(false);
    doc.register_font_family("mono", FontFamilyBuilder::new().regular(data.clone(), 0))
        .expect("Failed to register family");
    doc.set_font("mono", 14.0).expect("Failed to set font");
    let page = doc.add_page();
    doc.insert_text("Taro Yamada", page, 50.0, 60.0, Align::Left)
        .expect("Failed to insert text");

    // no bold face: bold shares the regular resource
    doc.set_font_weight(FontWeight::Bold).unwrap();
    doc.insert_text("Опыт работы", page, 50.0, 90.0, Align::Left)
        .expect("Failed to insert bold text");

    let bytes = doc.to_bytes().expect("Failed to save PDF");
    let parsed = lopdf::Document::load_mem(&bytes).expect("Failed to parse PDF");

    let type0_count = parsed
        .objects
        .values()
        .filter(|object| {
            object
                .as_dict()
                .ok()
                .and_then(|dict| dict.get(b"Subtype").ok())
                .and_then(|name| name.as_name().ok())
                == Some(b"Type0".as_slice())
        })
        .count();
    assert_eq!(type0_count, 1);

    let program = embedded_font_program(&parsed);
    let content = parsed
        .get_page_content(parsed.get_pages()[&1])
        .expect("Failed to read content");
    let operands = hex_operands(&String::from_utf8_lossy(&content));
    assert_eq!(operands.len(), 2);
    assert_cids_select_original_glyphs(&data, &program, "Taro Yamada", &operands[0]);
    assert_cids_select_original_glyphs(&data, &program, "Опыт работы", &operands[1]);
}

#[test]
fn test_document_rejects_text_without_glyphs() {
    let mut doc = PdfDocument::new(PageGeometry::a4());
    doc.register_font_family("mono", FontFamilyBuilder::new().regular(fixture_font(), 0))
        .expect("Failed to register family");
    doc.set_font("mono", 14.0).expect("Failed to set font");
    let page = doc.add_page();

    let err = doc
        .insert_text("山田太郎", page, 50.0, 60.0, Align::Left)
        .unwrap_err();
    assert!(matches!(err, PdfError::UnsupportedText { .. }));
    assert!(err.is_font_missing());

    // nothing was buffered, so the page saves empty
    let bytes = doc.to_bytes().expect("Failed to save PDF");
    let parsed = lopdf::Document::load_mem(&bytes).expect("Failed to parse PDF");
    assert!(parsed
        .get_page_content(parsed.get_pages()[&1])
        .expect("Failed to read content")
        .is_empty());
}

#[test]
fn test_registry_resolves_from_directory() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("ipaexg.ttf"), &fixture_font()[..]).expect("Failed to write font");

    let registry = FontRegistry::new(dir.path()).with_coverage("Taro Yamada");
    let resolved = registry.resolve().expect("Failed to resolve font");
    assert_eq!(resolved.family, "IPAexGothic");
    assert!(resolved.bold.is_none());
    assert_eq!(registry.cached_files(), 1);

    // second call is served from the memo without touching the disk
    std::fs::remove_file(dir.path().join("ipaexg.ttf")).unwrap();
    let again = registry.resolve().expect("Failed to resolve cached font");
    assert_eq!(again.family, "IPAexGothic");
}

#[test]
fn test_registry_skips_font_without_cjk_glyphs() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("ipaexg.ttf"), &fixture_font()[..]).expect("Failed to write font");

    let registry = FontRegistry::new(dir.path());
    let err = registry.resolve().unwrap_err();
    assert!(matches!(err, PdfError::FontNotFound(_)));
    assert_eq!(registry.cached_files(), 0);
}
