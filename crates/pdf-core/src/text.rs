//! Text encoding and content-stream operators

use crate::document::Color;
use crate::Align;

/// Context for rendering text
pub struct TextRenderContext {
    /// PDF font resource name (e.g., "F1")
    pub font_name: String,
    /// Font size in points
    pub font_size: f32,
    /// Text width in points (for alignment)
    pub text_width: f64,
    /// Text color (RGB)
    pub color: Color,
}

/// Generate PDF operators for text insertion
///
/// Creates the PDF text operators (BT, rg, Tf, Td, Tj, ET) to show one
/// operand at a position.
///
/// # Arguments
/// * `operand` - Encoded string operand, either a literal `(...)` or hex `<...>`
/// * `x` - X coordinate in points (PDF coordinates, from left)
/// * `y` - Y coordinate in points (PDF coordinates, from bottom)
/// * `align` - Text alignment relative to `x`
/// * `ctx` - Text rendering context
pub fn generate_text_operators(
    operand: &[u8],
    x: f64,
    y: f64,
    align: Align,
    ctx: &TextRenderContext,
) -> Vec<u8> {
    let x_offset = match align {
        Align::Left => 0.0,
        Align::Center => -ctx.text_width / 2.0,
        Align::Right => -ctx.text_width,
    };
    let final_x = x + x_offset;

    let mut ops = Vec::with_capacity(operand.len() + 64);
    ops.extend_from_slice(b"BT\n");
    ops.extend_from_slice(
        format!("{} {} {} rg\n", ctx.color.r, ctx.color.g, ctx.color.b).as_bytes(),
    );
    ops.extend_from_slice(format!("/{} {} Tf\n", ctx.font_name, ctx.font_size).as_bytes());
    ops.extend_from_slice(format!("{final_x} {y} Td\n").as_bytes());
    ops.extend_from_slice(operand);
    ops.extend_from_slice(b" Tj\nET\n");
    ops
}

/// Escape the literal-string delimiters `\`, `(` and `)`
pub fn escape_pdf_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '(' | ')') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Inverse of [`escape_pdf_literal`]
///
/// A backslash before any other character is dropped, as PDF readers do.
pub fn unescape_pdf_literal(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Wrap already-encoded bytes into an escaped literal operand `( ... )`
pub(crate) fn literal_operand(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 2);
    out.push(b'(');
    for &b in bytes {
        if matches!(b, b'\\' | b'(' | b')') {
            out.push(b'\\');
        }
        out.push(b);
    }
    out.push(b')');
    out
}

/// Encode text for a standard 14 font using WinAnsiEncoding
///
/// Returns `None` if any character has no WinAnsi code, in which case the
/// caller must pick an embedded font instead of emitting garbled output.
pub fn encode_win_ansi(text: &str) -> Option<Vec<u8>> {
    text.chars().map(win_ansi_code).collect()
}

fn win_ansi_code(c: char) -> Option<u8> {
    let code = c as u32;
    match c {
        ' '..='~' => Some(code as u8),
        '\u{00A0}'..='\u{00FF}' => Some(code as u8),
        '€' => Some(0x80),
        '‚' => Some(0x82),
        '„' => Some(0x84),
        '…' => Some(0x85),
        '‘' => Some(0x91),
        '’' => Some(0x92),
        '“' => Some(0x93),
        '”' => Some(0x94),
        '•' => Some(0x95),
        '–' => Some(0x96),
        '—' => Some(0x97),
        '™' => Some(0x99),
        _ => None,
    }
}

/// Split text into lines that fit `max_width`
///
/// Breaks at the last space that fits; a run without spaces (CJK text, long
/// URLs) breaks between characters. Never returns an empty vector.
///
/// # Arguments
/// * `text` - Text to split
/// * `max_width` - Available width in points
/// * `measure` - Width of a string in points
pub fn wrap_to_width<F>(text: &str, max_width: f64, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f64,
{
    if max_width <= 0.0 || measure(text) <= max_width {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut last_space: Option<usize> = None;

    for c in text.chars() {
        current.push(c);
        if c == ' ' {
            last_space = Some(current.len() - 1);
        }
        if measure(&current) <= max_width {
            continue;
        }

        match last_space {
            Some(pos) if pos > 0 => {
                let rest = current[pos + 1..].to_string();
                current.truncate(pos);
                lines.push(std::mem::take(&mut current));
                current = rest;
            }
            _ => {
                if current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(c);
                }
            }
        }
        last_space = current.rfind(' ');
    }

    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ctx() -> TextRenderContext {
        TextRenderContext {
            font_name: "F1".to_string(),
            font_size: 12.0,
            text_width: 100.0,
            color: Color::black(),
        }
    }

    #[test]
    fn test_text_operators_left() {
        let ops = generate_text_operators(b"(Hi)", 72.0, 750.0, Align::Left, &ctx());
        assert_eq!(
            String::from_utf8(ops).unwrap(),
            "BT\n0 0 0 rg\n/F1 12 Tf\n72 750 Td\n(Hi) Tj\nET\n"
        );
    }

    #[test]
    fn test_text_operators_center() {
        let ops = generate_text_operators(b"<0001>", 300.0, 700.0, Align::Center, &ctx());
        let ops = String::from_utf8(ops).unwrap();
        assert!(ops.contains("250 700 Td"));
        assert!(ops.contains("<0001> Tj"));
    }

    #[test]
    fn test_escape_delimiters() {
        assert_eq!(escape_pdf_literal(r"a(b)c\d"), r"a\(b\)c\\d");
        assert_eq!(escape_pdf_literal("plain"), "plain");
    }

    #[test]
    fn test_escape_roundtrip_all_delimiter_combinations() {
        let alphabet = ['\\', '(', ')', 'x'];
        let mut inputs = vec![String::new()];
        for _ in 0..4 {
            let mut next = Vec::new();
            for prefix in &inputs {
                for c in alphabet {
                    let mut s = prefix.clone();
                    s.push(c);
                    next.push(s);
                }
            }
            inputs.extend(next.iter().cloned());
            inputs.dedup();
        }

        for s in &inputs {
            assert_eq!(&unescape_pdf_literal(&escape_pdf_literal(s)), s);
        }
    }

    #[test]
    fn test_literal_operand_escapes_bytes() {
        assert_eq!(literal_operand(b"a(b)"), b"(a\\(b\\))".to_vec());
    }

    #[test]
    fn test_win_ansi() {
        assert_eq!(encode_win_ansi("Tel: 03"), Some(b"Tel: 03".to_vec()));
        assert_eq!(encode_win_ansi("• —"), Some(vec![0x95, b' ', 0x97]));
        assert_eq!(encode_win_ansi("café"), Some(vec![b'c', b'a', b'f', 0xE9]));
        assert_eq!(encode_win_ansi("山田"), None);
    }

    #[test]
    fn test_wrap_fits_on_one_line() {
        let lines = wrap_to_width("short", 100.0, |s| s.chars().count() as f64 * 10.0);
        assert_eq!(lines, vec!["short".to_string()]);
    }

    #[test]
    fn test_wrap_at_spaces() {
        let lines = wrap_to_width("aaa bbb ccc", 70.0, |s| s.chars().count() as f64 * 10.0);
        assert_eq!(lines, vec!["aaa bbb", "ccc"]);
    }

    #[test]
    fn test_wrap_cjk_between_characters() {
        let lines = wrap_to_width("山田太郎です", 40.0, |s| s.chars().count() as f64 * 10.0);
        assert_eq!(lines, vec!["山田太郎", "です"]);
    }

    #[test]
    fn test_wrap_empty() {
        let lines = wrap_to_width("", 40.0, |s| s.chars().count() as f64 * 10.0);
        assert_eq!(lines, vec![String::new()]);
    }
}
