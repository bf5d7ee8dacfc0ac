//! PDF responses

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use template::DocumentType;

/// `200 application/pdf`, shown inline, never cached
pub fn pdf_response(bytes: Vec<u8>, name: &str, doc_type: DocumentType) -> Response {
    let disposition = content_disposition(name, doc_type);
    let disposition = HeaderValue::from_str(&disposition)
        .unwrap_or_else(|_| HeaderValue::from_static("inline"));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
            (
                header::CACHE_CONTROL,
                HeaderValue::from_static("no-store, no-cache, must-revalidate"),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// ASCII-only filename stem: alphanumerics, `-` and `_`; whitespace becomes `_`
pub fn sanitize_filename(name: &str) -> String {
    name.trim()
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect()
}

/// `inline; filename="…"; filename*=UTF-8''…`
///
/// The plain filename falls back to the document type when nothing of the
/// name survives sanitizing; `filename*` keeps the full UTF-8 name.
pub fn content_disposition(name: &str, doc_type: DocumentType) -> String {
    let ascii = match sanitize_filename(name) {
        s if s.trim_matches('_').is_empty() => doc_type.as_str().to_string(),
        s => s,
    };
    let full = match name.trim() {
        "" => ascii.clone(),
        trimmed => trimmed.to_string(),
    };
    format!(
        "inline; filename=\"{ascii}.pdf\"; filename*=UTF-8''{}",
        encode_rfc5987(&format!("{full}.pdf"))
    )
}

/// Percent-encode everything outside RFC 5987 `attr-char`
fn encode_rfc5987(value: &str) -> String {
    let mut out = String::with_capacity(value.len() * 3);
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'!'
            | b'#'
            | b'$'
            | b'&'
            | b'+'
            | b'-'
            | b'.'
            | b'^'
            | b'_'
            | b'`'
            | b'|'
            | b'~' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename(" Taro Yamada "), "Taro_Yamada");
        assert_eq!(sanitize_filename("a/b\\c\"d.pdf"), "abcdpdf");
        assert_eq!(sanitize_filename("山田太郎"), "");
    }

    #[test]
    fn test_disposition_ascii_name() {
        assert_eq!(
            content_disposition("Taro Yamada", DocumentType::Resume),
            "inline; filename=\"Taro_Yamada.pdf\"; filename*=UTF-8''Taro%20Yamada.pdf"
        );
    }

    #[test]
    fn test_disposition_falls_back_to_type() {
        assert_eq!(
            content_disposition("山田", DocumentType::Cv),
            "inline; filename=\"cv.pdf\"; filename*=UTF-8''%E5%B1%B1%E7%94%B0.pdf"
        );
        assert_eq!(
            content_disposition("", DocumentType::Resume),
            "inline; filename=\"resume.pdf\"; filename*=UTF-8''resume.pdf"
        );
    }

    #[test]
    fn test_pdf_response_headers() {
        let response = pdf_response(b"%PDF-1.4".to_vec(), "Taro", DocumentType::Resume);
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            headers[header::CACHE_CONTROL],
            "no-store, no-cache, must-revalidate"
        );
        assert!(headers[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .starts_with("inline; filename=\"Taro.pdf\""));
    }
}
