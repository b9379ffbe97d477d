//! Charset detection and decoding of fetched pages.
//!
//! A response body is decoded with the first encoding found among: a byte
//! order mark, the `Content-Type` header's `charset`, a `<meta charset>` or
//! `<meta http-equiv="Content-Type">` declaration in the first kilobyte.
//! UTF-8 is the default. Malformed sequences become U+FFFD.

use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;

/// Bytes scanned for a `<meta>` declaration.
const SNIFF_LEN: usize = 1024;

#[allow(clippy::expect_used)]
static META_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([^"'\s/>;]+)"#).expect("valid regex")
});

#[allow(clippy::expect_used)]
static HEADER_CHARSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).expect("valid regex"));

/// Encoding named by a `Content-Type` header value, if any.
#[must_use]
pub fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    let label = HEADER_CHARSET_RE.captures(content_type)?.get(1)?.as_str();
    Encoding::for_label(label.as_bytes())
}

/// Encoding declared by `<meta>` in the head of `html`, if any.
///
/// Covers both `<meta charset>` and the `http-equiv` form, whose `content`
/// also carries a `charset=` parameter.
#[must_use]
pub fn charset_from_meta(html: &[u8]) -> Option<&'static Encoding> {
    let head = String::from_utf8_lossy(&html[..html.len().min(SNIFF_LEN)]);
    let label = META_CHARSET_RE.captures(&head)?.get(1)?.as_str().to_string();
    Encoding::for_label(label.as_bytes())
}

/// Pick the encoding of a response body.
#[must_use]
pub fn detect_encoding(body: &[u8], content_type: Option<&str>) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(body) {
        return encoding;
    }
    content_type
        .and_then(charset_from_content_type)
        .or_else(|| charset_from_meta(body))
        .unwrap_or(UTF_8)
}

/// Decode a response body to a `String`.
#[must_use]
pub fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    let encoding = detect_encoding(body, content_type);
    let (decoded, used, had_errors) = encoding.decode(body);
    if had_errors {
        log::debug!("replaced malformed {} sequences while decoding", used.name());
    }
    decoded.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_utf8() {
        assert_eq!(detect_encoding(b"<p>plain</p>", None), UTF_8);
        assert_eq!(decode_body("<p>caf\u{e9}</p>".as_bytes(), None), "<p>caf\u{e9}</p>");
    }

    #[test]
    fn test_header_charset() {
        let body = b"<p>Caf\xE9</p>";
        let decoded = decode_body(body, Some("text/html; charset=ISO-8859-1"));
        assert_eq!(decoded, "<p>Caf\u{e9}</p>");
    }

    #[test]
    fn test_header_beats_meta() {
        let body = br#"<meta charset="windows-1251"><p>x</p>"#;
        assert_eq!(detect_encoding(body, Some("text/html; charset=utf-8")), UTF_8);
        assert_eq!(detect_encoding(body, Some("text/html")).name(), "windows-1251");
    }

    #[test]
    fn test_meta_forms() {
        assert_eq!(
            charset_from_meta(b"<META CHARSET=\"windows-1252\">").map(Encoding::name),
            Some("windows-1252")
        );
        let http_equiv = br#"<meta http-equiv="Content-Type" content="text/html; charset=ISO-8859-1">"#;
        // encoding_rs maps ISO-8859-1 to windows-1252 per WHATWG
        assert_eq!(charset_from_meta(http_equiv).map(Encoding::name), Some("windows-1252"));
        assert!(charset_from_meta(br#"<meta charset="nonsense-42">"#).is_none());
    }

    #[test]
    fn test_bom_wins() {
        let mut body = vec![0xEF, 0xBB, 0xBF];
        body.extend_from_slice(br#"<meta charset="windows-1252"><p>ok</p>"#);
        assert_eq!(detect_encoding(&body, Some("text/html; charset=iso-8859-2")), UTF_8);
    }

    #[test]
    fn test_malformed_bytes_are_replaced() {
        let decoded = decode_body(b"Test \xFF\xFE end", None);
        assert!(decoded.starts_with("Test "));
        assert!(decoded.contains('\u{FFFD}'));
        assert!(decoded.ends_with(" end"));
    }
}
