//! Response body decoding.
//!
//! Pages are returned to callers as UTF-8 text regardless of how the origin
//! encoded them.

use encoding_rs::{Encoding, UTF_8};

/// How far into the document we look for a `<meta>` charset declaration.
const META_SCAN_LIMIT: usize = 1024;

/// Decode a response body to UTF-8.
///
/// The `Content-Type` charset wins, then a `<meta>` declaration near the top of
/// the document, then plain UTF-8. Bytes that are still invalid are replaced
/// with U+FFFD.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let declared = content_type
        .and_then(charset_from_content_type)
        .or_else(|| charset_from_meta(bytes));

    match declared {
        Some(encoding) if encoding != UTF_8 => encoding.decode(bytes).0.into_owned(),
        _ => match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(e) => {
                tracing::debug!(error = %e, "body is not valid UTF-8, decoding lossily");
                String::from_utf8_lossy(bytes).into_owned()
            }
        },
    }
}

/// `text/html; charset=iso-8859-1` -> windows-1252
fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        label_to_encoding(value.trim().trim_matches(|c| c == '"' || c == '\'').as_bytes())
    })
}

/// Find `charset=` inside a `<meta ...>` tag within the scan window.
/// Covers both `<meta charset="x">` and the `http-equiv` form.
fn charset_from_meta(bytes: &[u8]) -> Option<&'static Encoding> {
    let window = &bytes[..bytes.len().min(META_SCAN_LIMIT)];
    let lower = window.to_ascii_lowercase();

    let mut offset = 0;
    while let Some(start) = find(&lower[offset..], b"<meta") {
        let tag_start = offset + start;
        let tag_end = lower[tag_start..]
            .iter()
            .position(|&b| b == b'>')
            .map(|p| tag_start + p)
            .unwrap_or(lower.len());
        let tag = &lower[tag_start..tag_end];

        if let Some(pos) = find(tag, b"charset=") {
            let value = &tag[pos + b"charset=".len()..];
            let value = value
                .strip_prefix(b"\"")
                .or_else(|| value.strip_prefix(b"'"))
                .unwrap_or(value);
            let end = value
                .iter()
                .position(|b| matches!(b, b'"' | b'\'' | b';' | b' ' | b'/'))
                .unwrap_or(value.len());
            if let Some(encoding) = label_to_encoding(&value[..end]) {
                return Some(encoding);
            }
        }

        offset = tag_end;
        if offset >= lower.len() {
            break;
        }
    }
    None
}

fn label_to_encoding(label: &[u8]) -> Option<&'static Encoding> {
    if label.is_empty() {
        return None;
    }
    Encoding::for_label(label)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
