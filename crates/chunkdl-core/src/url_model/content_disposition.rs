//! Content-Disposition header parsing (filename and filename*).

use super::sanitize::sanitize_filename;

/// Safe filename from a Content-Disposition value, or `None`.
///
/// Rejects any value (raw or decoded) containing `..`, `/` or `\`, so the header
/// can never steer the download outside the destination directory.
pub fn filename_from_header(header_value: &str) -> Option<String> {
    if is_path_like(header_value) {
        return None;
    }
    let name = parse_content_disposition_filename(header_value)?;
    if is_path_like(&name) {
        return None;
    }
    let name = sanitize_filename(&name);
    (!name.is_empty()).then_some(name)
}

fn is_path_like(s: &str) -> bool {
    s.contains("..") || s.contains('/') || s.contains('\\')
}

/// Extracts the raw filename from a Content-Disposition value.
///
/// Supports `filename="quoted"`, `filename=token` and the RFC 5987
/// `filename*=UTF-8''percent-encoded` form, which takes precedence.
pub fn parse_content_disposition_filename(header_value: &str) -> Option<String> {
    let mut params = header_value.trim().split(';');
    let disposition = params.next()?.trim();
    if disposition.is_empty() || disposition.contains('=') {
        return None;
    }

    let mut plain: Option<String> = None;
    for param in params {
        let Some((name, v)) = param.trim().split_once('=') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let v = v.trim();

        if name == "filename*" {
            let encoded = v
                .split_once("''")
                .filter(|(charset, _)| charset.eq_ignore_ascii_case("utf-8"))
                .map(|(_, rest)| rest);
            if let Some(decoded) = encoded.map(percent_decode) {
                if !decoded.is_empty() {
                    return Some(decoded);
                }
            }
        } else if name == "filename" {
            let value = if v.len() >= 2 && v.starts_with('"') && v.ends_with('"') {
                unescape_quoted(&v[1..v.len() - 1])
            } else {
                v.to_string()
            };
            if !value.is_empty() {
                plain = Some(value);
            }
        }
    }
    plain
}

/// Drops the backslash from `\"` and `\\` inside a quoted-string.
fn unescape_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('\\', Some(&next)) if next == '"' || next == '\\' => {
                out.push(next);
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}

/// Percent-decode; invalid escapes are kept literally, invalid UTF-8 is replaced.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(h), Some(l)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                out.push(h << 4 | l);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
