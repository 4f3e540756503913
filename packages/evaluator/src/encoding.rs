//! Text encodings used by the string built-ins.

const BASE64_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

pub fn base64_encode(data: &[u8]) -> String {
    let mut result = String::with_capacity(data.len().div_ceil(3) * 4);

    for chunk in data.chunks(3) {
        let n = match chunk.len() {
            3 => (chunk[0] as u32) << 16 | (chunk[1] as u32) << 8 | chunk[2] as u32,
            2 => (chunk[0] as u32) << 16 | (chunk[1] as u32) << 8,
            _ => (chunk[0] as u32) << 16,
        };

        result.push(BASE64_CHARS[((n >> 18) & 0x3F) as usize] as char);
        result.push(BASE64_CHARS[((n >> 12) & 0x3F) as usize] as char);
        if chunk.len() > 1 {
            result.push(BASE64_CHARS[((n >> 6) & 0x3F) as usize] as char);
        } else {
            result.push('=');
        }
        if chunk.len() > 2 {
            result.push(BASE64_CHARS[(n & 0x3F) as usize] as char);
        } else {
            result.push('=');
        }
    }

    result
}

fn push_escaped(out: &mut String, byte: u8) {
    out.push('%');
    sheen_color::push_hex(out, byte as u32, 2);
}

/// Characters `escape` leaves alone: printable ASCII minus the
/// punctuation that is significant in selectors and URLs
fn is_escape_safe(byte: u8) -> bool {
    byte > b' ' && byte < 0x7F && !b"#^(){}|:><;[]=".contains(&byte)
}

/// Percent-encode everything but the safe printable ASCII characters.
/// Non-ASCII characters are encoded byte by byte from UTF-8.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        if is_escape_safe(byte) {
            out.push(byte as char);
        } else {
            push_escaped(&mut out, byte);
        }
    }
    out
}

fn is_path_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || "-._~!$&'()*+,;=:@/".contains(ch)
}

/// Encode `text` as the path component of a URI. Non-ASCII characters are
/// left as they are.
pub fn encode_uri_path(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if is_path_char(ch) || !ch.is_ascii() {
            out.push(ch);
        } else {
            push_escaped(&mut out, ch as u8);
        }
    }
    out
}

/// Encode everything but the unreserved URI characters
pub fn encode_uri_component(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    for byte in text.bytes() {
        if byte.is_ascii_alphanumeric() || b"-_.!~*'()".contains(&byte) {
            out.push(byte as char);
        } else {
            push_escaped(&mut out, byte);
        }
    }
    out
}

/// Encoding for inline SVG data URIs: only what would break the `url()`
/// or the data URI itself is escaped
pub fn encode_data_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b'%' | b'#' | b'"' | b'\'' | b'<' | b'>' | b'(' | b')' | b'\n' | b'\r' | b'\t' => {
                push_escaped(&mut out, byte)
            }
            b' ' => out.push_str("%20"),
            _ if byte >= 0x80 => push_escaped(&mut out, byte),
            _ => out.push(byte as char),
        }
    }
    out
}

/// Mime type for a resource path, by extension
pub fn guess_mime_type(path: &str) -> &'static str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let extension = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "bmp" => "image/bmp",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "eot" => "application/vnd.ms-fontobject",
        "css" => "text/css",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
