//! Character references in HTML text and attribute values.
//!
//! Decoding covers a small fixed set: `&amp;`, `&lt;`, `&gt;`, `&quot;`,
//! `&apos;`, `&nbsp;` and semicolon-terminated numeric references
//! (`&#39;`, `&#x27;`). Anything else, including references without the
//! `;`, passes through unchanged. Escaping writes only what the HTML parser
//! would otherwise read as markup, so rendered HTML decodes back to the
//! original data.

use std::borrow::Cow;

/// Longest reference considered, `&` and `;` included (`&#x10FFFF;`).
const MAX_REFERENCE_LEN: usize = 10;

/// Replace the supported character references in `s`.
pub fn decode_entities(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match reference(rest) {
            Some((ch, len)) => {
                out.push(ch);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// The reference at the start of `s` (which begins with `&`): the decoded
/// character and the number of bytes it spans.
fn reference(s: &str) -> Option<(char, usize)> {
    let semi = s.bytes().take(MAX_REFERENCE_LEN).position(|b| b == b';')?;
    let body = &s[1..semi];
    let ch = match body {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        _ => numeric(body.strip_prefix('#')?)?,
    };
    Some((ch, semi + 1))
}

fn numeric(digits: &str) -> Option<char> {
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
            u32::from_str_radix(hex, 16).ok()?
        }
        Some(_) => return None,
        None if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            digits.parse().ok()?
        }
        None => return None,
    };
    char::from_u32(code)
}

/// Escape text content: `&`, `<` and `>`.
pub fn escape_text(s: &str) -> Cow<'_, str> {
    escape(s, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        _ => None,
    })
}

/// Escape an attribute value written between `quote` characters: `&` and
/// the quote itself.
pub fn escape_attribute(s: &str, quote: char) -> Cow<'_, str> {
    escape(s, |c| match c {
        '&' => Some("&amp;"),
        '"' if quote == '"' => Some("&quot;"),
        '\'' if quote == '\'' => Some("&#39;"),
        _ => None,
    })
}

fn escape(s: &str, replacement: impl Fn(char) -> Option<&'static str>) -> Cow<'_, str> {
    if !s.chars().any(|c| replacement(c).is_some()) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match replacement(c) {
            Some(escaped) => out.push_str(escaped),
            None => out.push(c),
        }
    }
    Cow::Owned(out)
}
