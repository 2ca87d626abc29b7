use crate::ast::Attribute;
use crate::cursor::Cursor;
use crate::entities::{decode_entities, escape_attribute};
use crate::error::ParseError;
use crate::source::Span;

/// Which surface syntax an attribute list is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Inside an HTML start tag; ends at `>` or `/>`.
    Html,
    /// On an LML element line; ends at a `|` token or end of line.
    Lml,
}

/// Where an attribute scan stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stop {
    /// `>` was consumed.
    TagEnd,
    /// `/>` was consumed.
    SelfClose,
    /// A `|` token was consumed; inline text follows.
    InlineText,
    /// Input ran out.
    End,
}

/// Result of [`scan_attrs`]: attributes in source order (duplicates
/// included), the stop reason and the byte position right after it.
#[derive(Debug, Clone)]
pub struct AttrScan {
    pub attrs: Vec<Attribute>,
    pub stop: Stop,
    pub end: usize,
}

/// Scan an attribute list in `input` starting at byte `start`.
///
/// Accepted forms:
///   - `flag` (no value)
///   - `key=value`, `key="quoted"`, `key='quoted'`, with optional whitespace
///     around `=`
///
/// In the LML dialect, double-quoted values understand `\"`, `\\` and `\n`.
/// HTML values have their character references decoded. Spans are offset
/// by `base`.
pub fn scan_attrs(
    input: &str,
    start: usize,
    base: usize,
    dialect: Dialect,
) -> Result<AttrScan, ParseError> {
    let mut cur = Cursor::new(input, start);
    let mut attrs = Vec::new();

    loop {
        cur.skip_whitespace();
        let Some(c) = cur.peek() else {
            return Ok(AttrScan {
                attrs,
                stop: Stop::End,
                end: cur.pos(),
            });
        };

        match (dialect, c) {
            (Dialect::Html, '>') => {
                cur.bump();
                return Ok(AttrScan {
                    attrs,
                    stop: Stop::TagEnd,
                    end: cur.pos(),
                });
            }
            (Dialect::Html, '/') => {
                cur.bump();
                if cur.peek() == Some('>') {
                    cur.bump();
                    return Ok(AttrScan {
                        attrs,
                        stop: Stop::SelfClose,
                        end: cur.pos(),
                    });
                }
                // A lone slash between attributes is ignored.
                continue;
            }
            (Dialect::Lml, '|') => {
                cur.bump();
                return Ok(AttrScan {
                    attrs,
                    stop: Stop::InlineText,
                    end: cur.pos(),
                });
            }
            _ => {}
        }

        let key_start = cur.pos();
        let key = cur.take_while(|c| is_name_char(c, dialect));
        if key.is_empty() {
            return Err(ParseError::InvalidAttrs {
                message: format!("unexpected character '{c}'"),
                span: Span::new(base + key_start, base + key_start + c.len_utf8()),
            });
        }

        // Look past whitespace for `=` without consuming a following key.
        let mut ahead = cur.clone();
        ahead.skip_whitespace();
        if ahead.peek() != Some('=') {
            attrs.push(Attribute::new(key, None, Span::new(base + key_start, base + cur.pos())));
            continue;
        }
        ahead.bump();
        ahead.skip_whitespace();
        cur = ahead;

        let value = match cur.peek() {
            Some(quote @ ('"' | '\'')) => {
                cur.bump();
                scan_quoted(&mut cur, quote, dialect).ok_or_else(|| ParseError::InvalidAttrs {
                    message: format!("unterminated quoted value for '{key}'"),
                    span: Span::new(base + key_start, base + cur.pos()),
                })?
            }
            Some(_) => cur
                .take_while(|c| !c.is_whitespace() && !(dialect == Dialect::Html && c == '>'))
                .to_string(),
            None => {
                return Err(ParseError::InvalidAttrs {
                    message: format!("missing value after '=' for '{key}'"),
                    span: Span::new(base + key_start, base + cur.pos()),
                });
            }
        };
        let value = match dialect {
            Dialect::Html => decode_entities(&value).into_owned(),
            Dialect::Lml => value,
        };
        attrs.push(Attribute::new(
            key,
            Some(value),
            Span::new(base + key_start, base + cur.pos()),
        ));
    }
}

/// Read up to the closing `quote`, consuming it. `None` if it never closes.
fn scan_quoted(cur: &mut Cursor<'_>, quote: char, dialect: Dialect) -> Option<String> {
    let mut value = String::new();
    loop {
        let c = cur.bump()?;
        if c == quote {
            return Some(value);
        }
        if c == '\\' && quote == '"' && dialect == Dialect::Lml {
            match cur.peek() {
                Some(next @ ('"' | '\\')) => {
                    value.push(next);
                    cur.bump();
                }
                Some('n') => {
                    value.push('\n');
                    cur.bump();
                }
                _ => value.push(c),
            }
        } else {
            value.push(c);
        }
    }
}

fn is_name_char(c: char, dialect: Dialect) -> bool {
    !c.is_whitespace()
        && !matches!(c, '"' | '\'' | '=')
        && match dialect {
            Dialect::Html => !matches!(c, '>' | '/'),
            Dialect::Lml => c != '|',
        }
}

/// Quote an attribute value for LML output, escaping what the LML dialect
/// unescapes.
pub fn quote_lml(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Quote an attribute value for HTML output. Double quotes are preferred;
/// single quotes are used when the value contains `"` but no `'`. `&` and
/// the quote character are escaped.
pub fn quote_html(value: &str) -> String {
    let quote = if value.contains('"') && !value.contains('\'') {
        '\''
    } else {
        '"'
    };
    format!("{quote}{}{quote}", escape_attribute(value, quote))
}
