//! HTML-like tag syntax to [`Document`].
//!
//! A small state machine: text outside tags, attribute scanning inside a
//! start tag, and verbatim scanning inside raw-text elements (`script`,
//! `style`, `textarea`). It tolerates stray close tags but refuses to guess
//! where an unclosed element ends. Character references are decoded in text
//! and attribute values; raw text, comments, CDATA and directives are kept
//! verbatim.

use std::sync::Arc;

use crate::ast::{Document, NodeId, NodeKind, is_raw_text_element, is_void_element, normalize_block};
use crate::attrs::{Dialect, Stop, scan_attrs};
use crate::cursor::Cursor;
use crate::entities::decode_entities;
use crate::error::{Diagnostic, ParseError, codes};
use crate::parse::{ParseResult, collect_attributes};
use crate::source::{SourceFile, Span};

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";
const CDATA_START: &str = "<![CDATA[";
const CDATA_END: &str = "]]>";
const DIRECTIVE_START: &str = "<!";

/// Parse HTML source text.
///
/// Fatal conditions (unclosed element, unterminated comment/CDATA/directive
/// or tag) produce an `Error` diagnostic and an empty document. An unmatched
/// close tag is a warning and has no structural effect.
pub fn parse_html(input: &str, origin: Option<&str>) -> ParseResult {
    let source = Arc::new(SourceFile::new(input, origin));
    let mut parser = HtmlParser {
        source: &source,
        doc: Document::new(Arc::clone(&source)),
        stack: Vec::new(),
        diagnostics: Vec::new(),
    };
    let outcome = parser.run();
    let HtmlParser { doc, diagnostics, .. } = parser;
    ParseResult::finish(Arc::clone(&source), outcome.map(|()| doc), diagnostics)
}

/// An element whose close tag has not been seen yet.
struct OpenTag {
    node: NodeId,
    name: String,
    /// Span of the start tag.
    span: Span,
}

struct HtmlParser<'a> {
    source: &'a SourceFile,
    doc: Document,
    stack: Vec<OpenTag>,
    diagnostics: Vec<Diagnostic>,
}

impl HtmlParser<'_> {
    fn run(&mut self) -> Result<(), ParseError> {
        let src = self.source.content();
        let mut cur = Cursor::new(src, 0);

        while !cur.is_eof() {
            if cur.starts_with(COMMENT_START) {
                self.comment(&mut cur)?;
            } else if cur.starts_with(CDATA_START) {
                self.cdata(&mut cur)?;
            } else if cur.starts_with(DIRECTIVE_START) {
                self.directive(&mut cur)?;
            } else if cur.starts_with("</") && starts_tag_name(cur.rest()[2..].chars().next()) {
                self.close_tag(&mut cur)?;
            } else if cur.peek() == Some('<') && starts_tag_name(cur.peek2()) {
                self.open_tag(&mut cur)?;
            } else {
                self.text(&mut cur);
            }
        }

        match self.stack.last() {
            Some(open) => Err(ParseError::UnclosedTag {
                name: open.name.clone(),
                span: open.span,
            }),
            None => Ok(()),
        }
    }

    fn parent(&self) -> Option<NodeId> {
        self.stack.last().map(|open| open.node)
    }

    /// Text up to the next piece of markup, with character references
    /// decoded. A `<` that does not start markup is literal text.
    fn text(&mut self, cur: &mut Cursor<'_>) {
        let start = cur.pos();
        cur.bump();
        loop {
            match cur.find("<") {
                Some(lt) => {
                    cur.advance(lt - cur.pos());
                    if starts_markup(cur) {
                        break;
                    }
                    cur.bump();
                }
                None => {
                    cur.advance(cur.rest().len());
                    break;
                }
            }
        }
        let span = Span::new(start, cur.pos());
        let data = normalize_block(&decode_entities(self.source.slice(span)));
        if !data.is_empty() {
            let parent = self.parent();
            self.doc.push(parent, NodeKind::Text { data }, span);
        }
    }

    fn open_tag(&mut self, cur: &mut Cursor<'_>) -> Result<(), ParseError> {
        let start = cur.pos();
        cur.bump();
        let name = cur.take_while(is_tag_name_char).to_string();
        let scan = scan_attrs(self.source.content(), cur.pos(), 0, Dialect::Html)?;
        if scan.stop == Stop::End {
            return Err(ParseError::UnterminatedTag {
                name,
                span: Span::new(start, scan.end),
            });
        }
        cur.advance(scan.end - cur.pos());
        let span = Span::new(start, scan.end);
        log::trace!(target: "lml_parse::html", "open <{name}> at {start}");

        let attributes = collect_attributes(scan.attrs, &name, self.source, &mut self.diagnostics);
        let parent = self.parent();
        let node = self.doc.push(
            parent,
            NodeKind::Element {
                name: name.clone(),
                attributes,
            },
            span,
        );

        if scan.stop == Stop::SelfClose || is_void_element(&name) {
            return Ok(());
        }
        if is_raw_text_element(&name) {
            return self.raw_text(cur, node, &name, span);
        }
        self.stack.push(OpenTag { node, name, span });
        Ok(())
    }

    /// Content of a raw-text element, taken verbatim up to its close tag.
    fn raw_text(
        &mut self,
        cur: &mut Cursor<'_>,
        node: NodeId,
        name: &str,
        tag: Span,
    ) -> Result<(), ParseError> {
        let content_start = cur.pos();
        let (close_start, close_end) =
            find_close_tag(cur, name).ok_or_else(|| ParseError::UnclosedTag {
                name: name.to_string(),
                span: tag,
            })?;
        let span = Span::new(content_start, close_start);
        let data = normalize_block(self.source.slice(span));
        if !data.is_empty() {
            self.doc.push(Some(node), NodeKind::Text { data }, span);
        }
        self.doc.extend_span(node, close_end);
        cur.advance(close_end - cur.pos());
        Ok(())
    }

    fn close_tag(&mut self, cur: &mut Cursor<'_>) -> Result<(), ParseError> {
        let start = cur.pos();
        cur.advance(2);
        let name = cur.take_while(is_tag_name_char).to_string();
        // Anything between the name and `>` is ignored.
        let Some(gt) = cur.find(">") else {
            return Err(ParseError::UnterminatedTag {
                name,
                span: Span::new(start, self.source.len()),
            });
        };
        cur.advance(gt + 1 - cur.pos());
        let span = Span::new(start, cur.pos());

        let matching = self
            .stack
            .iter()
            .rposition(|open| open.name.eq_ignore_ascii_case(&name));
        match matching {
            Some(pos) if pos + 1 == self.stack.len() => {
                if let Some(open) = self.stack.pop() {
                    log::trace!(target: "lml_parse::html", "close </{name}> at {start}");
                    self.doc.extend_span(open.node, span.end_offset);
                }
                Ok(())
            }
            Some(_) => {
                // An ancestor is being closed while inner elements are open.
                let inner = self.stack.last().map_or_else(
                    || (name.clone(), span),
                    |open| (open.name.clone(), open.span),
                );
                Err(ParseError::UnclosedTag {
                    name: inner.0,
                    span: inner.1,
                })
            }
            None => {
                log::debug!(target: "lml_parse::html", "ignoring unmatched </{name}> at {start}");
                self.diagnostics.push(Diagnostic::warning(
                    codes::UNMATCHED_CLOSE_TAG,
                    format!("Unmatched close tag </{name}> ignored"),
                    Some(span),
                    self.source,
                ));
                Ok(())
            }
        }
    }

    fn comment(&mut self, cur: &mut Cursor<'_>) -> Result<(), ParseError> {
        let start = cur.pos();
        cur.advance(COMMENT_START.len());
        let end = cur.find(COMMENT_END).ok_or(ParseError::UnterminatedComment {
            span: Span::new(start, start + COMMENT_START.len()),
        })?;
        let data = normalize_block(&self.source.content()[cur.pos()..end]);
        cur.advance(end + COMMENT_END.len() - cur.pos());
        let parent = self.parent();
        self.doc.push(parent, NodeKind::Comment { data }, Span::new(start, cur.pos()));
        Ok(())
    }

    fn cdata(&mut self, cur: &mut Cursor<'_>) -> Result<(), ParseError> {
        let start = cur.pos();
        cur.advance(CDATA_START.len());
        let content_start = cur.pos();
        let end = cur.find(CDATA_END).ok_or(ParseError::UnterminatedCData {
            span: Span::new(start, content_start),
        })?;
        let data = normalize_block(&self.source.content()[content_start..end]);
        cur.advance(end + CDATA_END.len() - cur.pos());
        let parent = self.parent();
        let node = self.doc.push(parent, NodeKind::CData, Span::new(start, cur.pos()));
        if !data.is_empty() {
            self.doc
                .push(Some(node), NodeKind::Text { data }, Span::new(content_start, end));
        }
        Ok(())
    }

    fn directive(&mut self, cur: &mut Cursor<'_>) -> Result<(), ParseError> {
        let start = cur.pos();
        cur.advance(DIRECTIVE_START.len());
        let end = cur.find(">").ok_or(ParseError::UnterminatedDirective {
            span: Span::new(start, start + DIRECTIVE_START.len()),
        })?;
        let data = normalize_block(&self.source.content()[cur.pos()..end]);
        cur.advance(end + 1 - cur.pos());
        let parent = self.parent();
        self.doc.push(parent, NodeKind::Directive { data }, Span::new(start, cur.pos()));
        Ok(())
    }
}

fn starts_tag_name(c: Option<char>) -> bool {
    c.is_some_and(|c| c.is_ascii_alphabetic())
}

pub(crate) fn is_tag_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':')
}

fn starts_markup(cur: &Cursor<'_>) -> bool {
    let rest = cur.rest();
    rest.starts_with(DIRECTIVE_START)
        || (rest.starts_with("</") && starts_tag_name(rest[2..].chars().next()))
        || (rest.starts_with('<') && starts_tag_name(cur.peek2()))
}

/// Locate `</name ... >` (ASCII case-insensitive, whitespace allowed before
/// `>`). Returns the start and end byte offsets of the close tag.
fn find_close_tag(cur: &Cursor<'_>, name: &str) -> Option<(usize, usize)> {
    let needle = format!("</{name}");
    let mut probe = cur.clone();
    loop {
        let at = probe.find("</")?;
        probe.advance(at - probe.pos());
        if probe.starts_with_ignore_case(&needle) {
            let mut after = probe.clone();
            after.advance(needle.len());
            after.skip_whitespace();
            if after.peek() == Some('>') {
                return Some((at, after.pos() + 1));
            }
        }
        probe.advance(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(result: &ParseResult) -> Vec<String> {
        let doc = &result.document;
        doc.descendants()
            .map(|id| {
                let node = doc.node(id);
                match node.kind() {
                    NodeKind::Element { name, .. } => name.clone(),
                    kind => format!("{}:{}", kind.type_name(), node.data().unwrap_or("")),
                }
            })
            .collect()
    }

    #[test]
    fn parse_empty_input() {
        let result = parse_html("", None);
        assert!(result.document.roots().is_empty());
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn parse_nested_elements() {
        let result = parse_html("<div><p>Hello</p><br><hr/></div>", None);
        assert!(result.diagnostics.is_empty(), "diagnostics: {:?}", result.diagnostics);
        assert_eq!(names(&result), ["div", "p", "text:Hello", "br", "hr"]);

        let doc = &result.document;
        let div = doc.roots()[0];
        let p = doc.children(div)[0];
        assert_eq!(doc.parent(p), Some(div));
        assert_eq!(doc.span_text(div), "<div><p>Hello</p><br><hr/></div>");
    }

    #[test]
    fn parse_attributes() {
        let result = parse_html(r#"<input type="text" value='a b' size=3 disabled>"#, None);
        let doc = &result.document;
        let input = doc.node(doc.roots()[0]);
        let attrs: Vec<_> = input
            .attributes()
            .iter()
            .map(|a| (a.name.as_str(), a.value.as_deref()))
            .collect();
        assert_eq!(
            attrs,
            [
                ("type", Some("text")),
                ("value", Some("a b")),
                ("size", Some("3")),
                ("disabled", None)
            ]
        );
    }

    #[test]
    fn duplicate_attribute_last_wins_with_warning() {
        let result = parse_html(r#"<a href="/one" id="x" href="/two"></a>"#, None);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code.as_deref(), Some(codes::DUPLICATE_ATTRIBUTE));
        let doc = &result.document;
        let a = doc.node(doc.roots()[0]);
        assert_eq!(a.attributes()[0].name, "href");
        assert_eq!(a.attributes()[0].value.as_deref(), Some("/two"));
        assert_eq!(a.attributes().len(), 2);
    }

    #[test]
    fn whitespace_text_is_dropped_and_text_trimmed() {
        let src = "<ul>\n  <li>  one  </li>\n  <li>\n    two\n    lines\n  </li>\n</ul>\n";
        let result = parse_html(src, None);
        assert_eq!(names(&result), ["ul", "li", "text:one", "li", "text:two\nlines"]);
    }

    #[test]
    fn comment_cdata_directive() {
        let result = parse_html("<!DOCTYPE html><!-- note --><![CDATA[ x < y ]]>", None);
        assert!(result.diagnostics.is_empty());
        assert_eq!(
            names(&result),
            ["directive:DOCTYPE html", "comment:note", "cdata:", "text:x < y"]
        );
    }

    #[test]
    fn raw_text_is_not_tag_parsed() {
        let result = parse_html("<script>if (a < b) { x = '</div>'; }</SCRIPT >", None);
        assert!(result.diagnostics.is_empty(), "diagnostics: {:?}", result.diagnostics);
        assert_eq!(names(&result), ["script", "text:if (a < b) { x = '</div>'; }"]);
    }

    #[test]
    fn literal_less_than_is_text() {
        let result = parse_html("<p>1 < 2</p>", None);
        assert_eq!(names(&result), ["p", "text:1 < 2"]);
    }

    #[test]
    fn unmatched_close_tag_is_warning() {
        let result = parse_html("<div>a</span>b</div>", None);
        assert!(!result.is_fatal());
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code.as_deref(), Some(codes::UNMATCHED_CLOSE_TAG));
        assert_eq!(names(&result), ["div", "text:a", "text:b"]);
    }

    #[test]
    fn unclosed_tag_is_fatal() {
        let result = parse_html("<div>\n  <span>text\n</div>", Some("x.html"));
        assert!(result.is_fatal());
        assert!(result.document.roots().is_empty());
        let err = result.errors().next().unwrap();
        assert_eq!(err.code.as_deref(), Some("E001"));
        assert!(err.message.contains("span"), "{}", err.message);
        assert_eq!(err.location.map(|l| l.line), Some(2));
    }

    #[test]
    fn unclosed_at_eof_is_fatal() {
        let result = parse_html("<section><p>hi</p>", None);
        assert!(result.is_fatal());
        assert!(result.errors().next().unwrap().message.contains("section"));
    }

    #[test]
    fn unterminated_constructs_are_fatal() {
        for (input, code) in [
            ("<!-- open", "E002"),
            ("<![CDATA[ open", "E003"),
            ("<!DOCTYPE html", "E004"),
            ("<div class=\"a>", "E006"),
            ("<div class=a", "E005"),
            ("<div></div", "E005"),
        ] {
            let result = parse_html(input, None);
            assert!(result.is_fatal(), "{input}");
            assert_eq!(result.errors().next().unwrap().code.as_deref(), Some(code), "{input}");
        }
    }

    #[test]
    fn void_elements_never_get_children() {
        let result = parse_html("<p><img src=a.png>caption</p>", None);
        let doc = &result.document;
        let p = doc.roots()[0];
        assert_eq!(doc.children(p).len(), 2);
        let img = doc.children(p)[0];
        assert!(doc.children(img).is_empty());
    }
}
